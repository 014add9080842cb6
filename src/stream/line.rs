//! 行分帧解码器
//!
//! 上游的网络读取边界与行边界无关，一行可能被拆到两次读取中。
//! `LineDecoder` 维护一个待处理字节缓冲区，由 `tokio_util` 的 `LinesCodec`
//! 在字节层面查找 `\n`，不完整的尾部保留到下一次 `feed`。
//!
//! `\n` 不会出现在 UTF-8 多字节序列内部，
//! 因此跨读取边界的多字节字符总会在同一行内被完整解码。

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

use crate::error::{AdapterError, AdapterResult};

/// 单行最大长度 (1 MB)，超过仍未遇到换行视为无法分帧
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// 默认缓冲区初始容量
const DEFAULT_CAPACITY: usize = 8 * 1024;

/// 行分帧解码器
#[derive(Debug)]
pub struct LineDecoder {
    buffer: BytesMut,
    codec: LinesCodec,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    /// 创建新的解码器
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(DEFAULT_CAPACITY),
            codec: LinesCodec::new_with_max_length(MAX_LINE_SIZE),
        }
    }

    /// 追加一次网络读取得到的数据
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// 缓冲区中尚未产出的字节数
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// 取出下一条完整行（不含行尾的 `\n` / `\r\n`）
    ///
    /// 非法 UTF-8 的行被跳过。
    ///
    /// # Returns
    /// - `Ok(Some(line))` - 一条完整行
    /// - `Ok(None)` - 数据不足，需要更多数据
    /// - `Err(MalformedUpstream)` - 单行超过 `MAX_LINE_SIZE` 仍无换行
    pub fn next_line(&mut self) -> AdapterResult<Option<String>> {
        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(line) => return Ok(line),
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    return Err(AdapterError::MalformedUpstream(format!(
                        "单行超过 {} 字节仍未结束",
                        MAX_LINE_SIZE
                    )));
                }
                // 该行已从缓冲区移除，继续处理后面的行
                Err(LinesCodecError::Io(e)) => {
                    tracing::debug!("跳过无法解码的行: {}", e);
                }
            }
        }
    }

    /// 上游结束后取出未以换行结尾的残留数据
    ///
    /// 仅当残留内容非空白时返回，调用后缓冲区被清空。
    pub fn finish(&mut self) -> Option<String> {
        let tail = match self.codec.decode_eof(&mut self.buffer) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!("丢弃无法解码的残留数据: {}", e);
                None
            }
        };
        self.buffer.clear();
        self.codec = LinesCodec::new_with_max_length(MAX_LINE_SIZE);
        tail.filter(|line| !line.trim().is_empty())
    }
}
