//! 流式协议适配
//!
//! 把上游字节流转换为统一的 `ChatChunk` 流：
//!
//! ```text
//! bytes ──► LineDecoder ──► classify_*_line ──► ChatChunk ... {"done":true}
//! ```
//!
//! 输出流持有上游字节流，调用方丢弃输出流即释放上游连接。
//! 只在消费方拉取时才读取上游，读取速率受消费方约束。

use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::chunk::ChatChunk;
use super::line::LineDecoder;
use super::ndjson::classify_ndjson_line;
use super::sse::classify_sse_line;
use crate::error::{AdapterError, AdapterResult};
use crate::provider::ProviderKind;

/// 统一输出流
///
/// 正常结束时最后一项恒为终止块；以 `Err` 结束表示异常终止，之后没有终止块。
pub type ChunkStream = Pin<Box<dyn Stream<Item = AdapterResult<ChatChunk>> + Send>>;

/// 单行解析结果
#[derive(Debug)]
pub(crate) enum LineOutcome {
    /// 产出一个内容块
    Chunk(ChatChunk),
    /// 上游声明结束，可附带最后一个内容块
    Done(Option<ChatChunk>),
    /// 忽略该行
    Skip,
    /// 上游在流中报告错误
    Fail(String),
}

/// 转换云端 provider 的 SSE 流
pub fn relay_sse<S, E>(upstream: S, provider: ProviderKind) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    relay(upstream, provider, classify_sse_line)
}

/// 转换本地 provider 的 NDJSON 流
pub fn relay_ndjson<S, E>(upstream: S, provider: ProviderKind) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    relay(upstream, provider, classify_ndjson_line)
}

fn relay<S, E>(
    upstream: S,
    provider: ProviderKind,
    classify: fn(&str) -> LineOutcome,
) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        let mut decoder = LineDecoder::new();
        let mut received = 0usize;
        let mut emitted = 0usize;
        let mut finished = false;

        'read: while let Some(item) = upstream.next().await {
            let data = match item {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(
                        "{} 流读取失败 (已收到 {} 字节, 已输出 {} 个块): {}",
                        provider, received, emitted, e
                    );
                    yield Err(failure(provider, emitted, e.to_string()));
                    return;
                }
            };
            received += data.len();
            decoder.feed(&data);

            loop {
                let line = match decoder.next_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("{} 响应无法分帧: {}", provider, e);
                        yield Err(e);
                        return;
                    }
                };
                match classify(&line) {
                    LineOutcome::Chunk(chunk) => {
                        emitted += 1;
                        yield Ok(chunk);
                    }
                    LineOutcome::Done(last) => {
                        if let Some(chunk) = last {
                            emitted += 1;
                            yield Ok(chunk);
                        }
                        finished = true;
                        break 'read;
                    }
                    LineOutcome::Skip => {}
                    LineOutcome::Fail(message) => {
                        tracing::warn!("{} 在流中返回错误: {}", provider, message);
                        yield Err(failure(provider, emitted, message));
                        return;
                    }
                }
            }
        }

        if finished {
            yield Ok(ChatChunk::terminal());
            // 结束标记之后的数据不再解析，只读完以释放连接
            while let Some(item) = upstream.next().await {
                if item.is_err() {
                    break;
                }
            }
            tracing::debug!("{} 流正常结束，共 {} 个内容块", provider, emitted);
            return;
        }

        // 上游未以换行结束的最后一行
        if let Some(line) = decoder.finish() {
            match classify(&line) {
                LineOutcome::Chunk(chunk) | LineOutcome::Done(Some(chunk)) => {
                    emitted += 1;
                    yield Ok(chunk);
                }
                LineOutcome::Done(None) | LineOutcome::Skip => {}
                LineOutcome::Fail(message) => {
                    yield Err(failure(provider, emitted, message));
                    return;
                }
            }
        }

        tracing::debug!("{} 流未发送结束标记，补发终止块 ({} 个内容块)", provider, emitted);
        yield Ok(ChatChunk::terminal());
    })
}

/// 失败时尚未输出任何内容块，按请求失败处理；否则为异常终止
fn failure(provider: ProviderKind, emitted: usize, message: String) -> AdapterError {
    if emitted == 0 {
        AdapterError::ProviderUnavailable { provider, message }
    } else {
        AdapterError::AbnormalTermination(message)
    }
}
