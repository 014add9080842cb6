//! NDJSON 输出块

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// 输出块中的角色，内容块固定为 assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkRole {
    Assistant,
}

/// 适配器输出的单个块
///
/// - 内容块: `{"role":"assistant","content":"Hel","done":false}`
/// - 终止块: `{"done":true}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ChunkRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub done: bool,
}

impl ChatChunk {
    /// 创建内容块
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            role: Some(ChunkRole::Assistant),
            content: Some(text.into()),
            done: false,
        }
    }

    /// 创建终止块
    pub fn terminal() -> Self {
        Self {
            role: None,
            content: None,
            done: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.done
    }

    /// 内容片段，终止块返回空字符串
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// 序列化为一行 NDJSON（以 `\n` 结尾）
    pub fn to_ndjson(&self) -> Result<Bytes, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_chunk_wire_format() {
        let line = ChatChunk::content("Hel").to_ndjson().unwrap();
        assert_eq!(
            &line[..],
            b"{\"role\":\"assistant\",\"content\":\"Hel\",\"done\":false}\n"
        );
    }

    #[test]
    fn test_terminal_chunk_wire_format() {
        let line = ChatChunk::terminal().to_ndjson().unwrap();
        assert_eq!(&line[..], b"{\"done\":true}\n");
    }

    #[test]
    fn test_empty_content_is_kept() {
        let chunk = ChatChunk::content("");
        assert!(!chunk.is_terminal());
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"content\":\"\""));
    }

    #[test]
    fn test_deserialize_terminal() {
        let chunk: ChatChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert!(chunk.is_terminal());
        assert_eq!(chunk.text(), "");
    }
}
