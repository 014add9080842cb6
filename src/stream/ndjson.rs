//! 本地 provider (Ollama) 行解析
//!
//! Ollama 每行一个 JSON 对象：
//!
//! ```text
//! {"model":"llama3","message":{"role":"assistant","content":"Hel"},"done":false}
//! {"model":"llama3","message":{"role":"assistant","content":""},"done":true,"total_duration":123}
//! ```
//!
//! 出错时上游会发送 `{"error":"..."}`。

use serde::Deserialize;

use super::adapter::LineOutcome;
use super::chunk::ChatChunk;

/// Ollama 流式响应行
#[derive(Debug, Deserialize)]
struct OllamaStreamLine {
    #[serde(default)]
    message: Option<OllamaStreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaStreamMessage {
    #[serde(default)]
    content: String,
}

/// 解析一条 Ollama 输出行
pub(crate) fn classify_ndjson_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Skip;
    }

    let parsed: OllamaStreamLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("跳过无法解析的 Ollama 输出行: {}", e);
            return LineOutcome::Skip;
        }
    };

    if let Some(error) = parsed.error {
        return LineOutcome::Fail(error);
    }

    let content = parsed.message.map(|m| m.content);
    if parsed.done {
        // 结束行的 message 通常为空串
        let last = content.filter(|c| !c.is_empty()).map(ChatChunk::content);
        return LineOutcome::Done(last);
    }

    match content {
        Some(content) => LineOutcome::Chunk(ChatChunk::content(content)),
        None => LineOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_line() {
        let outcome = classify_ndjson_line(
            r#"{"model":"llama3","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        );
        match outcome {
            LineOutcome::Chunk(chunk) => assert_eq!(chunk.text(), "Hi"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_done_line_with_empty_message() {
        let outcome = classify_ndjson_line(
            r#"{"model":"llama3","message":{"role":"assistant","content":""},"done":true,"eval_count":7}"#,
        );
        assert!(matches!(outcome, LineOutcome::Done(None)));
    }

    #[test]
    fn test_done_line_carrying_text() {
        let outcome =
            classify_ndjson_line(r#"{"message":{"role":"assistant","content":"!"},"done":true}"#);
        match outcome {
            LineOutcome::Done(Some(chunk)) => assert_eq!(chunk.text(), "!"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_error_line() {
        let outcome = classify_ndjson_line(r#"{"error":"model 'llava' not found"}"#);
        match outcome {
            LineOutcome::Fail(message) => assert!(message.contains("llava")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_skipped() {
        assert!(matches!(classify_ndjson_line("not json"), LineOutcome::Skip));
        assert!(matches!(classify_ndjson_line("   "), LineOutcome::Skip));
    }
}
