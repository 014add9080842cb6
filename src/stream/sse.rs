//! 云端 provider (OpenAI 兼容) SSE 行解析
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! data: [DONE]
//! ```

use serde_json::Value;

use super::adapter::LineOutcome;
use super::chunk::ChatChunk;

/// 数据行前缀
pub const DATA_PREFIX: &str = "data:";

/// 结束标记
pub const DONE_SENTINEL: &str = "[DONE]";

/// 增量内容在 JSON 中的路径
const DELTA_CONTENT_POINTER: &str = "/choices/0/delta/content";

/// 解析一条完整的 SSE 行
///
/// - 无 `data:` 前缀（注释、keep-alive、`event:` 等）直接忽略
/// - `[DONE]` 产出终止
/// - JSON 解析失败的行跳过，不中断整个流
/// - `choices[0].delta.content` 为字符串（含空串）时产出内容块
pub(crate) fn classify_sse_line(line: &str) -> LineOutcome {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return LineOutcome::Skip;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload.trim_end() == DONE_SENTINEL {
        return LineOutcome::Done(None);
    }

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!("跳过无法解析的 SSE 数据行: {}", e);
            return LineOutcome::Skip;
        }
    };

    match value.pointer(DELTA_CONTENT_POINTER).and_then(Value::as_str) {
        Some(content) => LineOutcome::Chunk(ChatChunk::content(content)),
        None => LineOutcome::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_of(outcome: LineOutcome) -> Option<String> {
        match outcome {
            LineOutcome::Chunk(chunk) => chunk.content,
            _ => None,
        }
    }

    #[test]
    fn test_delta_content() {
        let outcome =
            classify_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#);
        assert_eq!(content_of(outcome), Some("Hel".to_string()));
    }

    #[test]
    fn test_prefix_without_space() {
        let outcome = classify_sse_line(r#"data:{"choices":[{"delta":{"content":"x"}}]}"#);
        assert_eq!(content_of(outcome), Some("x".to_string()));
    }

    #[test]
    fn test_empty_string_content_is_emitted() {
        let outcome = classify_sse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#);
        assert_eq!(content_of(outcome), Some(String::new()));
    }

    #[test]
    fn test_done_sentinel() {
        assert!(matches!(
            classify_sse_line("data: [DONE]"),
            LineOutcome::Done(None)
        ));
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert!(matches!(classify_sse_line(""), LineOutcome::Skip));
        assert!(matches!(
            classify_sse_line(": keep-alive"),
            LineOutcome::Skip
        ));
        assert!(matches!(
            classify_sse_line("event: message"),
            LineOutcome::Skip
        ));
    }

    #[test]
    fn test_malformed_json_is_skipped() {
        assert!(matches!(
            classify_sse_line("data: {\"choices\":["),
            LineOutcome::Skip
        ));
    }

    #[test]
    fn test_missing_or_non_text_content_is_skipped() {
        // 首个块通常只有 role
        assert!(matches!(
            classify_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            LineOutcome::Skip
        ));
        assert!(matches!(
            classify_sse_line(r#"data: {"choices":[{"delta":{"content":null}}]}"#),
            LineOutcome::Skip
        ));
        assert!(matches!(
            classify_sse_line(r#"data: {"choices":[{"delta":{"content":42}}]}"#),
            LineOutcome::Skip
        ));
        assert!(matches!(
            classify_sse_line(r#"data: {"choices":[]}"#),
            LineOutcome::Skip
        ));
    }
}
