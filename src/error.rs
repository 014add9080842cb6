//! 适配器错误类型
//!
//! 流开始前的错误以 `Err` 直接返回给调用方；
//! 流开始后的错误作为流的最后一项产出，此时不会再有 `done: true` 终止块。

use thiserror::Error;

use crate::provider::ProviderKind;

/// 适配器操作结果
pub type AdapterResult<T> = Result<T, AdapterError>;

/// 流式协议适配器错误
#[derive(Debug, Error)]
pub enum AdapterError {
    /// 无法连接到上游（网络/DNS/超时），或上游在输出任何内容块前失败
    #[error("{provider} 不可用: {message}")]
    ProviderUnavailable {
        provider: ProviderKind,
        message: String,
    },

    /// 上游在开始输出前返回了非 2xx 状态
    #[error("{message}")]
    UpstreamStatus {
        provider: ProviderKind,
        status: u16,
        message: String,
    },

    /// 字节流无法切分为行
    #[error("上游数据无法分帧: {0}")]
    MalformedUpstream(String),

    /// 已输出部分内容后上游异常结束
    #[error("上游流异常终止: {0}")]
    AbnormalTermination(String),

    /// 非流式响应体无法解析
    #[error("上游响应无法解析: {0}")]
    InvalidResponse(String),

    /// 请求的 provider 未配置
    #[error("{0} 未配置")]
    NotConfigured(&'static str),
}

impl AdapterError {
    /// 是否发生在任何输出之前，调用方可据此切换到备用 provider
    pub fn is_before_stream(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::UpstreamStatus { .. }
        )
    }

    /// 将连接阶段的 reqwest 错误归类为 `ProviderUnavailable`
    pub(crate) fn unavailable(provider: ProviderKind, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("请求超时: {}", err)
        } else if err.is_connect() {
            format!("连接失败: {}", err)
        } else {
            err.to_string()
        };
        Self::ProviderUnavailable { provider, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_stream_classification() {
        let unavailable = AdapterError::ProviderUnavailable {
            provider: ProviderKind::Groq,
            message: "connection refused".to_string(),
        };
        assert!(unavailable.is_before_stream());

        let status = AdapterError::UpstreamStatus {
            provider: ProviderKind::Ollama,
            status: 500,
            message: "Ollama API error: boom".to_string(),
        };
        assert!(status.is_before_stream());

        assert!(!AdapterError::AbnormalTermination("reset".to_string()).is_before_stream());
        assert!(!AdapterError::MalformedUpstream("too long".to_string()).is_before_stream());
    }

    #[test]
    fn test_upstream_status_displays_message_only() {
        let err = AdapterError::UpstreamStatus {
            provider: ProviderKind::Groq,
            status: 401,
            message: "Invalid API Key".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid API Key");
    }
}
