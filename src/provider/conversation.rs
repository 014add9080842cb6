//! provider 无关的对话与结果类型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 历史消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// 一条历史消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// 发送给 provider 的完整对话
///
/// 由 `chat::converter` 根据客户端请求构建：系统提示词、历史、本轮用户消息，
/// 以及可选的图片（已去掉 data URL 前缀的 base64）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub system: String,
    pub history: Vec<Turn>,
    pub message: String,
    pub image: Option<String>,
}

impl Conversation {
    /// 创建新的对话
    pub fn new(system: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            message: message.into(),
            image: None,
        }
    }

    /// 设置历史消息
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// 附加图片
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Ollama 非流式响应中的计时与计数
///
/// 从上游读取时使用 snake_case，返回给客户端时使用 camelCase。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "snake_case"))]
pub struct OllamaTimings {
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u64,
    #[serde(default)]
    pub prompt_eval_duration: u64,
    #[serde(default)]
    pub eval_count: u64,
    #[serde(default)]
    pub eval_duration: u64,
}

/// 非流式对话结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletion {
    pub response: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub timings: Option<OllamaTimings>,
}

impl ChatCompletion {
    pub fn new(response: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            model: model.into(),
            created_at: Utc::now(),
            timings: None,
        }
    }

    pub fn with_timings(mut self, timings: OllamaTimings) -> Self {
        self.timings = Some(timings);
        self
    }
}
