//! 上游 provider 的请求/响应结构

use serde::{Deserialize, Serialize};

use super::conversation::OllamaTimings;

// === Groq (OpenAI 兼容) ===

/// Groq chat completions 请求体
#[derive(Debug, Serialize)]
pub struct GroqChatRequest {
    pub model: String,
    pub messages: Vec<GroqMessage>,
    pub stream: bool,
    pub temperature: f32,
}

/// Groq 消息
#[derive(Debug, Serialize)]
pub struct GroqMessage {
    pub role: String,
    pub content: GroqContent,
}

impl GroqMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: GroqContent::Text(content.into()),
        }
    }
}

/// 纯文本或多模态内容
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GroqContent {
    Text(String),
    Parts(Vec<GroqContentPart>),
}

/// 多模态内容片段
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroqContentPart {
    Text { text: String },
    ImageUrl { image_url: GroqImageUrl },
}

#[derive(Debug, Serialize)]
pub struct GroqImageUrl {
    pub url: String,
}

/// Groq 非流式响应
#[derive(Debug, Deserialize)]
pub struct GroqCompletion {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
pub struct GroqChoice {
    #[serde(default)]
    pub message: Option<GroqResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct GroqResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Groq 错误响应体
#[derive(Debug, Deserialize)]
pub struct GroqErrorBody {
    #[serde(default)]
    pub error: Option<GroqErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct GroqErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

// === Ollama ===

/// Ollama /api/chat 请求体
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
    pub options: OllamaOptions,
}

/// Ollama 消息
#[derive(Debug, Serialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Ollama 采样参数
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OllamaOptions {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// Ollama 非流式响应
#[derive(Debug, Deserialize)]
pub struct OllamaCompletion {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub message: Option<OllamaResponseMessage>,
    /// /api/generate 风格的响应字段
    #[serde(default)]
    pub response: Option<String>,
    #[serde(flatten)]
    pub timings: OllamaTimings,
}

#[derive(Debug, Deserialize)]
pub struct OllamaResponseMessage {
    #[serde(default)]
    pub content: String,
}

/// Ollama 错误响应体
#[derive(Debug, Deserialize)]
pub struct OllamaErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Ollama /api/tags 响应
#[derive(Debug, Deserialize)]
pub struct OllamaTags {
    #[serde(default)]
    pub models: Vec<OllamaModelTag>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaModelTag {
    pub name: String,
}
