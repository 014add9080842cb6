//! Ollama Provider
//!
//! 本地模型服务，流式响应为逐行 JSON

use reqwest::{Client, Response, StatusCode};

use super::conversation::{ChatCompletion, Conversation};
use super::types::{
    OllamaChatRequest, OllamaCompletion, OllamaErrorBody, OllamaMessage, OllamaOptions, OllamaTags,
};
use super::ProviderKind;
use crate::error::{AdapterError, AdapterResult};

/// 默认服务地址
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// 默认对话模型
pub const DEFAULT_CHAT_MODEL: &str = "llama3";

/// 带图片时使用的视觉模型
pub const DEFAULT_VISION_MODEL: &str = "llava";

/// Ollama API Provider
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    chat_model: String,
    vision_model: String,
    options: OllamaOptions,
}

impl OllamaProvider {
    /// 创建新的 OllamaProvider
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            options: OllamaOptions {
                temperature: 0.7,
                top_p: None,
                top_k: None,
            },
        }
    }

    /// 设置服务地址
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 设置对话模型与视觉模型
    pub fn with_models(mut self, chat: impl Into<String>, vision: impl Into<String>) -> Self {
        self.chat_model = chat.into();
        self.vision_model = vision.into();
        self
    }

    /// 设置采样参数
    pub fn with_sampling(mut self, temperature: f32, top_p: Option<f32>, top_k: Option<u32>) -> Self {
        self.options = OllamaOptions {
            temperature,
            top_p,
            top_k,
        };
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// 根据是否带图片选择模型
    pub fn model_for(&self, conversation: &Conversation) -> &str {
        if conversation.has_image() {
            &self.vision_model
        } else {
            &self.chat_model
        }
    }

    /// 构建请求体
    pub(crate) fn build_request(&self, conversation: &Conversation, stream: bool) -> OllamaChatRequest {
        let mut messages = Vec::with_capacity(conversation.history.len() + 2);
        messages.push(OllamaMessage {
            role: "system".to_string(),
            content: conversation.system.clone(),
            images: Vec::new(),
        });
        messages.extend(conversation.history.iter().map(|turn| OllamaMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
            images: Vec::new(),
        }));
        messages.push(OllamaMessage {
            role: "user".to_string(),
            content: conversation.message.clone(),
            images: conversation.image.iter().cloned().collect(),
        });

        OllamaChatRequest {
            model: self.model_for(conversation).to_string(),
            messages,
            stream,
            options: self.options,
        }
    }

    async fn send(&self, conversation: &Conversation, stream: bool) -> AdapterResult<Response> {
        let body = self.build_request(conversation, stream);
        let url = format!("{}/api/chat", self.base_url());
        tracing::debug!("调用 Ollama: {} model={}, stream={}", url, body.model, stream);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("连接 Ollama 失败 ({}): {}", self.base_url(), e);
                AdapterError::unavailable(ProviderKind::Ollama, e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdapterError::UpstreamStatus {
                provider: ProviderKind::Ollama,
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        Ok(response)
    }

    /// 发送非流式请求
    pub async fn call_chat(&self, conversation: &Conversation) -> AdapterResult<ChatCompletion> {
        let response = self.send(conversation, false).await?;
        let completion: OllamaCompletion = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let content = completion
            .message
            .map(|m| m.content)
            .filter(|c| !c.is_empty())
            .or(completion.response)
            .unwrap_or_default();
        let model = completion
            .model
            .unwrap_or_else(|| self.model_for(conversation).to_string());

        Ok(ChatCompletion::new(content, model).with_timings(completion.timings))
    }

    /// 发送流式请求
    ///
    /// 返回原始 HTTP Response，由 `stream::relay_ndjson` 转换
    pub async fn call_chat_stream(&self, conversation: &Conversation) -> AdapterResult<Response> {
        self.send(conversation, true).await
    }

    /// 检查 Ollama 是否可用
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url());
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("Ollama 不可用: {}", e);
                false
            }
        }
    }

    /// 获取本地已安装的模型列表，失败时返回空列表
    pub async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url());
        let result = async {
            let response = self.client.get(&url).send().await?.error_for_status()?;
            response.json::<OllamaTags>().await
        }
        .await;

        match result {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                tracing::warn!("获取 Ollama 模型列表失败: {}", e);
                Vec::new()
            }
        }
    }
}

/// 提取错误消息：优先使用响应体中的 `error`
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<OllamaErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or(status.as_str())
                .to_string()
        });
    format!("Ollama API error: {}", detail)
}
