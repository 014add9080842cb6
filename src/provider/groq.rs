//! Groq Provider
//!
//! 云端推理，OpenAI 兼容接口，流式响应为 SSE

use reqwest::{Client, Response, StatusCode};

use super::conversation::{ChatCompletion, Conversation};
use super::types::{
    GroqChatRequest, GroqCompletion, GroqContent, GroqContentPart, GroqErrorBody, GroqImageUrl,
    GroqMessage,
};
use super::ProviderKind;
use crate::error::{AdapterError, AdapterResult};

/// 默认 API 地址
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// 默认对话模型
pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-oss-120b";

/// 带图片时使用的视觉模型
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Groq API Provider
#[derive(Debug, Clone)]
pub struct GroqProvider {
    client: Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    vision_model: String,
    temperature: f32,
}

impl GroqProvider {
    /// 创建新的 GroqProvider
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            temperature: 0.7,
        }
    }

    /// 设置 API 地址
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

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// chat completions 端点
    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
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
    pub(crate) fn build_request(&self, conversation: &Conversation, stream: bool) -> GroqChatRequest {
        let mut messages = Vec::with_capacity(conversation.history.len() + 2);
        messages.push(GroqMessage::text("system", conversation.system.clone()));
        messages.extend(
            conversation
                .history
                .iter()
                .map(|turn| GroqMessage::text(turn.role.as_str(), turn.content.clone())),
        );

        let user = match &conversation.image {
            Some(image) => GroqMessage {
                role: "user".to_string(),
                content: GroqContent::Parts(vec![
                    GroqContentPart::Text {
                        text: conversation.message.clone(),
                    },
                    GroqContentPart::ImageUrl {
                        image_url: GroqImageUrl {
                            url: format!("data:image/jpeg;base64,{}", image),
                        },
                    },
                ]),
            },
            None => GroqMessage::text("user", conversation.message.clone()),
        };
        messages.push(user);

        GroqChatRequest {
            model: self.model_for(conversation).to_string(),
            messages,
            stream,
            temperature: self.temperature,
        }
    }

    async fn send(&self, conversation: &Conversation, stream: bool) -> AdapterResult<Response> {
        let body = self.build_request(conversation, stream);
        tracing::debug!("调用 Groq: model={}, stream={}", body.model, stream);

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::unavailable(ProviderKind::Groq, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdapterError::UpstreamStatus {
                provider: ProviderKind::Groq,
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        Ok(response)
    }

    /// 发送非流式请求
    pub async fn call_chat(&self, conversation: &Conversation) -> AdapterResult<ChatCompletion> {
        let response = self.send(conversation, false).await?;
        let completion: GroqCompletion = response
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        let model = completion
            .model
            .unwrap_or_else(|| self.model_for(conversation).to_string());

        Ok(ChatCompletion::new(content, model))
    }

    /// 发送流式请求
    ///
    /// 返回原始 HTTP Response，由 `stream::relay_sse` 转换
    pub async fn call_chat_stream(&self, conversation: &Conversation) -> AdapterResult<Response> {
        self.send(conversation, true).await
    }
}

/// 提取错误消息：优先使用响应体中的 `error.message`
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<GroqErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            format!(
                "Groq API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::conversation::{Turn, TurnRole};

    fn provider() -> GroqProvider {
        GroqProvider::new(Client::new(), "gsk_test")
    }

    #[test]
    fn test_chat_url() {
        let p = provider().with_base_url("http://localhost:9000/openai/v1/");
        assert_eq!(p.chat_url(), "http://localhost:9000/openai/v1/chat/completions");
    }

    #[test]
    fn test_build_request_text() {
        let conversation = Conversation::new("system prompt", "What is a B-tree?")
            .with_history(vec![
                Turn::new(TurnRole::User, "hi"),
                Turn::new(TurnRole::Assistant, "hello"),
            ]);
        let request = provider().build_request(&conversation, true);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], DEFAULT_CHAT_MODEL);
        assert_eq!(value["stream"], true);
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hi");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["content"], "What is a B-tree?");
    }

    #[test]
    fn test_build_request_with_image_uses_vision_model() {
        let conversation = Conversation::new("sys", "Explain this diagram").with_image("QUJD");
        let request = provider().build_request(&conversation, false);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], DEFAULT_VISION_MODEL);
        let user = &value["messages"][1];
        assert_eq!(user["content"][0]["text"], "Explain this diagram");
        assert_eq!(
            user["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[test]
    fn test_error_message_from_body() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, body),
            "Invalid API Key"
        );
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, "<html>"),
            "Groq API error: Service Unavailable"
        );
    }
}
