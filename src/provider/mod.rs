//! 上游模型 provider
//!
//! 云端使用 Groq，本地使用 Ollama。选择哪个由构造时传入的配置决定：
//! 配置了 Groq API Key 则使用 Groq，否则使用 Ollama。

pub mod conversation;
pub mod groq;
pub mod ollama;
pub mod types;

use std::fmt;

use serde::Serialize;

pub use conversation::{ChatCompletion, Conversation, OllamaTimings, Turn, TurnRole};
pub use groq::GroqProvider;
pub use ollama::OllamaProvider;

use crate::error::{AdapterError, AdapterResult};
use crate::http_client::build_client;
use crate::model::config::Config;
use crate::stream::{relay_ndjson, relay_sse, ChunkStream};

/// provider 种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 云端推理
    Groq,
    /// 本地模型
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务可用性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub available: bool,
    pub provider: ProviderKind,
}

/// 对话适配器
///
/// 持有两个 provider 客户端，构造后不可变，可在请求间通过 `Arc` 共享。
#[derive(Debug, Clone)]
pub struct ChatAdapter {
    groq: Option<GroqProvider>,
    ollama: OllamaProvider,
}

impl ChatAdapter {
    pub fn new(groq: Option<GroqProvider>, ollama: OllamaProvider) -> Self {
        Self { groq, ollama }
    }

    /// 根据配置构建适配器
    ///
    /// Groq API Key 为空或全空白时视为未配置。
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let proxy = config.proxy();
        let client = build_client(
            proxy.as_ref(),
            config.request_timeout_secs,
            config.connect_timeout_secs,
        )?;

        let groq = config
            .groq_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| {
                GroqProvider::new(client.clone(), key)
                    .with_base_url(&config.groq_base_url)
                    .with_models(&config.groq_chat_model, &config.groq_vision_model)
                    .with_temperature(config.temperature)
            });

        let ollama = OllamaProvider::new(client)
            .with_base_url(&config.ollama_url)
            .with_models(&config.ollama_model, &config.ollama_vision_model)
            .with_sampling(config.temperature, config.top_p, config.top_k);

        Ok(Self::new(groq, ollama))
    }

    /// 当前首选的 provider
    pub fn selected(&self) -> ProviderKind {
        if self.groq.is_some() {
            ProviderKind::Groq
        } else {
            ProviderKind::Ollama
        }
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Groq => self.groq.is_some(),
            ProviderKind::Ollama => true,
        }
    }

    fn groq(&self) -> AdapterResult<&GroqProvider> {
        self.groq
            .as_ref()
            .ok_or(AdapterError::NotConfigured("GROQ_API_KEY"))
    }

    /// 使用首选 provider 发起流式对话
    pub async fn stream(&self, conversation: &Conversation) -> AdapterResult<ChunkStream> {
        self.stream_with(self.selected(), conversation).await
    }

    /// 使用指定 provider 发起流式对话
    ///
    /// 连接失败或非 2xx 状态在这里以 `Err` 返回；之后的错误作为流中的最后一项。
    pub async fn stream_with(
        &self,
        kind: ProviderKind,
        conversation: &Conversation,
    ) -> AdapterResult<ChunkStream> {
        match kind {
            ProviderKind::Groq => {
                let response = self.groq()?.call_chat_stream(conversation).await?;
                Ok(relay_sse(response.bytes_stream(), kind))
            }
            ProviderKind::Ollama => {
                let response = self.ollama.call_chat_stream(conversation).await?;
                Ok(relay_ndjson(response.bytes_stream(), kind))
            }
        }
    }

    /// 使用首选 provider 发起非流式对话
    pub async fn complete(&self, conversation: &Conversation) -> AdapterResult<ChatCompletion> {
        self.complete_with(self.selected(), conversation).await
    }

    /// 使用指定 provider 发起非流式对话
    pub async fn complete_with(
        &self,
        kind: ProviderKind,
        conversation: &Conversation,
    ) -> AdapterResult<ChatCompletion> {
        match kind {
            ProviderKind::Groq => self.groq()?.call_chat(conversation).await,
            ProviderKind::Ollama => self.ollama.call_chat(conversation).await,
        }
    }

    /// 查询服务可用性
    ///
    /// Groq 已配置即视为可用，不发起网络请求；否则探测 Ollama。
    pub async fn status(&self) -> ProviderStatus {
        match self.selected() {
            ProviderKind::Groq => ProviderStatus {
                available: true,
                provider: ProviderKind::Groq,
            },
            ProviderKind::Ollama => ProviderStatus {
                available: self.ollama.is_available().await,
                provider: ProviderKind::Ollama,
            },
        }
    }

    /// 本地已安装的模型
    pub async fn local_models(&self) -> Vec<String> {
        self.ollama.list_models().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: Option<&str>) -> Config {
        Config {
            groq_api_key: key.map(str::to_string),
            ..Config::default()
        }
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Groq.to_string(), "groq");
        assert_eq!(ProviderKind::Ollama.to_string(), "ollama");
        assert_eq!(
            serde_json::to_string(&ProviderKind::Ollama).unwrap(),
            "\"ollama\""
        );
    }

    #[test]
    fn test_selects_groq_when_key_configured() {
        let adapter = ChatAdapter::from_config(&config_with_key(Some("gsk_abc"))).unwrap();
        assert_eq!(adapter.selected(), ProviderKind::Groq);
        assert!(adapter.is_configured(ProviderKind::Groq));
    }

    #[test]
    fn test_selects_ollama_without_key() {
        let adapter = ChatAdapter::from_config(&config_with_key(None)).unwrap();
        assert_eq!(adapter.selected(), ProviderKind::Ollama);
        assert!(!adapter.is_configured(ProviderKind::Groq));
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let adapter = ChatAdapter::from_config(&config_with_key(Some("   "))).unwrap();
        assert_eq!(adapter.selected(), ProviderKind::Ollama);
    }

    #[tokio::test]
    async fn test_groq_requested_without_key() {
        let adapter = ChatAdapter::from_config(&config_with_key(None)).unwrap();
        let conversation = Conversation::new("sys", "hi");
        let err = adapter
            .complete_with(ProviderKind::Groq, &conversation)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotConfigured("GROQ_API_KEY")));
    }

    #[tokio::test]
    async fn test_status_with_groq_skips_tags_request() {
        let adapter = ChatAdapter::from_config(&config_with_key(Some("gsk_abc"))).unwrap();
        let status = adapter.status().await;
        assert!(status.available);
        assert_eq!(status.provider, ProviderKind::Groq);
    }
}
