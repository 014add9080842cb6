use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::http_client::ProxyConfig;
use crate::provider::{groq, ollama};

/// 网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 网关自身的 API Key（可选），配置后 /api 路由需要认证
    #[serde(default)]
    pub api_key: Option<String>,

    /// Groq API Key，配置后优先使用 Groq
    #[serde(default)]
    pub groq_api_key: Option<String>,

    #[serde(default = "default_groq_base_url")]
    pub groq_base_url: String,

    #[serde(default = "default_groq_chat_model")]
    pub groq_chat_model: String,

    #[serde(default = "default_groq_vision_model")]
    pub groq_vision_model: String,

    /// Ollama 服务地址
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    #[serde(default = "default_ollama_vision_model")]
    pub ollama_vision_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 仅对 Ollama 生效
    #[serde(default)]
    pub top_p: Option<f32>,

    /// 仅对 Ollama 生效
    #[serde(default)]
    pub top_k: Option<u32>,

    /// 整个上游请求的超时（秒），包括流式响应的读取
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Groq 在输出前失败时是否改用本地 Ollama
    #[serde(default)]
    pub fallback_to_local: bool,

    /// HTTP 代理地址（可选）
    /// 支持格式: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    #[serde(default)]
    pub proxy_username: Option<String>,

    #[serde(default)]
    pub proxy_password: Option<String>,
}

impl Config {
    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) {
        if let Ok(host) = env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Ok(api_key) = env::var("API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Ok(key) = env::var("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
        if let Ok(url) = env::var("GROQ_BASE_URL") {
            self.groq_base_url = url;
        }
        if let Ok(model) = env::var("GROQ_CHAT_MODEL") {
            self.groq_chat_model = model;
        }
        if let Ok(model) = env::var("GROQ_VISION_MODEL") {
            self.groq_vision_model = model;
        }
        if let Ok(url) = env::var("OLLAMA_URL") {
            self.ollama_url = url;
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            self.ollama_model = model;
        }
        if let Ok(model) = env::var("OLLAMA_VISION_MODEL") {
            self.ollama_vision_model = model;
        }
        if let Ok(secs) = env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.request_timeout_secs = s;
            }
        }
        if let Ok(secs) = env::var("CONNECT_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                self.connect_timeout_secs = s;
            }
        }
        if let Ok(flag) = env::var("FALLBACK_TO_LOCAL") {
            self.fallback_to_local = parse_flag(&flag);
        }
        if let Ok(proxy) = env::var("PROXY_URL") {
            self.proxy_url = Some(proxy);
        }
        if let Ok(username) = env::var("PROXY_USERNAME") {
            self.proxy_username = Some(username);
        }
        if let Ok(password) = env::var("PROXY_PASSWORD") {
            self.proxy_password = Some(password);
        }
    }

    /// 代理配置，未设置代理地址时返回 None
    pub fn proxy(&self) -> Option<ProxyConfig> {
        let url = self.proxy_url.as_deref().filter(|u| !u.trim().is_empty())?;
        let proxy = ProxyConfig::new(url);
        Some(match (&self.proxy_username, &self.proxy_password) {
            (Some(username), Some(password)) => proxy.with_auth(username, password),
            _ => proxy,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_groq_base_url() -> String {
    groq::DEFAULT_BASE_URL.to_string()
}

fn default_groq_chat_model() -> String {
    groq::DEFAULT_CHAT_MODEL.to_string()
}

fn default_groq_vision_model() -> String {
    groq::DEFAULT_VISION_MODEL.to_string()
}

fn default_ollama_url() -> String {
    ollama::DEFAULT_BASE_URL.to_string()
}

fn default_ollama_model() -> String {
    ollama::DEFAULT_CHAT_MODEL.to_string()
}

fn default_ollama_vision_model() -> String {
    ollama::DEFAULT_VISION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            groq_api_key: None,
            groq_base_url: default_groq_base_url(),
            groq_chat_model: default_groq_chat_model(),
            groq_vision_model: default_groq_vision_model(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            ollama_vision_model: default_ollama_vision_model(),
            temperature: default_temperature(),
            top_p: None,
            top_k: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            fallback_to_local: false,
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
        }
    }
}

impl Config {
    /// 获取默认配置文件路径
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // 配置文件不存在，返回默认配置
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
