//! 上游 HTTP Client 构建
//!
//! Groq 与 Ollama 共用同一个 Client，代理设置对两者都生效

use reqwest::{Client, Proxy};
use std::time::Duration;

/// 代理配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// 代理地址，支持 http/https/socks5
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    /// 设置认证信息
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

/// 构建 HTTP Client
///
/// `request_timeout_secs` 覆盖整个请求（包括流式响应体的读取），
/// `connect_timeout_secs` 只覆盖建立连接。
pub fn build_client(
    proxy: Option<&ProxyConfig>,
    request_timeout_secs: u64,
    connect_timeout_secs: u64,
) -> anyhow::Result<Client> {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(request_timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs));

    if let Some(proxy_config) = proxy {
        let mut proxy = Proxy::all(&proxy_config.url)?;

        if let (Some(username), Some(password)) = (&proxy_config.username, &proxy_config.password) {
            proxy = proxy.basic_auth(username, password);
        }

        builder = builder.proxy(proxy);
        tracing::debug!("上游请求使用代理: {}", proxy_config.url);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_without_proxy() {
        assert!(build_client(None, 300, 10).is_ok());
    }

    #[test]
    fn test_build_client_with_socks_proxy() {
        let proxy = ProxyConfig::new("socks5://127.0.0.1:1080").with_auth("user", "pass");
        assert!(build_client(Some(&proxy), 60, 5).is_ok());
    }

    #[test]
    fn test_build_client_rejects_bad_proxy_url() {
        let proxy = ProxyConfig::new("http://[::1");
        assert!(build_client(Some(&proxy), 60, 5).is_err());
    }
}
