//! 网关中间件与共享状态

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::error::AdapterError;
use crate::provider::{ChatAdapter, ProviderKind};

use super::types::ErrorResponse;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 网关 API 密钥，None 表示不认证
    pub api_key: Option<String>,
    pub adapter: Arc<ChatAdapter>,
    /// Groq 在输出前失败时是否改用 Ollama
    pub fallback_to_local: bool,
}

impl AppState {
    pub fn new(adapter: ChatAdapter) -> Self {
        Self {
            api_key: None,
            adapter: Arc::new(adapter),
            fallback_to_local: false,
        }
    }

    /// 设置 API 密钥，空字符串视为未设置
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_fallback_to_local(mut self, enabled: bool) -> Self {
        self.fallback_to_local = enabled;
        self
    }

    /// 判断某次失败后是否应改用本地 provider
    pub fn should_fallback(&self, provider: ProviderKind, err: &AdapterError) -> bool {
        self.fallback_to_local && provider == ProviderKind::Groq && err.is_before_stream()
    }
}

/// 从请求中提取 API Key
///
/// 支持 `x-api-key` 与 `Authorization: Bearer <token>`
fn extract_api_key(request: &Request<Body>) -> Option<&str> {
    if let Some(key) = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
    {
        return Some(key);
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// 常量时间字符串比较
///
/// 长度不同时仍遍历较长的一方，比较耗时只与长度有关。
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len = a.len().max(b.len());

    let mut diff = (a.len() != b.len()) as u8;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= x ^ y;
    }
    diff == 0
}

/// API Key 认证中间件
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    match extract_api_key(&request) {
        Some(key) if constant_time_eq(key, expected) => next.run(request).await,
        _ => {
            tracing::warn!("拒绝未认证的请求: {}", request.uri().path());
            let error = ErrorResponse::authentication_error();
            (StatusCode::UNAUTHORIZED, Json(error)).into_response()
        }
    }
}

/// CORS 中间件层，允许任意来源
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OllamaProvider;

    fn state() -> AppState {
        AppState::new(ChatAdapter::new(None, OllamaProvider::new(reqwest::Client::new())))
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret1"));
        assert!(!constant_time_eq("", "x"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_extract_api_key() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer sk-gateway")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_api_key(&request), Some("sk-gateway"));

        let request = Request::builder()
            .header("x-api-key", "sk-header")
            .header(header::AUTHORIZATION, "Bearer sk-gateway")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_api_key(&request), Some("sk-header"));

        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_api_key(&request), None);
    }

    #[test]
    fn test_empty_api_key_disables_auth() {
        let state = state().with_api_key(Some(String::new()));
        assert!(state.api_key.is_none());
    }

    #[test]
    fn test_should_fallback() {
        let before = AdapterError::ProviderUnavailable {
            provider: ProviderKind::Groq,
            message: "connection refused".to_string(),
        };
        let during = AdapterError::AbnormalTermination("reset".to_string());

        let disabled = state();
        assert!(!disabled.should_fallback(ProviderKind::Groq, &before));

        let enabled = state().with_fallback_to_local(true);
        assert!(enabled.should_fallback(ProviderKind::Groq, &before));
        assert!(!enabled.should_fallback(ProviderKind::Groq, &during));
        assert!(!enabled.should_fallback(ProviderKind::Ollama, &before));
    }
}
