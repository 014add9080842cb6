//! 网关路由配置

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::{
    handlers::{get_models, get_status, health, post_chat, post_generate_quiz, post_hint},
    middleware::{auth_middleware, cors_layer, AppState},
};

/// 创建网关路由
///
/// # 端点
/// - `POST /api/ollama` - 对话（流式或非流式）
/// - `GET /api/ai/status` - 当前 provider 及可用性
/// - `POST /api/ai/hint` - 生成答题提示
/// - `GET /api/ai/models` - 本地模型列表
/// - `POST /api/generate-quiz` - 根据学习资料生成选择题
/// - `GET /health` - 健康检查，不需要认证
///
/// 配置了 API Key 时，`/api` 下的路径需要 `x-api-key` 或
/// `Authorization: Bearer <token>` 认证。
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/ollama", post(post_chat))
        .route("/ai/status", get(get_status))
        .route("/ai/hint", post(post_hint))
        .route("/ai/models", get(get_models))
        .route("/generate-quiz", post(post_generate_quiz))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(cors_layer())
        .with_state(state)
}
