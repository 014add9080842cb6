//! 学习助手聊天网关
//!
//! 对外提供统一的对话接口，后端由 Groq 或本地 Ollama 提供服务。
//!
//! # 使用示例
//! ```rust,ignore
//! use studify_gateway::chat::{create_router, AppState};
//! use studify_gateway::provider::ChatAdapter;
//!
//! let adapter = ChatAdapter::from_config(&config)?;
//! let app = create_router(AppState::new(adapter));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```

mod converter;
mod handlers;
mod middleware;
mod quiz;
mod router;
pub mod types;

pub use converter::{build_conversation, clean_image_data};
pub use middleware::AppState;
pub use router::create_router;
