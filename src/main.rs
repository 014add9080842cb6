use clap::Parser;
use tracing_subscriber::EnvFilter;

use studify_gateway::chat::{create_router, AppState};
use studify_gateway::model::arg::Args;
use studify_gateway::model::config::Config;
use studify_gateway::provider::{ChatAdapter, ProviderKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG 优先，其次命令行参数，默认 info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(args.log_level.as_deref().unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let mut config = Config::load(&config_path)?;
    config.override_from_env();
    tracing::info!("已加载配置: {}", config_path);

    let adapter = ChatAdapter::from_config(&config)?;
    match adapter.selected() {
        ProviderKind::Groq => tracing::info!(
            "使用 Groq: model={}, fallback_to_local={}",
            config.groq_chat_model,
            config.fallback_to_local
        ),
        ProviderKind::Ollama => tracing::info!(
            "未配置 GROQ_API_KEY，使用本地 Ollama: {} model={}",
            config.ollama_url,
            config.ollama_model
        ),
    }
    if config.api_key.is_none() {
        tracing::warn!("未配置 API_KEY，/api 路由不做认证");
    }

    let state = AppState::new(adapter)
        .with_api_key(config.api_key.clone())
        .with_fallback_to_local(config.fallback_to_local);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("服务已启动: http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
