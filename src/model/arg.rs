use clap::Parser;

/// StudiFy 学习助手网关：Groq / Ollama 流式对话
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 日志级别过滤（RUST_LOG 优先）
    #[arg(long)]
    pub log_level: Option<String>,
}
