//! Build Webhook Notifier CLI
//!
//! 宿主在构建生命周期的各个节点调用 `bwn`，把运行快照推送到已配置的 webhook。

use anyhow::Result;
use build_webhook_notifier::cli::{
    handle_completed, handle_message, handle_started, CompletedArgs, MessageArgs, StartedArgs,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "bwn")]
#[command(about = "Build Webhook Notifier - 构建生命周期 webhook 通知")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/build-webhook-notifier/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建开始
    Started(StartedArgs),
    /// 构建完成
    Completed(CompletedArgs),
    /// 流水线步骤发出的自定义消息
    Message(MessageArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug bwn completed --run run.json
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("build_webhook_notifier=info,bwn=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Started(args) => handle_started(args, config).await?,
        Commands::Completed(args) => handle_completed(args, config).await?,
        Commands::Message(args) => handle_message(args, config).await?,
    }

    Ok(())
}
