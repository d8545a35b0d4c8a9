//! 生命周期通知命令
//!
//! 从 JSON 文件读取宿主运行快照，触发对应的回调。
//! 投递在后台进行，命令退出前等待执行池排空。

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::output::{format_outcome, format_plan};
use crate::config::NotifierConfig;
use crate::delivery::{HttpTransport, TaskPool};
use crate::notification::event::{StepParameters, DEFAULT_MESSAGE_TIMEOUT_MS, DEFAULT_RETRIES};
use crate::notification::run::AnyRun;
use crate::notifier::{NotifyOutcome, WebhookNotifier};

/// 所有命令共享的参数
#[derive(Args, Debug)]
pub struct RunArgs {
    /// 运行快照 JSON 文件
    #[arg(long)]
    pub run: PathBuf,
    /// 只打印卡片和目标，不发送
    #[arg(long)]
    pub dry_run: bool,
}

/// `started` 命令参数
#[derive(Args, Debug)]
pub struct StartedArgs {
    #[command(flatten)]
    pub run: RunArgs,
    /// 信号来自预执行钩子（否则为执行开始）
    #[arg(long)]
    pub pre_execution_hook: bool,
}

/// `completed` 命令参数
#[derive(Args, Debug)]
pub struct CompletedArgs {
    #[command(flatten)]
    pub run: RunArgs,
}

/// `message` 命令参数
#[derive(Args, Debug)]
pub struct MessageArgs {
    #[command(flatten)]
    pub run: RunArgs,
    /// 显式 webhook URL（覆盖任务配置）
    #[arg(long)]
    pub webhook_url: Option<String>,
    /// 状态文本
    #[arg(long)]
    pub status: Option<String>,
    /// 消息正文
    #[arg(long)]
    pub message: Option<String>,
    /// 显式 URL 的超时（毫秒）
    #[arg(long, default_value_t = DEFAULT_MESSAGE_TIMEOUT_MS)]
    pub timeout_ms: u64,
    /// 重试次数
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,
}

impl MessageArgs {
    pub fn step_parameters(&self) -> StepParameters {
        StepParameters {
            webhook_url: self.webhook_url.clone(),
            status: self.status.clone(),
            message: self.message.clone(),
            timeout_ms: self.timeout_ms,
            retries: self.retries,
        }
    }
}

/// 读取运行快照
pub fn load_run(path: &Path) -> Result<AnyRun> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read run {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse run {}", path.display()))
}

fn build_notifier(config_path: Option<&Path>) -> Result<WebhookNotifier> {
    let config = NotifierConfig::load(config_path)?;
    let mut pool = TaskPool::current();
    if let Some(max) = config.max_concurrent_deliveries {
        pool = pool.with_max_concurrency(max);
    }
    let transport = Arc::new(HttpTransport::new()?);
    Ok(WebhookNotifier::from_config(config, pool, transport))
}

/// 处理构建开始
pub async fn handle_started(args: StartedArgs, config_path: Option<&Path>) -> Result<()> {
    let run = load_run(&args.run.run)?;
    let notifier = build_notifier(config_path)?;
    let run = run.as_run_ref();

    if args.run.dry_run {
        println!("{}", format_plan(&notifier.preview_started(run, args.pre_execution_hook)));
        return Ok(());
    }
    let outcome = notifier.on_build_started(run, args.pre_execution_hook);
    finish(&notifier, outcome).await;
    Ok(())
}

/// 处理构建完成
pub async fn handle_completed(args: CompletedArgs, config_path: Option<&Path>) -> Result<()> {
    let run = load_run(&args.run.run)?;
    let notifier = build_notifier(config_path)?;
    let run = run.as_run_ref();

    if args.run.dry_run {
        println!("{}", format_plan(&notifier.preview_completed(run)));
        return Ok(());
    }
    let outcome = notifier.on_build_completed(run);
    finish(&notifier, outcome).await;
    Ok(())
}

/// 处理自定义消息
pub async fn handle_message(args: MessageArgs, config_path: Option<&Path>) -> Result<()> {
    let run = load_run(&args.run.run)?;
    let notifier = build_notifier(config_path)?;
    let params = args.step_parameters();
    let run = run.as_run_ref();

    if args.run.dry_run {
        println!("{}", format_plan(&notifier.preview_message(run, &params)));
        return Ok(());
    }
    let outcome = notifier.on_custom_message(run, &params);
    finish(&notifier, outcome).await;
    Ok(())
}

/// 等待投递结束；投递失败只报告，不影响退出码
async fn finish(notifier: &WebhookNotifier, outcome: NotifyOutcome) {
    match outcome {
        NotifyOutcome::NotConfigured => info!("No webhooks configured for this job"),
        NotifyOutcome::NotGenerated(reason) => info!(reason = %reason, "Notification skipped"),
        NotifyOutcome::Dispatched(handles) => {
            for delivery in handles {
                match delivery.handle.await {
                    Ok(result) => println!("{}", format_outcome(&delivery.url, &result)),
                    Err(e) => warn!(url = %delivery.url, error = %e, "Delivery task failed"),
                }
            }
        }
    }
    notifier.pool().drain().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_run_pipeline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{
                "kind": "pipeline",
                "job_name": "api",
                "display_name": "team » api",
                "number": 4,
                "url": "job/api/4/",
                "result": "FAILURE",
                "history": [{"number": 3, "result": "SUCCESS"}]
            }"#,
        )
        .unwrap();

        let run = load_run(&path).unwrap();
        assert!(matches!(run, AnyRun::Pipeline(_)));
        assert_eq!(run.as_run_ref().info().number, 4);
    }

    #[test]
    fn test_load_run_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_run(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read run"));
    }

    #[test]
    fn test_message_args_to_parameters() {
        let args = MessageArgs {
            run: RunArgs {
                run: PathBuf::from("run.json"),
                dry_run: false,
            },
            webhook_url: Some("https://hooks.example.com".to_string()),
            status: Some("Deploying".to_string()),
            message: None,
            timeout_ms: 500,
            retries: 0,
        };
        let params = args.step_parameters();
        assert_eq!(params.webhook_url.as_deref(), Some("https://hooks.example.com"));
        assert_eq!(params.timeout_ms, 500);
        assert_eq!(params.retries, 0);
    }
}
