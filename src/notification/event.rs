//! 生命周期事件
//!
//! 宿主的三个回调（开始、完成、自定义消息）都先被解析成 `BuildEvent`，
//! 之后的策略判断和卡片构建只依赖这份快照，不再访问宿主。

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::result::BuildResult;
use super::run::{RunKind, RunRef};

/// 消息通知的默认超时（毫秒）
pub const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 30_000;

/// 默认重试次数
pub const DEFAULT_RETRIES: u32 = 3;

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// 构建开始；`authoritative` 表示该信号是否为本次运行的有效开始信号
    Started { authoritative: bool },
    /// 构建完成
    Completed,
    /// 流水线步骤发出的自定义消息
    Message,
}

/// 事件快照
#[derive(Debug, Clone, PartialEq)]
pub struct BuildEvent {
    pub kind: EventKind,
    /// 任务名称
    pub job_name: String,
    /// 任务完整显示名
    pub display_name: String,
    /// 运行编号
    pub number: u32,
    /// 当前结果（进行中为 None）
    pub result: Option<BuildResult>,
    /// 上一次结果（没有上一次运行时为 Success）
    pub previous_result: Option<BuildResult>,
    /// 持续失败起点（无法解析时为 None）
    pub failing_since: Option<u32>,
    /// 自由文本消息
    pub message: Option<String>,
    /// 显式状态覆盖
    pub status_override: Option<String>,
    /// 运行的深链接
    pub link: Option<String>,
}

/// 自定义消息步骤的参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepParameters {
    /// 显式 webhook URL（覆盖任务配置的目的地）
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// 状态覆盖
    #[serde(default)]
    pub status: Option<String>,
    /// 消息正文
    #[serde(default)]
    pub message: Option<String>,
    /// 超时（毫秒），仅用于显式 URL
    #[serde(default = "default_message_timeout")]
    pub timeout_ms: u64,
    /// 重试次数
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for StepParameters {
    fn default() -> Self {
        Self {
            webhook_url: None,
            status: None,
            message: None,
            timeout_ms: DEFAULT_MESSAGE_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
        }
    }
}

fn default_message_timeout() -> u64 {
    DEFAULT_MESSAGE_TIMEOUT_MS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl BuildEvent {
    fn from_run(kind: EventKind, run: &dyn RunRef, root_url: Option<&str>) -> Self {
        let info = run.info();
        Self {
            kind,
            job_name: info.job_name.clone(),
            display_name: info.display_name.clone(),
            number: info.number,
            result: info.result,
            previous_result: info.history.previous_result(),
            failing_since: None,
            message: None,
            status_override: None,
            link: root_url.map(|root| format!("{}{}", root, info.url)),
        }
    }

    /// 构建开始事件
    ///
    /// 经典构建以预执行钩子为准，其他构建以执行开始为准，
    /// 保证每次运行只有一个信号产生通知。
    pub fn started(run: &dyn RunRef, is_pre_execution_hook: bool, root_url: Option<&str>) -> Self {
        let authoritative = match run.kind() {
            RunKind::Classic => is_pre_execution_hook,
            RunKind::Pipeline => !is_pre_execution_hook,
        };
        Self::from_run(EventKind::Started { authoritative }, run, root_url)
    }

    /// 构建完成事件
    pub fn completed(run: &dyn RunRef, root_url: Option<&str>) -> Self {
        let mut event = Self::from_run(EventKind::Completed, run, root_url);
        let info = run.info();
        event.failing_since = match info.history.failing_since(info.number, run.kind()) {
            Ok(number) => Some(number),
            Err(e) => {
                debug!(job = %info.job_name, number = info.number, error = %e, "Failing-since run unresolved");
                None
            }
        };
        event
    }

    /// 自定义消息事件
    pub fn message(run: &dyn RunRef, params: &StepParameters, root_url: Option<&str>) -> Self {
        let mut event = Self::from_run(EventKind::Message, run, root_url);
        event.message = params.message.clone();
        event.status_override = params.status.clone();
        event
    }
}
