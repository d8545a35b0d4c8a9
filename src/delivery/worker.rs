//! 投递 worker - 单个 (payload, 目的地) 的发送与重试
//!
//! 重试策略：首次尝试失败后立即重试，最多 `max_retries` 次，
//! 即总共 `1 + max_retries` 次尝试；重试之间没有退避。
//! 每个 worker 是独立的失败域，耗尽重试后只记日志。

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::error::DeliveryError;
use super::transport::WebhookTransport;

/// 一次投递任务（交给 worker 后不再修改）
#[derive(Debug, Clone)]
pub struct DeliveryJob {
    /// 目的地 URL
    pub url: String,
    /// 预先序列化的 payload，所有目的地共享
    pub payload: Arc<str>,
    /// 单次尝试超时
    pub timeout: Duration,
    /// 额外重试次数
    pub max_retries: u32,
}

/// 单次尝试的结果
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Delivered { status: u16 },
    Failed(DeliveryError),
}

/// 单次尝试记录（仅存在于一次发送周期内）
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub url: String,
    pub payload: Arc<str>,
    /// 从 1 开始的尝试序号
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
}

/// 投递最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// 成功
    Delivered { attempts: u32, status: u16 },
    /// 重试耗尽，已丢弃
    Exhausted { attempts: u32, error: DeliveryError },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts, .. } => *attempts,
            DeliveryOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// 投递 worker
pub struct DeliveryWorker {
    transport: Arc<dyn WebhookTransport>,
    job: DeliveryJob,
}

impl DeliveryWorker {
    pub fn new(transport: Arc<dyn WebhookTransport>, job: DeliveryJob) -> Self {
        Self { transport, job }
    }

    /// 执行一次完整的发送周期；尝试严格串行
    pub async fn run(self) -> DeliveryOutcome {
        let total = self.job.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            let record = self.attempt(attempt).await;
            match record.outcome {
                AttemptOutcome::Delivered { status } => {
                    info!(url = %self.job.url, attempt, status, "Webhook delivered");
                    return DeliveryOutcome::Delivered {
                        attempts: attempt,
                        status,
                    };
                }
                AttemptOutcome::Failed(e) if attempt >= total => {
                    error!(
                        url = %self.job.url,
                        attempts = attempt,
                        error_class = e.kind(),
                        error = %e,
                        "Failed to notify webhook, giving up"
                    );
                    return DeliveryOutcome::Exhausted {
                        attempts: attempt,
                        error: e,
                    };
                }
                AttemptOutcome::Failed(e) => {
                    warn!(
                        url = %self.job.url,
                        attempt,
                        remaining = total - attempt,
                        error_class = e.kind(),
                        error = %e,
                        "Webhook attempt failed, retrying"
                    );
                }
            }
            attempt += 1;
        }
    }

    async fn attempt(&self, attempt: u32) -> DeliveryAttempt {
        let started_at = Utc::now();
        let outcome = match self
            .transport
            .post_json(&self.job.url, Arc::clone(&self.job.payload), self.job.timeout)
            .await
        {
            Ok(status) => AttemptOutcome::Delivered { status },
            Err(e) => AttemptOutcome::Failed(e),
        };

        let record = DeliveryAttempt {
            url: self.job.url.clone(),
            payload: Arc::clone(&self.job.payload),
            attempt,
            started_at,
            outcome,
        };
        debug!(
            url = %record.url,
            attempt = record.attempt,
            started_at = %record.started_at.to_rfc3339(),
            bytes = record.payload.len(),
            outcome = ?record.outcome,
            "Delivery attempt finished"
        );
        record
    }
}
