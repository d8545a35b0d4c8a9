//! 异步投递子系统
//!
//! 每个 (payload, 目的地) 对应一个独立的 `DeliveryWorker`，提交到宿主注入的
//! `TaskPool` 上运行。调用方从不等待网络 I/O，各目的地之间互不阻塞。

pub mod error;
pub mod pool;
pub mod transport;
pub mod worker;

pub use error::DeliveryError;
pub use pool::TaskPool;
pub use transport::{HttpTransport, WebhookTransport};
pub use worker::{AttemptOutcome, DeliveryAttempt, DeliveryJob, DeliveryOutcome, DeliveryWorker};

/// 生命周期通知的固定重试次数
pub const LIFECYCLE_RETRIES: u32 = 3;
