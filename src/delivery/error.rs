//! 投递错误
//!
//! 单次尝试失败都用 `DeliveryError` 表示，只在 worker 内部重试，
//! 不会传播到触发通知的构建流程。

use std::time::Duration;

use thiserror::Error;

/// 单次投递尝试的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// 连接、发送或读取失败
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// 整个尝试超过了目的地超时
    #[error("request timed out after {}ms", .timeout.as_millis())]
    Timeout { timeout: Duration },

    /// 非 2xx 响应
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },

    /// HTTP 客户端构建失败
    #[error("failed to create HTTP client: {message}")]
    Client { message: String },
}

impl DeliveryError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// 错误类别（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::Transport { .. } => "transport",
            DeliveryError::Timeout { .. } => "timeout",
            DeliveryError::Status { .. } => "status",
            DeliveryError::Client { .. } => "client",
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        DeliveryError::transport(e.to_string())
    }
}
