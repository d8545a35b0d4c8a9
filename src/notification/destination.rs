//! Webhook 目的地与订阅开关

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::policy::Gate;

/// 默认超时（毫秒）
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// 按事件类型的订阅开关
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscriptions {
    pub notify_start: bool,
    pub notify_success: bool,
    pub notify_failure: bool,
    pub notify_repeated_failure: bool,
    pub notify_aborted: bool,
    pub notify_not_built: bool,
    pub notify_back_to_normal: bool,
    pub notify_unstable: bool,
}

impl Subscriptions {
    /// 全部开启
    pub fn all() -> Self {
        Self {
            notify_start: true,
            notify_success: true,
            notify_failure: true,
            notify_repeated_failure: true,
            notify_aborted: true,
            notify_not_built: true,
            notify_back_to_normal: true,
            notify_unstable: true,
        }
    }

    /// 开关是否放行该决策
    pub fn allows(&self, gate: Gate) -> bool {
        match gate {
            Gate::Start => self.notify_start,
            Gate::Success => self.notify_success,
            Gate::Failure => self.notify_failure,
            Gate::RepeatedFailure => self.notify_repeated_failure,
            Gate::Aborted => self.notify_aborted,
            Gate::NotBuilt => self.notify_not_built,
            // 恢复成功同时满足 Success 订阅
            Gate::BackToNormal => self.notify_back_to_normal || self.notify_success,
            Gate::Unstable => self.notify_unstable,
            Gate::Always => true,
            Gate::Never => false,
        }
    }
}

/// Webhook 目的地（URL 不保证唯一）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub url: String,
    /// 单次尝试超时（毫秒）；缺省时由配置的默认超时补齐
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub subscriptions: Subscriptions,
}

impl Destination {
    pub fn new(url: impl Into<String>, subscriptions: Subscriptions) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            subscriptions,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// 单次尝试的超时，总是正数
    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            Some(ms) if ms > 0 => Duration::from_millis(ms),
            _ => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// 按任务查询目的地
///
/// 返回 None 表示该任务没有注册表（静默跳过）。
pub trait DestinationRegistry: Send + Sync {
    fn destinations(&self, job_name: &str) -> Option<Vec<Destination>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_flags_off_blocks_every_gate_except_always() {
        let subs = Subscriptions::default();
        for gate in [
            Gate::Start,
            Gate::Success,
            Gate::Failure,
            Gate::RepeatedFailure,
            Gate::Aborted,
            Gate::NotBuilt,
            Gate::BackToNormal,
            Gate::Unstable,
            Gate::Never,
        ] {
            assert!(!subs.allows(gate), "{:?} should be blocked", gate);
        }
        assert!(subs.allows(Gate::Always));
    }

    #[test]
    fn test_back_to_normal_accepts_success_subscribers() {
        let success_only = Subscriptions {
            notify_success: true,
            ..Default::default()
        };
        assert!(success_only.allows(Gate::BackToNormal));

        let back_only = Subscriptions {
            notify_back_to_normal: true,
            ..Default::default()
        };
        assert!(back_only.allows(Gate::BackToNormal));
        assert!(!back_only.allows(Gate::Success));
    }

    #[test]
    fn test_destination_from_json() {
        let json = r#"{"url": "https://hooks.example.com/a", "notify_failure": true}"#;
        let dest: Destination = serde_json::from_str(json).unwrap();
        assert_eq!(dest.timeout_ms, None);
        assert_eq!(dest.timeout(), Duration::from_millis(30_000));
        assert!(dest.subscriptions.notify_failure);
        assert!(!dest.subscriptions.notify_start);
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let dest = Destination::new("https://x", Subscriptions::all()).with_timeout(Duration::ZERO);
        assert_eq!(dest.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let dest = Destination::new("https://x", Subscriptions::all()).with_timeout(Duration::MAX);
        assert_eq!(dest.timeout_ms, Some(u64::MAX));
        assert_eq!(dest.timeout(), Duration::from_millis(u64::MAX));

        let dest = Destination::new("https://x", Subscriptions::all()).with_timeout(Duration::from_secs(2));
        assert_eq!(dest.timeout_ms, Some(2000));
    }
}
