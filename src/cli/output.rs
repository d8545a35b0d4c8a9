//! Output formatting for CLI commands

use serde::Serialize;
use serde_json::json;

use crate::delivery::DeliveryOutcome;
use crate::notifier::Plan;

/// 以 JSON 输出预览结果
pub fn format_plan(plan: &Plan) -> String {
    let value = match plan {
        Plan::NotConfigured => json!({ "status": "not_configured" }),
        Plan::NotGenerated(reason) => json!({
            "status": "not_generated",
            "reason": reason.to_string(),
        }),
        Plan::Ready { card, targets } => json!({
            "status": "ready",
            "card": card,
            "targets": targets.iter().map(|t| json!({
                "url": t.url,
                "timeout_ms": u64::try_from(t.timeout.as_millis()).unwrap_or(u64::MAX),
                "max_retries": t.max_retries,
            })).collect::<Vec<_>>(),
        }),
    };
    format_json(&value)
}

/// 单个目的地的投递结果
pub fn format_outcome(url: &str, outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Delivered { attempts, status } => {
            format!("✓ {} (HTTP {}, {} attempt(s))", url, status, attempts)
        }
        DeliveryOutcome::Exhausted { attempts, error } => {
            format!("✗ {} ({} after {} attempt(s))", url, error, attempts)
        }
    }
}

fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}
