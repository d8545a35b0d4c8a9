//! 通知策略 - 决定事件是否产生通知、通知内容是什么
//!
//! 纯函数，无 I/O。完成事件的状态标签按以下顺序匹配：
//! 1. Success 且上一次为 Failure/Unstable → "Back to Success"
//! 2. Failure 且能解析持续失败起点 → "Repeated Failure"（上一次也失败）或 "Build Failed"
//! 3. Aborted → "Build Aborted"
//! 4. Unstable → "Build Unstable"
//! 5. Success → "Build Success"
//! 6. NotBuilt → "Not Built"
//! 7. Failure 但无法解析起点 → 结果原始名称，开关仍为 Failure/RepeatedFailure
//!
//! 结果缺失时按 Success 计算标签。

use super::card::Fact;
use super::event::{BuildEvent, EventKind};
use super::result::{BuildResult, ThemeColor};

/// 决定目的地是否接收通知的开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Start,
    Success,
    Failure,
    RepeatedFailure,
    Aborted,
    NotBuilt,
    BackToNormal,
    Unstable,
    /// 不受开关约束，总是发送
    Always,
    /// 没有任何开关能匹配（结果缺失）
    Never,
}

/// 策略决策
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// 状态标签
    pub status_label: String,
    /// 策略自身产生的事实
    pub facts: Vec<Fact>,
    /// 主题色（仅完成事件）
    pub theme_color: Option<ThemeColor>,
    /// 扇出时使用的开关
    pub gate: Gate,
}

/// 不产生通知的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 开始信号不是本次运行的有效信号
    NonAuthoritativeStart,
    /// 卡片无法序列化为 payload
    CardNotSerializable { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NonAuthoritativeStart => write!(f, "start signal is not authoritative for this run"),
            SkipReason::CardNotSerializable { message } => write!(f, "card could not be serialized: {}", message),
        }
    }
}

/// 策略输出
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    Skip(SkipReason),
    Notify(Decision),
}

/// 评估事件
pub fn decide(event: &BuildEvent) -> PolicyOutcome {
    match event.kind {
        EventKind::Started { authoritative: false } => {
            PolicyOutcome::Skip(SkipReason::NonAuthoritativeStart)
        }
        EventKind::Started { authoritative: true } => PolicyOutcome::Notify(Decision {
            status_label: "Build Started".to_string(),
            facts: Vec::new(),
            theme_color: None,
            gate: Gate::Start,
        }),
        EventKind::Completed => PolicyOutcome::Notify(decide_completed(event)),
        EventKind::Message => {
            let label = event
                .status_override
                .clone()
                .unwrap_or_else(|| "Running".to_string());
            PolicyOutcome::Notify(Decision {
                facts: vec![Fact::new("Status", label.clone())],
                status_label: label,
                theme_color: None,
                gate: Gate::Always,
            })
        }
    }
}

fn decide_completed(event: &BuildEvent) -> Decision {
    let result = event.result.unwrap_or(BuildResult::Success);
    let previous = event.previous_result;
    let mut facts = Vec::new();

    let (label, gate) = match (result, event.failing_since) {
        (BuildResult::Success, _)
            if matches!(previous, Some(BuildResult::Failure | BuildResult::Unstable)) =>
        {
            ("Back to Success".to_string(), Gate::BackToNormal)
        }
        (BuildResult::Failure, Some(since)) => {
            if previous == Some(BuildResult::Failure) {
                facts.push(Fact::new("Failing since", format!("build #{}", since)));
                ("Repeated Failure".to_string(), Gate::RepeatedFailure)
            } else {
                ("Build Failed".to_string(), Gate::Failure)
            }
        }
        (BuildResult::Aborted, _) => ("Build Aborted".to_string(), Gate::Aborted),
        (BuildResult::Unstable, _) => ("Build Unstable".to_string(), Gate::Unstable),
        (BuildResult::Success, _) => ("Build Success".to_string(), Gate::Success),
        (BuildResult::NotBuilt, _) => ("Not Built".to_string(), Gate::NotBuilt),
        // 起点无法解析：标签用原始名称，开关仍按上一次结果区分
        (BuildResult::Failure, None) => {
            let gate = if previous == Some(BuildResult::Failure) {
                Gate::RepeatedFailure
            } else {
                Gate::Failure
            };
            (result.as_str().to_string(), gate)
        }
    };

    Decision {
        status_label: label,
        facts,
        theme_color: Some(result.color()),
        // 结果缺失时标签按 Success 计算，但不向任何订阅者扇出
        gate: if event.result.is_some() { gate } else { Gate::Never },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(
        result: Option<BuildResult>,
        previous: Option<BuildResult>,
        failing_since: Option<u32>,
    ) -> BuildEvent {
        BuildEvent {
            kind: EventKind::Completed,
            job_name: "api".to_string(),
            display_name: "api".to_string(),
            number: 9,
            result,
            previous_result: previous,
            failing_since,
            message: None,
            status_override: None,
            link: None,
        }
    }

    fn notify(event: &BuildEvent) -> Decision {
        match decide(event) {
            PolicyOutcome::Notify(decision) => decision,
            PolicyOutcome::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[test]
    fn test_success_after_success() {
        let d = notify(&completed(Some(BuildResult::Success), Some(BuildResult::Success), None));
        assert_eq!(d.status_label, "Build Success");
        assert_eq!(d.theme_color, Some(ThemeColor::Green));
        assert_eq!(d.gate, Gate::Success);
        assert!(d.facts.is_empty());
    }

    #[test]
    fn test_back_to_success() {
        for previous in [BuildResult::Failure, BuildResult::Unstable] {
            let d = notify(&completed(Some(BuildResult::Success), Some(previous), None));
            assert_eq!(d.status_label, "Back to Success");
            assert_eq!(d.gate, Gate::BackToNormal);
        }
    }

    #[test]
    fn test_repeated_failure_reports_failing_since() {
        let d = notify(&completed(Some(BuildResult::Failure), Some(BuildResult::Failure), Some(7)));
        assert_eq!(d.status_label, "Repeated Failure");
        assert_eq!(d.facts, vec![Fact::new("Failing since", "build #7")]);
        assert_eq!(d.theme_color, Some(ThemeColor::Red));
        assert_eq!(d.gate, Gate::RepeatedFailure);
    }

    #[test]
    fn test_first_failure() {
        let d = notify(&completed(Some(BuildResult::Failure), Some(BuildResult::Success), Some(9)));
        assert_eq!(d.status_label, "Build Failed");
        assert!(d.facts.is_empty());
        assert_eq!(d.gate, Gate::Failure);
    }

    #[test]
    fn test_failure_with_unresolved_history_falls_through() {
        let d = notify(&completed(Some(BuildResult::Failure), Some(BuildResult::Failure), None));
        assert_eq!(d.status_label, "FAILURE");
        assert_eq!(d.gate, Gate::RepeatedFailure);
        assert_eq!(d.theme_color, Some(ThemeColor::Red));
        assert!(d.facts.is_empty());

        let d = notify(&completed(Some(BuildResult::Failure), Some(BuildResult::Success), None));
        assert_eq!(d.status_label, "FAILURE");
        assert_eq!(d.gate, Gate::Failure);
    }

    #[test]
    fn test_other_results() {
        let cases = [
            (BuildResult::Aborted, "Build Aborted", Gate::Aborted, ThemeColor::Gray),
            (BuildResult::Unstable, "Build Unstable", Gate::Unstable, ThemeColor::Yellow),
            (BuildResult::NotBuilt, "Not Built", Gate::NotBuilt, ThemeColor::Gray),
        ];
        for (result, label, gate, color) in cases {
            let d = notify(&completed(Some(result), Some(BuildResult::Failure), Some(3)));
            assert_eq!(d.status_label, label);
            assert_eq!(d.gate, gate);
            assert_eq!(d.theme_color, Some(color));
        }
    }

    #[test]
    fn test_missing_result_labels_as_success() {
        let d = notify(&completed(None, Some(BuildResult::Success), None));
        assert_eq!(d.status_label, "Build Success");
        assert_eq!(d.theme_color, Some(ThemeColor::Green));
        assert_eq!(d.gate, Gate::Never);

        let d = notify(&completed(None, Some(BuildResult::Failure), None));
        assert_eq!(d.status_label, "Back to Success");
    }

    #[test]
    fn test_previous_in_progress_is_not_back_to_normal() {
        let d = notify(&completed(Some(BuildResult::Success), None, None));
        assert_eq!(d.status_label, "Build Success");
    }

    #[test]
    fn test_started() {
        let mut event = completed(None, None, None);
        event.kind = EventKind::Started { authoritative: true };
        let d = notify(&event);
        assert_eq!(d.status_label, "Build Started");
        assert_eq!(d.gate, Gate::Start);
        assert_eq!(d.theme_color, None);

        event.kind = EventKind::Started { authoritative: false };
        assert_eq!(decide(&event), PolicyOutcome::Skip(SkipReason::NonAuthoritativeStart));
    }

    #[test]
    fn test_message_status() {
        let mut event = completed(None, None, None);
        event.kind = EventKind::Message;
        let d = notify(&event);
        assert_eq!(d.status_label, "Running");
        assert_eq!(d.facts, vec![Fact::new("Status", "Running")]);
        assert_eq!(d.gate, Gate::Always);
        assert_eq!(d.theme_color, None);

        event.status_override = Some("Deploying".to_string());
        let d = notify(&event);
        assert_eq!(d.status_label, "Deploying");
        assert_eq!(d.facts, vec![Fact::new("Status", "Deploying")]);
    }
}
