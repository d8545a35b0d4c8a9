//! 上下文事实 - 触发原因与 SCM 摘要

use super::card::Fact;
use super::run::RunRef;

/// 收集运行的上下文事实
///
/// 有触发原因时输出 `Remarks`；原因中包含 SCM 变更时再追加 SCM 事实。
pub fn context_facts(run: &dyn RunRef) -> Vec<Fact> {
    let mut facts = Vec::new();

    if let Some(causes) = run.causes() {
        let remarks: String = causes.iter().map(|c| format!("{}. ", c)).collect();
        let scm_triggered = remarks.contains("SCM change");
        facts.push(Fact::new("Remarks", remarks));

        if scm_triggered {
            facts.extend(run.scm_facts());
        }
    }

    facts
}
