//! 宿主构建运行的抽象
//!
//! 宿主负责读取构建元数据，这里只定义核心逻辑需要的能力：
//! - `RunRef`：统一的运行引用接口，由宿主在调用核心前选择具体实现
//! - `ClassicRun`：经典顺序构建，直接暴露单个变更集与责任人
//! - `PipelineRun`：流水线构建，暴露变更集列表
//! - `RunHistory`：历史运行，用于推导上一次结果与"持续失败起点"

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::card::Fact;
use super::result::BuildResult;

/// 运行类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// 经典构建（有独立的预执行钩子）
    Classic,
    /// 流水线等其他构建
    Pipeline,
}

/// 历史运行记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// 运行编号
    pub number: u32,
    /// 运行结果（进行中为 None）
    #[serde(default)]
    pub result: Option<BuildResult>,
    /// 运行类型（None 表示与当前运行相同）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RunKind>,
}

/// 历史解析错误
#[derive(Debug, Error, PartialEq)]
pub enum HistoryError {
    /// 解析出的运行与当前运行类型不一致
    #[error("run #{number} is a {found:?} run, expected {expected:?}")]
    KindMismatch {
        number: u32,
        expected: RunKind,
        found: RunKind,
    },
}

/// 当前运行之前的历史（按编号从旧到新）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunHistory(Vec<HistoryEntry>);

impl RunHistory {
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    /// 上一次运行的结果；没有上一次运行时视为 Success
    pub fn previous_result(&self) -> Option<BuildResult> {
        match self.0.last() {
            Some(entry) => entry.result,
            None => Some(BuildResult::Success),
        }
    }

    /// 推导持续失败的起点
    ///
    /// 从当前运行向前找到最近一次非 Failure 的运行，其后一次运行即为起点；
    /// 若不存在这样的运行，则起点为该任务的第一次运行。
    pub fn failing_since(&self, current: u32, kind: RunKind) -> Result<u32, HistoryError> {
        let last_not_failed = self
            .0
            .iter()
            .rposition(|entry| entry.result != Some(BuildResult::Failure));

        let since = match last_not_failed {
            Some(idx) => self.0.get(idx + 1),
            None => self.0.first(),
        };

        let (number, found) = match since {
            Some(entry) => (entry.number, entry.kind.unwrap_or(kind)),
            None => (current, kind),
        };

        if found != kind {
            return Err(HistoryError::KindMismatch {
                number,
                expected: kind,
                found,
            });
        }
        Ok(number)
    }
}

/// 运行的公共信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    /// 任务名称
    pub job_name: String,
    /// 任务完整显示名（含文件夹等父级）
    pub display_name: String,
    /// 运行编号
    pub number: u32,
    /// 运行的相对路径（拼接 root_url 得到深链接）
    pub url: String,
    /// 当前结果（进行中为 None）
    #[serde(default)]
    pub result: Option<BuildResult>,
    /// 历史运行
    #[serde(default)]
    pub history: RunHistory,
    /// 触发原因的简短描述
    #[serde(default)]
    pub causes: Option<Vec<String>>,
}

/// 单条变更
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// 作者全名
    pub author: String,
    /// 受影响的文件（SCM 不支持时为 None）
    #[serde(default)]
    pub affected_files: Option<Vec<String>>,
}

/// 变更集
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(pub Vec<ChangeEntry>);

impl ChangeSet {
    fn collect_into(&self, authors: &mut BTreeSet<String>, files: &mut BTreeSet<String>) {
        for entry in &self.0 {
            authors.insert(entry.author.clone());
            match &entry.affected_files {
                Some(paths) => files.extend(paths.iter().cloned()),
                None => debug!(author = %entry.author, "Affected files not available"),
            }
        }
    }
}

/// 运行引用 - 核心逻辑访问宿主运行的唯一入口
pub trait RunRef: Send + Sync {
    /// 公共信息
    fn info(&self) -> &RunInfo;

    /// 运行类型
    fn kind(&self) -> RunKind;

    /// SCM 相关事实（作者、责任人、变更文件数）
    fn scm_facts(&self) -> Vec<Fact>;

    /// 触发原因
    fn causes(&self) -> Option<&[String]> {
        self.info().causes.as_deref()
    }
}

/// 经典构建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicRun {
    #[serde(flatten)]
    pub info: RunInfo,
    /// 本次构建的变更集
    #[serde(default)]
    pub change_set: ChangeSet,
    /// 责任人（宿主未提供时为 None）
    #[serde(default)]
    pub culprits: Option<Vec<String>>,
}

impl RunRef for ClassicRun {
    fn info(&self) -> &RunInfo {
        &self.info
    }

    fn kind(&self) -> RunKind {
        RunKind::Classic
    }

    fn scm_facts(&self) -> Vec<Fact> {
        let mut facts = Vec::new();

        if let Some(culprits) = &self.culprits {
            let names: BTreeSet<&str> = culprits.iter().map(String::as_str).collect();
            facts.push(Fact::new("Culprits", join(names)));
        }

        if self.change_set.0.is_empty() {
            return facts;
        }

        let mut authors = BTreeSet::new();
        let mut files = BTreeSet::new();
        self.change_set.collect_into(&mut authors, &mut files);

        if !authors.is_empty() {
            facts.push(Fact::new("Developers", join(authors.iter().map(String::as_str))));
        }
        if !files.is_empty() {
            facts.push(Fact::new("Number Of Files Changed", files.len().to_string()));
        }
        facts
    }
}

/// 流水线构建
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    #[serde(flatten)]
    pub info: RunInfo,
    /// 所有检出产生的变更集
    #[serde(default)]
    pub change_sets: Vec<ChangeSet>,
}

impl RunRef for PipelineRun {
    fn info(&self) -> &RunInfo {
        &self.info
    }

    fn kind(&self) -> RunKind {
        RunKind::Pipeline
    }

    fn scm_facts(&self) -> Vec<Fact> {
        let mut facts = Vec::new();
        let mut authors = BTreeSet::new();
        let mut files = BTreeSet::new();
        for set in &self.change_sets {
            set.collect_into(&mut authors, &mut files);
        }

        if !authors.is_empty() {
            let names = join(authors.iter().map(String::as_str));
            let broken = self
                .info
                .result
                .map(|r| r.is_worse_than(BuildResult::Success))
                .unwrap_or(false);
            if broken {
                facts.push(Fact::new("Culprits", names.clone()));
            }
            facts.push(Fact::new("Developers", names));
        }
        if !files.is_empty() {
            facts.push(Fact::new("Number of Files Changed", files.len().to_string()));
        }
        facts
    }
}

/// 宿主传入的任意运行（JSON 中以 `kind` 区分）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnyRun {
    Classic(ClassicRun),
    Pipeline(PipelineRun),
}

impl AnyRun {
    pub fn as_run_ref(&self) -> &dyn RunRef {
        match self {
            AnyRun::Classic(run) => run,
            AnyRun::Pipeline(run) => run,
        }
    }
}

fn join<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}
