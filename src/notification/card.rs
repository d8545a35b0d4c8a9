//! 卡片构建模块 - 把策略决策转换为 webhook payload
//!
//! Payload 格式（字段名与接收方约定一致，不做大小写转换）：
//! ```json
//! {
//!   "summary": "team » api build #12: Build Failed",
//!   "themeColor": "#EF2929",
//!   "sections": [
//!     {
//!       "activityTitle": "Notification from team » api #12: Build Failed",
//!       "facts": [{ "name": "Remarks", "value": "Started by user admin. " }]
//!     }
//!   ],
//!   "potentialActions": [
//!     {
//!       "@type": "OpenUri",
//!       "name": "View Build",
//!       "targets": [{ "os": "default", "uri": "https://ci.example.com/job/api/12/" }]
//!     }
//!   ]
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::event::{BuildEvent, EventKind};
use super::policy::Decision;

/// 键值事实，按插入顺序从上到下渲染
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub name: String,
    pub value: String,
}

impl Fact {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 卡片中的一个段落
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub activity_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
}

/// 动作目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    pub os: String,
    pub uri: String,
}

/// 卡片上的可点击动作
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialAction {
    #[serde(rename = "@type")]
    pub action_type: String,
    pub name: String,
    pub targets: Vec<ActionTarget>,
}

impl PotentialAction {
    /// 打开链接的动作
    pub fn open_uri(name: impl Into<String>, uris: Vec<String>) -> Self {
        Self {
            action_type: "OpenUri".to_string(),
            name: name.into(),
            targets: uris
                .into_iter()
                .map(|uri| ActionTarget {
                    os: "default".to_string(),
                    uri,
                })
                .collect(),
        }
    }
}

/// 通知卡片（构建后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_actions: Option<Vec<PotentialAction>>,
}

/// 卡片构建器
pub struct CardBuilder {
    /// 深链接动作的显示名
    action_name: String,
}

impl CardBuilder {
    pub fn new() -> Self {
        Self {
            action_name: "View Build".to_string(),
        }
    }

    /// 设置深链接动作的显示名
    pub fn with_action_name(mut self, name: impl Into<String>) -> Self {
        self.action_name = name.into();
        self
    }

    /// 构建卡片
    ///
    /// 纯函数：相同输入总是得到逐字段相同的卡片。
    /// `context_facts` 由宿主侧收集，排在策略事实之后。
    pub fn build(&self, event: &BuildEvent, decision: &Decision, context_facts: &[Fact]) -> Card {
        let label = &decision.status_label;
        let summary = format!("{} build #{}: {}", event.display_name, event.number, label);

        let (activity_title, text) = match event.kind {
            EventKind::Message => (
                format!("Notification from {}({})", event.job_name, event.number),
                event.message.clone(),
            ),
            EventKind::Started { .. } | EventKind::Completed => (
                format!(
                    "Notification from {} #{}: {}",
                    escape_markup(&event.display_name),
                    event.number,
                    label
                ),
                None,
            ),
        };

        let facts = decision
            .facts
            .iter()
            .chain(context_facts.iter())
            .cloned()
            .collect();

        let potential_actions = event
            .link
            .as_ref()
            .map(|link| vec![PotentialAction::open_uri(&self.action_name, vec![link.clone()])]);

        Card {
            summary,
            theme_color: decision.theme_color.map(|c| c.hex().to_string()),
            sections: vec![Section {
                activity_title,
                text,
                facts,
            }],
            potential_actions,
        }
    }
}

impl Default for CardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 转义轻量标记字符 `* _ # -`，避免标题被渲染成格式
pub fn escape_markup(name: &str) -> String {
    static MARKUP: OnceLock<Regex> = OnceLock::new();
    let re = MARKUP.get_or_init(|| Regex::new(r"([*_#-])").expect("static regex"));
    re.replace_all(name, r"\$1").into_owned()
}
