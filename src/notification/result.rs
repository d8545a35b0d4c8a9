//! 构建结果与主题色映射

use serde::{Deserialize, Serialize};

/// 构建结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl BuildResult {
    /// 原始名称（与宿主一致的大写形式）
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
        }
    }

    /// 严重程度，数值越大越差
    fn ordinal(&self) -> u8 {
        match self {
            BuildResult::Success => 0,
            BuildResult::Unstable => 1,
            BuildResult::Failure => 2,
            BuildResult::NotBuilt => 3,
            BuildResult::Aborted => 4,
        }
    }

    /// 是否比另一个结果更差
    pub fn is_worse_than(&self, other: BuildResult) -> bool {
        self.ordinal() > other.ordinal()
    }

    /// 结果对应的主题色
    pub fn color(&self) -> ThemeColor {
        match self {
            BuildResult::Success => ThemeColor::Green,
            BuildResult::Unstable => ThemeColor::Yellow,
            BuildResult::Failure => ThemeColor::Red,
            BuildResult::NotBuilt | BuildResult::Aborted => ThemeColor::Gray,
        }
    }
}

/// 卡片主题色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl ThemeColor {
    /// HTML 十六进制颜色
    pub fn hex(&self) -> &'static str {
        match self {
            ThemeColor::Green => "#3FB950",
            ThemeColor::Yellow => "#FCE94F",
            ThemeColor::Red => "#EF2929",
            ThemeColor::Gray => "#9D9D9D",
        }
    }
}
