//! 通知器配置
//!
//! 配置读取优先级：
//! 1. 命令行 `--config` 指定的文件
//! 2. 默认配置文件 `~/.config/build-webhook-notifier/config.json`
//! 3. 文件不存在时使用空配置（没有任何目的地）
//!
//! 环境变量 `BWN_ROOT_URL` 非空时覆盖 `root_url`。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::notification::destination::{Destination, DestinationRegistry, DEFAULT_TIMEOUT_MS};

/// 覆盖 root_url 的环境变量
pub const ROOT_URL_ENV: &str = "BWN_ROOT_URL";

/// 通知器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// 深链接基础 URL（如 https://ci.example.com/）
    pub root_url: Option<String>,
    /// 默认超时（毫秒）
    pub default_timeout_ms: u64,
    /// 同时进行的投递上限（None 表示不限制）
    pub max_concurrent_deliveries: Option<usize>,
    /// 按任务名注册的目的地
    pub jobs: HashMap<String, Vec<Destination>>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            root_url: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent_deliveries: None,
            jobs: HashMap::new(),
        }
    }
}

impl NotifierConfig {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("build-webhook-notifier")
            .join("config.json")
    }

    /// 加载配置（可选路径），并应用环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config = Self::load_file(&path)?;

        if let Ok(root_url) = std::env::var(ROOT_URL_ENV) {
            if !root_url.is_empty() {
                debug!("Using {} from environment", ROOT_URL_ENV);
                config.root_url = Some(root_url);
            }
        }

        Ok(config)
    }

    /// 从文件加载；文件不存在时返回空配置
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, no destinations registered");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    /// 补齐目的地超时：缺省或为零时使用 `default_timeout_ms`
    fn normalize(&mut self) {
        if self.default_timeout_ms == 0 {
            warn!("Zero default timeout configured, using {}ms", DEFAULT_TIMEOUT_MS);
            self.default_timeout_ms = DEFAULT_TIMEOUT_MS;
        }
        let fallback = self.default_timeout_ms;
        for (job, destinations) in self.jobs.iter_mut() {
            for dest in destinations.iter_mut() {
                match dest.timeout_ms {
                    Some(0) => {
                        warn!(job = %job, url = %dest.url, "Zero timeout configured, using default");
                        dest.timeout_ms = Some(fallback);
                    }
                    None => dest.timeout_ms = Some(fallback),
                    Some(_) => {}
                }
            }
        }
    }
}

impl DestinationRegistry for NotifierConfig {
    fn destinations(&self, job_name: &str) -> Option<Vec<Destination>> {
        self.jobs.get(job_name).cloned()
    }
}
