//! Webhook 通知器 - 宿主生命周期回调的入口
//!
//! 流程：生命周期事件 → 策略判断 → 卡片构建 → 分发 → N 个投递 worker。
//!
//! 所有回调都是同步函数，提交投递任务后立即返回，不等待网络 I/O，
//! 也不会把任何失败传回宿主，构建结果不受通知影响。

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NotifierConfig;
use crate::delivery::{TaskPool, WebhookTransport, LIFECYCLE_RETRIES};
use crate::notification::card::{Card, CardBuilder};
use crate::notification::destination::DestinationRegistry;
use crate::notification::dispatcher::{DeliveryHandle, DeliveryTarget, Dispatcher};
use crate::notification::event::{BuildEvent, EventKind, StepParameters};
use crate::notification::facts::context_facts;
use crate::notification::policy::{decide, PolicyOutcome, SkipReason};
use crate::notification::run::RunRef;

/// 一次通知的准备结果
#[derive(Debug)]
pub enum Plan {
    /// 任务没有注册任何目的地
    NotConfigured,
    /// 策略决定不产生卡片
    NotGenerated(SkipReason),
    /// 卡片与接收它的目标
    Ready { card: Card, targets: Vec<DeliveryTarget> },
}

/// 回调结果
#[derive(Debug)]
pub enum NotifyOutcome {
    NotConfigured,
    NotGenerated(SkipReason),
    /// 已提交的投递（可能为空：没有目的地订阅该事件）
    Dispatched(Vec<DeliveryHandle>),
}

impl NotifyOutcome {
    /// 提交的投递数量
    pub fn dispatched(&self) -> usize {
        match self {
            NotifyOutcome::Dispatched(handles) => handles.len(),
            _ => 0,
        }
    }
}

#[derive(Clone, Copy)]
enum Trigger<'a> {
    Started { pre_execution_hook: bool },
    Completed,
    Message(&'a StepParameters),
}

/// Webhook 通知器
pub struct WebhookNotifier {
    registry: Arc<dyn DestinationRegistry>,
    dispatcher: Dispatcher,
    card_builder: CardBuilder,
    root_url: Option<String>,
}

impl WebhookNotifier {
    /// 创建通知器，执行池由宿主拥有
    pub fn new(
        registry: Arc<dyn DestinationRegistry>,
        pool: TaskPool,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            registry,
            dispatcher: Dispatcher::new(pool, transport),
            card_builder: CardBuilder::new(),
            root_url: None,
        }
    }

    /// 从配置创建（配置本身作为目的地注册表）
    pub fn from_config(
        config: NotifierConfig,
        pool: TaskPool,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        let root_url = config.root_url.clone();
        Self::new(Arc::new(config), pool, transport).with_root_url(root_url)
    }

    /// 设置深链接基础 URL
    pub fn with_root_url(mut self, root_url: Option<String>) -> Self {
        self.root_url = root_url;
        self
    }

    /// 设置卡片构建器
    pub fn with_card_builder(mut self, builder: CardBuilder) -> Self {
        self.card_builder = builder;
        self
    }

    pub fn pool(&self) -> &TaskPool {
        self.dispatcher.pool()
    }

    /// 构建开始回调
    pub fn on_build_started(&self, run: &dyn RunRef, is_pre_execution_hook: bool) -> NotifyOutcome {
        self.notify(
            run,
            Trigger::Started {
                pre_execution_hook: is_pre_execution_hook,
            },
        )
    }

    /// 构建完成回调
    pub fn on_build_completed(&self, run: &dyn RunRef) -> NotifyOutcome {
        self.notify(run, Trigger::Completed)
    }

    /// 自定义消息回调
    pub fn on_custom_message(&self, run: &dyn RunRef, params: &StepParameters) -> NotifyOutcome {
        self.notify(run, Trigger::Message(params))
    }

    /// 预览开始通知（不发送）
    pub fn preview_started(&self, run: &dyn RunRef, is_pre_execution_hook: bool) -> Plan {
        self.plan(
            run,
            Trigger::Started {
                pre_execution_hook: is_pre_execution_hook,
            },
        )
    }

    /// 预览完成通知（不发送）
    pub fn preview_completed(&self, run: &dyn RunRef) -> Plan {
        self.plan(run, Trigger::Completed)
    }

    /// 预览自定义消息（不发送）
    pub fn preview_message(&self, run: &dyn RunRef, params: &StepParameters) -> Plan {
        self.plan(run, Trigger::Message(params))
    }

    fn notify(&self, run: &dyn RunRef, trigger: Trigger<'_>) -> NotifyOutcome {
        match self.plan(run, trigger) {
            Plan::NotConfigured => NotifyOutcome::NotConfigured,
            Plan::NotGenerated(reason) => NotifyOutcome::NotGenerated(reason),
            Plan::Ready { card, targets } => {
                dispatch_outcome(&run.info().job_name, self.dispatcher.dispatch(&card, targets))
            }
        }
    }

    fn plan(&self, run: &dyn RunRef, trigger: Trigger<'_>) -> Plan {
        let info = run.info();
        let root_url = self.root_url.as_deref();

        // 显式 URL 的消息不需要任务注册表
        let explicit = match trigger {
            Trigger::Message(params) => params.webhook_url.as_ref().map(|url| DeliveryTarget {
                url: url.clone(),
                timeout: Duration::from_millis(params.timeout_ms.max(1)),
                max_retries: params.retries,
            }),
            _ => None,
        };

        let destinations = if explicit.is_some() {
            Vec::new()
        } else {
            match self.registry.destinations(&info.job_name) {
                Some(dests) if !dests.is_empty() => dests,
                _ => {
                    debug!(job = %info.job_name, "No webhooks to notify");
                    return Plan::NotConfigured;
                }
            }
        };

        let event = match trigger {
            Trigger::Started { pre_execution_hook } => BuildEvent::started(run, pre_execution_hook, root_url),
            Trigger::Completed => BuildEvent::completed(run, root_url),
            Trigger::Message(params) => BuildEvent::message(run, params, root_url),
        };

        let decision = match decide(&event) {
            PolicyOutcome::Notify(decision) => decision,
            PolicyOutcome::Skip(reason) => {
                info!(job = %info.job_name, number = info.number, reason = %reason, "{} card not generated", label(&event.kind));
                return Plan::NotGenerated(reason);
            }
        };

        let facts = match event.kind {
            EventKind::Message => Vec::new(),
            _ => context_facts(run),
        };
        let card = self.card_builder.build(&event, &decision, &facts);

        let targets = match (explicit, trigger) {
            (Some(target), _) => vec![target],
            (None, Trigger::Message(params)) => destinations
                .into_iter()
                .map(|dest| DeliveryTarget {
                    timeout: dest.timeout(),
                    url: dest.url,
                    max_retries: params.retries,
                })
                .collect(),
            (None, _) => destinations
                .into_iter()
                .filter(|dest| {
                    let allowed = dest.subscriptions.allows(decision.gate);
                    if !allowed {
                        debug!(url = %dest.url, gate = ?decision.gate, "No need to notify webhook");
                    }
                    allowed
                })
                .map(|dest| DeliveryTarget {
                    timeout: dest.timeout(),
                    url: dest.url,
                    max_retries: LIFECYCLE_RETRIES,
                })
                .collect(),
        };

        Plan::Ready { card, targets }
    }
}

/// 序列化失败时不提交任何投递，与"没有订阅者"区分开
fn dispatch_outcome(
    job_name: &str,
    dispatched: Result<Vec<DeliveryHandle>, serde_json::Error>,
) -> NotifyOutcome {
    match dispatched {
        Ok(handles) => NotifyOutcome::Dispatched(handles),
        Err(e) => {
            warn!(job = %job_name, error = %e, "Failed to serialize card");
            NotifyOutcome::NotGenerated(SkipReason::CardNotSerializable {
                message: e.to_string(),
            })
        }
    }
}

fn label(kind: &EventKind) -> &'static str {
    match kind {
        EventKind::Started { .. } => "Build started",
        EventKind::Completed => "Build completed",
        EventKind::Message => "Build message",
    }
}
