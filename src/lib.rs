//! Build Webhook Notifier - 把 CI 构建生命周期事件推送到 webhook

pub mod cli;
pub mod config;
pub mod delivery;
pub mod notification;
pub mod notifier;

pub use config::NotifierConfig;
pub use delivery::{DeliveryError, DeliveryOutcome, HttpTransport, TaskPool, WebhookTransport};
pub use notification::{
    AnyRun, BuildResult, Card, CardBuilder, Destination, DestinationRegistry, StepParameters,
    Subscriptions,
};
pub use notifier::{NotifyOutcome, Plan, WebhookNotifier};
