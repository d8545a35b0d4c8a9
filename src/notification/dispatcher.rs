//! 通知分发器 - 把一张卡片扇出到多个目的地
//!
//! 卡片只序列化一次，得到的 payload 以只读方式在所有 worker 间共享。

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::delivery::{DeliveryJob, DeliveryOutcome, DeliveryWorker, TaskPool, WebhookTransport};
use crate::notification::card::Card;

/// 一个投递目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub url: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// 已提交投递的句柄，等待与否由调用方决定
#[derive(Debug)]
pub struct DeliveryHandle {
    pub url: String,
    pub handle: JoinHandle<DeliveryOutcome>,
}

/// 通知分发器
#[derive(Clone)]
pub struct Dispatcher {
    pool: TaskPool,
    transport: Arc<dyn WebhookTransport>,
}

impl Dispatcher {
    pub fn new(pool: TaskPool, transport: Arc<dyn WebhookTransport>) -> Self {
        Self { pool, transport }
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// 为每个目标提交一个独立的 worker，立即返回
    pub fn dispatch(
        &self,
        card: &Card,
        targets: Vec<DeliveryTarget>,
    ) -> Result<Vec<DeliveryHandle>, serde_json::Error> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let payload: Arc<str> = Arc::from(serde_json::to_string(card)?);

        let handles = targets
            .into_iter()
            .map(|target| {
                debug!(url = %target.url, summary = %card.summary, "Submitting webhook delivery");
                let job = DeliveryJob {
                    url: target.url.clone(),
                    payload: Arc::clone(&payload),
                    timeout: target.timeout,
                    max_retries: target.max_retries,
                };
                let worker = DeliveryWorker::new(Arc::clone(&self.transport), job);
                DeliveryHandle {
                    url: target.url,
                    handle: self.pool.submit(worker.run()),
                }
            })
            .collect();

        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::DeliveryError;
    use crate::notification::card::Section;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 记录收到的 payload
    #[derive(Default)]
    struct RecordingTransport {
        bodies: Mutex<Vec<(String, Arc<str>)>>,
    }

    #[async_trait]
    impl WebhookTransport for RecordingTransport {
        async fn post_json(
            &self,
            url: &str,
            body: Arc<str>,
            _timeout: Duration,
        ) -> Result<u16, DeliveryError> {
            self.bodies.lock().unwrap().push((url.to_string(), body));
            Ok(200)
        }
    }

    fn card() -> Card {
        Card {
            summary: "api build #1: Build Success".to_string(),
            theme_color: None,
            sections: vec![Section {
                activity_title: "Notification from api #1: Build Success".to_string(),
                text: None,
                facts: vec![],
            }],
            potential_actions: None,
        }
    }

    fn target(url: &str) -> DeliveryTarget {
        DeliveryTarget {
            url: url.to_string(),
            timeout: Duration::from_secs(1),
            max_retries: 3,
        }
    }

    #[tokio::test]
    async fn test_empty_targets_is_noop() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(TaskPool::current(), transport.clone());

        let handles = dispatcher.dispatch(&card(), vec![]).unwrap();
        assert!(handles.is_empty());
        assert_eq!(dispatcher.pool().in_flight(), 0);
    }

    #[tokio::test]
    async fn test_payload_serialized_once_and_shared() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = Dispatcher::new(TaskPool::current(), transport.clone());

        let handles = dispatcher
            .dispatch(&card(), vec![target("https://a"), target("https://a"), target("https://b")])
            .unwrap();
        assert_eq!(handles.len(), 3);
        for h in handles {
            assert!(h.handle.await.unwrap().is_delivered());
        }

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 3);
        // 同一个 Arc，而不是三份拷贝
        assert!(Arc::ptr_eq(&bodies[0].1, &bodies[1].1));
        assert!(Arc::ptr_eq(&bodies[0].1, &bodies[2].1));

        let parsed: Card = serde_json::from_str(&bodies[0].1).unwrap();
        assert_eq!(parsed, card());
    }
}
