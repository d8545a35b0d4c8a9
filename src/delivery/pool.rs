//! 执行池 - 由宿主创建并注入的投递任务池
//!
//! 提交永远不会阻塞：任务直接 spawn 到运行时上。可选的并发上限通过
//! 信号量在任务内部获取许可，不影响提交方。

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// 投递任务池
#[derive(Clone)]
pub struct TaskPool {
    handle: Handle,
    tracker: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
}

impl TaskPool {
    /// 在给定运行时上创建任务池
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            tracker: TaskTracker::new(),
            limiter: None,
        }
    }

    /// 使用当前运行时（必须在 tokio 上下文内调用）
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// 限制同时进行的投递数量
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    /// 提交任务，立即返回
    pub fn submit<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let limiter = self.limiter.clone();
        let task = async move {
            // 信号量从不关闭，acquire 不会失败
            let _permit = match limiter {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };
            task.await
        };
        self.tracker.spawn_on(task, &self.handle)
    }

    /// 正在运行的任务数
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// 停止接收并等待所有已提交任务完成
    pub async fn drain(&self) {
        debug!(in_flight = self.tracker.len(), "Draining delivery pool");
        self.tracker.close();
        self.tracker.wait().await;
    }
}
