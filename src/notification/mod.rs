//! 通知模型层 - 从宿主运行到卡片
//!
//! # 流程
//! 1. `event`：把宿主回调解析成不可变的 `BuildEvent` 快照
//! 2. `policy`：纯函数判断是否通知、状态标签、主题色与订阅开关
//! 3. `facts` + `card`：收集上下文事实并构建卡片
//! 4. `dispatcher`：序列化一次，扇出到每个目的地的投递 worker

pub mod card;
pub mod destination;
pub mod dispatcher;
pub mod event;
pub mod facts;
pub mod policy;
pub mod result;
pub mod run;

pub use card::{escape_markup, Card, CardBuilder, Fact, PotentialAction, Section};
pub use destination::{Destination, DestinationRegistry, Subscriptions};
pub use dispatcher::{DeliveryHandle, DeliveryTarget, Dispatcher};
pub use event::{BuildEvent, EventKind, StepParameters};
pub use facts::context_facts;
pub use policy::{decide, Decision, Gate, PolicyOutcome, SkipReason};
pub use result::{BuildResult, ThemeColor};
pub use run::{AnyRun, ClassicRun, HistoryEntry, PipelineRun, RunHistory, RunInfo, RunKind, RunRef};
