//! 出题调度核心：掌握度账本、优先级模型、加权抽样、各模式组卷与答题会话。
//! 除 `engine` 外全部同步、无 I/O。

pub mod builders;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod priority;
pub mod profile;
pub mod rewards;
pub mod sampler;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::ItemCatalog;
pub use config::SchedulerConfig;
pub use engine::{EngineError, ProfileRepository, QuizEngine};
pub use ledger::{Ledger, MasteryRecord};
pub use profile::ProfileSnapshot;
pub use sampler::QuizRng;
pub use session::{SessionDriver, SessionState};
pub use types::{AnswerRecord, Item, QuizMode, Tag};
