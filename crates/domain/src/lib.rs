mod classifier;
mod error;
mod models;
mod policy;
mod summary;

pub use classifier::{classify, HoldReason, LifecycleAction};
pub use error::{GenerationError, PolicyError, RenderError, ServiceError};
pub use models::Comment;
pub use policy::{PolicyConfig, Strategy, StrategyKind, PROMPT_PLACEHOLDER};
pub use summary::{FailureKind, ItemFailure, RunSummary};
