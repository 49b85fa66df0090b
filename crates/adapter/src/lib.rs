mod drivers;
mod pipeline;
mod rate_limit;
mod scheduler;
mod strategy;
mod traits;

pub use drivers::llm::{ChatCompletionsConfig, ChatCompletionsDriver};
pub use drivers::reddit::{RedditConfig, RedditDriver, RedditSession};
pub use pipeline::Pipeline;
pub use rate_limit::RateLimiter;
pub use scheduler::{run_with_cancel_token, Schedule};
pub use strategy::{render, EMOJI_POOL};
pub use traits::{RemoteContentService, TextGenerator};
