mod driver;

pub use driver::{ChatCompletionsConfig, ChatCompletionsDriver};
