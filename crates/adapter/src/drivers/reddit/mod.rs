mod driver;
mod models;

pub use driver::{RedditConfig, RedditDriver, RedditSession};
