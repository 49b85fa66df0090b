pub mod llm;
pub mod reddit;
