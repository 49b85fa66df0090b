use domain::{PolicyConfig, RenderError, Strategy, PROMPT_PLACEHOLDER};
use rand::seq::SliceRandom;

use crate::traits::TextGenerator;

pub const EMOJI_POOL: &[&str] = &[
    "😀", "😂", "😊", "😍", "🤔", "😎", "😢", "😡", "🙄", "😴", "👍", "👎", "👌", "✌️", "🤷",
    "🔥", "💯", "❤️", "🎉", "🤝", "🌟", "⚡", "💡", "🎯", "🚀", "💪", "🎈", "🎁", "☕", "🍕",
];

/// 生成替换正文，并按配置追加水印。
///
/// `Strategy::Delete` 不会走到这里，分类器对它只会给出 `Delete`；
/// 若仍被调用则退化为仅含水印的正文。
pub async fn render(
    config: &PolicyConfig,
    body: &str,
    generator: Option<&dyn TextGenerator>,
) -> Result<String, RenderError> {
    let text = match config.strategy() {
        Strategy::Update { replacement_text } => replacement_text.clone(),
        Strategy::Emoji => random_emoji().to_string(),
        Strategy::Generate {
            prompt_template,
            model,
        } => {
            let generator = generator.ok_or(RenderError::NoGenerator)?;
            let prompt = fill_prompt(prompt_template, body);
            let text = generator.complete(&prompt, model).await?;
            // 带忽略标记的正文会让该评论永远不被删除
            if let Some(flag) = config.ignore_flag() {
                if text.contains(flag) {
                    return Err(RenderError::GeneratedIgnoreFlag(flag.to_string()));
                }
            }
            text
        }
        Strategy::Delete => String::new(),
    };

    if config.append_watermark() {
        Ok(with_watermark(&text, config.watermark()))
    } else {
        Ok(text)
    }
}

pub fn random_emoji() -> &'static str {
    EMOJI_POOL
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("🤷")
}

pub fn fill_prompt(template: &str, body: &str) -> String {
    template.replacen(PROMPT_PLACEHOLDER, body, 1)
}

/// `text ^(watermark)`：Reddit 上标语法，水印仍是纯子串
pub fn with_watermark(text: &str, watermark: &str) -> String {
    if text.is_empty() {
        format!("^({})", watermark)
    } else {
        format!("{} ^({})", text, watermark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use domain::GenerationError;
    use std::sync::Mutex;

    struct EchoGenerator {
        prompts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn complete(&self, prompt: &str, model: &str) -> Result<String, GenerationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), model.to_string()));
            Ok("a friendlier comment".to_string())
        }
    }

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _: &str, _: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn complete(&self, _: &str, _: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Transport("connection refused".to_string()))
        }
    }

    fn config(strategy: Strategy, append_watermark: bool) -> PolicyConfig {
        PolicyConfig::new(
            Duration::minutes(120),
            Duration::minutes(1440),
            strategy,
            "#rtbf",
            append_watermark,
            "/fn",
            100,
        )
        .unwrap()
    }

    fn generate() -> Strategy {
        Strategy::Generate {
            prompt_template: "Rewrite this comment in a more friendly tone: {comment}".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_appends_watermark() {
        let config = config(
            Strategy::Update {
                replacement_text: "[Comment deleted by user]".to_string(),
            },
            true,
        );
        let text = render(&config, "hello", None).await.unwrap();
        assert_eq!(text, "[Comment deleted by user] ^(#rtbf)");
        assert!(text.contains(config.watermark()));
        assert!(!text.contains("/fn"));
    }

    #[tokio::test]
    async fn test_watermark_can_be_disabled() {
        let config = config(
            Strategy::Update {
                replacement_text: "gone".to_string(),
            },
            false,
        );
        assert_eq!(render(&config, "hello", None).await.unwrap(), "gone");
    }

    #[tokio::test]
    async fn test_emoji_comes_from_pool() {
        let config = config(Strategy::Emoji, false);
        for _ in 0..20 {
            let text = render(&config, "hello", None).await.unwrap();
            assert!(EMOJI_POOL.contains(&text.as_str()));
        }
    }

    #[tokio::test]
    async fn test_generate_substitutes_body() {
        let generator = EchoGenerator {
            prompts: Mutex::new(Vec::new()),
        };
        let config = config(generate(), true);

        let text = render(&config, "u r wrong", Some(&generator)).await.unwrap();
        assert_eq!(text, "a friendlier comment ^(#rtbf)");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            (
                "Rewrite this comment in a more friendly tone: u r wrong".to_string(),
                "gpt-3.5-turbo".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_generate_failure_is_surfaced() {
        let config = config(generate(), true);

        let err = render(&config, "hello", Some(&DownGenerator)).await.unwrap_err();
        assert!(matches!(err, RenderError::Generation(GenerationError::Transport(_))));

        let err = render(&config, "hello", None).await.unwrap_err();
        assert_eq!(err, RenderError::NoGenerator);
    }

    #[tokio::test]
    async fn test_generated_ignore_flag_is_rejected() {
        let config = config(generate(), true);
        let generator = FixedGenerator("ok, see /fn for details");

        let err = render(&config, "hello", Some(&generator)).await.unwrap_err();
        assert_eq!(err, RenderError::GeneratedIgnoreFlag("/fn".to_string()));
    }

    #[test]
    fn test_fill_prompt_replaces_first_placeholder_only() {
        assert_eq!(fill_prompt("a {comment} b {comment}", "x"), "a x b {comment}");
    }
}
