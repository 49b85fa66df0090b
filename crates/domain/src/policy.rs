use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PolicyError;

pub const PROMPT_PLACEHOLDER: &str = "{comment}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Delete,
    Update,
    Emoji,
    Generate,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Delete => "delete",
            StrategyKind::Update => "update",
            StrategyKind::Emoji => "emoji",
            StrategyKind::Generate => "generate",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(StrategyKind::Delete),
            "update" => Ok(StrategyKind::Update),
            "emoji" => Ok(StrategyKind::Emoji),
            // 旧版配置中的名字
            "generate" | "llm" => Ok(StrategyKind::Generate),
            _ => Err(PolicyError::UnknownStrategy(s.to_string())),
        }
    }
}

/// 混淆策略，每个分支只携带自己需要的数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Delete,
    Update { replacement_text: String },
    Emoji,
    Generate { prompt_template: String, model: String },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Delete => StrategyKind::Delete,
            Strategy::Update { .. } => StrategyKind::Update,
            Strategy::Emoji => StrategyKind::Emoji,
            Strategy::Generate { .. } => StrategyKind::Generate,
        }
    }
}

/// 一次运行内不可变的策略配置
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    expire_after: Duration,
    delete_after: Duration,
    strategy: Strategy,
    watermark: String,
    append_watermark: bool,
    ignore_flag: Option<String>,
    comment_limit: usize,
}

impl PolicyConfig {
    /// `ignore_flag` 为空字符串时视为关闭忽略规则。
    pub fn new(
        expire_after: Duration,
        delete_after: Duration,
        strategy: Strategy,
        watermark: impl Into<String>,
        append_watermark: bool,
        ignore_flag: impl Into<String>,
        comment_limit: usize,
    ) -> Result<Self, PolicyError> {
        let watermark = watermark.into();
        let ignore_flag = Some(ignore_flag.into()).filter(|f| !f.is_empty());

        if expire_after < Duration::zero() {
            return Err(PolicyError::NegativeDuration("expire_after"));
        }
        if delete_after < Duration::zero() {
            return Err(PolicyError::NegativeDuration("delete_after"));
        }
        if delete_after < expire_after {
            return Err(PolicyError::DeleteBeforeExpire {
                expire_after: expire_after.num_minutes(),
                delete_after: delete_after.num_minutes(),
            });
        }
        if comment_limit == 0 {
            return Err(PolicyError::ZeroLimit);
        }
        if watermark.is_empty() {
            return Err(PolicyError::EmptyWatermark);
        }

        if let Some(flag) = &ignore_flag {
            if watermark.contains(flag.as_str()) {
                return Err(PolicyError::WatermarkContainsIgnoreFlag {
                    watermark,
                    ignore_flag: flag.clone(),
                });
            }
            if let Strategy::Update { replacement_text } = &strategy {
                if replacement_text.contains(flag.as_str()) {
                    return Err(PolicyError::ReplacementContainsIgnoreFlag(flag.clone()));
                }
            }
        }

        if let Strategy::Generate { prompt_template, .. } = &strategy {
            if !prompt_template.contains(PROMPT_PLACEHOLDER) {
                return Err(PolicyError::MissingPromptPlaceholder);
            }
        }

        Ok(Self {
            expire_after,
            delete_after,
            strategy,
            watermark,
            append_watermark,
            ignore_flag,
            comment_limit,
        })
    }

    pub fn expire_after(&self) -> Duration {
        self.expire_after
    }

    pub fn delete_after(&self) -> Duration {
        self.delete_after
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn watermark(&self) -> &str {
        &self.watermark
    }

    pub fn append_watermark(&self) -> bool {
        self.append_watermark
    }

    pub fn ignore_flag(&self) -> Option<&str> {
        self.ignore_flag.as_deref()
    }

    pub fn comment_limit(&self) -> usize {
        self.comment_limit
    }

    /// 过期与删除时间相同时跳过混淆，直接删除
    pub fn collapses_obfuscation(&self) -> bool {
        self.delete_after == self.expire_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> Strategy {
        Strategy::Update {
            replacement_text: "[Comment deleted by user]".to_string(),
        }
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!("update".parse::<StrategyKind>(), Ok(StrategyKind::Update));
        assert_eq!(" Emoji ".parse::<StrategyKind>(), Ok(StrategyKind::Emoji));
        assert_eq!("llm".parse::<StrategyKind>(), Ok(StrategyKind::Generate));
        assert_eq!(
            "shred".parse::<StrategyKind>(),
            Err(PolicyError::UnknownStrategy("shred".to_string()))
        );
    }

    #[test]
    fn test_rejects_delete_before_expire() {
        let err = PolicyConfig::new(
            Duration::minutes(120),
            Duration::minutes(60),
            update(),
            "#rtbf",
            true,
            "/fn",
            100,
        )
        .unwrap_err();
        assert_eq!(
            err,
            PolicyError::DeleteBeforeExpire {
                expire_after: 120,
                delete_after: 60
            }
        );
    }

    #[test]
    fn test_rejects_markers_that_would_block_deletion() {
        let err = PolicyConfig::new(
            Duration::minutes(1),
            Duration::minutes(2),
            update(),
            "#rtbf/fn",
            true,
            "/fn",
            100,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::WatermarkContainsIgnoreFlag { .. }));

        let err = PolicyConfig::new(
            Duration::minutes(1),
            Duration::minutes(2),
            Strategy::Update {
                replacement_text: "gone /fn".to_string(),
            },
            "#rtbf",
            true,
            "/fn",
            100,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::ReplacementContainsIgnoreFlag("/fn".to_string()));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let build = |limit: usize, watermark: &str, strategy: Strategy| {
            PolicyConfig::new(
                Duration::minutes(1),
                Duration::minutes(2),
                strategy,
                watermark,
                true,
                "/fn",
                limit,
            )
        };

        assert_eq!(build(0, "#rtbf", update()).unwrap_err(), PolicyError::ZeroLimit);
        assert_eq!(build(1, "", update()).unwrap_err(), PolicyError::EmptyWatermark);
        assert_eq!(
            build(
                1,
                "#rtbf",
                Strategy::Generate {
                    prompt_template: "no placeholder".to_string(),
                    model: "m".to_string()
                }
            )
            .unwrap_err(),
            PolicyError::MissingPromptPlaceholder
        );
    }

    #[test]
    fn test_empty_ignore_flag_disables_rule() {
        let config = PolicyConfig::new(
            Duration::minutes(60),
            Duration::minutes(60),
            Strategy::Emoji,
            "#rtbf",
            true,
            "",
            10,
        )
        .unwrap();
        assert_eq!(config.ignore_flag(), None);
        assert!(config.collapses_obfuscation());
    }
}
