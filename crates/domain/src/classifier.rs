use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::Comment;
use crate::policy::{PolicyConfig, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldReason {
    /// 正文包含忽略标记
    Ignored,
    TooNew,
    /// 已带水印，等待删除时间
    AwaitingDeletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    NoOp(HoldReason),
    Obfuscate(StrategyKind),
    Delete,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::NoOp(reason) => write!(f, "no-op ({:?})", reason),
            LifecycleAction::Obfuscate(kind) => write!(f, "obfuscate ({})", kind),
            LifecycleAction::Delete => write!(f, "delete"),
        }
    }
}

/// 为单条评论决定生命周期动作。纯函数，按顺序首个命中的规则生效。
pub fn classify(comment: &Comment, now: DateTime<Utc>, config: &PolicyConfig) -> LifecycleAction {
    // 1. 忽略标记拥有绝对优先级
    if let Some(flag) = config.ignore_flag() {
        if comment.body.contains(flag) {
            return LifecycleAction::NoOp(HoldReason::Ignored);
        }
    }

    let age = comment.age(now);
    if age < config.expire_after() {
        return LifecycleAction::NoOp(HoldReason::TooNew);
    }

    let deletion_due = age >= config.delete_after();

    if config.collapses_obfuscation() && deletion_due {
        return LifecycleAction::Delete;
    }

    // 2. 已混淆的评论只可能再被删除
    if comment.body.contains(config.watermark()) {
        return if deletion_due {
            LifecycleAction::Delete
        } else {
            LifecycleAction::NoOp(HoldReason::AwaitingDeletion)
        };
    }

    if deletion_due {
        return LifecycleAction::Delete;
    }

    match config.strategy().kind() {
        StrategyKind::Delete => LifecycleAction::Delete,
        kind => LifecycleAction::Obfuscate(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Strategy;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn config(expire: i64, delete: i64, strategy: Strategy) -> PolicyConfig {
        PolicyConfig::new(
            Duration::minutes(expire),
            Duration::minutes(delete),
            strategy,
            "#rtbf",
            true,
            "/fn",
            100,
        )
        .unwrap()
    }

    fn default_config() -> PolicyConfig {
        config(
            120,
            1440,
            Strategy::Update {
                replacement_text: "[Comment deleted by user]".to_string(),
            },
        )
    }

    fn aged(body: &str, minutes: i64) -> Comment {
        Comment::new("t1_abc", body, now() - Duration::minutes(minutes))
    }

    #[test]
    fn test_obfuscates_inside_window() {
        let action = classify(&aged("hello", 130), now(), &default_config());
        assert_eq!(action, LifecycleAction::Obfuscate(StrategyKind::Update));
    }

    #[test]
    fn test_deletes_watermarked_comment_once_due() {
        let comment = aged("[Comment deleted by user] ^(#rtbf)", 1500);
        assert_eq!(classify(&comment, now(), &default_config()), LifecycleAction::Delete);
    }

    #[test]
    fn test_watermarked_comment_waits_for_deletion() {
        let comment = aged("[Comment deleted by user] ^(#rtbf)", 130);
        assert_eq!(
            classify(&comment, now(), &default_config()),
            LifecycleAction::NoOp(HoldReason::AwaitingDeletion)
        );
    }

    #[test]
    fn test_too_new() {
        for minutes in [0, 1, 119] {
            assert_eq!(
                classify(&aged("hello", minutes), now(), &default_config()),
                LifecycleAction::NoOp(HoldReason::TooNew)
            );
        }
        // 时钟偏差导致的负年龄
        let future = Comment::new("t1_f", "hello", now() + Duration::minutes(5));
        assert_eq!(
            classify(&future, now(), &default_config()),
            LifecycleAction::NoOp(HoldReason::TooNew)
        );
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let config = default_config();
        assert_eq!(
            classify(&aged("hello", 120), now(), &config),
            LifecycleAction::Obfuscate(StrategyKind::Update)
        );
        assert_eq!(classify(&aged("hello", 1440), now(), &config), LifecycleAction::Delete);
    }

    #[test]
    fn test_ignore_flag_is_absolute() {
        let configs = [
            default_config(),
            config(60, 60, Strategy::Emoji),
            config(0, 0, Strategy::Delete),
        ];
        for config in &configs {
            for minutes in [0, 61, 130, 1500, 10_000, 1_000_000] {
                for body in ["keep this /fn", "/fn ^(#rtbf)"] {
                    assert_eq!(
                        classify(&aged(body, minutes), now(), config),
                        LifecycleAction::NoOp(HoldReason::Ignored)
                    );
                }
            }
        }
    }

    #[test]
    fn test_collapsed_window_never_obfuscates() {
        let config = config(60, 60, Strategy::Emoji);
        assert_eq!(classify(&aged("hello", 61), now(), &config), LifecycleAction::Delete);
        for minutes in (0..3000).step_by(7) {
            let action = classify(&aged("hello", minutes), now(), &config);
            assert!(!matches!(action, LifecycleAction::Obfuscate(_)));
        }
    }

    #[test]
    fn test_eventual_deletion() {
        let strategies = [
            Strategy::Emoji,
            Strategy::Delete,
            Strategy::Update {
                replacement_text: "x".to_string(),
            },
        ];
        for strategy in strategies {
            let config = config(120, 1440, strategy);
            for minutes in [1440, 1441, 5000, 100_000] {
                for body in ["hello", "x ^(#rtbf)", ""] {
                    assert_eq!(
                        classify(&aged(body, minutes), now(), &config),
                        LifecycleAction::Delete
                    );
                }
            }
        }
    }

    #[test]
    fn test_obfuscation_is_idempotent() {
        let config = default_config();
        let comment = aged("hello", 130);
        assert!(matches!(
            classify(&comment, now(), &config),
            LifecycleAction::Obfuscate(_)
        ));

        let processed = Comment {
            body: format!("[Comment deleted by user] ^({})", config.watermark()),
            ..comment
        };
        assert!(!matches!(
            classify(&processed, now(), &config),
            LifecycleAction::Obfuscate(_)
        ));
    }

    #[test]
    fn test_delete_strategy_skips_obfuscation() {
        let config = config(120, 1440, Strategy::Delete);
        assert_eq!(classify(&aged("hello", 130), now(), &config), LifecycleAction::Delete);
    }

    #[test]
    fn test_disabled_ignore_flag() {
        let config = PolicyConfig::new(
            Duration::minutes(1),
            Duration::minutes(10),
            Strategy::Emoji,
            "#rtbf",
            true,
            "",
            10,
        )
        .unwrap();
        assert_eq!(
            classify(&aged("keep this /fn", 5), now(), &config),
            LifecycleAction::Obfuscate(StrategyKind::Emoji)
        );
    }
}
