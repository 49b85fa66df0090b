use anyhow::bail;
use chrono::Duration;
use config::ConfigError;
use domain::{PolicyConfig, PolicyError, Strategy, StrategyKind};
use serde::Deserialize;
use std::collections::HashMap;

const APP_PREFIX: &str = "RTBF_";

/// 旧版工具使用的扁平环境变量 -> 配置路径
const LEGACY_ENV: &[(&str, &str)] = &[
    ("REDDIT_USERNAME", "reddit.username"),
    ("REDDIT_PASSWORD", "reddit.password"),
    ("REDDIT_CLIENT_ID", "reddit.client_id"),
    ("REDDIT_CLIENT_SECRET", "reddit.client_secret"),
    ("REDDIT_USER_AGENT", "reddit.user_agent"),
    ("EXPIRE_MINUTES", "policy.expire_minutes"),
    ("DELETE_MINUTES", "policy.delete_minutes"),
    ("STRATEGY", "policy.strategy"),
    ("REPLACEMENT_TEXT", "policy.replacement_text"),
    ("WATERMARK", "policy.watermark"),
    ("APPEND_WATERMARK", "policy.append_watermark"),
    ("FLAG_IGNORE", "policy.ignore_flag"),
    ("COMMENT_LIMIT", "policy.comment_limit"),
    ("CHECK_INTERVAL_MINUTES", "schedule.check_interval_minutes"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_PROMPT", "llm.prompt"),
    ("LLM_API_URL", "llm.api_url"),
    ("LLM_API_KEY", "llm.api_key"),
    ("LOG_LEVEL", "log.level"),
];

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub reddit: RedditSettings,
    pub policy: PolicySettings,
    pub schedule: ScheduleSettings,
    pub llm: LlmSettings,
    pub log: LogSettings,
}

#[derive(Deserialize, Clone)]
pub struct RedditSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_agent: String,
    pub auth_url: String,
    pub api_url: String,
}

#[derive(Deserialize, Clone)]
pub struct PolicySettings {
    pub expire_minutes: i64,
    pub delete_minutes: i64,
    pub strategy: String,
    pub replacement_text: String,
    pub watermark: String,
    pub append_watermark: bool,
    pub ignore_flag: String,
    pub comment_limit: usize,
}

#[derive(Deserialize, Clone)]
pub struct ScheduleSettings {
    pub check_interval_minutes: u64,
    pub error_backoff_seconds: u64,
    pub mutation_spacing_ms: u64,
}

#[derive(Deserialize, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub prompt: String,
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "production".to_string());
        Self::load(&run_mode, std::env::vars())
    }

    pub fn load(
        run_mode: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let env_map = collect_env_vars(vars);

        let s = config::Config::builder()
            .set_default("reddit.user_agent", "comment_manager by u/user")?
            .set_default("reddit.auth_url", "https://www.reddit.com")?
            .set_default("reddit.api_url", "https://oauth.reddit.com")?
            .set_default("policy.expire_minutes", 120)?
            .set_default("policy.delete_minutes", 1440)?
            .set_default("policy.strategy", "update")?
            .set_default("policy.replacement_text", "[Comment deleted by user]")?
            .set_default("policy.watermark", "#rtbf")?
            .set_default("policy.append_watermark", true)?
            .set_default("policy.ignore_flag", "/fn")?
            .set_default("policy.comment_limit", 100)?
            .set_default("schedule.check_interval_minutes", 30)?
            .set_default("schedule.error_backoff_seconds", 60)?
            .set_default("schedule.mutation_spacing_ms", 1000)?
            .set_default("llm.model", "gpt-3.5-turbo")?
            .set_default(
                "llm.prompt",
                "Rewrite this comment in a more friendly tone: {comment}",
            )?
            .set_default("llm.api_url", "https://api.openai.com/v1/chat/completions")?
            .set_default("log.level", "info")?
            .add_source(config::File::with_name("rtbf").required(false))
            .add_source(config::File::with_name(&format!("rtbf.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .map_err(|e| ConfigError::Foreign(Box::new(e)))?,
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }

    /// 缺失的 Reddit 凭据，一次性全部列出
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let r = &self.reddit;
        [
            ("REDDIT_USERNAME", &r.username),
            ("REDDIT_PASSWORD", &r.password),
            ("REDDIT_CLIENT_ID", &r.client_id),
            ("REDDIT_CLIENT_SECRET", &r.client_secret),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| name)
        .collect()
    }

    pub fn reddit_config(&self) -> anyhow::Result<adapter::RedditConfig> {
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            bail!("Missing required settings: {}", missing.join(", "));
        }

        let r = self.reddit.clone();
        Ok(adapter::RedditConfig {
            username: r.username.unwrap_or_default(),
            password: r.password.unwrap_or_default(),
            client_id: r.client_id.unwrap_or_default(),
            client_secret: r.client_secret.unwrap_or_default(),
            user_agent: r.user_agent,
            auth_url: r.auth_url,
            api_url: r.api_url,
        })
    }

    pub fn policy_config(&self) -> Result<PolicyConfig, PolicyError> {
        let p = &self.policy;
        let strategy = match p.strategy.parse::<StrategyKind>()? {
            StrategyKind::Delete => Strategy::Delete,
            StrategyKind::Update => Strategy::Update {
                replacement_text: p.replacement_text.clone(),
            },
            StrategyKind::Emoji => Strategy::Emoji,
            StrategyKind::Generate => Strategy::Generate {
                prompt_template: self.llm.prompt.clone(),
                model: self.llm.model.clone(),
            },
        };

        let expire_after = Duration::try_minutes(p.expire_minutes)
            .ok_or(PolicyError::DurationOutOfRange("expire_minutes"))?;
        let delete_after = Duration::try_minutes(p.delete_minutes)
            .ok_or(PolicyError::DurationOutOfRange("delete_minutes"))?;

        PolicyConfig::new(
            expire_after,
            delete_after,
            strategy,
            p.watermark.clone(),
            p.append_watermark,
            p.ignore_flag.clone(),
            p.comment_limit,
        )
    }

    pub fn llm_config(&self) -> adapter::ChatCompletionsConfig {
        adapter::ChatCompletionsConfig {
            api_url: self.llm.api_url.clone(),
            api_key: self.llm.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    pub fn schedule(&self) -> anyhow::Result<adapter::Schedule> {
        let interval_secs = match self.schedule.check_interval_minutes.checked_mul(60) {
            Some(0) => bail!("check_interval_minutes must be a positive integer"),
            Some(secs) => secs,
            None => bail!("check_interval_minutes is too large"),
        };

        Ok(adapter::Schedule {
            check_interval: std::time::Duration::from_secs(interval_secs),
            error_backoff: std::time::Duration::from_secs(self.schedule.error_backoff_seconds),
        })
    }

    pub fn mutation_spacing(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.schedule.mutation_spacing_ms)
    }
}

/// `RTBF_POLICY__EXPIRE_MINUTES` -> `policy.expire_minutes`；前缀变量优先于旧版变量
fn collect_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    let mut legacy = HashMap::new();
    let mut prefixed = HashMap::new();

    for (k, v) in vars {
        if let Some(rest) = k.strip_prefix(APP_PREFIX) {
            prefixed.insert(rest.replace("__", ".").to_lowercase(), v);
        } else if let Some((_, path)) = LEGACY_ENV.iter().find(|(name, _)| *name == k) {
            let v = if *path == "log.level" { v.to_lowercase() } else { v };
            legacy.insert(path.to_string(), v);
        }
    }

    legacy.extend(prefixed);
    legacy
}
