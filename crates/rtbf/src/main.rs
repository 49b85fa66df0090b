mod config;

use adapter::{
    ChatCompletionsDriver, Pipeline, RateLimiter, RedditDriver, RemoteContentService,
};
use anyhow::Context;
use domain::{PolicyConfig, Strategy};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let settings = Settings::new().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let schedule = settings.schedule()?;
    let reddit_config = settings.reddit_config()?;
    let policy = settings
        .policy_config()
        .context("Invalid comment policy")?;

    info!("Starting comment manager...");
    log_configuration(&settings, &policy);

    let service = RedditDriver::new(reddit_config)?;

    // 启动时先认证一次，失败则直接退出
    match service.authenticate().await {
        Ok(session) => info!("Authenticated as: {}", session.username()),
        Err(e) => {
            error!("Authentication failed: {}", e);
            return Err(e).context("Startup authentication failed");
        }
    }

    let mut pipeline = Pipeline::new(
        service,
        policy,
        RateLimiter::new(settings.mutation_spacing()),
    );
    if matches!(pipeline.policy().strategy(), Strategy::Generate { .. }) {
        let generator = ChatCompletionsDriver::new(settings.llm_config())?;
        pipeline = pipeline.with_generator(Arc::new(generator));
    }

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    adapter::run_with_cancel_token(&pipeline, schedule, cancel_token).await;

    info!("Comment manager stopped");
    Ok(())
}

fn log_configuration(settings: &Settings, policy: &PolicyConfig) {
    info!(
        "Configuration: EXPIRE_MINUTES={} (obfuscation), DELETE_MINUTES={} (deletion), STRATEGY={}, \
         CHECK_INTERVAL={}, WATERMARK={}, FLAG_IGNORE={}, APPEND_WATERMARK={}, LOG_LEVEL={}, COMMENT_LIMIT={}",
        policy.expire_after().num_minutes(),
        policy.delete_after().num_minutes(),
        policy.strategy().kind(),
        settings.schedule.check_interval_minutes,
        policy.watermark(),
        policy.ignore_flag().unwrap_or("<disabled>"),
        policy.append_watermark(),
        settings.log.level,
        policy.comment_limit()
    );

    if let Strategy::Generate {
        prompt_template,
        model,
    } = policy.strategy()
    {
        let api_key_status = if settings.llm_config().api_key.is_some() {
            "configured"
        } else {
            "not set (unauthenticated)"
        };
        let prompt: String = prompt_template.chars().take(50).collect();
        let ellipsis = if prompt_template.chars().count() > 50 { "..." } else { "" };
        info!(
            "LLM Configuration: MODEL={}, API_URL={}, API_KEY={}, PROMPT={}{}",
            model, settings.llm.api_url, api_key_status, prompt, ellipsis
        );
    }

    if !policy.append_watermark() {
        // 没有水印就无法从正文判断是否已处理
        warn!("APPEND_WATERMARK is disabled: obfuscated comments will be obfuscated again every cycle until deleted");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received interrupt signal, finishing current cycle before shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, finishing current cycle before shutting down...");
        },
    }
}
