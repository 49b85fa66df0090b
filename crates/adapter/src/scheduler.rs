use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::pipeline::Pipeline;
use crate::traits::RemoteContentService;

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub check_interval: Duration,
    /// 本轮失败后的等待时间
    pub error_backoff: Duration,
}

/// 轮询主循环。停止信号只在两轮之间生效，进行中的批次总会执行完。
pub async fn run_with_cancel_token<S: RemoteContentService>(
    pipeline: &Pipeline<S>,
    schedule: Schedule,
    cancel_token: CancellationToken,
) {
    while !cancel_token.is_cancelled() {
        let pause = match pipeline.run_once().await {
            Ok(summary) => {
                info!("Cycle finished: {}", summary);
                for failure in &summary.failures {
                    warn!("  {} ({:?}): {}", failure.id, failure.kind, failure.reason);
                }
                schedule.check_interval
            }
            Err(e) => {
                error!("Error processing comments: {}", e);
                schedule.error_backoff
            }
        };

        info!("Sleeping for {} seconds...", pause.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(pause) => {},
            _ = cancel_token.cancelled() => break,
        }
    }

    info!("Scheduler stopped");
}
