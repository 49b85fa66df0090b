use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// 固定最小间隔的节流器，每次变更请求前调用 `wait`
pub struct RateLimiter {
    spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_call: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            tokio::time::sleep_until(last + self.spacing).await;
        }
        *last_call = Some(Instant::now());
    }
}
