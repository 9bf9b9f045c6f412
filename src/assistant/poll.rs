use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::llm::{
    assistants::{AssistantsApi, Run, RunStatus},
    LlmError,
};

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until a terminal status.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn new(interval_ms: u64, max_attempts: u32) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            max_attempts: (max_attempts > 0).then_some(max_attempts),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(2000, 150)
    }
}

/// Waits for `run` to reach a terminal status, sleeping before every poll.
///
/// Only `completed` and `failed` end the wait; any other status keeps polling
/// until the attempt ceiling or the token fires.
pub async fn wait_for_run(
    api: &dyn AssistantsApi,
    sleeper: &dyn Sleeper,
    policy: PollPolicy,
    thread_id: &str,
    run: Run,
    cancel: &CancellationToken,
) -> Result<Run, LlmError> {
    let run_id = run.id;
    let mut status = run.status;
    let mut attempts = 0u32;

    loop {
        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            warn!("Run {} still {} after {} polls", run_id, status.as_str(), attempts);
            return Err(LlmError::PollTimeout {
                run_id,
                status: status.as_str().to_string(),
                attempts,
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            _ = sleeper.sleep(policy.interval) => {}
        }
        attempts += 1;

        let current = api.get_run(thread_id, &run_id).await?;
        status = current.status;
        debug!("Run {} poll {}: {}", run_id, attempts, status.as_str());

        match status {
            RunStatus::Completed => return Ok(current),
            RunStatus::Failed => {
                let detail = current
                    .last_error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| "assistant run failed".to_string());
                return Err(LlmError::RunFailed { run_id, detail });
            }
            _ => continue,
        }
    }
}
