//! Background worker that drains the embedding sync outbox.
//!
//! Tool mutations enqueue tasks; this worker applies them against the
//! embedding store, re-enqueues failures with backoff up to the attempt
//! limit, and idles on a poll interval when the queue is empty.

use std::sync::Arc;
use std::time::Duration;

use zeno_core::SyncOutbox;

use crate::state::AppState;

/// Spawn the worker loop. Runs for the life of the process.
pub fn spawn(state: Arc<AppState>) {
    tokio::spawn(async move {
        let idle = Duration::from_secs(state.config.worker_poll_secs.max(1));
        tracing::info!(target: "zeno::sync", "Sync worker started (idle poll {:?})", idle);
        loop {
            match step(&state).await {
                StepOutcome::Processed => {}
                StepOutcome::Empty => tokio::time::sleep(idle).await,
                StepOutcome::Backoff(delay) => tokio::time::sleep(delay).await,
            }
        }
    });
}

enum StepOutcome {
    Processed,
    Empty,
    Backoff(Duration),
}

async fn step(state: &AppState) -> StepOutcome {
    let task = match state.outbox.next().await {
        Ok(Some(task)) => task,
        Ok(None) => return StepOutcome::Empty,
        Err(e) => {
            tracing::warn!(target: "zeno::sync", "Outbox poll failed: {}", e);
            return StepOutcome::Empty;
        }
    };

    match state.sync.apply(&task).await {
        Ok(()) => {
            tracing::debug!(
                target: "zeno::sync",
                "Applied {:?} for tool {}",
                task.op,
                task.tool_id
            );
            StepOutcome::Processed
        }
        Err(e) => {
            tracing::warn!(
                target: "zeno::sync",
                "{:?} for tool {} failed (attempt {}): {}",
                task.op,
                task.tool_id,
                task.attempts + 1,
                e
            );
            let delay = SyncOutbox::backoff(task.attempts);
            match state.outbox.retry(task).await {
                Ok(true) => StepOutcome::Backoff(delay),
                Ok(false) => StepOutcome::Processed,
                Err(e) => {
                    tracing::error!(target: "zeno::sync", "Failed to re-enqueue task: {}", e);
                    StepOutcome::Processed
                }
            }
        }
    }
}

/// Apply queued tasks until the outbox is empty. Tests use this instead of
/// waiting on the spawned loop; failed tasks are retried inline without
/// the backoff sleeps.
pub async fn drain(state: &AppState) -> usize {
    let mut processed = 0;
    loop {
        match step(state).await {
            StepOutcome::Empty => return processed,
            StepOutcome::Processed | StepOutcome::Backoff(_) => processed += 1,
        }
    }
}
