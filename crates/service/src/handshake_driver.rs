//! Background task that keeps trust handshakes moving.
//!
//! It sweeps the retry queue on a fixed interval (the first sweep runs at
//!  startup, picking up handshakes left over from a previous run) and
//!  whenever a freshly queued handshake dispatches a job.

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use common::handshake::{HandshakeJob, HandshakeScheduler, TickOutcome};

pub async fn run_driver(
    scheduler: HandshakeScheduler,
    mut job_stream: flume::r#async::RecvStream<'static, HandshakeJob>,
    sweep_interval: Duration,
    mut shutdown_rx: watch::Receiver<()>,
) {
    tracing::info!(
        interval_secs = sweep_interval.as_secs(),
        "Starting handshake driver"
    );

    let mut sweep_timer = interval(sweep_interval);
    sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                break;
            }

            Some(job) = job_stream.next() => {
                match job {
                    HandshakeJob::RunDue => sweep(&scheduler).await,
                }
            }

            _ = sweep_timer.tick() => {
                sweep(&scheduler).await;
            }
        }
    }

    tracing::info!("Handshake driver shutting down");
}

/// Run one pass over the retry queue and log what happened to each task
pub async fn sweep(scheduler: &HandshakeScheduler) {
    let outcomes = match scheduler.run_due().await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!("Handshake sweep failed: {}", e);
            return;
        }
    };

    for (task, outcome) in outcomes {
        match outcome {
            TickOutcome::NotDue | TickOutcome::Superseded => {}
            TickOutcome::Succeeded => {
                tracing::info!(host = %task.target_host, "handshake completed")
            }
            TickOutcome::Retrying { retry_count } => tracing::info!(
                host = %task.target_host,
                retry_count,
                "handshake failed, will retry"
            ),
            outcome => tracing::warn!(
                host = %task.target_host,
                ?outcome,
                "handshake abandoned"
            ),
        }
    }
}
