//! Trust handshake: the one-time exchange of a shared secret with a
//!  remote instance, retried in the background with exponential backoff.
//!
//! Per `(target_host, token)` a handshake moves through
//!  `Scheduled -> Running -> {Succeeded, RetryScheduled, PermanentlyFailed}`,
//!  with `RetryScheduled` looping back to `Scheduled` once the backoff
//!  window has passed.

mod jobs;
mod memory;
mod queue;
mod scheduler;
mod task;

pub use jobs::{HandshakeDispatcher, HandshakeJob, HandshakeJobReceiver};
pub use memory::MemoryRetryQueue;
pub use queue::RetryQueue;
pub use scheduler::{
    HandshakeConfig, HandshakeError, HandshakeScheduler, KillReason, TickOutcome,
    DEFAULT_BASE_INTERVAL, DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_RETRIES,
};
pub use task::{HandshakePayload, RetryTask};
