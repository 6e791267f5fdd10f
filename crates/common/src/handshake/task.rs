use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cloud_id::normalize_remote;

/// Record of the handshake as it was queued: the host being asked, the
///  token offered to it and when. Stored with the task for inspection; a
///  tick builds its request from the task itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub url: String,
    pub token: String,
    /// Unix timestamp of `initiate`
    pub created: i64,
}

/// A pending shared-secret exchange with one remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryTask {
    pub target_host: String,
    pub token: String,
    pub payload: HandshakePayload,
    pub retry_count: u32,
    pub last_run_at: Option<OffsetDateTime>,
}

impl RetryTask {
    pub fn new(target_host: &str, token: &str, now: OffsetDateTime) -> Self {
        let target_host = normalize_remote(target_host.trim()).to_string();
        Self {
            payload: HandshakePayload {
                url: target_host.clone(),
                token: token.to_string(),
                created: now.unix_timestamp(),
            },
            target_host,
            token: token.to_string(),
            retry_count: 0,
            last_run_at: None,
        }
    }
}

impl std::fmt::Display for RetryTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (attempt {}, token {}…)",
            self.target_host,
            self.retry_count,
            self.token.chars().take(4).collect::<String>()
        )
    }
}
