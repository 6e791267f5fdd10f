//! Remote instances this server trusts.
//!
//! A trusted host starts out as [`TrustStatus::New`] when an administrator
//!  adds it. The handshake either stores a shared secret (status `Ok`) or
//!  marks it `Failure`. Resetting a host drops the secret so the handshake
//!  runs again.

mod memory;
mod provider;

use serde::{Deserialize, Serialize};

pub use memory::MemoryTrustStore;
pub use provider::TrustStore;

use crate::cloud_id::host_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustStatus {
    New,
    Ok,
    Failure,
}

impl TrustStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustStatus::New => "new",
            TrustStatus::Ok => "ok",
            TrustStatus::Failure => "failure",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "ok" => TrustStatus::Ok,
            "failure" => TrustStatus::Failure,
            _ => TrustStatus::New,
        }
    }
}

impl std::fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedHost {
    pub id: i64,
    /// The URL as the administrator entered it
    pub url: String,
    /// Normalized url, unique across the store
    pub host_key: String,
    /// Only ever set while `status` is `Ok`
    pub shared_secret: Option<String>,
    pub status: TrustStatus,
    /// Token we sent in an outstanding handshake
    pub pending_token: Option<String>,
}

impl TrustedHost {
    pub fn new(id: i64, url: &str) -> Self {
        Self {
            id,
            url: url.trim().to_string(),
            host_key: host_key(url),
            shared_secret: None,
            status: TrustStatus::New,
            pending_token: None,
        }
    }

    pub fn is_established(&self) -> bool {
        self.status == TrustStatus::Ok && self.shared_secret.is_some()
    }
}

/// Random handshake token
pub fn generate_token() -> String {
    use rand::distr::{Alphanumeric, SampleString};

    Alphanumeric.sample_string(&mut rand::rng(), 32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_host_is_normalized() {
        let host = TrustedHost::new(1, " https://B.example/ ");
        assert_eq!(host.url, "https://B.example/");
        assert_eq!(host.host_key, "b.example");
        assert_eq!(host.status, TrustStatus::New);
        assert!(!host.is_established());
    }

    #[test]
    fn test_generate_token() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [TrustStatus::New, TrustStatus::Ok, TrustStatus::Failure] {
            assert_eq!(TrustStatus::from_str(status.as_str()), status);
        }
    }
}
