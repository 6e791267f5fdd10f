//! Federated cloud identifiers
//!
//! A cloud id names a user account on a specific remote instance, written
//! `user@remote`. The remote part may carry a scheme, a port and a path
//! (`alice@https://cloud.example.com:8443/nextcloud`), so the separator is
//! the *last* `@` that occurs before the first `/` or `:` in the string.
//! User names may therefore contain `@` (`bob@corp@cloud.example.com`
//! resolves to user `bob@corp`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const INDEX_PHP: &str = "/index.php";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloudIdError {
    #[error("invalid cloud id: {0}")]
    InvalidIdentifier(String),
}

/// A parsed `user@remote` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CloudId {
    raw: String,
    user: String,
    remote: String,
}

impl CloudId {
    /// Parse a raw cloud id, normalizing the remote part
    pub fn resolve(raw: &str) -> Result<Self, CloudIdError> {
        if !Self::is_well_formed(raw) {
            return Err(CloudIdError::InvalidIdentifier(raw.to_string()));
        }

        let id = normalize_remote(raw);

        // everything from the first '/' or ':' on belongs to the remote
        let boundary = id.find(['/', ':']).unwrap_or(id.len());
        let at = id[..boundary]
            .rfind('@')
            .ok_or_else(|| CloudIdError::InvalidIdentifier(raw.to_string()))?;

        let user = &id[..at];
        let remote = &id[at + 1..];
        if user.is_empty() || remote.is_empty() {
            return Err(CloudIdError::InvalidIdentifier(raw.to_string()));
        }

        Ok(Self {
            raw: id.to_string(),
            user: user.to_string(),
            remote: remote.to_string(),
        })
    }

    /// Build a cloud id from its parts. Never touches the network.
    pub fn build(user: &str, remote: &str) -> Self {
        let remote = normalize_remote(remote).to_string();
        Self {
            raw: format!("{}@{}", user, remote),
            user: user.to_string(),
            remote,
        }
    }

    /// Cheap precondition check run before a full parse
    pub fn is_well_formed(raw: &str) -> bool {
        raw.contains('@')
    }

    /* Getters */

    pub fn id(&self) -> &str {
        &self.raw
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// The id without any `http://` or `https://` prefix on the remote
    pub fn display_id(&self) -> String {
        format!("{}@{}", self.user, strip_scheme(&self.remote))
    }
}

impl fmt::Display for CloudId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for CloudId {
    type Err = CloudIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl Serialize for CloudId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CloudId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::resolve(&raw).map_err(serde::de::Error::custom)
    }
}

/// Strip a trailing `/index.php...` suffix and trailing slashes
pub fn normalize_remote(remote: &str) -> &str {
    let remote = match remote.find(INDEX_PHP) {
        Some(pos) if pos > 0 => &remote[..pos],
        _ => remote,
    };
    remote.trim_end_matches('/')
}

/// Remove a leading `http://` or `https://`, ignoring the scheme's case
pub fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if url.len() >= scheme.len() && url[..scheme.len()].eq_ignore_ascii_case(scheme) {
            return &url[scheme.len()..];
        }
    }
    url
}

/// The key a remote instance is tracked under: scheme, `index.php` suffix
///  and trailing slashes removed, lower-cased
pub fn host_key(url: &str) -> String {
    normalize_remote(strip_scheme(url.trim())).to_lowercase()
}
