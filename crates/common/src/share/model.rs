use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::GroupMembership;

/// Prefix of the placeholder mount point given to shares nobody accepted yet
pub const TEMPORARY_MOUNT_POINT_PREFIX: &str = "{{TemporaryMountPointName#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    User,
    Group,
}

impl ShareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareType::User => "user",
            ShareType::Group => "group",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "group" => ShareType::Group,
            _ => ShareType::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    Pending,
    Accepted,
}

impl ShareStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ShareStatus::Accepted)
    }
}

impl From<bool> for ShareStatus {
    fn from(accepted: bool) -> Self {
        if accepted {
            ShareStatus::Accepted
        } else {
            ShareStatus::Pending
        }
    }
}

/// Which shares a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareFilter {
    #[default]
    All,
    Pending,
    Accepted,
}

impl ShareFilter {
    pub fn matches(&self, status: ShareStatus) -> bool {
        match self {
            ShareFilter::All => true,
            ShareFilter::Pending => status == ShareStatus::Pending,
            ShareFilter::Accepted => status == ShareStatus::Accepted,
        }
    }
}

impl std::str::FromStr for ShareFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ShareFilter::All),
            "pending" => Ok(ShareFilter::Pending),
            "accepted" => Ok(ShareFilter::Accepted),
            other => Err(format!("unknown share filter {:?}", other)),
        }
    }
}

impl std::fmt::Display for ShareFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShareFilter::All => "all",
            ShareFilter::Pending => "pending",
            ShareFilter::Accepted => "accepted",
        })
    }
}

/// A share owned by a remote instance and offered to a local user or group.
///
/// Group shares are stored as one template row addressed to the group plus
///  one row per member who acted on it. A member row carries the
///  template's id in `parent_id`; a member row left `Pending` records that
///  the member declined or removed the share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalShare {
    pub id: i64,
    /// Base URL of the owning instance
    pub remote: String,
    /// Grants access to the share on the owning instance; never leaves
    ///  this instance through the API
    #[serde(skip_serializing, default)]
    pub share_token: String,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub name: String,
    pub owner: String,
    /// A user id, or a group id for group templates
    pub recipient: String,
    pub share_type: ShareType,
    pub mount_point: String,
    pub mount_point_hash: String,
    pub status: ShareStatus,
    /// The share's id on the owning instance
    pub remote_id: String,
    pub parent_id: Option<i64>,
}

impl ExternalShare {
    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }

    pub fn is_group_template(&self) -> bool {
        self.share_type == ShareType::Group && self.parent_id.is_none()
    }

    pub fn is_member_row(&self) -> bool {
        self.parent_id.is_some()
    }

    /// A member row recording that the member turned the share down
    pub fn is_decline_marker(&self) -> bool {
        self.is_member_row() && !self.is_accepted()
    }

    /// Id under which the mount layer tracks this share's storage
    pub fn storage_id(&self) -> String {
        storage_id(&self.share_token, &self.remote)
    }
}

/// An inbound share notification, before it is written to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShare {
    pub remote: String,
    pub token: String,
    #[serde(default)]
    pub password: Option<String>,
    pub name: String,
    pub owner: String,
    pub share_type: ShareType,
    #[serde(default)]
    pub accepted: bool,
    pub recipient: String,
    pub remote_id: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Who is acting on the ledger: a local user and the groups they belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(user_id: &str, groups: Vec<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            groups,
        }
    }

    /// A principal that belongs to no groups
    pub fn user(user_id: &str) -> Self {
        Self::new(user_id, Vec::new())
    }

    pub async fn resolve(user_id: &str, groups: &dyn GroupMembership) -> Self {
        Self::new(user_id, groups.groups_of(user_id).await)
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// The user followed by their groups
    pub fn recipients(&self) -> Vec<String> {
        std::iter::once(self.user_id.clone())
            .chain(self.groups.iter().cloned())
            .collect()
    }
}

pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

pub fn mount_point_hash(mount_point: &str) -> String {
    sha256_hex(mount_point)
}

pub fn storage_id(share_token: &str, remote: &str) -> String {
    format!("shared::{}", sha256_hex(&format!("{}@{}", share_token, remote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(share_type: ShareType, parent_id: Option<i64>, status: ShareStatus) -> ExternalShare {
        ExternalShare {
            id: 1,
            remote: "https://b.example".to_string(),
            share_token: "tok".to_string(),
            password: None,
            name: "Docs".to_string(),
            owner: "bob".to_string(),
            recipient: "alice".to_string(),
            share_type,
            mount_point: "/Docs".to_string(),
            mount_point_hash: mount_point_hash("/Docs"),
            status,
            remote_id: "7".to_string(),
            parent_id,
        }
    }

    #[test]
    fn test_row_kinds() {
        let user = share(ShareType::User, None, ShareStatus::Pending);
        assert!(!user.is_group_template());
        assert!(!user.is_member_row());

        let template = share(ShareType::Group, None, ShareStatus::Pending);
        assert!(template.is_group_template());

        let declined = share(ShareType::Group, Some(1), ShareStatus::Pending);
        assert!(declined.is_decline_marker());

        let accepted = share(ShareType::Group, Some(1), ShareStatus::Accepted);
        assert!(accepted.is_member_row());
        assert!(!accepted.is_decline_marker());
    }

    #[test]
    fn test_storage_id_is_stable() {
        let a = storage_id("tok", "https://b.example");
        assert!(a.starts_with("shared::"));
        assert_eq!(a, storage_id("tok", "https://b.example"));
        assert_ne!(a, storage_id("tok2", "https://b.example"));
    }

    #[test]
    fn test_credentials_are_not_serialized() {
        let mut s = share(ShareType::User, None, ShareStatus::Pending);
        s.password = Some("hunter2".to_string());
        s.share_token = "secret-token".to_string();
        let json = serde_json::to_string(&s).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("secret-token"));

        // API clients read shares back without the credentials
        let parsed: ExternalShare = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.share_token, "");
        assert_eq!(parsed.password, None);
        assert_eq!(parsed.name, s.name);
    }

    #[test]
    fn test_principal_recipients() {
        let p = Principal::new("alice", vec!["research-group".to_string()]);
        assert!(p.is_member_of("research-group"));
        assert!(!p.is_member_of("admins"));
        assert_eq!(p.recipients(), vec!["alice", "research-group"]);
    }

    #[test]
    fn test_filter() {
        assert!(ShareFilter::All.matches(ShareStatus::Pending));
        assert!(ShareFilter::Pending.matches(ShareStatus::Pending));
        assert!(!ShareFilter::Accepted.matches(ShareStatus::Pending));
        assert_eq!("Pending".parse::<ShareFilter>(), Ok(ShareFilter::Pending));
        assert_eq!(ShareFilter::Accepted.to_string(), "accepted");
        assert!("declined".parse::<ShareFilter>().is_err());
    }
}
