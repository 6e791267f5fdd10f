use std::collections::HashSet;
use std::sync::Arc;

use super::feedback::{Feedback, FeedbackAction, FeedbackError};
use super::provider::ShareStore;
use super::{
    mount_point_hash, ExternalShare, NewShare, Principal, ShareFilter, ShareStatus, ShareType,
    TEMPORARY_MOUNT_POINT_PREFIX,
};
use crate::cloud_id::{host_key, normalize_remote, CloudId};
use crate::ports::MountProvider;
use crate::store::StoreError;
use crate::trust::TrustStore;

/// Suffixes tried before giving up on finding a free mount point
pub const MAX_MOUNT_POINT_ATTEMPTS: u32 = 100;
pub const DEFAULT_SHARE_FOLDER: &str = "/";
/// Used when a share arrives with an empty name
const FALLBACK_SHARE_NAME: &str = "Shared";

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Folder, relative to each user's root, that accepted shares mount under
    pub share_folder: String,
    /// Accept user shares from trusted remotes without asking
    pub auto_accept_trusted: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            share_folder: DEFAULT_SHARE_FOLDER.to_string(),
            auto_accept_trusted: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("share not found")]
    NotFound,
    #[error("share {0} is not addressed to this user")]
    AccessDenied(i64),
    #[error("invalid share: {0}")]
    InvalidShare(String),
    #[error("no free mount point left for {0:?}")]
    MountPointExhausted(String),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    /// The share is accepted locally; only telling the owner failed
    #[error("share {id} accepted but the owner was not notified: {source}")]
    Feedback { id: i64, source: FeedbackError },
}

/// Outcome of creating a group member row
enum MemberRow {
    Inserted(ExternalShare),
    Existing(ExternalShare),
}

/// The recipient side of federated shares: records offers from remote
///  instances and applies each user's accept, decline and remove decisions.
#[derive(Debug, Clone)]
pub struct ShareLedger {
    store: Arc<dyn ShareStore>,
    trust: Arc<dyn TrustStore>,
    mounts: Arc<dyn MountProvider>,
    feedback: Feedback,
    config: LedgerConfig,
}

impl ShareLedger {
    pub fn new(
        store: Arc<dyn ShareStore>,
        trust: Arc<dyn TrustStore>,
        mounts: Arc<dyn MountProvider>,
        feedback: Feedback,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            trust,
            mounts,
            feedback,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Record a share offered to a user or group. Pending shares get a
    ///  placeholder mount point; pre-accepted ones are mounted right away.
    pub async fn add_share(&self, new: NewShare) -> Result<ExternalShare, ShareError> {
        validate(&new)?;

        let name = share_name(&new.name);
        let mut accepted = new.accepted;
        if accepted && new.share_type == ShareType::Group && new.parent_id.is_none() {
            tracing::debug!(group = %new.recipient, "group shares are never pre-accepted");
            accepted = false;
        }

        let base = if accepted {
            self.final_mount_base(&name)
        } else {
            temporary_mount_base(&name)
        };

        let row = ExternalShare {
            id: 0,
            remote: normalize_remote(new.remote.trim()).to_string(),
            share_token: new.token,
            password: new.password,
            name,
            owner: new.owner,
            recipient: new.recipient,
            share_type: new.share_type,
            mount_point: String::new(),
            mount_point_hash: String::new(),
            status: ShareStatus::from(accepted),
            remote_id: new.remote_id,
            parent_id: new.parent_id,
        };
        let share = self.insert_unique(row, &base).await?;

        tracing::info!(
            id = share.id,
            remote = %share.remote,
            recipient = %share.recipient,
            share_type = share.share_type.as_str(),
            accepted,
            "share added"
        );
        if accepted {
            self.materialize(&share).await;
        }
        Ok(share)
    }

    /// Entry point for share notifications arriving from a remote
    pub async fn receive_share(&self, new: NewShare) -> Result<ExternalShare, ShareError> {
        let remote = new.remote.trim();
        let key = host_key(remote);
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(ShareError::InvalidShare(format!("unparseable remote {:?}", new.remote)));
        }
        if CloudId::resolve(&format!("{}@{}", new.owner, remote)).is_err() {
            return Err(ShareError::InvalidShare(format!("invalid owner {:?}", new.owner)));
        }

        let accepted = new.share_type == ShareType::User
            && self.config.auto_accept_trusted
            && self.trust.is_trusted(remote).await?;

        self.add_share(NewShare {
            accepted,
            parent_id: None,
            ..new
        })
        .await
    }

    /// Fetch one share the principal is allowed to see
    pub async fn get_share(
        &self,
        principal: &Principal,
        id: i64,
    ) -> Result<ExternalShare, ShareError> {
        let share = self.store.get(id).await?.ok_or(ShareError::NotFound)?;
        let allowed = if share.is_group_template() {
            principal.is_member_of(&share.recipient)
        } else {
            share.recipient == principal.user_id
        };
        if !allowed {
            return Err(ShareError::AccessDenied(id));
        }
        Ok(share)
    }

    /// Accept a share and mount it under the share folder. Accepting a
    ///  share that is already accepted returns it unchanged.
    pub async fn accept_share(
        &self,
        principal: &Principal,
        id: i64,
    ) -> Result<ExternalShare, ShareError> {
        let share = self.get_share(principal, id).await?;
        let base = self.final_mount_base(&share.name);

        let accepted = if share.is_group_template() {
            match self.store.find_member_row(share.id, &principal.user_id).await? {
                Some(row) if row.is_accepted() => return Ok(row),
                Some(row) => self.move_unique(&row, &base, ShareStatus::Accepted).await?,
                None => {
                    let row = ExternalShare {
                        recipient: principal.user_id.clone(),
                        status: ShareStatus::Accepted,
                        parent_id: Some(share.id),
                        ..share.clone()
                    };
                    match self.insert_member_row(row, &base).await? {
                        MemberRow::Inserted(row) => row,
                        // a concurrent request got there first
                        MemberRow::Existing(row) if row.is_accepted() => return Ok(row),
                        MemberRow::Existing(row) => {
                            self.move_unique(&row, &base, ShareStatus::Accepted).await?
                        }
                    }
                }
            }
        } else if share.is_accepted() {
            return Ok(share);
        } else {
            self.move_unique(&share, &base, ShareStatus::Accepted).await?
        };

        tracing::info!(
            id = accepted.id,
            user = %principal.user_id,
            mount_point = %accepted.mount_point,
            "share accepted"
        );
        self.materialize(&accepted).await;

        self.feedback
            .notify_remote(
                &accepted.remote,
                &accepted.share_token,
                &accepted.remote_id,
                FeedbackAction::Accept,
            )
            .await
            .map_err(|source| ShareError::Feedback {
                id: accepted.id,
                source,
            })?;
        Ok(accepted)
    }

    /// Turn a share down. User shares are deleted; for group shares the
    ///  user gets a member row that hides the share from them.
    pub async fn decline_share(&self, principal: &Principal, id: i64) -> Result<(), ShareError> {
        let share = self.get_share(principal, id).await?;

        let member_row = if share.is_group_template() {
            self.store
                .find_member_row(share.id, &principal.user_id)
                .await?
        } else if share.is_member_row() {
            Some(share.clone())
        } else {
            None
        };
        if member_row.as_ref().is_some_and(ExternalShare::is_decline_marker) {
            return Ok(());
        }

        self.send_courtesy_decline(&share).await;

        let base = temporary_mount_base(&share.name);
        match member_row {
            Some(row) => {
                self.unmount(&row).await;
                self.move_unique(&row, &base, ShareStatus::Pending).await?;
            }
            None if share.is_group_template() => {
                let row = ExternalShare {
                    recipient: principal.user_id.clone(),
                    status: ShareStatus::Pending,
                    parent_id: Some(share.id),
                    ..share.clone()
                };
                match self.insert_member_row(row, &base).await? {
                    MemberRow::Inserted(_) => {}
                    MemberRow::Existing(row) if row.is_decline_marker() => {}
                    MemberRow::Existing(row) => {
                        self.unmount(&row).await;
                        self.move_unique(&row, &base, ShareStatus::Pending).await?;
                    }
                }
            }
            None => {
                if share.is_accepted() {
                    self.unmount(&share).await;
                }
                self.store.delete(share.id).await?;
            }
        }

        tracing::info!(id, user = %principal.user_id, "share declined");
        Ok(())
    }

    /// Remove the accepted share mounted at `mount_point` for the principal.
    ///  Re-shares the user made from it are removed too.
    pub async fn remove_share(
        &self,
        principal: &Principal,
        mount_point: &str,
    ) -> Result<ExternalShare, ShareError> {
        let mount_point = normalize_mount_point(mount_point);
        let share = self
            .store
            .find_by_mount_point(&principal.user_id, &mount_point_hash(&mount_point))
            .await?
            .ok_or(ShareError::NotFound)?;

        self.send_courtesy_decline(&share).await;

        if share.is_member_row() {
            self.move_unique(&share, &temporary_mount_base(&share.name), ShareStatus::Pending)
                .await?;
        } else {
            self.store.delete(share.id).await?;
        }

        match self.mounts.remove_reshares(&share.storage_id()).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(id = share.id, count, "removed re-shares"),
            Err(e) => tracing::warn!(id = share.id, error = %e, "failed to remove re-shares"),
        }
        self.unmount(&share).await;

        tracing::info!(id = share.id, user = %principal.user_id, %mount_point, "share removed");
        Ok(share)
    }

    /// Shares visible to the principal, in the order they arrived. Group
    ///  shares show the user's own row once they acted on them; shares the
    ///  user declined are left out.
    pub async fn get_shares(
        &self,
        principal: &Principal,
        filter: ShareFilter,
    ) -> Result<Vec<ExternalShare>, ShareError> {
        let rows = self.store.list_for(&principal.recipients()).await?;

        let acted_on: HashSet<i64> = rows
            .iter()
            .filter(|s| s.recipient == principal.user_id)
            .filter_map(|s| s.parent_id)
            .collect();

        let mut shares: Vec<ExternalShare> = rows
            .into_iter()
            .filter(|s| {
                if s.is_member_row() {
                    s.recipient == principal.user_id && !s.is_decline_marker()
                } else if s.is_group_template() {
                    !acted_on.contains(&s.id)
                } else {
                    true
                }
            })
            .filter(|s| filter.matches(s.status))
            .collect();
        shares.sort_by_key(|s| s.id);
        Ok(shares)
    }

    /// Drop everything addressed to a user that is being deleted. Returns
    ///  how many rows went away.
    pub async fn remove_user_shares(&self, user: &str) -> Result<usize, ShareError> {
        for share in self.store.list_by_recipient(user).await? {
            if !share.is_decline_marker() {
                self.send_courtesy_decline(&share).await;
            }
        }

        let removed = self.store.delete_by_recipient(user).await?;
        tracing::info!(%user, count = removed.len(), "removed shares of deleted user");
        Ok(removed.len())
    }

    fn final_mount_base(&self, name: &str) -> String {
        normalize_mount_point(&format!("{}/{}", self.config.share_folder, name))
    }

    /// Insert `row` at the first free candidate derived from `base`
    async fn insert_unique(
        &self,
        row: ExternalShare,
        base: &str,
    ) -> Result<ExternalShare, ShareError> {
        for attempt in 1..=MAX_MOUNT_POINT_ATTEMPTS {
            let mount_point = mount_point_candidate(base, attempt);
            let candidate = ExternalShare {
                mount_point_hash: mount_point_hash(&mount_point),
                mount_point,
                ..row.clone()
            };
            match self.store.insert(candidate).await {
                Ok(share) => return Ok(share),
                Err(StoreError::Conflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ShareError::MountPointExhausted(base.to_string()))
    }

    /// Insert a group member row. When another request already created the
    ///  row for this member, that row is returned instead.
    async fn insert_member_row(
        &self,
        row: ExternalShare,
        base: &str,
    ) -> Result<MemberRow, ShareError> {
        let Some(parent_id) = row.parent_id else {
            return self.insert_unique(row, base).await.map(MemberRow::Inserted);
        };
        for attempt in 1..=MAX_MOUNT_POINT_ATTEMPTS {
            let mount_point = mount_point_candidate(base, attempt);
            let candidate = ExternalShare {
                mount_point_hash: mount_point_hash(&mount_point),
                mount_point,
                ..row.clone()
            };
            match self.store.insert(candidate).await {
                Ok(share) => return Ok(MemberRow::Inserted(share)),
                Err(StoreError::Conflict) => {
                    if let Some(existing) =
                        self.store.find_member_row(parent_id, &row.recipient).await?
                    {
                        return Ok(MemberRow::Existing(existing));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ShareError::MountPointExhausted(base.to_string()))
    }

    /// Move an existing row to the first free candidate derived from `base`
    async fn move_unique(
        &self,
        share: &ExternalShare,
        base: &str,
        status: ShareStatus,
    ) -> Result<ExternalShare, ShareError> {
        for attempt in 1..=MAX_MOUNT_POINT_ATTEMPTS {
            let mount_point = mount_point_candidate(base, attempt);
            let hash = mount_point_hash(&mount_point);
            match self
                .store
                .update_mount(share.id, &mount_point, &hash, status)
                .await
            {
                Ok(()) => {
                    return Ok(ExternalShare {
                        mount_point,
                        mount_point_hash: hash,
                        status,
                        ..share.clone()
                    })
                }
                Err(StoreError::Conflict) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ShareError::MountPointExhausted(base.to_string()))
    }

    async fn send_courtesy_decline(&self, share: &ExternalShare) {
        if let Err(e) = self
            .feedback
            .notify_remote(
                &share.remote,
                &share.share_token,
                &share.remote_id,
                FeedbackAction::Decline,
            )
            .await
        {
            tracing::warn!(id = share.id, remote = %share.remote, error = %e, "decline feedback failed");
        }
    }

    async fn materialize(&self, share: &ExternalShare) {
        if let Err(e) = self.mounts.materialize(share).await {
            tracing::warn!(id = share.id, error = %e, "failed to materialize mount");
        }
    }

    async fn unmount(&self, share: &ExternalShare) {
        if let Err(e) = self.mounts.unmount(share).await {
            tracing::warn!(id = share.id, error = %e, "failed to unmount share");
        }
    }
}

fn validate(new: &NewShare) -> Result<(), ShareError> {
    let required = [
        ("remote", &new.remote),
        ("token", &new.token),
        ("owner", &new.owner),
        ("recipient", &new.recipient),
        ("remote id", &new.remote_id),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ShareError::InvalidShare(format!("missing {}", field)));
        }
    }
    Ok(())
}

/// Last path component of the name the owner gave the share
pub fn share_name(name: &str) -> String {
    name.rsplit('/')
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or(FALLBACK_SHARE_NAME)
        .to_string()
}

/// Absolute, slash-separated, no empty segments, no trailing slash
pub fn normalize_mount_point(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

pub fn temporary_mount_base(name: &str) -> String {
    format!("{}{}}}}}", TEMPORARY_MOUNT_POINT_PREFIX, name)
}

/// `base`, `base (2)`, `base (3)`, ...
pub fn mount_point_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{} ({})", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_name() {
        assert_eq!(share_name("Docs"), "Docs");
        assert_eq!(share_name("/photos/Vacation/"), "Vacation");
        assert_eq!(share_name("  "), "Shared");
    }

    #[test]
    fn test_normalize_mount_point() {
        assert_eq!(normalize_mount_point("Docs"), "/Docs");
        assert_eq!(normalize_mount_point("//Shared//Docs/"), "/Shared/Docs");
        assert_eq!(normalize_mount_point("/"), "/");
    }

    #[test]
    fn test_candidates() {
        assert_eq!(mount_point_candidate("/Docs", 1), "/Docs");
        assert_eq!(mount_point_candidate("/Docs", 2), "/Docs (2)");
        assert_eq!(
            mount_point_candidate(&temporary_mount_base("Docs"), 3),
            "{{TemporaryMountPointName#Docs}} (3)"
        );
    }
}
