//! Shares offered to local users by remote instances.
//!
//! A share arrives pending under a placeholder mount point. Accepting it
//!  moves it to a collision-free mount point under the share folder and
//!  tells the owner; declining or removing it tells the owner too.

pub mod feedback;
mod ledger;
mod memory;
mod model;
mod provider;

pub use feedback::{
    CloudNotifier, Feedback, FeedbackAction, FeedbackChannel, FeedbackError,
    FederationNotification, LegacyOnlyNotifier, NotificationKind, NotifyError,
};
pub use ledger::{
    mount_point_candidate, normalize_mount_point, share_name, temporary_mount_base, LedgerConfig,
    ShareError, ShareLedger, DEFAULT_SHARE_FOLDER, MAX_MOUNT_POINT_ATTEMPTS,
};
pub use memory::MemoryShareStore;
pub use model::{
    mount_point_hash, sha256_hex, storage_id, ExternalShare, NewShare, Principal, ShareFilter,
    ShareStatus, ShareType, TEMPORARY_MOUNT_POINT_PREFIX,
};
pub use provider::ShareStore;
