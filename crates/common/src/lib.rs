/**
 * Federated cloud ids (`user@remote`) and
 *  the normalization rules for remote URLs.
 */
pub mod cloud_id;
/**
 * Per-remote endpoint discovery, with
 *  well-known defaults for remotes that
 *  advertise nothing.
 */
pub mod discovery;
/**
 * Background shared-secret exchange with
 *  trusted remotes, retried with backoff.
 */
pub mod handshake;
/**
 * The OCS response envelope spoken by
 *  remote instances.
 */
pub mod ocs;
/**
 * Collaborators injected into every
 *  component: outbound HTTP, time, mounts
 *  and group membership.
 */
pub mod ports;
/**
 * The ledger of shares remote instances
 *  offered to local users, and the feedback
 *  sent back to their owners.
 */
pub mod share;
pub mod store;
/**
 * Trusted remote instances and the
 *  administrator operations on them.
 */
pub mod trust;
pub mod trusted_servers;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::cloud_id::{host_key, normalize_remote, CloudId, CloudIdError};
    pub use crate::discovery::{Discovery, StaticDiscovery};
    pub use crate::handshake::{
        HandshakeConfig, HandshakeDispatcher, HandshakeScheduler, RetryQueue, RetryTask,
        TickOutcome,
    };
    pub use crate::ports::{Clock, GroupMembership, HttpClient, HttpResponse, MountProvider};
    pub use crate::share::{
        ExternalShare, Feedback, NewShare, Principal, ShareError, ShareFilter, ShareLedger,
        ShareStatus, ShareStore, ShareType,
    };
    pub use crate::store::StoreError;
    pub use crate::trust::{TrustStatus, TrustStore, TrustedHost};
    pub use crate::trusted_servers::{TrustedServers, TrustedServersError};
    pub use crate::version::build_info;
}
