//! Collaborators the core talks to but does not own.
//!
//! Every component takes these as constructor arguments; nothing here
//!  reaches for global state.

mod clock;
mod groups;
mod http;
mod mount;

pub use clock::{Clock, ManualClock, SystemClock};
pub use groups::{GroupMembership, StaticGroups};
pub use http::{HttpClient, HttpResponse, TransportError, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
pub use mount::{MountError, MountProvider};
