use clap::{Args, Subcommand};

use common::share::ExternalShare;

pub mod accept;
pub mod decline;
pub mod ls;
pub mod purge;
pub mod remove;

use crate::cli::op::Op;
use service::http_server::api::v0::shares::{
    AcceptShareRequest, DeclineShareRequest, ListSharesRequest, PurgeSharesRequest,
    RemoveShareRequest,
};

crate::command_enum! {
    (Ls, ListSharesRequest),
    (Accept, AcceptShareRequest),
    (Decline, DeclineShareRequest),
    (Remove, RemoveShareRequest),
    (Purge, PurgeSharesRequest),
}

// Rename the generated Command to SharesCommand for clarity
pub type SharesCommand = Command;

/// Review and manage shares offered by remote instances
#[derive(Args, Debug, Clone)]
pub struct Shares {
    #[command(subcommand)]
    pub command: SharesCommand,
}

#[async_trait::async_trait]
impl Op for Shares {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// One line per share: id, state, name, owner and where it lives
pub(crate) fn describe(share: &ExternalShare) -> String {
    let state = if share.is_accepted() {
        "accepted"
    } else {
        "pending"
    };
    format!(
        "{:>4}  {:<8}  {}  from {}@{}  at {}",
        share.id, state, share.name, share.owner, share.remote, share.mount_point
    )
}
