use clap::{Args, Subcommand};

pub mod add;
pub mod list;
pub mod remove;
pub mod reset;

use crate::cli::op::Op;
use service::http_server::api::v0::trust::{
    AddTrustRequest, ListTrustRequest, RemoveTrustRequest, ResetTrustRequest,
};

crate::command_enum! {
    (Add, AddTrustRequest),
    (Ls, ListTrustRequest),
    (Remove, RemoveTrustRequest),
    (Reset, ResetTrustRequest),
}

// Rename the generated Command to TrustCommand for clarity
pub type TrustCommand = Command;

/// Manage the servers this instance trusts
#[derive(Args, Debug, Clone)]
pub struct Trust {
    #[command(subcommand)]
    pub command: TrustCommand,
}

#[async_trait::async_trait]
impl Op for Trust {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
