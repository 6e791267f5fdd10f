use service::http_server::api::client::ApiError;
use service::http_server::api::v0::shares::{ListSharesRequest, ListSharesResponse};

use super::describe;

#[derive(Debug, thiserror::Error)]
pub enum SharesListError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ListSharesRequest {
    type Error = SharesListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ListSharesResponse = client.call(self.clone()).await?;

        if response.shares.is_empty() {
            return Ok(format!("No shares for {}", self.user));
        }

        Ok(response
            .shares
            .iter()
            .map(describe)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
