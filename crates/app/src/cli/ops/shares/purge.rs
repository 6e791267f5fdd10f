use service::http_server::api::client::ApiError;
use service::http_server::api::v0::shares::{PurgeSharesRequest, PurgeSharesResponse};

#[derive(Debug, thiserror::Error)]
pub enum SharesPurgeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for PurgeSharesRequest {
    type Error = SharesPurgeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: PurgeSharesResponse = client.call(self.clone()).await?;
        Ok(format!("Removed {} share(s) of {}", response.removed, self.user))
    }
}
