use service::http_server::api::client::ApiError;
use service::http_server::api::v0::shares::{RemoveShareRequest, RemoveShareResponse};

#[derive(Debug, thiserror::Error)]
pub enum SharesRemoveError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for RemoveShareRequest {
    type Error = SharesRemoveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: RemoveShareResponse = client.call(self.clone()).await?;
        Ok(format!(
            "Removed {} (was mounted at {})",
            response.share.name, self.mount_point
        ))
    }
}
