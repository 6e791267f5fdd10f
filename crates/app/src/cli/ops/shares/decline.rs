use service::http_server::api::client::ApiError;
use service::http_server::api::v0::shares::{DeclineShareRequest, DeclineShareResponse};

#[derive(Debug, thiserror::Error)]
pub enum SharesDeclineError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for DeclineShareRequest {
    type Error = SharesDeclineError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let _: DeclineShareResponse = client.call(self.clone()).await?;
        Ok(format!("Declined share {}", self.id))
    }
}
