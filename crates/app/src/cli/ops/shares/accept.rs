use service::http_server::api::client::ApiError;
use service::http_server::api::v0::shares::{AcceptShareRequest, AcceptShareResponse};

#[derive(Debug, thiserror::Error)]
pub enum SharesAcceptError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for AcceptShareRequest {
    type Error = SharesAcceptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: AcceptShareResponse = client.call(self.clone()).await?;

        let mut output = format!(
            "Accepted {} from {}, mounted at {}",
            response.share.name, response.share.owner, response.share.mount_point
        );
        if let Some(err) = response.feedback_error {
            output.push_str(&format!("\nwarning: the owner was not notified: {}", err));
        }
        Ok(output)
    }
}
