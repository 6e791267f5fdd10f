use service::http_server::api::client::ApiError;
use service::http_server::api::v0::trust::{RemoveTrustRequest, RemoveTrustResponse};

#[derive(Debug, thiserror::Error)]
pub enum TrustRemoveError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for RemoveTrustRequest {
    type Error = TrustRemoveError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: RemoveTrustResponse = client.call(self.clone()).await?;

        if response.removed {
            Ok(format!("No longer trusting {}", self.url))
        } else {
            Ok(format!("{} was not trusted", self.url))
        }
    }
}
