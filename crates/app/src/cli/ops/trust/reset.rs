use service::http_server::api::client::ApiError;
use service::http_server::api::v0::trust::{ResetTrustRequest, TrustedServerInfo};

#[derive(Debug, thiserror::Error)]
pub enum TrustResetError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ResetTrustRequest {
    type Error = TrustResetError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let server: TrustedServerInfo = client.call(self.clone()).await?;
        Ok(format!("Handshake restarted: {}", server))
    }
}
