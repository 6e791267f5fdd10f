use service::http_server::api::client::ApiError;
use service::http_server::api::v0::trust::{ListTrustRequest, ListTrustResponse};

#[derive(Debug, thiserror::Error)]
pub enum TrustListError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for ListTrustRequest {
    type Error = TrustListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone();
        let response: ListTrustResponse = client.call(self.clone()).await?;

        if response.servers.is_empty() {
            return Ok("No trusted servers".to_string());
        }

        Ok(response
            .servers
            .iter()
            .map(|server| server.to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
