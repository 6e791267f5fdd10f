//! The `{"ocs": {"meta": ..., "data": ...}}` envelope remote instances
//!  wrap their API responses in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsEnvelope<T> {
    pub ocs: OcsBody<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsBody<T> {
    pub meta: Option<OcsMeta>,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcsMeta {
    #[serde(default)]
    pub status: Option<String>,
    /// Sent as a number by most servers and as a string by some
    #[serde(default)]
    pub statuscode: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OcsMeta {
    pub fn status_code(&self) -> Option<u64> {
        match self.statuscode.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl<T> OcsEnvelope<T> {
    pub fn new(status_code: u64, message: &str, data: T) -> Self {
        Self {
            ocs: OcsBody {
                meta: Some(OcsMeta {
                    status: Some(if status_code < 300 { "ok" } else { "failure" }.to_string()),
                    statuscode: Some(serde_json::Value::from(status_code)),
                    message: Some(message.to_string()),
                }),
                data: Some(data),
            },
        }
    }

    pub fn status_code(&self) -> Option<u64> {
        self.ocs.meta.as_ref().and_then(OcsMeta::status_code)
    }
}

/// `data` payload of a shared-secret exchange response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSecretData {
    #[serde(rename = "sharedSecret", default)]
    pub shared_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_number_or_string() {
        let numeric: OcsEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"ocs":{"meta":{"statuscode":100},"data":[]}}"#).unwrap();
        assert_eq!(numeric.status_code(), Some(100));

        let text: OcsEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"ocs":{"meta":{"statuscode":"200"}}}"#).unwrap();
        assert_eq!(text.status_code(), Some(200));

        let missing: OcsEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"ocs":{}}"#).unwrap();
        assert_eq!(missing.status_code(), None);
    }

    #[test]
    fn test_shared_secret_body() {
        let body: OcsEnvelope<SharedSecretData> =
            serde_json::from_str(r#"{"ocs":{"data":{"sharedSecret":"s3cret"}}}"#).unwrap();
        assert_eq!(
            body.ocs.data.and_then(|d| d.shared_secret).as_deref(),
            Some("s3cret")
        );
    }
}
