//! Lookup of a stored proof-of-vaccination attachment (the certificate's QR image).

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use ddcc_models::DocumentReference;
use ddcc_registry_client::ResourceFetcher;

/// Decoded attachment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofAttachment {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Fetch `DocumentReference/{id}` and decode the data of its first attachment.
pub async fn fetch_proof_attachment(
    fetcher: &dyn ResourceFetcher,
    document_reference_id: &str,
) -> Result<ProofAttachment> {
    let reference = format!("DocumentReference/{document_reference_id}");
    let resource = fetcher.fetch_resource(&reference, None).await?;

    let actual = resource
        .get("resourceType")
        .and_then(|t| t.as_str())
        .unwrap_or_default();
    if actual != "DocumentReference" {
        return Err(ddcc_registry_client::Error::UnexpectedResource {
            expected: "DocumentReference".to_string(),
            actual: actual.to_string(),
        }
        .into());
    }

    let doc_ref: DocumentReference = serde_json::from_value(resource)?;
    let attachment = doc_ref
        .first_attachment()
        .filter(|a| a.data.is_some())
        .ok_or_else(|| Error::MissingAttachment(document_reference_id.to_string()))?;
    let data = BASE64_STANDARD.decode(attachment.data.as_deref().unwrap_or_default())?;

    Ok(ProofAttachment {
        content_type: attachment.content_type.clone(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use url::Url;

    struct OneResource(Value);

    #[async_trait]
    impl ResourceFetcher for OneResource {
        async fn fetch_resource(
            &self,
            reference: &str,
            _alt_base: Option<&Url>,
        ) -> ddcc_registry_client::Result<Value> {
            assert_eq!(reference, "DocumentReference/qr-1");
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_decodes_first_attachment() {
        let fetcher = OneResource(json!({
            "resourceType": "DocumentReference",
            "status": "current",
            "content": [{"attachment": {"contentType": "image/png", "data": "iVBORw=="}}]
        }));
        let proof = fetch_proof_attachment(&fetcher, "qr-1").await.unwrap();
        assert_eq!(proof.content_type.as_deref(), Some("image/png"));
        assert_eq!(proof.data, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_missing_data_is_an_error() {
        let fetcher = OneResource(json!({
            "resourceType": "DocumentReference",
            "content": [{"attachment": {"contentType": "image/png", "url": "urn:x"}}]
        }));
        let err = fetch_proof_attachment(&fetcher, "qr-1").await.unwrap_err();
        assert!(matches!(err, Error::MissingAttachment(id) if id == "qr-1"));
    }

    #[tokio::test]
    async fn test_wrong_resource_type() {
        let fetcher = OneResource(json!({"resourceType": "Binary", "contentType": "image/png"}));
        let err = fetch_proof_attachment(&fetcher, "qr-1").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(ddcc_registry_client::Error::UnexpectedResource { .. })
        ));
    }
}
