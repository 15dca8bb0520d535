//! Seams between the document-bundle engine and the registry.

use crate::error::Result;
use async_trait::async_trait;
use ddcc_models::Bundle;
use serde_json::Value;
use url::Url;

/// Resolves references to resources held by a FHIR server.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch `reference` (`Type/id`) relative to `alt_base`, or to the default base when `None`.
    ///
    /// Any transport failure, non-success status or `OperationOutcome` body is an error.
    async fn fetch_resource(&self, reference: &str, alt_base: Option<&Url>) -> Result<Value>;
}

/// What the registry answered to a transaction POST.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReceipt {
    pub status: u16,
    /// Parsed response body, when it was JSON.
    pub body: Option<Value>,
}

/// Delivers transaction bundles to the registry endpoint.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn post_transaction(&self, bundle: &Bundle) -> Result<TransactionReceipt>;
}
