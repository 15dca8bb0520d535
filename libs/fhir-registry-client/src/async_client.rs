//! Registry client for reading and submitting DDCC resources
//!
//! This is the async-first HTTP client used both to walk a holder's history and to deliver
//! the Provide Document Bundle transaction.

use crate::error::{Error, Result};
use crate::traits::{RegistryTransport, ResourceFetcher, TransactionReceipt};
use crate::FHIR_JSON;
use async_trait::async_trait;
use ddcc_models::Bundle;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Connection settings for [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct RegistryClientOptions {
    /// FHIR base of the registry. Relative references are resolved against it.
    pub base_url: Url,
    /// Where transactions are POSTed. Defaults to `base_url`.
    pub submission_url: Option<Url>,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl RegistryClientOptions {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            submission_url: None,
            timeout: None,
        }
    }
}

/// HTTP client for a FHIR registry.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
    submission_url: Url,
}

impl RegistryClient {
    pub fn new(options: RegistryClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let base_url = with_trailing_slash(options.base_url);
        let submission_url = options
            .submission_url
            .unwrap_or_else(|| base_url.clone());

        Ok(Self {
            http,
            base_url,
            submission_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn submission_url(&self) -> &Url {
        &self.submission_url
    }

    /// URL a reference resolves to against `alt_base` (or the default base).
    pub fn resolve(&self, reference: &str, alt_base: Option<&Url>) -> Result<Url> {
        let base = match alt_base {
            Some(base) => with_trailing_slash(base.clone()),
            None => self.base_url.clone(),
        };
        Ok(base.join(reference.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl ResourceFetcher for RegistryClient {
    async fn fetch_resource(&self, reference: &str, alt_base: Option<&Url>) -> Result<Value> {
        let url = self.resolve(reference, alt_base)?;
        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, FHIR_JSON)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let resource: Value = response.json().await?;
        if let Some(diagnostics) = operation_outcome_summary(&resource) {
            return Err(Error::OperationOutcome(diagnostics));
        }
        Ok(resource)
    }
}

#[async_trait]
impl RegistryTransport for RegistryClient {
    async fn post_transaction(&self, bundle: &Bundle) -> Result<TransactionReceipt> {
        let payload = serde_json::to_vec(bundle)?;
        tracing::debug!(
            entries = bundle.entry.len(),
            bytes = payload.len(),
            "Posting transaction to {}",
            self.submission_url
        );

        let response = self
            .http
            .post(self.submission_url.clone())
            .header(CONTENT_TYPE, FHIR_JSON)
            .header(ACCEPT, FHIR_JSON)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: self.submission_url.to_string(),
                body: text,
            });
        }

        Ok(TransactionReceipt {
            status: status.as_u16(),
            body: serde_json::from_str(&text).ok(),
        })
    }
}

/// Join-able base: `Url::join` drops the last path segment unless the base ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Diagnostics of an `OperationOutcome` body, if the resource is one.
fn operation_outcome_summary(resource: &Value) -> Option<String> {
    if resource.get("resourceType").and_then(Value::as_str) != Some("OperationOutcome") {
        return None;
    }
    let messages: Vec<&str> = resource
        .get("issue")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|issue| {
            issue
                .get("diagnostics")
                .and_then(Value::as_str)
                .or_else(|| {
                    issue
                        .get("details")
                        .and_then(|d| d.get("text"))
                        .and_then(Value::as_str)
                })
        })
        .collect();
    if messages.is_empty() {
        Some("no diagnostics".to_string())
    } else {
        Some(messages.join("; "))
    }
}
