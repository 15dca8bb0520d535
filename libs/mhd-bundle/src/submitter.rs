//! Delivery of the assembled transaction.
//!
//! Submission is best-effort: nothing is retried and a failure never propagates as an error.
//! Callers get a [`SubmissionOutcome`] instead, either directly or through a spawned task.

use ddcc_models::Bundle;
use ddcc_registry_client::RegistryTransport;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What happened to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted { status: u16 },
    Failed { message: String },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionOutcome::Accepted { .. })
    }
}

#[derive(Clone)]
pub struct TransactionSubmitter {
    transport: Arc<dyn RegistryTransport>,
}

impl TransactionSubmitter {
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self { transport }
    }

    pub async fn submit(&self, bundle: &Bundle) -> SubmissionOutcome {
        match self.transport.post_transaction(bundle).await {
            Ok(receipt) => {
                tracing::info!(status = receipt.status, "Registry accepted transaction");
                if let Some(body) = &receipt.body {
                    tracing::debug!("Registry response: {}", body);
                }
                SubmissionOutcome::Accepted {
                    status: receipt.status,
                }
            }
            Err(e) => {
                tracing::error!("Transaction submission failed: {}", e);
                SubmissionOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Submit on a background task. The handle may be awaited or dropped.
    pub fn spawn(&self, bundle: Bundle) -> JoinHandle<SubmissionOutcome> {
        let submitter = self.clone();
        tokio::spawn(async move { submitter.submit(&bundle).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ddcc_registry_client::TransactionReceipt;

    struct FixedTransport(Option<u16>);

    #[async_trait]
    impl RegistryTransport for FixedTransport {
        async fn post_transaction(
            &self,
            _bundle: &Bundle,
        ) -> ddcc_registry_client::Result<TransactionReceipt> {
            match self.0 {
                Some(status) => Ok(TransactionReceipt { status, body: None }),
                None => Err(ddcc_registry_client::Error::Status {
                    status: 500,
                    url: "http://registry.invalid/".to_string(),
                    body: "boom".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_accepted() {
        let submitter = TransactionSubmitter::new(Arc::new(FixedTransport(Some(200))));
        let outcome = submitter.submit(&Bundle::transaction(vec![])).await;
        assert_eq!(outcome, SubmissionOutcome::Accepted { status: 200 });
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_raised() {
        let submitter = TransactionSubmitter::new(Arc::new(FixedTransport(None)));
        let outcome = submitter
            .spawn(Bundle::transaction(vec![]))
            .await
            .unwrap();
        assert!(!outcome.is_accepted());
        match outcome {
            SubmissionOutcome::Failed { message } => assert!(message.contains("500")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
