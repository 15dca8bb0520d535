//! The generation pipeline: history, certificate data, rendering, assembly, submission.

use crate::assembler::{AssemblyOptions, BundleAssembler};
use crate::certificate::{build_certificate_data, CertificateData};
use crate::context::{GenerationContext, SourceDocument};
use crate::convert::CoreDataConverter;
use crate::error::Result;
use crate::history::HistoryReconstructor;
use crate::identifiers::MintedIdentifiers;
use crate::render::CertificateRenderer;
use crate::submitter::{SubmissionOutcome, TransactionSubmitter};
use ddcc_models::Bundle;
use ddcc_registry_client::{RegistryTransport, ResourceFetcher};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything produced before submission.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub ids: MintedIdentifiers,
    pub certificate: CertificateData,
    pub bundle: Bundle,
    pub history_recovered: usize,
    pub history_skipped: usize,
}

/// Result of one generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub document_id: String,
    pub ids: MintedIdentifiers,
    pub history_recovered: usize,
    pub history_skipped: usize,
    pub submission: SubmissionOutcome,
}

/// Stateless between invocations; clone it freely to trigger generations concurrently.
#[derive(Clone)]
pub struct Generator {
    history: Arc<HistoryReconstructor>,
    renderer: Arc<dyn CertificateRenderer>,
    assembler: Arc<BundleAssembler>,
    submitter: TransactionSubmitter,
}

impl Generator {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        converter: Arc<dyn CoreDataConverter>,
        renderer: Arc<dyn CertificateRenderer>,
        transport: Arc<dyn RegistryTransport>,
        options: AssemblyOptions,
    ) -> Self {
        Self {
            history: Arc::new(HistoryReconstructor::new(fetcher, converter)),
            renderer,
            assembler: Arc::new(BundleAssembler::new(options)),
            submitter: TransactionSubmitter::new(transport),
        }
    }

    /// Run every stage up to, but not including, submission.
    ///
    /// Fails only when the current encounter cannot be extracted or rendering fails.
    pub async fn prepare(
        &self,
        document: &SourceDocument,
        context: &GenerationContext,
    ) -> Result<PreparedTransaction> {
        let history = self.history.reconstruct(context.folder()).await;
        let history_recovered = history.doses.len();
        let history_skipped = history.skipped;

        let certificate = build_certificate_data(context.responses(), document, history.doses)?;
        let rendered = self.renderer.render(&certificate).await?;
        tracing::debug!(bytes = rendered.len(), "Certificate rendered");

        let ids = MintedIdentifiers::mint(context.folder());
        let bundle = self
            .assembler
            .assemble(context, document.id(), &rendered, &ids);

        Ok(PreparedTransaction {
            ids,
            certificate,
            bundle,
            history_recovered,
            history_skipped,
        })
    }

    /// Prepare the transaction and submit it, waiting for the submission outcome.
    pub async fn generate(
        &self,
        document: &SourceDocument,
        context: GenerationContext,
    ) -> Result<GenerationReport> {
        tracing::info!(
            document_id = document.id(),
            patient_id = context.patient_id(),
            "Generating DDCC document submission"
        );
        let prepared = self.prepare(document, &context).await?;

        let submission = match self.submitter.spawn(prepared.bundle).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Submission task failed: {}", e);
                SubmissionOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        Ok(GenerationReport {
            document_id: document.id().to_string(),
            ids: prepared.ids,
            history_recovered: prepared.history_recovered,
            history_skipped: prepared.history_skipped,
            submission,
        })
    }

    /// Fire-and-forget trigger. Errors are logged; the handle may be dropped.
    pub fn spawn(
        &self,
        document: SourceDocument,
        context: GenerationContext,
    ) -> JoinHandle<Result<GenerationReport>> {
        let generator = self.clone();
        tokio::spawn(async move {
            let result = generator.generate(&document, context).await;
            if let Err(e) = &result {
                tracing::error!(document_id = document.id(), "Generation aborted: {}", e);
            }
            result
        })
    }
}
