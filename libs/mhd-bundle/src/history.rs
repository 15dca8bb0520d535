//! Reconstruction of a holder's dose history from previously submitted documents.
//!
//! Every `DocumentReference` link of the holder's folder is processed on its own: fetched,
//! followed to the stored document bundle, converted and reduced to one dose. A link that
//! fails at any step is skipped and logged; it never stops the generation.

use crate::constants::FHIR_STRUCTURED;
use crate::convert::CoreDataConverter;
use crate::dose::ExtractedDose;
use crate::error::{ConvertError, ExtractionError};
use ddcc_models::{DocumentReference, List};
use ddcc_registry_client::{parse_reference, ReferenceError, ResourceFetcher};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use thiserror::Error;

/// Why a folder link contributed no dose.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[source] ddcc_registry_client::Error),

    #[error("not a DocumentReference: {0}")]
    InvalidDocumentReference(#[source] serde_json::Error),

    #[error("attachment type {0:?} is not a structured bundle")]
    NotStructured(Option<String>),

    #[error("attachment has no url")]
    MissingLocator,

    #[error(transparent)]
    Locator(#[from] ReferenceError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Result of processing one folder link.
#[derive(Debug)]
pub enum HistoryOutcome {
    Recovered(ExtractedDose),
    Skipped {
        reference: String,
        reason: SkipReason,
    },
}

/// Doses recovered from the folder, in folder order.
#[derive(Debug, Default)]
pub struct ReconstructedHistory {
    pub doses: Vec<ExtractedDose>,
    pub skipped: usize,
}

pub struct HistoryReconstructor {
    fetcher: Arc<dyn ResourceFetcher>,
    converter: Arc<dyn CoreDataConverter>,
}

impl HistoryReconstructor {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, converter: Arc<dyn CoreDataConverter>) -> Self {
        Self { fetcher, converter }
    }

    /// Walk `folder` and collect every dose that could be recovered.
    pub async fn reconstruct(&self, folder: Option<&List>) -> ReconstructedHistory {
        let Some(folder) = folder else {
            return ReconstructedHistory::default();
        };
        tracing::info!(folder_id = folder.id.as_deref(), "Looking at existing folder");

        let mut history = ReconstructedHistory::default();
        let mut outcomes = std::pin::pin!(self.outcomes(folder));
        while let Some(outcome) = outcomes.next().await {
            match outcome {
                HistoryOutcome::Recovered(dose) => history.doses.push(dose),
                HistoryOutcome::Skipped { reference, reason } => {
                    tracing::info!(reference = %reference, "Skipping previous document: {}", reason);
                    history.skipped += 1;
                }
            }
        }
        tracing::debug!(
            recovered = history.doses.len(),
            skipped = history.skipped,
            "Dose history reconstructed"
        );
        history
    }

    /// One outcome per `DocumentReference` link, produced strictly one after another.
    pub fn outcomes<'a>(&'a self, folder: &List) -> impl Stream<Item = HistoryOutcome> + 'a {
        let links: Vec<String> = folder
            .item_references()
            .filter(|r| r.starts_with("DocumentReference"))
            .map(str::to_string)
            .collect();

        stream::iter(links).then(move |reference| async move {
            match self.recover(&reference).await {
                Ok(dose) => HistoryOutcome::Recovered(dose),
                Err(reason) => HistoryOutcome::Skipped { reference, reason },
            }
        })
    }

    async fn recover(&self, reference: &str) -> Result<ExtractedDose, SkipReason> {
        let resource = self
            .fetcher
            .fetch_resource(reference, None)
            .await
            .map_err(SkipReason::Fetch)?;
        let doc_ref: DocumentReference =
            serde_json::from_value(resource).map_err(SkipReason::InvalidDocumentReference)?;

        let attachment = doc_ref
            .first_attachment()
            .ok_or(SkipReason::NotStructured(None))?;
        if !is_structured_bundle(attachment.content_type.as_deref()) {
            return Err(SkipReason::NotStructured(attachment.content_type.clone()));
        }
        let locator = attachment.url.as_deref().ok_or(SkipReason::MissingLocator)?;
        let target = parse_reference(locator)?.expect_type("Bundle")?;

        let bundle = self
            .fetcher
            .fetch_resource(&target.relative(), target.base.as_ref())
            .await
            .map_err(SkipReason::Fetch)?;
        let core = self.converter.convert(&bundle).await?;
        Ok(ExtractedDose::extract(&core.vaccination, &bundle)?)
    }
}

/// `application/fhir` or any `application/fhir+<format>`.
fn is_structured_bundle(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct == FHIR_STRUCTURED
            || ct
                .strip_prefix(FHIR_STRUCTURED)
                .is_some_and(|rest| rest.starts_with('+'))
    })
}
