//! DDCC certificate issuance over IHE MHD.
//!
//! Given a structured DDCC document and the current encounter, this crate:
//! - rebuilds the holder's dose history from the documents linked in their folder
//!   ([`HistoryReconstructor`]),
//! - merges it with the current dose into [`CertificateData`],
//! - has the certificate rendered through a [`CertificateRenderer`],
//! - assembles the seven-entry ITI-65 Provide Document Bundle transaction ([`BundleAssembler`]),
//! - and submits it to the registry ([`TransactionSubmitter`]).
//!
//! [`Generator`] ties the stages together.
//!
//! # Example
//!
//! ```rust,ignore
//! let generator = Generator::new(client.clone(), converter, renderer, client, options);
//! let report = generator.generate(&document, context).await?;
//! println!("submission: {:?}", report.submission);
//! ```

pub mod assembler;
pub mod certificate;
pub mod constants;
pub mod context;
pub mod convert;
pub mod dose;
pub mod error;
pub mod generator;
pub mod history;
pub mod identifiers;
pub mod proof;
pub mod render;
pub mod submitter;

pub use assembler::{AssemblyOptions, BundleAssembler};
pub use certificate::{build_certificate_data, CertificateData};
pub use context::{EncounterResponses, GenerationContext, SourceDocument, VaccinationResponse};
pub use convert::{CoreDataConverter, CoreDataSet, ImmunizationConverter};
pub use dose::{DoseRecord, DoseSlot, ExtractedDose};
pub use error::{ConvertError, Error, ExtractionError, RenderError, Result};
pub use generator::{GenerationReport, Generator, PreparedTransaction};
pub use history::{HistoryOutcome, HistoryReconstructor, ReconstructedHistory, SkipReason};
pub use identifiers::MintedIdentifiers;
pub use proof::{fetch_proof_attachment, ProofAttachment};
pub use render::CertificateRenderer;
pub use submitter::{SubmissionOutcome, TransactionSubmitter};
