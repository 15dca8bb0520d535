//! Async client for the FHIR registry that hosts DDCC documents.
//!
//! Provides the two seams the document-bundle engine consumes:
//! - [`ResourceFetcher`]: resolve a reference (optionally against another base) to a resource
//! - [`RegistryTransport`]: POST a transaction bundle to the registry
//!
//! [`RegistryClient`] implements both over `reqwest`. [`parse_reference`] turns stored
//! reference strings into an explicit (base, type, id) triple.

pub mod async_client;
pub mod error;
pub mod reference;
pub mod traits;

pub use async_client::{RegistryClient, RegistryClientOptions};
pub use error::{Error, Result};
pub use reference::{parse_reference, ParsedReference, ReferenceError};
pub use traits::{RegistryTransport, ResourceFetcher, TransactionReceipt};

/// Media type of FHIR JSON payloads.
pub const FHIR_JSON: &str = "application/fhir+json";
