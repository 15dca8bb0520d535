use thiserror::Error;

/// A dose could not be extracted from a vaccination record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Vaccination record has no usable {0} (neither display nor code)")]
    MissingField(&'static str),
}

/// A historical bundle could not be turned into the core data set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Bundle contains no Immunization resource")]
    NoImmunization,

    #[error("Invalid Immunization: {0}")]
    Malformed(String),
}

/// The certificate renderer failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Certificate rendering failed: {0}")]
pub struct RenderError(pub String);

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Registry error: {0}")]
    Registry(#[from] ddcc_registry_client::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DocumentReference {0} has no attachment data")]
    MissingAttachment(String),

    #[error("Attachment payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
