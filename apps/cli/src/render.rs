//! File-backed certificate renderer.

use async_trait::async_trait;
use ddcc_mhd::{CertificateData, CertificateRenderer, RenderError};
use std::path::PathBuf;

/// Serves a pre-rendered document from disk, whatever the certificate data.
pub struct FileRenderer {
    path: PathBuf,
}

impl FileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CertificateRenderer for FileRenderer {
    async fn render(&self, data: &CertificateData) -> Result<Vec<u8>, RenderError> {
        tracing::debug!(
            hcid = %data.hcid,
            dose1 = data.dose1.is_some(),
            dose2 = data.dose2.is_some(),
            "Using pre-rendered certificate {}",
            self.path.display()
        );
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| RenderError(format!("failed to read {}: {e}", self.path.display())))
    }
}
