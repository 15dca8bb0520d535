//! Certificate rendering seam.

use crate::certificate::CertificateData;
use crate::error::RenderError;
use async_trait::async_trait;

/// Turns certificate data into the rendered document (a PDF in production).
#[async_trait]
pub trait CertificateRenderer: Send + Sync {
    async fn render(&self, data: &CertificateData) -> Result<Vec<u8>, RenderError>;
}
