//! FHIR Binary model

use serde::{Deserialize, Serialize};

/// FHIR Binary resource - raw bytes, base64 encoded in `data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binary {
    /// Resource type - always "Binary"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub content_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

fn default_resource_type() -> String {
    "Binary".to_string()
}

impl Binary {
    pub fn new(content_type: &str, data_base64: &str) -> Self {
        Self {
            resource_type: default_resource_type(),
            id: None,
            content_type: content_type.to_string(),
            data: Some(data_base64.to_string()),
        }
    }
}
