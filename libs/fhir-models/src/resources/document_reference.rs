//! FHIR DocumentReference model

use crate::common::{Attachment, CodeableConcept, Identifier, Meta, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentReferenceContent {
    #[serde(default)]
    pub attachment: Attachment,
}

/// FHIR DocumentReference resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    /// Resource type - always "DocumentReference"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_identifier: Option<Identifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default)]
    pub status: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default)]
    pub content: Vec<DocumentReferenceContent>,
}

fn default_resource_type() -> String {
    "DocumentReference".to_string()
}

impl DocumentReference {
    pub fn current() -> Self {
        Self {
            resource_type: default_resource_type(),
            id: None,
            meta: None,
            master_identifier: None,
            identifier: Vec::new(),
            status: "current".to_string(),
            type_: None,
            subject: None,
            date: None,
            content: Vec::new(),
        }
    }

    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.content.push(DocumentReferenceContent { attachment });
    }

    pub fn first_attachment(&self) -> Option<&Attachment> {
        self.content.first().map(|c| &c.attachment)
    }

    /// First attachment with the given content type.
    pub fn attachment_of_type(&self, content_type: &str) -> Option<&Attachment> {
        self.content
            .iter()
            .map(|c| &c.attachment)
            .find(|a| a.content_type.as_deref() == Some(content_type))
    }

    /// True when `type` carries a coding with `code`.
    pub fn has_type_code(&self, code: &str) -> bool {
        self.type_.as_ref().is_some_and(|t| t.has_code(code))
    }
}
