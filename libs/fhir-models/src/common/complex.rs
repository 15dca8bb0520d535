//! FHIR complex types and shared data structures
//!
//! This module contains the datatypes reused across the MHD resources.
//! No validation - just data representation. Elements a type does not name are kept in its
//! `extra` map so resources read from a registry serialize back without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// FHIR Extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub url: String,

    #[serde(flatten)]
    pub value: serde_json::Value,
}

impl Extension {
    pub fn new(url: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            value,
        }
    }
}

/// Coding - a reference to a code defined by a terminology system
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(rename = "userSelected", skip_serializing_if = "Option::is_none")]
    pub user_selected: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Coding {
    /// Coding with system and code, optionally a display.
    pub fn new(system: &str, code: &str, display: Option<&str>) -> Self {
        Self {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: display.map(str::to_string),
            ..Default::default()
        }
    }
}

/// CodeableConcept - a set of codings plus optional text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            ..Default::default()
        }
    }

    /// True when any coding carries `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.coding.iter().any(|c| c.code.as_deref() == Some(code))
    }
}

/// Identifier use (usual | official | temp | secondary | old)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierUse {
    Usual,
    Official,
    Temp,
    Secondary,
    Old,
}

/// Identifier - business identifier for a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<IdentifierUse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// type, period, assigner
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifier {
    pub fn new(use_: Option<IdentifierUse>, system: &str, value: &str) -> Self {
        Self {
            use_,
            system: Some(system.to_string()),
            value: Some(value.to_string()),
            extra: Map::new(),
        }
    }
}

/// Reference from one resource to another
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Default::default()
        }
    }

    pub fn display(display: impl Into<String>) -> Self {
        Self {
            display: Some(display.into()),
            ..Default::default()
        }
    }

    /// Reference to a resource created earlier in the same transaction.
    pub fn urn_uuid(id: &str) -> Self {
        Self::to(format!("urn:uuid:{id}"))
    }
}

/// Attachment - content in a format defined elsewhere
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Base64 payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Resource metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    /// source, security, tag
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meta {
    pub fn with_profile(profile: &str) -> Self {
        Self {
            profile: vec![profile.to_string()],
            ..Default::default()
        }
    }
}
