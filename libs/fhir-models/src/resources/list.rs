//! FHIR List model
//!
//! MHD uses List for both the SubmissionSet and the Folder. Existing folders are read back
//! from the registry and re-submitted, so fields this model does not name are kept in
//! `extra` and written out again unchanged.

use crate::common::{CodeableConcept, Extension, Identifier, Meta, Reference};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    pub item: Reference,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ListEntry {
    pub fn new(item: Reference) -> Self {
        Self {
            item,
            extra: Map::new(),
        }
    }

    pub fn reference(&self) -> Option<&str> {
        self.item.reference.as_deref()
    }
}

/// FHIR List resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    /// Resource type - always "List"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    /// current | retired | entered-in-error
    #[serde(default)]
    pub status: String,

    /// working | snapshot | changes
    #[serde(default)]
    pub mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default)]
    pub entry: Vec<ListEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_resource_type() -> String {
    "List".to_string()
}

impl List {
    /// Empty current/working list.
    pub fn working(id: Option<String>) -> Self {
        Self {
            resource_type: default_resource_type(),
            id,
            meta: None,
            extension: Vec::new(),
            identifier: Vec::new(),
            status: "current".to_string(),
            mode: "working".to_string(),
            code: None,
            subject: None,
            date: None,
            entry: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn push_item(&mut self, item: Reference) {
        self.entry.push(ListEntry::new(item));
    }

    /// Item references in entry order, skipping entries without one.
    pub fn item_references(&self) -> impl Iterator<Item = &str> {
        self.entry.iter().filter_map(ListEntry::reference)
    }
}
