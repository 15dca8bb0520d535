//! FHIR AuditEvent model (R4)

use crate::common::{CodeableConcept, Coding, Meta, Reference};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventNetwork {
    pub address: String,

    /// 1 = machine name, 2 = IP address, ...
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventAgent {
    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub who: Reference,

    pub requestor: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<AuditEventNetwork>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventSource {
    pub observer: Reference,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<Coding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventEntity {
    pub what: Reference,

    #[serde(rename = "type")]
    pub type_: Coding,

    pub role: Coding,
}

/// FHIR AuditEvent resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Resource type - always "AuditEvent"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(rename = "type")]
    pub type_: Coding,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtype: Vec<Coding>,

    /// C | R | U | D | E
    pub action: String,

    pub recorded: String,

    /// 0 | 4 | 8 | 12
    pub outcome: String,

    pub agent: Vec<AuditEventAgent>,

    pub source: AuditEventSource,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity: Vec<AuditEventEntity>,
}

fn default_resource_type() -> String {
    "AuditEvent".to_string()
}

impl AuditEvent {
    /// Event with the given type and outcome codes. Agents and entities start empty.
    pub fn new(
        type_: Coding,
        action: &str,
        outcome: &str,
        recorded: &str,
        source: AuditEventSource,
    ) -> Self {
        Self {
            resource_type: default_resource_type(),
            id: None,
            meta: None,
            type_,
            subtype: Vec::new(),
            action: action.to_string(),
            recorded: recorded.to_string(),
            outcome: outcome.to_string(),
            agent: Vec::new(),
            source,
            entity: Vec::new(),
        }
    }
}
