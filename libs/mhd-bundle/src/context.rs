//! Per-invocation inputs of a certificate generation.
//!
//! A [`GenerationContext`] is built once per trigger and never mutated; each stage reads it
//! and returns its own result value.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use ddcc_models::List;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A terminology value as captured in the encounter form: code, display or both.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl CodedValue {
    /// Human-readable label, falling back to the bare code.
    pub fn label(&self) -> Option<&str> {
        non_empty(self.display.as_deref()).or_else(|| non_empty(self.code.as_deref()))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

/// `{ "value": ... }` wrapper used by identifier-like form answers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueHolder {
    #[serde(default)]
    pub value: Option<String>,
}

/// Total dose count, stored either as a number or as text by the source form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalDoses {
    Number(Number),
    Text(String),
}

impl TotalDoses {
    pub fn to_text(&self) -> String {
        match self {
            TotalDoses::Number(n) => n.to_string(),
            TotalDoses::Text(s) => s.clone(),
        }
    }
}

/// Vaccination answers of one encounter (current or historical).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationResponse {
    #[serde(default)]
    pub vaccine: Option<CodedValue>,
    #[serde(default)]
    pub brand: Option<CodedValue>,
    #[serde(default)]
    pub manufacturer: Option<CodedValue>,
    /// Marketing authorization holder
    #[serde(default)]
    pub maholder: Option<CodedValue>,
    #[serde(default)]
    pub country: Option<CodedValue>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub lot: Option<String>,
    #[serde(default)]
    pub dose: Option<i64>,
    #[serde(default)]
    pub total_doses: Option<TotalDoses>,
    #[serde(default)]
    pub next_dose: Option<String>,
    #[serde(default)]
    pub practitioner: Option<ValueHolder>,
    #[serde(default)]
    pub centre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CertificateResponse {
    /// Health certificate identifier of the holder
    #[serde(default)]
    pub hcid: ValueHolder,
}

/// Answers extracted from the current encounter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterResponses {
    #[serde(default)]
    pub certificate: CertificateResponse,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub identifier: ValueHolder,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub vaccination: VaccinationResponse,
}

impl EncounterResponses {
    pub fn hcid(&self) -> Option<&str> {
        self.certificate.hcid.value.as_deref()
    }
}

/// The structured DDCC document being certified.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    id: String,
    resource: Value,
}

impl SourceDocument {
    pub fn new(resource: Value) -> Result<Self> {
        let id = resource
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidInput("document has no id".to_string()))?
            .to_string();
        Ok(Self { id, resource })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resource(&self) -> &Value {
        &self.resource
    }
}

/// Everything one generation needs besides the document itself.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    now: DateTime<Utc>,
    patient: Value,
    patient_id: String,
    folder: Option<List>,
    responses: EncounterResponses,
}

impl GenerationContext {
    pub fn new(
        now: DateTime<Utc>,
        patient: Value,
        folder: Option<List>,
        responses: EncounterResponses,
    ) -> Result<Self> {
        if patient.get("resourceType").and_then(Value::as_str) != Some("Patient") {
            return Err(Error::InvalidInput(
                "patient resource must have resourceType Patient".to_string(),
            ));
        }
        let patient_id = patient
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidInput("patient resource has no id".to_string()))?
            .to_string();
        if folder
            .as_ref()
            .is_some_and(|f| f.id.as_deref().map_or(true, str::is_empty))
        {
            return Err(Error::InvalidInput("folder resource has no id".to_string()));
        }
        if responses.hcid().is_none() {
            return Err(Error::InvalidInput(
                "responses carry no health certificate id".to_string(),
            ));
        }
        Ok(Self {
            now,
            patient,
            patient_id,
            folder,
            responses,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// `now` as a FHIR dateTime / instant.
    pub fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn patient(&self) -> &Value {
        &self.patient
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// `Patient/{id}`
    pub fn patient_reference(&self) -> String {
        format!("Patient/{}", self.patient_id)
    }

    pub fn folder(&self) -> Option<&List> {
        self.folder.as_ref()
    }

    pub fn responses(&self) -> &EncounterResponses {
        &self.responses
    }

    pub fn hcid(&self) -> &str {
        self.responses.hcid().unwrap_or_default()
    }
}
