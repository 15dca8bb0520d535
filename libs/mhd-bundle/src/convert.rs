//! Conversion of a stored DDCC document bundle into the core data set.
//!
//! The engine only needs the `vaccination` part of the core data set, so that is all
//! [`CoreDataSet`] exposes.

use crate::context::{CodedValue, TotalDoses, ValueHolder, VaccinationResponse};
use crate::error::ConvertError;
use async_trait::async_trait;
use serde_json::{Number, Value};

/// Core data set of one historical document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoreDataSet {
    pub vaccination: VaccinationResponse,
}

/// Maps a fetched historical document bundle to its core data set.
#[async_trait]
pub trait CoreDataConverter: Send + Sync {
    async fn convert(&self, bundle: &Value) -> Result<CoreDataSet, ConvertError>;
}

const EXT_VACCINE_BRAND: &str = "DDCCVaccineBrand";
const EXT_MARKET_AUTHORIZATION: &str = "DDCCVaccineMarketAuthorization";
const EXT_COUNTRY: &str = "DDCCCountryOfVaccination";

/// Reads the first `Immunization` (and any `ImmunizationRecommendation`) of a DDCC bundle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmunizationConverter;

#[async_trait]
impl CoreDataConverter for ImmunizationConverter {
    async fn convert(&self, bundle: &Value) -> Result<CoreDataSet, ConvertError> {
        let immunization =
            first_resource(bundle, "Immunization").ok_or(ConvertError::NoImmunization)?;
        if !immunization.is_object() {
            return Err(ConvertError::Malformed("not a JSON object".to_string()));
        }

        let protocol = immunization
            .get("protocolApplied")
            .and_then(Value::as_array)
            .and_then(|p| p.first());

        let vaccination = VaccinationResponse {
            vaccine: immunization
                .get("vaccineCode")
                .and_then(first_coding)
                .map(coding_value),
            brand: extension(immunization, EXT_VACCINE_BRAND)
                .and_then(|e| e.get("valueCoding"))
                .map(coding_value),
            manufacturer: immunization.get("manufacturer").and_then(reference_value),
            maholder: extension(immunization, EXT_MARKET_AUTHORIZATION)
                .and_then(|e| e.get("valueCoding"))
                .map(coding_value),
            country: extension(immunization, EXT_COUNTRY)
                .and_then(|e| e.get("valueCode"))
                .and_then(Value::as_str)
                .map(|code| CodedValue {
                    code: Some(code.to_string()),
                    ..Default::default()
                }),
            date: string_at(immunization, &["occurrenceDateTime"]),
            lot: string_at(immunization, &["lotNumber"]),
            dose: protocol.and_then(|p| {
                p.get("doseNumberPositiveInt")
                    .and_then(Value::as_i64)
                    .or_else(|| {
                        p.get("doseNumberString")
                            .and_then(Value::as_str)
                            .and_then(|s| s.trim().parse().ok())
                    })
            }),
            total_doses: protocol.and_then(|p| {
                p.get("seriesDosesPositiveInt")
                    .and_then(Value::as_u64)
                    .map(|n| TotalDoses::Number(Number::from(n)))
                    .or_else(|| {
                        p.get("seriesDosesString")
                            .and_then(Value::as_str)
                            .map(|s| TotalDoses::Text(s.to_string()))
                    })
            }),
            next_dose: first_resource(bundle, "ImmunizationRecommendation").and_then(|rec| {
                rec.get("recommendation")
                    .and_then(Value::as_array)
                    .and_then(|r| r.first())
                    .and_then(|r| r.get("dateCriterion"))
                    .and_then(Value::as_array)
                    .and_then(|d| d.first())
                    .and_then(|d| d.get("value"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
            practitioner: immunization
                .get("performer")
                .and_then(Value::as_array)
                .and_then(|p| p.first())
                .and_then(|p| string_at(p, &["actor", "identifier", "value"]))
                .map(|value| ValueHolder { value: Some(value) }),
            centre: string_at(immunization, &["location", "display"]),
        };

        Ok(CoreDataSet { vaccination })
    }
}

fn first_resource<'a>(bundle: &'a Value, resource_type: &str) -> Option<&'a Value> {
    bundle
        .get("entry")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|e| e.get("resource"))
        .find(|r| r.get("resourceType").and_then(Value::as_str) == Some(resource_type))
}

/// Extension whose url ends with the given structure definition name.
fn extension<'a>(resource: &'a Value, name: &str) -> Option<&'a Value> {
    resource
        .get("extension")
        .and_then(Value::as_array)?
        .iter()
        .find(|e| {
            e.get("url")
                .and_then(Value::as_str)
                .is_some_and(|url| url.ends_with(name))
        })
}

fn first_coding(concept: &Value) -> Option<&Value> {
    concept.get("coding").and_then(Value::as_array)?.first()
}

fn coding_value(coding: &Value) -> CodedValue {
    CodedValue {
        system: string_at(coding, &["system"]),
        code: string_at(coding, &["code"]),
        display: string_at(coding, &["display"]),
    }
}

fn reference_value(reference: &Value) -> Option<CodedValue> {
    let value = CodedValue {
        system: string_at(reference, &["identifier", "system"]),
        code: string_at(reference, &["identifier", "value"]),
        display: string_at(reference, &["display"]),
    };
    value.label().is_some().then_some(value)
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
