//! Dose records and the extraction rule shared by the current encounter and history.

use crate::constants::{PNG, WHO_PROOF_TYPE_CODE};
use crate::context::{CodedValue, VaccinationResponse};
use crate::error::ExtractionError;
use ddcc_models::DocumentReference;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical data of one administered dose, in the shape the certificate renderer reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DoseRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot: Option<String>,
    pub vaccine: String,
    pub brand: String,
    /// Manufacturer, or the marketing authorization holder when no manufacturer is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Administering health worker
    #[serde(rename = "hw", skip_serializing_if = "Option::is_none")]
    pub practitioner: Option<String>,
    /// Administration centre
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    pub country: String,
    #[serde(rename = "doses", skip_serializing_if = "Option::is_none")]
    pub total_doses: Option<String>,
    /// Base64 PNG of the proof-of-vaccination code
    #[serde(rename = "qr", skip_serializing_if = "Option::is_none")]
    pub proof_image: Option<String>,
    #[serde(rename = "date_due", skip_serializing_if = "Option::is_none")]
    pub next_dose_due: Option<String>,
}

/// Which certificate slot a dose fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoseSlot {
    First,
    Second,
}

impl DoseSlot {
    /// Only doses 1 and 2 have a slot; anything else is dropped.
    pub fn from_number(dose: Option<i64>) -> Option<Self> {
        match dose {
            Some(1) => Some(DoseSlot::First),
            Some(2) => Some(DoseSlot::Second),
            _ => None,
        }
    }
}

/// A dose record together with the dose number it was reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDose {
    pub dose_number: Option<i64>,
    pub record: DoseRecord,
}

impl ExtractedDose {
    /// Apply the extraction rule to `vaccination`, attaching the proof image found in `document`.
    pub fn extract(
        vaccination: &VaccinationResponse,
        document: &Value,
    ) -> Result<Self, ExtractionError> {
        let mut record = DoseRecord::from_vaccination(vaccination)?;
        record.proof_image = find_proof_image(document);

        let slot = DoseSlot::from_number(vaccination.dose);
        if slot == Some(DoseSlot::First) {
            record.next_dose_due = vaccination.next_dose.clone();
        }

        Ok(Self {
            dose_number: vaccination.dose,
            record,
        })
    }

    pub fn slot(&self) -> Option<DoseSlot> {
        DoseSlot::from_number(self.dose_number)
    }
}

impl DoseRecord {
    /// Labels over codes, manufacturer falling back to the MA holder, dose count as text.
    pub fn from_vaccination(vaccination: &VaccinationResponse) -> Result<Self, ExtractionError> {
        Ok(Self {
            date: vaccination.date.clone(),
            lot: vaccination.lot.clone(),
            vaccine: required_label(vaccination.vaccine.as_ref(), "vaccine")?,
            brand: required_label(vaccination.brand.as_ref(), "brand")?,
            manufacturer: optional_label(vaccination.manufacturer.as_ref())
                .or_else(|| optional_label(vaccination.maholder.as_ref())),
            practitioner: vaccination
                .practitioner
                .as_ref()
                .and_then(|p| p.value.clone()),
            site: vaccination.centre.clone(),
            country: required_label(vaccination.country.as_ref(), "country")?,
            total_doses: vaccination.total_doses.as_ref().map(|d| d.to_text()),
            proof_image: None,
            next_dose_due: None,
        })
    }
}

fn optional_label(value: Option<&CodedValue>) -> Option<String> {
    value.and_then(CodedValue::label).map(str::to_string)
}

fn required_label(
    value: Option<&CodedValue>,
    field: &'static str,
) -> Result<String, ExtractionError> {
    optional_label(value).ok_or(ExtractionError::MissingField(field))
}

/// PNG payload of the document's WHO proof-of-vaccination reference, if it carries one.
///
/// Only the first DocumentReference typed `who` is considered.
pub fn find_proof_image(document: &Value) -> Option<String> {
    let proof_ref = document
        .get("entry")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|entry| entry.get("resource"))
        .filter(|resource| {
            resource.get("resourceType").and_then(Value::as_str) == Some("DocumentReference")
        })
        .filter_map(|resource| serde_json::from_value::<DocumentReference>(resource.clone()).ok())
        .find(|doc_ref| doc_ref.has_type_code(WHO_PROOF_TYPE_CODE))?;

    let image = proof_ref.attachment_of_type(PNG).and_then(|a| a.data.clone());
    if image.is_none() {
        tracing::debug!("WHO proof DocumentReference carries no {} attachment", PNG);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vaccination(value: Value) -> VaccinationResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extraction_rule() {
        let vacc = vaccination(json!({
            "vaccine": {"code": "XM68M6", "display": "COVID-19 vaccines"},
            "brand": {"code": "XM1NL1"},
            "maholder": {"code": "ORG-100030215", "display": "Biontech"},
            "country": {"code": "USA"},
            "date": "2021-05-01",
            "lot": "PT123F",
            "dose": 1,
            "totalDoses": 2,
            "nextDose": "2021-05-29",
            "practitioner": {"value": "HW-7"},
            "centre": "Vaccination Site"
        }));
        let dose = ExtractedDose::extract(&vacc, &json!({})).unwrap();
        assert_eq!(dose.slot(), Some(DoseSlot::First));
        let r = dose.record;
        assert_eq!(r.vaccine, "COVID-19 vaccines");
        assert_eq!(r.brand, "XM1NL1");
        assert_eq!(r.manufacturer.as_deref(), Some("Biontech"));
        assert_eq!(r.country, "USA");
        assert_eq!(r.total_doses.as_deref(), Some("2"));
        assert_eq!(r.practitioner.as_deref(), Some("HW-7"));
        assert_eq!(r.site.as_deref(), Some("Vaccination Site"));
        assert_eq!(r.next_dose_due.as_deref(), Some("2021-05-29"));
    }

    #[test]
    fn test_manufacturer_preferred_over_ma_holder() {
        let vacc = vaccination(json!({
            "vaccine": {"code": "v"}, "brand": {"code": "b"}, "country": {"code": "c"},
            "manufacturer": {"code": "M1"},
            "maholder": {"display": "Holder"}
        }));
        let r = DoseRecord::from_vaccination(&vacc).unwrap();
        assert_eq!(r.manufacturer.as_deref(), Some("M1"));
    }

    #[test]
    fn test_total_doses_text_stays_text() {
        let vacc = vaccination(json!({
            "vaccine": {"code": "v"}, "brand": {"code": "b"}, "country": {"code": "c"},
            "totalDoses": "3"
        }));
        let r = DoseRecord::from_vaccination(&vacc).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["doses"], json!("3"));
    }

    #[test]
    fn test_missing_vaccine_is_an_error() {
        let vacc = vaccination(json!({"brand": {"code": "b"}, "country": {"code": "c"}}));
        assert_eq!(
            DoseRecord::from_vaccination(&vacc),
            Err(ExtractionError::MissingField("vaccine"))
        );
    }

    #[test]
    fn test_next_dose_only_recorded_for_first_dose() {
        let vacc = vaccination(json!({
            "vaccine": {"code": "v"}, "brand": {"code": "b"}, "country": {"code": "c"},
            "dose": 2, "nextDose": "2021-09-01"
        }));
        let dose = ExtractedDose::extract(&vacc, &json!({})).unwrap();
        assert_eq!(dose.slot(), Some(DoseSlot::Second));
        assert_eq!(dose.record.next_dose_due, None);
    }

    #[test]
    fn test_dose_slot_numbers() {
        assert_eq!(DoseSlot::from_number(Some(1)), Some(DoseSlot::First));
        assert_eq!(DoseSlot::from_number(Some(2)), Some(DoseSlot::Second));
        assert_eq!(DoseSlot::from_number(Some(3)), None);
        assert_eq!(DoseSlot::from_number(Some(0)), None);
        assert_eq!(DoseSlot::from_number(None), None);
    }

    #[test]
    fn test_find_proof_image() {
        let document = json!({
            "resourceType": "Bundle",
            "entry": [
                {"resource": {"resourceType": "Composition"}},
                {"resource": {
                    "resourceType": "DocumentReference",
                    "type": {"coding": [{"code": "icao"}]},
                    "content": [{"attachment": {"contentType": "image/png", "data": "SUNBTw=="}}]
                }},
                {"resource": {
                    "resourceType": "DocumentReference",
                    "type": {"coding": [{"system": "urn:x", "code": "who"}]},
                    "content": [
                        {"attachment": {"contentType": "application/pdf", "data": "UERG"}},
                        {"attachment": {"contentType": "image/png", "data": "V0hP"}}
                    ]
                }}
            ]
        });
        assert_eq!(find_proof_image(&document).as_deref(), Some("V0hP"));
        assert_eq!(find_proof_image(&json!({"resourceType": "Bundle"})), None);
    }

    #[test]
    fn test_who_reference_without_png_yields_no_image() {
        let document = json!({
            "entry": [{"resource": {
                "resourceType": "DocumentReference",
                "type": {"coding": [{"code": "who"}]},
                "content": [{"attachment": {"contentType": "application/pdf", "data": "UERG"}}]
            }}]
        });
        assert_eq!(find_proof_image(&document), None);
    }
}
