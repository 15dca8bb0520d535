//! Certificate data: holder details plus at most two dose slots.

use crate::context::{EncounterResponses, SourceDocument};
use crate::dose::{DoseRecord, DoseSlot, ExtractedDose};
use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};

/// Input of the certificate renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    /// Health certificate identifier
    pub hcid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subject identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose1: Option<DoseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose2: Option<DoseRecord>,
}

impl CertificateData {
    /// Holder details only, no doses.
    pub fn for_holder(responses: &EncounterResponses) -> Self {
        Self {
            hcid: responses.hcid().unwrap_or_default().to_string(),
            name: responses.name.clone(),
            id: responses.identifier.value.clone(),
            sex: responses.sex.clone(),
            birth_date: responses.birth_date.clone(),
            dose1: None,
            dose2: None,
        }
    }

    /// Put `dose` in its slot, replacing whatever was there. Doses without a slot are dropped.
    pub fn place(&mut self, dose: ExtractedDose) {
        match dose.slot() {
            Some(DoseSlot::First) => self.dose1 = Some(dose.record),
            Some(DoseSlot::Second) => self.dose2 = Some(dose.record),
            None => {
                tracing::debug!(dose = ?dose.dose_number, "Dropping dose without a certificate slot");
            }
        }
    }
}

/// Merge the reconstructed history with the current encounter's dose.
///
/// History is applied in folder order, then the current encounter. A slot is always
/// replaced as a whole: the latest record wins and no field of an older one survives.
pub fn build_certificate_data(
    responses: &EncounterResponses,
    document: &SourceDocument,
    history: impl IntoIterator<Item = ExtractedDose>,
) -> Result<CertificateData, ExtractionError> {
    let mut data = CertificateData::for_holder(responses);
    for dose in history {
        data.place(dose);
    }

    let current = ExtractedDose::extract(&responses.vaccination, document.resource())?;
    data.place(current);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn responses(dose: i64) -> EncounterResponses {
        serde_json::from_value(json!({
            "certificate": {"hcid": {"value": "HC-1"}},
            "name": "Jane Doe",
            "identifier": {"value": "ID-9"},
            "sex": "female",
            "birthDate": "1980-02-03",
            "vaccination": {
                "vaccine": {"code": "XM68M6"},
                "brand": {"code": "XM1NL1"},
                "country": {"code": "CHL"},
                "dose": dose,
                "totalDoses": 2,
                "date": "2021-06-01"
            }
        }))
        .unwrap()
    }

    fn document() -> SourceDocument {
        SourceDocument::new(json!({"resourceType": "Bundle", "id": "doc-1", "entry": []})).unwrap()
    }

    fn historical(dose: i64, lot: &str, qr: Option<&str>) -> ExtractedDose {
        ExtractedDose {
            dose_number: Some(dose),
            record: DoseRecord {
                vaccine: "old vaccine".into(),
                brand: "old brand".into(),
                country: "ARG".into(),
                lot: Some(lot.into()),
                proof_image: qr.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_current_dose_fills_its_slot() {
        let first = build_certificate_data(&responses(1), &document(), vec![]).unwrap();
        assert!(first.dose1.is_some());
        assert!(first.dose2.is_none());

        let second = build_certificate_data(&responses(2), &document(), vec![]).unwrap();
        assert!(second.dose1.is_none());
        assert!(second.dose2.is_some());
    }

    #[test]
    fn test_out_of_range_dose_fills_no_slot() {
        for dose in [0, 3, -1] {
            let data = build_certificate_data(&responses(dose), &document(), vec![]).unwrap();
            assert!(data.dose1.is_none() && data.dose2.is_none(), "dose {dose}");
        }
    }

    #[test]
    fn test_current_encounter_replaces_history_in_full() {
        let history = vec![historical(1, "OLD-LOT", Some("T0xEUVI="))];
        let data = build_certificate_data(&responses(1), &document(), history).unwrap();
        let expected = ExtractedDose::extract(&responses(1).vaccination, document().resource())
            .unwrap()
            .record;
        assert_eq!(data.dose1, Some(expected));
        let dose1 = data.dose1.unwrap();
        assert_eq!(dose1.proof_image, None);
        assert_eq!(dose1.country, "CHL");
    }

    #[test]
    fn test_history_fills_other_slot() {
        let history = vec![historical(1, "LOT-A", None)];
        let data = build_certificate_data(&responses(2), &document(), history).unwrap();
        assert_eq!(data.dose1.unwrap().lot.as_deref(), Some("LOT-A"));
        assert_eq!(data.dose2.unwrap().total_doses.as_deref(), Some("2"));
    }

    #[test]
    fn test_later_history_entry_wins() {
        let history = vec![historical(1, "FIRST", None), historical(1, "SECOND", None)];
        let data = build_certificate_data(&responses(2), &document(), history).unwrap();
        assert_eq!(data.dose1.unwrap().lot.as_deref(), Some("SECOND"));
    }

    #[test]
    fn test_serialized_field_names() {
        let data = build_certificate_data(&responses(1), &document(), vec![]).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["hcid"], "HC-1");
        assert_eq!(json["birthDate"], "1980-02-03");
        assert_eq!(json["dose1"]["doses"], "2");
        assert!(json.get("dose2").is_none());
    }
}
