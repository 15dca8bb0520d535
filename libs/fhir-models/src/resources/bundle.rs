//! FHIR Bundle model (transaction flavour)

use super::{AuditEvent, Binary, DocumentReference, List};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Bundle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    TransactionResponse,
    Batch,
    BatchResponse,
    History,
    Searchset,
    Collection,
}

/// HTTP verb of a bundle entry request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleEntryRequest {
    pub method: HttpVerb,
    pub url: String,
}

/// Any resource carried by a transaction entry.
///
/// Resources this crate models are typed; everything else (Patient) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    List(List),
    DocumentReference(DocumentReference),
    Binary(Binary),
    AuditEvent(AuditEvent),
    Other(Value),
}

impl Resource {
    pub fn resource_type(&self) -> &str {
        match self {
            Resource::List(r) => &r.resource_type,
            Resource::DocumentReference(r) => &r.resource_type,
            Resource::Binary(r) => &r.resource_type,
            Resource::AuditEvent(r) => &r.resource_type,
            Resource::Other(v) => v
                .get("resourceType")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::List(r) => r.id.as_deref(),
            Resource::DocumentReference(r) => r.id.as_deref(),
            Resource::Binary(r) => r.id.as_deref(),
            Resource::AuditEvent(r) => r.id.as_deref(),
            Resource::Other(v) => v.get("id").and_then(Value::as_str),
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Resource::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_document_reference(&self) -> Option<&DocumentReference> {
        match self {
            Resource::DocumentReference(doc_ref) => Some(doc_ref),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&Binary> {
        match self {
            Resource::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    pub fn as_audit_event(&self) -> Option<&AuditEvent> {
        match self {
            Resource::AuditEvent(event) => Some(event),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let resource_type = value
            .get("resourceType")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let resource = match resource_type.as_str() {
            "List" => Resource::List(serde_json::from_value(value).map_err(D::Error::custom)?),
            "DocumentReference" => {
                Resource::DocumentReference(serde_json::from_value(value).map_err(D::Error::custom)?)
            }
            "Binary" => Resource::Binary(serde_json::from_value(value).map_err(D::Error::custom)?),
            "AuditEvent" => {
                Resource::AuditEvent(serde_json::from_value(value).map_err(D::Error::custom)?)
            }
            _ => Resource::Other(value),
        };
        Ok(resource)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    pub resource: Resource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,
}

impl BundleEntry {
    /// Entry that creates a resource under a temporary `urn:uuid:` locator.
    pub fn create(resource: Resource, temp_id: &str) -> Self {
        let url = resource.resource_type().to_string();
        Self {
            full_url: Some(format!("urn:uuid:{temp_id}")),
            resource,
            request: Some(BundleEntryRequest {
                method: HttpVerb::Post,
                url,
            }),
        }
    }

    /// Entry that upserts a resource at `{resourceType}/{id}`.
    pub fn update(resource: Resource) -> Self {
        let url = format!(
            "{}/{}",
            resource.resource_type(),
            resource.id().unwrap_or_default()
        );
        Self {
            full_url: None,
            resource,
            request: Some(BundleEntryRequest {
                method: HttpVerb::Put,
                url,
            }),
        }
    }

    pub fn method(&self) -> Option<HttpVerb> {
        self.request.as_ref().map(|r| r.method)
    }
}

/// FHIR Bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Resource type - always "Bundle"
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

fn default_resource_type() -> String {
    "Bundle".to_string()
}

impl Bundle {
    pub fn transaction(entry: Vec<BundleEntry>) -> Self {
        Self {
            resource_type: default_resource_type(),
            id: None,
            bundle_type: BundleType::Transaction,
            entry,
        }
    }

    /// All entries whose resource has the given type.
    pub fn entries_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a BundleEntry> + 'a {
        self.entry
            .iter()
            .filter(move |e| e.resource.resource_type() == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_entry_uses_urn_uuid_and_post() {
        let entry = BundleEntry::create(Resource::Binary(Binary::new("application/pdf", "AA==")), "abc");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["fullUrl"], "urn:uuid:abc");
        assert_eq!(json["request"], json!({"method": "POST", "url": "Binary"}));
    }

    #[test]
    fn test_update_entry_targets_type_and_id() {
        let patient = json!({"resourceType": "Patient", "id": "p1", "active": true});
        let entry = BundleEntry::update(Resource::Other(patient.clone()));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("fullUrl").is_none());
        assert_eq!(json["request"], json!({"method": "PUT", "url": "Patient/p1"}));
        assert_eq!(json["resource"], patient);
    }

    #[test]
    fn test_resource_dispatches_on_resource_type() {
        let bundle: Bundle = serde_json::from_value(json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "entry": [
                {"resource": {"resourceType": "Binary", "contentType": "application/pdf", "data": "AA=="}},
                {"resource": {"resourceType": "Patient", "id": "p1"}}
            ]
        }))
        .unwrap();
        assert_eq!(bundle.bundle_type, BundleType::Transaction);
        assert!(bundle.entry[0].resource.as_binary().is_some());
        assert!(matches!(bundle.entry[1].resource, Resource::Other(_)));
        assert_eq!(bundle.entries_of_type("Patient").count(), 1);
    }
}
