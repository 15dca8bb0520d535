//! Assembly of the ITI-65 Provide Document Bundle transaction.
//!
//! The transaction always has the same seven entries, in this order:
//! submission set, document reference, binary, binary reference, folder, patient, audit event.

use crate::constants::*;
use crate::context::GenerationContext;
use crate::identifiers::MintedIdentifiers;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use ddcc_models::{
    Attachment, AuditEvent, AuditEventAgent, AuditEventEntity, AuditEventNetwork,
    AuditEventSource, Binary, Bundle, BundleEntry, CodeableConcept, DocumentReference, Extension,
    Identifier, IdentifierUse, List, Meta, Reference, Resource,
};
use serde_json::json;
use url::Url;

/// Deployment-specific values that shape the transaction.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// FHIR base where the structured DDCC document bundles are stored.
    pub registry_base: Url,
    pub submission_set_system: String,
    pub folder_system: String,
}

pub struct BundleAssembler {
    options: AssemblyOptions,
}

impl BundleAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Build the transaction for `document_id` with its rendered bytes.
    pub fn assemble(
        &self,
        context: &GenerationContext,
        document_id: &str,
        rendered: &[u8],
        ids: &MintedIdentifiers,
    ) -> Bundle {
        Bundle::transaction(vec![
            self.submission_set(context, ids),
            self.document_reference(context, ids, document_id),
            binary(ids, rendered),
            binary_reference(context, ids),
            self.folder(context, ids),
            BundleEntry::update(Resource::Other(context.patient().clone())),
            audit_event(context, ids),
        ])
    }

    fn submission_set(&self, context: &GenerationContext, ids: &MintedIdentifiers) -> BundleEntry {
        let system = &self.options.submission_set_system;
        let mut list = List::working(None);
        list.extension = vec![Extension::new(
            IHE_SOURCE_ID_EXTENSION,
            json!({"valueIdentifier": {"system": SOURCE_ID_SYSTEM, "value": SOURCE_ID_VALUE}}),
        )];
        // ITI-65 wants the unique id under both uses.
        list.identifier = vec![
            Identifier::new(Some(IdentifierUse::Usual), system, &ids.submission_set),
            Identifier::new(Some(IdentifierUse::Official), system, &ids.submission_set),
        ];
        list.subject = Some(Reference::to(context.patient_reference()));
        list.code = Some(CodeableConcept::from_coding(LIST_SUBMISSION_SET.coding()));
        list.date = Some(context.timestamp());
        list.push_item(Reference::urn_uuid(&ids.document_reference));
        list.push_item(Reference::urn_uuid(&ids.binary_reference));
        list.push_item(folder_reference(context, ids));

        BundleEntry::create(Resource::List(list), &ids.submission_set)
    }

    fn document_reference(
        &self,
        context: &GenerationContext,
        ids: &MintedIdentifiers,
        document_id: &str,
    ) -> BundleEntry {
        let identifier = Identifier::new(None, DDCC_DOCUMENT_REFERENCE_SYSTEM, document_id);
        let mut doc_ref = DocumentReference::current();
        doc_ref.meta = Some(Meta::with_profile(DDCC_DOCUMENT_REFERENCE_PROFILE));
        doc_ref.identifier = vec![identifier.clone()];
        doc_ref.master_identifier = Some(identifier);
        doc_ref.subject = Some(Reference::to(context.patient_reference()));
        doc_ref.date = Some(context.timestamp());
        doc_ref.push_attachment(Attachment {
            content_type: Some(FHIR_JSON.to_string()),
            url: Some(self.stored_document_url(document_id)),
            ..Default::default()
        });

        BundleEntry::create(Resource::DocumentReference(doc_ref), &ids.document_reference)
    }

    /// `{registry base}Bundle/{id}`
    fn stored_document_url(&self, document_id: &str) -> String {
        let base = self.options.registry_base.as_str();
        if base.ends_with('/') {
            format!("{base}Bundle/{document_id}")
        } else {
            format!("{base}/Bundle/{document_id}")
        }
    }

    /// An existing folder is updated in place; otherwise a new one is created.
    fn folder(&self, context: &GenerationContext, ids: &MintedIdentifiers) -> BundleEntry {
        let existing = context.folder().map(|existing| {
            let mut folder = existing.clone();
            folder.id = Some(ids.folder.clone());
            folder
        });
        let is_update = existing.is_some();

        let mut folder = existing.unwrap_or_else(|| self.new_folder(context));
        folder.date = Some(context.timestamp());
        folder.push_item(Reference::urn_uuid(&ids.document_reference));
        folder.push_item(Reference::urn_uuid(&ids.binary_reference));

        if is_update {
            BundleEntry::update(Resource::List(folder))
        } else {
            BundleEntry::create(Resource::List(folder), &ids.folder)
        }
    }

    /// Folder keyed by the holder's certificate id, so later submissions can find it.
    fn new_folder(&self, context: &GenerationContext) -> List {
        let system = &self.options.folder_system;
        let mut folder = List::working(None);
        folder.meta = Some(Meta::with_profile(DDCC_DOCUMENT_REFERENCE_PROFILE));
        folder.extension = vec![Extension::new(
            IHE_DESIGNATION_TYPE_EXTENSION,
            json!({"valueCodeableConcept": {"coding": [FOLDER_DESIGNATION_DDCC.coding()]}}),
        )];
        folder.identifier = vec![
            Identifier::new(Some(IdentifierUse::Usual), system, context.hcid()),
            Identifier::new(Some(IdentifierUse::Official), system, context.hcid()),
        ];
        folder.code = Some(CodeableConcept::from_coding(LIST_FOLDER.coding()));
        folder.subject = Some(Reference::to(context.patient_reference()));
        folder
    }
}

/// `List/{id}` for a folder the registry already holds, `urn:uuid:{id}` for one created here.
fn folder_reference(context: &GenerationContext, ids: &MintedIdentifiers) -> Reference {
    match context.folder() {
        Some(_) => Reference::to(format!("List/{}", ids.folder)),
        None => Reference::urn_uuid(&ids.folder),
    }
}

fn binary(ids: &MintedIdentifiers, rendered: &[u8]) -> BundleEntry {
    let data = BASE64_STANDARD.encode(rendered);
    BundleEntry::create(Resource::Binary(Binary::new(PDF, &data)), &ids.binary)
}

fn binary_reference(context: &GenerationContext, ids: &MintedIdentifiers) -> BundleEntry {
    let mut doc_ref = DocumentReference::current();
    doc_ref.subject = Some(Reference::to(context.patient_reference()));
    doc_ref.date = Some(context.timestamp());
    doc_ref.push_attachment(Attachment {
        content_type: Some(PDF.to_string()),
        url: Some(format!("urn:uuid:{}", ids.binary)),
        ..Default::default()
    });

    BundleEntry::create(Resource::DocumentReference(doc_ref), &ids.binary_reference)
}

fn audit_event(context: &GenerationContext, ids: &MintedIdentifiers) -> BundleEntry {
    let source = AuditEventSource {
        observer: Reference::display(AUDIT_OBSERVER),
        type_: vec![AUDIT_SOURCE_TYPE_APPLICATION_SERVER.coding()],
    };
    let mut event = AuditEvent::new(
        AUDIT_TYPE_IMPORT.coding(),
        AUDIT_ACTION_CREATE,
        AUDIT_OUTCOME_SUCCESS,
        &context.timestamp(),
        source,
    );
    event.meta = Some(Meta::with_profile(MHD_AUDIT_RECIPIENT_PROFILE));
    event.subtype = vec![AUDIT_SUBTYPE_ITI_65.coding()];
    event.agent = vec![
        AuditEventAgent {
            type_: CodeableConcept::from_coding(AUDIT_ROLE_SOURCE.coding()),
            who: Reference::display(AUDIT_SOURCE_WHO),
            requestor: true,
            network: Some(AuditEventNetwork {
                address: AUDIT_SOURCE_ADDRESS.to_string(),
                type_: AUDIT_NETWORK_MACHINE_NAME.to_string(),
            }),
        },
        AuditEventAgent {
            type_: CodeableConcept::from_coding(AUDIT_ROLE_DESTINATION.coding()),
            who: Reference::display(AUDIT_DESTINATION_WHO),
            requestor: false,
            network: Some(AuditEventNetwork {
                address: AUDIT_DESTINATION_ADDRESS.to_string(),
                type_: AUDIT_NETWORK_MACHINE_NAME.to_string(),
            }),
        },
    ];
    event.entity = vec![
        AuditEventEntity {
            what: Reference::to(context.patient_reference()),
            type_: AUDIT_ENTITY_PERSON.coding(),
            role: AUDIT_ROLE_PATIENT.coding(),
        },
        AuditEventEntity {
            what: Reference::urn_uuid(&ids.submission_set),
            type_: AUDIT_ENTITY_SYSTEM_OBJECT.coding(),
            role: AUDIT_ROLE_JOB.coding(),
        },
    ];

    BundleEntry::create(Resource::AuditEvent(event), &ids.audit_event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EncounterResponses;
    use chrono::{TimeZone, Utc};
    use ddcc_models::{BundleType, HttpVerb};
    use serde_json::Value;

    fn assembler() -> BundleAssembler {
        BundleAssembler::new(AssemblyOptions {
            registry_base: Url::parse("http://registry.example.org/fhir/").unwrap(),
            submission_set_system: "urn:ietf:rfc:3986".to_string(),
            folder_system: "http://example.org/folder".to_string(),
        })
    }

    fn context(folder: Option<List>) -> GenerationContext {
        let responses: EncounterResponses = serde_json::from_value(json!({
            "certificate": {"hcid": {"value": "HC-1"}},
            "vaccination": {"dose": 1}
        }))
        .unwrap();
        GenerationContext::new(
            Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
            json!({"resourceType": "Patient", "id": "p1", "name": [{"text": "Jane"}]}),
            folder,
            responses,
        )
        .unwrap()
    }

    #[test]
    fn test_seven_entries_in_order() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        assert_eq!(bundle.bundle_type, BundleType::Transaction);
        let types: Vec<&str> = bundle.entry.iter().map(|e| e.resource.resource_type()).collect();
        assert_eq!(
            types,
            vec![
                "List",
                "DocumentReference",
                "Binary",
                "DocumentReference",
                "List",
                "Patient",
                "AuditEvent"
            ]
        );
        assert_eq!(bundle.entry[0].full_url, Some(format!("urn:uuid:{}", ids.submission_set)));
        assert_eq!(bundle.entry[1].full_url, Some(format!("urn:uuid:{}", ids.document_reference)));
        assert_eq!(bundle.entry[2].full_url, Some(format!("urn:uuid:{}", ids.binary)));
        assert_eq!(bundle.entry[3].full_url, Some(format!("urn:uuid:{}", ids.binary_reference)));
    }

    #[test]
    fn test_submission_set_identifiers_and_items() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let set = bundle.entry[0].resource.as_list().unwrap();
        assert_eq!(set.identifier.len(), 2);
        assert_eq!(set.identifier[0].use_, Some(IdentifierUse::Usual));
        assert_eq!(set.identifier[1].use_, Some(IdentifierUse::Official));
        for identifier in &set.identifier {
            assert_eq!(identifier.value.as_deref(), Some(ids.submission_set.as_str()));
        }
        let items: Vec<&str> = set.item_references().collect();
        assert_eq!(
            items,
            vec![
                format!("urn:uuid:{}", ids.document_reference),
                format!("urn:uuid:{}", ids.binary_reference),
                format!("urn:uuid:{}", ids.folder),
            ]
        );
    }

    #[test]
    fn test_document_reference_points_at_stored_bundle() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let doc_ref = bundle.entry[1].resource.as_document_reference().unwrap();
        let attachment = doc_ref.first_attachment().unwrap();
        assert_eq!(attachment.content_type.as_deref(), Some("application/fhir+json"));
        assert_eq!(
            attachment.url.as_deref(),
            Some("http://registry.example.org/fhir/Bundle/doc-1")
        );
        assert_eq!(
            doc_ref.master_identifier.as_ref().and_then(|i| i.value.as_deref()),
            Some("doc-1")
        );
    }

    #[test]
    fn test_binary_and_binary_reference() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF-1.7", &ids);
        let binary = bundle.entry[2].resource.as_binary().unwrap();
        assert_eq!(binary.content_type, "application/pdf");
        assert_eq!(binary.data.as_deref(), Some("JVBERi0xLjc="));

        let binary_ref = bundle.entry[3].resource.as_document_reference().unwrap();
        assert_eq!(
            binary_ref.first_attachment().and_then(|a| a.url.clone()),
            Some(format!("urn:uuid:{}", ids.binary))
        );
    }

    #[test]
    fn test_new_folder_keyed_by_hcid() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let entry = &bundle.entry[4];
        assert_eq!(entry.method(), Some(HttpVerb::Post));
        assert_eq!(entry.full_url, Some(format!("urn:uuid:{}", ids.folder)));
        let folder = entry.resource.as_list().unwrap();
        assert_eq!(folder.id, None);
        assert_eq!(folder.identifier.len(), 2);
        assert!(folder
            .identifier
            .iter()
            .all(|i| i.value.as_deref() == Some("HC-1")
                && i.system.as_deref() == Some("http://example.org/folder")));
        assert_eq!(folder.entry.len(), 2);
    }

    #[test]
    fn test_existing_folder_updated_in_place() {
        let existing: List = serde_json::from_value(json!({
            "resourceType": "List",
            "id": "folder-7",
            "status": "current",
            "mode": "working",
            "title": "kept",
            "date": "2021-01-01T00:00:00Z",
            "entry": [{"item": {"reference": "DocumentReference/old"}}]
        }))
        .unwrap();
        let ctx = context(Some(existing));
        let ids = MintedIdentifiers::mint(ctx.folder());
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let entry = &bundle.entry[4];
        assert_eq!(entry.method(), Some(HttpVerb::Put));
        assert_eq!(entry.request.as_ref().unwrap().url, "List/folder-7");
        let set = bundle.entry[0].resource.as_list().unwrap();
        assert_eq!(set.item_references().last(), Some("List/folder-7"));
        let folder = entry.resource.as_list().unwrap();
        assert_eq!(folder.entry.len(), 3);
        assert_eq!(folder.date.as_deref(), Some("2021-06-01T12:00:00.000Z"));
        assert_eq!(folder.extra.get("title"), Some(&Value::from("kept")));
    }

    #[test]
    fn test_existing_folder_keeps_nested_elements() {
        let existing: List = serde_json::from_value(json!({
            "resourceType": "List",
            "id": "folder-7",
            "meta": {
                "versionId": "3",
                "source": "urn:registry",
                "security": [{"system": "urn:sec", "code": "R"}],
                "tag": [{"system": "urn:t", "code": "x"}]
            },
            "identifier": [{
                "use": "official",
                "system": "urn:f",
                "value": "HC-1",
                "period": {"start": "2021-01-01"}
            }],
            "status": "current",
            "mode": "working",
            "subject": {"reference": "Patient/p1", "type": "Patient"},
            "entry": [{"item": {"reference": "DocumentReference/old", "type": "DocumentReference"}}]
        }))
        .unwrap();
        let ctx = context(Some(existing));
        let ids = MintedIdentifiers::mint(ctx.folder());
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let json = serde_json::to_value(&bundle.entry[4]).unwrap();
        let folder = &json["resource"];
        assert_eq!(folder["meta"]["tag"], json!([{"system": "urn:t", "code": "x"}]));
        assert_eq!(folder["meta"]["security"][0]["code"], "R");
        assert_eq!(folder["meta"]["source"], "urn:registry");
        assert_eq!(folder["identifier"][0]["period"], json!({"start": "2021-01-01"}));
        assert_eq!(folder["subject"]["type"], "Patient");
        assert_eq!(folder["entry"][0]["item"]["type"], "DocumentReference");
        assert_eq!(folder["entry"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_patient_is_put_unchanged() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let json = serde_json::to_value(&bundle.entry[5]).unwrap();
        assert_eq!(json["request"], json!({"method": "PUT", "url": "Patient/p1"}));
        assert_eq!(&json["resource"], ctx.patient());
    }

    #[test]
    fn test_audit_event_shape() {
        let ctx = context(None);
        let ids = MintedIdentifiers::mint(None);
        let bundle = assembler().assemble(&ctx, "doc-1", b"%PDF", &ids);
        let event = bundle.entry[6].resource.as_audit_event().unwrap();
        assert_eq!(event.agent.len(), 2);
        assert_eq!(event.entity.len(), 2);
        assert!(event.agent[0].requestor);
        assert!(!event.agent[1].requestor);
        assert_eq!(event.action, "C");
        assert_eq!(event.outcome, "0");
        assert_eq!(event.type_.code.as_deref(), Some("110107"));
        assert_eq!(event.entity[0].what.reference.as_deref(), Some("Patient/p1"));
        assert_eq!(
            event.entity[1].what.reference,
            Some(format!("urn:uuid:{}", ids.submission_set))
        );
    }
}
