//! Fixed literals of the DDCC / IHE MHD ITI-65 submission.
//!
//! Everything an auditor may need to check about the shape of a submission lives here:
//! profiles, code systems, audit actor roles and their display strings.

use ddcc_models::Coding;

/// A code from a fixed code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCode {
    pub system: &'static str,
    pub code: &'static str,
    pub display: Option<&'static str>,
}

impl FixedCode {
    pub const fn new(system: &'static str, code: &'static str, display: &'static str) -> Self {
        Self {
            system,
            code,
            display: Some(display),
        }
    }

    pub const fn bare(system: &'static str, code: &'static str) -> Self {
        Self {
            system,
            code,
            display: None,
        }
    }

    pub fn coding(&self) -> Coding {
        Coding::new(self.system, self.code, self.display)
    }
}

// Media types
pub const PDF: &str = "application/pdf";
pub const PNG: &str = "image/png";
pub const FHIR_JSON: &str = ddcc_registry_client::FHIR_JSON;
/// Content type prefix of attachments that point at a structured FHIR document bundle.
pub const FHIR_STRUCTURED: &str = "application/fhir";

// Profiles
pub const DDCC_DOCUMENT_REFERENCE_PROFILE: &str =
    "http://worldhealthorganization.github.io/ddcc/StructureDefinition/DDCCDocumentReference";
pub const MHD_AUDIT_RECIPIENT_PROFILE: &str =
    "http://profiles.ihe.net/ITI/MHD/StructureDefinition/IHE.MHD.ProvideBundle.Audit.Recipient";

// Extensions
pub const IHE_SOURCE_ID_EXTENSION: &str =
    "http://profiles.ihe.net/ITI/MHD/StructureDefinition/ihe-sourceId";
pub const IHE_DESIGNATION_TYPE_EXTENSION: &str =
    "http://profiles.ihe.net/ITI/MHD/StructureDefinition/ihe-designationType";

// Identifier systems
pub const DDCC_DOCUMENT_REFERENCE_SYSTEM: &str =
    "http://worldhealthorganization.github.io/ddcc/DocumentReference";
pub const SOURCE_ID_SYSTEM: &str = "origen";
pub const SOURCE_ID_VALUE: &str = "Solucion Digital";

// List codes
pub const MHD_LIST_TYPES: &str = "http://profiles.ihe.net/ITI/MHD/CodeSystem/MHDlistTypes";
pub const LIST_SUBMISSION_SET: FixedCode = FixedCode::bare(MHD_LIST_TYPES, "submissionset");
pub const LIST_FOLDER: FixedCode = FixedCode::bare(MHD_LIST_TYPES, "folder");
pub const FOLDER_DESIGNATION_DDCC: FixedCode = FixedCode::bare(
    "http://worldhealthorganization.github.io/ddcc/CodeSystem/DDCC-Folder-DesignationType",
    "ddcc",
);

/// `DocumentReference.type` code of the WHO proof-of-vaccination (QR image) document.
pub const WHO_PROOF_TYPE_CODE: &str = "who";

// Audit event
const DCM: &str = "http://dicom.nema.org/resources/ontology/DCM";
pub const AUDIT_TYPE_IMPORT: FixedCode = FixedCode::new(DCM, "110107", "Import");
pub const AUDIT_SUBTYPE_ITI_65: FixedCode =
    FixedCode::new("urn:ihe:event-type-code", "ITI-65", "Provide Document Bundle");
pub const AUDIT_ACTION_CREATE: &str = "C";
pub const AUDIT_OUTCOME_SUCCESS: &str = "0";

pub const AUDIT_ROLE_SOURCE: FixedCode = FixedCode::new(DCM, "110153", "Source Role ID");
pub const AUDIT_ROLE_DESTINATION: FixedCode = FixedCode::new(DCM, "110152", "Destination Role ID");
pub const AUDIT_SOURCE_WHO: &str = "Solucion Digital";
pub const AUDIT_SOURCE_ADDRESS: &str = "Servidor Solucion Digital";
pub const AUDIT_DESTINATION_WHO: &str = "Servicio de generacion";
pub const AUDIT_DESTINATION_ADDRESS: &str = "Servidor Servicio Generacion";
/// Network access point type 1 = machine name
pub const AUDIT_NETWORK_MACHINE_NAME: &str = "1";

pub const AUDIT_OBSERVER: &str = "Servicio de generacion";
pub const AUDIT_SOURCE_TYPE_APPLICATION_SERVER: FixedCode = FixedCode::new(
    "http://terminology.hl7.org/CodeSystem/security-source-type",
    "4",
    "Application Server",
);

const AUDIT_ENTITY_TYPE: &str = "http://terminology.hl7.org/CodeSystem/audit-entity-type";
const OBJECT_ROLE: &str = "http://terminology.hl7.org/CodeSystem/object-role";
pub const AUDIT_ENTITY_PERSON: FixedCode = FixedCode::new(AUDIT_ENTITY_TYPE, "1", "Person");
pub const AUDIT_ENTITY_SYSTEM_OBJECT: FixedCode =
    FixedCode::new(AUDIT_ENTITY_TYPE, "2", "System Object");
pub const AUDIT_ROLE_PATIENT: FixedCode = FixedCode::new(OBJECT_ROLE, "1", "Patient");
pub const AUDIT_ROLE_JOB: FixedCode = FixedCode::new(OBJECT_ROLE, "20", "Job");
