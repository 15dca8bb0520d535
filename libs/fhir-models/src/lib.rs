//! FHIR R4 models for the IHE MHD "Provide Document Bundle" transaction.
//!
//! Only the resources the DDCC registry submission touches are modelled. Resources that are
//! passed through untouched (Patient, historical document bundles) stay as `serde_json::Value`.

pub mod common;
pub mod resources;

pub use common::*;
pub use resources::*;
