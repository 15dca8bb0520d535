mod audit_event;
mod binary;
mod bundle;
mod document_reference;
mod list;

pub use audit_event::*;
pub use binary::*;
pub use bundle::*;
pub use document_reference::*;
pub use list::*;
