//! Identifiers minted for one submission attempt.

use ddcc_models::List;
use uuid::Uuid;

/// Ids shared by the entries of one transaction.
///
/// Every cross-reference in the assembled bundle points at one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedIdentifiers {
    pub document_reference: String,
    pub binary_reference: String,
    pub binary: String,
    pub submission_set: String,
    /// The existing folder's id, or a fresh one when the holder has no folder yet.
    pub folder: String,
    pub audit_event: String,
}

impl MintedIdentifiers {
    pub fn mint(existing_folder: Option<&List>) -> Self {
        let folder = existing_folder
            .and_then(|f| f.id.clone())
            .unwrap_or_else(fresh_id);
        Self {
            document_reference: fresh_id(),
            binary_reference: fresh_id(),
            binary: fresh_id(),
            submission_set: fresh_id(),
            folder,
            audit_event: fresh_id(),
        }
    }
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_ids_are_distinct() {
        let ids = MintedIdentifiers::mint(None);
        let all: HashSet<_> = [
            &ids.document_reference,
            &ids.binary_reference,
            &ids.binary,
            &ids.submission_set,
            &ids.folder,
            &ids.audit_event,
        ]
        .into_iter()
        .collect();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn test_existing_folder_keeps_its_id() {
        let folder = List::working(Some("folder-7".to_string()));
        assert_eq!(MintedIdentifiers::mint(Some(&folder)).folder, "folder-7");
    }
}
