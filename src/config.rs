// ⚙️ Validation Policy - Rules as Data
// Allow-lists and limits the validators consult, loadable from JSON

use crate::entities::{DocumentType, NoteType};
use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming a JSON policy file
pub const CONFIG_ENV_VAR: &str = "MHR_VALIDATION_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Unit notes that freeze an ACTIVE home for non-staff callers
    pub restricted_note_types: Vec<NoteType>,

    /// Document types that may proceed on a CANCELLED home
    pub cancelled_allowed_documents: Vec<DocumentType>,

    /// Document types that may proceed on an EXEMPT home
    pub exempt_allowed_documents: Vec<DocumentType>,

    /// Staff transfer document types allowing estate representatives on a sale
    pub party_type_relaxed_documents: Vec<DocumentType>,

    /// Individual first/middle/last name limit
    pub name_max_length: usize,

    pub organization_max_length: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            restricted_note_types: vec![NoteType::Taxn, NoteType::Ncon, NoteType::Rest],
            cancelled_allowed_documents: vec![DocumentType::ReregisterC, DocumentType::RegcStaff],
            exempt_allowed_documents: vec![
                DocumentType::Exre,
                DocumentType::RegcStaff,
                DocumentType::RegcClient,
                DocumentType::Puba,
                DocumentType::Ncan,
            ],
            party_type_relaxed_documents: vec![
                DocumentType::TransLandTitle,
                DocumentType::TransReceivership,
                DocumentType::TransWritSeizure,
            ],
            name_max_length: 50,
            organization_max_length: 150,
        }
    }
}

impl ValidationConfig {
    /// Load policy from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read validation config: {:?}", path.as_ref()))?;

        let config: ValidationConfig =
            serde_json::from_str(&content).context("Failed to parse validation config JSON")?;

        tracing::info!(path = ?path.as_ref(), "loaded validation config");
        Ok(config)
    }

    /// Load from the file named by MHR_VALIDATION_CONFIG, or use defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn is_restricted_note(&self, note_type: NoteType) -> bool {
        self.restricted_note_types.contains(&note_type)
    }

    pub fn relaxes_party_types(&self, document_type: Option<DocumentType>) -> bool {
        document_type.map_or(false, |doc| self.party_type_relaxed_documents.contains(&doc))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let config = ValidationConfig::default();

        assert!(config.is_restricted_note(NoteType::Taxn));
        assert!(!config.is_restricted_note(NoteType::Caution));
        assert!(config.relaxes_party_types(Some(DocumentType::TransLandTitle)));
        assert!(!config.relaxes_party_types(None));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ValidationConfig = serde_json::from_value(serde_json::json!({
            "restrictedNoteTypes": ["TAXN"],
            "nameMaxLength": 40
        }))
        .unwrap();

        assert_eq!(config.restricted_note_types, vec![NoteType::Taxn]);
        assert_eq!(config.name_max_length, 40);
        assert_eq!(config.organization_max_length, 150);
        assert!(config.exempt_allowed_documents.contains(&DocumentType::Exre));
    }

    #[test]
    fn test_from_file_missing() {
        let result = ValidationConfig::from_file("/nonexistent/mhr-policy.json");
        assert!(result.is_err());
    }
}
