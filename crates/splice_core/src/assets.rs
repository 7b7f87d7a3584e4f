use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One spreadsheet row keyed by header.
pub type Row = BTreeMap<String, String>;

const TARGET_KEYWORDS: [&str; 2] = ["website", "url"];
const LABEL_KEYWORDS: [&str; 2] = ["name", "company"];

/// Uploaded overlay video as stored by the upload service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayAsset {
    pub storage_key: String,
    pub processed_storage_key: String,
    /// Human readable size reduction reported by the pre-processor. Display only.
    pub savings: Option<String>,
}

/// Parsed spreadsheet. Row order is the order results are correlated in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabularAsset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl TabularAsset {
    pub fn has_header(&self, field: &str) -> bool {
        self.headers.iter().any(|header| header == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub target_field: Option<String>,
    pub label_field: Option<String>,
}

impl ColumnMapping {
    /// Seeds a mapping from header names. Later headers overwrite earlier matches.
    pub fn auto_detect(headers: &[String]) -> Self {
        let mut mapping = Self::default();
        for header in headers {
            let lowered = header.to_lowercase();
            if TARGET_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                mapping.target_field = Some(header.clone());
            }
            if LABEL_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                mapping.label_field = Some(header.clone());
            }
        }
        mapping
    }

    fn is_complete_for(&self, tabular: &TabularAsset) -> bool {
        let valid = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty() && tabular.has_header(name))
        };
        valid(&self.target_field) && valid(&self.label_field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no overlay video has been uploaded")]
    MissingOverlay,
    #[error("no data file has been uploaded")]
    MissingTabular,
    #[error("the {0} column must be selected")]
    EmptyField(MappingField),
    #[error("column '{column}' is not present in the uploaded data")]
    UnknownColumn { column: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingField {
    Target,
    Label,
}

impl std::fmt::Display for MappingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingField::Target => write!(f, "website"),
            MappingField::Label => write!(f, "name"),
        }
    }
}

/// Holds the two required inputs and the user's column choice.
///
/// Every mutation bumps `revision`, so a caller comparing revisions before and
/// after a setter can tell that readiness may have changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetRegistry {
    overlay: Option<OverlayAsset>,
    tabular: Option<TabularAsset>,
    mapping: ColumnMapping,
    revision: u64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay(&self) -> Option<&OverlayAsset> {
        self.overlay.as_ref()
    }

    pub fn tabular(&self) -> Option<&TabularAsset> {
        self.tabular.as_ref()
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_overlay(&mut self, asset: OverlayAsset) {
        self.overlay = Some(asset);
        self.touch();
    }

    /// Replaces the data file and re-seeds the mapping from its headers.
    pub fn set_tabular(&mut self, asset: TabularAsset) {
        self.mapping = ColumnMapping::auto_detect(&asset.headers);
        self.tabular = Some(asset);
        self.touch();
    }

    pub fn set_mapping(&mut self, target_field: &str, label_field: &str) -> Result<(), ValidationError> {
        let tabular = self.tabular.as_ref().ok_or(ValidationError::MissingTabular)?;
        check_field(tabular, target_field, MappingField::Target)?;
        check_field(tabular, label_field, MappingField::Label)?;

        self.mapping = ColumnMapping {
            target_field: Some(target_field.to_string()),
            label_field: Some(label_field.to_string()),
        };
        self.touch();
        Ok(())
    }

    pub fn clear_mapping(&mut self) {
        self.mapping = ColumnMapping::default();
        self.touch();
    }

    pub fn is_ready(&self) -> bool {
        self.ensure_ready().is_ok()
    }

    /// Like [`Self::is_ready`], but names the first missing piece.
    pub fn ensure_ready(&self) -> Result<(), ValidationError> {
        if self.overlay.is_none() {
            return Err(ValidationError::MissingOverlay);
        }
        let tabular = self.tabular.as_ref().ok_or(ValidationError::MissingTabular)?;
        if self.mapping.is_complete_for(tabular) {
            return Ok(());
        }
        let target = self.mapping.target_field.as_deref().unwrap_or_default();
        check_field(tabular, target, MappingField::Target)?;
        let label = self.mapping.label_field.as_deref().unwrap_or_default();
        check_field(tabular, label, MappingField::Label)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn check_field(tabular: &TabularAsset, field: &str, which: MappingField) -> Result<(), ValidationError> {
    if field.trim().is_empty() {
        return Err(ValidationError::EmptyField(which));
    }
    if !tabular.has_header(field) {
        return Err(ValidationError::UnknownColumn {
            column: field.to_string(),
        });
    }
    Ok(())
}
