use splice_core::{AssetRegistry, OverlayAsset, Row, TabularAsset, ValidationError};

fn overlay() -> OverlayAsset {
    OverlayAsset {
        storage_key: "overlay-1.mp4".to_string(),
        processed_storage_key: "processed-overlay-1.mp4".to_string(),
        savings: Some("40%".to_string()),
    }
}

fn tabular(headers: &[&str]) -> TabularAsset {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let row: Row = headers
        .iter()
        .map(|h| (h.clone(), format!("{h} value")))
        .collect();
    TabularAsset {
        headers,
        rows: vec![row],
    }
}

#[test]
fn empty_registry_is_not_ready() {
    let registry = AssetRegistry::new();
    assert!(!registry.is_ready());
    assert_eq!(registry.ensure_ready(), Err(ValidationError::MissingOverlay));
}

#[test]
fn overlay_alone_is_not_ready() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    assert!(!registry.is_ready());
    assert_eq!(registry.ensure_ready(), Err(ValidationError::MissingTabular));
}

#[test]
fn tabular_without_overlay_is_not_ready() {
    let mut registry = AssetRegistry::new();
    registry.set_tabular(tabular(&["Website", "Name"]));
    assert!(!registry.is_ready());
}

#[test]
fn auto_mapped_headers_make_registry_ready() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["Company Website", "Contact Name", "Notes"]));

    assert_eq!(
        registry.mapping().target_field.as_deref(),
        Some("Company Website")
    );
    assert_eq!(registry.mapping().label_field.as_deref(), Some("Contact Name"));
    assert!(registry.is_ready());
}

#[test]
fn unmatched_headers_stay_unmapped_until_set() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["A", "B"]));

    assert_eq!(registry.mapping().target_field, None);
    assert_eq!(registry.mapping().label_field, None);
    assert!(!registry.is_ready());

    registry.set_mapping("A", "B").unwrap();
    assert!(registry.is_ready());
}

#[test]
fn mapping_rejects_empty_and_unknown_fields() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["A", "B"]));
    registry.set_mapping("A", "B").unwrap();
    let revision = registry.revision();

    assert!(matches!(
        registry.set_mapping("", "B"),
        Err(ValidationError::EmptyField(_))
    ));
    assert_eq!(
        registry.set_mapping("A", "C"),
        Err(ValidationError::UnknownColumn {
            column: "C".to_string()
        })
    );

    // Rejected calls keep the previous mapping.
    assert_eq!(registry.mapping().target_field.as_deref(), Some("A"));
    assert_eq!(registry.mapping().label_field.as_deref(), Some("B"));
    assert_eq!(registry.revision(), revision);
    assert!(registry.is_ready());
}

#[test]
fn mapping_without_data_is_rejected() {
    let mut registry = AssetRegistry::new();
    assert_eq!(
        registry.set_mapping("Website", "Name"),
        Err(ValidationError::MissingTabular)
    );
}

#[test]
fn reupload_with_other_headers_unreadies_registry() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["Website", "Name"]));
    assert!(registry.is_ready());

    registry.set_tabular(tabular(&["A", "B"]));
    assert!(!registry.is_ready());
}

#[test]
fn clearing_mapping_unreadies_registry() {
    let mut registry = AssetRegistry::new();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["Website", "Name"]));
    registry.clear_mapping();
    assert!(!registry.is_ready());
}

#[test]
fn every_setter_bumps_revision() {
    let mut registry = AssetRegistry::new();
    let start = registry.revision();
    registry.set_overlay(overlay());
    registry.set_tabular(tabular(&["Website", "Name"]));
    registry.set_mapping("Website", "Name").unwrap();
    registry.clear_mapping();
    assert_eq!(registry.revision(), start + 4);
}
