//! End-to-end exports against the fixture framework bundle

use navlayer_export::{
    ExportConfig, ExportError, Exporter, OutputFormat, Renderer, SubtechniqueDisplay, TextRenderer,
};
use navlayer_matrix::{CellKind, MatrixCache, MemoryStore, MergeRegion};
use navlayer_model::{Annotation, Domain, Gradient, Layer, LayerDocument, LoadMode, Severity, SortMode};
use navlayer_test_utils::{brute_force_layer, enterprise_bundle, per_tactic_layer};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn exporter() -> Exporter {
    let store = MemoryStore::from_bundle(&enterprise_bundle()).unwrap();
    Exporter::new(Domain::Enterprise, Arc::new(store))
}

fn labels_in_column(export: &navlayer_export::Export, column: usize) -> Vec<String> {
    export
        .sheet
        .cells
        .iter()
        .filter(|c| c.column == column && c.kind != CellKind::TacticHeader)
        .map(|c| c.id.clone())
        .collect()
}

#[test]
fn same_technique_colored_per_tactic() {
    let export = exporter().export(&per_tactic_layer()).unwrap();

    // Valid Accounts is the third technique in both columns
    let initial = export.sheet.cell(4, 1).unwrap();
    let persistence = export.sheet.cell(4, 2).unwrap();
    assert_eq!(initial.id, "T1078");
    assert_eq!(persistence.id, "T1078");
    assert_eq!(initial.style.fill.as_deref(), Some("#ff0000"));
    assert_eq!(persistence.style.fill.as_deref(), Some("#00ff00"));
    assert!(export.diagnostics.is_empty());
}

#[test]
fn unresolved_annotations_warn_once_each() {
    let document = LayerDocument::new("unresolved", Domain::Enterprise)
        .with_annotation(Annotation::new("T9999").with_score(1.0))
        .with_annotation(Annotation::new("T1110").with_tactic("impact"))
        .with_annotation(Annotation::new("T1555").with_color("#abcdef"));
    let export = exporter().export(&document).unwrap();

    let warnings: Vec<&str> = export.warnings().map(|d| d.path.as_str()).collect();
    assert_eq!(warnings, vec!["techniques[0]", "techniques[1]"]);
    let styled: Vec<&str> = export
        .sheet
        .cells
        .iter()
        .filter(|c| c.style.fill.is_some())
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(styled, vec!["T1555"]);
}

#[test]
fn collapsed_subtechnique_is_an_info_note() {
    let document = LayerDocument::new("hidden", Domain::Enterprise).with_annotation(
        Annotation::new("T1110.001")
            .with_tactic("credential-access")
            .with_score(5.0),
    );
    let export = exporter().export(&document).unwrap();
    assert_eq!(export.diagnostics.len(), 1);
    assert_eq!(export.diagnostics[0].severity, Severity::Info);
    assert_eq!(export.warnings().count(), 0);
}

#[test]
fn domain_mismatch_aborts() {
    let document = LayerDocument::new("mobile", Domain::Mobile);
    assert!(matches!(
        exporter().export(&document),
        Err(ExportError::DomainMismatch {
            expected: Domain::Enterprise,
            actual: Domain::Mobile
        })
    ));
}

#[test]
fn hide_disabled_removes_rows() {
    let document = LayerDocument::new("disabled", Domain::Enterprise)
        .with_annotation(Annotation::new("T1190").with_enabled(false));

    let shown = exporter().export(&document).unwrap();
    let cell = shown.sheet.cell(2, 1).unwrap();
    assert_eq!(cell.id, "T1190");
    assert_eq!(cell.style.font_color.as_deref(), Some("#909090"));

    let hidden = exporter().export(&document.with_hide_disabled(true)).unwrap();
    assert_eq!(labels_in_column(&hidden, 1), vec!["T1566", "T1078"]);
    assert!(hidden.diagnostics.is_empty());
}

#[test]
fn hidden_disabled_subtechnique_is_skipped_silently() {
    let document = LayerDocument::new("disabled child", Domain::Enterprise)
        .with_annotation(
            Annotation::new("T1110.001")
                .with_tactic("credential-access")
                .with_enabled(false),
        )
        .with_hide_disabled(true);
    let export = exporter().export(&document).unwrap();
    assert!(export.diagnostics.is_empty());

    let shown = exporter().export(&document.with_hide_disabled(false)).unwrap();
    assert_eq!(shown.diagnostics.len(), 1);
    assert_eq!(shown.diagnostics[0].severity, Severity::Info);
}

#[test]
fn unknown_subtechnique_warns() {
    let document = LayerDocument::new("unknown child", Domain::Enterprise)
        .with_annotation(Annotation::new("T1110.999").with_score(3.0));
    let export = exporter().export(&document).unwrap();
    let warnings: Vec<&str> = export.warnings().map(|d| d.path.as_str()).collect();
    assert_eq!(warnings, vec!["techniques[0]"]);
}

#[test]
fn brute_force_expansion_through_the_exporter() {
    let export = exporter().export(&brute_force_layer()).unwrap();
    assert_eq!(
        labels_in_column(&export, 4),
        vec!["T1110.004", "T1110.002", "T1110.001", "T1110.003"]
    );
    assert!(export.sheet.merges.contains(&MergeRegion {
        start_row: 2,
        column: 3,
        row_span: 4,
        col_span: 1
    }));
    assert_eq!(export.sheet.cell(1, 5).unwrap().id, "impact");
    assert_eq!(export.sheet.columns, 5);

    let none = exporter()
        .with_config(ExportConfig::new().with_subtechniques(SubtechniqueDisplay::None))
        .export(&brute_force_layer())
        .unwrap();
    assert!(none.sheet.merges.is_empty());
    assert_eq!(none.sheet.columns, 4);
}

#[test]
fn score_sorting_reorders_columns() {
    let document = LayerDocument::new("sorted", Domain::Enterprise)
        .with_sorting(SortMode::ScoreDescending)
        .with_gradient(Gradient::new(&["#ffffff", "#000000"], 0, 100).unwrap())
        .with_annotation(Annotation::new("T1003").with_score(80.0))
        .with_annotation(Annotation::new("T1555").with_score(20.0));
    let export = exporter().export(&document).unwrap();
    assert_eq!(labels_in_column(&export, 3), vec!["T1003", "T1555", "T1110"]);
}

#[test]
fn label_flags_and_header_fill() {
    let config = ExportConfig::new()
        .with_show_id(true)
        .with_header_fill("#dddddd");
    let export = exporter().with_config(config).export(&per_tactic_layer()).unwrap();
    assert_eq!(export.sheet.cell(4, 1).unwrap().label, "T1078: Valid Accounts");
    let header = export.sheet.cell(1, 1).unwrap();
    assert_eq!(header.label, "Initial Access");
    assert_eq!(header.style.fill.as_deref(), Some("#dddddd"));
}

#[test]
fn exporters_share_a_cache() {
    let cache = MatrixCache::new(4);
    let store = Arc::new(MemoryStore::from_bundle(&enterprise_bundle()).unwrap());
    let a = Exporter::new(Domain::Enterprise, store.clone()).with_cache(cache.clone());
    let b = Exporter::new(Domain::Enterprise, store).with_cache(cache.clone());
    a.export(&per_tactic_layer()).unwrap();
    b.export(&brute_force_layer()).unwrap();
    assert_eq!(cache.stats().entry_count, 1);
}

#[test]
fn file_to_file_export() {
    let dir = tempfile::tempdir().unwrap();
    let layer_path = dir.path().join("layer.json");
    let layer = serde_json::json!({
        "name": "from disk",
        "versions": {"layer": "4.1", "navigator": "4.1"},
        "domain": "enterprise-attack",
        "techniques": [
            {"techniqueID": "T1098", "comment": "check admins"},
            {"techniqueID": "T1136", "unexpected": 1}
        ]
    });
    std::fs::write(&layer_path, layer.to_string()).unwrap();

    let mut strict = Layer::new(LoadMode::Strict);
    assert!(strict.load_file(&layer_path).is_err());

    let mut lenient = Layer::new(LoadMode::Lenient);
    let document = lenient.load_file(&layer_path).unwrap().clone();
    let export = exporter().export(&document).unwrap();

    let output = dir.path().join("sheet.txt");
    let format = OutputFormat::from_path(&output).unwrap();
    assert_eq!(format, OutputFormat::Text);
    TextRenderer.write_file(&export.sheet, &output).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("# from disk (enterprise-attack, bundle--navlayer-fixture)\n"));
    assert!(text.contains("r2c2 T1098 note=\"check admins\" (navlayer)"));
}
