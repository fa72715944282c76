use serde_json::{Value, json};

use super::*;
use crate::pipeline::controls::scatter_figure_controls;
use crate::render::SpecRenderer;
use crate::session::{CycleInput, ScriptedSurface, Upload, bind, bind_fn};

fn collection() -> Collection {
    let mut table = Table::new(vec![
        "Term".to_string(),
        "CellType".to_string(),
        "log2_score".to_string(),
        "log10_qval".to_string(),
    ]);
    for (term, cell, x, y) in [
        ("HALLMARK_HYPOXIA", "B.cells", 3.0, 4.0),
        ("HALLMARK_MYC", "B.cells", 2.0, 1.0),
        ("KEGG_APOPTOSIS", "B.cells", 1.0, 3.0),
        ("REACTOME_X", "B.cells", 0.5, 0.5),
        ("KEGG_T", "T.cells", 1.0, 1.0),
    ] {
        table
            .push_row(vec![
                Cell::Text(term.to_string()),
                Cell::Text(cell.to_string()),
                Cell::Number(x),
                Cell::Number(y),
            ])
            .unwrap();
    }
    let mut c = Collection::new();
    c.insert("CE1", table);
    c
}

fn cycle(values: &[(&str, Value)]) -> CycleInput {
    let mut input = CycleInput::default();
    for (k, v) in values {
        input.values.insert(k.to_string(), v.clone());
    }
    input
}

fn fresh_store() -> SessionStore {
    let mut store = SessionStore::new();
    store.set(keys::COLLECTION, collection());
    store.set(keys::HIGHLIGHT_SUBSETS, SubsetRegistry::new());
    store
}

fn prepare(surface: &mut ScriptedSurface, store: &mut SessionStore, profile: &ViewerProfile) {
    bind(keys::GENE_SET, select_dataset)
        .try_call(surface, store, profile)
        .unwrap();
    bind(keys::FIGURE_SETTINGS, scatter_figure_controls).call(surface, store, profile);
    bind(keys::GENE_SET_SETTINGS, figure_settings).call(surface, store, profile);
    bind_fn(topmost_thresholds)
        .try_call(surface, store, profile)
        .unwrap();
}

fn registry(store: &SessionStore) -> &SubsetRegistry {
    store.get::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS).unwrap()
}

#[test]
fn test_select_dataset_defaults_to_first_choices() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    surface.begin_cycle(CycleInput::default());
    let mut store = fresh_store();
    prepare(&mut surface, &mut store, &profile);

    let dataset = stored::<SelectedDataset>(&store, keys::GENE_SET).unwrap();
    assert_eq!(dataset.ecotype, "CE1");
    assert_eq!(dataset.celltype, "B.cells");
    assert_eq!(dataset.table.n_rows(), 4);
    assert_eq!(dataset.figure_name("subsets"), "CE1_B.cells.subsets");

    let settings = stored::<GeneSetSettings>(&store, keys::GENE_SET_SETTINGS).unwrap();
    assert_eq!(settings.reference, "Term");
    assert_eq!(settings.x, "log2_score");
    assert_eq!(settings.y, "log10_qval");
    assert_eq!(settings.style, None);
}

#[test]
fn test_select_dataset_follows_celltype_choice() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    surface.begin_cycle(cycle(&[(widgets::CELLTYPE, json!("T.cells"))]));
    let mut store = fresh_store();
    prepare(&mut surface, &mut store, &profile);
    let dataset = stored::<SelectedDataset>(&store, keys::GENE_SET).unwrap();
    assert_eq!(dataset.celltype, "T.cells");
    assert_eq!(dataset.table.n_rows(), 1);
}

#[test]
fn test_no_collection_yields_nothing() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = SessionStore::new();
    prepare(&mut surface, &mut store, &profile);
    assert!(stored::<SelectedDataset>(&store, keys::GENE_SET).is_none());
    assert!(stored::<Thresholds>(&store, keys::TOPMOST_THRESHOLDS).is_none());
    assert!(
        view_subsets(&store, &SpecRenderer, &profile)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_threshold_defaults_scale_with_maximum() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    surface.begin_cycle(CycleInput::default());
    let mut store = fresh_store();
    prepare(&mut surface, &mut store, &profile);

    let t = stored::<Thresholds>(&store, keys::TOPMOST_THRESHOLDS).unwrap();
    assert!((t.x - 1.95).abs() < 1e-9);
    assert!((t.y - 2.6).abs() < 1e-9);
    assert_eq!(t.per_subset, 0);
}

#[test]
fn test_upload_subsets_imports_once_per_content() {
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    surface.attach_file(
        widgets::SUBSET_FILE,
        Upload {
            name: "subsets.json".to_string(),
            bytes: br#"{"hallmark": ["^HALLMARK"]}"#.to_vec(),
        },
    );
    surface.begin_cycle(CycleInput::default());
    assert!(upload_subsets(&mut surface, &mut store).is_empty());
    assert_eq!(registry(&store).labels(), vec!["hallmark"]);

    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .remove("hallmark");
    upload_subsets(&mut surface, &mut store);
    assert!(registry(&store).labels().is_empty());

    let mut detach = CycleInput::default();
    detach.files.insert(widgets::SUBSET_FILE.to_string(), None);
    surface.begin_cycle(detach);
    upload_subsets(&mut surface, &mut store);
    assert!(!store.contains(keys::SUBSET_IMPORT_DIGEST));
}

#[test]
fn test_upload_subsets_reports_bad_file() {
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    surface.attach_file(
        widgets::SUBSET_FILE,
        Upload {
            name: "broken.json".to_string(),
            bytes: b"[1]".to_vec(),
        },
    );
    let messages = upload_subsets(&mut surface, &mut store);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("broken.json"));
    assert!(registry(&store).labels().is_empty());
}

#[test]
fn test_edit_subsets_save_and_drop() {
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();

    surface.begin_cycle(cycle(&[
        (widgets::SUBSET_PATTERNS, json!("['^HALLMARK']")),
        (widgets::SUBSET_NEW_LABEL, json!("hallmark")),
        (widgets::SAVE_SUBSET, json!(true)),
    ]));
    edit_subsets(&mut surface, &mut store);
    assert_eq!(registry(&store).labels(), vec!["hallmark"]);
    assert_eq!(registry(&store).patterns("hallmark"), Some(vec!["^HALLMARK"]));

    surface.begin_cycle(cycle(&[
        (widgets::SUBSET_LABEL, json!("hallmark")),
        (widgets::DROP_SUBSET, json!(true)),
    ]));
    edit_subsets(&mut surface, &mut store);
    assert!(registry(&store).labels().is_empty());
}

#[test]
fn test_edit_subsets_updates_patterns_in_place() {
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .add_or_update("kegg", vec!["^KEGG".to_string()]);

    surface.begin_cycle(cycle(&[
        (widgets::SUBSET_LABEL, json!("kegg")),
        (widgets::SUBSET_PATTERNS, json!("['^KEGG', 'APOPTOSIS']")),
    ]));
    edit_subsets(&mut surface, &mut store);
    assert_eq!(
        registry(&store).patterns("kegg"),
        Some(vec!["^KEGG", "APOPTOSIS"])
    );
}

#[test]
fn test_auto_drop_subsets_uses_thresholds() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    {
        let reg = store
            .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
            .unwrap();
        reg.add_or_update("hallmark", vec!["^HALLMARK".to_string()]);
        reg.add_or_update("kegg", vec!["^KEGG".to_string()]);
    }
    surface.begin_cycle(cycle(&[
        (widgets::X_THRESHOLD, json!(0.9)),
        (widgets::Y_THRESHOLD, json!(0.9)),
        (widgets::AUTO_DROP, json!(2)),
    ]));
    prepare(&mut surface, &mut store, &profile);

    let dropped = auto_drop_subsets(&mut surface, &mut store, &profile).unwrap();
    assert_eq!(dropped, vec!["kegg"]);
    assert_eq!(registry(&store).labels(), vec!["hallmark"]);
}

#[test]
fn test_view_subsets_labels_every_term() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .add_or_update("hallmark", vec!["^HALLMARK".to_string()]);
    surface.begin_cycle(CycleInput::default());
    prepare(&mut surface, &mut store, &profile);

    let view = view_subsets(&store, &SpecRenderer, &profile)
        .unwrap()
        .unwrap();
    assert_eq!(view.name, "CE1_B.cells.subsets");
    assert_eq!(
        view.table.string_column(LABEL_COLUMN).unwrap(),
        vec!["hallmark", "hallmark", SENTINEL, SENTINEL]
    );
    assert_eq!(view.figure.spec()["series"][0]["name"], "hallmark");
}

#[test]
fn test_view_histogram_counts_and_fractions() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .add_or_update("hallmark", vec!["^HALLMARK".to_string()]);
    surface.begin_cycle(cycle(&[
        (widgets::X_THRESHOLD, json!(0.9)),
        (widgets::Y_THRESHOLD, json!(0.9)),
    ]));
    prepare(&mut surface, &mut store, &profile);

    let view = view_histogram(&store, &SpecRenderer, false)
        .unwrap()
        .unwrap();
    assert_eq!(view.name, "CE1_B.cells.fractions");
    assert_eq!(view.table.columns(), &[LABEL_COLUMN, "Scale", "Count"]);
    let values = view.table.numeric_column("Count").unwrap();
    // all: hallmark 2, None 2; topmost: hallmark 2 (HYPOXIA, MYC), None 1 (APOPTOSIS)
    assert_eq!(values, vec![2.0, 2.0, 2.0, 1.0]);

    let view = view_histogram(&store, &SpecRenderer, true)
        .unwrap()
        .unwrap();
    let fractions = view.table.numeric_column("Fraction").unwrap();
    assert!((fractions[0] + fractions[1] - 1.0).abs() < 1e-12);
    assert!((fractions[2] - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_view_gene_sets_global_and_per_subset() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .add_or_update("hallmark", vec!["^HALLMARK".to_string()]);
    surface.begin_cycle(CycleInput::default());
    prepare(&mut surface, &mut store, &profile);

    let view = view_gene_sets(&store, &SpecRenderer, &profile, true)
        .unwrap()
        .unwrap();
    assert!(view.show_table);
    assert_eq!(view.name, "CE1_B.cells.topmost");
    assert_eq!(
        view.table.string_column("Term").unwrap(),
        vec!["HALLMARK_HYPOXIA"]
    );

    surface.begin_cycle(cycle(&[(widgets::PER_SUBSET, json!(1))]));
    prepare(&mut surface, &mut store, &profile);
    let view = view_gene_sets(&store, &SpecRenderer, &profile, false)
        .unwrap()
        .unwrap();
    assert_eq!(
        view.table.string_column("Term").unwrap(),
        vec!["HALLMARK_HYPOXIA", "KEGG_APOPTOSIS"]
    );
}

#[test]
fn test_axis_selects_offer_only_numeric_columns() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    surface.begin_cycle(cycle(&[
        (widgets::X_COLUMN, json!("Term")),
        (widgets::Y_COLUMN, json!("CellType")),
        (widgets::REFERENCE, json!("CellType")),
    ]));
    prepare(&mut surface, &mut store, &profile);

    let settings = stored::<GeneSetSettings>(&store, keys::GENE_SET_SETTINGS).unwrap();
    assert_eq!(settings.x, "log2_score");
    assert_eq!(settings.y, "log10_qval");
    assert_eq!(settings.reference, "CellType");
    assert!(stored::<Thresholds>(&store, keys::TOPMOST_THRESHOLDS).is_some());
    assert!(
        view_gene_sets(&store, &SpecRenderer, &profile, false)
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_select_dataset_skips_empty_ecotypes() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    let mut c = Collection::new();
    c.insert("CE0", Table::default());
    if let Some(populated) = collection().get("CE1") {
        c.insert("CE1", populated.clone());
    }
    store.set(keys::COLLECTION, c);
    surface.begin_cycle(CycleInput::default());
    prepare(&mut surface, &mut store, &profile);

    let dataset = stored::<SelectedDataset>(&store, keys::GENE_SET).unwrap();
    assert_eq!(dataset.ecotype, "CE1");
    assert_eq!(dataset.celltype, "B.cells");
}

#[test]
fn test_view_subsets_keeps_data_subset_column() {
    let profile = ViewerProfile::default_v1();
    let mut surface = ScriptedSurface::new();
    let mut store = fresh_store();
    let table = collection()
        .get("CE1")
        .unwrap()
        .clone()
        .with_column("Subset", vec![Cell::Text("data".to_string()); 5])
        .unwrap();
    let mut c = Collection::new();
    c.insert("CE1", table);
    store.set(keys::COLLECTION, c);
    store
        .get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
        .unwrap()
        .add_or_update("hallmark", vec!["^HALLMARK".to_string()]);
    surface.begin_cycle(CycleInput::default());
    prepare(&mut surface, &mut store, &profile);

    let view = view_subsets(&store, &SpecRenderer, &profile)
        .unwrap()
        .unwrap();
    assert_eq!(
        view.table.string_column("Subset").unwrap(),
        vec!["data"; 4]
    );
    assert_eq!(
        view.table.string_column("Subset_1").unwrap(),
        vec!["hallmark", "hallmark", SENTINEL, SENTINEL]
    );
    assert_eq!(view.figure.spec()["encoding"]["hue"], "Subset_1");
}
