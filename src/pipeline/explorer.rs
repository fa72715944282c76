use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, info, warn};

use crate::input::patterns::{format_patterns, parse_pattern_text, parse_subset_file};
use crate::model::collection::Collection;
use crate::model::profile::ViewerProfile;
use crate::model::settings::{
    EffectiveSettings, FigureSettings, GeneSetSettings, Thresholds, WhichViews,
};
use crate::model::subsets::{LABEL_COLUMN, RankQuery, SENTINEL, SubsetRegistry, label_column};
use crate::model::table::{Cell, Table, TableError};
use crate::pipeline::{
    ViewOutput, optional_choice, optional_options, ordered_options, stored, widgets,
};
use crate::render::{ChartKind, Encoding, RenderRequest, Renderer};
use crate::session::{BindCtx, InteractionSurface, SessionStore, keys};

pub const SCALE_ALL: &str = "among all terms";
pub const SCALE_TOPMOST: &str = "among topmost terms";

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedDataset {
    pub ecotype: String,
    pub celltype: String,
    pub table: Table,
}

impl SelectedDataset {
    pub fn figure_name(&self, suffix: &str) -> String {
        format!("{}_{}.{}", self.ecotype, self.celltype, suffix)
    }
}

pub fn select_dataset(ctx: &mut BindCtx<'_>) -> Result<Option<SelectedDataset>, TableError> {
    let Some(collection) = ctx.store.get::<Collection>(keys::COLLECTION) else {
        return Ok(None);
    };
    let celltype_column = ctx.profile.celltype_column;
    let ecotypes = collection.populated_ecotypes(celltype_column);
    let Some(ecotype) = ctx.surface.select(widgets::ECOTYPE, &ecotypes) else {
        return Ok(None);
    };
    let Some(table) = collection.get(&ecotype) else {
        return Ok(None);
    };
    let celltypes = table.unique_strings(celltype_column)?;
    let Some(celltype) = ctx.surface.select(widgets::CELLTYPE, &celltypes) else {
        return Ok(None);
    };
    let table = table.filter_eq(celltype_column, &celltype)?;
    debug!(%ecotype, %celltype, terms = table.n_rows(), "dataset selected");
    Ok(Some(SelectedDataset {
        ecotype,
        celltype,
        table,
    }))
}

pub fn figure_settings(ctx: &mut BindCtx<'_>) -> Option<GeneSetSettings> {
    let dataset = stored::<SelectedDataset>(ctx.store, keys::GENE_SET)?;
    let columns = dataset.table.columns();
    let numeric = dataset.table.numeric_columns();
    let profile = ctx.profile;

    let reference = ctx
        .surface
        .select(widgets::REFERENCE, &ordered_options(columns, profile.term_column))?;
    let x = ctx
        .surface
        .select(widgets::X_COLUMN, &ordered_options(&numeric, profile.score_column))?;
    let y = ctx.surface.select(
        widgets::Y_COLUMN,
        &ordered_options(&numeric, profile.significance_column),
    )?;
    let optional = optional_options(columns);
    let style = optional_choice(ctx.surface.select(widgets::STYLE_COLUMN, &optional));
    let size = optional_choice(ctx.surface.select(widgets::SIZE_COLUMN, &optional));

    Some(GeneSetSettings {
        x,
        y,
        style,
        size,
        reference,
    })
}

pub fn show_subset_figures(ctx: &mut BindCtx<'_>) -> WhichViews {
    WhichViews {
        scatter: ctx.surface.checkbox(widgets::SHOW_SCATTER, true),
        counts: ctx.surface.checkbox(widgets::SHOW_COUNTS, false),
        normalize_counts: ctx.surface.checkbox(widgets::NORMALIZE_COUNTS, false),
        topmost: ctx.surface.checkbox(widgets::SHOW_TOPMOST, true),
        topmost_table: ctx.surface.checkbox(widgets::SHOW_TOPMOST_TABLE, false),
    }
}

pub fn topmost_thresholds(ctx: &mut BindCtx<'_>) -> Result<Option<Thresholds>, TableError> {
    let (Some(dataset), Some(settings)) = (
        stored::<SelectedDataset>(ctx.store, keys::GENE_SET),
        stored::<GeneSetSettings>(ctx.store, keys::GENE_SET_SETTINGS),
    ) else {
        return Ok(None);
    };
    let profile = ctx.profile;
    let (min_x, max_x) = dataset.table.min_max(&settings.x)?.unwrap_or((0.0, 0.0));
    let (min_y, max_y) = dataset.table.min_max(&settings.y)?.unwrap_or((0.0, 0.0));

    let x = ctx.surface.slider(
        widgets::X_THRESHOLD,
        min_x,
        max_x,
        (profile.threshold_fraction * max_x).clamp(min_x, max_x),
        profile.threshold_step,
    );
    let y = ctx.surface.slider(
        widgets::Y_THRESHOLD,
        min_y,
        max_y,
        (profile.threshold_fraction * max_y).clamp(min_y, max_y),
        profile.threshold_step,
    );
    let per_subset = ctx
        .surface
        .number(widgets::PER_SUBSET, 0, profile.per_subset_max, 0)
        .max(0) as usize;

    Ok(Some(Thresholds { x, y, per_subset }))
}

/// Merges an attached subset file into the registry. A file is imported once
/// per distinct content; detaching it allows the same file to be imported again.
pub fn upload_subsets(surface: &mut dyn InteractionSurface, store: &mut SessionStore) -> Vec<String> {
    let mut messages = Vec::new();
    let Some(upload) = surface.file(widgets::SUBSET_FILE) else {
        store.remove(keys::SUBSET_IMPORT_DIGEST);
        return messages;
    };
    let digest = content_digest(&upload.bytes);
    if store.get::<u64>(keys::SUBSET_IMPORT_DIGEST) == Some(&digest) {
        return messages;
    }
    store.set(keys::SUBSET_IMPORT_DIGEST, digest);

    match parse_subset_file(&upload.bytes) {
        Ok(payload) => {
            let n = payload.len();
            if let Some(registry) = store.get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS) {
                registry.merge(payload);
            }
            info!(source = %upload.name, labels = n, "subsets imported");
        }
        Err(err) => {
            warn!(source = %upload.name, %err, "subset file rejected");
            messages.push(format!("Could not import subsets from {}: {err}", upload.name));
        }
    }
    messages
}

pub(crate) fn content_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// One pass of the subset editor: pick a label, edit its patterns, then save
/// (optionally under a new label) or drop it.
pub fn edit_subsets(surface: &mut dyn InteractionSurface, store: &mut SessionStore) {
    if !store.contains(keys::HIGHLIGHT_SUBSETS) {
        store.set(keys::HIGHLIGHT_SUBSETS, SubsetRegistry::new());
    }
    let Some(registry) = store.get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS) else {
        return;
    };

    let mut labels: Vec<String> = registry
        .labels()
        .into_iter()
        .filter(|l| l != SENTINEL)
        .collect();
    labels.insert(0, SENTINEL.to_string());

    let label = surface
        .select(widgets::SUBSET_LABEL, &labels)
        .unwrap_or_else(|| SENTINEL.to_string());
    let current = registry
        .patterns(&label)
        .map(|ps| format_patterns(&ps))
        .unwrap_or_default();
    let patterns = parse_pattern_text(&surface.text(widgets::SUBSET_PATTERNS, &current));
    let new_label = surface.text(widgets::SUBSET_NEW_LABEL, &label);
    let save = surface.button(widgets::SAVE_SUBSET);
    let drop = surface.button(widgets::DROP_SUBSET);

    if save {
        info!(label = %new_label, patterns = patterns.len(), "subset saved");
        registry.add_or_update(&new_label, patterns);
    } else if drop {
        info!(label = %label, "subset dropped");
        registry.remove(&label);
    } else if !patterns.is_empty() {
        registry.add_or_update(&label, patterns);
    } else {
        registry.remove(SENTINEL);
    }
}

/// Drops subsets with fewer than the requested number of topmost terms.
pub fn auto_drop_subsets(
    surface: &mut dyn InteractionSurface,
    store: &mut SessionStore,
    profile: &ViewerProfile,
) -> Result<Vec<String>, TableError> {
    let min_terms = surface
        .number(widgets::AUTO_DROP, 0, profile.auto_drop_max, 0)
        .max(0) as usize;
    if min_terms == 0 {
        return Ok(Vec::new());
    }
    let (Some(dataset), Some(settings), Some(thresholds)) = (
        stored::<SelectedDataset>(store, keys::GENE_SET).cloned(),
        stored::<GeneSetSettings>(store, keys::GENE_SET_SETTINGS).cloned(),
        stored::<Thresholds>(store, keys::TOPMOST_THRESHOLDS).copied(),
    ) else {
        return Ok(Vec::new());
    };
    let Some(registry) = store.get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS) else {
        return Ok(Vec::new());
    };
    let query = RankQuery {
        x: &settings.x,
        y: &settings.y,
        x_threshold: thresholds.x,
        y_threshold: thresholds.y,
        per_label_limit: 0,
        global_limit: None,
    };
    let dropped = registry.auto_drop(&dataset.table, &settings.reference, &query, min_terms)?;
    if !dropped.is_empty() {
        info!(min_terms, dropped = ?dropped, "subsets auto-dropped");
    }
    Ok(dropped)
}

struct ExplorerInputs<'a> {
    dataset: &'a SelectedDataset,
    settings: EffectiveSettings,
    registry: &'a SubsetRegistry,
    reference: String,
}

fn explorer_inputs(store: &SessionStore) -> Option<ExplorerInputs<'_>> {
    let dataset = stored::<SelectedDataset>(store, keys::GENE_SET)?;
    let gene_sets = stored::<GeneSetSettings>(store, keys::GENE_SET_SETTINGS)?;
    let figure = store.get::<FigureSettings>(keys::FIGURE_SETTINGS)?;
    let registry = store.get::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)?;
    let settings = EffectiveSettings::for_gene_sets(figure, gene_sets);
    let reference = settings.reference.clone()?;
    Some(ExplorerInputs {
        dataset,
        settings,
        registry,
        reference,
    })
}

fn text_column(profile: &ViewerProfile, table: &Table) -> Option<String> {
    table
        .has_column(profile.term_column)
        .then(|| profile.term_column.to_string())
}

/// Every term of the selected cell type, coloured by subset.
pub fn view_subsets(
    store: &SessionStore,
    renderer: &dyn Renderer,
    profile: &ViewerProfile,
) -> Result<Option<ViewOutput>, TableError> {
    let Some(inputs) = explorer_inputs(store) else {
        return Ok(None);
    };
    let labels = inputs
        .registry
        .classify(&inputs.dataset.table, &inputs.reference)?;
    let label = label_column(&inputs.dataset.table);
    let table = inputs
        .dataset
        .table
        .clone()
        .with_column(&label, labels.into_iter().map(Cell::Text).collect())?;

    let settings = &inputs.settings;
    let request = RenderRequest {
        chart: ChartKind::Scatter,
        table: &table,
        encoding: Encoding {
            x: settings.x.clone(),
            y: settings.y.clone(),
            hue: Some(label),
            style: settings.style_column.clone(),
            size: settings.size_column.clone(),
            facet: None,
            text: text_column(profile, &table),
        },
        title: inputs.dataset.celltype.clone(),
        style: &settings.style,
    };
    let figure = renderer.render(settings.backend(), &request)?;
    Ok(Some(ViewOutput {
        name: inputs.dataset.figure_name("subsets"),
        figure,
        table,
        show_table: false,
    }))
}

/// Subset prevalence among all terms against prevalence among topmost terms.
pub fn view_histogram(
    store: &SessionStore,
    renderer: &dyn Renderer,
    normalize: bool,
) -> Result<Option<ViewOutput>, TableError> {
    let Some(inputs) = explorer_inputs(store) else {
        return Ok(None);
    };
    let Some(thresholds) = stored::<Thresholds>(store, keys::TOPMOST_THRESHOLDS) else {
        return Ok(None);
    };
    let settings = &inputs.settings;
    let table = &inputs.dataset.table;
    let registry = inputs.registry;

    let topmost = registry.filter_and_rank(
        table,
        &inputs.reference,
        &RankQuery {
            x: &settings.x,
            y: &settings.y,
            x_threshold: thresholds.x,
            y_threshold: thresholds.y,
            per_label_limit: 0,
            global_limit: None,
        },
    )?;
    let all = registry.count_by_label(table, &inputs.reference, normalize)?;
    let top = registry.count_by_label(&topmost, &inputs.reference, normalize)?;

    let value_column = if normalize { "Fraction" } else { "Count" };
    let mut counts = Table::new(vec![
        LABEL_COLUMN.to_string(),
        "Scale".to_string(),
        value_column.to_string(),
    ]);
    let mut labels: Vec<&str> = all.iter().map(|t| t.label.as_str()).collect();
    for tally in &top {
        if !labels.contains(&tally.label.as_str()) {
            labels.push(&tally.label);
        }
    }
    for (scale, tallies) in [(SCALE_ALL, &all), (SCALE_TOPMOST, &top)] {
        for label in &labels {
            let value = tallies
                .iter()
                .find(|t| t.label == *label)
                .map(|t| t.value)
                .unwrap_or(0.0);
            counts.push_row(vec![
                Cell::Text(label.to_string()),
                Cell::Text(scale.to_string()),
                Cell::Number(value),
            ])?;
        }
    }

    let mut style = settings.style.clone();
    style.xlabel = LABEL_COLUMN.to_string();
    style.ylabel = value_column.to_string();
    let request = RenderRequest {
        chart: ChartKind::GroupedBars,
        table: &counts,
        encoding: Encoding {
            x: LABEL_COLUMN.to_string(),
            y: value_column.to_string(),
            hue: Some("Scale".to_string()),
            ..Encoding::default()
        },
        title: "Term Counts per Subset".to_string(),
        style: &style,
    };
    let figure = renderer.render(settings.backend(), &request)?;
    Ok(Some(ViewOutput {
        name: inputs.dataset.figure_name("fractions"),
        figure,
        table: counts,
        show_table: false,
    }))
}

/// Topmost terms: per-subset top-N when a per-subset count is set, otherwise
/// every term above both thresholds.
pub fn view_gene_sets(
    store: &SessionStore,
    renderer: &dyn Renderer,
    profile: &ViewerProfile,
    show_table: bool,
) -> Result<Option<ViewOutput>, TableError> {
    let Some(inputs) = explorer_inputs(store) else {
        return Ok(None);
    };
    let Some(thresholds) = stored::<Thresholds>(store, keys::TOPMOST_THRESHOLDS) else {
        return Ok(None);
    };
    let settings = &inputs.settings;
    let ranked = inputs.registry.filter_and_rank(
        &inputs.dataset.table,
        &inputs.reference,
        &RankQuery {
            x: &settings.x,
            y: &settings.y,
            x_threshold: thresholds.x,
            y_threshold: thresholds.y,
            per_label_limit: thresholds.per_subset,
            global_limit: None,
        },
    )?;

    let request = RenderRequest {
        chart: ChartKind::Dots,
        table: &ranked,
        encoding: Encoding {
            x: settings.x.clone(),
            y: profile.term_column.to_string(),
            hue: Some(label_column(&inputs.dataset.table)),
            style: None,
            size: Some(settings.y.clone()),
            facet: None,
            text: text_column(profile, &ranked),
        },
        title: "Topmost enriched Terms".to_string(),
        style: &settings.style,
    };
    let figure = renderer.render(settings.backend(), &request)?;
    Ok(Some(ViewOutput {
        name: inputs.dataset.figure_name("topmost"),
        figure,
        table: ranked,
        show_table,
    }))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/explorer.rs"]
mod tests;
