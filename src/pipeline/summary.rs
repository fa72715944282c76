use std::collections::BTreeMap;

use crate::model::collection::Collection;
use crate::model::profile::ViewerProfile;
use crate::model::settings::{EffectiveSettings, FigureSettings, SummarySettings};
use crate::model::subsets::rank_rows;
use crate::model::table::{Table, TableError};
use crate::pipeline::{
    ViewOutput, optional_choice, optional_options, ordered_options, stored, widgets,
};
use crate::render::{ChartKind, Encoding, RenderRequest, Renderer};
use crate::session::{BindCtx, SessionStore, keys};

pub fn figure_settings(ctx: &mut BindCtx<'_>) -> Option<SummarySettings> {
    let collection = ctx.store.get::<Collection>(keys::COLLECTION)?;
    let columns = collection.columns();
    let numeric = collection.numeric_columns();
    let profile = ctx.profile;

    let x = ctx
        .surface
        .select(widgets::SUMMARY_X, &ordered_options(&numeric, profile.score_column))?;
    let y = ctx.surface.select(
        widgets::SUMMARY_Y,
        &ordered_options(&numeric, profile.significance_column),
    )?;
    let hue = ctx.surface.select(
        widgets::SUMMARY_HUE,
        &ordered_options(&columns, profile.celltype_column),
    )?;
    let optional = optional_options(&columns);
    let style = optional_choice(ctx.surface.select(widgets::SUMMARY_STYLE, &optional));
    let size = optional_choice(ctx.surface.select(widgets::SUMMARY_SIZE, &optional));

    Some(SummarySettings {
        x,
        y,
        hue,
        style,
        size,
    })
}

pub fn view_n_topmost(ctx: &mut BindCtx<'_>) -> i64 {
    let profile = ctx.profile;
    ctx.surface.number(
        widgets::TOPMOST_N,
        profile.topmost_min,
        profile.topmost_max,
        profile.topmost_default,
    )
}

pub fn summary_ecotype(ctx: &mut BindCtx<'_>) -> Option<String> {
    let collection = ctx.store.get::<Collection>(keys::COLLECTION)?;
    let ecotypes = collection.populated_ecotypes(ctx.profile.celltype_column);
    ctx.surface.select(widgets::SUMMARY_ECOTYPE, &ecotypes)
}

fn summary_inputs(store: &SessionStore) -> Option<(&Collection, EffectiveSettings)> {
    let collection = store.get::<Collection>(keys::COLLECTION)?;
    let figure = store.get::<FigureSettings>(keys::FIGURE_SETTINGS)?;
    let summary = stored::<SummarySettings>(store, keys::ECOTYPE_SUMMARY_SETTINGS)?;
    Some((collection, EffectiveSettings::for_summary(figure, summary)))
}

/// All terms of all ecotypes, one panel per ecotype.
pub fn view_scatterplots(
    store: &SessionStore,
    renderer: &dyn Renderer,
    profile: &ViewerProfile,
) -> Result<Option<ViewOutput>, TableError> {
    let Some((collection, settings)) = summary_inputs(store) else {
        return Ok(None);
    };
    let table = collection.stacked(profile.ecotype_column)?;
    let request = RenderRequest {
        chart: ChartKind::Scatter,
        table: &table,
        encoding: Encoding {
            x: settings.x.clone(),
            y: settings.y.clone(),
            hue: settings.hue.clone(),
            style: settings.style_column.clone(),
            size: settings.size_column.clone(),
            facet: Some(profile.ecotype_column.to_string()),
            text: table
                .has_column(profile.term_column)
                .then(|| profile.term_column.to_string()),
        },
        title: "EcoType summary".to_string(),
        style: &settings.style,
    };
    let figure = renderer.render(settings.backend(), &request)?;
    Ok(Some(ViewOutput {
        name: "ecotypes_summary".to_string(),
        figure,
        table,
        show_table: false,
    }))
}

/// The `n` best terms of each hue group (ranked by y, then x), groups in
/// sorted order.
pub fn topmost_per_group(
    table: &Table,
    group_column: &str,
    x: &str,
    y: &str,
    n: usize,
) -> Result<Table, TableError> {
    let groups_of_rows = table.string_column(group_column)?;
    let xs = table.numeric_column(x)?;
    let ys = table.numeric_column(y)?;

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, group) in groups_of_rows.iter().enumerate() {
        groups.entry(group.as_str()).or_default().push(row);
    }
    let mut keep = Vec::new();
    for (_, mut rows) in groups {
        rank_rows(&mut rows, &xs, &ys);
        rows.truncate(n);
        keep.extend(rows);
    }
    Ok(table.select_rows(&keep))
}

/// Topmost terms of each cell type within the chosen ecotype.
pub fn view_gene_sets(
    store: &SessionStore,
    renderer: &dyn Renderer,
    profile: &ViewerProfile,
) -> Result<Option<ViewOutput>, TableError> {
    let Some((collection, settings)) = summary_inputs(store) else {
        return Ok(None);
    };
    let Some(ecotype) = stored::<String>(store, keys::SUMMARY_ECOTYPE) else {
        return Ok(None);
    };
    let Some(n) = store.get::<i64>(keys::VIEW_N_TOPMOST).copied() else {
        return Ok(None);
    };
    let Some(table) = collection.get(ecotype) else {
        return Ok(None);
    };
    let hue = settings
        .hue
        .clone()
        .unwrap_or_else(|| profile.celltype_column.to_string());
    if [&hue, &settings.x, &settings.y]
        .iter()
        .any(|column| !table.has_column(column))
    {
        return Ok(None);
    }
    let top = topmost_per_group(table, &hue, &settings.x, &settings.y, n.max(0) as usize)?;

    let request = RenderRequest {
        chart: ChartKind::Dots,
        table: &top,
        encoding: Encoding {
            x: settings.x.clone(),
            y: profile.term_column.to_string(),
            hue: Some(hue),
            style: None,
            size: Some(settings.y.clone()),
            facet: None,
            text: Some(profile.term_column.to_string()),
        },
        title: format!("Topmost enriched gene sets for each cell type in {ecotype}"),
        style: &settings.style,
    };
    let figure = renderer.render(settings.backend(), &request)?;
    Ok(Some(ViewOutput {
        name: "ecotype_topmost_gene_sets".to_string(),
        figure,
        table: top,
        show_table: false,
    }))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/summary.rs"]
mod tests;
