use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::input::patterns::render_subset_file;
use crate::model::page::Page;
use crate::model::table::Table;
use crate::pipeline::ViewOutput;
use crate::pipeline::cycle::CycleOutput;
use crate::render::Figure;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tsv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("subset export failed: {0}")]
    Subsets(String),
}

#[derive(Debug, Serialize)]
struct CycleManifest<'a> {
    cycle: usize,
    page: &'static str,
    messages: &'a [String],
    views: Vec<ViewManifest>,
}

#[derive(Debug, Serialize)]
struct ViewManifest {
    name: String,
    title: Option<String>,
    backend: &'static str,
    rows: usize,
    files: Vec<String>,
}

pub fn page_name(page: Page) -> &'static str {
    match page {
        Page::Welcome => "welcome",
        Page::Summary => "summary",
        Page::Explore => "explore",
    }
}

/// Tab-separated, header row, no index column.
pub fn write_table_tsv(table: &Table, path: &Path) -> Result<(), ExportError> {
    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(File::create(path)?));
    w.write_record(table.columns())?;
    for row in table.rows() {
        w.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    w.flush()?;
    Ok(())
}

/// Writes `<name>.html` when the backend has a document form, and always the
/// tagged `<name>.<backend>.json` blob. Returns the file names written.
pub fn write_figure(figure: &Figure, dir: &Path, name: &str) -> Result<Vec<String>, ExportError> {
    let mut written = Vec::with_capacity(2);
    if let Some(document) = figure.to_document() {
        let file = format!("{name}.html");
        write_text(&dir.join(&file), &document)?;
        written.push(file);
    }
    let file = format!("{name}.{}.json", figure.backend().name());
    let mut w = BufWriter::new(File::create(dir.join(&file))?);
    w.write_all(&figure.to_blob()?)?;
    w.flush()?;
    written.push(file);
    Ok(written)
}

pub fn cycle_dir(out_dir: &Path, index: usize) -> PathBuf {
    out_dir.join(format!("cycle_{index:03}"))
}

pub fn write_cycle(out_dir: &Path, index: usize, output: &CycleOutput) -> Result<PathBuf, ExportError> {
    let dir = cycle_dir(out_dir, index);
    fs::create_dir_all(&dir)?;

    let mut views = Vec::with_capacity(output.views.len());
    for view in &output.views {
        views.push(write_view(&dir, view)?);
    }

    if let Some(subsets) = &output.subsets {
        let text = render_subset_file(subsets).map_err(|e| ExportError::Subsets(e.to_string()))?;
        write_text(&dir.join("subsets.json"), &text)?;
    }

    let manifest = CycleManifest {
        cycle: index,
        page: page_name(output.page),
        messages: &output.messages,
        views,
    };
    write_text(
        &dir.join("cycle.json"),
        &serde_json::to_string_pretty(&manifest)?,
    )?;
    Ok(dir)
}

fn write_view(dir: &Path, view: &ViewOutput) -> Result<ViewManifest, ExportError> {
    let name = sanitize_file_name(&view.name);
    let mut files = write_figure(&view.figure, dir, &name)?;
    if view.show_table {
        let file = format!("{name}.tsv");
        write_table_tsv(&view.table, &dir.join(&file))?;
        files.push(file);
    }
    Ok(ViewManifest {
        name: view.name.clone(),
        title: view.figure.spec()["title"].as_str().map(str::to_string),
        backend: view.figure.backend().name(),
        rows: view.table.n_rows(),
        files,
    })
}

/// Keeps ASCII alphanumerics and `._-`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "view".to_string()
    } else {
        trimmed.to_string()
    }
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
