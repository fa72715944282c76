use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub mod document;

use crate::model::settings::{Backend, FigureStyle};
use crate::model::table::{Table, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    GroupedBars,
    Dots,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    pub x: String,
    pub y: String,
    pub hue: Option<String>,
    pub style: Option<String>,
    pub size: Option<String>,
    pub facet: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub chart: ChartKind,
    pub table: &'a Table,
    pub encoding: Encoding,
    pub title: String,
    pub style: &'a FigureStyle,
}

/// The plotting backend: a pure function from table and styling to a figure.
pub trait Renderer {
    fn render(&self, backend: Backend, request: &RenderRequest<'_>) -> Result<Figure, TableError>;
}

/// Opaque figure handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    backend: Backend,
    spec: Value,
}

const BLOB_FORMAT: &str = "ecotype-viewer-figure";
const BLOB_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct FigureBlob {
    format: String,
    version: u32,
    backend: Backend,
    spec: Value,
}

impl Figure {
    pub fn new(backend: Backend, spec: Value) -> Self {
        Self { backend, spec }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn spec(&self) -> &Value {
        &self.spec
    }

    /// Self-contained interactive document; only the interactive backend has one.
    pub fn to_document(&self) -> Option<String> {
        if !self.backend.supports_document() {
            return None;
        }
        Some(document::render_document(&self.spec))
    }

    /// Portable, re-loadable form tagged with the backend.
    pub fn to_blob(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&FigureBlob {
            format: BLOB_FORMAT.to_string(),
            version: BLOB_VERSION,
            backend: self.backend,
            spec: self.spec.clone(),
        })
    }

    pub fn from_blob(bytes: &[u8]) -> Result<Figure, serde_json::Error> {
        let blob: FigureBlob = serde_json::from_slice(bytes)?;
        Ok(Figure {
            backend: blob.backend,
            spec: blob.spec,
        })
    }
}

/// Emits a declarative figure description: one series per hue value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecRenderer;

impl Renderer for SpecRenderer {
    fn render(&self, backend: Backend, request: &RenderRequest<'_>) -> Result<Figure, TableError> {
        let table = request.table;
        let enc = &request.encoding;
        let x = table.column_index(&enc.x)?;
        let y = table.column_index(&enc.y)?;
        let optional = |name: &Option<String>| -> Result<Option<usize>, TableError> {
            name.as_deref().map(|n| table.column_index(n)).transpose()
        };
        let hue = optional(&enc.hue)?;
        let style = optional(&enc.style)?;
        let size = optional(&enc.size)?;
        let facet = optional(&enc.facet)?;
        let text = optional(&enc.text)?;

        let mut series: indexmap::IndexMap<String, Vec<Value>> = indexmap::IndexMap::new();
        for row in 0..table.n_rows() {
            let name = match hue {
                Some(h) => table.cell(row, h).to_string(),
                None => "all".to_string(),
            };
            let mut point = Map::new();
            point.insert("x".into(), json!(table.cell(row, x)));
            point.insert("y".into(), json!(table.cell(row, y)));
            for (key, idx) in [("style", style), ("size", size), ("facet", facet), ("text", text)] {
                if let Some(i) = idx {
                    point.insert(key.into(), json!(table.cell(row, i)));
                }
            }
            series.entry(name).or_default().push(Value::Object(point));
        }

        let style_spec = request.style;
        let mut layout = Map::new();
        layout.insert("padding".into(), json!(style_spec.padding));
        if backend == Backend::Static {
            layout.insert("figsize".into(), json!(style_spec.figsize));
            layout.insert("despine".into(), json!(style_spec.despine));
            layout.insert("palette".into(), json!(style_spec.palette));
        }

        let spec = json!({
            "chart": request.chart,
            "title": request.title,
            "x": { "field": enc.x, "label": style_spec.xlabel },
            "y": { "field": enc.y, "label": style_spec.ylabel },
            "encoding": {
                "hue": enc.hue,
                "style": enc.style,
                "size": enc.size,
                "facet": enc.facet,
            },
            "series": series
                .into_iter()
                .map(|(name, points)| json!({ "name": name, "points": points }))
                .collect::<Vec<_>>(),
            "layout": layout,
        });
        Ok(Figure::new(backend, spec))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/render/tests.rs"]
mod tests;
