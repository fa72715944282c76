use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Interactive,
    Static,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Interactive => "interactive",
            Backend::Static => "static",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "interactive" => Some(Backend::Interactive),
            "static" => Some(Backend::Static),
            _ => None,
        }
    }

    pub fn options() -> Vec<String> {
        vec!["interactive".to_string(), "static".to_string()]
    }

    /// Only the interactive backend can produce a self-contained document.
    pub fn supports_document(self) -> bool {
        self == Backend::Interactive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticStyle {
    pub figsize: (u32, u32),
    pub despine: bool,
    pub palette: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSettings {
    pub backend: Backend,
    pub xlabel: String,
    pub ylabel: String,
    pub padding: f64,
    pub static_style: Option<StaticStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneSetSettings {
    pub x: String,
    pub y: String,
    pub style: Option<String>,
    pub size: Option<String>,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySettings {
    pub x: String,
    pub y: String,
    pub hue: String,
    pub style: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub x: f64,
    pub y: f64,
    /// 0 selects global thresholding.
    pub per_subset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhichViews {
    pub scatter: bool,
    pub counts: bool,
    pub normalize_counts: bool,
    pub topmost: bool,
    pub topmost_table: bool,
}

/// Styling handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureStyle {
    pub backend: Backend,
    pub xlabel: String,
    pub ylabel: String,
    pub padding: f64,
    pub figsize: Option<(u32, u32)>,
    pub despine: bool,
    pub palette: Option<String>,
}

impl From<&FigureSettings> for FigureStyle {
    fn from(fig: &FigureSettings) -> Self {
        Self {
            backend: fig.backend,
            xlabel: fig.xlabel.clone(),
            ylabel: fig.ylabel.clone(),
            padding: fig.padding,
            figsize: fig.static_style.as_ref().map(|s| s.figsize),
            despine: fig.static_style.as_ref().is_some_and(|s| s.despine),
            palette: fig.static_style.as_ref().map(|s| s.palette.clone()),
        }
    }
}

/// The merged view of every settings key a view reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSettings {
    pub x: String,
    pub y: String,
    pub hue: Option<String>,
    pub style_column: Option<String>,
    pub size_column: Option<String>,
    pub reference: Option<String>,
    pub style: FigureStyle,
}

impl EffectiveSettings {
    pub fn for_gene_sets(fig: &FigureSettings, gene_sets: &GeneSetSettings) -> Self {
        Self {
            x: gene_sets.x.clone(),
            y: gene_sets.y.clone(),
            hue: None,
            style_column: gene_sets.style.clone(),
            size_column: gene_sets.size.clone(),
            reference: Some(gene_sets.reference.clone()),
            style: FigureStyle::from(fig),
        }
    }

    pub fn for_summary(fig: &FigureSettings, summary: &SummarySettings) -> Self {
        Self {
            x: summary.x.clone(),
            y: summary.y.clone(),
            hue: Some(summary.hue.clone()),
            style_column: summary.style.clone(),
            size_column: summary.size.clone(),
            reference: None,
            style: FigureStyle::from(fig),
        }
    }

    pub fn backend(&self) -> Backend {
        self.style.backend
    }
}
