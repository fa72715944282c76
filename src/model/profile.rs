#[derive(Debug, Clone)]
pub struct ViewerProfile {
    pub term_column: &'static str,
    pub celltype_column: &'static str,
    pub score_column: &'static str,
    pub significance_column: &'static str,
    pub ecotype_column: &'static str,

    pub threshold_fraction: f64,
    pub threshold_step: f64,
    pub per_subset_max: i64,
    pub auto_drop_max: i64,
    pub topmost_default: i64,
    pub topmost_min: i64,
    pub topmost_max: i64,

    pub xlabel: &'static str,
    pub ylabel: &'static str,
    pub padding: f64,
    pub padding_range: (f64, f64),
    pub padding_step: f64,
    pub figsize: (i64, i64),
    pub width_range: (i64, i64),
    pub height_range: (i64, i64),
    pub despine: bool,
    pub palette: &'static str,
}

impl ViewerProfile {
    pub fn default_v1() -> Self {
        Self {
            term_column: "Term",
            celltype_column: "CellType",
            score_column: "log2_score",
            significance_column: "log10_qval",
            ecotype_column: "EcoType",

            threshold_fraction: 0.65,
            threshold_step: 0.01,
            per_subset_max: 50,
            auto_drop_max: 50,
            topmost_default: 5,
            topmost_min: 1,
            topmost_max: 50,

            xlabel: "log2(score)",
            ylabel: "-log10(qval)",
            padding: 3.0,
            padding_range: (0.0, 10.0),
            padding_step: 0.1,
            figsize: (10, 4),
            width_range: (5, 30),
            height_range: (2, 30),
            despine: true,
            palette: "colorblind",
        }
    }
}

impl Default for ViewerProfile {
    fn default() -> Self {
        Self::default_v1()
    }
}
