//! Widget keys understood by the interaction surface.

pub const UPLOAD: &str = "upload";
pub const INSPECT_SUMMARY: &str = "inspect_summary";
pub const EXPLORE_GENE_SETS: &str = "explore_gene_sets";

pub const BACKEND: &str = "backend";
pub const XLABEL: &str = "xlabel";
pub const YLABEL: &str = "ylabel";
pub const PADDING: &str = "padding";
pub const FIG_WIDTH: &str = "figure_width";
pub const FIG_HEIGHT: &str = "figure_height";
pub const DESPINE: &str = "despine";
pub const PALETTE: &str = "palette";

pub const SUMMARY_X: &str = "summary_x";
pub const SUMMARY_Y: &str = "summary_y";
pub const SUMMARY_HUE: &str = "summary_hue";
pub const SUMMARY_STYLE: &str = "summary_style";
pub const SUMMARY_SIZE: &str = "summary_size";
pub const SUMMARY_ECOTYPE: &str = "summary_ecotype";
pub const TOPMOST_N: &str = "topmost_n";

pub const ECOTYPE: &str = "ecotype";
pub const CELLTYPE: &str = "celltype";
pub const REFERENCE: &str = "reference_column";
pub const X_COLUMN: &str = "x_column";
pub const Y_COLUMN: &str = "y_column";
pub const STYLE_COLUMN: &str = "style_column";
pub const SIZE_COLUMN: &str = "size_column";

pub const SHOW_SCATTER: &str = "show_scatter";
pub const SHOW_COUNTS: &str = "show_counts";
pub const NORMALIZE_COUNTS: &str = "normalize_counts";
pub const SHOW_TOPMOST: &str = "show_topmost";
pub const SHOW_TOPMOST_TABLE: &str = "show_topmost_table";

pub const SUBSET_FILE: &str = "subset_file";
pub const SUBSET_LABEL: &str = "subset";
pub const SUBSET_PATTERNS: &str = "subset_patterns";
pub const SUBSET_NEW_LABEL: &str = "subset_new_label";
pub const SAVE_SUBSET: &str = "save_subset";
pub const DROP_SUBSET: &str = "drop_subset";
pub const AUTO_DROP: &str = "auto_drop_min_terms";

pub const X_THRESHOLD: &str = "x_threshold";
pub const Y_THRESHOLD: &str = "y_threshold";
pub const PER_SUBSET: &str = "n_per_subset";

/// Select options standing for "no column".
pub const NO_COLUMN: &str = "None";
