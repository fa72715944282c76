pub mod binder;
pub mod store;
pub mod surface;

pub use binder::{BindCtx, bind, bind_fn};
pub use store::SessionStore;
pub use surface::{CycleInput, InteractionSurface, ScriptedSurface, Upload};

/// Stable store keys.
pub mod keys {
    pub const DATAFILE: &str = "datafile";
    pub const COLLECTION: &str = "collection";
    pub const COLLECTION_SOURCE: &str = "collection_source";
    pub const INSPECT_SUMMARY: &str = "inspect_summary";
    pub const EXPLORE_GENE_SETS: &str = "explore_gene_sets";
    pub const PAGE: &str = "page";
    pub const FIGURE_SETTINGS: &str = "figure_settings";
    pub const ECOTYPE_SUMMARY_SETTINGS: &str = "ecotype_summary_settings";
    pub const SUMMARY_ECOTYPE: &str = "summary_ecotype";
    pub const GENE_SET: &str = "gene_set";
    pub const GENE_SET_SETTINGS: &str = "gene_set_settings";
    pub const WHICH_SUBSETS: &str = "which_subsets";
    pub const TOPMOST_THRESHOLDS: &str = "topmost_thresholds";
    pub const VIEW_N_TOPMOST: &str = "view_n_topmost";
    pub const HIGHLIGHT_SUBSETS: &str = "highlight_subsets";
    pub const SUBSET_IMPORT_DIGEST: &str = "subset_import_digest";
}
