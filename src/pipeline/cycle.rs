use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::input::{CollectionDecoder, InputError};
use crate::model::page::{Page, next_page};
use crate::model::profile::ViewerProfile;
use crate::model::settings::WhichViews;
use crate::model::subsets::SubsetRegistry;
use crate::model::table::TableError;
use crate::pipeline::explorer::{self, content_digest};
use crate::pipeline::{ViewOutput, controls, summary};
use crate::render::Renderer;
use crate::session::{InteractionSurface, SessionStore, Upload, bind, bind_fn, keys};

#[derive(Debug, Clone)]
pub struct CycleOutput {
    pub page: Page,
    pub views: Vec<ViewOutput>,
    /// User-visible notices: failed uploads, rejected subset files, dropped subsets.
    pub messages: Vec<String>,
    /// Registry as shown on the explore page, after this cycle's edits.
    pub subsets: Option<IndexMap<String, Vec<String>>>,
}

impl CycleOutput {
    fn new(page: Page) -> Self {
        Self {
            page,
            views: Vec::new(),
            messages: Vec::new(),
            subsets: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CollectionSource {
    name: String,
    digest: u64,
}

/// One interactive session: the store plus the collaborators every cycle uses.
pub struct Session<D, R> {
    store: SessionStore,
    decoder: D,
    renderer: R,
    profile: ViewerProfile,
}

impl<D: CollectionDecoder, R: Renderer> Session<D, R> {
    pub fn new(decoder: D, renderer: R, profile: ViewerProfile) -> Self {
        let mut store = SessionStore::new();
        store.set(keys::HIGHLIGHT_SUBSETS, SubsetRegistry::new());
        Self {
            store,
            decoder,
            renderer,
            profile,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn registry(&self) -> Option<&SubsetRegistry> {
        self.store.get::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
    }

    pub fn import_subsets(&mut self, payload: IndexMap<String, Vec<String>>) {
        if let Some(registry) = self.store.get_mut::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS) {
            registry.merge(payload);
        }
    }

    /// Recomputes everything for one interaction. Producers run before any
    /// view reads their keys.
    pub fn run_cycle(
        &mut self,
        surface: &mut dyn InteractionSurface,
    ) -> Result<CycleOutput, TableError> {
        let upload = bind(keys::DATAFILE, controls::upload).call(surface, &mut self.store, &self.profile);
        let summary_pressed = bind(keys::INSPECT_SUMMARY, controls::inspect_summary)
            .call(surface, &mut self.store, &self.profile);
        let explore_pressed = bind(keys::EXPLORE_GENE_SETS, controls::explore_gene_sets)
            .call(surface, &mut self.store, &self.profile);

        let mut out = CycleOutput::new(Page::Welcome);
        match upload {
            Some(upload) => {
                if let Err(err) = self.load_collection(&upload) {
                    error!(source = %upload.name, %err, "collection upload failed");
                    out.messages
                        .push(format!("Could not load {}: {err}", upload.name));
                }
            }
            None => {
                self.store.remove(keys::COLLECTION);
                self.store.remove(keys::COLLECTION_SOURCE);
            }
        }

        if !self.store.contains(keys::COLLECTION) {
            self.store.set(keys::PAGE, Page::Welcome);
            debug!("no collection loaded; showing welcome");
            return Ok(out);
        }

        let current = self
            .store
            .get::<Page>(keys::PAGE)
            .copied()
            .unwrap_or(Page::Welcome);
        let page = next_page(current, summary_pressed, explore_pressed);
        if page != current {
            info!(from = ?current, to = ?page, "page changed");
        }
        self.store.set(keys::PAGE, page);
        out.page = page;

        match page {
            Page::Summary => self.summary_page(surface, &mut out)?,
            Page::Explore => self.explorer_page(surface, &mut out)?,
            Page::Welcome => {}
        }
        Ok(out)
    }

    /// Decodes a new upload. Re-uploading the same content is a no-op; a
    /// failed upload is remembered so it is reported once.
    fn load_collection(&mut self, upload: &Upload) -> Result<(), InputError> {
        let source = CollectionSource {
            name: upload.name.clone(),
            digest: content_digest(&upload.bytes),
        };
        if self.store.get::<CollectionSource>(keys::COLLECTION_SOURCE) == Some(&source) {
            return Ok(());
        }
        self.store.set(keys::COLLECTION_SOURCE, source);
        self.store.remove(keys::COLLECTION);
        let collection = self.decoder.decode(upload)?;
        self.store.set(keys::COLLECTION, collection);
        Ok(())
    }

    fn summary_page(
        &mut self,
        surface: &mut dyn InteractionSurface,
        out: &mut CycleOutput,
    ) -> Result<(), TableError> {
        let store = &mut self.store;
        let profile = &self.profile;
        bind(keys::FIGURE_SETTINGS, controls::scatter_figure_controls).call(surface, store, profile);
        bind(keys::ECOTYPE_SUMMARY_SETTINGS, summary::figure_settings).call(surface, store, profile);

        if let Some(view) = summary::view_scatterplots(store, &self.renderer, profile)? {
            out.views.push(view);
        }

        bind(keys::SUMMARY_ECOTYPE, summary::summary_ecotype).call(surface, store, profile);
        bind_fn(summary::view_n_topmost).call(surface, store, profile);
        if let Some(view) = summary::view_gene_sets(store, &self.renderer, profile)? {
            out.views.push(view);
        }
        Ok(())
    }

    fn explorer_page(
        &mut self,
        surface: &mut dyn InteractionSurface,
        out: &mut CycleOutput,
    ) -> Result<(), TableError> {
        let store = &mut self.store;
        let profile = &self.profile;

        bind(keys::GENE_SET, explorer::select_dataset).try_call(surface, store, profile)?;
        bind(keys::FIGURE_SETTINGS, controls::scatter_figure_controls).call(surface, store, profile);
        bind(keys::GENE_SET_SETTINGS, explorer::figure_settings).call(surface, store, profile);
        let which: WhichViews =
            bind(keys::WHICH_SUBSETS, explorer::show_subset_figures).call(surface, store, profile);

        out.messages.extend(explorer::upload_subsets(surface, store));
        explorer::edit_subsets(surface, store);
        bind_fn(explorer::topmost_thresholds).try_call(surface, store, profile)?;
        let dropped = explorer::auto_drop_subsets(surface, store, profile)?;
        if !dropped.is_empty() {
            out.messages
                .push(format!("Dropped subsets: {}", dropped.join(", ")));
        }

        let renderer = &self.renderer;
        if which.scatter {
            if let Some(view) = explorer::view_subsets(store, renderer, profile)? {
                out.views.push(view);
            }
        }
        if which.counts {
            if let Some(view) = explorer::view_histogram(store, renderer, which.normalize_counts)? {
                out.views.push(view);
            }
        }
        if which.topmost {
            if let Some(view) =
                explorer::view_gene_sets(store, renderer, profile, which.topmost_table)?
            {
                out.views.push(view);
            }
        }

        out.subsets = store
            .get::<SubsetRegistry>(keys::HIGHLIGHT_SUBSETS)
            .map(SubsetRegistry::to_map);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/cycle.rs"]
mod tests;
