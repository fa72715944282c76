mod input;
mod logging;
mod model;
mod pipeline;
mod render;
mod report;
mod session;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::patterns::parse_subset_file;
use crate::input::script::load_script;
use crate::input::{InputError, JsonCollectionDecoder, read_upload};
use crate::model::profile::ViewerProfile;
use crate::model::table::TableError;
use crate::pipeline::cycle::Session;
use crate::pipeline::widgets;
use crate::render::{Figure, SpecRenderer};
use crate::report::{ExportError, page_name, write_cycle};
use crate::session::ScriptedSurface;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("cycle {cycle}: {source}")]
    Cycle { cycle: usize, source: TableError },
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("{path}: {backend} figures have no document form")]
    NoDocument { path: PathBuf, backend: &'static str },
}

#[derive(Debug, Parser)]
#[command(name = "ecotype-viewer", version, about = "Replay an ecotype gene-set exploration session")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replays a session script against a collection and writes each cycle's views.
    Run(RunArgs),
    /// Rebuilds the interactive document of a figure written by `run`.
    Document(DocumentArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Enrichment collection (JSON, optionally gzip-compressed), attached to the upload widget.
    #[arg(long)]
    collection: Option<PathBuf>,
    /// Session script: a list of cycles, each mapping widget keys to values.
    #[arg(long)]
    script: PathBuf,
    #[arg(long)]
    out: PathBuf,
    /// Subset definitions imported before the first cycle.
    #[arg(long)]
    subsets: Option<PathBuf>,
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct DocumentArgs {
    /// Figure blob, `<view>.<backend>.json`.
    #[arg(long)]
    figure: PathBuf,
    #[arg(long)]
    out: PathBuf,
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Run(args) => {
            logging::init_logging(args.verbose);
            run(args)
        }
        Command::Document(args) => {
            logging::init_logging(args.verbose);
            document(args)
        }
    };
    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &RunArgs) -> Result<(), AppError> {
    let cycles = load_script(&args.script)?;
    let mut surface = ScriptedSurface::new();
    if let Some(path) = &args.collection {
        surface.attach_file(widgets::UPLOAD, read_upload(path)?);
    }

    let mut session = Session::new(
        JsonCollectionDecoder::default(),
        SpecRenderer,
        ViewerProfile::default_v1(),
    );
    if let Some(path) = &args.subsets {
        import_subsets_file(&mut session, path)?;
    }

    info!(cycles = cycles.len(), out = %args.out.display(), "replaying session");
    for (idx, cycle) in cycles.into_iter().enumerate() {
        surface.begin_cycle(cycle);
        let output = session
            .run_cycle(&mut surface)
            .map_err(|source| AppError::Cycle { cycle: idx, source })?;
        for message in &output.messages {
            warn!(cycle = idx, "{message}");
        }
        let dir = write_cycle(&args.out, idx, &output)?;
        info!(
            cycle = idx,
            page = page_name(output.page),
            views = output.views.len(),
            dir = %dir.display(),
            "cycle written"
        );
    }
    if let Some(registry) = session.registry() {
        info!(subsets = ?registry.labels(), "session finished");
    }
    debug!(keys = ?session.store().keys(), "session store");
    Ok(())
}

fn document(args: &DocumentArgs) -> Result<(), AppError> {
    let bytes = std::fs::read(&args.figure).map_err(InputError::from)?;
    let figure = Figure::from_blob(&bytes).map_err(ExportError::from)?;
    let Some(html) = figure.to_document() else {
        return Err(AppError::NoDocument {
            path: args.figure.clone(),
            backend: figure.backend().name(),
        });
    };
    std::fs::write(&args.out, html).map_err(ExportError::from)?;
    info!(figure = %args.figure.display(), out = %args.out.display(), "document written");
    Ok(())
}

fn import_subsets_file(
    session: &mut Session<JsonCollectionDecoder, SpecRenderer>,
    path: &Path,
) -> Result<(), AppError> {
    let bytes = std::fs::read(path).map_err(InputError::from)?;
    let payload = parse_subset_file(&bytes)?;
    info!(labels = payload.len(), path = %path.display(), "importing subsets");
    session.import_subsets(payload);
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
