//! navlayer command-line tool
//!
//! Usage:
//!   navlayer export triage.json hunt.json -o triage.sheet.json hunt.txt --bundle enterprise-attack.json
//!
//! Every layer is exported on the blocking pool; all of them share one
//! cached framework matrix.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use navlayer_export::{ExportConfig, Exporter, OutputFormat, SubtechniqueDisplay};
use navlayer_matrix::{FrameworkSource, MatrixCache, MemoryStore};
use navlayer_model::{Domain, Layer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "navlayer", version)]
#[command(about = "Export annotation layers as styled threat-framework matrices")]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export layers to sheet files
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Layer files to export
    #[arg(required = true)]
    layers: Vec<PathBuf>,

    /// Output files, one per layer, in the same order
    #[arg(short, long, num_args = 1.., required = true)]
    output: Vec<PathBuf>,

    /// Local STIX bundle with the framework data
    #[arg(short, long)]
    bundle: PathBuf,

    /// Output format (json or text); defaults to the output file extension
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Export configuration file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refuse layers that are not for this domain
    #[arg(long)]
    domain: Option<Domain>,

    /// Load layers leniently, dropping invalid parts with a warning
    #[arg(long)]
    lenient: bool,

    /// Show every sub-technique group
    #[arg(long, conflicts_with = "no_subtechniques")]
    all_subtechniques: bool,

    /// Never show sub-techniques
    #[arg(long)]
    no_subtechniques: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Export(args) => run_export(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Everything one export task needs, owned
#[derive(Clone)]
struct Job {
    source: Arc<dyn FrameworkSource>,
    cache: MatrixCache,
    config: ExportConfig,
    domain: Option<Domain>,
    format: Option<OutputFormat>,
    total: usize,
}

async fn run_export(args: ExportArgs) -> Result<()> {
    if args.layers.len() != args.output.len() {
        bail!(
            "mismatched number of output paths ({}) to layer paths ({})",
            args.output.len(),
            args.layers.len()
        );
    }

    let mut config = match &args.config {
        Some(path) => ExportConfig::from_file(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?,
        None => ExportConfig::default(),
    };
    if args.lenient {
        config = config.with_lenient(true);
    }
    if args.all_subtechniques {
        config = config.with_subtechniques(SubtechniqueDisplay::All);
    } else if args.no_subtechniques {
        config = config.with_subtechniques(SubtechniqueDisplay::None);
    }

    let store = MemoryStore::from_file(&args.bundle)
        .with_context(|| format!("failed to read framework bundle {}", args.bundle.display()))?;
    info!(objects = store.len(), "framework bundle loaded");

    let job = Job {
        source: Arc::new(store),
        cache: MatrixCache::default(),
        config,
        domain: args.domain,
        format: args.format,
        total: args.layers.len(),
    };

    let tasks = args
        .layers
        .into_iter()
        .zip(args.output)
        .enumerate()
        .map(|(index, (layer, output))| {
            let job = job.clone();
            tokio::task::spawn_blocking(move || {
                let result = export_one(&job, index + 1, &layer, &output);
                (layer, result)
            })
        });

    let mut failed = 0usize;
    for joined in join_all(tasks).await {
        let (layer, result) = joined.context("export task panicked")?;
        if let Err(e) = result {
            failed += 1;
            error!(layer = %layer.display(), "unable to export, skipping: {e:#}");
        }
    }

    if failed > 0 {
        bail!("{failed} of {} layers failed to export", job.total);
    }
    Ok(())
}

fn export_one(job: &Job, position: usize, layer_path: &Path, output: &Path) -> Result<()> {
    info!("{position}/{} - beginning processing {}", job.total, layer_path.display());

    let format = match job.format.or_else(|| OutputFormat::from_path(output)) {
        Some(format) => format,
        None => bail!("cannot infer an output format from {}", output.display()),
    };

    let mut layer = Layer::new(job.config.load_mode());
    layer
        .load_file(layer_path)
        .with_context(|| format!("unable to load {}", layer_path.display()))?;
    let document = layer.take_document().context("layer has no document")?;

    let exporter = Exporter::new(job.domain.unwrap_or(document.domain()), Arc::clone(&job.source))
        .with_cache(job.cache.clone())
        .with_config(job.config.clone());
    let export = exporter.export(&document)?;
    format.renderer().write_file(&export.sheet, output)?;

    info!(
        warnings = export.warnings().count(),
        "{position}/{} - finished exporting {} to {}",
        job.total,
        layer_path.display(),
        output.display()
    );
    Ok(())
}
