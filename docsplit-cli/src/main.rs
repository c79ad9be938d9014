//! `docsplit`: chunk every document in a directory into one output file.
//!
//! Settings are resolved in three layers: built-in defaults, then an optional
//! TOML settings file (`--config`), then command-line flags.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use docsplit::{
    BatchPipeline, BatchResult, CancellationToken, DiscoveryOptions, DocsplitConfig, FileExtractor,
    OutputFormat, discover_documents, write_batch,
};

/// Split a directory of documents into overlapping text chunks.
#[derive(Parser, Debug)]
#[command(name = "docsplit", version, about)]
struct Cli {
    /// Directory containing the documents to process.
    dir: PathBuf,

    /// File the chunks are written to.
    #[arg(short, long, default_value = "chunks_output.txt")]
    output: PathBuf,

    /// Maximum chunk length in characters.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters repeated between consecutive chunks.
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Documents processed concurrently (defaults to the CPU count).
    #[arg(long)]
    max_workers: Option<usize>,

    /// Comma-separated file extensions to pick up, e.g. `pdf,txt`.
    #[arg(long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,

    /// Output encoding.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// TOML settings file. Flags given on the command line take precedence.
    #[arg(long, env = "DOCSPLIT_CONFIG")]
    config: Option<PathBuf>,

    /// Group output chunks by document instead of completion order.
    #[arg(long)]
    sorted: bool,

    /// Log per-document progress at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Text,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

impl Cli {
    /// Layer the command-line flags over the settings file (or the defaults).
    fn settings(&self) -> anyhow::Result<DocsplitConfig> {
        let mut settings = match &self.config {
            Some(path) => DocsplitConfig::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => DocsplitConfig::default(),
        };

        if let Some(size) = self.chunk_size {
            settings.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            settings.chunking.chunk_overlap = overlap;
        }
        if self.max_workers.is_some() {
            settings.max_workers = self.max_workers;
        }
        if !self.extensions.is_empty() {
            settings.extensions = self.extensions.clone();
        }
        if self.recursive {
            settings.recursive = true;
        }
        if let Some(format) = self.format {
            settings.format = format.into();
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Discover, chunk, and write one batch. Per-document failures are part of
/// the returned result, not errors.
async fn run(cli: &Cli, token: CancellationToken) -> anyhow::Result<BatchResult> {
    let settings = cli.settings()?;
    let options =
        DiscoveryOptions { extensions: settings.extensions.clone(), recursive: settings.recursive };
    let sources = discover_documents(&cli.dir, &options)?;

    let result = if sources.is_empty() {
        info!(dir = %cli.dir.display(), extensions = ?options.extensions, "no documents found");
        BatchResult::new()
    } else {
        info!(count = sources.len(), dir = %cli.dir.display(), "found documents to process");
        let pipeline = BatchPipeline::builder()
            .config(settings.chunking.clone())
            .max_workers(settings.effective_max_workers())
            .extractor(Arc::new(FileExtractor))
            .build()?;
        pipeline.run_with_cancellation(sources, token).await
    };

    let result = if cli.sorted { result.sorted() } else { result };
    write_batch(&cli.output, &result, settings.format)?;
    Ok(result)
}

fn print_summary(cli: &Cli, result: &BatchResult) {
    println!("Total chunks generated: {}", result.chunks.len());
    if !result.failures.is_empty() {
        println!("{} document(s) failed:", result.failures.len());
        for failure in &result.failures {
            println!("  {}: {}", failure.document_id, failure.error);
        }
    }
    if !result.cancelled.is_empty() {
        println!("{} document(s) cancelled before completion", result.cancelled.len());
    }
    println!("Chunks written to {}", cli.output.display());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling batch");
            on_interrupt.cancel();
        }
    });

    let result = run(&cli, token).await?;
    print_summary(&cli, &result);
    Ok(())
}
