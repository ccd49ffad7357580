//! Command-line interface for newsvoice.
//!
//! `newsvoice` with no subcommand performs one pipeline run, the same as
//! `newsvoice run`, so it can be dropped straight into a scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::adapters::{
    ExcerptSummarizer, FabricSummarizer, FeedSource, FsObjectStore, HttpSpeechClient,
    LedgerStore, ObjectStore, RssFeed, SpeechSynthesizer, SqliteLedger, Summarizer,
};
use crate::config::{self, ResolvedConfig, SummarizerBackend};
use crate::core::{
    AudioSynthesizer, CatalogBuilder, DedupLedger, NarrationComposer, Orchestrator,
};
use crate::domain::{CatalogOutcome, ItemStatus, RunReport};

/// newsvoice - narrate news feeds into a published audio catalog
#[derive(Parser, Debug)]
#[command(name = "newsvoice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to .newsvoice/config.yaml in this or a parent directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Narrate new feed items and republish the catalog (default)
    Run,

    /// Rebuild and republish the catalog from stored audio only
    Catalog,

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config(self.config.as_deref())?;

        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => run_pipeline(&cfg).await,
            Commands::Catalog => rebuild_catalog(&cfg).await,
            Commands::Config => show_config(&cfg),
        }
    }
}

/// Perform one run and print what happened to each item
async fn run_pipeline(cfg: &ResolvedConfig) -> Result<()> {
    let orchestrator = build_orchestrator(cfg).await?;
    let report = orchestrator.run_once().await?;

    print_report(&report);
    Ok(())
}

async fn rebuild_catalog(cfg: &ResolvedConfig) -> Result<()> {
    let (artifacts, manifest) = open_stores(cfg).await?;
    let builder = CatalogBuilder::new(artifacts, manifest, cfg.catalog_settings());

    let entries = builder.rebuild().await?;
    println!(
        "Published {} entries to {}",
        entries,
        builder.settings().manifest_key
    );
    Ok(())
}

/// Wire concrete adapters from configuration into an orchestrator
pub async fn build_orchestrator(cfg: &ResolvedConfig) -> Result<Orchestrator> {
    let feed: Arc<dyn FeedSource> = Arc::new(RssFeed::new(
        cfg.feed.url.clone(),
        Duration::from_secs(cfg.feed.timeout_seconds),
    )?);

    let ledger_store: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::open(&cfg.ledger_path)?);

    let summarizer: Arc<dyn Summarizer> = match cfg.summarizer.backend {
        SummarizerBackend::Excerpt => Arc::new(ExcerptSummarizer::default()),
        SummarizerBackend::Fabric => {
            let fabric = FabricSummarizer::new(
                cfg.summarizer.pattern.clone(),
                cfg.summarizer.model.clone(),
                Duration::from_secs(cfg.summarizer.timeout_seconds),
            );
            match &cfg.summarizer.binary {
                Some(binary) => Arc::new(fabric.with_binary_path(binary.clone())),
                None => Arc::new(fabric),
            }
        }
    };

    let api_key = std::env::var(&cfg.speech.api_key_env).ok();
    if api_key.is_none() {
        warn!(
            var = %cfg.speech.api_key_env,
            "No speech API key set; calling endpoint without credentials"
        );
    }
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(HttpSpeechClient::new(
        cfg.speech.endpoint.clone(),
        api_key,
        Duration::from_secs(cfg.speech.timeout_seconds),
    )?);

    let (artifacts, manifest) = open_stores(cfg).await?;

    let mut synthesizer =
        AudioSynthesizer::new(speech, artifacts.clone(), cfg.speech.voice.clone());
    if let Some(dir) = &cfg.staging_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create staging directory: {}", dir.display()))?;
        synthesizer = synthesizer.with_staging_dir(dir.clone());
    }

    Ok(Orchestrator::new(
        feed,
        DedupLedger::new(ledger_store),
        NarrationComposer::new(summarizer).with_template(cfg.summarizer.template.clone()),
        synthesizer,
        CatalogBuilder::new(artifacts, manifest, cfg.catalog_settings()),
        cfg.run_settings(),
    ))
}

/// Open the artifact store and the manifest store (the same one unless
/// a separate manifest directory is configured)
async fn open_stores(
    cfg: &ResolvedConfig,
) -> Result<(Arc<dyn ObjectStore>, Arc<dyn ObjectStore>)> {
    let artifacts: Arc<dyn ObjectStore> =
        Arc::new(FsObjectStore::open(&cfg.storage.artifacts_dir).await?);

    let manifest: Arc<dyn ObjectStore> = match &cfg.storage.manifest_dir {
        Some(dir) => Arc::new(FsObjectStore::open(dir).await?),
        None => artifacts.clone(),
    };

    Ok((artifacts, manifest))
}

fn print_report(report: &RunReport) {
    for item in &report.items {
        match &item.status {
            ItemStatus::Narrated { key } => println!("  + {} -> {}", item.title, key),
            ItemStatus::AlreadyProcessed => println!("  = {} (already processed)", item.title),
            ItemStatus::Failed { stage, error } => {
                println!("  ! {} ({} failed: {})", item.title, stage, error)
            }
        }
    }

    println!();
    println!(
        "Run {}: {} narrated, {} skipped, {} failed",
        report.id,
        report.narrated(),
        report.skipped(),
        report.failed()
    );
    match &report.catalog {
        Some(CatalogOutcome::Published { entries }) => {
            println!("Catalog: {} entries published", entries)
        }
        Some(CatalogOutcome::Failed { error }) => {
            eprintln!("Catalog: not published ({})", error)
        }
        None => {}
    }
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!("newsvoice configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:      {}", cfg.home.display());
    println!("  Ledger:    {}", cfg.ledger_path.display());
    println!("  Artifacts: {}", cfg.storage.artifacts_dir.display());
    println!(
        "  Manifest:  {}",
        cfg.storage
            .manifest_dir
            .as_ref()
            .unwrap_or(&cfg.storage.artifacts_dir)
            .join(&cfg.storage.manifest_key)
            .display()
    );
    if let Some(staging) = &cfg.staging_dir {
        println!("  Staging:   {}", staging.display());
    }
    println!();
    println!("Feed:");
    println!("  URL:        {}", cfg.feed.url);
    println!("  Batch size: {}", cfg.feed.batch_size);
    println!();
    println!("Summarizer: {:?}", cfg.summarizer.backend);
    println!("  Template: {}", cfg.summarizer.template);
    if cfg.summarizer.backend == SummarizerBackend::Fabric {
        println!("  Pattern: {}", cfg.summarizer.pattern);
        if let Some(model) = &cfg.summarizer.model {
            println!("  Model:   {}", model);
        }
    }
    println!();
    println!("Speech:");
    println!("  Endpoint: {}", cfg.speech.endpoint);
    println!(
        "  Voice:    {} ({}, {})",
        cfg.speech.voice.voice, cfg.speech.voice.model, cfg.speech.voice.format
    );
    println!();
    println!("Public base URL: {}", cfg.storage.public_base_url);

    Ok(())
}
