//! FAQ bot CLI
//!
//! Builds the retrieval index and answers support questions from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faq_retrieval::{
    config::Config,
    dataset::{load_faq, load_variants, orphan_labels},
    embed::{Embedder, load_embedder},
    indexer::{IndexerOptions, SpaceIndexer},
    persistence::{index_exists, index_size, load_index, load_index_for_model, save_index},
    responder::{Reply, Responder},
    retriever::Retriever,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

/// FAQ bot - semantic FAQ matching with human escalation
#[derive(Parser)]
#[command(name = "faq-bot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed all question variants and save the index
    BuildIndex {
        /// Variants CSV (defaults to the configured data directory)
        #[arg(long)]
        variants: Option<PathBuf>,

        /// Output path for the index file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of texts embedded per batch
        #[arg(long, default_value = "64")]
        batch_size: usize,
    },

    /// Answer a single question
    Ask {
        /// The question text
        question: String,

        /// Path to the index file
        #[arg(short, long)]
        index: Option<PathBuf>,

        /// Also print the top-K nearest variants
        #[arg(long)]
        explain: bool,
    },

    /// Answer questions read line by line from stdin
    Chat {
        /// Path to the index file
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Show information about an index
    Info {
        /// Path to the index file
        index: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::BuildIndex {
            variants,
            output,
            batch_size,
        } => cmd_build_index(&config, variants, output, batch_size),
        Commands::Ask {
            question,
            index,
            explain,
        } => cmd_ask(&config, question, index, explain),
        Commands::Chat { index } => cmd_chat(&config, index),
        Commands::Info { index } => cmd_info(&config, index),
    }
}

fn cmd_build_index(
    config: &Config,
    variants: Option<PathBuf>,
    output: Option<PathBuf>,
    batch_size: usize,
) -> Result<()> {
    let variants_path = variants.unwrap_or_else(|| config.paths.variants_csv.clone());
    let output = output.unwrap_or_else(|| config.paths.index_path());

    println!("Loading variants: {}", variants_path.display());
    let rows = load_variants(&variants_path).context("Failed to load variants")?;

    if config.paths.faq_csv.exists() {
        let faq = load_faq(&config.paths.faq_csv).context("Failed to load FAQ")?;
        let orphans = orphan_labels(&rows, &faq);
        if !orphans.is_empty() {
            println!("  Warning: variants without FAQ answers: {}", orphans.join(", "));
        }
    }

    let embedder = load_embedder(&config.model).context("Failed to load embedder")?;
    println!("Using model: {}", embedder.model_id());

    let start = Instant::now();
    let indexer = SpaceIndexer::with_options(&embedder, IndexerOptions { batch_size });
    let space = indexer.index(&rows).context("Failed to build index")?;
    let build_duration = start.elapsed();

    save_index(&space, embedder.model_id(), &output).context("Failed to save index")?;
    let size = index_size(&output)?;

    println!("\nIndex built: {}", output.display());
    println!("  items:      {}", space.len());
    println!("  dim:        {}", space.dimension());
    println!("  labels:     {}", space.labels().len());
    println!("  build time: {:.2?}", build_duration);
    println!("  file size:  {:.1} KB", size as f64 / 1024.0);

    Ok(())
}

fn load_responder(
    config: &Config,
    index: Option<PathBuf>,
) -> Result<Responder<Box<dyn Embedder>>> {
    let index_path = index.unwrap_or_else(|| config.paths.index_path());
    if !index_exists(&index_path) {
        anyhow::bail!(
            "Index not found at '{}'. Run 'build-index' command first.",
            index_path.display()
        );
    }

    let faq = load_faq(&config.paths.faq_csv).context("Failed to load FAQ")?;
    let embedder = load_embedder(&config.model).context("Failed to load embedder")?;
    let space = load_index_for_model(&index_path, embedder.model_id())
        .context("Failed to load index")?;
    let retriever = Retriever::with_config(space, &config.retrieval)?;

    Ok(Responder::new(embedder, retriever, &faq))
}

fn cmd_ask(config: &Config, question: String, index: Option<PathBuf>, explain: bool) -> Result<()> {
    let responder = load_responder(config, index)?;

    let reply = responder.respond(&question).context("Failed to answer")?;
    println!("{}", reply);

    if explain && !matches!(reply, Reply::Empty | Reply::Generic { .. }) {
        print_neighbours(&responder, &question)?;
    }

    Ok(())
}

fn print_neighbours(responder: &Responder<Box<dyn Embedder>>, question: &str) -> Result<()> {
    let vector = responder.embedder().embed(question.trim())?;
    let hits = responder.retriever().query(&vector)?;

    println!("\nNearest variants:");
    println!("{}", "─".repeat(60));
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. [{}] {:.3}  {}",
            rank + 1,
            hit.label,
            hit.score,
            hit.text
        );
    }
    println!("{}", "─".repeat(60));

    Ok(())
}

fn cmd_chat(config: &Config, index: Option<PathBuf>) -> Result<()> {
    let responder = load_responder(config, index)?;

    println!("Ask a question (Ctrl-D to exit).");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match responder.respond(&line) {
            Ok(reply) => println!("{}\n", reply),
            Err(e) => println!("Error: {}\n", e),
        }
        print!("> ");
        stdout.flush()?;
    }
    println!();

    Ok(())
}

fn cmd_info(config: &Config, index: Option<PathBuf>) -> Result<()> {
    let index_path = index.unwrap_or_else(|| config.paths.index_path());
    if !index_exists(&index_path) {
        anyhow::bail!(
            "Index not found at '{}'. Run 'build-index' command first.",
            index_path.display()
        );
    }

    let (space, meta) = load_index(&index_path).context("Failed to load index")?;
    let size = index_size(&index_path)?;

    println!("Index Information");
    println!("{}", "─".repeat(40));
    println!("  Model:        {}", meta.model_id);
    println!("  Items:        {}", meta.n_items);
    println!("  Dimension:    {}", meta.dimension);
    println!("  Labels:       {}", space.labels().len());
    println!("  File size:    {:.1} KB", size as f64 / 1024.0);
    println!("  Index path:   {}", index_path.display());
    println!("  Threshold:    {}", config.retrieval.threshold);
    println!("  Top K:        {}", config.retrieval.top_k);

    Ok(())
}
