//! Offline evaluation of the FAQ retriever.
//!
//! Usage:
//!   eval                          # Evaluate with the configured data and model
//!   eval --variants <path>        # Use another variants CSV
//!
//! Options:
//!   --threshold <T>               # Override the confidence threshold
//!   --top-k <N>                   # Override the number of neighbours
//!   --test-ratio <R>              # Override the held-out share per label
//!   --seed <S>                    # Override the split seed
//!   --worst <N>                   # Show the N least confident predictions (default: 5)
//!   --output <path>               # Save the report to JSON
//!   --save-index                  # Persist the index built from the training split

use anyhow::{Context, Result};
use clap::Parser;
use faq_retrieval::config::{Config, SplitConfig};
use faq_retrieval::dataset::{answer_map, load_faq, load_variants};
use faq_retrieval::embed::{Embedder, load_embedder};
use faq_retrieval::eval::{Benchmark, BenchmarkConfig, EvaluationReport};
use faq_retrieval::persistence::save_index;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eval")]
#[command(about = "Evaluate FAQ retrieval on a held-out split", long_about = None)]
struct Cli {
    /// Variants CSV (defaults to the configured data directory)
    #[arg(long)]
    variants: Option<PathBuf>,

    /// Confidence threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Number of neighbours to retrieve
    #[arg(long)]
    top_k: Option<usize>,

    /// Share of each label held out for testing
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Seed for the split
    #[arg(long)]
    seed: Option<u64>,

    /// Number of least confident predictions to show
    #[arg(long, default_value = "5")]
    worst: usize,

    /// Save the report to a JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save the index built from the training split
    #[arg(long)]
    save_index: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;

    // splits.json beats the config file but not the environment
    if config.paths.splits_json.exists() {
        config.split = SplitConfig::load_json(&config.paths.splits_json)
            .context("Failed to read split settings")?;
        config.apply_env(|key| std::env::var(key).ok())?;
    }
    if let Some(threshold) = cli.threshold {
        config.retrieval.threshold = threshold;
    }
    if let Some(top_k) = cli.top_k {
        config.retrieval.top_k = top_k;
    }
    if let Some(ratio) = cli.test_ratio {
        config.split.test_ratio = ratio;
    }
    if let Some(seed) = cli.seed {
        config.split.seed = seed;
    }
    config.validate().context("Invalid configuration")?;

    let variants_path = cli
        .variants
        .unwrap_or_else(|| config.paths.variants_csv.clone());
    println!("Loading variants: {}", variants_path.display());
    let rows = load_variants(&variants_path).context("Failed to load variants")?;

    let answers = if config.paths.faq_csv.exists() {
        answer_map(&load_faq(&config.paths.faq_csv).context("Failed to load FAQ")?)
    } else {
        HashMap::new()
    };

    let embedder = load_embedder(&config.model).context("Failed to load embedder")?;
    println!("Using model: {}", embedder.model_id());
    println!("Variants: {}", rows.len());

    let benchmark_config = BenchmarkConfig {
        retrieval: config.retrieval,
        split: config.split,
    };
    let run = Benchmark::new(&embedder, benchmark_config)
        .run(&rows)
        .context("Evaluation failed")?;

    run.report.print_summary();
    print_worst(&run.report, &answers, cli.worst);

    if let Some(output_path) = cli.output {
        let json = serde_json::to_string_pretty(&run.report)?;
        std::fs::write(&output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("Report saved to {}", output_path.display());
    }

    if cli.save_index {
        let index_path = config.paths.index_path();
        save_index(&run.train_space, embedder.model_id(), &index_path)
            .context("Failed to save index")?;
        println!("Index saved to {}", index_path.display());
    }

    Ok(())
}

fn print_worst(report: &EvaluationReport, answers: &HashMap<String, String>, n: usize) {
    let worst = report.lowest_confidence(n);
    if worst.is_empty() {
        return;
    }

    println!("Least confident predictions:");
    println!("{}", "─".repeat(60));
    for record in worst {
        let predicted = record.predicted.as_deref().unwrap_or("<escalated>");
        println!("score     : {:.3}", record.score);
        println!("question  : {}", record.text);
        println!("expected  : {}", record.label);
        println!("predicted : {}", predicted);
        if let Some(answer) = record.predicted.as_ref().and_then(|id| answers.get(id)) {
            println!("answer    : {}", truncate(answer, 120));
        }
        println!("{}", "─".repeat(60));
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
