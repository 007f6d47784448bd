//! End-to-end evaluation run.
//!
//! Splits the labeled variants, indexes the training side, classifies every
//! test variant and scores the predictions:
//!
//! ```text
//! variants -> Splitter -> train -> embed -> VectorSpace -> Retriever
//!                      -> test  -> embed -> predict ----> evaluate -> report
//! ```

use super::metrics::{EvalResult, evaluate};
use super::split::Splitter;
use crate::config::{RetrievalConfig, SplitConfig};
use crate::dataset::DatasetRow;
use crate::embed::Embedder;
use crate::error::{FaqError, Result};
use crate::indexer::SpaceIndexer;
use crate::retriever::Retriever;
use crate::space::VectorSpace;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Configuration for an evaluation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkConfig {
    pub retrieval: RetrievalConfig,
    pub split: SplitConfig,
}

/// Prediction for a single held-out variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Ground-truth FAQ id.
    pub label: String,
    /// The held-out question text.
    pub text: String,
    /// Predicted FAQ id, `None` when escalated.
    pub predicted: Option<String>,
    /// Best similarity score.
    pub score: f32,
}

impl PredictionRecord {
    pub fn is_correct(&self) -> bool {
        self.predicted.as_deref() == Some(self.label.as_str())
    }
}

/// Aggregated evaluation results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model_id: String,
    pub threshold: f32,
    pub top_k: usize,
    pub test_ratio: f64,
    pub seed: u64,
    pub train_size: usize,
    pub test_size: usize,
    pub result: EvalResult,
    pub records: Vec<PredictionRecord>,
    /// Labels that only appear in the test split.
    pub test_only_labels: Vec<String>,
    /// Total run time (seconds).
    pub total_time_secs: f64,
}

impl EvaluationReport {
    /// The `n` records with the lowest scores, lowest first.
    pub fn lowest_confidence(&self, n: usize) -> Vec<&PredictionRecord> {
        let mut sorted: Vec<&PredictionRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| a.score.total_cmp(&b.score));
        sorted.truncate(n);
        sorted
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Eval Results ==========");
        println!("model      : {}", self.model_id);
        println!("threshold  : {}", self.threshold);
        println!("top_k      : {}", self.top_k);
        println!("test_ratio : {}", self.test_ratio);
        println!("seed       : {}", self.seed);
        println!("train/test : {}/{}", self.train_size, self.test_size);
        println!("----------------------------------");
        println!("accuracy@1 : {:.4}", self.result.accuracy_at_1);
        println!("precision  : {:.4}", self.result.precision);
        println!("recall     : {:.4}", self.result.recall);
        println!(
            "coverage   : {:.4}  (answered confidently)",
            self.result.coverage
        );
        if !self.test_only_labels.is_empty() {
            println!("----------------------------------");
            println!(
                "labels without training rows: {}",
                self.test_only_labels.join(", ")
            );
        }
        println!("----------------------------------");
        println!("Total time: {:.1}s", self.total_time_secs);
        println!("==================================\n");
    }
}

/// Everything an evaluation run produced.
pub struct EvaluationRun {
    pub report: EvaluationReport,
    /// Index built from the training split.
    pub train_space: VectorSpace,
}

/// Evaluation runner.
pub struct Benchmark<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
    config: BenchmarkConfig,
}

impl<'a, E: Embedder + ?Sized> Benchmark<'a, E> {
    /// Create a new runner.
    pub fn new(embedder: &'a E, config: BenchmarkConfig) -> Self {
        Self { embedder, config }
    }

    /// Run the full evaluation over labeled variants.
    pub fn run(&self, rows: &[DatasetRow]) -> Result<EvaluationRun> {
        let start = Instant::now();

        let splitter = Splitter::with_config(&self.config.split)?;
        let split = splitter.split(rows);
        info!(
            train = split.train.len(),
            test = split.test.len(),
            "split dataset"
        );

        if split.train.is_empty() {
            return Err(FaqError::Configuration(
                "training split is empty; every label has a single variant".into(),
            ));
        }

        let indexer = SpaceIndexer::new(self.embedder);
        let train_space = indexer.index(&split.train)?;
        let retriever = Retriever::with_config(train_space, &self.config.retrieval)?;

        let test_texts: Vec<&str> = split.test.iter().map(|row| row.text.as_str()).collect();
        let test_vectors = indexer.embed_all(&test_texts)?;

        let mut records = Vec::with_capacity(split.test.len());
        for (row, vector) in split.test.iter().zip(&test_vectors) {
            let outcome = retriever.predict(vector)?;
            records.push(PredictionRecord {
                label: row.label.clone(),
                text: row.text.clone(),
                predicted: outcome.label,
                score: outcome.score,
            });
        }

        let truth: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        let predicted: Vec<Option<&str>> =
            records.iter().map(|r| r.predicted.as_deref()).collect();
        let result = evaluate(&truth, &predicted)?;

        let train_labels = retriever.space().labels();
        let mut test_only_labels: Vec<String> = split
            .test
            .iter()
            .map(|row| row.label.as_str())
            .filter(|label| !train_labels.contains(label))
            .map(str::to_string)
            .collect();
        test_only_labels.dedup();

        info!(
            accuracy = result.accuracy_at_1,
            coverage = result.coverage,
            "evaluation finished"
        );

        let report = EvaluationReport {
            model_id: self.embedder.model_id().to_string(),
            threshold: retriever.threshold(),
            top_k: retriever.top_k(),
            test_ratio: self.config.split.test_ratio,
            seed: self.config.split.seed,
            train_size: split.train.len(),
            test_size: split.test.len(),
            result,
            records,
            test_only_labels,
            total_time_secs: start.elapsed().as_secs_f64(),
        };

        Ok(EvaluationRun {
            report,
            train_space: retriever.into_space(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;

    fn variants() -> Vec<DatasetRow> {
        let mut rows = Vec::new();
        for text in [
            "reset password",
            "forgot my password",
            "change password",
            "password reset link",
            "lost password",
        ] {
            rows.push(DatasetRow::new("password", text));
        }
        for text in [
            "download invoice",
            "where is my invoice",
            "invoice copy",
            "send invoice again",
            "invoice pdf",
        ] {
            rows.push(DatasetRow::new("invoice", text));
        }
        rows.push(DatasetRow::new("orphan", "completely unrelated question"));
        rows
    }

    fn config(threshold: f32) -> BenchmarkConfig {
        BenchmarkConfig {
            retrieval: RetrievalConfig {
                threshold,
                top_k: 3,
            },
            split: SplitConfig {
                test_ratio: 0.4,
                seed: 42,
            },
        }
    }

    #[test]
    fn test_run_produces_consistent_report() {
        let embedder = HashEmbedder::new(256);
        let run = Benchmark::new(&embedder, config(0.3)).run(&variants()).unwrap();
        let report = &run.report;

        // 5 * 0.4 = 2 per label, plus the single-row label
        assert_eq!(report.test_size, 5);
        assert_eq!(report.train_size, 6);
        assert_eq!(run.train_space.len(), 6);
        assert_eq!(report.records.len(), report.test_size);
        assert_eq!(report.test_only_labels, vec!["orphan".to_string()]);
        assert_eq!(report.model_id, "hash-256");

        let answered = report.records.iter().filter(|r| r.predicted.is_some()).count();
        assert!((report.result.coverage - answered as f64 / 5.0).abs() < 1e-12);

        let correct = report.records.iter().filter(|r| r.is_correct()).count();
        assert!((report.result.accuracy_at_1 - correct as f64 / 5.0).abs() < 1e-12);

        // the orphan label can never be predicted
        let orphan = report.records.iter().find(|r| r.label == "orphan").unwrap();
        assert!(!orphan.is_correct());
    }

    #[test]
    fn test_high_threshold_abstains_everywhere() {
        let embedder = HashEmbedder::new(4096);
        let run = Benchmark::new(&embedder, config(1.0)).run(&variants()).unwrap();
        let result = run.report.result;
        // no held-out text duplicates a training text, so nothing reaches 1.0
        assert_eq!(result.coverage, 0.0);
        assert_eq!(result.accuracy_at_1, 0.0);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let embedder = HashEmbedder::new(64);
        let first = Benchmark::new(&embedder, config(0.3)).run(&variants()).unwrap();
        let second = Benchmark::new(&embedder, config(0.3)).run(&variants()).unwrap();

        assert_eq!(first.report.result, second.report.result);
        let texts = |run: &EvaluationRun| -> Vec<String> {
            run.report.records.iter().map(|r| r.text.clone()).collect()
        };
        assert_eq!(texts(&first), texts(&second));
    }

    #[test]
    fn test_lowest_confidence_is_sorted() {
        let embedder = HashEmbedder::new(64);
        let run = Benchmark::new(&embedder, config(0.3)).run(&variants()).unwrap();

        let worst = run.report.lowest_confidence(3);
        assert_eq!(worst.len(), 3);
        assert!(worst.windows(2).all(|w| w[0].score <= w[1].score));
        assert!(run.report.lowest_confidence(100).len() == run.report.records.len());
    }

    #[test]
    fn test_rejects_dataset_without_training_rows() {
        let embedder = HashEmbedder::new(16);
        let rows = vec![DatasetRow::new("a", "one"), DatasetRow::new("b", "two")];
        let result = Benchmark::new(&embedder, config(0.5)).run(&rows);
        assert!(matches!(result, Err(FaqError::Configuration(_))));
    }

    #[test]
    fn test_rejects_invalid_ratio() {
        let embedder = HashEmbedder::new(16);
        let mut config = config(0.5);
        config.split.test_ratio = 0.0;
        let result = Benchmark::new(&embedder, config).run(&variants());
        assert!(matches!(result, Err(FaqError::InvalidRatio(_))));
    }
}
