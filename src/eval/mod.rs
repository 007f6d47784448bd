//! Evaluation harness for retrieval quality.
//!
//! This module provides:
//! - Stratified, seeded train/test splitting of labeled variants
//! - Accuracy, precision, recall and coverage with abstention as its own class
//! - An end-to-end runner that indexes the train split and scores the test split

pub mod benchmark;
pub mod metrics;
pub mod split;

pub use benchmark::{Benchmark, BenchmarkConfig, EvaluationReport, EvaluationRun, PredictionRecord};
pub use metrics::{EvalResult, evaluate};
pub use split::{Split, Splitter};
