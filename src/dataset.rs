//! FAQ and question-variant data loading.
//!
//! Two CSV inputs describe the knowledge base:
//! - `faq.csv` with columns `faq_id, canonical_question, answer`
//! - `variants.csv` with columns `faq_id, question_variant`
//!
//! Variants become [`DatasetRow`]s labeled by their FAQ id; they are what
//! gets embedded and what the evaluation harness splits.

use crate::error::{FaqError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// One FAQ entry with its canonical answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqItem {
    pub faq_id: String,
    pub canonical_question: String,
    pub answer: String,
}

/// One labeled question phrasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRow {
    /// FAQ id the phrasing belongs to.
    pub label: String,
    /// The question text.
    pub text: String,
}

impl DatasetRow {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFaq {
    #[serde(default)]
    faq_id: String,
    #[serde(default)]
    canonical_question: String,
    #[serde(default)]
    answer: String,
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(default)]
    faq_id: String,
    #[serde(default)]
    question_variant: String,
}

const FAQ_COLUMNS: [&str; 3] = ["faq_id", "canonical_question", "answer"];
const VARIANT_COLUMNS: [&str; 2] = ["faq_id", "question_variant"];

/// Load `faq.csv`. Rows with an empty id are skipped.
pub fn load_faq(path: &Path) -> Result<Vec<FaqItem>> {
    let mut reader = open_csv(path, &FAQ_COLUMNS)?;

    let mut items = Vec::new();
    for record in reader.deserialize() {
        let raw: RawFaq = record?;
        let faq_id = raw.faq_id.trim();
        if faq_id.is_empty() {
            continue;
        }
        items.push(FaqItem {
            faq_id: faq_id.to_string(),
            canonical_question: raw.canonical_question.trim().to_string(),
            answer: raw.answer.trim().to_string(),
        });
    }

    Ok(items)
}

/// Load `variants.csv`. Rows with an empty id or empty text are skipped.
pub fn load_variants(path: &Path) -> Result<Vec<DatasetRow>> {
    let mut reader = open_csv(path, &VARIANT_COLUMNS)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize() {
        let raw: RawVariant = record?;
        let label = raw.faq_id.trim();
        let text = raw.question_variant.trim();
        if label.is_empty() || text.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(DatasetRow::new(label, text));
    }

    if skipped > 0 {
        warn!(skipped, path = %path.display(), "skipped variant rows with empty fields");
    }

    Ok(rows)
}

/// Map of FAQ id to answer text.
pub fn answer_map(items: &[FaqItem]) -> HashMap<String, String> {
    items
        .iter()
        .map(|item| (item.faq_id.clone(), item.answer.clone()))
        .collect()
}

/// Labels of `rows` that have no FAQ entry.
pub fn orphan_labels<'a>(rows: &'a [DatasetRow], items: &[FaqItem]) -> Vec<&'a str> {
    let known: std::collections::HashSet<&str> =
        items.iter().map(|item| item.faq_id.as_str()).collect();
    let mut orphans: Vec<&str> = rows
        .iter()
        .map(|row| row.label.as_str())
        .filter(|label| !known.contains(label))
        .collect();
    orphans.sort_unstable();
    orphans.dedup();
    orphans
}

fn open_csv(path: &Path, required: &[&str]) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(FaqError::Dataset(format!(
            "CSV not found: {}",
            path.display()
        )));
    }

    let file = std::fs::File::open(path).map_err(|e| FaqError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let found: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !found.iter().any(|f| f == column))
        .collect();

    if !missing.is_empty() {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("csv");
        return Err(FaqError::Dataset(format!(
            "{} missing columns: {:?}. Found: {:?}",
            name, missing, found
        )));
    }

    reader.set_headers(csv::StringRecord::from(found));
    Ok(reader)
}
