//! Configuration for FAQ retrieval and evaluation.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{FaqError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Embedding backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedderBackend {
    /// Deterministic token hashing, no model download.
    Hash,
    /// Sentence-transformers BERT model run through candle.
    Sentence,
}

impl EmbedderBackend {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Some(Self::Hash),
            "sentence" | "sentence-transformers" => Some(Self::Sentence),
            _ => None,
        }
    }
}

impl Default for EmbedderBackend {
    fn default() -> Self {
        if cfg!(feature = "sentence") {
            Self::Sentence
        } else {
            Self::Hash
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which embedder implementation to use.
    #[serde(default)]
    pub backend: EmbedderBackend,

    /// Model identifier, passed through to the embedder.
    pub model_id: String,

    /// Dimension used by the hashing embedder.
    #[serde(default = "default_hash_dimension")]
    pub hash_dimension: usize,
}

fn default_hash_dimension() -> usize {
    384
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: EmbedderBackend::default(),
            model_id: "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string(),
            hash_dimension: default_hash_dimension(),
        }
    }
}

/// Confidence gate settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum top-1 similarity required to answer.
    pub threshold: f32,
    /// Number of hits returned per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: 0.55,
            top_k: 5,
        }
    }
}

/// Train/test split settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each label's rows held out for testing.
    #[serde(default = "default_test_ratio")]
    pub test_ratio: f64,
    /// RNG seed for the per-label shuffle.
    #[serde(default = "default_seed", alias = "random_seed")]
    pub seed: u64,
}

fn default_test_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: default_test_ratio(),
            seed: default_seed(),
        }
    }
}

impl SplitConfig {
    /// Load a `splits.json` file (`{"test_ratio": 0.2, "random_seed": 42}`).
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FaqError::io(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| FaqError::Config(format!("Failed to parse split file: {}", e)))
    }
}

/// Locations of input data and build artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    pub faq_csv: PathBuf,
    pub variants_csv: PathBuf,
    pub splits_json: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl DataPaths {
    /// Standard file names under a data directory and an artifacts directory.
    pub fn under(data_dir: &Path, artifacts_dir: &Path) -> Self {
        Self {
            faq_csv: data_dir.join("faq.csv"),
            variants_csv: data_dir.join("variants.csv"),
            splits_json: data_dir.join("splits.json"),
            artifacts_dir: artifacts_dir.to_path_buf(),
        }
    }

    /// Default index file inside the artifacts directory.
    pub fn index_path(&self) -> PathBuf {
        self.artifacts_dir.join(crate::persistence::DEFAULT_INDEX_FILENAME)
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under(Path::new("data"), Path::new("artifacts"))
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub model: ModelConfig,
    pub retrieval: RetrievalConfig,
    pub split: SplitConfig,
    pub paths: DataPaths,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    model: Option<ModelFileSection>,
    retrieval: Option<RetrievalFileSection>,
    split: Option<SplitFileSection>,
    data_dir: Option<PathBuf>,
    artifacts_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ModelFileSection {
    backend: Option<String>,
    model_id: Option<String>,
    hash_dimension: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RetrievalFileSection {
    threshold: Option<f32>,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SplitFileSection {
    test_ratio: Option<f64>,
    seed: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (MODEL_NAME, EMBEDDER, THRESHOLD, TOP_K,
    ///    TEST_RATIO, RANDOM_SEED, FAQ_DATA_DIR, ARTIFACTS_DIR)
    /// 2. Config file (~/.config/faq-retrieval/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Override values from an environment lookup.
    ///
    /// Unlike the file section, numeric variables that fail to parse are
    /// reported rather than ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("MODEL_NAME") {
            self.model.model_id = model;
        }

        if let Some(backend) = lookup("EMBEDDER") {
            self.model.backend = EmbedderBackend::parse(&backend)
                .ok_or_else(|| FaqError::Config(format!("Unknown embedder '{}'", backend)))?;
        }

        if let Some(threshold) = lookup("THRESHOLD") {
            self.retrieval.threshold = parse_env("THRESHOLD", &threshold)?;
        }

        if let Some(top_k) = lookup("TOP_K") {
            self.retrieval.top_k = parse_env("TOP_K", &top_k)?;
        }

        if let Some(ratio) = lookup("TEST_RATIO") {
            self.split.test_ratio = parse_env("TEST_RATIO", &ratio)?;
        }

        if let Some(seed) = lookup("RANDOM_SEED") {
            self.split.seed = parse_env("RANDOM_SEED", &seed)?;
        }

        let data_dir = lookup("FAQ_DATA_DIR").map(PathBuf::from);
        let artifacts_dir = lookup("ARTIFACTS_DIR").map(PathBuf::from);
        if let Some(dir) = data_dir {
            let artifacts = self.paths.artifacts_dir.clone();
            self.paths = DataPaths::under(&dir, &artifacts);
        }
        if let Some(dir) = artifacts_dir {
            self.paths.artifacts_dir = dir;
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FaqError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse the YAML config format.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| FaqError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(model) = file_config.model {
            if let Some(backend) = model.backend {
                config.model.backend = EmbedderBackend::parse(&backend)
                    .ok_or_else(|| FaqError::Config(format!("Unknown embedder '{}'", backend)))?;
            }
            if let Some(model_id) = model.model_id {
                config.model.model_id = model_id;
            }
            if let Some(dim) = model.hash_dimension {
                config.model.hash_dimension = dim;
            }
        }

        if let Some(retrieval) = file_config.retrieval {
            if let Some(threshold) = retrieval.threshold {
                config.retrieval.threshold = threshold;
            }
            if let Some(top_k) = retrieval.top_k {
                config.retrieval.top_k = top_k;
            }
        }

        if let Some(split) = file_config.split {
            if let Some(ratio) = split.test_ratio {
                config.split.test_ratio = ratio;
            }
            if let Some(seed) = split.seed {
                config.split.seed = seed;
            }
        }

        if let Some(dir) = file_config.data_dir {
            config.paths = DataPaths::under(&dir, &config.paths.artifacts_dir);
        }
        if let Some(dir) = file_config.artifacts_dir {
            config.paths.artifacts_dir = dir;
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "faq-retrieval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate value ranges before any component is built.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.retrieval.threshold;
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(FaqError::Config(format!(
                "threshold must be within [-1, 1], got {}. Set THRESHOLD or edit the config file.",
                threshold
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(FaqError::Config(
                "top_k must be at least 1. Set TOP_K or edit the config file.".to_string(),
            ));
        }

        let ratio = self.split.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(FaqError::Config(format!(
                "test_ratio must be in (0, 1), got {}. Set TEST_RATIO or edit the config file.",
                ratio
            )));
        }

        if self.model.model_id.trim().is_empty() {
            return Err(FaqError::Config(
                "model id is required. Set MODEL_NAME or add to config file.".to_string(),
            ));
        }

        if self.model.backend == EmbedderBackend::Hash && self.model.hash_dimension == 0 {
            return Err(FaqError::Config(
                "hash_dimension must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FaqError::Config(format!("{} has an invalid value: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.retrieval.threshold, 0.55);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.split.test_ratio, 0.2);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.paths.faq_csv, PathBuf::from("data/faq.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("THRESHOLD", "0.7"),
            ("TOP_K", "3"),
            ("RANDOM_SEED", "7"),
            ("EMBEDDER", "hash"),
            ("FAQ_DATA_DIR", "/srv/faq"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.retrieval.threshold, 0.7);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.model.backend, EmbedderBackend::Hash);
        assert_eq!(config.paths.variants_csv, PathBuf::from("/srv/faq/variants.csv"));
        assert_eq!(config.paths.artifacts_dir, PathBuf::from("artifacts"));
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = Config::default();
        let result = config.apply_env(|key| (key == "TOP_K").then(|| "five".to_string()));
        assert!(matches!(result, Err(FaqError::Config(_))));
    }

    #[test]
    fn test_yaml_sections() {
        let config = Config::from_yaml(
            "retrieval:\n  threshold: 0.8\nsplit:\n  seed: 1\nartifacts_dir: out\n",
        )
        .unwrap();
        assert_eq!(config.retrieval.threshold, 0.8);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.split.seed, 1);
        assert_eq!(config.paths.index_path(), PathBuf::from("out/index.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.split.test_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.retrieval.threshold = 2.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_split_json_uses_source_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("splits.json");
        std::fs::write(&path, r#"{"test_ratio": 0.3, "random_seed": 9}"#).unwrap();

        let split = SplitConfig::load_json(&path).unwrap();
        assert_eq!(split.test_ratio, 0.3);
        assert_eq!(split.seed, 9);
    }
}
