//! Text embedding backends.
//!
//! Retrieval only ever sees vectors; this module is the boundary where text
//! becomes a unit-length vector. Two backends are provided:
//! - [`HashEmbedder`]: deterministic token hashing, used offline and in tests
//! - `SentenceEmbedder`: a sentence-transformers BERT model run with candle
//!   (requires the `sentence` feature)

mod hash;
#[cfg(feature = "sentence")]
mod sentence;

pub use hash::HashEmbedder;
#[cfg(feature = "sentence")]
pub use sentence::SentenceEmbedder;

use crate::config::{EmbedderBackend, ModelConfig};
use crate::error::{FaqError, Result};

/// Batched, order-preserving text-to-vector function.
pub trait Embedder {
    /// Embed a batch; `output[i]` belongs to `texts[i]`.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Output vector length.
    fn dimension(&self) -> usize;

    /// Identifier recorded alongside built indexes.
    fn model_id(&self) -> &str;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| FaqError::Embedding("embedder returned no vector".into()))
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Construct the embedder selected by `config`.
pub fn load_embedder(config: &ModelConfig) -> Result<Box<dyn Embedder>> {
    match config.backend {
        EmbedderBackend::Hash => Ok(Box::new(HashEmbedder::new(config.hash_dimension))),
        #[cfg(feature = "sentence")]
        EmbedderBackend::Sentence => Ok(Box::new(SentenceEmbedder::load(&config.model_id)?)),
        #[cfg(not(feature = "sentence"))]
        EmbedderBackend::Sentence => Err(FaqError::Config(format!(
            "model '{}' needs the sentence embedder; rebuild with `--features sentence` or set EMBEDDER=hash",
            config.model_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_hash_embedder() {
        let config = ModelConfig {
            backend: EmbedderBackend::Hash,
            hash_dimension: 64,
            ..Default::default()
        };
        let embedder = load_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), 64);
        assert_eq!(embedder.embed("reset password").unwrap().len(), 64);
    }

    #[cfg(not(feature = "sentence"))]
    #[test]
    fn test_sentence_backend_requires_feature() {
        let config = ModelConfig {
            backend: EmbedderBackend::Sentence,
            ..Default::default()
        };
        assert!(matches!(load_embedder(&config), Err(FaqError::Config(_))));
    }
}
