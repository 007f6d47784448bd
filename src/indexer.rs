//! Space indexer - embeds labeled question variants into a [`VectorSpace`].
//!
//! Texts are embedded in fixed-size batches and the resulting vectors are
//! validated by [`VectorSpace::new`], so a misbehaving embedder (wrong
//! dimension, unnormalized output, dropped rows) fails the build instead of
//! producing a silently broken index.

use crate::dataset::DatasetRow;
use crate::embed::Embedder;
use crate::error::{FaqError, Result};
use crate::space::VectorSpace;
use std::time::Instant;
use tracing::{debug, info};

/// Options for index construction.
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Number of texts sent to the embedder at once.
    pub batch_size: usize,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self { batch_size: 64 }
    }
}

/// Builds vector spaces from dataset rows with one embedder.
pub struct SpaceIndexer<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
    options: IndexerOptions,
}

impl<'a, E: Embedder + ?Sized> SpaceIndexer<'a, E> {
    /// Create a new indexer.
    pub fn new(embedder: &'a E) -> Self {
        Self {
            embedder,
            options: IndexerOptions::default(),
        }
    }

    /// Create with custom options.
    pub fn with_options(embedder: &'a E, options: IndexerOptions) -> Self {
        Self { embedder, options }
    }

    /// Embed every text of `texts`, batch by batch.
    pub fn embed_all(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let batch_size = self.options.batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for (n, batch) in texts.chunks(batch_size).enumerate() {
            let embedded = self.embedder.embed_batch(batch)?;
            if embedded.len() != batch.len() {
                return Err(FaqError::Embedding(format!(
                    "batch {} returned {} vectors for {} texts",
                    n,
                    embedded.len(),
                    batch.len()
                )));
            }
            debug!(batch = n, size = batch.len(), "embedded batch");
            vectors.extend(embedded);
        }

        Ok(vectors)
    }

    /// Build a vector space from labeled rows, preserving row order.
    pub fn index(&self, rows: &[DatasetRow]) -> Result<VectorSpace> {
        let start = Instant::now();

        let texts: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        let vectors = self.embed_all(&texts)?;

        let labels = rows.iter().map(|row| row.label.clone()).collect();
        let texts = rows.iter().map(|row| row.text.clone()).collect();
        let space = VectorSpace::new(labels, texts, vectors)?;

        if !space.is_empty() && space.dimension() != self.embedder.dimension() {
            return Err(FaqError::dimension(
                format!("output of embedder '{}'", self.embedder.model_id()),
                self.embedder.dimension(),
                space.dimension(),
            ));
        }

        info!(
            items = space.len(),
            dimension = space.dimension(),
            model = self.embedder.model_id(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built vector space"
        );

        Ok(space)
    }
}

/// Convenience function to index rows with default options.
pub fn build_space<E: Embedder + ?Sized>(rows: &[DatasetRow], embedder: &E) -> Result<VectorSpace> {
    SpaceIndexer::new(embedder).index(rows)
}
