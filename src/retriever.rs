//! Nearest-neighbour search with a confidence gate.
//!
//! The [`Retriever`] owns one [`VectorSpace`] and scores a query against every
//! reference vector by dot product (cosine similarity for unit vectors). The
//! best hit is only turned into an answer when its score reaches the
//! configured threshold; otherwise the retriever abstains so the caller can
//! escalate to a human.

use crate::config::RetrievalConfig;
use crate::error::{FaqError, Result};
use crate::space::{VectorSpace, dot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// A scored reference item, produced fresh for every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Position of the item in the vector space.
    pub index: usize,
    /// Label of the matched item.
    pub label: String,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
    /// Source text of the matched item.
    pub text: String,
}

/// Answer-or-abstain decision for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    /// Present only when `confident` is true.
    pub label: Option<String>,
    /// Best similarity score, reported even when abstaining.
    pub score: f32,
    /// Whether the best score reached the threshold.
    pub confident: bool,
}

impl PredictionOutcome {
    fn answered(label: String, score: f32) -> Self {
        Self {
            label: Some(label),
            score,
            confident: true,
        }
    }

    fn abstained(score: f32) -> Self {
        Self {
            label: None,
            score,
            confident: false,
        }
    }

    /// True when the query should be routed to a human.
    pub fn is_abstention(&self) -> bool {
        !self.confident
    }
}

/// Top-K retriever over an immutable vector space.
///
/// All methods take `&self` and the retriever holds no interior mutability,
/// so one instance can be shared across threads without coordination.
#[derive(Debug, Clone)]
pub struct Retriever {
    space: VectorSpace,
    threshold: f32,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever.
    ///
    /// Fails with [`FaqError::Configuration`] when `top_k` is zero, the
    /// threshold is not a finite value in [-1, 1], or the space is empty.
    pub fn new(space: VectorSpace, threshold: f32, top_k: usize) -> Result<Self> {
        if top_k < 1 {
            return Err(FaqError::Configuration("top_k must be at least 1".into()));
        }
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(FaqError::Configuration(format!(
                "threshold must be within [-1, 1], got {threshold}"
            )));
        }
        if space.is_empty() {
            return Err(FaqError::Configuration(
                "cannot retrieve from an empty vector space".into(),
            ));
        }

        Ok(Self {
            space,
            threshold,
            top_k,
        })
    }

    /// Create from a [`RetrievalConfig`].
    pub fn with_config(space: VectorSpace, config: &RetrievalConfig) -> Result<Self> {
        Self::new(space, config.threshold, config.top_k)
    }

    /// The underlying vector space.
    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    /// Give the vector space back, e.g. to persist it.
    pub fn into_space(self) -> VectorSpace {
        self.space
    }

    /// Similarity cutoff for answering.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Number of hits returned by [`query`](Self::query).
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Return the `min(top_k, len)` most similar items.
    ///
    /// Hits are ordered by descending score; equal scores keep ascending
    /// index order. The query must be unit-length and match the space's
    /// dimensionality.
    pub fn query(&self, vector: &[f32]) -> Result<Vec<RetrievalHit>> {
        if vector.len() != self.space.dimension() {
            return Err(FaqError::dimension(
                "query vector",
                self.space.dimension(),
                vector.len(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .space
            .items()
            .iter()
            .map(|item| (item.index, dot(vector, &item.vector)))
            .collect();

        let k = self.top_k.min(scored.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_by(rank_order);

        let hits = scored
            .into_iter()
            .filter_map(|(index, score)| {
                self.space.get(index).map(|item| RetrievalHit {
                    index,
                    label: item.label.clone(),
                    score,
                    text: item.text.clone(),
                })
            })
            .collect();

        Ok(hits)
    }

    /// Classify a query vector or abstain.
    pub fn predict(&self, vector: &[f32]) -> Result<PredictionOutcome> {
        let hits = self.query(vector)?;

        let Some(best) = hits.into_iter().next() else {
            return Ok(PredictionOutcome::abstained(0.0));
        };

        let outcome = if best.score >= self.threshold {
            PredictionOutcome::answered(best.label, best.score)
        } else {
            PredictionOutcome::abstained(best.score)
        };

        debug!(
            score = outcome.score,
            confident = outcome.confident,
            nearest = best.index,
            "prediction"
        );

        Ok(outcome)
    }
}

/// Descending score, then ascending index.
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faq_space() -> VectorSpace {
        VectorSpace::new(
            vec!["billing".into(), "login".into(), "login".into()],
            vec![
                "how to pay".into(),
                "reset password".into(),
                "forgot password".into(),
            ],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    fn unit(angle: f32) -> Vec<f32> {
        vec![angle.cos(), angle.sin()]
    }

    #[test]
    fn test_construction_validation() {
        assert!(matches!(
            Retriever::new(faq_space(), 0.5, 0),
            Err(FaqError::Configuration(_))
        ));
        assert!(matches!(
            Retriever::new(VectorSpace::default(), 0.5, 3),
            Err(FaqError::Configuration(_))
        ));
        assert!(matches!(
            Retriever::new(faq_space(), f32::NAN, 3),
            Err(FaqError::Configuration(_))
        ));
        assert!(matches!(
            Retriever::new(faq_space(), 1.5, 3),
            Err(FaqError::Configuration(_))
        ));
        assert!(Retriever::new(faq_space(), 0.5, 100).is_ok());
    }

    #[test]
    fn test_confident_login_answer() {
        let retriever = Retriever::new(faq_space(), 0.9, 2).unwrap();

        let hits = retriever.query(&[0.0, 1.0]).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].label, "login");
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 2);
        assert!((hits[0].score - 1.0).abs() < 1e-6);

        let outcome = retriever.predict(&[0.0, 1.0]).unwrap();
        assert_eq!(outcome.label.as_deref(), Some("login"));
        assert!((outcome.score - 1.0).abs() < 1e-6);
        assert!(outcome.confident);
    }

    #[test]
    fn test_abstains_below_threshold() {
        let retriever = Retriever::new(faq_space(), 0.95, 2).unwrap();

        let outcome = retriever.predict(&[0.6, 0.8]).unwrap();
        assert_eq!(outcome.label, None);
        assert!(!outcome.confident);
        assert!(outcome.is_abstention());
        assert!((outcome.score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let retriever = Retriever::new(faq_space(), 1.0, 1).unwrap();
        let outcome = retriever.predict(&[1.0, 0.0]).unwrap();
        assert!(outcome.confident);
        assert_eq!(outcome.label.as_deref(), Some("billing"));
    }

    #[test]
    fn test_query_length_is_min_of_top_k_and_len() {
        for top_k in 1..=5 {
            let retriever = Retriever::new(faq_space(), 0.5, top_k).unwrap();
            let hits = retriever.query(&[0.6, 0.8]).unwrap();
            assert_eq!(hits.len(), top_k.min(3));
        }
    }

    #[test]
    fn test_query_ordering_and_tie_break() {
        let angles = [0.3_f32, 1.2, 0.3, 0.9, 0.3, 2.0, 0.1];
        let space = VectorSpace::new(
            angles.iter().map(|a| format!("label-{a}")).collect(),
            angles.iter().map(|a| format!("text-{a}")).collect(),
            angles.iter().map(|a| unit(*a)).collect(),
        )
        .unwrap();
        let retriever = Retriever::new(space, 0.5, 5).unwrap();

        let hits = retriever.query(&unit(0.3)).unwrap();
        let indices: Vec<usize> = hits.iter().map(|h| h.index).collect();
        assert_eq!(indices, vec![0, 2, 4, 6, 3]);

        for pair in hits.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].index < pair[1].index)
            );
        }
    }

    #[test]
    fn test_predict_matches_top_query_hit() {
        let retriever = Retriever::new(faq_space(), 0.7, 3).unwrap();
        let query = unit(0.4);

        let hits = retriever.query(&query).unwrap();
        let outcome = retriever.predict(&query).unwrap();
        assert_eq!(outcome.score, hits[0].score);
        assert_eq!(outcome.label.as_deref(), Some(hits[0].label.as_str()));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let retriever = Retriever::new(faq_space(), 0.7, 3).unwrap();
        let query = unit(1.1);

        assert_eq!(retriever.query(&query).unwrap(), retriever.query(&query).unwrap());
        assert_eq!(
            retriever.predict(&query).unwrap(),
            retriever.predict(&query).unwrap()
        );
    }

    #[test]
    fn test_rejects_wrong_query_dimension() {
        let retriever = Retriever::new(faq_space(), 0.7, 3).unwrap();
        assert!(matches!(
            retriever.query(&[1.0, 0.0, 0.0]),
            Err(FaqError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            })
        ));
        assert!(retriever.predict(&[]).is_err());
    }

    #[test]
    fn test_concurrent_queries_share_one_retriever() {
        let retriever = Retriever::new(faq_space(), 0.9, 2).unwrap();
        let expected = retriever.predict(&[0.0, 1.0]).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| retriever.predict(&[0.0, 1.0]).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
