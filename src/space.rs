//! Immutable collection of labeled, unit-length reference vectors.
//!
//! A [`VectorSpace`] is built once from parallel sequences of labels, texts
//! and vectors and never mutated afterwards. Every vector must be L2-normalized
//! so that downstream scoring can use a plain dot product as cosine similarity.

use crate::error::{FaqError, Result};
use serde::{Deserialize, Serialize};

/// Maximum allowed deviation of a reference vector's norm from 1.0.
pub const NORM_TOLERANCE: f64 = 1e-3;

/// One indexed entry of a vector space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    /// 0-based position, stable within its space.
    pub index: usize,
    /// FAQ label this variant belongs to.
    pub label: String,
    /// Source text the vector was computed from.
    pub text: String,
    /// Unit-length embedding.
    pub vector: Vec<f32>,
}

/// Ordered, fixed-dimension set of reference items.
#[derive(Debug, Clone, Default)]
pub struct VectorSpace {
    items: Vec<ReferenceItem>,
    dimension: usize,
}

impl VectorSpace {
    /// Build a space from parallel label/text/vector sequences.
    ///
    /// Fails with [`FaqError::DimensionMismatch`] when the sequences disagree
    /// in length or vectors differ in dimensionality, and with
    /// [`FaqError::Normalization`] when a vector is not unit-length.
    pub fn new(labels: Vec<String>, texts: Vec<String>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if labels.len() != vectors.len() {
            return Err(FaqError::dimension(
                "label/vector count",
                vectors.len(),
                labels.len(),
            ));
        }
        if texts.len() != vectors.len() {
            return Err(FaqError::dimension(
                "text/vector count",
                vectors.len(),
                texts.len(),
            ));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        for (index, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(FaqError::dimension(
                    format!("reference vector {index}"),
                    dimension,
                    vector.len(),
                ));
            }
            let norm = l2_norm(vector);
            if !norm.is_finite() || (norm - 1.0).abs() > NORM_TOLERANCE {
                return Err(FaqError::Normalization { index, norm });
            }
        }

        let items = labels
            .into_iter()
            .zip(texts)
            .zip(vectors)
            .enumerate()
            .map(|(index, ((label, text), vector))| ReferenceItem {
                index,
                label,
                text,
                vector,
            })
            .collect();

        Ok(Self { items, dimension })
    }

    /// Build a space from previously exported items, renumbering positions.
    pub fn from_items(items: Vec<ReferenceItem>) -> Result<Self> {
        let mut labels = Vec::with_capacity(items.len());
        let mut texts = Vec::with_capacity(items.len());
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            labels.push(item.label);
            texts.push(item.text);
            vectors.push(item.vector);
        }
        Self::new(labels, texts, vectors)
    }

    /// Number of items in the space.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the space is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Shared vector length (0 for an empty space).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Positional access.
    pub fn get(&self, index: usize) -> Option<&ReferenceItem> {
        self.items.get(index)
    }

    /// All items in index order.
    pub fn items(&self) -> &[ReferenceItem] {
        &self.items
    }

    /// Distinct labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.items
            .iter()
            .map(|item| item.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Consume the space, handing its items to a persistence layer.
    pub fn into_items(self) -> Vec<ReferenceItem> {
        self.items
    }
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm, accumulated in f64.
pub fn l2_norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v) as f32;
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn sample_space() -> VectorSpace {
        VectorSpace::new(
            strings(&["billing", "login", "login"]),
            strings(&["how to pay", "reset password", "forgot password"]),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_build_space() {
        let space = sample_space();
        assert_eq!(space.len(), 3);
        assert_eq!(space.dimension(), 2);

        let item = space.get(1).unwrap();
        assert_eq!(item.index, 1);
        assert_eq!(item.label, "login");
        assert_eq!(item.text, "reset password");
        assert!(space.get(3).is_none());
        assert_eq!(space.labels(), vec!["billing", "login"]);
    }

    #[test]
    fn test_empty_space_is_allowed() {
        let space = VectorSpace::new(vec![], vec![], vec![]).unwrap();
        assert!(space.is_empty());
        assert_eq!(space.dimension(), 0);
    }

    #[test]
    fn test_rejects_mixed_dimensions() {
        let err = VectorSpace::new(
            strings(&["a", "b"]),
            strings(&["x", "y"]),
            vec![vec![1.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FaqError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_sequence_length_disagreement() {
        let err = VectorSpace::new(strings(&["a"]), strings(&["x", "y"]), vec![vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, FaqError::DimensionMismatch { .. }));

        let err = VectorSpace::new(strings(&["a", "b"]), strings(&["x"]), vec![vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, FaqError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_rejects_unnormalized_vectors() {
        let err = VectorSpace::new(
            strings(&["a", "b"]),
            strings(&["x", "y"]),
            vec![vec![1.0, 0.0], vec![0.5, 0.5]],
        )
        .unwrap_err();
        assert!(matches!(err, FaqError::Normalization { index: 1, .. }));

        let err =
            VectorSpace::new(strings(&["a"]), strings(&["x"]), vec![vec![0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, FaqError::Normalization { index: 0, .. }));

        let err = VectorSpace::new(strings(&["a"]), strings(&["x"]), vec![vec![f32::NAN, 1.0]])
            .unwrap_err();
        assert!(matches!(err, FaqError::Normalization { .. }));
    }

    #[test]
    fn test_accepts_vectors_within_tolerance() {
        let space = VectorSpace::new(strings(&["a"]), strings(&["x"]), vec![vec![0.6, 0.8004]]);
        assert!(space.is_ok());
    }

    #[test]
    fn test_items_round_trip_renumbers() {
        let space = sample_space();
        let mut items = space.into_items();
        items.remove(0);

        let rebuilt = VectorSpace::from_items(items).unwrap();
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.get(0).unwrap().index, 0);
        assert_eq!(rebuilt.get(0).unwrap().text, "reset password");
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
        assert!((dot(&v, &[0.6, 0.8]) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
