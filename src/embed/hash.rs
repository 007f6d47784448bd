use super::Embedder;
use crate::error::Result;
use crate::space::normalize;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Bag-of-words embedder that hashes lowercase tokens into buckets.
///
/// Texts sharing words land close together, which is enough to exercise the
/// retrieval pipeline without downloading a model. Output is always
/// unit-length; text without any word characters maps to bucket 0.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self {
            dim,
            model_id: format!("hash-{dim}"),
        }
    }

    fn bucket(&self, token: &str) -> usize {
        let mut h = FNV_OFFSET;
        for b in token.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        (h % self.dim as u64) as usize
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        let lower = text.to_lowercase();

        let mut tokens = 0usize;
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            v[self.bucket(token)] += 1.0;
            tokens += 1;
        }
        if tokens == 0 {
            v[0] = 1.0;
        }

        normalize(&mut v);
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{dot, l2_norm};

    #[test]
    fn test_output_is_unit_length() {
        let embedder = HashEmbedder::new(32);
        for text in ["Reset my password", "Как сменить пароль?", "", "?!"] {
            let v = embedder.embed(text).unwrap();
            assert_eq!(v.len(), 32);
            assert!((l2_norm(&v) - 1.0).abs() < 1e-5, "text {text:?}");
        }
    }

    #[test]
    fn test_deterministic_and_case_insensitive() {
        let embedder = HashEmbedder::default();
        assert_eq!(
            embedder.embed("Forgot PASSWORD").unwrap(),
            embedder.embed("forgot password").unwrap()
        );
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashEmbedder::new(256);
        let batch = embedder
            .embed_batch(&["reset my password", "password reset", "pay an invoice"])
            .unwrap();
        assert!(dot(&batch[0], &batch[1]) > dot(&batch[0], &batch[2]));
    }

    #[test]
    fn test_model_id_names_dimension() {
        assert_eq!(HashEmbedder::new(64).model_id(), "hash-64");
    }
}
