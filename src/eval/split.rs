//! Stratified, seeded train/test split.
//!
//! Rows are grouped by label (labels visited in sorted order), each group is
//! shuffled with one ChaCha8 stream keyed by the seed, and the head of each
//! shuffled group is held out for testing. The permutation depends only on
//! the ChaCha8 keystream and the Fisher-Yates walk below, so a seed keeps
//! producing the same split across dependency upgrades.
//!
//! Every label contributes at least one test row; labels with two or more rows
//! always keep at least one training row. A label with a single row ends up
//! test-only.

use crate::config::SplitConfig;
use crate::dataset::DatasetRow;
use crate::error::{FaqError, Result};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Train and test partitions of a dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Split {
    pub train: Vec<DatasetRow>,
    pub test: Vec<DatasetRow>,
}

/// Deterministic stratified splitter.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    test_ratio: f64,
    seed: u64,
}

impl Splitter {
    /// Fails with [`FaqError::InvalidRatio`] unless `0 < test_ratio < 1`.
    pub fn new(test_ratio: f64, seed: u64) -> Result<Self> {
        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            return Err(FaqError::InvalidRatio(test_ratio));
        }
        Ok(Self { test_ratio, seed })
    }

    pub fn with_config(config: &SplitConfig) -> Result<Self> {
        Self::new(config.test_ratio, config.seed)
    }

    /// Number of test rows drawn from a group of `n` rows.
    fn test_size(&self, n: usize) -> usize {
        let n_test = ((n as f64) * self.test_ratio).round_ties_even() as usize;
        n_test.max(1).min(n)
    }

    /// The seed fills the low 8 bytes of the key, little-endian.
    fn rng(&self) -> ChaCha8Rng {
        let mut key = [0u8; 32];
        key[..8].copy_from_slice(&self.seed.to_le_bytes());
        ChaCha8Rng::from_seed(key)
    }

    /// Partition `rows`. Same rows, ratio and seed always give the same split.
    pub fn split(&self, rows: &[DatasetRow]) -> Split {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (position, row) in rows.iter().enumerate() {
            groups.entry(row.label.as_str()).or_default().push(position);
        }

        let mut rng = self.rng();
        let mut split = Split::default();

        for positions in groups.values_mut() {
            shuffle(positions, &mut rng);

            let n = positions.len();
            let n_test = self.test_size(n);
            let (test, train) = if n_test == n && n > 1 {
                // keep one row for training
                let (train, test) = positions.split_at(1);
                (test, train)
            } else {
                positions.split_at(n_test)
            };

            split.test.extend(test.iter().map(|&p| rows[p].clone()));
            split.train.extend(train.iter().map(|&p| rows[p].clone()));
        }

        split
    }
}

/// Fisher-Yates from the back; `j` is the high word of `next_u64() * (i + 1)`.
fn shuffle<R: RngCore>(positions: &mut [usize], rng: &mut R) {
    for i in (1..positions.len()).rev() {
        let bound = (i + 1) as u128;
        let j = ((u128::from(rng.next_u64()) * bound) >> 64) as usize;
        positions.swap(i, j);
    }
}
