//! Classification metrics with abstention as a first-class outcome.
//!
//! An abstention is scored as its own class, distinct from every real label,
//! so a question that had an answer but was escalated counts as a miss rather
//! than being dropped from the denominator.

use crate::error::{FaqError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate metrics for one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvalResult {
    /// Fraction of exact top-1 matches.
    pub accuracy_at_1: f64,
    /// Micro-averaged precision, abstention class included.
    pub precision: f64,
    /// Micro-averaged recall, abstention class included.
    pub recall: f64,
    /// Fraction of queries answered instead of escalated.
    pub coverage: f64,
}

/// A class as seen by the metrics: a real label or the abstention class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Class<'a> {
    Label(&'a str),
    Abstain,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

/// Score predictions against ground truth.
///
/// Fails with [`FaqError::LengthMismatch`] when the sequences differ in
/// length. An empty input yields all-zero metrics.
pub fn evaluate<T, P>(truth: &[T], predicted: &[Option<P>]) -> Result<EvalResult>
where
    T: AsRef<str>,
    P: AsRef<str>,
{
    if truth.len() != predicted.len() {
        return Err(FaqError::LengthMismatch {
            truth: truth.len(),
            predicted: predicted.len(),
        });
    }

    let n = truth.len();
    if n == 0 {
        return Ok(EvalResult::default());
    }

    let answered = predicted.iter().filter(|p| p.is_some()).count();

    let mut per_class: HashMap<Class<'_>, Counts> = HashMap::new();
    let mut correct = 0usize;

    for (actual, guess) in truth.iter().zip(predicted) {
        let actual = Class::Label(actual.as_ref());
        let guess = match guess {
            Some(label) => Class::Label(label.as_ref()),
            None => Class::Abstain,
        };

        if actual == guess {
            correct += 1;
            per_class.entry(actual).or_default().true_positive += 1;
        } else {
            per_class.entry(guess).or_default().false_positive += 1;
            per_class.entry(actual).or_default().false_negative += 1;
        }
    }

    let (tp, fp, fn_) = per_class.values().fold((0, 0, 0), |(tp, fp, fn_), c| {
        (
            tp + c.true_positive,
            fp + c.false_positive,
            fn_ + c.false_negative,
        )
    });

    Ok(EvalResult {
        accuracy_at_1: ratio(correct, n),
        precision: ratio(tp, tp + fp),
        recall: ratio(tp, tp + fn_),
        coverage: ratio(answered, n),
    })
}

/// Division with zero-division defined as 0.0.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstention_counts_as_miss() {
        let result = evaluate(&["a", "b"], &[Some("a"), None]).unwrap();
        assert_eq!(result.accuracy_at_1, 0.5);
        assert_eq!(result.coverage, 0.5);
        assert_eq!(result.precision, 0.5);
        assert_eq!(result.recall, 0.5);
    }

    #[test]
    fn test_full_and_zero_coverage() {
        let all = evaluate(&["a", "b", "c"], &[Some("a"), Some("c"), Some("c")]).unwrap();
        assert_eq!(all.coverage, 1.0);
        assert!((all.accuracy_at_1 - 2.0 / 3.0).abs() < 1e-12);

        let none = evaluate(&["a", "b"], &[None::<&str>, None]).unwrap();
        assert_eq!(none.coverage, 0.0);
        assert_eq!(none.accuracy_at_1, 0.0);
        assert_eq!(none.precision, 0.0);
        assert_eq!(none.recall, 0.0);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let empty: [&str; 0] = [];
        let result = evaluate(&empty, &[] as &[Option<&str>]).unwrap();
        assert_eq!(result, EvalResult::default());
    }

    #[test]
    fn test_length_mismatch() {
        let err = evaluate(&["a", "b"], &[Some("a")]).unwrap_err();
        assert!(matches!(
            err,
            FaqError::LengthMismatch {
                truth: 2,
                predicted: 1
            }
        ));
    }

    #[test]
    fn test_sentinel_like_label_is_not_an_abstention() {
        // A real label spelled like a placeholder must not match an abstention.
        let result = evaluate(&["__NONE__"], &[None::<String>]).unwrap();
        assert_eq!(result.accuracy_at_1, 0.0);

        let result = evaluate(&["__NONE__"], &[Some("__NONE__")]).unwrap();
        assert_eq!(result.accuracy_at_1, 1.0);
    }

    #[test]
    fn test_owned_strings() {
        let truth = vec!["pay".to_string(), "login".to_string()];
        let predicted = vec![Some("pay".to_string()), Some("pay".to_string())];
        let result = evaluate(&truth, &predicted).unwrap();
        assert_eq!(result.accuracy_at_1, 0.5);
        assert_eq!(result.coverage, 1.0);
    }
}
