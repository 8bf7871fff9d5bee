use crate::reporter::{FoldMetricsInner, Reporter, Subset};
/**
This module aggregates the strict-match evaluation counts of the
cross-validation folds into precision, recall and F1-score metrics, per fold
and across folds. Every quotient with a zero denominator is defined as 0, so
an empty fold or an unseen label never aborts the aggregation.
*/
use ahash::HashMap as AHashMap;
use itertools::multizip;
use ndarray::Array1;
use num::Float;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Internal extension trait for Num's Float trait
pub trait FloatExt: Float + Debug {}

impl<T: Float + Debug> FloatExt for T {}

/// Strict-match counts of one evaluation run: `correct` is the number of
/// predicted entities matching a gold entity exactly, `actual` the number of
/// predicted entities and `possible` the number of gold entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvalCounts {
    pub correct: usize,
    pub actual: usize,
    pub possible: usize,
}

impl EvalCounts {
    pub fn new(correct: usize, actual: usize, possible: usize) -> Self {
        Self {
            correct,
            actual,
            possible,
        }
    }

    /// Accumulates another count set into this one.
    pub fn absorb(&mut self, other: &EvalCounts) {
        self.correct += other.correct;
        self.actual += other.actual;
        self.possible += other.possible;
    }
}

fn safe_div<F: FloatExt>(numerator: F, denominator: F) -> F {
    if denominator == F::zero() {
        F::zero()
    } else {
        numerator / denominator
    }
}

/// Computes precision, recall and F1-score from strict-match counts:
/// `precision = correct / actual`, `recall = correct / possible` and
/// `f1 = 2pr / (p + r)`, with every zero denominator guarded to 0.
pub fn precision_recall_fscore<F: FloatExt>(counts: &EvalCounts) -> (F, F, F) {
    let cast = |value: usize| {
        F::from(value).expect("Casting from usize to float should always be possible")
    };
    let precision = safe_div(cast(counts.correct), cast(counts.actual));
    let recall = safe_div(cast(counts.correct), cast(counts.possible));
    let two = F::one() + F::one();
    let fscore = safe_div(two * precision * recall, precision + recall);
    (precision, recall, fscore)
}

/// The evaluation outcome of one cross-validation fold: the overall
/// strict-match counts plus the counts broken down by entity label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldOutcome {
    fold: usize,
    overall: EvalCounts,
    per_label: AHashMap<String, EvalCounts>,
}

impl FoldOutcome {
    pub fn new(fold: usize, overall: EvalCounts) -> Self {
        Self {
            fold,
            overall,
            per_label: AHashMap::default(),
        }
    }

    pub fn insert_label<S: Into<String>>(&mut self, label: S, counts: EvalCounts) {
        self.per_label.insert(label.into(), counts);
    }

    pub fn fold(&self) -> usize {
        self.fold
    }

    pub fn overall(&self) -> &EvalCounts {
        &self.overall
    }

    pub fn label(&self, label: &str) -> Option<&EvalCounts> {
        self.per_label.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &EvalCounts)> {
        self.per_label.iter().map(|(l, c)| (l.as_str(), c))
    }
}

/// Builds the per-fold report: one row per fold with its overall metrics,
/// plus a `Total` row computed micro-style from the counts of every fold
/// summed together.
pub fn cross_validation_report(outcomes: &[FoldOutcome]) -> Reporter {
    let mut reporter = Reporter::default();
    let mut total = EvalCounts::default();
    for outcome in outcomes {
        total.absorb(&outcome.overall);
        let (precision, recall, fscore) = precision_recall_fscore::<f64>(&outcome.overall);
        reporter.insert(FoldMetricsInner {
            subset: Subset::Fold(outcome.fold),
            label: None,
            precision,
            recall,
            fscore,
            support: outcome.overall.possible,
        });
    }
    let (precision, recall, fscore) = precision_recall_fscore::<f64>(&total);
    reporter.insert(FoldMetricsInner {
        subset: Subset::Total,
        label: None,
        precision,
        recall,
        fscore,
        support: total.possible,
    });
    reporter
}

/// Builds the per-label report: one row per (fold, label) pair, plus a
/// `Total` row per label whose metrics are the plain mean over the folds in
/// which the label was evaluated and whose support is the summed gold count.
pub fn label_report(outcomes: &[FoldOutcome]) -> Reporter {
    let mut reporter = Reporter::default();
    let mut per_label: BTreeMap<String, (Vec<f64>, Vec<f64>, Vec<f64>, usize)> = BTreeMap::new();
    for outcome in outcomes {
        for (label, counts) in &outcome.per_label {
            let (precision, recall, fscore) = precision_recall_fscore::<f64>(counts);
            reporter.insert(FoldMetricsInner {
                subset: Subset::Fold(outcome.fold),
                label: Some(label.clone()),
                precision,
                recall,
                fscore,
                support: counts.possible,
            });
            let entry = per_label.entry(label.clone()).or_default();
            entry.0.push(precision);
            entry.1.push(recall);
            entry.2.push(fscore);
            entry.3 += counts.possible;
        }
    }
    let mut labels = Vec::with_capacity(per_label.len());
    let mut precisions = Vec::with_capacity(per_label.len());
    let mut recalls = Vec::with_capacity(per_label.len());
    let mut fscores = Vec::with_capacity(per_label.len());
    let mut supports = Vec::with_capacity(per_label.len());
    for (label, (precision, recall, fscore, support)) in per_label {
        labels.push(label);
        precisions.push(Array1::from_vec(precision).mean().unwrap_or(0.0));
        recalls.push(Array1::from_vec(recall).mean().unwrap_or(0.0));
        fscores.push(Array1::from_vec(fscore).mean().unwrap_or(0.0));
        supports.push(support);
    }
    for (label, precision, recall, fscore, support) in
        multizip((labels, precisions, recalls, fscores, supports))
    {
        reporter.insert(FoldMetricsInner {
            subset: Subset::Total,
            label: Some(label),
            precision,
            recall,
            fscore,
            support,
        });
    }
    reporter
}
