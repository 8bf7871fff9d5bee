/**
This modules gives a few tools to prettyprint the per-fold and per-label
metrics as if they were collected into a dataframe.
*/
use serde::{Deserialize, Serialize};
use std::cmp::PartialOrd;
use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// The reporter holds the metrics of the individual folds and the cross-fold
/// totals. It can be used to display the results (i.e. prettyprint them) as if
/// they were collected into a dataframe and can be consumed to obtain a
/// `HashSet` containing the metrics. Reporters are built by the
/// `cross_validation_report` and `label_report` functions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Reporter {
    pub(crate) rows: BTreeSet<FoldMetricsInner>,
}

/// By converting the reporter into a `HashSet` of `FoldMetrics`, you lose the
/// ordering implemented for the reporter. If you mean to consume the data
/// without prettyprinting it, this is not a problem.
impl From<Reporter> for HashSet<FoldMetrics> {
    fn from(value: Reporter) -> Self {
        value.rows.into_iter().map(FoldMetrics::from).collect()
    }
}

impl Reporter {
    pub(crate) fn insert(&mut self, metrics: FoldMetricsInner) -> bool {
        self.rows.insert(metrics)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The Reporter struct acts as a dataframe when displayed: fold rows in
/// ascending fold order first, total rows last.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Subset, Label, Precision, Recall, F1-score, Support")?;
        for row in self.rows.iter() {
            writeln!(f, "{}", row)?
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Datastructure holding the metrics of one fold (or of one label within a
/// fold).
pub struct FoldMetrics {
    /// The fold these metrics belong to, or the cross-fold total.
    pub subset: Subset,
    /// The entity label, such as "PER" or "LOC", or `None` for the overall
    /// metrics of the subset.
    pub label: Option<String>,
    /// Precision metric
    pub precision: f64,
    /// Recall metric
    pub recall: f64,
    /// F1-score metric
    pub fscore: f64,
    /// Number of gold annotations backing the metrics
    pub support: usize,
}

impl Hash for FoldMetrics {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.subset.hash(state);
        self.label.hash(state)
    }
}

impl PartialEq for FoldMetrics {
    fn eq(&self, other: &Self) -> bool {
        self.subset == other.subset && self.label == other.label
    }
}
impl Eq for FoldMetrics {}

impl From<FoldMetricsInner> for FoldMetrics {
    fn from(value: FoldMetricsInner) -> Self {
        Self {
            subset: value.subset,
            label: value.label,
            precision: value.precision,
            recall: value.recall,
            fscore: value.fscore,
            support: value.support,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
/// FoldMetricsInner hold the metrics for a single row of the report. They
/// can't be constructed explicitely and they implement a special version of
/// the `Display` trait, allowing them to be treated as the line of a
/// dataframe. Identity (equality and ordering) is decided by the subset and
/// the label only.
pub(crate) struct FoldMetricsInner {
    pub(crate) subset: Subset,
    pub(crate) label: Option<String>,
    pub(crate) precision: f64,
    pub(crate) recall: f64,
    pub(crate) fscore: f64,
    pub(crate) support: usize,
}

impl PartialEq for FoldMetricsInner {
    fn eq(&self, other: &Self) -> bool {
        self.subset == other.subset && self.label == other.label
    }
}
impl Eq for FoldMetricsInner {}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for FoldMetricsInner {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match self.subset.cmp(&other.subset) {
            std::cmp::Ordering::Equal => self.label.partial_cmp(&other.label),
            v => Some(v),
        }
    }
}

impl Ord for FoldMetricsInner {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

/// The FoldMetricsInner struct acts as a line in a dataframe when displayed.
impl Display for FoldMetricsInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self.label.as_deref().unwrap_or("Overall");
        write!(
            f,
            "{}, {}, {}, {}, {}, {}",
            self.subset, label, self.precision, self.recall, self.fscore, self.support
        )
    }
}

/// Identifier of a report row: one fold of the cross-validation (numbered
/// from 1) or the cross-fold total. Fold numbers are plain integers, never
/// strings. &str can be parsed to create a `Subset`.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize)]
pub enum Subset {
    Fold(usize),
    Total,
}

impl Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fold(number) => write!(f, "{}", number),
            Self::Total => write!(f, "Total"),
        }
    }
}

impl FromStr for Subset {
    type Err = SubsetParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("total") {
            return Ok(Subset::Total);
        }
        match s.parse::<usize>() {
            Ok(number) if number > 0 => Ok(Subset::Fold(number)),
            _ => Err(SubsetParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct SubsetParsingError(String);
impl Display for SubsetParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into a Subset",
            self.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_rows_are_ordered_folds_then_total() {
        let mut reporter = Reporter::default();
        reporter.insert(FoldMetricsInner {
            subset: Subset::Total,
            label: None,
            precision: 1.0,
            recall: 1.0,
            fscore: 1.0,
            support: 4,
        });
        reporter.insert(FoldMetricsInner {
            subset: Subset::Fold(2),
            label: None,
            precision: 1.0,
            recall: 1.0,
            fscore: 1.0,
            support: 2,
        });
        reporter.insert(FoldMetricsInner {
            subset: Subset::Fold(1),
            label: None,
            precision: 1.0,
            recall: 1.0,
            fscore: 1.0,
            support: 2,
        });
        let subsets: Vec<Subset> = reporter.rows.iter().map(|r| r.subset).collect();
        assert_eq!(subsets, vec![Subset::Fold(1), Subset::Fold(2), Subset::Total]);
    }

    #[test]
    fn test_overall_row_sorts_before_labels() {
        let mut reporter = Reporter::default();
        reporter.insert(FoldMetricsInner {
            subset: Subset::Fold(1),
            label: Some(String::from("LOC")),
            precision: 1.0,
            recall: 1.0,
            fscore: 1.0,
            support: 1,
        });
        reporter.insert(FoldMetricsInner {
            subset: Subset::Fold(1),
            label: None,
            precision: 1.0,
            recall: 1.0,
            fscore: 1.0,
            support: 1,
        });
        let labels: Vec<Option<&str>> = reporter
            .rows
            .iter()
            .map(|r| r.label.as_deref())
            .collect();
        assert_eq!(labels, vec![None, Some("LOC")]);
    }

    #[rstest]
    #[case("total", Subset::Total)]
    #[case("Total", Subset::Total)]
    #[case("3", Subset::Fold(3))]
    fn test_subset_from_str(#[case] input: &str, #[case] expected: Subset) {
        assert_eq!(input.parse::<Subset>().unwrap(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("fold")]
    #[case("-1")]
    fn test_subset_from_str_fails(#[case] input: &str) {
        assert!(input.parse::<Subset>().is_err());
    }
}
