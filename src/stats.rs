/**
This module computes the label statistics used by the corpus division: the
per-document label counts, the corpus-wide ideal distribution, the per-subset
label proportions and the deviation score of a subset against the ideal
distribution.
*/
use crate::corpus::Corpus;
use ahash::HashMap as AHashMap;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// A percentage breakdown of entity labels. Percentages sum to 100 whenever
/// the underlying count set is non-empty. Labels absent from the distribution
/// have an implicit percentage of zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Distribution {
    percentages: AHashMap<String, f64>,
}

impl Distribution {
    pub fn percentage(&self, label: &str) -> f64 {
        self.percentages.get(label).copied().unwrap_or(0.0)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.percentages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.percentages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }

    fn from_counts(counts: AHashMap<String, usize>) -> Self {
        let total: usize = counts.values().sum();
        if total == 0 {
            return Self::default();
        }
        let percentages = counts
            .into_iter()
            .map(|(label, count)| (label, count as f64 / total as f64 * 100.0))
            .collect();
        Self { percentages }
    }
}

/// How the denominator of a subset proportion is computed. The reference
/// experiment inflated the denominator by counting every label `count + 1`
/// times; `InflatedDenominator` replicates that behaviour so that published
/// experiment numbers stay reproducible, while `Exact` computes the correct
/// proportions. The default replicates the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum ProportionMode {
    /// Every label of every document contributes `count + 1` occurrences, as
    /// in the reference experiment.
    InflatedDenominator,
    /// Every label contributes exactly `count` occurrences.
    Exact,
}

impl Default for ProportionMode {
    fn default() -> Self {
        Self::InflatedDenominator
    }
}

#[derive(Debug)]
pub struct ParsingProportionModeError(String);

impl Display for ParsingProportionModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Could not parse the {} into a `ProportionMode`",
            self.0
        )
    }
}
impl Error for ParsingProportionModeError {}

impl FromStr for ProportionMode {
    type Err = ParsingProportionModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_ref() {
            "inflated" | "inflateddenominator" => Ok(ProportionMode::InflatedDenominator),
            "exact" => Ok(ProportionMode::Exact),
            _ => Err(ParsingProportionModeError(String::from(s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error returned when a subset references a document id that is absent from
/// the label statistics. This is a precondition violation of the division: the
/// caller must supply a consistent corpus.
pub struct MissingDocumentError(String);

impl MissingDocumentError {
    pub fn document_id(&self) -> &str {
        &self.0
    }
}

impl Display for MissingDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The document ({}) is referenced by a subset but is missing from the label statistics",
            self.0
        )
    }
}
impl Error for MissingDocumentError {}

/// Per-document label counts for a whole corpus, collected once before a
/// division run. All proportion and score computations are answered from this
/// structure without going back to the corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    counts: AHashMap<String, AHashMap<String, usize>>,
}

impl CorpusStats {
    /// Collects the label counts of every document. A document without any
    /// annotated span contributes an empty mapping.
    pub fn collect(corpus: &Corpus) -> Self {
        let mut counts: AHashMap<String, AHashMap<String, usize>> = AHashMap::default();
        for document in corpus.iter() {
            let document_counts = document
                .labels()
                .map(|(label, count)| (label.to_string(), count))
                .collect();
            counts.insert(document.id().to_string(), document_counts);
        }
        Self { counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The corpus-wide percentage breakdown of entity labels, computed as
    /// `count(label) / total_label_occurrences * 100` over all documents. The
    /// ideal distribution is computed once per division run and never mutated
    /// afterwards.
    pub fn ideal_distribution(&self) -> Distribution {
        let mut totals: AHashMap<String, usize> = AHashMap::default();
        for document_counts in self.counts.values() {
            for (label, count) in document_counts {
                *totals.entry(label.clone()).or_insert(0) += count;
            }
        }
        Distribution::from_counts(totals)
    }

    /// The percentage share of each label within `subset` only. Fails fast if
    /// the subset references an unknown document.
    pub fn subset_proportions<S: AsRef<str>>(
        &self,
        subset: &[S],
        mode: ProportionMode,
    ) -> Result<Distribution, MissingDocumentError> {
        let mut totals: AHashMap<String, usize> = AHashMap::default();
        for id in subset {
            let document_counts = self
                .counts
                .get(id.as_ref())
                .ok_or_else(|| MissingDocumentError(id.as_ref().to_string()))?;
            for (label, count) in document_counts {
                let occurrences = match mode {
                    ProportionMode::InflatedDenominator => count + 1,
                    ProportionMode::Exact => *count,
                };
                *totals.entry(label.clone()).or_insert(0) += occurrences;
            }
        }
        Ok(Distribution::from_counts(totals))
    }

    /// The deviation score of a subset: the sum over all labels of the ideal
    /// distribution of the absolute difference between the ideal percentage
    /// and the subset percentage. Lower is better; 0 is a perfect match. A
    /// label absent from the subset contributes its full ideal percentage.
    pub fn score<S: AsRef<str>>(
        &self,
        subset: &[S],
        ideal: &Distribution,
        mode: ProportionMode,
    ) -> Result<f64, MissingDocumentError> {
        let proportions = self.subset_proportions(subset, mode)?;
        let score = ideal
            .labels()
            .map(|label| (ideal.percentage(label) - proportions.percentage(label)).abs())
            .sum();
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use enum_iterator::all;
    use rstest::rstest;

    fn labels(pairs: &[(&str, usize)]) -> AHashMap<String, usize> {
        pairs.iter().map(|(l, c)| (l.to_string(), *c)).collect()
    }

    /// Six documents, 4 ORG and 6 PER occurrences in total.
    fn org_per_corpus() -> Corpus {
        Corpus::from_documents(vec![
            Document::new("d1", labels(&[("ORG", 2)])),
            Document::new("d2", labels(&[("PER", 2)])),
            Document::new("d3", labels(&[("ORG", 1), ("PER", 1)])),
            Document::new("d4", labels(&[("PER", 2)])),
            Document::new("d5", labels(&[("ORG", 1)])),
            Document::new("d6", labels(&[("PER", 1)])),
        ])
        .unwrap()
    }

    #[test]
    fn test_ideal_distribution() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let ideal = stats.ideal_distribution();
        assert_eq!(ideal.len(), 2);
        assert!((ideal.percentage("ORG") - 40.0).abs() < 1e-9);
        assert!((ideal.percentage("PER") - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_unlabeled_document_does_not_affect_distribution() {
        let mut corpus = org_per_corpus();
        corpus.insert(Document::new("d7", labels(&[]))).unwrap();
        let stats = CorpusStats::collect(&corpus);
        let ideal = stats.ideal_distribution();
        assert!((ideal.percentage("ORG") - 40.0).abs() < 1e-9);
        assert!((ideal.percentage("PER") - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_corpus_distribution_is_empty() {
        let stats = CorpusStats::collect(&Corpus::new());
        assert!(stats.ideal_distribution().is_empty());
    }

    #[test]
    fn test_subset_proportions_exact() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let proportions = stats
            .subset_proportions(&["d1", "d2", "d3"], ProportionMode::Exact)
            .unwrap();
        // ORG 3, PER 3 out of 6 occurrences.
        assert!((proportions.percentage("ORG") - 50.0).abs() < 1e-9);
        assert!((proportions.percentage("PER") - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_subset_proportions_inflated() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let proportions = stats
            .subset_proportions(&["d4", "d5", "d6"], ProportionMode::InflatedDenominator)
            .unwrap();
        // PER: (2+1) + (1+1) = 5, ORG: (1+1) = 2, total 7.
        assert!((proportions.percentage("PER") - 5.0 / 7.0 * 100.0).abs() < 1e-9);
        assert!((proportions.percentage("ORG") - 2.0 / 7.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_matches_hand_computation() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let ideal = stats.ideal_distribution();
        // First chunk is 50/50 against an ideal of 40/60.
        let score = stats
            .score(&["d1", "d2", "d3"], &ideal, ProportionMode::Exact)
            .unwrap();
        assert!((score - 20.0).abs() < 1e-9);
        // Second chunk is 25/75.
        let score = stats
            .score(&["d4", "d5", "d6"], &ideal, ProportionMode::Exact)
            .unwrap();
        assert!((score - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_zero_iff_distribution_matches() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let ideal = stats.ideal_distribution();
        let ids: Vec<String> = org_per_corpus().ids().map(String::from).collect();
        // The whole corpus matches the ideal distribution exactly.
        let score = stats.score(&ids, &ideal, ProportionMode::Exact).unwrap();
        assert!(score.abs() < 1e-9);
        // A skewed subset does not.
        let score = stats
            .score(&["d1", "d5"], &ideal, ProportionMode::Exact)
            .unwrap();
        assert!(score > 0.0);
    }

    #[test]
    fn test_absent_label_contributes_full_ideal_percentage() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let ideal = stats.ideal_distribution();
        // d2 only holds PER: ORG contributes |40 - 0|, PER |60 - 100|.
        let score = stats.score(&["d2"], &ideal, ProportionMode::Exact).unwrap();
        assert!((score - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_document_fails_fast() {
        let stats = CorpusStats::collect(&org_per_corpus());
        let ideal = stats.ideal_distribution();
        for mode in all::<ProportionMode>() {
            let err = stats.score(&["unknown"], &ideal, mode).unwrap_err();
            assert_eq!(err.document_id(), "unknown");
        }
    }

    #[rstest]
    #[case("inflated", ProportionMode::InflatedDenominator)]
    #[case("InflatedDenominator", ProportionMode::InflatedDenominator)]
    #[case("exact", ProportionMode::Exact)]
    fn test_proportion_mode_from_str(#[case] input: &str, #[case] expected: ProportionMode) {
        assert_eq!(input.parse::<ProportionMode>().unwrap(), expected);
    }

    #[test]
    fn test_proportion_mode_from_str_fails() {
        assert!("approximate".parse::<ProportionMode>().is_err());
    }
}
