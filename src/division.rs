/**
This module divides a corpus into cross-validation folds: the initial
contiguous or random partition, the pairwise swap primitive, the greedy
local-search balancer and the hand-tagged redistribution pass. The finalized
fold assignment is returned as a `Division`, which persists to (and parses
from) the `filename:fold_number` line format consumed by the downstream
training and evaluation collaborators.
*/
use crate::config::DivisionConfig;
use crate::corpus::Corpus;
use crate::stats::{CorpusStats, Distribution, MissingDocumentError, ProportionMode};
use ahash::HashSet as AHashSet;
use enum_iterator::Sequence;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;
use std::mem;
use std::str::FromStr;

/// How the initial folds are formed, before any balancing. The reference
/// random division emitted N full-length permutations of the corpus instead
/// of N disjoint folds; `Random` here shuffles once and chunks the shuffled
/// order, so its folds always partition the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitialPartition {
    /// Split the ordered document list into N contiguous, nearly-even chunks.
    Contiguous,
    /// Shuffle the document list, then chunk the shuffled order. Pass a seed
    /// for a reproducible division.
    Random { seed: Option<u64> },
}

impl Default for InitialPartition {
    fn default() -> Self {
        Self::Contiguous
    }
}

/// Whether the balancer stops after one full double pass (the reference
/// semantics) or repeats passes until none of the candidate swaps improves
/// both folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
pub enum BalancePasses {
    Single,
    ToConvergence,
}

impl Default for BalancePasses {
    fn default() -> Self {
        Self::Single
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enum error encompassing the failures that can happen while dividing a
/// corpus into folds.
pub enum DivisionError {
    /// The requested number of folds was zero.
    NoFolds,
    /// A subset referenced a document missing from the label statistics.
    MissingDocument(MissingDocumentError),
    /// The configured designated fold does not exist in the division.
    DesignatedFoldOutOfRange { fold: usize, n_folds: usize },
}

impl Display for DivisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoFolds => write!(f, "Cannot divide a corpus into zero folds"),
            Self::MissingDocument(missing_err) => std::fmt::Display::fmt(missing_err, f),
            Self::DesignatedFoldOutOfRange { fold, n_folds } => write!(
                f,
                "The designated fold ({}) is out of range: the division has {} folds",
                fold, n_folds
            ),
        }
    }
}
impl Error for DivisionError {}

impl From<MissingDocumentError> for DivisionError {
    fn from(value: MissingDocumentError) -> Self {
        Self::MissingDocument(value)
    }
}

/// Swaps the element at `i` of `a` with the element at `j` of `b`. Applying
/// the same swap twice restores both slices.
pub(crate) fn swap_between<T>(a: &mut [T], b: &mut [T], i: usize, j: usize) {
    mem::swap(&mut a[i], &mut b[j]);
}

/// Splits `items` into `n` contiguous chunks with boundaries at
/// `round(i * len / n)`, ties rounded to even as in the reference. The chunk
/// sizes always sum to `items.len()` and differ from each other by at most
/// one.
pub fn even_chunks<T: Clone>(items: &[T], n: usize) -> Result<Vec<Vec<T>>, DivisionError> {
    if n == 0 {
        return Err(DivisionError::NoFolds);
    }
    let len = items.len() as f64;
    let mut chunks = Vec::with_capacity(n);
    let mut last = 0usize;
    for i in 1..=n {
        let current = (i as f64 * len / n as f64).round_ties_even() as usize;
        chunks.push(items[last..current].to_vec());
        last = current;
    }
    Ok(chunks)
}

/// Shuffles `items` and splits the shuffled order into `n` disjoint chunks.
/// Without a seed, every invocation produces a different division.
pub fn random_chunks<T: Clone>(
    items: &[T],
    n: usize,
    seed: Option<u64>,
) -> Result<Vec<Vec<T>>, DivisionError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut rng);
    even_chunks(&shuffled, n)
}

/// Greedy local-search balancer. Attempts every pairwise swap of one document
/// from `a` with one document from `b` and keeps a swap only when it lowers
/// the score of *both* folds; every other swap is reverted on the spot. Both
/// folds are mutated in place. Returns the number of accepted swaps.
pub fn balance(
    a: &mut [String],
    b: &mut [String],
    stats: &CorpusStats,
    ideal: &Distribution,
    mode: ProportionMode,
    passes: BalancePasses,
) -> Result<usize, DivisionError> {
    let mut accepted_total = 0;
    loop {
        let accepted = balance_pass(a, b, stats, ideal, mode)?;
        accepted_total += accepted;
        match passes {
            BalancePasses::Single => break,
            BalancePasses::ToConvergence if accepted == 0 => break,
            BalancePasses::ToConvergence => continue,
        }
    }
    Ok(accepted_total)
}

/// One full O(|A|·|B|) double pass over the candidate swaps.
fn balance_pass(
    a: &mut [String],
    b: &mut [String],
    stats: &CorpusStats,
    ideal: &Distribution,
    mode: ProportionMode,
) -> Result<usize, MissingDocumentError> {
    let mut score_a = stats.score(a, ideal, mode)?;
    let mut score_b = stats.score(b, ideal, mode)?;
    let mut accepted = 0;
    for i in 0..a.len() {
        for j in 0..b.len() {
            swap_between(a, b, i, j);
            let new_a = stats.score(a, ideal, mode)?;
            let new_b = stats.score(b, ideal, mode)?;
            if new_a < score_a && new_b < score_b {
                score_a = new_a;
                score_b = new_b;
                accepted += 1;
            } else {
                swap_between(a, b, i, j);
            }
        }
    }
    Ok(accepted)
}

/// Moves hand-tagged documents out of the designated fold. For each
/// hand-tagged document, the other folds are scanned in order for a
/// non-hand-tagged candidate whose swap either improves both scores or keeps
/// both within `tolerance` of their old value; the first such swap is kept.
/// A document with no acceptable candidate anywhere stays put, silently.
/// Returns the number of documents moved.
pub fn redistribute_hand_tagged(
    folds: &mut [Vec<String>],
    designated: usize,
    hand_tagged: &AHashSet<String>,
    stats: &CorpusStats,
    ideal: &Distribution,
    mode: ProportionMode,
    tolerance: f64,
) -> Result<usize, DivisionError> {
    if designated >= folds.len() {
        return Err(DivisionError::DesignatedFoldOutOfRange {
            fold: designated + 1,
            n_folds: folds.len(),
        });
    }
    let mut target = mem::take(&mut folds[designated]);
    let result = redistribute_inner(
        &mut target,
        folds,
        designated,
        hand_tagged,
        stats,
        ideal,
        mode,
        tolerance,
    );
    folds[designated] = target;
    result
}

#[allow(clippy::too_many_arguments)]
fn redistribute_inner(
    target: &mut [String],
    others: &mut [Vec<String>],
    designated: usize,
    hand_tagged: &AHashSet<String>,
    stats: &CorpusStats,
    ideal: &Distribution,
    mode: ProportionMode,
    tolerance: f64,
) -> Result<usize, DivisionError> {
    let pinned: Vec<String> = target
        .iter()
        .filter(|id| hand_tagged.contains(*id))
        .cloned()
        .collect();
    let mut moved = 0;
    for document in pinned {
        // Earlier accepted swaps may have shifted positions.
        let index = match target.iter().position(|id| *id == document) {
            Some(index) => index,
            None => continue,
        };
        let score_old = stats.score(target, ideal, mode)?;
        'folds: for (f, fold) in others.iter_mut().enumerate() {
            if f == designated {
                continue;
            }
            let fold_score_old = stats.score(fold, ideal, mode)?;
            for j in 0..fold.len() {
                if hand_tagged.contains(&fold[j]) {
                    continue;
                }
                swap_between(target, fold, index, j);
                let score_new = stats.score(target, ideal, mode)?;
                let fold_score_new = stats.score(fold, ideal, mode)?;
                let improves = score_new < score_old && fold_score_new < fold_score_old;
                let within_tolerance = (score_new - score_old).abs() < tolerance
                    && (fold_score_new - fold_score_old).abs() < tolerance;
                if improves || within_tolerance {
                    moved += 1;
                    break 'folds;
                }
                swap_between(target, fold, index, j);
            }
        }
    }
    Ok(moved)
}

/// A finalized fold assignment: the folds partition the corpus the division
/// was computed from. Folds are numbered from 1, matching the persisted
/// format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Division {
    folds: Vec<Vec<String>>,
}

impl Division {
    pub(crate) fn new(folds: Vec<Vec<String>>) -> Self {
        Self { folds }
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Total number of documents across all folds.
    pub fn len(&self) -> usize {
        self.folds.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.iter().all(Vec::is_empty)
    }

    /// The documents of fold `number` (numbered from 1).
    pub fn fold(&self, number: usize) -> Option<&[String]> {
        if number == 0 {
            return None;
        }
        self.folds.get(number - 1).map(Vec::as_slice)
    }

    pub fn folds(&self) -> impl Iterator<Item = &[String]> {
        self.folds.iter().map(Vec::as_slice)
    }

    /// The fold number (from 1) holding the given document, if any.
    pub fn fold_of(&self, id: &str) -> Option<usize> {
        self.folds
            .iter()
            .position(|fold| fold.iter().any(|d| d == id))
            .map(|i| i + 1)
    }

    /// Checks that the folds hold exactly the documents of `corpus`, each
    /// exactly once.
    pub fn is_partition_of(&self, corpus: &Corpus) -> bool {
        let mut seen: AHashSet<&str> = AHashSet::default();
        for fold in &self.folds {
            for id in fold {
                if corpus.get(id).is_none() || !seen.insert(id.as_str()) {
                    return false;
                }
            }
        }
        seen.len() == corpus.len()
    }
}

/// The persisted assignment format: one `filename:fold_number` line per
/// document.
impl Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (k, fold) in self.folds.iter().enumerate() {
            for id in fold {
                writeln!(f, "{}:{}", id, k + 1)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error type returned when parsing a persisted fold assignment fails. Line
/// numbers start at 1.
pub enum DivisionParseError {
    MissingSeparator { line: usize },
    InvalidFoldNumber { line: usize, value: String },
    ZeroFoldNumber { line: usize },
    FoldNumberOutOfRange { line: usize, fold: usize, max: usize },
}

impl Display for DivisionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSeparator { line } => {
                write!(f, "Line {} is missing the `:` separator", line)
            }
            Self::InvalidFoldNumber { line, value } => {
                write!(
                    f,
                    "Impossible to parse the fold number ({}) on line {}",
                    value, line
                )
            }
            Self::ZeroFoldNumber { line } => {
                write!(f, "Line {} uses fold number 0; folds are numbered from 1", line)
            }
            Self::FoldNumberOutOfRange { line, fold, max } => {
                write!(
                    f,
                    "Line {} uses fold number {}, but a {}-line assignment can hold at most {} folds",
                    line, fold, max, max
                )
            }
        }
    }
}
impl Error for DivisionParseError {}

impl FromStr for Division {
    type Err = DivisionParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A valid assignment holds at least one document per fold, so a fold
        // number above the line count can only come from a corrupt file.
        // Rejecting it keeps the allocation below proportional to the input.
        let max_fold = s.lines().count();
        let mut folds: Vec<Vec<String>> = Vec::new();
        for (i, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (id, fold) = line
                .rsplit_once(':')
                .ok_or(DivisionParseError::MissingSeparator { line: i + 1 })?;
            let fold: usize =
                fold.parse()
                    .map_err(|_| DivisionParseError::InvalidFoldNumber {
                        line: i + 1,
                        value: fold.to_string(),
                    })?;
            if fold == 0 {
                return Err(DivisionParseError::ZeroFoldNumber { line: i + 1 });
            }
            if fold > max_fold {
                return Err(DivisionParseError::FoldNumberOutOfRange {
                    line: i + 1,
                    fold,
                    max: max_fold,
                });
            }
            if folds.len() < fold {
                folds.resize_with(fold, Vec::new);
            }
            folds[fold - 1].push(id.to_string());
        }
        Ok(Self { folds })
    }
}

/// Indices of the two largest folds, ties broken by the lower index. The
/// returned pair is ordered by index.
fn two_largest(folds: &[Vec<String>]) -> (usize, usize) {
    let mut largest = 0;
    for (i, fold) in folds.iter().enumerate() {
        if fold.len() > folds[largest].len() {
            largest = i;
        }
    }
    let mut second = usize::MAX;
    for (i, fold) in folds.iter().enumerate() {
        if i == largest {
            continue;
        }
        if second == usize::MAX || fold.len() > folds[second].len() {
            second = i;
        }
    }
    if largest < second {
        (largest, second)
    } else {
        (second, largest)
    }
}

/// Divides `corpus` into the configured number of folds: initial partition,
/// one balancing run over the two largest folds, then, if the corpus holds
/// hand-tagged documents, the redistribution pass over the designated fold.
/// The folds partition the corpus at every step. An empty corpus divides into
/// N empty folds.
pub fn divide(corpus: &Corpus, config: &DivisionConfig) -> Result<Division, DivisionError> {
    let n = config.n_folds();
    if n == 0 {
        return Err(DivisionError::NoFolds);
    }
    let stats = CorpusStats::collect(corpus);
    let ideal = stats.ideal_distribution();
    let mode = config.proportion_mode();
    let ids: Vec<String> = corpus.ids().map(String::from).collect();
    let mut folds = match config.partition() {
        InitialPartition::Contiguous => even_chunks(&ids, n)?,
        InitialPartition::Random { seed } => random_chunks(&ids, n, seed)?,
    };

    if n >= 2 && !corpus.is_empty() {
        let (first, second) = two_largest(&folds);
        let (left, right) = folds.split_at_mut(second);
        balance(
            &mut left[first],
            &mut right[0],
            &stats,
            &ideal,
            mode,
            config.passes(),
        )?;
    }

    let hand_tagged: AHashSet<String> = corpus
        .hand_tagged()
        .map(|d| d.id().to_string())
        .collect();
    if !hand_tagged.is_empty() {
        let designated = match config.designated_fold() {
            Some(fold) if fold >= 1 && fold <= n => fold - 1,
            Some(fold) => {
                return Err(DivisionError::DesignatedFoldOutOfRange { fold, n_folds: n })
            }
            None => fewest_hand_tagged(&folds, &hand_tagged),
        };
        redistribute_hand_tagged(
            &mut folds,
            designated,
            &hand_tagged,
            &stats,
            &ideal,
            mode,
            config.tolerance(),
        )?;
    }

    Ok(Division::new(folds))
}

/// Index of the fold holding the fewest hand-tagged documents, ties broken by
/// the lower index.
fn fewest_hand_tagged(folds: &[Vec<String>], hand_tagged: &AHashSet<String>) -> usize {
    let mut best = 0;
    let mut best_count = usize::MAX;
    for (i, fold) in folds.iter().enumerate() {
        let count = fold.iter().filter(|id| hand_tagged.contains(*id)).count();
        if count < best_count {
            best = i;
            best_count = count;
        }
    }
    best
}
