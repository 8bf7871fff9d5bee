/*!
This library divides an annotated document corpus into cross-validation folds
whose entity-label distributions stay close to the corpus-wide distribution,
and aggregates the per-fold evaluation results back into precision, recall and
F1-score tables. It was built for NER experiments over historical Estonian
parish court protocols, where the gold corpus is small and unevenly annotated,
but nothing in it is specific to that corpus.

# DIVISION
A division run has three steps:
* An initial partition of the ordered document list into N folds, either by
    contiguous chunking or by seeded random shuffling.
* A greedy local-search pass over the two largest folds, swapping document
    pairs whenever the swap lowers the deviation score of both folds at once.
* A redistribution pass moving hand-tagged documents out of a designated
    fold, accepting only swaps that do not regress either fold's score beyond
    a small tolerance.

The folds partition the corpus (every document in exactly one fold) before and
after every swap.

# Terminology
* A label is an entity class we are interested in, such as 'LOC' for
    location, 'PER' for person or 'ORG' for organisation. It can be anything,
    but must be represented by a string.
* The ideal distribution is the corpus-wide percentage breakdown of labels.
    It is computed once per division run and acts as the balancing target for
    every fold.
* The score of a fold is the summed absolute deviation between the fold's
    label percentages and the ideal distribution. Lower is better; 0 is a
    perfect match.
* A hand-tagged document is one whose annotations were created manually.
    Hand-tagged documents are subject to a placement rule across folds and are
    moved out of the designated fold when possible.
*/

mod config;
mod corpus;
mod division;
mod metrics;
mod reporter;
mod stats;
mod tokens;

// The public api starts here
pub use corpus::{parse_hand_tagged_ids, Corpus, Document, DuplicateDocumentError};

pub use stats::{
    CorpusStats, Distribution, MissingDocumentError, ParsingProportionModeError, ProportionMode,
};

pub use division::{
    balance, divide, even_chunks, random_chunks, redistribute_hand_tagged, BalancePasses,
    Division, DivisionError, DivisionParseError, InitialPartition,
};

pub use config::{DivisionConfig, DivisionConfigBuilder, DEFAULT_FOLDS, DEFAULT_TOLERANCE};

pub use metrics::{
    cross_validation_report, label_report, precision_recall_fscore, EvalCounts, FloatExt,
    FoldOutcome,
};

pub use reporter::{FoldMetrics, Reporter, Subset, SubsetParsingError};

pub use tokens::{Span, SplitPattern, TokenSplitError, TokenSplitter};

/// Main entrypoint of the foldev library. This function divides the corpus
/// into the configured number of folds: initial partition, one balancing run
/// over the two largest folds and, when the corpus holds hand-tagged
/// documents, the redistribution pass over the designated fold. Instead of
/// taking in the raw parameters, this function takes a `DivisionConfig`
/// struct and uses sensible defaults.
///
/// * `corpus`: The annotated documents to divide
/// * `config`: Parameters used to divide the corpus.
///
/// #Example
/// ```rust
/// use foldev::{divide_corpus_conf, Corpus, Document, DivisionConfigBuilder};
///
/// let corpus = Corpus::from_documents(vec![
///     Document::from_label_counts("d1.json", [("ORG", 2)]),
///     Document::from_label_counts("d2.json", [("PER", 2)]),
///     Document::from_label_counts("d3.json", [("ORG", 1), ("PER", 1)]),
///     Document::from_label_counts("d4.json", [("PER", 2)]),
/// ])
/// .unwrap();
/// let config = DivisionConfigBuilder::default().n_folds(2).build();
///
/// let division = divide_corpus_conf(&corpus, config).unwrap();
/// assert_eq!(division.n_folds(), 2);
/// assert_eq!(division.len(), 4);
/// assert!(division.is_partition_of(&corpus));
/// ```
pub fn divide_corpus_conf(
    corpus: &Corpus,
    config: DivisionConfig,
) -> Result<Division, DivisionError> {
    divide(corpus, &config)
}
