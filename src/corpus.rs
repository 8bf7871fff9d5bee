/**
This module contains the corpus datastructures: annotated documents with their
per-label span counts, the ordered corpus itself and the hand-tagged marking
logic. The corpus preserves insertion order, since the contiguous initial
partition is defined over an ordered document list.
*/
use ahash::HashMap as AHashMap;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;

/// A single annotated document, identified by its filename. The label counts
/// map every entity label found in the document to the number of annotated
/// spans carrying it. Labels not present in the map have an implicit count of
/// zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    labels: AHashMap<String, usize>,
    hand_tagged: bool,
}

impl Document {
    pub fn new<S: Into<String>>(id: S, labels: AHashMap<String, usize>) -> Self {
        Self {
            id: id.into(),
            labels,
            hand_tagged: false,
        }
    }

    /// Convenience constructor from `(label, count)` pairs.
    pub fn from_label_counts<S, L, I>(id: S, labels: I) -> Self
    where
        S: Into<String>,
        L: Into<String>,
        I: IntoIterator<Item = (L, usize)>,
    {
        let labels = labels
            .into_iter()
            .map(|(label, count)| (label.into(), count))
            .collect();
        Self::new(id, labels)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of annotated spans carrying `label`. Zero for absent labels.
    pub fn label_count(&self, label: &str) -> usize {
        self.labels.get(label).copied().unwrap_or(0)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Total number of annotated spans in the document.
    pub fn total_labels(&self) -> usize {
        self.labels.values().sum()
    }

    pub fn is_hand_tagged(&self) -> bool {
        self.hand_tagged
    }

    pub fn set_hand_tagged(&mut self, hand_tagged: bool) {
        self.hand_tagged = hand_tagged;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Error returned when inserting a document whose id is already present in the
/// corpus.
pub struct DuplicateDocumentError(String);

impl Display for DuplicateDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The document ({}) is already present in the corpus",
            self.0
        )
    }
}
impl Error for DuplicateDocumentError {}

/// An ordered collection of documents. Lookup by id is O(1) through an
/// auxiliary index, while iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    index: AHashMap<String, usize>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a corpus from an ordered list of documents. Fails on the first
    /// duplicated id.
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, DuplicateDocumentError> {
        let mut corpus = Self::new();
        for document in documents {
            corpus.insert(document)?;
        }
        Ok(corpus)
    }

    pub fn insert(&mut self, document: Document) -> Result<(), DuplicateDocumentError> {
        if self.index.contains_key(document.id()) {
            return Err(DuplicateDocumentError(document.id().to_string()));
        }
        self.index
            .insert(document.id().to_string(), self.documents.len());
        self.documents.push(document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|i| &self.documents[*i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Document ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|d| d.id.as_str())
    }

    /// Marks as hand-tagged every document matched by one of the numeric
    /// protocol ids. An id matches a document when the filename contains the
    /// `_id<N>_` infix; ids matching zero or more than one filename are
    /// ignored. Returns the number of documents marked.
    pub fn mark_hand_tagged<S: AsRef<str>>(&mut self, ids: &[S]) -> usize {
        let mut marked = 0;
        for id in ids {
            let needle = format!("_id{}_", id.as_ref());
            let mut found: Option<usize> = None;
            let mut unique = true;
            for (i, document) in self.documents.iter().enumerate() {
                if document.id.contains(&needle) {
                    if found.is_some() {
                        unique = false;
                        break;
                    }
                    found = Some(i);
                }
            }
            if let (Some(i), true) = (found, unique) {
                self.documents[i].hand_tagged = true;
                marked += 1;
            }
        }
        marked
    }

    pub fn hand_tagged(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| d.hand_tagged)
    }
}

/// Parses the plain-text list of hand-tagged protocol ids: one id per line,
/// blank lines and the `---` sentinel line are skipped.
pub fn parse_hand_tagged_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "---")
        .map(String::from)
        .collect()
}
