/**
This module reworks the token-splitting step of the preprocessing pipeline as
an explicit configuration object. The historical protocols often glue two
words together ("maapeal", "kohtowannemJaak"), and the annotation pipeline
fixes the worst offenders by splitting tokens on hand-curated regex patterns.
Every pattern must carry a named capture group marking where the token breaks;
the splitter is a plain value constructed once and passed by reference, with
no import-time side effects.
*/
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::Display;

/// A half-open byte span `[start, end)` into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug)]
/// Enum error encompassing the failures that can happen when building a token
/// splitter.
pub enum TokenSplitError {
    /// The break group name was empty.
    EmptyBreakGroup,
    /// The pattern does not contain the named break group.
    MissingBreakGroup { pattern: String, group: String },
    /// The pattern is not a valid regular expression.
    BadPattern(regex::Error),
}

impl Display for TokenSplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBreakGroup => write!(f, "The break group name should be non-empty"),
            Self::MissingBreakGroup { pattern, group } => write!(
                f,
                "The pattern ({}) is missing the symbolic group named ({})",
                pattern, group
            ),
            Self::BadPattern(regex_err) => std::fmt::Display::fmt(regex_err, f),
        }
    }
}
impl Error for TokenSplitError {}

impl From<regex::Error> for TokenSplitError {
    fn from(value: regex::Error) -> Self {
        Self::BadPattern(value)
    }
}

/// One splitting rule: a compiled regular expression and the name of the
/// capture group whose end marks the break point.
#[derive(Debug, Clone)]
pub struct SplitPattern {
    regex: Regex,
    break_group: String,
}

impl SplitPattern {
    /// Compiles the pattern and validates that it contains the named break
    /// group.
    pub fn new(pattern: &str, break_group: &str) -> Result<Self, TokenSplitError> {
        if break_group.is_empty() {
            return Err(TokenSplitError::EmptyBreakGroup);
        }
        let regex = Regex::new(pattern)?;
        let has_group = regex
            .capture_names()
            .flatten()
            .any(|name| name == break_group);
        if !has_group {
            return Err(TokenSplitError::MissingBreakGroup {
                pattern: pattern.to_string(),
                group: break_group.to_string(),
            });
        }
        Ok(Self {
            regex,
            break_group: break_group.to_string(),
        })
    }

    /// The break point of `token` under this pattern: the end offset of the
    /// break group, when it falls strictly inside the token.
    fn break_point(&self, token: &str) -> Option<usize> {
        let captures = self.regex.captures(token)?;
        let group = captures.name(&self.break_group)?;
        let end = group.end();
        if end > 0 && end < token.len() {
            Some(end)
        } else {
            None
        }
    }
}

/// Splits tokens into smaller tokens based on regular expression patterns.
/// Patterns are tried in order and a token is split at most once per pass.
#[derive(Debug, Clone, Default)]
pub struct TokenSplitter {
    patterns: Vec<SplitPattern>,
}

impl TokenSplitter {
    pub fn new(patterns: Vec<SplitPattern>) -> Self {
        Self { patterns }
    }

    /// Builds a splitter from `(pattern, break_group)` pairs, failing on the
    /// first invalid pattern.
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, TokenSplitError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let patterns = patterns
            .into_iter()
            .map(|(pattern, group)| SplitPattern::new(pattern, group))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    /// Rewrites the token spans of `text`: a token matched by one of the
    /// patterns is replaced by the two halves on either side of the break
    /// point. Spans that do not fall on valid boundaries of `text` are kept
    /// unchanged. Pure function of its inputs.
    pub fn split(&self, text: &str, spans: &[Span]) -> Vec<Span> {
        let mut result = Vec::with_capacity(spans.len());
        for span in spans {
            let token = match text.get(span.start..span.end) {
                Some(token) => token,
                None => {
                    result.push(*span);
                    continue;
                }
            };
            let break_point = self
                .patterns
                .iter()
                .find_map(|pattern| pattern.break_point(token));
            match break_point {
                Some(end) => {
                    result.push(Span::new(span.start, span.start + end));
                    result.push(Span::new(span.start + end, span.end));
                }
                None => result.push(*span),
            }
        }
        result
    }
}
