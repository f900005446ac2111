//! Routine name patterns.
//!
//! A pattern is a routine name with exactly one wildcard standing in for the
//! precision marker:
//! - `*` matches lowercase `s` (32-bit) or `d` (64-bit): `cblas_*gemm`
//! - `#` matches uppercase `S` (32-bit) or `D` (64-bit): `LAPACKE_#potrf`
//!
//! Matching is exact reconstruction: the wildcard is substituted with each of
//! its two letters and the result compared against the raw symbol name.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::function::Precision;

/// Errors raised while loading routine patterns.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern `{pattern}` has no wildcard (use `*` for s/d or `#` for S/D)")]
    MissingWildcard { pattern: String },

    #[error("pattern `{pattern}` has {count} wildcards, exactly one is allowed")]
    MultipleWildcards { pattern: String, count: usize },

    #[error("line {line}")]
    AtLine {
        line: usize,
        source: Box<PatternError>,
    },
}

/// Naming convention selected by the wildcard character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// `*`, matched by `s`/`d`
    Lower,
    /// `#`, matched by `S`/`D`
    Upper,
}

impl Convention {
    /// The wildcard character for this convention.
    pub fn marker(self) -> char {
        match self {
            Convention::Lower => '*',
            Convention::Upper => '#',
        }
    }

    /// The precision letter substituted for the wildcard.
    pub fn letter(self, precision: Precision) -> char {
        match (self, precision) {
            (Convention::Lower, Precision::Single) => 's',
            (Convention::Lower, Precision::Double) => 'd',
            (Convention::Upper, Precision::Single) => 'S',
            (Convention::Upper, Precision::Double) => 'D',
        }
    }

    fn from_marker(c: char) -> Option<Self> {
        [Convention::Lower, Convention::Upper]
            .into_iter()
            .find(|conv| conv.marker() == c)
    }
}

/// The result of matching a raw symbol against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineMatch {
    /// Raw name with the precision marker removed
    pub dispatch_name: String,
    pub precision: Precision,
    pub convention: Convention,
}

/// A routine name template with one precision wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutinePattern {
    template: String,
    /// Byte offset of the wildcard in `template`
    position: usize,
    convention: Convention,
    /// Template with the wildcard removed
    dispatch_name: String,
}

impl RoutinePattern {
    /// Parse a single pattern, rejecting templates without exactly one wildcard.
    pub fn parse(s: &str) -> Result<Self, PatternError> {
        let template = s.trim();

        let markers: Vec<(usize, Convention)> = template
            .char_indices()
            .filter_map(|(i, c)| Convention::from_marker(c).map(|conv| (i, conv)))
            .collect();

        let (position, convention) = match markers.as_slice() {
            [] => {
                return Err(PatternError::MissingWildcard {
                    pattern: template.to_string(),
                })
            }
            [single] => *single,
            many => {
                return Err(PatternError::MultipleWildcards {
                    pattern: template.to_string(),
                    count: many.len(),
                })
            }
        };

        let mut dispatch_name = String::with_capacity(template.len() - 1);
        dispatch_name.push_str(&template[..position]);
        dispatch_name.push_str(&template[position + 1..]);

        Ok(RoutinePattern {
            template: template.to_string(),
            position,
            convention,
            dispatch_name,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// The raw symbol name this pattern selects for `precision`.
    pub fn expand(&self, precision: Precision) -> String {
        let mut name = String::with_capacity(self.template.len());
        name.push_str(&self.template[..self.position]);
        name.push(self.convention.letter(precision));
        name.push_str(&self.template[self.position + 1..]);
        name
    }

    /// Match a raw symbol name against this pattern.
    pub fn matches(&self, raw_name: &str) -> Option<RoutineMatch> {
        // Cheap reject before building the candidates.
        if raw_name.len() != self.template.len() {
            return None;
        }

        [Precision::Single, Precision::Double]
            .into_iter()
            .find(|&precision| self.expand(precision) == raw_name)
            .map(|precision| RoutineMatch {
                dispatch_name: self.dispatch_name.clone(),
                precision,
                convention: self.convention,
            })
    }
}

impl fmt::Display for RoutinePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// The ordered list of patterns requested for a generation run.
///
/// Order is significant: when a name matches several patterns the first one
/// in the list decides the dispatch name and precision.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<RoutinePattern>,
}

impl PatternSet {
    /// Parse a pattern list, one pattern per line. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let mut patterns = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let pattern = RoutinePattern::parse(line).map_err(|e| PatternError::AtLine {
                line: idx + 1,
                source: Box::new(e),
            })?;
            patterns.push(pattern);
        }

        Ok(PatternSet { patterns })
    }

    /// Find the first pattern matching `raw_name`.
    pub fn find(&self, raw_name: &str) -> Option<RoutineMatch> {
        self.patterns.iter().find_map(|p| p.matches(raw_name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutinePattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The literal pattern strings, in input order.
    pub fn literals(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.template.clone()).collect()
    }
}
