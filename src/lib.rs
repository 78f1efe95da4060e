//! A regular expression engine over document spanners: compiles a pattern
//! into a variable automaton and enumerates every distinct mapping it
//! produces over a document with polynomial preprocessing and constant
//! delay between matches.

pub mod automaton;
pub mod benchmark;
pub mod error;
pub mod mapping;
mod matrix;
pub mod regex;

use std::ops::Range;

pub use automaton::VA;
pub use error::{EngineError, Result};
pub use mapping::{IndexedDag, Mapping, SpannerEnumerator};

/// Compile a pattern into a VA (§6.2).
pub fn compile(pattern: &str) -> Result<VA> {
    regex::compile(pattern)
}

/// A single match of a VA against a document: the overall span plus every
/// named group's span that was assigned on this particular run.
#[derive(Clone, Debug)]
pub struct Match<'t> {
    pub document: &'t str,
    pub span: Range<usize>,
    pub group_spans: Vec<(String, Range<usize>)>,
}

impl<'t> From<Mapping<'t>> for Match<'t> {
    fn from(mapping: Mapping<'t>) -> Match<'t> {
        let document = mapping.text();
        let span = mapping
            .main_span()
            .expect("a mapping always carries the match span");
        let group_spans = mapping
            .iter_groups()
            .map(|(name, range)| (name.to_string(), range))
            .collect();

        Match {
            document,
            span,
            group_spans,
        }
    }
}

/// Enumerate every mapping of `va` over `document`, lazily, with constant
/// delay between matches (§6.2).
pub fn enum_matches<'t>(va: &'t VA, document: &'t str) -> Box<dyn Iterator<Item = Match<'t>> + 't> {
    let mut indexed_dag = IndexedDag::new(va, document);
    indexed_dag.preprocess();

    Box::new(indexed_dag.iter().map(Match::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_matches_finds_every_substring() {
        let va = compile(".*").unwrap();
        let matches: Vec<_> = enum_matches(&va, "ab").collect();
        assert_eq!(matches.len(), 6);
    }

    #[test]
    fn compile_rejects_invalid_pattern() {
        assert!(compile("(").is_err());
    }
}
