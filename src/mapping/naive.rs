use std::collections::HashSet;
use std::str::CharIndices;

use crate::automaton::{Label, VA};

use super::{Mapping, Marker, SpannerEnumerator};

/// Exponential-time reference enumerator: explores every accepting run of
/// the VA over the text by plain backtracking, deduplicating mappings as
/// they're produced. Used only to differentially test the indexed-DAG
/// engine; its runtime and delay are bounded only by the number of
/// accepting runs.
pub struct NaiveEnum<'t> {
    va: &'t VA,
    text: &'t str,
}

impl<'t> NaiveEnum<'t> {
    pub fn new(va: &'t VA, text: &'t str) -> NaiveEnum<'t> {
        NaiveEnum { va, text }
    }
}

impl<'t> SpannerEnumerator<'t> for NaiveEnum<'t> {
    fn iter(self) -> Box<dyn Iterator<Item = Mapping<'t>> + 't> {
        Box::new(NaiveEnumIterator {
            va: self.va,
            text: self.text,
            stack: vec![(self.va.initial(), self.text.char_indices(), Vec::new())],
            seen: HashSet::new(),
        })
    }

    fn preprocess(&mut self) {}
}

struct NaiveEnumIterator<'t> {
    va: &'t VA,
    text: &'t str,

    /// Stack of in-progress runs: (current state, remaining text, markers assigned so far).
    stack: Vec<(usize, CharIndices<'t>, Vec<(Marker, usize)>)>,

    /// Already-yielded mappings, to deduplicate runs that agree on every boundary.
    seen: HashSet<Mapping<'t>>,
}

impl<'t> Iterator for NaiveEnumIterator<'t> {
    type Item = Mapping<'t>;

    fn next(&mut self) -> Option<Mapping<'t>> {
        while let Some((state, index, assigns)) = self.stack.pop() {
            let curr_char = index.clone().next();

            for (label, target) in &self.va.get_adj()[state] {
                match label.as_ref() {
                    Label::Atom(atom) => {
                        if let Some((_, c)) = curr_char {
                            if atom.matches(c) {
                                let mut new_index = index.clone();
                                new_index.next();
                                self.stack.push((*target, new_index, assigns.clone()));
                            }
                        }
                    }
                    Label::Assignation(marker) => {
                        let pos = curr_char.map(|(pos, _)| pos).unwrap_or(self.text.len());
                        let mut new_assigns = assigns.clone();
                        new_assigns.push((marker.clone(), pos));
                        self.stack.push((*target, index.clone(), new_assigns));
                    }
                }
            }

            if curr_char.is_none() && self.va.finals().contains(state) {
                let mapping = Mapping::from_markers(self.text, assigns.into_iter());

                if let Some(mapping) = mapping {
                    if !self.seen.contains(&mapping) {
                        self.seen.insert(mapping.clone());
                        return Some(mapping);
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex;

    fn run(pattern: &str, text: &str) -> HashSet<(usize, usize)> {
        let va = regex::compile(pattern).unwrap();
        let enumerator = NaiveEnum::new(&va, text);
        enumerator
            .iter()
            .map(|m| {
                let span = m.main_span().unwrap();
                (span.start, span.end)
            })
            .collect()
    }

    #[test]
    fn dot_star_matches_every_substring() {
        let got = run(".*", "ab");
        let expected: HashSet<_> = vec![(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]
            .into_iter()
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn anchored_pattern_matches_once() {
        let got = run("^a*$", "aaaa");
        assert_eq!(got, vec![(0, 4)].into_iter().collect());
    }
}
