use std::collections::{HashMap, VecDeque};
use std::iter;
use std::rc::Rc;

use bit_set::BitSet;

use crate::automaton::VA;

use super::jump::Jump;
use super::{Mapping, Marker, SpannerEnumerator};

//  ___           _                   _ ____
// |_ _|_ __   __| | _____  _____  __| |  _ \  __ _  __ _
//  | || '_ \ / _` |/ _ \ \/ / _ \/ _` | | | |/ _` |/ _` |
//  | || | | | (_| |  __/>  <  __/ (_| | |_| | (_| | (_| |
// |___|_| |_|\__,_|\___/_/\_\___|\__,_|____/ \__,_|\__, |
//                                                  |___/

/// Product DAG of a VA and a document, built by `preprocess` into a jump
/// structure that supports constant-delay enumeration of every mapping.
pub struct IndexedDag<'t> {
    va: &'t VA,
    text: &'t str,
    jump: Option<Jump>,
    char_offsets: Vec<usize>,
}

impl<'t> IndexedDag<'t> {
    pub fn new(va: &'t VA, text: &'t str) -> IndexedDag<'t> {
        // Index utf8 chars, the ith char being represented by
        // `text[char_offsets[i]..char_offsets[i+1]]`
        let char_offsets = text
            .char_indices()
            .map(|(index, _)| index)
            .chain(iter::once(text.len()))
            .collect();

        IndexedDag {
            va,
            text,
            jump: None,
            char_offsets,
        }
    }

    /// Per-level vertex counts and live `reach` matrix count, for `--show-dag`.
    /// `None` before `preprocess` has run.
    pub fn debug_summary(&self) -> Option<(Vec<usize>, usize)> {
        self.jump.as_ref().map(Jump::debug_summary)
    }
}

/// Explore all feasible variable associations reachable from `gamma` within
/// the current level, via the in-layer assignation closure.
fn next_level(va: &VA, gamma: BitSet) -> NextLevelIterator<'_> {
    let adj = va.get_rev_assign_adj();

    let mut k = BitSet::new();
    let mut expected_markers: Vec<Rc<Marker>> = Vec::new();
    let mut states = gamma.clone();
    let mut new_states = gamma.clone();

    while !new_states.is_empty() {
        let source = new_states.iter().next().unwrap();
        new_states.remove(source);
        for (marker, target) in &adj[source] {
            let label_id = marker.get_id();
            if !k.contains(label_id) {
                expected_markers.push(marker.clone());
                k.insert(label_id);
            }
            if !states.contains(*target) {
                states.insert(*target);
                new_states.insert(*target);
            }
        }
    }

    NextLevelIterator::explore(va, expected_markers, gamma)
}

impl<'t> SpannerEnumerator<'t> for IndexedDag<'t> {
    /// Build the jump structure: grow the product DAG one document character
    /// at a time, cleaning useless vertices on a binary-counter schedule so
    /// that the structure stays linear in the document length.
    fn preprocess(&mut self) {
        let assign_closure_adj = self.va.get_assign_closure_adj();
        let assign_adj = self.va.get_assign_adj();

        let mut jump = Jump::new(
            iter::once(self.va.initial()),
            assign_closure_adj,
            self.va.num_states(),
        );

        for c in self.text.chars() {
            let adj_for_char = self.va.get_adj_for_char(c);

            if jump.advance(&adj_for_char, assign_closure_adj).is_err() {
                break;
            }

            // The layer just built (`i + 1`) is never cleaned: it's the
            // current frontier and hasn't had a chance to receive any
            // incoming jump yet. `i`'s binary representation picks out an
            // amortized O(log n) schedule of already-closed layers to clean.
            let i = jump.last_level() - 1;
            let d = i & i.wrapping_neg();
            for level in (i - d + 1)..=i {
                jump.clean(level, assign_adj);
            }
        }

        self.jump = Some(jump);
    }

    fn iter(self) -> Box<dyn Iterator<Item = Mapping<'t>> + 't> {
        Box::new(IndexedDagIterator::init(self))
    }
}

//  ___           _                   _
// |_ _|_ __   __| | _____  _____  __| |
//  | || '_ \ / _` |/ _ \ \/ / _ \/ _` |
//  | || | | | (_| |  __/>  <  __/ (_| |
// |___|_| |_|\__,_|\___/_/\_\___|\__,_|
//  ____
// |  _ \  __ _  __ _
// | | | |/ _` |/ _` |
// | |_| | (_| | (_| |
// |____/ \__,_|\__, |
//              |___/

struct IndexedDagIterator<'t> {
    va: &'t VA,
    text: &'t str,
    jump: Option<Jump>,
    char_offsets: Vec<usize>,

    stack: Vec<(usize, BitSet, Vec<(Rc<Marker>, usize)>)>,

    curr_level: usize,
    curr_mapping: Vec<(Rc<Marker>, usize)>,
    curr_next_level: NextLevelIterator<'t>,
}

impl<'t> IndexedDagIterator<'t> {
    fn init(indexed_dag: IndexedDag<'t>) -> IndexedDagIterator<'t> {
        let IndexedDag {
            va,
            text,
            jump,
            char_offsets,
        } = indexed_dag;

        let doc_len = text.chars().count();

        // `advance` stops the moment a letter edge leaves no surviving state,
        // which (given the implicit leading/trailing `.*` wrapping added for
        // unanchored patterns) only happens when no alignment can possibly
        // reach the end of the document. So a `Jump` that didn't build a
        // layer per character never has a real match to report, regardless
        // of what its last built layer's states look like.
        let reached_end = jump.as_ref().is_some_and(|jump| jump.last_level() == doc_len);

        let start = match &jump {
            Some(jump) if reached_end && !jump.is_disconnected() => {
                let mut start = jump.finals();
                start.intersect_with(va.finals());
                start
            }
            _ => BitSet::new(),
        };

        let last_level = if reached_end { doc_len } else { 0 };

        IndexedDagIterator {
            va,
            text,
            jump,
            char_offsets,
            stack: vec![(last_level, start, Vec::new())],

            // `curr_next_level` is initialized empty, thus these values will
            // be replaced before the first iteration.
            curr_next_level: NextLevelIterator::empty(va),
            curr_level: usize::default(),
            curr_mapping: Vec::default(),
        }
    }
}

impl<'t> Iterator for IndexedDagIterator<'t> {
    type Item = Mapping<'t>;

    fn next(&mut self) -> Option<Mapping<'t>> {
        loop {
            // First, consume curr_next_level.
            while let Some((s_p, new_gamma)) = self.curr_next_level.next() {
                if new_gamma.is_empty() {
                    continue;
                }

                let mut new_mapping = self.curr_mapping.clone();
                for marker in s_p {
                    new_mapping.push((marker, self.curr_level));
                }

                if self.curr_level == 0 && new_gamma.contains(self.va.initial()) {
                    // Re-align level indexes with utf8 coding
                    let char_offsets = &self.char_offsets;
                    let aligned_markers = new_mapping
                        .into_iter()
                        .map(|(marker, pos)| ((*marker).clone(), char_offsets[pos]));

                    if let Some(mapping) = Mapping::from_markers(self.text, aligned_markers) {
                        return Some(mapping);
                    }
                    continue;
                } else if let Some(jump) = &self.jump {
                    let (jump_level, jump_gamma) = jump.query(self.curr_level, &new_gamma);
                    if let Some(jump_level) = jump_level {
                        if !jump_gamma.is_empty() {
                            self.stack.push((jump_level, jump_gamma, new_mapping));
                        }
                    }
                }
            }

            // Otherwise, read next element of the stack and init the new
            // `curr_next_level` before restarting the process.
            match self.stack.pop() {
                None => return None,
                Some((level, gamma, mapping)) => {
                    self.curr_level = level;
                    self.curr_mapping = mapping;
                    self.curr_next_level = next_level(self.va, gamma)
                }
            }
        }
    }
}

//  _   _           _   _                   _
// | \ | | _____  _| |_| |    _____   _____| |
// |  \| |/ _ \ \/ / __| |   / _ \ \ / / _ \ |
// | |\  |  __/>  <| |_| |__|  __/\ V /  __/ |
// |_| \_|\___/_/\_\\__|_____\___| \_/ \___|_|
//  ___ _                 _
// |_ _| |_ ___ _ __ __ _| |_ ___  _ __
//  | || __/ _ \ '__/ _` | __/ _ \| '__|
//  | || ||  __/ | | (_| | || (_) | |
// |___|\__\___|_|  \__,_|\__\___/|_|
//

/// Explore all feasible variable associations in a level from a set of states
/// and resulting possible states reached for these associations.
struct NextLevelIterator<'a> {
    va: &'a VA,

    /// Markers that can be crossed backward from this level.
    expected_markers: Vec<Rc<Marker>>,

    /// Set of states we start the run from.
    gamma: BitSet,

    /// The current state of the iterator.
    stack: Vec<(BitSet, BitSet, Vec<Rc<Marker>>)>,

    /// Finished enumerating.
    done: bool,

    /// The only partial mapping left to return is the empty one.
    almost_done: bool,
}

impl<'a> NextLevelIterator<'a> {
    fn empty(va: &'a VA) -> NextLevelIterator<'a> {
        NextLevelIterator {
            stack: Vec::new(), // Initialized with an empty stack to stop iteration instantly.
            va,
            expected_markers: Vec::new(),
            gamma: BitSet::new(),
            done: true,
            almost_done: true,
        }
    }

    /// Start the exploration from the input set of states `gamma`.
    fn explore(va: &'a VA, expected_markers: Vec<Rc<Marker>>, gamma: BitSet) -> NextLevelIterator<'a> {
        NextLevelIterator {
            va,
            expected_markers,
            gamma,
            stack: vec![(BitSet::new(), BitSet::new(), Vec::new())],
            done: false,
            almost_done: false,
        }
    }

    fn follow_sp_sm(&self, gamma: &BitSet, s_p: &BitSet, s_m: &BitSet) -> BitSet {
        // Single-hop edges: each step crosses exactly one marker, so `s_m`
        // can correctly block a path at the hop where the forbidden marker
        // would be crossed, and `path_set` accumulates every S+-marker seen,
        // not just the marker on the last hop of some collapsed closure edge.
        let adj = self.va.get_rev_assign_adj();
        let mut path_set: HashMap<usize, Option<BitSet>> = HashMap::new();

        for state in gamma.iter() {
            path_set.insert(state, Some(BitSet::new()));
        }

        // Check if two sets are incomparable
        let are_incomparable =
            |set1: &BitSet, set2: &BitSet| !set1.is_subset(set2) && !set2.is_subset(set1);

        let mut queue: VecDeque<_> = gamma.iter().collect();

        while let Some(source) = queue.pop_front() {
            for (marker, target) in &adj[source] {
                if s_m.contains(marker.get_id()) {
                    continue;
                }

                if !path_set.contains_key(target) {
                    queue.push_back(*target);
                }

                let mut new_ps = path_set[&source].clone().unwrap();

                if s_p.contains(marker.get_id()) {
                    new_ps.insert(marker.get_id());
                }

                path_set
                    .entry(*target)
                    .and_modify(|entry| {
                        if let Some(old_ps) = entry {
                            if are_incomparable(&new_ps, old_ps) {
                                *entry = None;
                            } else {
                                *entry = Some(new_ps.clone());
                            }
                        }
                    })
                    .or_insert(Some(new_ps));
            }
        }

        path_set
            .iter()
            .filter_map(|(vertex, vertex_ps)| match vertex_ps {
                Some(vertex_ps) if vertex_ps.len() == s_p.len() => Some(*vertex),
                _ => None,
            })
            .collect()
    }
}

impl<'a> Iterator for NextLevelIterator<'a> {
    type Item = (Vec<Rc<Marker>>, BitSet);

    fn next(&mut self) -> Option<(Vec<Rc<Marker>>, BitSet)> {
        if self.done {
            return None;
        }

        if self.almost_done || self.expected_markers.is_empty() {
            self.done = true;
            return Some((Vec::new(), self.gamma.clone()));
        }

        while let Some((mut s_p, mut s_m, mut markers)) = self.stack.pop() {
            let mut gamma2 = Some(self.follow_sp_sm(&self.gamma, &s_p, &s_m));

            if gamma2.as_ref().unwrap().is_empty() {
                continue;
            }

            while s_p.len() + s_m.len() < self.expected_markers.len() {
                let depth = s_p.len() + s_m.len();
                let next_marker = self.expected_markers[depth].get_id();
                s_p.insert(next_marker);
                gamma2 = Some(self.follow_sp_sm(&self.gamma, &s_p, &s_m));

                if !gamma2.as_ref().unwrap().is_empty() {
                    // If current pair Sp/Sm is feasible, add the other branch
                    // to the stack.
                    let mut new_s_p = s_p.clone();
                    let mut new_s_m = s_m.clone();
                    new_s_m.insert(next_marker);
                    new_s_p.remove(next_marker);
                    let new_markers = markers.clone();
                    self.stack.push((new_s_p, new_s_m, new_markers));

                    // Only modify after the unmodified markers have been pushed to the stack.
                    markers.push(self.expected_markers[depth].clone());
                } else {
                    // Otherwise, the other branch has to be feasible.
                    s_p.remove(next_marker);
                    s_m.insert(next_marker);
                    gamma2 = None;
                }
            }

            let gamma2 = match gamma2 {
                None => self.follow_sp_sm(&self.gamma, &s_p, &s_m),
                Some(val) => val,
            };

            return Some((markers, gamma2));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex;
    use std::collections::HashSet;

    fn run(pattern: &str, text: &str) -> HashSet<(usize, usize)> {
        let va = regex::compile(pattern).unwrap();
        let mut indexed_dag = IndexedDag::new(&va, text);
        indexed_dag.preprocess();
        indexed_dag
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

    #[test]
    fn agrees_with_naive_on_a_capture_group() {
        use super::super::naive::NaiveEnum;

        let va = regex::compile("a(?P<x>b+)c").unwrap();
        let text = "abbcabbbc";

        let group_span = |m: &Mapping| -> (usize, usize) {
            let (_, span) = m.iter_groups().find(|(name, _)| *name == "x").unwrap();
            (span.start, span.end)
        };

        let naive = NaiveEnum::new(&va, text);
        let naive_set: HashSet<_> = naive.iter().map(|m| group_span(&m)).collect();

        let mut indexed_dag = IndexedDag::new(&va, text);
        indexed_dag.preprocess();
        let indexed_set: HashSet<_> = indexed_dag.iter().map(|m| group_span(&m)).collect();

        assert_eq!(naive_set, indexed_set);
    }

    #[test]
    fn every_emitted_mapping_assigns_every_group_the_pattern_declares() {
        // Every accepting run of this pattern crosses both group boundaries, so
        // a mapping missing either group would be a spurious path that no run
        // of the automaton actually takes.
        let va = regex::compile(r"(?P<u>\w+)@(?P<v>\w+)").unwrap();
        let text = "x@y a@b";

        let mut indexed_dag = IndexedDag::new(&va, text);
        indexed_dag.preprocess();

        let mut spans = Vec::new();
        for m in indexed_dag.iter() {
            let names: HashSet<&str> = m.iter_groups().map(|(name, _)| name).collect();
            assert_eq!(names, ["u", "v"].iter().cloned().collect());
            spans.push(m.main_span().unwrap());
        }

        let got: HashSet<_> = spans.into_iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(got, vec![(0, 3), (4, 7)].into_iter().collect());
    }

    #[test]
    fn anchored_pattern_with_no_surviving_run_yields_no_matches() {
        // The leading character can never start a run of `^a*$`, so `advance`
        // hits an empty layer after the very first character and never
        // builds the rest of the document.
        let got = run("^a*$", "x@y a@b");
        assert!(got.is_empty());
    }

    #[test]
    fn anchored_prefix_dying_partway_through_yields_no_matches() {
        let got = run("^abc", "abx");
        assert!(got.is_empty());
    }

    #[test]
    fn repeated_group_crossing_twice_in_a_run_is_dropped_not_reported() {
        // `(?P<a>a)*` repeating twice crosses `a`'s open/close markers twice
        // in the same run; a spanner assigns each variable one span, so that
        // run isn't a valid mapping at all, rather than the last iteration
        // silently winning.
        // (0, 2) is missing: the only run of the whole span crosses `a`'s
        // markers twice (once per repetition), so it's dropped rather than
        // reported with one of the two crossings silently kept.
        let got = run("(?P<a>a)*", "aa");
        assert_eq!(got, vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)].into_iter().collect());
    }
}

