pub mod atom;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use bit_set::BitSet;

pub use atom::Atom;

use super::mapping::{Marker, Variable};

/// Label on a VA transition: either a character predicate ("letter edge") or
/// a variable marker ("assignation edge").
#[derive(Clone, Debug)]
pub enum Label {
    Atom(Atom),
    Assignation(Marker),
}

impl Label {
    pub fn get_marker(&self) -> Option<&Marker> {
        match self {
            Label::Assignation(marker) => Some(marker),
            Label::Atom(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Label::Atom(_) => write!(f, "."),
            Label::Assignation(marker) => write!(f, "{}", marker),
        }
    }
}

/// A nondeterministic variable automaton: states are plain integers in
/// `[0, num_states)`, transitions are labeled either with a character
/// predicate or a variable marker.
///
/// The VA is immutable once built: every derived adjacency view used by the
/// enumeration engine is computed once here and memoized, except the
/// per-character letter adjacency, whose domain (the alphabet) isn't known
/// ahead of time and is cached lazily as characters are encountered.
pub struct VA {
    num_states: usize,
    initial: usize,
    finals: BitSet,
    variables: Vec<Rc<Variable>>,

    /// Full adjacency (every transition), used by the naive reference enumerator.
    adj: Vec<Vec<(Rc<Label>, usize)>>,

    /// Direct (single-hop) assignation edges, target states only. Used by
    /// `Jump::clean`'s in-layer usefulness search.
    assign_adj: Vec<Vec<usize>>,

    /// Transitive closure of assignation edges, target states only. Used by
    /// `Jump::advance`'s in-layer closure expansion.
    assign_closure_adj: Vec<Vec<usize>>,

    /// Transitive closure of assignation edges, reversed, with the marker
    /// that must be crossed. `rev_assign_closure[t]` holds every `(marker, s)`
    /// such that `(marker, t)` is in `assign_closure[s]`. Used by the
    /// Enumerator to compute the set of markers reachable backward from a
    /// frontier (a transitive, single-pass-per-state lookup is enough there,
    /// since only the *set* of reachable markers is needed).
    rev_assign_closure: Vec<Vec<(Rc<Marker>, usize)>>,

    /// Direct (single-hop) assignation edges, reversed, with their marker.
    /// `rev_assign_adj[t]` holds every `(marker, s)` such that `(s, marker, t)`
    /// is a transition. Unlike `rev_assign_closure`, each entry here
    /// corresponds to exactly one marker crossing, so it's what `follow_SpSm`
    /// walks to track, hop by hop, which markers a path actually crosses.
    rev_assign_adj: Vec<Vec<(Rc<Marker>, usize)>>,

    letter_adj_cache: RefCell<HashMap<char, Rc<Vec<Vec<usize>>>>>,
}

impl VA {
    pub fn new<T>(num_states: usize, initial: usize, transitions: T, finals: BitSet) -> VA
    where
        T: IntoIterator<Item = (usize, Label, usize)>,
    {
        let mut adj: Vec<Vec<(Rc<Label>, usize)>> = vec![Vec::new(); num_states];
        let mut assign_adj: Vec<Vec<(Rc<Marker>, usize)>> = vec![Vec::new(); num_states];
        let mut variables: Vec<Rc<Variable>> = Vec::new();
        let mut seen_variables = HashSet::new();

        for (source, label, target) in transitions {
            if let Some(marker) = label.get_marker() {
                let var = marker.variable();
                if seen_variables.insert(var.get_id()) {
                    variables.push(Rc::new(var.clone()));
                }
            }

            let label = Rc::new(label);
            if let Some(marker) = label.get_marker() {
                assign_adj[source].push((Rc::new(marker.clone()), target));
            }
            adj[source].push((label, target));
        }

        #[cfg(debug_assertions)]
        {
            assert!(
                !has_assignation_cycle(&assign_adj, num_states),
                "VA has a cycle in its in-layer assignation subgraph; Glushkov \
                 construction should never produce one"
            );
        }

        let assign_closure = compute_assignation_closure(&assign_adj, num_states);
        let assign_adj_plain = assign_adj
            .iter()
            .map(|edges| edges.iter().map(|&(_, t)| t).collect())
            .collect();
        let assign_closure_adj = assign_closure
            .iter()
            .map(|edges| edges.iter().map(|&(_, t)| t).collect())
            .collect();
        let rev_assign_closure = reverse_closure(&assign_closure, num_states);
        let rev_assign_adj = reverse_closure(&assign_adj, num_states);

        VA {
            num_states,
            initial,
            finals,
            variables,
            adj,
            assign_adj: assign_adj_plain,
            assign_closure_adj,
            rev_assign_closure,
            rev_assign_adj,
            letter_adj_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn initial(&self) -> usize {
        self.initial
    }

    pub fn finals(&self) -> &BitSet {
        &self.finals
    }

    pub fn get_adj(&self) -> &Vec<Vec<(Rc<Label>, usize)>> {
        &self.adj
    }

    pub fn get_assign_adj(&self) -> &Vec<Vec<usize>> {
        &self.assign_adj
    }

    pub fn get_assign_closure_adj(&self) -> &Vec<Vec<usize>> {
        &self.assign_closure_adj
    }

    pub fn get_rev_assign_closure(&self) -> &Vec<Vec<(Rc<Marker>, usize)>> {
        &self.rev_assign_closure
    }

    pub fn get_rev_assign_adj(&self) -> &Vec<Vec<(Rc<Marker>, usize)>> {
        &self.rev_assign_adj
    }

    /// `letter_adj[c][s]`: the set of states reachable from `s` by a single
    /// letter edge matching `c`. Computed on first use for a given character
    /// and memoized, since the document's alphabet isn't known up front.
    pub fn get_adj_for_char(&self, c: char) -> Rc<Vec<Vec<usize>>> {
        if let Some(cached) = self.letter_adj_cache.borrow().get(&c) {
            return cached.clone();
        }

        let mut result = vec![Vec::new(); self.num_states];
        for (source, edges) in self.adj.iter().enumerate() {
            for (label, target) in edges {
                if let Label::Atom(atom) = label.as_ref() {
                    if atom.matches(c) {
                        result[source].push(*target);
                    }
                }
            }
        }

        let result = Rc::new(result);
        self.letter_adj_cache
            .borrow_mut()
            .insert(c, result.clone());
        result
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        out.push_str("digraph automaton {\n");
        out.push_str("  before_q0 [shape=point];\n");
        out.push_str(&format!("  before_q0 -> q{};\n", self.initial));
        for state in 0..self.num_states {
            let shape = if self.finals.contains(state) {
                "doublecircle"
            } else {
                "circle"
            };
            out.push_str(&format!("  q{} [shape={}];\n", state, shape));
        }
        for (source, edges) in self.adj.iter().enumerate() {
            for (label, target) in edges {
                out.push_str(&format!(
                    "  q{} -> q{} [label=\"{}\"];\n",
                    source, target, label
                ));
            }
        }
        out.push_str("}\n");
        out
    }
}

fn has_assignation_cycle(assign_adj: &[Vec<(Rc<Marker>, usize)>], num_states: usize) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let mut color = vec![Color::White; num_states];

    fn visit(
        state: usize,
        assign_adj: &[Vec<(Rc<Marker>, usize)>],
        color: &mut Vec<Color>,
    ) -> bool {
        color[state] = Color::Gray;
        for &(_, target) in &assign_adj[state] {
            match color[target] {
                Color::Gray => return true,
                Color::White => {
                    if visit(target, assign_adj, color) {
                        return true;
                    }
                }
                Color::Black => (),
            }
        }
        color[state] = Color::Black;
        false
    }

    (0..num_states).any(|state| color[state] == Color::White && visit(state, assign_adj, &mut color))
}

fn compute_assignation_closure(
    assign_adj: &[Vec<(Rc<Marker>, usize)>],
    num_states: usize,
) -> Vec<Vec<(Rc<Marker>, usize)>> {
    let mut closure = vec![Vec::new(); num_states];

    for start in 0..num_states {
        let mut seen_edges: HashSet<(usize, usize)> = HashSet::new();
        let mut stack = vec![start];
        let mut visited_states = HashSet::new();
        visited_states.insert(start);

        while let Some(state) = stack.pop() {
            for (marker, target) in &assign_adj[state] {
                if seen_edges.insert((marker.get_id(), *target)) {
                    closure[start].push((marker.clone(), *target));
                }
                if visited_states.insert(*target) {
                    stack.push(*target);
                }
            }
        }
    }

    closure
}

fn reverse_closure(
    closure: &[Vec<(Rc<Marker>, usize)>],
    num_states: usize,
) -> Vec<Vec<(Rc<Marker>, usize)>> {
    let mut rev = vec![Vec::new(); num_states];
    for (source, edges) in closure.iter().enumerate() {
        for (marker, target) in edges {
            rev[*target].push((marker.clone(), source));
        }
    }
    rev
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc as StdRc;

    fn var(name: &str, id: usize) -> StdRc<Variable> {
        StdRc::new(Variable::new(name.to_string(), id))
    }

    #[test]
    fn assignation_closure_chains_through_multiple_edges() {
        let v = var("match", 0);
        let open = Label::Assignation(Marker::Open(v.clone()));
        let close = Label::Assignation(Marker::Close(v.clone()));
        let letter = Label::Atom(Atom::Literal('a'));

        let mut finals = BitSet::new();
        finals.insert(3);

        let va = VA::new(
            4,
            0,
            vec![(0, open, 1), (1, letter, 2), (2, close, 3)],
            finals,
        );

        assert_eq!(va.get_assign_closure_adj()[0], vec![1]);
        assert_eq!(va.get_assign_closure_adj()[2], vec![3]);
    }
}
