pub mod indexed_dag;
pub mod naive;

mod jump;
mod levelset;

use std::cmp;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::rc::Rc;

pub use indexed_dag::IndexedDag;

//  __  __                   _
// |  \/  | __ _ _ __  _ __ (_)_ __   __ _
// | |\/| |/ _` | '_ \| '_ \| | '_ \ / _` |
// | |  | | (_| | |_) | |_) | | | | | (_| |
// |_|  |_|\__,_| .__/| .__/|_|_| |_|\__, |
//              |_|   |_|            |___/

/// Distinguished name of the variable that holds the overall match span.
pub const MATCH_VARIABLE: &str = "match";

/// Map a set of variables to spans `[i, i')` over a text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mapping<'t> {
    text: &'t str,
    maps: HashMap<Variable, Range<usize>>,
}

impl<'t> Mapping<'t> {
    /// The document this mapping's spans index into.
    pub fn text(&self) -> &'t str {
        self.text
    }

    /// Returns the span of the reserved `match` variable.
    pub fn main_span(&self) -> Option<Range<usize>> {
        self.maps
            .iter()
            .find(|(var, _)| var.get_name() == MATCH_VARIABLE)
            .map(|(_, range)| range.clone())
    }

    pub fn iter_groups(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.maps
            .iter()
            .filter(|(var, _)| var.get_name() != MATCH_VARIABLE)
            .map(|(key, range)| (key.get_name(), range.clone()))
    }

    pub fn iter_groups_text(&self) -> impl Iterator<Item = (&str, &str)> {
        self.maps
            .iter()
            .filter(|(var, _)| var.get_name() != MATCH_VARIABLE)
            .map(move |(key, range)| (key.get_name(), &self.text[range.clone()]))
    }

    /// Return a canonical mapping for a classic semantic with no group, which
    /// will assign the whole match to a group called "match".
    pub fn from_single_match(text: &'t str, range: Range<usize>) -> Mapping<'t> {
        let mut maps = HashMap::new();
        maps.insert(Variable::new(MATCH_VARIABLE.to_string(), 0), range);
        Mapping { text, maps }
    }

    /// Build a mapping from a run's marker sequence, bucketing markers by
    /// variable (§4.5). Returns `None` if the run is ill-formed: either the
    /// `match` group never got both its boundaries (an alternative path that
    /// would have closed it was not actually taken), or some variable's open
    /// or close marker is crossed more than once on this run (e.g. a run of
    /// `(?P<a>a)*` that repeats `a`'s group twice) — a spanner assigns each
    /// variable a single span, so such a run simply isn't a valid mapping and
    /// is dropped rather than reported. A non-`match` group missing a
    /// boundary is simply omitted rather than failing the whole mapping,
    /// since it legitimately means that group's branch was never entered on
    /// this run.
    pub fn from_markers<T>(text: &'t str, marker_assigns: T) -> Option<Mapping<'t>>
    where
        T: Iterator<Item = (Marker, usize)>,
    {
        let mut dict: HashMap<Variable, (Option<usize>, Option<usize>)> = HashMap::new();

        for (marker, pos) in marker_assigns {
            let span = dict.get(marker.variable()).cloned().unwrap_or((None, None));

            let span = match marker {
                Marker::Open(_) => {
                    if span.0.is_some() {
                        return None;
                    }
                    (Some(pos), span.1)
                }
                Marker::Close(_) => {
                    if span.1.is_some() {
                        return None;
                    }
                    (span.0, Some(pos))
                }
            };

            dict.insert(marker.variable().clone(), span);
        }

        let mut maps = HashMap::new();
        for (var, span) in dict {
            match span {
                (Some(i), Some(j)) => {
                    debug_assert!(i <= j, "invalid mapping ordering for {}: {}..{}", var, i, j);
                    maps.insert(var, i..j);
                }
                _ if var.get_name() == MATCH_VARIABLE => return None,
                _ => (),
            }
        }

        Some(Mapping { text, maps })
    }
}

impl<'t> std::hash::Hash for Mapping<'t> {
    fn hash<'m, H: Hasher>(&'m self, state: &mut H) {
        self.text.hash(state);

        let mut assignments: Vec<_> = self.maps.iter().collect();
        assignments.sort_by(|&a, &b| {
            let key = |x: (&'m Variable, &Range<usize>)| (x.0, x.1.start, x.1.end);
            key(a).cmp(&key(b))
        });

        for assignment in assignments {
            assignment.hash(state);
        }
    }
}

impl<'t> fmt::Display for Mapping<'t> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (var, range) in self.maps.iter() {
            write!(f, "{}: ({}, {}) ", var, range.start, range.end)?;
        }

        Ok(())
    }
}

/// Implemented by every enumeration strategy that yields mappings for a
/// `(VA, document)` pair: the indexed-DAG engine and the naive reference used
/// for differential testing. `iter` consumes the enumerator so the returned
/// stream can own everything it needs for the `'t` lifetime instead of
/// borrowing from a local that doesn't outlive the call.
pub trait SpannerEnumerator<'t> {
    fn iter(self) -> Box<dyn Iterator<Item = Mapping<'t>> + 't>;

    /// Run any precomputation the strategy needs ahead of iteration.
    fn preprocess(&mut self);
}

// __     __         _       _     _
// \ \   / /_ _ _ __(_) __ _| |__ | | ___
//  \ \ / / _` | '__| |/ _` | '_ \| |/ _ \
//   \ V / (_| | |  | | (_| | |_) | |  __/
//    \_/ \__,_|_|  |_|\__,_|_.__/|_|\___|
//

#[derive(Clone, Debug, PartialOrd, Ord)]
pub struct Variable {
    id: usize,
    name: String,
}

impl Variable {
    pub fn new(name: String, id: usize) -> Variable {
        Variable { id, name }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_id(&self) -> usize {
        self.id
    }
}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Eq for Variable {}
impl PartialEq for Variable {
    fn eq(&self, other: &Variable) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

//  __  __            _
// |  \/  | __ _ _ __| | _____ _ __
// | |\/| |/ _` | '__| |/ / _ \ '__|
// | |  | | (_| | |  |   <  __/ |
// |_|  |_|\__,_|_|  |_|\_\___|_|
//

/// An `Open(V)` or `Close(V)` token that records a capture boundary. Markers
/// order with all Opens before all Closes, then by variable id, so that
/// output ordering is deterministic (§3).
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Marker {
    Open(Rc<Variable>),
    Close(Rc<Variable>),
}

impl Marker {
    pub fn variable(&self) -> &Variable {
        match self {
            Marker::Open(var) | Marker::Close(var) => var,
        }
    }

    /// A dense id for use as a bitset index: `2 * var_id` for Open, `2 * var_id + 1` for Close.
    pub fn get_id(&self) -> usize {
        match self {
            Marker::Open(var) => var.get_id() * 2,
            Marker::Close(var) => var.get_id() * 2 + 1,
        }
    }

    fn side_rank(&self) -> usize {
        match self {
            Marker::Open(_) => 0,
            Marker::Close(_) => 1,
        }
    }
}

impl PartialOrd for Marker {
    fn partial_cmp(&self, other: &Marker) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Marker {
    fn cmp(&self, other: &Marker) -> cmp::Ordering {
        (self.side_rank(), self.variable().get_id()).cmp(&(other.side_rank(), other.variable().get_id()))
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Marker::Open(var) => write!(f, "⊢{}", var),
            Marker::Close(var) => write!(f, "{}⊣", var),
        }
    }
}

//  _____         _
// |_   _|__  ___| |_ ___
//   | |/ _ \/ __| __/ __|
//   | |  __/\__ \ |_\__ \
//   |_|\___||___/\__|___/
//

#[cfg(test)]
mod tests;
