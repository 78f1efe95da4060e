use std::cmp::max;
use std::collections::{HashMap, HashSet};
use std::fmt;

use bit_set::BitSet;

use super::super::matrix::Matrix;
use super::levelset::LevelSet;

/// Signals that a freshly-built layer has no vertices at all: the pattern
/// cannot match the rest of the document from here on.
#[derive(Debug)]
pub struct EmptyLevel;

//      _
//     | |_   _ _ __ ___  _ __
//  _  | | | | | '_ ` _ \| '_ \
// | |_| | |_| | | | | | | |_) |
//  \___/ \__,_|_| |_| |_| .__/
//                       |_|

/// Generic jump function inside a product DAG.
///
/// The DAG is built layer by layer: each `advance` reads one document
/// character and grows the structure by one level, following both the
/// letter edges from the previous level and the in-layer assignation edges.
/// `jl` records, for every vertex, the deepest earlier layer it could be
/// "jumped back" to without losing any assignation; `reach` caches the
/// vertex-to-vertex reachability between a layer and every layer reachable
/// from it through `jl`, so that `query` can skip straight there.
pub struct Jump {
    levelset: LevelSet,
    last_level: usize,
    num_states: usize,

    /// `nonjump[level]`: vertices in `level` with an incoming in-layer
    /// assignation edge — they can't themselves be landmarks for `jl`.
    nonjump: Vec<BitSet>,

    /// `jl[level][state]`: the jump level of `state` at `level`, if registered.
    jl: Vec<Vec<Option<usize>>>,

    /// `rlevel[level]`: set of sublevels reachable from `level` via `jl`.
    rlevel: Vec<HashSet<usize>>,
    /// `rev_rlevel[level]`: set of levels that have `level` in their `rlevel`.
    rev_rlevel: Vec<HashSet<usize>>,
    /// `reach[(i, j)]`: `|V[i]| x |V[j]|` reachability matrix from level `i` to level `j`.
    reach: HashMap<(usize, usize), Matrix>,
    /// `in_jumps[level][k]`: number of jump pointers from higher levels into vertex `k` of `level`.
    in_jumps: Vec<Vec<usize>>,
}

impl Jump {
    /// Build the jump structure from an initial frontier of states, expanding
    /// it by assignation closure to form layer 0.
    pub fn new<T>(initial_frontier: T, assign_closure_adj: &[Vec<usize>], num_states: usize) -> Jump
    where
        T: IntoIterator<Item = usize>,
    {
        let mut jump = Jump {
            levelset: LevelSet::new(16, num_states),
            last_level: 0,
            num_states,
            nonjump: vec![BitSet::with_capacity(num_states)],
            jl: vec![vec![None; num_states]],
            rlevel: vec![HashSet::new()],
            rev_rlevel: vec![HashSet::new()],
            reach: HashMap::new(),
            in_jumps: vec![Vec::new()],
        };

        jump.levelset.add_level();

        for state in initial_frontier {
            jump.levelset.register(0, state);
            jump.jl[0][state] = Some(0);
        }

        jump.expand_assignation_closure(0, assign_closure_adj);
        jump.in_jumps[0] = vec![0; jump.levelset.get_level(0).len()];

        jump
    }

    /// Read one document character and build the next layer, given the
    /// letter adjacency for that character and the assignation closure.
    pub fn advance(
        &mut self,
        letter_adj_for_char: &[Vec<usize>],
        assign_closure_adj: &[Vec<usize>],
    ) -> Result<(), EmptyLevel> {
        let last_level = self.last_level;
        let next_level = last_level + 1;

        self.levelset.add_level();
        self.jl.push(vec![None; self.num_states]);
        self.nonjump.push(BitSet::with_capacity(self.num_states));

        let prev_vertices = self.levelset.get_level(last_level).clone();

        // a) Letter edges: propagate the jump level across the product graph.
        for &source in &prev_vertices {
            let source_is_nonjump = self.nonjump[last_level].contains(source);
            let source_jl = self.jl[last_level][source];

            for &target in &letter_adj_for_char[source] {
                let first_time = self.jl[next_level][target].is_none();
                self.levelset.register(next_level, target);

                if first_time {
                    self.jl[next_level][target] = Some(0);
                }

                if source_is_nonjump {
                    self.jl[next_level][target] = Some(last_level);
                } else {
                    let propagated = source_jl.expect("registered vertex must carry a jl");
                    let current = self.jl[next_level][target].unwrap();
                    self.jl[next_level][target] = Some(max(current, propagated));
                }
            }
        }

        if self.levelset.get_level(next_level).is_empty() {
            return Err(EmptyLevel);
        }

        // b) In-layer assignation closure.
        self.expand_assignation_closure(next_level, assign_closure_adj);

        // c) rlevel / rev_rlevel update.
        let next_vertices = self.levelset.get_level(next_level).clone();
        let mut rl = HashSet::new();
        for &v in &next_vertices {
            if let Some(j) = self.jl[next_level][v] {
                rl.insert(j);
            }
        }
        for &sublevel in &rl {
            self.rev_rlevel[sublevel].insert(next_level);
        }
        self.rlevel.push(rl.clone());
        self.rev_rlevel.push(HashSet::new());

        // d) reach update.
        let mut reach_ln = Matrix::new(prev_vertices.len(), next_vertices.len());
        for (k, &source) in prev_vertices.iter().enumerate() {
            for &target in &letter_adj_for_char[source] {
                if let Some(l) = self.levelset.get_vertex_index(next_level, target) {
                    reach_ln.set(k, l, true);
                }
            }
        }

        for &sublevel in &rl {
            if sublevel < last_level {
                let reach_to_prev = self
                    .reach
                    .get(&(sublevel, last_level))
                    .expect("rlevel entries must have a cached reach matrix to the previous level");
                self.reach
                    .insert((sublevel, next_level), reach_to_prev * &reach_ln);
            }
        }

        if rl.contains(&last_level) {
            self.reach.insert((last_level, next_level), reach_ln);
        }

        // e) in_jumps update.
        self.in_jumps.push(vec![0; next_vertices.len()]);
        for &sublevel in &rl {
            let reach_sub_next = &self.reach[&(sublevel, next_level)];
            for (k, count) in reach_sub_next.row_sums(None).into_iter().enumerate() {
                self.in_jumps[sublevel][k] += count;
            }
        }

        self.last_level = next_level;
        Ok(())
    }

    /// Prune useless vertices from `level`: a vertex is useful if some upper
    /// layer still jumps to it, or if it can reach a useful vertex through an
    /// in-layer assignation edge. Returns whether anything was removed.
    pub fn clean(&mut self, level: usize, assign_adj_inside_level: &[Vec<usize>]) -> bool {
        if !self.levelset.has_level(level) {
            return false;
        }

        let level_vertices = self.levelset.get_level(level).clone();
        let lvl_set: HashSet<usize> = level_vertices.iter().cloned().collect();
        let mut del_vertices: HashSet<usize> = lvl_set.clone();
        let mut seen: HashSet<usize> = HashSet::new();

        for &start in &level_vertices {
            if seen.contains(&start) {
                continue;
            }

            let mut stack = vec![(start, vec![start])];

            while let Some((source, mut path)) = stack.pop() {
                if seen.contains(&source) {
                    continue;
                }
                seen.insert(source);

                let source_id = self
                    .levelset
                    .get_vertex_index(level, source)
                    .expect("vertex must be registered in its own level");

                let useful = self.in_jumps[level][source_id] > 0
                    || assign_adj_inside_level[source]
                        .iter()
                        .any(|t| lvl_set.contains(t) && !del_vertices.contains(t));

                if useful {
                    for v in &path {
                        del_vertices.remove(v);
                    }
                    path.clear();
                }

                for &target in &assign_adj_inside_level[source] {
                    if lvl_set.contains(&target) && !seen.contains(&target) {
                        let mut target_path = path.clone();
                        target_path.push(target);
                        stack.push((target, target_path));
                    }
                }
            }
        }

        if del_vertices.is_empty() {
            return false;
        }

        let removed_cols: Vec<usize> = del_vertices
            .iter()
            .map(|&v| self.levelset.get_vertex_index(level, v).unwrap())
            .collect();

        for &uplevel in &self.rev_rlevel[level].clone() {
            if let Some(m) = self.reach.get(&(level, uplevel)) {
                let updated = m.remove_rows(&removed_cols);
                self.reach.insert((level, uplevel), updated);
            }
        }

        for &sublevel in &self.rlevel[level].clone() {
            if let Some(m) = self.reach.get(&(sublevel, level)) {
                for (k, count) in m.row_sums(Some(&removed_cols)).into_iter().enumerate() {
                    self.in_jumps[sublevel][k] -= count;
                }
                let updated = m.remove_cols(&removed_cols);
                self.reach.insert((sublevel, level), updated);
            }
        }

        self.levelset.remove(level, &del_vertices);
        for &v in &del_vertices {
            self.jl[level][v] = None;
        }
        self.in_jumps[level] = remove_indices(&self.in_jumps[level], &removed_cols);

        if !self.levelset.has_level(level) {
            for &sublevel in &self.rlevel[level] {
                self.reach.remove(&(sublevel, level));
            }
            for &uplevel in &self.rev_rlevel[level] {
                self.reach.remove(&(level, uplevel));
                self.rlevel[uplevel].remove(&level);
            }
            for &sublevel in &self.rlevel[level].clone() {
                self.rev_rlevel[sublevel].remove(&level);
            }
            self.rlevel[level].clear();
            self.rev_rlevel[level].clear();
        }

        true
    }

    /// Jump to the deepest landmark layer reachable from every vertex of
    /// `gamma`, projecting the frontier down to it.
    pub fn query(&self, level: usize, gamma: &BitSet) -> (Option<usize>, BitSet) {
        let j = gamma
            .iter()
            .filter_map(|v| self.jl[level][v])
            .max();

        let j = match j {
            Some(j) => j,
            None => return (None, BitSet::new()),
        };

        if j == level {
            return (Some(j), BitSet::new());
        }

        let level_len = self.levelset.get_level(level).len();
        let mut gamma_local = BitSet::with_capacity(level_len);
        for v in gamma.iter() {
            if let Some(idx) = self.levelset.get_vertex_index(level, v) {
                gamma_local.insert(idx);
            }
        }

        let matrix = &self.reach[&(j, level)];
        let result_local = matrix.col_mul(&gamma_local);

        let j_vertices = self.levelset.get_level(j);
        let gamma2 = result_local.iter().map(|idx| j_vertices[idx]).collect();

        (Some(j), gamma2)
    }

    pub fn is_disconnected(&self) -> bool {
        !self.levelset.has_level(self.last_level)
    }

    /// Vertices in the last built level.
    pub fn finals(&self) -> BitSet {
        if self.is_disconnected() {
            return BitSet::new();
        }

        self.levelset.get_level(self.last_level).iter().cloned().collect()
    }

    pub fn last_level(&self) -> usize {
        self.last_level
    }

    pub fn get_nb_levels(&self) -> usize {
        self.levelset.get_nb_levels()
    }

    /// Per-level vertex counts for `0..get_nb_levels()`, 0 for a dropped
    /// level, and the number of live `reach` matrices. For `--show-dag`.
    pub fn debug_summary(&self) -> (Vec<usize>, usize) {
        let counts = (0..self.get_nb_levels())
            .map(|level| {
                if self.levelset.has_level(level) {
                    self.levelset.get_level(level).len()
                } else {
                    0
                }
            })
            .collect();

        (counts, self.reach.len())
    }

    /// Register every vertex reachable from `level`'s current frontier
    /// through the assignation closure, marking each as nonjump and
    /// propagating `jl` to it from its source.
    fn expand_assignation_closure(&mut self, level: usize, assign_closure_adj: &[Vec<usize>]) {
        let frontier = self.levelset.get_level(level).clone();

        for &source in &frontier {
            let source_jl = self.jl[level][source].expect("vertex must carry a jl before its closure is expanded");

            for &target in &assign_closure_adj[source] {
                let first_time = self.jl[level][target].is_none();
                self.levelset.register(level, target);
                self.nonjump[level].insert(target);

                self.jl[level][target] = Some(match self.jl[level][target] {
                    Some(current) if !first_time => max(current, source_jl),
                    _ => source_jl,
                });
            }
        }
    }
}

fn remove_indices(values: &[usize], removed: &[usize]) -> Vec<usize> {
    let removed: HashSet<usize> = removed.iter().cloned().collect();
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, &v)| v)
        .collect()
}

impl fmt::Debug for Jump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "levelset: {:?}", self.levelset)?;
        writeln!(f, "rlevel: {:?}", self.rlevel)?;
        writeln!(f, "jl: {:?}", self.jl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A chain 0 -> 1 -> 2 -> 3 of single-character letter edges, with no
    // assignation edges at all: every jl stays 0, every jump lands at layer 0.
    fn no_assignations(num_states: usize) -> Vec<Vec<usize>> {
        vec![Vec::new(); num_states]
    }

    #[test]
    fn advance_registers_letter_targets_and_propagates_jl() {
        let no_assign = no_assignations(4);
        let mut jump = Jump::new(vec![0], &no_assign, 4);

        let letter_adj = vec![vec![1], vec![2], vec![3], vec![]];
        jump.advance(&letter_adj, &no_assign).unwrap();
        assert_eq!(jump.finals(), [1].iter().cloned().collect());

        jump.advance(&letter_adj, &no_assign).unwrap();
        assert_eq!(jump.finals(), [2].iter().cloned().collect());
    }

    #[test]
    fn advance_fails_with_empty_level_when_no_letter_edge_matches() {
        let no_assign = no_assignations(2);
        let mut jump = Jump::new(vec![0], &no_assign, 2);
        let letter_adj = vec![Vec::new(), Vec::new()];
        assert!(jump.advance(&letter_adj, &no_assign).is_err());
    }

    #[test]
    fn query_jumps_back_to_landmark_layer() {
        // States: 0 --a--> 1 --assign--> 2 --b--> 3
        // Layer 0: {0}. Layer 1 (after 'a'): {1}, then closure adds {2} (nonjump).
        // Layer 2 (after 'b'): {3}, jl[3] should point back to layer 1 (since 2 is
        // nonjump, its landmark is layer 1).
        let assign_adj = vec![vec![], vec![2], vec![], vec![]];
        let mut jump = Jump::new(vec![0], &assign_adj, 4);

        let adj_a = vec![vec![1], vec![], vec![], vec![]];
        jump.advance(&adj_a, &assign_adj).unwrap();

        let adj_b = vec![vec![], vec![], vec![3], vec![]];
        jump.advance(&adj_b, &assign_adj).unwrap();

        let mut gamma = BitSet::new();
        gamma.insert(3);
        let (j, gamma2) = jump.query(2, &gamma);
        assert_eq!(j, Some(1));
        assert!(gamma2.contains(2));
    }

    #[test]
    fn clean_is_idempotent() {
        let no_assign = no_assignations(3);
        let mut jump = Jump::new(vec![0], &no_assign, 3);
        let letter_adj = vec![vec![1], vec![2], vec![]];
        jump.advance(&letter_adj, &no_assign).unwrap();

        let changed_once = jump.clean(1, &no_assign);
        let changed_twice = jump.clean(1, &no_assign);
        assert!(!changed_twice || !changed_once);
    }
}
