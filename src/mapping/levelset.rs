use std::collections::HashSet;

/// Represent the partitioning into levels of a product graph.
///
/// A same vertex can be stored in several levels, and this level hierarchy
/// can be accessed rather efficiently.
#[derive(Debug)]
pub struct LevelSet {
    num_vertices: usize,

    /// Index level contents: `level id` -> `vertex id's list`.
    levels: Vec<Vec<usize>>,

    /// Index the position of a vertex inside a level:
    /// `(level id, vertex id)` -> `vertex position`.
    /// Also used to check whether a pair `(level, vertex)` is registered.
    vertex_index: Vec<Vec<usize>>,
}

impl LevelSet {
    pub fn new(num_levels: usize, num_vertices: usize) -> LevelSet {
        LevelSet {
            num_vertices,
            levels: Vec::with_capacity(num_levels),
            vertex_index: Vec::new(),
        }
    }

    pub fn has_level(&self, level: usize) -> bool {
        (self.levels.len() > level) && (!self.levels[level].is_empty())
    }

    pub fn get_level(&self, level: usize) -> &Vec<usize> {
        &self.levels[level]
    }

    pub fn get_nb_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn get_vertex_index(&self, level: usize, vertex: usize) -> Option<usize> {
        match self.vertex_index[level].get(vertex) {
            None | Some(&usize::MAX) => None,
            Some(&index) => Some(index),
        }
    }

    /// Save a vertex in a level, the vertex needs to be unique inside this
    /// level but can be registered in other levels.
    pub fn register(&mut self, level: usize, vertex: usize) {
        if self.vertex_index[level][vertex] == usize::MAX {
            self.vertex_index[level][vertex] = self.levels[level].len();
            self.levels[level].push(vertex);
        }
    }

    /// Remove a set of vertices from a level, repacking the positions of the
    /// vertices that remain. If the level is left empty, `has_level` reports
    /// it as absent from then on and its idx table is freed too.
    pub fn remove(&mut self, level: usize, del_vertices: &HashSet<usize>) {
        let mut remaining = Vec::with_capacity(self.levels[level].len());

        for &vertex in &self.levels[level] {
            if del_vertices.contains(&vertex) {
                self.vertex_index[level][vertex] = usize::MAX;
            } else {
                self.vertex_index[level][vertex] = remaining.len();
                remaining.push(vertex);
            }
        }

        self.levels[level] = remaining;

        if self.levels[level].is_empty() {
            self.vertex_index[level] = Vec::new();
        }
    }

    pub fn add_level(&mut self) {
        self.levels.push(Vec::with_capacity(self.num_vertices));
        self.vertex_index.push(vec![usize::MAX; self.num_vertices]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_within_a_level() {
        let mut ls = LevelSet::new(1, 4);
        ls.add_level();
        ls.register(0, 2);
        ls.register(0, 2);
        assert_eq!(ls.get_level(0), &vec![2]);
        assert_eq!(ls.get_vertex_index(0, 2), Some(0));
    }

    #[test]
    fn remove_repacks_positions_and_drops_empty_level() {
        let mut ls = LevelSet::new(1, 4);
        ls.add_level();
        ls.register(0, 0);
        ls.register(0, 1);
        ls.register(0, 2);

        let mut del = HashSet::new();
        del.insert(1);
        ls.remove(0, &del);

        assert_eq!(ls.get_level(0), &vec![0, 2]);
        assert_eq!(ls.get_vertex_index(0, 0), Some(0));
        assert_eq!(ls.get_vertex_index(0, 2), Some(1));
        assert_eq!(ls.get_vertex_index(0, 1), None);
        assert!(ls.has_level(0));

        let mut del_all = HashSet::new();
        del_all.insert(0);
        del_all.insert(2);
        ls.remove(0, &del_all);
        assert!(!ls.has_level(0));
    }
}
