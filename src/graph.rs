//! Dense-index undirected graph used by the coloring engine.
//!
//! The engine only ever reads the topology: neighbor iteration, degree,
//! and edge tests. Vertices are dense indices `0..n`, adjacency is stored
//! both as sorted neighbor lists (fast iteration) and as bitset rows
//! (O(1) edge tests).

use std::fmt;

// ============================================================================
// Bitset helpers
// ============================================================================

/// Number of `u64` words needed to cover `n` bits.
#[inline(always)]
pub(crate) const fn words_for(n: usize) -> usize {
    n.div_ceil(64)
}

#[inline(always)]
const fn word_bit(v: usize) -> (usize, u64) {
    (v / 64, 1u64 << (v % 64))
}

// ============================================================================
// Graph
// ============================================================================

/// An undirected graph on vertices `0..n` with no self-loops.
///
/// Parallel edges are collapsed on construction.
#[derive(Clone)]
pub struct Graph {
    n: usize,
    /// Sorted neighbor lists, one per vertex.
    neighbors: Vec<Vec<u32>>,
    /// Adjacency bitset rows, `words_for(n)` words per vertex.
    rows: Vec<u64>,
    words: usize,
    edge_count: usize,
}

impl Graph {
    /// Creates a graph with `n` vertices and no edges.
    pub fn new(n: usize) -> Self {
        let words = words_for(n);
        Self {
            n,
            neighbors: vec![Vec::new(); n],
            rows: vec![0u64; n * words],
            words,
            edge_count: 0,
        }
    }

    /// Builds a graph from an edge list.
    ///
    /// # Panics
    /// Panics if an endpoint is out of range or an edge is a self-loop.
    pub fn from_edges(n: usize, edges: &[(u32, u32)]) -> Self {
        let mut g = Self::new(n);
        for &(u, v) in edges {
            g.add_edge(u, v);
        }
        g
    }

    /// Adds the undirected edge `{u, v}`. Adding an existing edge is a no-op.
    ///
    /// # Panics
    /// Panics if an endpoint is out of range or `u == v`.
    pub fn add_edge(&mut self, u: u32, v: u32) {
        let (u, v) = (u as usize, v as usize);
        assert!(u < self.n && v < self.n, "edge ({u},{v}) out of range for n={}", self.n);
        assert_ne!(u, v, "self-loop at vertex {u}");
        if self.has_edge(u as u32, v as u32) {
            return;
        }
        let (wu, bu) = word_bit(v);
        let (wv, bv) = word_bit(u);
        self.rows[u * self.words + wu] |= bu;
        self.rows[v * self.words + wv] |= bv;
        let pos = self.neighbors[u].partition_point(|&x| x < v as u32);
        self.neighbors[u].insert(pos, v as u32);
        let pos = self.neighbors[v].partition_point(|&x| x < u as u32);
        self.neighbors[v].insert(pos, u as u32);
        self.edge_count += 1;
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.n
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Degree of `v`.
    #[inline]
    pub fn degree(&self, v: u32) -> usize {
        self.neighbors[v as usize].len()
    }

    /// Sorted neighbors of `v`.
    #[inline]
    pub fn neighbors(&self, v: u32) -> &[u32] {
        &self.neighbors[v as usize]
    }

    /// Returns `true` iff the edge `{u, v}` exists.
    #[inline]
    pub fn has_edge(&self, u: u32, v: u32) -> bool {
        let (w, b) = word_bit(v as usize);
        self.rows[u as usize * self.words + w] & b != 0
    }

    /// Maximum degree over all vertices (0 for the empty graph).
    pub fn max_degree(&self) -> usize {
        self.neighbors.iter().map(Vec::len).max().unwrap_or(0)
    }

    // ------------------------------------------------------------------------
    // Decomposition
    // ------------------------------------------------------------------------

    /// Connected components as sorted vertex lists.
    pub fn connected_components(&self) -> Vec<Vec<u32>> {
        let mut seen = vec![false; self.n];
        let mut components = Vec::new();
        let mut queue = Vec::new();
        for start in 0..self.n {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            queue.push(start as u32);
            let mut comp = Vec::new();
            while let Some(v) = queue.pop() {
                comp.push(v);
                for &u in self.neighbors(v) {
                    if !seen[u as usize] {
                        seen[u as usize] = true;
                        queue.push(u);
                    }
                }
            }
            comp.sort_unstable();
            components.push(comp);
        }
        components
    }

    /// Induced subgraph on `verts` (which must be sorted and duplicate-free).
    ///
    /// Returns the subgraph together with the mapping from subgraph index
    /// to original vertex: `mapping[i]` is the original id of subgraph
    /// vertex `i`.
    pub fn induced(&self, verts: &[u32]) -> (Graph, Vec<u32>) {
        debug_assert!(verts.windows(2).all(|w| w[0] < w[1]), "verts must be sorted unique");
        let mut local = vec![u32::MAX; self.n];
        for (i, &v) in verts.iter().enumerate() {
            local[v as usize] = i as u32;
        }
        let mut g = Graph::new(verts.len());
        for &v in verts {
            for &u in self.neighbors(v) {
                if u > v && local[u as usize] != u32::MAX {
                    g.add_edge(local[v as usize], local[u as usize]);
                }
            }
        }
        (g, verts.to_vec())
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("vertices", &self.n)
            .field("edges", &self.edge_count)
            .finish()
    }
}

// ============================================================================
// Common constructions (used heavily by tests and the CLI)
// ============================================================================

/// The cycle graph `C_n`.
pub fn cycle(n: usize) -> Graph {
    let mut g = Graph::new(n);
    if n >= 3 {
        for v in 0..n {
            g.add_edge(v as u32, ((v + 1) % n) as u32);
        }
    }
    g
}

/// The complete graph `K_n`.
pub fn complete(n: usize) -> Graph {
    let mut g = Graph::new(n);
    for u in 0..n {
        for v in (u + 1)..n {
            g.add_edge(u as u32, v as u32);
        }
    }
    g
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_symmetric_and_deduplicated() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 0);
        g.add_edge(2, 3);
        assert_eq!(g.edge_count(), 2);
        assert!(g.has_edge(0, 1));
        assert!(g.has_edge(1, 0));
        assert!(!g.has_edge(0, 2));
        assert_eq!(g.neighbors(1), &[0]);
        assert_eq!(g.degree(0), 1);
    }

    #[test]
    #[should_panic(expected = "self-loop")]
    fn self_loops_are_rejected() {
        let mut g = Graph::new(3);
        g.add_edge(1, 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_edges_are_rejected() {
        let mut g = Graph::new(3);
        g.add_edge(0, 3);
    }

    #[test]
    fn neighbor_lists_stay_sorted() {
        let g = Graph::from_edges(5, &[(3, 1), (3, 4), (3, 0), (3, 2)]);
        assert_eq!(g.neighbors(3), &[0, 1, 2, 4]);
    }

    #[test]
    fn bitset_rows_cross_word_boundary() {
        let mut g = Graph::new(130);
        g.add_edge(0, 129);
        g.add_edge(64, 65);
        assert!(g.has_edge(129, 0));
        assert!(g.has_edge(65, 64));
        assert!(!g.has_edge(0, 64));
    }

    #[test]
    fn components_of_two_triangles() {
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let comps = g.connected_components();
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0], vec![0, 1, 2]);
        assert_eq!(comps[1], vec![3, 4, 5]);
    }

    #[test]
    fn isolated_vertices_are_their_own_components() {
        let g = Graph::from_edges(4, &[(1, 2)]);
        let comps = g.connected_components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0], vec![0]);
        assert_eq!(comps[1], vec![1, 2]);
        assert_eq!(comps[2], vec![3]);
    }

    #[test]
    fn induced_subgraph_relabels_edges() {
        let g = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let (sub, mapping) = g.induced(&[3, 4, 5]);
        assert_eq!(sub.vertex_count(), 3);
        assert_eq!(sub.edge_count(), 3);
        assert!(sub.has_edge(0, 1));
        assert!(sub.has_edge(1, 2));
        assert!(sub.has_edge(0, 2));
        assert_eq!(mapping, vec![3, 4, 5]);
    }

    #[test]
    fn cycle_and_complete_builders() {
        let c5 = cycle(5);
        assert_eq!(c5.edge_count(), 5);
        assert!(c5.has_edge(4, 0));
        let k4 = complete(4);
        assert_eq!(k4.edge_count(), 6);
        assert_eq!(k4.max_degree(), 3);
    }
}
