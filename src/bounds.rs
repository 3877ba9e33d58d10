//! Bound collaborators for the exact search: a maximal-clique heuristic
//! (lower bound on the chromatic number, also the root's pre-colored seed)
//! and a DSATUR greedy coloring (upper bound and initial assignment).
//!
//! Both are heuristics: the clique is maximal, not maximum, and the greedy
//! color count may exceed the chromatic number. The exact engine only
//! relies on them being valid bounds.

use crate::coloring::Coloring;
use crate::graph::Graph;
use std::collections::HashSet;

// ============================================================================
// Maximal clique
// ============================================================================

/// Greedily grows a maximal clique, starting from a highest-degree vertex
/// and always extending with the highest-degree common neighbor.
///
/// Returns the clique as a sorted vertex list; empty only for the empty
/// graph.
pub fn maximal_clique(graph: &Graph) -> Vec<u32> {
    let n = graph.vertex_count();
    if n == 0 {
        return Vec::new();
    }

    let start = (0..n as u32)
        .max_by_key(|&v| graph.degree(v))
        .unwrap_or(0);
    let mut clique = vec![start];
    let mut candidates: Vec<u32> = graph.neighbors(start).to_vec();

    while let Some(&next) = candidates.iter().max_by_key(|&&v| graph.degree(v)) {
        clique.push(next);
        candidates.retain(|&v| v != next && graph.has_edge(v, next));
    }

    clique.sort_unstable();
    clique
}

// ============================================================================
// Greedy coloring (DSATUR)
// ============================================================================

/// DSATUR greedy coloring: repeatedly color the uncolored vertex with the
/// most distinctly-colored neighbors (saturation), ties broken by degree,
/// using the smallest color not present in its neighborhood.
///
/// A `seed` pre-fixes some vertices; the result always extends it, so the
/// returned color count is a valid upper bound for seeded searches too.
/// The seed must be proper; this is the caller's responsibility.
pub fn greedy_coloring(graph: &Graph, seed: Option<&Coloring>) -> Coloring {
    let n = graph.vertex_count();
    let mut coloring = match seed {
        Some(s) => s.clone(),
        None => Coloring::new(n),
    };

    let mut neighbor_colors: Vec<HashSet<u32>> = vec![HashSet::new(); n];
    for v in 0..n as u32 {
        if let Some(c) = coloring.get(v) {
            for &u in graph.neighbors(v) {
                neighbor_colors[u as usize].insert(c);
            }
        }
    }

    loop {
        let pick = (0..n as u32)
            .filter(|&v| coloring.get(v).is_none())
            .max_by_key(|&v| (neighbor_colors[v as usize].len(), graph.degree(v)));
        let Some(v) = pick else { break };

        let mut color = 0u32;
        while neighbor_colors[v as usize].contains(&color) {
            color += 1;
        }
        coloring.set(v, color);
        for &u in graph.neighbors(v) {
            neighbor_colors[u as usize].insert(color);
        }
    }

    coloring
}

// ============================================================================
// Tests
// ============================================================================
