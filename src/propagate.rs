//! Forward-checking constraint propagation.
//!
//! After fixing `vertex = color`, the color is removed from every uncolored
//! neighbor's domain. A removal that leaves a singleton domain forces that
//! assignment, which is queued and propagated in turn (unit cascade). This
//! is single-level forward checking, not arc consistency: sound but
//! incomplete, with O(degree) amortized work per queue entry.

use crate::coloring::Coloring;
use crate::domain::Domain;
use crate::graph::Graph;
use std::collections::VecDeque;
use std::sync::Arc;

/// Marker for a propagation failure: some domain was emptied, so the
/// enclosing branch is infeasible. Purely local control flow, never
/// surfaced to callers of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contradiction;

/// Propagates the forced assignment `vertex = color` through `domains`.
///
/// `coloring` must already record `vertex = color`. Domains shared with a
/// parent node are copied on first write (`Arc::make_mut`), so the
/// parent's state is never disturbed.
///
/// Returns `Ok(true)` if any domain other than a triggering singleton was
/// shrunk (the node's `propagated` flag), `Ok(false)` if the assignment
/// touched nothing, and `Err(Contradiction)` if a domain was emptied.
pub fn propagate(
    graph: &Graph,
    domains: &mut [Arc<Domain>],
    coloring: &mut Coloring,
    vertex: u32,
    color: u32,
) -> Result<bool, Contradiction> {
    debug_assert_eq!(coloring.get(vertex), Some(color));

    let mut queue = VecDeque::new();
    queue.push_back((vertex, color));
    let mut shrunk = false;

    while let Some((x, col)) = queue.pop_front() {
        for &u in graph.neighbors(x) {
            if coloring.get(u).is_some() {
                continue;
            }
            let dom = &mut domains[u as usize];
            if !dom.contains(col) {
                continue;
            }
            let dom = Arc::make_mut(dom);
            dom.remove(col);
            shrunk = true;
            match dom.len() {
                0 => return Err(Contradiction),
                1 => {
                    // Forced assignment: cascade.
                    let forced = dom.values()[0];
                    coloring.set(u, forced);
                    queue.push_back((u, forced));
                }
                _ => {}
            }
        }
    }

    Ok(shrunk)
}

// ============================================================================
// Tests
// ============================================================================
