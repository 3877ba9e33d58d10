//! Search-tree nodes: one partial assignment plus the branch point that
//! will generate its children.
//!
//! A node's domains are shared with its parent (`Arc`) until propagation
//! forces a copy, so building a child only duplicates the domains it
//! actually touches. The decided branch vertex and its remaining colors
//! are materialized into [`Branch`] so that owner and stealer workers can
//! claim colors one at a time under the tree lock.

use crate::coloring::Coloring;
use crate::domain::Domain;
use crate::graph::Graph;
use crate::propagate::{propagate, Contradiction};
use crate::tree::NodeId;
use std::sync::Arc;

/// Sentinel decision vertex for the root node.
pub(crate) const ROOT_VERTEX: u32 = u32::MAX;

// ============================================================================
// Branch
// ============================================================================

/// The branching point of a ready node: the chosen minimum-domain vertex
/// and the colors still to be tried on it.
///
/// Colors are arranged so that [`Branch::claim`] yields colors already
/// committed elsewhere in the partial coloring before the single retained
/// "free" color (symmetry-breaking try order).
#[derive(Clone, Debug)]
pub(crate) struct Branch {
    pub vertex: u32,
    colors: Vec<u32>,
}

impl Branch {
    /// Number of colors not yet claimed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.colors.len()
    }

    /// Claims the next color to try. Must only be called while holding the
    /// tree lock: this is the atomic claim that prevents owner and stealer
    /// from building children for the same color.
    #[inline]
    pub fn claim(&mut self) -> Option<u32> {
        self.colors.pop()
    }
}

// ============================================================================
// SearchNode
// ============================================================================

/// One node of the search tree: a propagated partial assignment.
#[derive(Clone, Debug)]
pub(crate) struct SearchNode {
    /// The decision that produced this node (`ROOT_VERTEX` for the root).
    pub vertex: u32,
    pub color: u32,
    /// One domain per vertex, shared with the parent where untouched.
    pub domains: Vec<Arc<Domain>>,
    pub coloring: Coloring,
    /// The next branch point, or `None` once exhausted / complete / failed.
    pub branch: Option<Branch>,
    /// Arena handle of the parent, for the parent-failure shortcut.
    pub parent: Option<NodeId>,
    /// True if creating this node shrank any domain beyond the trigger.
    pub propagated: bool,
    /// True once this node's subtree is known infeasible.
    pub failed: bool,
}

impl SearchNode {
    /// Builds the root node for a `k`-coloring search.
    ///
    /// `seed` vertices get singleton domains and their colors are
    /// propagated immediately; a contradiction here means the seeded
    /// instance is infeasible before any search starts.
    pub fn root(graph: &Graph, k: u32, seed: &Coloring) -> Result<Self, Contradiction> {
        let n = graph.vertex_count();
        let mut domains: Vec<Arc<Domain>> = (0..n as u32)
            .map(|v| match seed.get(v) {
                Some(c) => Arc::new(Domain::singleton(k, c)),
                None => Arc::new(Domain::full(k)),
            })
            .collect();
        let mut coloring = seed.clone();

        let mut propagated = false;
        let pre_fixed: Vec<(u32, u32)> = seed.iter().collect();
        for (v, c) in pre_fixed {
            propagated |= propagate(graph, &mut domains, &mut coloring, v, c)?;
        }

        Ok(Self {
            vertex: ROOT_VERTEX,
            color: 0,
            domains,
            coloring,
            branch: None,
            parent: None,
            propagated,
            failed: false,
        })
    }

    /// Builds the child of `parent_domains`/`parent_coloring` that commits
    /// `vertex = color`, running propagation.
    ///
    /// The snapshots are taken under the tree lock (cheap `Arc` clones);
    /// this constructor runs outside it.
    pub fn child(
        graph: &Graph,
        parent_id: NodeId,
        parent_domains: Vec<Arc<Domain>>,
        parent_coloring: Coloring,
        vertex: u32,
        color: u32,
    ) -> Result<Self, Contradiction> {
        let mut domains = parent_domains;
        let mut coloring = parent_coloring;
        coloring.set(vertex, color);
        domains[vertex as usize] = Arc::new(Domain::singleton(color + 1, color));
        let propagated = propagate(graph, &mut domains, &mut coloring, vertex, color)?;

        Ok(Self {
            vertex,
            color,
            domains,
            coloring,
            branch: None,
            parent: Some(parent_id),
            propagated,
            failed: false,
        })
    }

    /// Returns `true` iff every vertex is colored.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.coloring.is_complete()
    }

    /// Transitions the node from *unexpanded* to *ready* (or *failed*):
    /// chooses the branch vertex by minimum remaining domain, ties broken
    /// by higher degree, and applies symmetry breaking when requested.
    pub fn select_branch(&mut self, graph: &Graph, symmetry_breaking: bool) {
        debug_assert!(self.branch.is_none());
        if self.failed || self.is_complete() {
            return;
        }

        let mut best: Option<(u32, usize)> = None;
        for v in 0..graph.vertex_count() as u32 {
            if self.coloring.get(v).is_some() {
                continue;
            }
            let size = self.domains[v as usize].len();
            if size == 0 {
                // Propagation missed an emptied domain on a non-neighbor.
                self.failed = true;
                return;
            }
            let better = match best {
                None => true,
                Some((bv, bsize)) => {
                    size < bsize || (size == bsize && graph.degree(v) > graph.degree(bv))
                }
            };
            if better {
                best = Some((v, size));
            }
        }

        let Some((vertex, _)) = best else {
            return;
        };

        let values = self.domains[vertex as usize].values();
        let mut colors;
        if symmetry_breaking {
            // Colors are interchangeable labels: of the colors unused in
            // the partial coloring, trying more than one is redundant.
            // The retained free color sits at the bottom of the claim
            // stack so committed colors are tried first.
            let mut used: Vec<u32> = Vec::with_capacity(values.len());
            let mut free: Option<u32> = None;
            for &c in values {
                if self.coloring.uses_color(c) {
                    used.push(c);
                } else if free.is_none() {
                    free = Some(c);
                }
            }
            colors = Vec::with_capacity(used.len() + 1);
            if let Some(f) = free {
                colors.push(f);
            }
            // Claiming pops from the end, so later entries go first.
            used.sort_unstable();
            used.reverse();
            colors.extend(used);
        } else {
            colors = values.to_vec();
        }

        self.branch = Some(Branch { vertex, colors });
    }

    /// Remaining branch colors, 0 once exhausted or if never ready.
    #[inline]
    pub fn branch_remaining(&self) -> usize {
        self.branch.as_ref().map_or(0, Branch::remaining)
    }
}

// ============================================================================
// Tests
// ============================================================================
