//! Partial and total color assignments.

use crate::graph::Graph;
use std::fmt;

/// Sentinel stored for vertices that have not been assigned a color yet.
pub(crate) const NO_COLOR: u32 = u32::MAX;

// ============================================================================
// Coloring
// ============================================================================

/// A (possibly partial) assignment of colors to vertices.
///
/// Colors are dense labels `0..k`. The assignment is indexed by the dense
/// vertex index of the graph it was created for.
#[derive(Clone, PartialEq, Eq)]
pub struct Coloring {
    slots: Vec<u32>,
    assigned: usize,
}

impl Coloring {
    /// Creates an empty coloring for `n` vertices.
    pub fn new(n: usize) -> Self {
        Self {
            slots: vec![NO_COLOR; n],
            assigned: 0,
        }
    }

    /// Number of vertices the coloring covers.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` for the zero-vertex coloring.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The color of `v`, or `None` if unassigned.
    #[inline]
    pub fn get(&self, v: u32) -> Option<u32> {
        match self.slots[v as usize] {
            NO_COLOR => None,
            c => Some(c),
        }
    }

    /// Assigns `color` to `v`, replacing any previous assignment.
    #[inline]
    pub fn set(&mut self, v: u32, color: u32) {
        debug_assert_ne!(color, NO_COLOR);
        if self.slots[v as usize] == NO_COLOR {
            self.assigned += 1;
        }
        self.slots[v as usize] = color;
    }

    /// Removes the assignment of `v`, if any.
    pub fn clear(&mut self, v: u32) {
        if self.slots[v as usize] != NO_COLOR {
            self.assigned -= 1;
            self.slots[v as usize] = NO_COLOR;
        }
    }

    /// Number of vertices currently assigned.
    #[inline]
    pub fn assigned_count(&self) -> usize {
        self.assigned
    }

    /// Returns `true` iff every vertex has a color.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.assigned == self.slots.len()
    }

    /// Returns `true` iff `color` is assigned to at least one vertex.
    pub fn uses_color(&self, color: u32) -> bool {
        self.slots.iter().any(|&c| c == color)
    }

    /// Number of distinct colors in use.
    pub fn color_count(&self) -> usize {
        let mut seen: Vec<u32> = self
            .slots
            .iter()
            .copied()
            .filter(|&c| c != NO_COLOR)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Checks that no edge of `graph` joins two equal-colored vertices.
    ///
    /// Unassigned vertices are ignored, so a partial assignment is proper
    /// as long as its assigned portion is conflict-free.
    pub fn is_proper(&self, graph: &Graph) -> bool {
        for v in 0..graph.vertex_count() as u32 {
            let cv = self.slots[v as usize];
            if cv == NO_COLOR {
                continue;
            }
            for &u in graph.neighbors(v) {
                if u > v && self.slots[u as usize] == cv {
                    return false;
                }
            }
        }
        true
    }

    /// Returns `true` iff the coloring is complete, proper, and uses only
    /// colors in `[0, k)`.
    pub fn is_valid_k_coloring(&self, graph: &Graph, k: u32) -> bool {
        self.is_complete()
            && self.slots.iter().all(|&c| c < k)
            && self.is_proper(graph)
    }

    /// Iterator over `(vertex, color)` pairs for assigned vertices.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != NO_COLOR)
            .map(|(v, &c)| (v as u32, c))
    }
}

impl fmt::Debug for Coloring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coloring[")?;
        for (i, &c) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if c == NO_COLOR {
                write!(f, "-")?;
            } else {
                write!(f, "{c}")?;
            }
        }
        write!(f, "]")
    }
}

// ============================================================================
// Tests
// ============================================================================
