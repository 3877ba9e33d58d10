//! Per-vertex candidate-color sets with O(1) membership and removal.
//!
//! A `Domain` is the set of colors still legal for one vertex. Removal
//! swaps the removed entry with the last live entry, so both `remove` and
//! `poll_last` are O(1) and the live values are always `values[0..len)`.
//! Domains only ever shrink along a root-to-leaf path; restoration on
//! backtrack is handled by sharing (`Arc`) and copy-on-write at the node
//! level, never by re-inserting values.

const ABSENT: u32 = u32::MAX;

// ============================================================================
// Domain
// ============================================================================

/// The candidate colors of a single vertex.
#[derive(Clone, Debug)]
pub struct Domain {
    /// Live colors in `values[0..values.len())`, unordered.
    values: Vec<u32>,
    /// `positions[color]` is the index of `color` in `values`, or `ABSENT`.
    positions: Vec<u32>,
}

impl Domain {
    /// Creates the full domain `{0, .., k-1}`.
    pub fn full(k: u32) -> Self {
        Self {
            values: (0..k).collect(),
            positions: (0..k).collect(),
        }
    }

    /// Creates a singleton domain `{color}` out of a `k`-color palette.
    pub fn singleton(k: u32, color: u32) -> Self {
        debug_assert!(color < k);
        let mut positions = vec![ABSENT; k as usize];
        positions[color as usize] = 0;
        Self {
            values: vec![color],
            positions,
        }
    }

    /// Number of live colors.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` iff no color remains.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` iff `color` is still available.
    #[inline]
    pub fn contains(&self, color: u32) -> bool {
        (color as usize) < self.positions.len() && self.positions[color as usize] != ABSENT
    }

    /// The live colors, in no particular order.
    #[inline]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// The sole remaining color, or `None` unless the domain is a singleton.
    #[inline]
    pub fn single(&self) -> Option<u32> {
        if self.values.len() == 1 {
            Some(self.values[0])
        } else {
            None
        }
    }

    /// Removes `color` if present. Returns `false` if it was absent.
    pub fn remove(&mut self, color: u32) -> bool {
        if (color as usize) >= self.positions.len() {
            return false;
        }
        let pos = self.positions[color as usize];
        if pos == ABSENT {
            return false;
        }
        let pos = pos as usize;
        let last = self.values.len() - 1;
        let moved = self.values[last];
        self.values.swap(pos, last);
        self.values.pop();
        self.positions[moved as usize] = pos as u32;
        self.positions[color as usize] = ABSENT;
        true
    }

    /// Removes and returns an arbitrary live color, or `None` if empty.
    pub fn poll_last(&mut self) -> Option<u32> {
        let color = self.values.pop()?;
        self.positions[color as usize] = ABSENT;
        Some(color)
    }
}

// ============================================================================
// Tests
// ============================================================================
