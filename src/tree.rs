//! The shared search tree: a slot arena of live nodes plus one LIFO stack
//! per worker.
//!
//! Everything in here is mutable state reachable from more than one worker
//! (stealers peek foreign stacks and claim branch colors), so the whole
//! structure lives behind a single `Mutex` in the search context. Callers
//! hold that lock for every operation; nothing here synchronizes on its
//! own.
//!
//! Node handles are `(slot, generation)` pairs. Popping a node frees its
//! slot and bumps the generation, so a handle kept by a stolen child
//! simply goes stale instead of dangling; stale handles are ignored.

use crate::node::SearchNode;

// ============================================================================
// NodeId
// ============================================================================

/// Non-owning, generation-checked handle to an arena slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId {
    slot: u32,
    gen: u32,
}

impl NodeId {
    #[cfg(test)]
    pub(crate) fn test_only(slot: u32, gen: u32) -> Self {
        Self { slot, gen }
    }
}

// ============================================================================
// Tree
// ============================================================================

struct Slot {
    gen: u32,
    node: Option<SearchNode>,
}

/// Arena plus per-worker stacks. Each stack holds a worker's current path
/// from the root; stack ownership is exclusive per worker except that
/// stealers may peek under the lock.
pub(crate) struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    stacks: Vec<Vec<NodeId>>,
}

impl Tree {
    pub fn new(workers: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            stacks: vec![Vec::new(); workers],
        }
    }

    /// Allocates a slot for `node` and pushes it onto `worker`'s stack.
    pub fn publish(&mut self, worker: usize, node: SearchNode) -> NodeId {
        let id = match self.free.pop() {
            Some(slot) => {
                let s = &mut self.slots[slot as usize];
                debug_assert!(s.node.is_none());
                s.node = Some(node);
                NodeId { slot, gen: s.gen }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    gen: 0,
                    node: Some(node),
                });
                NodeId { slot, gen: 0 }
            }
        };
        self.stacks[worker].push(id);
        id
    }

    /// The top of `worker`'s stack.
    pub fn top(&self, worker: usize) -> Option<NodeId> {
        self.stacks[worker].last().copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        let slot = self.slots.get(id.slot as usize)?;
        if slot.gen != id.gen {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SearchNode> {
        let slot = self.slots.get_mut(id.slot as usize)?;
        if slot.gen != id.gen {
            return None;
        }
        slot.node.as_mut()
    }

    /// Pops the top of `worker`'s stack, freeing its slot.
    ///
    /// The freed generation is bumped so any handle still held by a stolen
    /// child goes stale.
    pub fn pop(&mut self, worker: usize) -> Option<SearchNode> {
        let id = self.stacks[worker].pop()?;
        let slot = &mut self.slots[id.slot as usize];
        debug_assert_eq!(slot.gen, id.gen, "stack held a stale handle");
        let node = slot.node.take();
        slot.gen = slot.gen.wrapping_add(1);
        self.free.push(id.slot);
        node
    }

    /// Marks the node failed; a stale handle is a no-op.
    pub fn mark_failed(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.failed = true;
        }
    }

    /// Scans `victim`'s stack from the top toward the root for the nearest
    /// node that still has unclaimed branch colors and is not failed.
    ///
    /// The node stays on the victim's stack: it is returned as a shared
    /// branching point for the stealer.
    pub fn find_steal_point(&self, victim: usize) -> Option<NodeId> {
        for &id in self.stacks[victim].iter().rev() {
            if let Some(node) = self.get(id) {
                if !node.failed && node.branch_remaining() > 0 {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Returns `true` iff every worker's stack is empty.
    pub fn all_stacks_empty(&self) -> bool {
        self.stacks.iter().all(Vec::is_empty)
    }

    /// Number of live nodes, for tracing.
    #[cfg(test)]
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }
}

// ============================================================================
// Tests
// ============================================================================
