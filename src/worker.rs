//! The per-thread search worker and the shared search context.
//!
//! Every worker runs iterative depth-first exploration over its own stack
//! of [`SearchNode`]s; an idle worker steals a branching point from a
//! random victim. All state visible to more than one worker (the tree, a
//! node's branch colors) is touched only under the context's single tree
//! lock; building a child node (domain copies, propagation) happens on
//! private snapshots outside it.

use crate::coloring::Coloring;
use crate::domain::Domain;
use crate::graph::Graph;
use crate::node::SearchNode;
use crate::tree::{NodeId, Tree};
use crossbeam::queue::SegQueue;
use log::{debug, trace};
use rand::prelude::*;
use rand::rngs::SmallRng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ============================================================================
// Search context
// ============================================================================

/// What the round is looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SearchMode {
    /// Stop at the first valid coloring; symmetry breaking enabled.
    Single,
    /// Enumerate colorings up to the solution limit; symmetry breaking and
    /// the parent-failure shortcut disabled.
    Enumerate,
}

/// Shared state of one `solve(k)` round, passed by reference to every
/// worker.
pub(crate) struct SearchCtx<'g> {
    pub graph: &'g Graph,
    pub k: u32,
    pub mode: SearchMode,
    /// The single search lock: tree, stacks, and node mutable state.
    pub tree: Mutex<Tree>,
    /// Accepted solutions (lock-free; recording never contends on the tree).
    pub solutions: SegQueue<Coloring>,
    pub solution_count: AtomicUsize,
    pub solution_limit: usize,
    /// Cooperative termination.
    pub stop: AtomicBool,
    pub time_expired: AtomicBool,
    pub deadline: Option<Instant>,
    /// Branch colors claimed under the lock but not yet published or
    /// discarded. Exhaustion requires empty stacks *and* zero claims in
    /// flight, otherwise a stealer's child could be abandoned mid-build.
    claims_in_flight: AtomicUsize,
    pub num_workers: usize,
    pub parent_failure_shortcut: bool,
    pub base_seed: u64,
}

impl<'g> SearchCtx<'g> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &'g Graph,
        k: u32,
        mode: SearchMode,
        num_workers: usize,
        solution_limit: usize,
        deadline: Option<Instant>,
        parent_failure_shortcut: bool,
        base_seed: u64,
    ) -> Self {
        Self {
            graph,
            k,
            mode,
            tree: Mutex::new(Tree::new(num_workers)),
            solutions: SegQueue::new(),
            solution_count: AtomicUsize::new(0),
            solution_limit,
            stop: AtomicBool::new(false),
            time_expired: AtomicBool::new(false),
            deadline,
            claims_in_flight: AtomicUsize::new(0),
            num_workers,
            parent_failure_shortcut,
            base_seed,
        }
    }

    /// Symmetry breaking is a single-solution optimization only.
    #[inline]
    pub fn symmetry_breaking(&self) -> bool {
        self.mode == SearchMode::Single
    }

    /// Records a validated solution; flips the stop flag once the quota is
    /// reached.
    fn record_solution(&self, coloring: Coloring) {
        let prev = self.solution_count.fetch_add(1, Ordering::SeqCst);
        if prev < self.solution_limit {
            self.solutions.push(coloring);
        }
        if prev + 1 >= self.solution_limit {
            self.stop.store(true, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Worker loop
// ============================================================================

/// One unit of work pulled out from under the tree lock.
enum Step {
    /// Build the child `parent[vertex] = color` from the given snapshots.
    Extend {
        parent: NodeId,
        vertex: u32,
        color: u32,
        domains: Vec<Arc<Domain>>,
        coloring: Coloring,
    },
    /// A node was popped or recorded inside the lock; loop again.
    Handled,
    /// No own work and nothing to steal right now.
    Starved,
    /// Every stack is empty and no claim is in flight: the search space
    /// is exhausted. Decided under the tree lock, so it is final.
    Exhausted,
}

/// Runs one worker until the round terminates.
pub(crate) fn run(ctx: &SearchCtx<'_>, worker_id: usize) {
    let mut rng = SmallRng::seed_from_u64(splitmix64(ctx.base_seed ^ worker_id as u64));
    let mut victims: Vec<usize> = (0..ctx.num_workers).filter(|&w| w != worker_id).collect();

    loop {
        if ctx.stop.load(Ordering::Relaxed) {
            break;
        }
        if let Some(deadline) = ctx.deadline {
            if Instant::now() >= deadline {
                ctx.time_expired.store(true, Ordering::SeqCst);
                ctx.stop.store(true, Ordering::SeqCst);
                debug!("worker {worker_id}: time limit reached");
                break;
            }
        }

        match next_step(ctx, worker_id, &mut victims, &mut rng) {
            Step::Handled => {}
            Step::Extend {
                parent,
                vertex,
                color,
                domains,
                coloring,
            } => {
                extend(ctx, worker_id, parent, vertex, color, domains, coloring);
            }
            Step::Starved => std::thread::sleep(Duration::from_micros(50)),
            Step::Exhausted => {
                ctx.stop.store(true, Ordering::SeqCst);
                break;
            }
        }
    }
}

/// Acquires the next unit of work under the tree lock.
///
/// Pops completed / failed / exhausted nodes, records solutions, claims a
/// branch color for extension, or falls back to stealing.
fn next_step(
    ctx: &SearchCtx<'_>,
    worker_id: usize,
    victims: &mut [usize],
    rng: &mut SmallRng,
) -> Step {
    let mut tree = ctx.tree.lock().unwrap_or_else(|e| e.into_inner());

    let Some(top) = tree.top(worker_id) else {
        let step = steal(ctx, &mut tree, victims, rng);
        if matches!(step, Step::Starved)
            && tree.all_stacks_empty()
            && ctx.claims_in_flight.load(Ordering::SeqCst) == 0
        {
            // Checked while still holding the lock: no node anywhere and
            // no claimed color awaiting its child.
            return Step::Exhausted;
        }
        return step;
    };

    // The top of our own stack is always live.
    let node = match tree.get_mut(top) {
        Some(node) => node,
        None => return Step::Handled,
    };

    if node.failed {
        tree.pop(worker_id);
        return Step::Handled;
    }

    if node.is_complete() {
        let node = match tree.pop(worker_id) {
            Some(n) => n,
            None => return Step::Handled,
        };
        drop(tree);
        // Propagation should make an improper complete node impossible.
        if node.coloring.is_valid_k_coloring(ctx.graph, ctx.k) {
            trace!("worker {worker_id}: solution found");
            ctx.record_solution(node.coloring);
        } else {
            debug!("worker {worker_id}: discarded an improper complete node");
        }
        return Step::Handled;
    }

    if let Some(branch) = node.branch.as_mut() {
        if let Some(color) = branch.claim() {
            let vertex = branch.vertex;
            let domains = node.domains.clone();
            let coloring = node.coloring.clone();
            // Still under the lock: the claim and the in-flight mark are
            // one atomic event to every exhaustion check.
            ctx.claims_in_flight.fetch_add(1, Ordering::SeqCst);
            return Step::Extend {
                parent: top,
                vertex,
                color,
                domains,
                coloring,
            };
        }
    }

    // Exhausted: no colors left to try.
    let shortcut = ctx.parent_failure_shortcut && ctx.mode == SearchMode::Single;
    if let Some(popped) = tree.pop(worker_id) {
        if shortcut && !popped.propagated {
            // Reaching this node shrank nothing, so its exhaustion
            // reflects on the parent's whole branch point.
            if let Some(parent) = popped.parent {
                tree.mark_failed(parent);
            }
        }
    }
    Step::Handled
}

/// Work stealing: visit victims in random order and take the branching
/// point nearest the top of the first stack that has one. The node stays
/// on its owner's stack; we only claim one color from it.
fn steal(ctx: &SearchCtx<'_>, tree: &mut Tree, victims: &mut [usize], rng: &mut SmallRng) -> Step {
    victims.shuffle(rng);
    for &victim in victims.iter() {
        let Some(id) = tree.find_steal_point(victim) else {
            continue;
        };
        let Some(node) = tree.get_mut(id) else {
            continue;
        };
        // Claim under the same lock the owner uses: the color can never be
        // handed out twice.
        let Some(branch) = node.branch.as_mut() else {
            continue;
        };
        let vertex = branch.vertex;
        if let Some(color) = branch.claim() {
            let domains = node.domains.clone();
            let coloring = node.coloring.clone();
            ctx.claims_in_flight.fetch_add(1, Ordering::SeqCst);
            trace!("stole a branch point from worker {victim}");
            return Step::Extend {
                parent: id,
                vertex,
                color,
                domains,
                coloring,
            };
        }
    }
    Step::Starved
}

/// Builds, propagates, selects, and publishes one child node. Runs outside
/// the lock except for the final publish.
fn extend(
    ctx: &SearchCtx<'_>,
    worker_id: usize,
    parent: NodeId,
    vertex: u32,
    color: u32,
    domains: Vec<Arc<Domain>>,
    coloring: Coloring,
) {
    let child = match SearchNode::child(ctx.graph, parent, domains, coloring, vertex, color) {
        Ok(child) => child,
        Err(_) => {
            // Contradiction: the branch is infeasible, discard quietly.
            ctx.claims_in_flight.fetch_sub(1, Ordering::SeqCst);
            return;
        }
    };

    let mut child = child;
    child.select_branch(ctx.graph, ctx.symmetry_breaking());
    if child.failed {
        ctx.claims_in_flight.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    let mut tree = ctx.tree.lock().unwrap_or_else(|e| e.into_inner());
    tree.publish(worker_id, child);
    // Released only after the child is visible on a stack, so no
    // exhaustion check can fire in the gap.
    ctx.claims_in_flight.fetch_sub(1, Ordering::SeqCst);
    drop(tree);
}

// ============================================================================
// Seeding
// ============================================================================

/// SplitMix64 mixer for deriving per-worker RNG seeds from a base seed.
#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph;

    fn ctx_for<'g>(graph: &'g Graph, k: u32, mode: SearchMode, workers: usize) -> SearchCtx<'g> {
        let limit = match mode {
            SearchMode::Single => 1,
            SearchMode::Enumerate => usize::MAX,
        };
        SearchCtx::new(graph, k, mode, workers, limit, None, true, 0xABCD)
    }

    fn run_round(ctx: &SearchCtx<'_>) -> Vec<Coloring> {
        let root = SearchNode::root(ctx.graph, ctx.k, &Coloring::new(ctx.graph.vertex_count()))
            .expect("root must be feasible in these tests");
        let mut root = root;
        root.select_branch(ctx.graph, ctx.symmetry_breaking());
        {
            let mut tree = ctx.tree.lock().unwrap();
            tree.publish(0, root);
        }
        std::thread::scope(|s| {
            for w in 0..ctx.num_workers {
                s.spawn(move || run(ctx, w));
            }
        });
        let mut out = Vec::new();
        while let Some(c) = ctx.solutions.pop() {
            out.push(c);
        }
        out
    }

    #[test]
    fn splitmix64_is_deterministic() {
        assert_eq!(splitmix64(7), splitmix64(7));
        assert_ne!(splitmix64(7), splitmix64(8));
    }

    #[test]
    fn single_worker_finds_a_cycle_coloring() {
        let g = graph::cycle(5);
        let ctx = ctx_for(&g, 3, SearchMode::Single, 1);
        let sols = run_round(&ctx);
        assert_eq!(sols.len(), 1);
        assert!(sols[0].is_valid_k_coloring(&g, 3));
        assert!(!ctx.time_expired.load(Ordering::SeqCst));
    }

    #[test]
    fn single_worker_proves_infeasibility() {
        let g = graph::cycle(5);
        let ctx = ctx_for(&g, 2, SearchMode::Single, 1);
        let sols = run_round(&ctx);
        assert!(sols.is_empty());
        assert!(!ctx.time_expired.load(Ordering::SeqCst));
    }

    #[test]
    fn four_workers_agree_with_one() {
        let g = graph::complete(4);
        let ctx = ctx_for(&g, 3, SearchMode::Single, 4);
        assert!(run_round(&ctx).is_empty());

        let ctx = ctx_for(&g, 4, SearchMode::Single, 4);
        let sols = run_round(&ctx);
        assert_eq!(sols.len(), 1);
        assert!(sols[0].is_valid_k_coloring(&g, 4));
    }

    #[test]
    fn enumeration_counts_triangle_colorings() {
        let g = graph::complete(3);
        let ctx = ctx_for(&g, 3, SearchMode::Enumerate, 2);
        let sols = run_round(&ctx);
        // 3! label permutations.
        assert_eq!(sols.len(), 6);
        for s in &sols {
            assert!(s.is_valid_k_coloring(&g, 3));
        }
        // All distinct.
        for i in 0..sols.len() {
            for j in (i + 1)..sols.len() {
                assert!(sols[i] != sols[j]);
            }
        }
    }

    #[test]
    fn claimed_branch_blocks_exhaustion_until_published() {
        // One vertex, one color, two workers: worker 1 steals the root's
        // only color, then worker 0 pops the exhausted root. With every
        // stack empty but the claim unresolved, the search must report
        // starvation, not exhaustion, or the stolen child's solution is
        // lost.
        let g = graph::complete(1);
        let ctx = ctx_for(&g, 1, SearchMode::Enumerate, 2);
        let mut root = SearchNode::root(&g, 1, &Coloring::new(1)).unwrap();
        root.select_branch(&g, ctx.symmetry_breaking());
        ctx.tree.lock().unwrap().publish(0, root);

        let mut rng = SmallRng::seed_from_u64(1);
        let mut victims_w1 = vec![0usize];
        let mut victims_w0 = vec![1usize];

        // Worker 1: own stack empty, steals the only color of the root.
        let step = next_step(&ctx, 1, &mut victims_w1, &mut rng);
        let Step::Extend {
            parent,
            vertex,
            color,
            domains,
            coloring,
        } = step
        else {
            panic!("worker 1 should have claimed the only color");
        };

        // Worker 0: the root is now exhausted and gets popped.
        assert!(matches!(
            next_step(&ctx, 0, &mut victims_w0, &mut rng),
            Step::Handled
        ));
        assert!(ctx.tree.lock().unwrap().all_stacks_empty());

        // The claim is still in flight: no exhaustion yet.
        assert!(matches!(
            next_step(&ctx, 0, &mut victims_w0, &mut rng),
            Step::Starved
        ));

        // Worker 1 finishes building and publishing its child; the
        // solution it leads to is recorded, not abandoned.
        extend(&ctx, 1, parent, vertex, color, domains, coloring);
        assert!(matches!(
            next_step(&ctx, 1, &mut victims_w1, &mut rng),
            Step::Handled
        ));
        assert_eq!(ctx.solution_count.load(Ordering::SeqCst), 1);

        // Everything drained: now exhaustion is final.
        assert!(matches!(
            next_step(&ctx, 0, &mut victims_w0, &mut rng),
            Step::Exhausted
        ));
    }

    #[test]
    fn deadline_in_the_past_expires_immediately() {
        let g = graph::complete(6);
        let ctx = SearchCtx::new(
            &g,
            5,
            SearchMode::Single,
            2,
            1,
            Some(Instant::now() - Duration::from_millis(1)),
            true,
            1,
        );
        let sols = run_round(&ctx);
        assert!(sols.is_empty());
        assert!(ctx.time_expired.load(Ordering::SeqCst));
    }
}
