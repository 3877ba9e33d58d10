//! The driver: bound computation, component decomposition, iterative
//! deepening over the color count, and the worker-pool lifecycle.
//!
//! All infeasibility is reported as `None` / an empty vec. Running out of
//! the time budget is reported separately through
//! [`Solver::is_time_expired`], so the caller never mistakes a timeout for
//! a proof of infeasibility. The only error surfaced to the caller is a
//! malformed seed coloring, rejected eagerly before any search thread
//! starts.

use crate::bounds::{greedy_coloring, maximal_clique};
use crate::coloring::Coloring;
use crate::graph::Graph;
use crate::node::SearchNode;
use crate::worker::{self, SearchCtx, SearchMode};
use log::{debug, info};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

/// Solver tuning knobs.
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Worker threads per search round; 0 = one per available core.
    pub workers: usize,
    /// Wall-clock budget in milliseconds; 0 = unbounded.
    pub time_limit_ms: u64,
    /// Base RNG seed for the stealers' victim ordering. `None` = random.
    pub base_seed: Option<u64>,
    /// Mark a parent failed when an unpropagated child exhausts. Safe to
    /// disable if a coloring variant interacts badly with it.
    pub parent_failure_shortcut: bool,
    /// Stop the deepening loop at the first infeasible `k`. Disable for
    /// coloring variants where feasibility is not monotonic in `k`.
    pub assume_monotonic: bool,
    /// Cap on enumerated solutions in [`Solver::find_all_colorings`].
    pub solution_limit: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            time_limit_ms: 0,
            base_seed: None,
            parent_failure_shortcut: true,
            assume_monotonic: true,
            solution_limit: usize::MAX,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected caller input. Search-level infeasibility is never an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    /// The seed coloring covers a different vertex count than the graph.
    #[error("seed coloring covers {got} vertices but the graph has {want}")]
    SeedSizeMismatch { got: usize, want: usize },
    /// The seed assigns one color to two adjacent vertices.
    #[error("seed coloring assigns color {color} to adjacent vertices {u} and {v}")]
    SeedConflict { u: u32, v: u32, color: u32 },
}

// ============================================================================
// Solver
// ============================================================================

/// Exact vertex-coloring solver over a fixed graph.
pub struct Solver<'g> {
    graph: &'g Graph,
    config: SolverConfig,
    seed: Option<Coloring>,
    time_expired: AtomicBool,
}

impl<'g> Solver<'g> {
    /// Creates a solver with default configuration.
    pub fn new(graph: &'g Graph) -> Self {
        Self::with_config(graph, SolverConfig::default())
    }

    /// Creates a solver with an explicit configuration.
    pub fn with_config(graph: &'g Graph, config: SolverConfig) -> Self {
        Self {
            graph,
            config,
            seed: None,
            time_expired: AtomicBool::new(false),
        }
    }

    /// Pre-fixes some vertices before search begins.
    ///
    /// The seed is validated eagerly: a partial coloring that assigns one
    /// color to two adjacent vertices is rejected here, before any thread
    /// starts.
    pub fn set_seed(&mut self, seed: Coloring) -> Result<(), SolveError> {
        let want = self.graph.vertex_count();
        if seed.len() != want {
            return Err(SolveError::SeedSizeMismatch {
                got: seed.len(),
                want,
            });
        }
        for v in 0..want as u32 {
            let Some(c) = seed.get(v) else { continue };
            for &u in self.graph.neighbors(v) {
                if u > v && seed.get(u) == Some(c) {
                    return Err(SolveError::SeedConflict { u: v, v: u, color: c });
                }
            }
        }
        self.seed = Some(seed);
        Ok(())
    }

    /// Sets the wall-clock budget in milliseconds (0 = unbounded).
    pub fn set_time_limit_ms(&mut self, ms: u64) {
        self.config.time_limit_ms = ms;
    }

    /// True if the most recent `find_*` call ran out of its time budget.
    /// A `None` result with this flag set is *not* a proof of
    /// infeasibility.
    pub fn is_time_expired(&self) -> bool {
        self.time_expired.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------------
    // Public search entry points
    // ------------------------------------------------------------------------

    /// Best-effort optimum coloring: per connected component, iterative
    /// deepening from the greedy upper bound down to the clique lower
    /// bound. Components share the color space.
    ///
    /// Returns the best coloring found; under a time limit this may not be
    /// optimal (check [`Solver::is_time_expired`]).
    pub fn find_coloring(&self) -> Option<Coloring> {
        self.time_expired.store(false, Ordering::SeqCst);
        let deadline = self.deadline();
        let n = self.graph.vertex_count();
        if n == 0 {
            return Some(Coloring::new(0));
        }

        let mut merged = Coloring::new(n);
        for comp in self.graph.connected_components() {
            let (sub, mapping) = self.graph.induced(&comp);
            let local_seed = self.restrict_seed(&sub, &mapping);
            let best = self.optimize_component(&sub, local_seed.as_ref(), deadline);
            for (local, &orig) in mapping.iter().enumerate() {
                if let Some(c) = best.get(local as u32) {
                    merged.set(orig, c);
                }
            }
        }

        debug_assert!(merged.is_complete());
        info!("chromatic search finished: {} colors", merged.color_count());
        Some(merged)
    }

    /// Decision procedure: a proper coloring with at most `k` colors, or
    /// `None` if there is none, or if the time budget ran out (check
    /// [`Solver::is_time_expired`]).
    pub fn find_coloring_k(&self, k: u32) -> Option<Coloring> {
        self.time_expired.store(false, Ordering::SeqCst);
        let deadline = self.deadline();
        let n = self.graph.vertex_count();
        if n == 0 {
            return Some(Coloring::new(0));
        }

        let mut merged = Coloring::new(n);
        for comp in self.graph.connected_components() {
            let (sub, mapping) = self.graph.induced(&comp);
            let local_seed = self.restrict_seed(&sub, &mapping);
            let local = self.decide_component(&sub, k, local_seed.as_ref(), deadline)?;
            for (i, &orig) in mapping.iter().enumerate() {
                if let Some(c) = local.get(i as u32) {
                    merged.set(orig, c);
                }
            }
        }
        Some(merged)
    }

    /// Enumerates proper `k`-colorings of the whole graph, up to the
    /// configured solution limit. Symmetry breaking and the parent-failure
    /// shortcut are disabled so no labeling is skipped.
    pub fn find_all_colorings(&self, k: u32) -> Vec<Coloring> {
        self.time_expired.store(false, Ordering::SeqCst);
        let deadline = self.deadline();
        if self.graph.vertex_count() == 0 {
            return vec![Coloring::new(0)];
        }

        let seed = match &self.seed {
            Some(s) => s.clone(),
            None => Coloring::new(self.graph.vertex_count()),
        };
        if seed.iter().any(|(_, c)| c >= k) {
            return Vec::new();
        }
        self.run_round(
            self.graph,
            k,
            &seed,
            SearchMode::Enumerate,
            self.config.solution_limit,
            deadline,
        )
    }

    // ------------------------------------------------------------------------
    // Per-component driving
    // ------------------------------------------------------------------------

    /// Iterative deepening on one connected component.
    fn optimize_component(
        &self,
        graph: &Graph,
        seed: Option<&Coloring>,
        deadline: Option<Instant>,
    ) -> Coloring {
        let clique = maximal_clique(graph);
        let lower = clique.len() as u32;
        let greedy = greedy_coloring(graph, seed);
        let upper = greedy.color_count() as u32;
        info!(
            "component: {} vertices, clique bound {lower}, greedy bound {upper}",
            graph.vertex_count()
        );

        let mut best = greedy;
        let mut k = upper.saturating_sub(1);
        while k >= lower && k > 0 {
            match self.decide_component(graph, k, seed, deadline) {
                Some(coloring) => {
                    debug!("{k}-coloring found, tightening");
                    best = coloring;
                    k -= 1;
                }
                None => {
                    if self.is_time_expired() {
                        debug!("time budget exhausted at k={k}, keeping best so far");
                        break;
                    }
                    debug!("{k}-coloring infeasible");
                    if self.config.assume_monotonic {
                        break;
                    }
                    k -= 1;
                }
            }
        }
        best
    }

    /// Decision procedure on one connected component.
    fn decide_component(
        &self,
        graph: &Graph,
        k: u32,
        user_seed: Option<&Coloring>,
        deadline: Option<Instant>,
    ) -> Option<Coloring> {
        if k == 0 {
            return (graph.vertex_count() == 0).then(|| Coloring::new(0));
        }

        // Lower bound: a clique larger than k settles it without search.
        let clique = maximal_clique(graph);
        if clique.len() > k as usize {
            debug!("clique of size {} exceeds k={k}", clique.len());
            return None;
        }

        // With no caller seed, pre-color the clique: its vertices must all
        // differ anyway, and fixing them prunes color permutations.
        let seed = match user_seed {
            Some(s) => s.clone(),
            None => {
                let mut s = Coloring::new(graph.vertex_count());
                for (i, &v) in clique.iter().enumerate() {
                    s.set(v, i as u32);
                }
                s
            }
        };
        if seed.iter().any(|(_, c)| c >= k) {
            return None;
        }

        // Upper bound: if the greedy extension already fits in k colors,
        // skip the search entirely.
        let greedy = greedy_coloring(graph, Some(&seed));
        if greedy.is_valid_k_coloring(graph, k) {
            return Some(greedy);
        }

        self.run_round(graph, k, &seed, SearchMode::Single, 1, deadline)
            .into_iter()
            .next()
    }

    // ------------------------------------------------------------------------
    // One search round
    // ------------------------------------------------------------------------

    /// Builds the root, spawns one worker per core, joins, and collects
    /// the round's solutions.
    fn run_round(
        &self,
        graph: &Graph,
        k: u32,
        seed: &Coloring,
        mode: SearchMode,
        solution_limit: usize,
        deadline: Option<Instant>,
    ) -> Vec<Coloring> {
        let Ok(mut root) = SearchNode::root(graph, k, seed) else {
            // Propagating the pre-fixed colors already contradicts.
            return Vec::new();
        };

        if root.is_complete() {
            return if root.coloring.is_valid_k_coloring(graph, k) {
                vec![root.coloring]
            } else {
                Vec::new()
            };
        }

        let workers = self.workers();
        let ctx = SearchCtx::new(
            graph,
            k,
            mode,
            workers,
            solution_limit,
            deadline,
            self.config.parent_failure_shortcut,
            self.config.base_seed.unwrap_or_else(rand::random),
        );

        root.select_branch(graph, ctx.symmetry_breaking());
        if root.failed {
            return Vec::new();
        }
        ctx.tree
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .publish(0, root);

        // One fresh pool per round; the global pool is a correct fallback
        // if a dedicated one cannot be built.
        let fan_out = || {
            (0..workers)
                .into_par_iter()
                .for_each(|w| worker::run(&ctx, w));
        };
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(fan_out),
            Err(_) => fan_out(),
        }

        if ctx.time_expired.load(Ordering::SeqCst) {
            self.time_expired.store(true, Ordering::SeqCst);
        }

        let mut out = Vec::new();
        while let Some(c) = ctx.solutions.pop() {
            out.push(c);
        }
        out
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn workers(&self) -> usize {
        if self.config.workers > 0 {
            return self.config.workers;
        }
        std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1)
    }

    fn deadline(&self) -> Option<Instant> {
        if self.config.time_limit_ms == 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(self.config.time_limit_ms))
        }
    }

    /// Restricts the caller's seed to a component's local vertex indices.
    fn restrict_seed(&self, sub: &Graph, mapping: &[u32]) -> Option<Coloring> {
        let seed = self.seed.as_ref()?;
        let mut local = Coloring::new(sub.vertex_count());
        for (i, &orig) in mapping.iter().enumerate() {
            if let Some(c) = seed.get(orig) {
                local.set(i as u32, c);
            }
        }
        Some(local)
    }
}

// ============================================================================
// Tests
// ============================================================================
