//! # Chroma
//!
//! An exact vertex-coloring engine: a parallel branch-and-bound constraint
//! solver that decides, for a candidate color count `k`, whether a graph
//! admits a proper `k`-coloring. It can produce one such coloring,
//! enumerate all of them, or minimize `k` by iterative deepening between
//! a maximal-clique lower bound and a greedy upper bound.
//!
//! This crate provides:
//! - A compact dense-index graph with O(1) edge tests and component
//!   decomposition.
//! - Forward-checking propagation over per-vertex color domains with O(1)
//!   removal and copy-on-write sharing along the search tree.
//! - A worker pool (one OS thread per core) exploring the tree
//!   depth-first with cooperative work stealing between worker stacks.
//!
//! ## Quick Start
//!
//! ```
//! use chroma::graph::Graph;
//! use chroma::solver::Solver;
//!
//! // A 5-cycle is 3-chromatic.
//! let g = chroma::graph::cycle(5);
//! let solver = Solver::new(&g);
//!
//! assert!(solver.find_coloring_k(2).is_none());
//! let best = solver.find_coloring().unwrap();
//! assert_eq!(best.color_count(), 3);
//!
//! // A custom graph from an edge list.
//! let g = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]);
//! let coloring = Solver::new(&g).find_coloring().unwrap();
//! assert_eq!(coloring.color_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: graph storage, components, induced subgraphs.
//! - [`coloring`]: partial/total color assignments.
//! - [`domain`]: per-vertex candidate-color sets.
//! - [`bounds`]: maximal-clique and greedy-coloring bound heuristics.
//! - [`propagate`]: forward-checking constraint propagation.
//! - [`solver`]: the parallel branch-and-bound driver and public API.
//!
//! ## Performance Notes
//!
//! - Infeasibility at `k` is proven by exhausting the search tree; expect
//!   exponential worst-case time and set a time limit for large dense
//!   graphs.
//! - A search that hits its time limit reports that distinctly from
//!   infeasibility (`Solver::is_time_expired`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_panics_doc)]

pub mod bounds;
pub mod coloring;
pub mod domain;
pub mod graph;
pub mod propagate;
pub mod solver;

mod node;
mod tree;
mod worker;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::bounds::{greedy_coloring, maximal_clique};
    pub use crate::coloring::Coloring;
    pub use crate::graph::Graph;
    pub use crate::solver::{SolveError, Solver, SolverConfig};
}
