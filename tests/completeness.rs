//! Cross-checks the exact engine against brute force on small graphs.
//!
//! These are the strongest guarantees in the suite: for every graph tried,
//! the solver's yes/no answer for every `k` must match an exhaustive
//! backtracking check, and every coloring it returns must be proper.

use chroma::coloring::Coloring;
use chroma::graph::Graph;
use chroma::solver::{Solver, SolverConfig};
use rand::Rng;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

// ============================================================================
// Brute-force reference
// ============================================================================

/// Backtracking check for `k`-colorability, no pruning beyond feasibility.
fn brute_force_colorable(g: &Graph, k: u32) -> bool {
    fn go(g: &Graph, k: u32, colors: &mut Vec<u32>, v: usize) -> bool {
        if v == g.vertex_count() {
            return true;
        }
        'next: for c in 0..k {
            for &u in g.neighbors(v as u32) {
                if (u as usize) < v && colors[u as usize] == c {
                    continue 'next;
                }
            }
            colors[v] = c;
            if go(g, k, colors, v + 1) {
                return true;
            }
        }
        false
    }
    let mut colors = vec![0u32; g.vertex_count()];
    go(g, k, &mut colors, 0)
}

fn brute_force_chromatic(g: &Graph) -> u32 {
    if g.vertex_count() == 0 {
        return 0;
    }
    (1..).find(|&k| brute_force_colorable(g, k)).unwrap()
}

fn graph_from_mask(n: usize, mask: u64) -> Graph {
    let mut g = Graph::new(n);
    let mut bit = 0;
    for u in 0..n as u32 {
        for v in (u + 1)..n as u32 {
            if mask >> bit & 1 == 1 {
                g.add_edge(u, v);
            }
            bit += 1;
        }
    }
    g
}

fn solver(g: &Graph) -> Solver<'_> {
    let cfg = SolverConfig {
        workers: 2,
        base_seed: Some(0xD15EA5E),
        ..SolverConfig::default()
    };
    Solver::with_config(g, cfg)
}

// ============================================================================
// Completeness: no time limit + None means provably uncolorable
// ============================================================================

#[test]
fn matches_brute_force_on_all_graphs_up_to_4_vertices() {
    for n in 0..=4usize {
        let pairs = n * n.saturating_sub(1) / 2;
        for mask in 0u64..(1 << pairs) {
            let g = graph_from_mask(n, mask);
            let s = solver(&g);
            for k in 0..=(n as u32 + 1) {
                let expect = if n == 0 { true } else { brute_force_colorable(&g, k) };
                let got = s.find_coloring_k(k);
                assert!(!s.is_time_expired());
                assert_eq!(
                    expect,
                    got.is_some(),
                    "n={n} mask={mask:#b} k={k} disagreed with brute force"
                );
                if let Some(c) = got {
                    assert!(c.is_valid_k_coloring(&g, k.max(1)) || n == 0);
                }
            }
        }
    }
}

#[test]
fn matches_brute_force_on_all_graphs_on_5_vertices() {
    for mask in 0u64..(1 << 10) {
        let g = graph_from_mask(5, mask);
        let s = solver(&g);
        let chi = brute_force_chromatic(&g);
        let best = s.find_coloring().expect("every graph is colorable");
        assert!(best.is_proper(&g));
        assert_eq!(
            best.color_count() as u32,
            chi,
            "mask={mask:#b}: wrong chromatic number"
        );
        assert!(s.find_coloring_k(chi.saturating_sub(1)).is_none() || chi == 1);
    }
}

#[test]
fn matches_brute_force_on_random_graphs_up_to_8_vertices() {
    let mut rng = XorShiftRng::seed_from_u64(0xC0103);
    for _ in 0..60 {
        let n = rng.random_range(6..=8usize);
        let p = rng.random_range(0.2..0.8);
        let mut g = Graph::new(n);
        for u in 0..n as u32 {
            for v in (u + 1)..n as u32 {
                if rng.random_bool(p) {
                    g.add_edge(u, v);
                }
            }
        }
        let s = solver(&g);
        let chi = brute_force_chromatic(&g);
        let best = s.find_coloring().unwrap();
        assert_eq!(best.color_count() as u32, chi);
        assert!(best.is_proper(&g));
        for k in 1..chi {
            assert!(s.find_coloring_k(k).is_none(), "k={k} < chi={chi} must fail");
        }
        assert!(s.find_coloring_k(chi).is_some());
    }
}

#[test]
fn parent_failure_shortcut_never_loses_solutions() {
    // Same instances solved with and without the heuristic must agree on
    // feasibility for every k.
    let mut rng = XorShiftRng::seed_from_u64(0xFA11);
    for _ in 0..40 {
        let n = rng.random_range(4..=7usize);
        let mut g = Graph::new(n);
        for u in 0..n as u32 {
            for v in (u + 1)..n as u32 {
                if rng.random_bool(0.5) {
                    g.add_edge(u, v);
                }
            }
        }

        let with = solver(&g);
        let without = Solver::with_config(
            &g,
            SolverConfig {
                workers: 2,
                base_seed: Some(1),
                parent_failure_shortcut: false,
                ..SolverConfig::default()
            },
        );
        for k in 1..=n as u32 {
            assert_eq!(
                with.find_coloring_k(k).is_some(),
                without.find_coloring_k(k).is_some(),
                "shortcut changed the answer for k={k}"
            );
        }
    }
}

// ============================================================================
// Bounds and enumeration
// ============================================================================

#[test]
fn chromatic_number_sits_between_published_bounds() {
    let mut rng = XorShiftRng::seed_from_u64(0xB0094D);
    for _ in 0..40 {
        let n = rng.random_range(5..=9usize);
        let mut g = Graph::new(n);
        for u in 0..n as u32 {
            for v in (u + 1)..n as u32 {
                if rng.random_bool(0.45) {
                    g.add_edge(u, v);
                }
            }
        }
        let lower = chroma::bounds::maximal_clique(&g).len();
        let upper = chroma::bounds::greedy_coloring(&g, None).color_count();
        let chi = solver(&g).find_coloring().unwrap().color_count();
        assert!(
            lower <= chi && chi <= upper,
            "bounds violated: {lower} <= {chi} <= {upper}"
        );
    }
}

#[test]
fn enumeration_counts_match_brute_force() {
    // Count proper k-colorings exhaustively and compare.
    fn brute_count(g: &Graph, k: u32) -> usize {
        fn go(g: &Graph, k: u32, colors: &mut Vec<u32>, v: usize, count: &mut usize) {
            if v == g.vertex_count() {
                *count += 1;
                return;
            }
            'next: for c in 0..k {
                for &u in g.neighbors(v as u32) {
                    if (u as usize) < v && colors[u as usize] == c {
                        continue 'next;
                    }
                }
                colors[v] = c;
                go(g, k, colors, v + 1, count);
            }
        }
        let mut count = 0;
        go(g, k, &mut vec![0; g.vertex_count()], 0, &mut count);
        count
    }

    let cases: Vec<(Graph, u32)> = vec![
        (chroma::graph::complete(3), 3),
        (chroma::graph::cycle(4), 2),
        (chroma::graph::cycle(5), 3),
        (Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]), 2),
        (Graph::new(3), 2),
    ];
    for (g, k) in &cases {
        let s = solver(g);
        let all = s.find_all_colorings(*k);
        assert_eq!(
            all.len(),
            brute_count(g, *k),
            "enumeration count mismatch for k={k}"
        );
        for c in &all {
            assert!(c.is_valid_k_coloring(g, *k));
        }
        // No duplicates.
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                assert!(all[i] != all[j], "duplicate coloring enumerated");
            }
        }
    }
}

#[test]
fn seeded_search_agrees_with_brute_force_feasibility() {
    let mut rng = XorShiftRng::seed_from_u64(0x5EEDED);
    for _ in 0..30 {
        let n = rng.random_range(4..=6usize);
        let mut g = Graph::new(n);
        for u in 0..n as u32 {
            for v in (u + 1)..n as u32 {
                if rng.random_bool(0.5) {
                    g.add_edge(u, v);
                }
            }
        }
        let chi = brute_force_chromatic(&g);

        // A proper seed fixing one vertex's color cannot change
        // feasibility: labels are interchangeable.
        let mut seed = Coloring::new(n);
        seed.set(0, 0);
        let mut s = solver(&g);
        s.set_seed(seed).unwrap();
        assert!(s.find_coloring_k(chi).is_some());
        if chi > 1 {
            assert!(s.find_coloring_k(chi - 1).is_none());
        }
        let got = s.find_coloring_k(chi).unwrap();
        assert_eq!(got.get(0), Some(0), "solution must extend the seed");
    }
}
