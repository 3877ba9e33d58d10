use chroma::coloring::Coloring;
use chroma::graph::Graph;
use chroma::solver::{Solver, SolverConfig};
use std::io::BufRead;

fn main() {
    env_logger::init();

    let mut cfg = SolverConfig::default();
    let mut path: Option<String> = None;
    let mut colors: Option<u32> = None;
    let mut enumerate = false;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--colors" | "-k" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                colors = Some(v.parse().unwrap_or_else(|_| usage_and_exit(2)));
                i += 2;
            }
            "--all" => {
                enumerate = true;
                i += 1;
            }
            "--workers" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.workers = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--time-limit" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.time_limit_ms = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--seed" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                cfg.base_seed = Some(v.parse().unwrap_or_else(|_| usage_and_exit(2)));
                i += 2;
            }
            "--help" | "-h" => usage_and_exit(0),
            arg if !arg.starts_with('-') && path.is_none() => {
                path = Some(arg.to_string());
                i += 1;
            }
            _ => usage_and_exit(2),
        }
    }

    let Some(path) = path else { usage_and_exit(2) };
    let graph = match load_edge_list(&path) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Failed to read {path}: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "Graph: {} vertices, {} edges",
        graph.vertex_count(),
        graph.edge_count()
    );

    let solver = Solver::with_config(&graph, cfg);

    if enumerate {
        let k = colors.unwrap_or_else(|| usage_and_exit(2));
        let all = solver.find_all_colorings(k);
        println!("{} proper {k}-colorings", all.len());
        for c in &all {
            print_coloring(c);
        }
        return;
    }

    let result = match colors {
        Some(k) => solver.find_coloring_k(k),
        None => solver.find_coloring(),
    };

    match result {
        Some(c) => {
            println!("Coloring with {} colors:", c.color_count());
            print_coloring(&c);
        }
        None if solver.is_time_expired() => {
            println!("Time limit reached before a conclusion.");
            std::process::exit(3);
        }
        None => {
            println!("Infeasible: no such coloring exists.");
        }
    }
}

/// Reads a `u v` edge-per-line file. Lines starting with `#` are skipped;
/// the vertex count is one past the highest endpoint.
fn load_edge_list(path: &str) -> std::io::Result<Graph> {
    let file = std::fs::File::open(path)?;
    let mut edges: Vec<(u32, u32)> = Vec::new();
    let mut max_v = 0u32;
    for line in std::io::BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut it = line.split_whitespace();
        let (Some(u), Some(v)) = (it.next(), it.next()) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed line: {line}"),
            ));
        };
        let parse = |s: &str| {
            s.parse::<u32>().map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("bad vertex id: {s}"),
                )
            })
        };
        let (u, v) = (parse(u)?, parse(v)?);
        if u == v {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("self-loop at vertex {u}"),
            ));
        }
        max_v = max_v.max(u).max(v);
        edges.push((u, v));
    }
    let n = if edges.is_empty() { 0 } else { max_v as usize + 1 };
    Ok(Graph::from_edges(n, &edges))
}

fn print_coloring(c: &Coloring) {
    let parts: Vec<String> = c.iter().map(|(v, col)| format!("{v}:{col}")).collect();
    println!("  {}", parts.join(" "));
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  chroma EDGE_FILE [--colors K] [--all] [--workers N] [--time-limit MS] [--seed S]\n\nOptions:\n  --colors/-k K    Decide k-colorability instead of minimizing\n  --all            Enumerate all k-colorings (requires --colors)\n  --workers N      Worker threads (default: one per core)\n  --time-limit MS  Wall-clock budget in milliseconds (0 = unbounded)\n  --seed S         Deterministic base seed for work stealing\n\nInput: one `u v` edge per line, `#` comments allowed.\n"
    );
    std::process::exit(code)
}
