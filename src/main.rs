// netsim: a deterministic discrete-event simulator for packet-level IP forwarding
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{info, LevelFilter};
use rayon::prelude::*;

use netsim::simulation::Simulation;
use netsim::stats::{compute_run_stats, RunStats};
use netsim::topology::{self, TopologyKind, TopologySummary};
use netsim::{error::Result, logging, traffic, visualize};

#[derive(Debug, Parser)]
#[command(about = "Discrete-event simulator for packet-level IP forwarding over a switched fabric")]
struct Args {
    /// Topology kind: fat-tree, hsh or simple-star.
    #[arg(short = 't', long = "topology", default_value = "fat-tree")]
    topology: String,

    /// One or more switch port counts (fat-tree only); each must be even and >= 2.
    #[arg(short, long, num_args = 1.., default_value = "4")]
    k: Vec<u32>,

    /// Number of hosts for the simple-star topology.
    #[arg(long = "num-hosts", default_value_t = 8)]
    num_hosts: u32,

    /// Render a topology diagram to results/topology_<name>_<n>.png.
    #[arg(short, long)]
    visualize: bool,

    /// One or more link-failure percentages in [0, 100].
    #[arg(long = "link-failure", num_args = 1.., default_value = "0.0")]
    link_failure: Vec<f64>,

    /// Raise console logging to DEBUG and retain each message's full node path.
    #[arg(long)]
    verbose: bool,

    /// Process-level random seed governing link-failure sampling, lost-mode
    /// rerouting and traffic jitter.
    #[arg(long, default_value_t = 1972)]
    seed: u64,

    /// Number of random sends scheduled per host.
    #[arg(long = "messages-per-host", default_value_t = 5)]
    messages_per_host: u32,

    /// Directory results (CSV rows, topology diagrams) are written under.
    #[arg(long = "results-dir", default_value = "results")]
    results_dir: PathBuf,
}

fn run_experiment(args: &Args, topology_kind: TopologyKind, k: u32, failure_pct: f64) -> Result<RunStats> {
    // Derive a child seed so that parallel experiments over the (k, failure) grid
    // are independent yet reproducible as a set from the single base seed.
    let child_seed = args
        .seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(k as u64)
        .wrapping_add((failure_pct * 1000.0) as u64);

    let mut sim = Simulation::new(child_seed).with_verbose(args.verbose);
    let summary: TopologySummary = match topology_kind {
        TopologyKind::FatTree => topology::build_fat_tree(&mut sim, k, failure_pct)?,
        TopologyKind::Hsh => topology::build_hsh(&mut sim, failure_pct)?,
        TopologyKind::SimpleStar => topology::build_simple_star(&mut sim, args.num_hosts, failure_pct)?,
    };

    if args.visualize {
        let path = visualize::next_available_path(&args.results_dir, &summary.kind.to_string());
        visualize::render_topology(&sim, &summary, &path)?;
        info!("wrote topology diagram to {}", path.display());
    }

    traffic::host_calls_random_host(&mut sim, &summary.hosts, args.messages_per_host)?;
    sim.run(None)?;

    let stats = compute_run_stats(&sim, &summary, failure_pct);
    info!("{stats}");
    Ok(stats)
}

fn write_results_csv(results_dir: &std::path::Path, stats: &[RunStats]) -> Result<()> {
    let dir = results_dir.join("experiments");
    std::fs::create_dir_all(&dir)?;
    let mut n = 0;
    let path = loop {
        let candidate = dir.join(format!("run_{n}.csv"));
        if !candidate.exists() {
            break candidate;
        }
        n += 1;
    };
    let mut writer = csv::Writer::from_path(&path)?;
    for row in stats {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} result rows to {}", stats.len(), path.display());
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let console_level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logging::init(&args.results_dir, console_level)?;

    let topology_kind: TopologyKind = args.topology.parse()?;
    let k_values: Vec<u32> = if topology_kind == TopologyKind::FatTree {
        args.k.clone()
    } else {
        vec![0]
    };

    for &k in &k_values {
        if topology_kind == TopologyKind::FatTree && (k < 2 || k % 2 != 0) {
            return Err(format!("-k must be even and >= 2, got {k}").into());
        }
    }
    for &pct in &args.link_failure {
        if !(0.0..=100.0).contains(&pct) {
            return Err(format!("-link-failure must be within [0, 100], got {pct}").into());
        }
    }

    let combinations: Vec<(u32, f64)> = itertools::iproduct!(k_values.iter().copied(), args.link_failure.iter().copied())
        .collect();

    let bar = ProgressBar::new(combinations.len() as u64);
    bar.set_style(ProgressStyle::with_template("{wide_bar} {pos}/{len} time: {elapsed}").unwrap());

    let results: Vec<RunStats> = combinations
        .into_par_iter()
        .progress_with(bar)
        .map(|(k, pct)| run_experiment(&args, topology_kind, k, pct))
        .collect::<Result<Vec<_>>>()?;

    write_results_csv(&args.results_dir, &results)?;
    Ok(())
}
