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
//! Best-effort topology diagram rendering. A reporting side-effect only — nothing
//! here is consulted by the forwarding core.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::error::{Result, SimError};
use crate::node::NodeId;
use crate::simulation::Simulation;
use crate::topology::{TopologyKind, TopologySummary};

/// A node's row in the layered layout: 0 = core, 1 = aggregation, 2 = edge, 3 = host.
/// Falls back to a flat single row for non-fat-tree topologies.
fn layer_of(kind: TopologyKind, name: &str) -> usize {
    if kind != TopologyKind::FatTree {
        return 0;
    }
    if name.starts_with("core_switch_") {
        0
    } else if name.starts_with("a_s") {
        1
    } else if name.starts_with("es_") {
        2
    } else {
        3
    }
}

/// Pick `results/topology_<name>_<n>.png`, bumping `n` until the path doesn't
/// already exist, so repeated runs never clobber an earlier diagram.
pub fn next_available_path(results_dir: &Path, name: &str) -> PathBuf {
    let mut n = 0;
    loop {
        let candidate = results_dir.join(format!("topology_{name}_{n}.png"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

pub fn render_topology(sim: &Simulation, summary: &TopologySummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let layers: Vec<usize> = sim
        .nodes()
        .map(|(_, node)| layer_of(summary.kind, node.name()))
        .collect();
    let max_layer = layers.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut per_layer_count = vec![0u32; max_layer as usize + 1];
    let mut positions: Vec<(f64, f64)> = Vec::with_capacity(layers.len());
    for &layer in &layers {
        let x = per_layer_count[layer] as f64;
        per_layer_count[layer] += 1;
        positions.push((x, (max_layer - layer as f64)));
    }
    let max_width = per_layer_count.iter().copied().max().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| SimError::InvalidState(format!("failed to fill drawing area: {e}")))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} topology", summary.kind), ("sans-serif", 24))
        .margin(20)
        .build_cartesian_2d(-1.0..max_width, -0.5..max_layer + 0.5)
        .map_err(|e| SimError::InvalidState(format!("failed to build chart: {e}")))?;
    chart
        .configure_mesh()
        .disable_mesh()
        .draw()
        .map_err(|e| SimError::InvalidState(format!("failed to draw mesh: {e}")))?;

    for &link_id in &summary.links {
        let link = sim.link(link_id);
        if let [Some(a), Some(b)] = link.endpoints() {
            let pa = positions[node_index(a)];
            let pb = positions[node_index(b)];
            let color = if link.failed { &RED } else { &BLACK };
            chart
                .draw_series(LineSeries::new(vec![pa, pb], color))
                .map_err(|e| SimError::InvalidState(format!("failed to draw link: {e}")))?;
        }
    }

    for i in 0..positions.len() {
        let (x, y) = positions[i];
        let color = if summary.hosts.contains(&NodeId(i)) { &BLUE } else { &GREEN };
        chart
            .draw_series(std::iter::once(Circle::new((x, y), 4, color.filled())))
            .map_err(|e| SimError::InvalidState(format!("failed to draw node: {e}")))?;
    }

    root.present()
        .map_err(|e| SimError::InvalidState(format!("failed to write PNG: {e}")))?;
    Ok(())
}

fn node_index(id: NodeId) -> usize {
    id.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_assignment_matches_fat_tree_naming() {
        assert_eq!(layer_of(TopologyKind::FatTree, "core_switch_c0"), 0);
        assert_eq!(layer_of(TopologyKind::FatTree, "a_s0_0"), 1);
        assert_eq!(layer_of(TopologyKind::FatTree, "es_0_0"), 2);
        assert_eq!(layer_of(TopologyKind::FatTree, "h_0_0_0"), 3);
        assert_eq!(layer_of(TopologyKind::Hsh, "sw0"), 0);
    }

    #[test]
    fn next_path_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topology_hsh_0.png"), b"x").unwrap();
        let next = next_available_path(dir.path(), "hsh");
        assert_eq!(next, dir.path().join("topology_hsh_1.png"));
    }
}
