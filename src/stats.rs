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
//! Aggregation of a finished run's message ledger and link counters into a
//! reportable summary.

use serde::Serialize;

use crate::simulation::Simulation;
use crate::topology::TopologySummary;

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub topology: String,
    pub k: Option<u32>,
    pub link_failure_pct: f64,
    pub seed: u64,

    pub messages_total: usize,
    pub delivered_straight_count: usize,
    pub delivered_straight_pct: f64,
    pub delivered_while_lost_count: usize,
    pub delivered_while_lost_pct: f64,
    pub dropped_count: usize,
    pub dropped_pct: f64,

    pub path_length_avg: f64,
    pub path_length_min: u32,
    pub path_length_max: u32,

    pub hosts: usize,
    pub switches: usize,
    pub links: usize,
    pub failed_links: usize,

    pub link_utilization_avg: f64,
    pub accumulated_bytes_transmitted: u64,

    pub end_time: f64,
}

pub fn compute_run_stats(
    sim: &Simulation,
    topology: &TopologySummary,
    link_failure_pct: f64,
) -> RunStats {
    let ledger = sim.scheduler.ledger();
    let messages_total = ledger.len();

    let mut delivered_straight = 0usize;
    let mut delivered_while_lost = 0usize;
    let mut dropped = 0usize;
    let mut path_lengths = Vec::new();

    for message in ledger {
        if message.delivered {
            path_lengths.push(message.path_length);
            if message.lost {
                delivered_while_lost += 1;
            } else {
                delivered_straight += 1;
            }
        } else if message.dropped {
            dropped += 1;
        }
    }

    let pct = |n: usize| {
        if messages_total == 0 {
            0.0
        } else {
            100.0 * n as f64 / messages_total as f64
        }
    };

    let path_length_avg = if path_lengths.is_empty() {
        0.0
    } else {
        path_lengths.iter().sum::<u32>() as f64 / path_lengths.len() as f64
    };
    let path_length_min = path_lengths.iter().copied().min().unwrap_or(0);
    let path_length_max = path_lengths.iter().copied().max().unwrap_or(0);

    let mut total_transmitting_time = 0.0;
    let mut accumulated_bytes_transmitted = 0u64;
    let link_count = topology.links.len().max(1);
    let end_time = sim.scheduler.end_time.unwrap_or(sim.scheduler.current_time);
    for &link_id in &topology.links {
        let link = sim.link(link_id);
        total_transmitting_time += link.accumulated_transmitting_time;
        accumulated_bytes_transmitted += link.accumulated_bytes_transmitted;
    }
    let link_utilization_avg = if end_time > 0.0 {
        total_transmitting_time / (link_count as f64 * end_time)
    } else {
        0.0
    };

    RunStats {
        topology: topology.kind.to_string(),
        k: topology.k,
        link_failure_pct,
        seed: sim.seed,
        messages_total,
        delivered_straight_count: delivered_straight,
        delivered_straight_pct: pct(delivered_straight),
        delivered_while_lost_count: delivered_while_lost,
        delivered_while_lost_pct: pct(delivered_while_lost),
        dropped_count: dropped,
        dropped_pct: pct(dropped),
        path_length_avg,
        path_length_min,
        path_length_max,
        hosts: topology.hosts.len(),
        switches: topology.switches.len(),
        links: topology.links.len(),
        failed_links: topology.failed_links.len(),
        link_utilization_avg,
        accumulated_bytes_transmitted,
        end_time,
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} k={:?} failure={:.1}% seed={}: {} messages, {:.1}% delivered, {:.1}% delivered-while-lost, {:.1}% dropped, avg path {:.2}",
            self.topology,
            self.k,
            self.link_failure_pct,
            self.seed,
            self.messages_total,
            self.delivered_straight_pct,
            self.delivered_while_lost_pct,
            self.dropped_pct,
            self.path_length_avg,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host;
    use crate::simulation::Simulation;
    use crate::topology;

    #[test]
    fn percentages_sum_to_total() {
        let mut sim = Simulation::new(1972);
        let summary = topology::build_hsh(&mut sim, 0.0).unwrap();
        let dst = sim.host(summary.hosts[1]).ip;
        host::send(&mut sim, summary.hosts[0], dst, vec![], 64, None).unwrap();
        sim.run(None).unwrap();
        let stats = compute_run_stats(&sim, &summary, 0.0);
        let total = stats.delivered_straight_pct + stats.delivered_while_lost_pct + stats.dropped_pct;
        assert!((total - 100.0).abs() < 1e-9 || stats.messages_total == 0);
    }
}
