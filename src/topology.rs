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
//! Topology builders: fat-tree (Clos), HSH and simple-star, plus link-failure
//! injection applied before routes are installed so failed links never make it
//! into a forwarding table.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{Result, SimError};
use crate::host::Host;
use crate::ip::IpAddress;
use crate::link::{Link, LinkId};
use crate::network_node;
use crate::node::NodeId;
use crate::simulation::Simulation;
use crate::switch::Switch;

const DEFAULT_BANDWIDTH_BPS: f64 = 1e9;
const DEFAULT_PROPAGATION_TIME: f64 = 100e-6;

// Per-topology hop budgets, not one shared constant: a legitimate fat-tree path is
// far longer than a star's, so a single `max_path` would either expire fat-tree
// traffic early or let a looping star message wander for a thousand hops.
const FAT_TREE_MAX_PATH: u32 = 1_000_000;
const HSH_MAX_PATH: u32 = 3;
const SIMPLE_STAR_MAX_PATH: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyKind {
    FatTree,
    Hsh,
    SimpleStar,
}

impl FromStr for TopologyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fat-tree" => Ok(TopologyKind::FatTree),
            "hsh" => Ok(TopologyKind::Hsh),
            "simple-star" => Ok(TopologyKind::SimpleStar),
            other => Err(SimError::InvalidArgument(format!(
                "unknown topology '{other}' (expected fat-tree, hsh or simple-star)"
            ))),
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TopologyKind::FatTree => "fat-tree",
            TopologyKind::Hsh => "hsh",
            TopologyKind::SimpleStar => "simple-star",
        };
        write!(f, "{s}")
    }
}

/// Summary of the topology a builder produced, independent of any one run.
#[derive(Debug, Clone)]
pub struct TopologySummary {
    pub kind: TopologyKind,
    pub k: Option<u32>,
    pub hosts: Vec<NodeId>,
    pub switches: Vec<NodeId>,
    pub links: Vec<LinkId>,
    pub failed_links: Vec<LinkId>,
}

fn inject_failures(sim: &mut Simulation, links: &[LinkId], failure_pct: f64) -> Result<Vec<LinkId>> {
    if !(0.0..=100.0).contains(&failure_pct) {
        return Err(SimError::InvalidArgument(format!(
            "link-failure percentage {failure_pct} is outside [0, 100]"
        )));
    }
    let count = ((failure_pct / 100.0) * links.len() as f64).round() as usize;
    let mut pool = links.to_vec();
    // topology-local RNG derived from the simulation seed, so failure selection is
    // reproducible independent of how many other random draws the run makes later.
    let mut rng = StdRng::seed_from_u64(sim.seed ^ 0x6615_c3ac_5ee4_0001);
    pool.shuffle(&mut rng);
    let chosen: Vec<LinkId> = pool.into_iter().take(count).collect();
    for link in &chosen {
        sim.link_mut(*link).failed = true;
    }
    Ok(chosen)
}

/// Two hosts joined by one switch — the minimal topology for link-serialization tests.
pub fn build_hsh(sim: &mut Simulation, failure_pct: f64) -> Result<TopologySummary> {
    let sw = sim.add_switch(Switch::new("sw0", 2, HSH_MAX_PATH));
    let h1 = sim.add_host(Host::new(
        "h0",
        IpAddress::from_octets(10, 0, 0, 1),
        1,
        HSH_MAX_PATH,
    ));
    let h2 = sim.add_host(Host::new(
        "h1",
        IpAddress::from_octets(10, 0, 0, 2),
        1,
        HSH_MAX_PATH,
    ));
    let l1 = sim.add_link(Link::new("l_sw0_h0", DEFAULT_BANDWIDTH_BPS, DEFAULT_PROPAGATION_TIME));
    let l2 = sim.add_link(Link::new("l_sw0_h1", DEFAULT_BANDWIDTH_BPS, DEFAULT_PROPAGATION_TIME));
    network_node::connect(sim, sw, 1, l1)?;
    network_node::connect(sim, h1, 1, l1)?;
    network_node::connect(sim, sw, 2, l2)?;
    network_node::connect(sim, h2, 1, l2)?;

    let links = vec![l1, l2];
    let failed_links = inject_failures(sim, &links, failure_pct)?;

    network_node::install_route(sim, sw, "10.0.0.1/32".parse()?, 1);
    network_node::install_route(sim, sw, "10.0.0.2/32".parse()?, 2);
    network_node::install_route(sim, h1, "0.0.0.0/0".parse()?, 1);
    network_node::install_route(sim, h2, "0.0.0.0/0".parse()?, 1);

    Ok(TopologySummary {
        kind: TopologyKind::Hsh,
        k: None,
        hosts: vec![h1, h2],
        switches: vec![sw],
        links,
        failed_links,
    })
}

/// A single switch with `num_hosts` hosts directly attached.
pub fn build_simple_star(sim: &mut Simulation, num_hosts: u32, failure_pct: f64) -> Result<TopologySummary> {
    if num_hosts < 2 {
        return Err(SimError::InvalidArgument(
            "simple-star needs at least 2 hosts".into(),
        ));
    }
    let sw = sim.add_switch(Switch::new("sw0", num_hosts, SIMPLE_STAR_MAX_PATH));
    let mut hosts = Vec::new();
    let mut links = Vec::new();
    for i in 0..num_hosts {
        let ip = IpAddress::from_octets(10, 0, 0, (i + 1) as u8);
        let host = sim.add_host(Host::new(format!("h{i}"), ip, 1, SIMPLE_STAR_MAX_PATH));
        let link = sim.add_link(Link::new(
            format!("l_sw0_h{i}"),
            DEFAULT_BANDWIDTH_BPS,
            DEFAULT_PROPAGATION_TIME,
        ));
        hosts.push(host);
        links.push(link);
    }
    for (i, (&host, &link)) in hosts.iter().zip(links.iter()).enumerate() {
        let port = (i + 1) as u32;
        network_node::connect(sim, sw, port, link)?;
        network_node::connect(sim, host, 1, link)?;
    }

    let failed_links = inject_failures(sim, &links, failure_pct)?;

    for (i, &host) in hosts.iter().enumerate() {
        let port = (i + 1) as u32;
        let ip = IpAddress::from_octets(10, 0, 0, (i + 1) as u8);
        network_node::install_route(sim, sw, format!("{ip}/32").parse()?, port);
        network_node::install_route(sim, host, "0.0.0.0/0".parse()?, 1);
    }

    Ok(TopologySummary {
        kind: TopologyKind::SimpleStar,
        k: None,
        hosts,
        switches: vec![sw],
        links,
        failed_links,
    })
}

/// Al-Fares-style Clos fabric: `k` pods, `k/2` edge and `k/2` aggregation switches
/// per pod, `(k/2)^2` core switches, `k^3/4` hosts.
pub fn build_fat_tree(sim: &mut Simulation, k: u32, failure_pct: f64) -> Result<TopologySummary> {
    if k < 2 || k % 2 != 0 {
        return Err(SimError::InvalidArgument(format!(
            "fat-tree k must be even and >= 2, got {k}"
        )));
    }
    let half = k / 2;

    let mut core_switches = Vec::new();
    for c in 0..(half * half) {
        core_switches.push(sim.add_switch(Switch::new(
            format!("core_switch_c{c}"),
            k,
            FAT_TREE_MAX_PATH,
        )));
    }

    let mut edge_switches = vec![Vec::new(); k as usize];
    let mut agg_switches = vec![Vec::new(); k as usize];
    let mut hosts = vec![Vec::new(); k as usize];
    let mut all_links = Vec::new();

    for pod in 0..k {
        for e in 0..half {
            edge_switches[pod as usize].push(sim.add_switch(Switch::new(
                format!("es_{pod}_{e}"),
                k,
                FAT_TREE_MAX_PATH,
            )));
        }
        for a in 0..half {
            agg_switches[pod as usize].push(sim.add_switch(Switch::new(
                format!("a_s{pod}_{a}"),
                k,
                FAT_TREE_MAX_PATH,
            )));
        }
        for e in 0..half {
            for h in 0..half {
                let ip = IpAddress::from_octets(10, (pod + 1) as u8, (e + 1) as u8, (h + 1) as u8);
                let host = sim.add_host(Host::new(
                    format!("h_{pod}_{e}_{h}"),
                    ip,
                    1,
                    FAT_TREE_MAX_PATH,
                ));
                hosts[pod as usize].push(host);
                let link = sim.add_link(Link::new(
                    format!("l_h_{pod}_{e}_{h}"),
                    DEFAULT_BANDWIDTH_BPS,
                    DEFAULT_PROPAGATION_TIME,
                ));
                let edge = edge_switches[pod as usize][e as usize];
                network_node::connect(sim, edge, (h + 1) as u32, link)?;
                network_node::connect(sim, host, 1, link)?;
                all_links.push(link);
            }
        }
        // edge <-> aggregation, full mesh within the pod
        for e in 0..half {
            for a in 0..half {
                let link = sim.add_link(Link::new(
                    format!("l_ea_{pod}_{e}_{a}"),
                    DEFAULT_BANDWIDTH_BPS,
                    DEFAULT_PROPAGATION_TIME,
                ));
                let edge = edge_switches[pod as usize][e as usize];
                let agg = agg_switches[pod as usize][a as usize];
                network_node::connect(sim, edge, half + 1 + a, link)?;
                network_node::connect(sim, agg, (e + 1) as u32, link)?;
                all_links.push(link);
            }
        }
        // aggregation <-> core
        for a in 0..half {
            for c in 0..half {
                let core_index = a * half + c;
                let link = sim.add_link(Link::new(
                    format!("l_ac_{pod}_{a}_{c}"),
                    DEFAULT_BANDWIDTH_BPS,
                    DEFAULT_PROPAGATION_TIME,
                ));
                let agg = agg_switches[pod as usize][a as usize];
                let core = core_switches[core_index as usize];
                network_node::connect(sim, agg, half + 1 + c, link)?;
                network_node::connect(sim, core, (pod + 1) as u32, link)?;
                all_links.push(link);
            }
        }
    }

    let failed_links = inject_failures(sim, &all_links, failure_pct)?;

    // host-facing routes: up to the edge switch, scoped to the fabric's own /8.
    for pod_hosts in &hosts {
        for &host in pod_hosts {
            network_node::install_route(sim, host, "10.0.0.0/8".parse()?, 1);
        }
    }
    // edge switches: /32 down to each directly attached host, /8 up to aggregation.
    for pod in 0..k {
        for e in 0..half {
            let edge = edge_switches[pod as usize][e as usize];
            for h in 0..half {
                let host_ip = IpAddress::from_octets(10, (pod + 1) as u8, (e + 1) as u8, (h + 1) as u8);
                network_node::install_route(sim, edge, format!("{host_ip}/32").parse()?, (h + 1) as u32);
            }
            for a in 0..half {
                network_node::install_route(sim, edge, "10.0.0.0/8".parse()?, half + 1 + a);
            }
        }
    }
    // aggregation switches: /24 down to each edge in the pod, /8 up to core.
    for pod in 0..k {
        for a in 0..half {
            let agg = agg_switches[pod as usize][a as usize];
            for e in 0..half {
                let edge_prefix = format!("10.{}.{}.0/24", pod + 1, e + 1);
                network_node::install_route(sim, agg, edge_prefix.parse()?, (e + 1) as u32);
            }
            for c in 0..half {
                network_node::install_route(sim, agg, "10.0.0.0/8".parse()?, half + 1 + c);
            }
        }
    }
    // core switches: /16 down to the pod's aggregation switch assigned to this core's slot.
    for c in 0..(half * half) {
        let core = core_switches[c as usize];
        for pod in 0..k {
            let pod_prefix = format!("10.{}.0.0/16", pod + 1);
            network_node::install_route(sim, core, pod_prefix.parse()?, (pod + 1) as u32);
        }
    }

    let switches: Vec<NodeId> = core_switches
        .into_iter()
        .chain(edge_switches.into_iter().flatten())
        .chain(agg_switches.into_iter().flatten())
        .collect();
    let hosts: Vec<NodeId> = hosts.into_iter().flatten().collect();

    Ok(TopologySummary {
        kind: TopologyKind::FatTree,
        k: Some(k),
        hosts,
        switches,
        links: all_links,
        failed_links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fat_tree_k4_host_count() {
        let mut sim = Simulation::new(1972);
        let summary = build_fat_tree(&mut sim, 4, 0.0).unwrap();
        // k^3/4 hosts
        assert_eq!(summary.hosts.len(), 16);
        assert!(summary.failed_links.is_empty());
    }

    #[test]
    fn fat_tree_rejects_odd_k() {
        let mut sim = Simulation::new(1972);
        assert!(build_fat_tree(&mut sim, 3, 0.0).is_err());
    }

    #[test]
    fn failure_injection_is_deterministic_given_seed() {
        let mut sim_a = Simulation::new(42);
        let summary_a = build_fat_tree(&mut sim_a, 4, 10.0).unwrap();
        let mut sim_b = Simulation::new(42);
        let summary_b = build_fat_tree(&mut sim_b, 4, 10.0).unwrap();
        assert_eq!(summary_a.failed_links.len(), summary_b.failed_links.len());
        assert_eq!(summary_a.failed_links, summary_b.failed_links);
    }

    #[test]
    fn hsh_delivers_hello() {
        let mut sim = Simulation::new(1972);
        let summary = build_hsh(&mut sim, 0.0).unwrap();
        let dst_ip = sim.host(summary.hosts[1]).ip;
        crate::host::send(&mut sim, summary.hosts[0], dst_ip, b"hi".to_vec(), 64, None).unwrap();
        sim.run(None).unwrap();
        assert!(sim.scheduler.ledger()[0].delivered);
    }
}
