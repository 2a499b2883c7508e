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
//! Ports, routing table and the forwarding decision shared by hosts and switches.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use rand::seq::SliceRandom;

use crate::error::{Result, SimError};
use crate::ip::IpPrefix;
use crate::link::LinkId;
use crate::message::MessageId;
use crate::node::{Inbox, NodeId};
use crate::simulation::Simulation;

pub type PortId = u32;

#[derive(Debug, Clone)]
pub struct NetworkNode {
    pub name: String,
    pub inbox: Inbox,
    pub ports: HashMap<PortId, LinkId>,
    table: Vec<(IpPrefix, PortId)>,
    seen: HashMap<PortId, HashSet<MessageId>>,
    pub max_connections: u32,
    pub max_path: u32,
}

impl NetworkNode {
    pub fn new(name: impl Into<String>, max_connections: u32, max_path: u32) -> Self {
        NetworkNode {
            name: name.into(),
            inbox: Inbox::default(),
            ports: HashMap::new(),
            table: Vec::new(),
            seen: HashMap::new(),
            max_connections,
            max_path,
        }
    }

    pub fn is_full(&self) -> bool {
        self.ports.len() as u32 >= self.max_connections
    }

    fn seen_mut(&mut self, port: PortId) -> &mut HashSet<MessageId> {
        self.seen.entry(port).or_default()
    }
}

/// Wire a node's port to a link, failing if the port is taken or the node is full.
pub fn connect(sim: &mut Simulation, node: NodeId, port: PortId, link: LinkId) -> Result<()> {
    {
        let nn = sim.node_mut(node).network_node_mut();
        if nn.ports.contains_key(&port) {
            return Err(SimError::InvalidState(format!(
                "port {port} on '{}' is already connected",
                nn.name
            )));
        }
        if nn.is_full() {
            return Err(SimError::InvalidState(format!(
                "'{}' has no free ports (max_connections={})",
                nn.name, nn.max_connections
            )));
        }
    }
    sim.link_mut(link).connect(node)?;
    sim.node_mut(node).network_node_mut().ports.insert(port, link);
    Ok(())
}

/// Install a route, skipped (and logged) if the port's link has already failed —
/// this is how link-failure injection keeps failed links out of every routing table.
pub fn install_route(sim: &mut Simulation, node: NodeId, prefix: IpPrefix, port: PortId) {
    let nn = sim.node(node).network_node();
    let link = nn.ports.get(&port).copied();
    let skip = match link {
        Some(link) => sim.link(link).failed,
        None => true,
    };
    if skip {
        debug!(
            "skipping route {prefix} -> port {port} on '{}': port has no non-failed link",
            sim.node(node).network_node().name
        );
    } else {
        sim.node_mut(node)
            .network_node_mut()
            .table
            .push((prefix, port));
    }

    let nn = sim.node(node).network_node();
    debug_assert!(
        nn.table.iter().all(|(_, port)| nn
            .ports
            .get(port)
            .is_some_and(|link| !sim.link(*link).failed)),
        "'{}' has a route entry pointing at a failed or disconnected link",
        nn.name
    );
}

/// The forwarding decision: expiry check, then lost-mode reroute or LPM/ECMP,
/// with loop detection falling back into lost mode.
pub fn forward(sim: &mut Simulation, node: NodeId, message_id: MessageId) -> Result<()> {
    let now = sim.scheduler.current_time;
    let max_path = sim.node(node).network_node().max_path;

    if sim.scheduler.message(message_id).is_expired(now, max_path) {
        sim.scheduler.message_mut(message_id).dropped = true;
        sim.scheduler.message(message_id).assert_invariant();
        debug!("message {message_id:?} expired at '{}'", sim.node(node).network_node().name);
        return Ok(());
    }

    if sim.scheduler.message(message_id).lost {
        return forward_lost(sim, node, message_id);
    }

    let dst_ip = sim.scheduler.message(message_id).five_tuple.dst_ip;
    let nn = sim.node(node).network_node();
    let node_name = nn.name.clone();
    let best_len = nn
        .table
        .iter()
        .filter(|(prefix, _)| prefix.contains(dst_ip))
        .map(|(prefix, _)| prefix.prefix_len())
        .max();

    let Some(best_len) = best_len else {
        sim.scheduler.message_mut(message_id).dropped = true;
        sim.scheduler.message(message_id).assert_invariant();
        debug!("route miss for {dst_ip} at '{}'", node_name);
        return Ok(());
    };

    let group: Vec<PortId> = nn
        .table
        .iter()
        .filter(|(prefix, _)| prefix.contains(dst_ip) && prefix.prefix_len() == best_len)
        .map(|(_, port)| *port)
        .collect();

    let hash = sim.scheduler.message(message_id).five_tuple.stable_hash();
    let port = group[(hash as usize) % group.len()];

    let already_seen = sim
        .node(node)
        .network_node()
        .seen
        .get(&port)
        .is_some_and(|set| set.contains(&message_id));

    if already_seen {
        sim.scheduler.message_mut(message_id).lost = true;
        warn!(
            "loop detected for message {message_id:?} at '{}' port {port}, entering lost mode",
            sim.node(node).network_node().name
        );
        return forward_lost(sim, node, message_id);
    }

    sim.node_mut(node)
        .network_node_mut()
        .seen_mut(port)
        .insert(message_id);
    transmit_on_port(sim, node, port, message_id)
}

/// Re-route a message flagged `lost` over a uniformly random non-failed, unused port.
fn forward_lost(sim: &mut Simulation, node: NodeId, message_id: MessageId) -> Result<()> {
    let nn = sim.node(node).network_node();
    let mut candidates: Vec<PortId> = nn
        .ports
        .keys()
        .copied()
        .filter(|port| {
            let link_ok = nn
                .ports
                .get(port)
                .map(|link| !sim.link(*link).failed)
                .unwrap_or(false);
            let unused = !nn
                .seen
                .get(port)
                .is_some_and(|set| set.contains(&message_id));
            link_ok && unused
        })
        .collect();
    candidates.sort_unstable();

    if candidates.is_empty() {
        sim.scheduler.message_mut(message_id).dropped = true;
        sim.scheduler.message(message_id).assert_invariant();
        debug!(
            "no candidate ports left for lost message {message_id:?} at '{}'",
            sim.node(node).network_node().name
        );
        return Ok(());
    }

    let port = *candidates.choose(&mut sim.rng).expect("non-empty candidates");
    sim.node_mut(node)
        .network_node_mut()
        .seen_mut(port)
        .insert(message_id);
    transmit_on_port(sim, node, port, message_id)
}

fn transmit_on_port(
    sim: &mut Simulation,
    node: NodeId,
    port: PortId,
    message_id: MessageId,
) -> Result<()> {
    let link_id = *sim
        .node(node)
        .network_node()
        .ports
        .get(&port)
        .ok_or_else(|| SimError::InvalidState(format!("port {port} is not connected")))?;
    let size_bytes = sim.scheduler.message(message_id).size_bytes;
    sim.scheduler.message_mut(message_id).touch(node);
    sim.transmit(link_id, node, message_id, size_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::link::Link;
    use crate::switch::Switch;

    fn star(bandwidth: f64) -> (Simulation, NodeId, NodeId, NodeId) {
        let mut sim = Simulation::new(1972);
        let sw = sim.add_switch(Switch::new("sw", 8, 64));
        let h1 = sim.add_host(Host::new("h1", "10.0.0.1".parse().unwrap(), 1, 64));
        let h2 = sim.add_host(Host::new("h2", "10.0.0.2".parse().unwrap(), 1, 64));
        let l1 = sim.add_link(Link::new("l1", bandwidth, 0.0));
        let l2 = sim.add_link(Link::new("l2", bandwidth, 0.0));
        connect(&mut sim, sw, 1, l1).unwrap();
        connect(&mut sim, h1, 1, l1).unwrap();
        connect(&mut sim, sw, 2, l2).unwrap();
        connect(&mut sim, h2, 1, l2).unwrap();
        install_route(&mut sim, sw, "10.0.0.1/32".parse().unwrap(), 1);
        install_route(&mut sim, sw, "10.0.0.2/32".parse().unwrap(), 2);
        install_route(&mut sim, h1, "0.0.0.0/0".parse().unwrap(), 1);
        install_route(&mut sim, h2, "0.0.0.0/0".parse().unwrap(), 1);
        (sim, sw, h1, h2)
    }

    #[test]
    fn lpm_picks_longest_prefix() {
        let (mut sim, _sw, h1, h2) = star(1e9);
        let dst_ip: crate::ip::IpAddress = "10.0.0.2".parse().unwrap();
        crate::host::send(&mut sim, h1, dst_ip, vec![], 100, None).unwrap();
        sim.run(None).unwrap();
        let delivered = sim
            .scheduler
            .ledger()
            .iter()
            .any(|m| m.delivered && m.five_tuple.dst_ip == dst_ip);
        assert!(delivered);
        let _ = h2;
    }

    #[test]
    fn route_miss_drops_message() {
        let (mut sim, _sw, h1, _h2) = star(1e9);
        let unknown: crate::ip::IpAddress = "192.168.1.1".parse().unwrap();
        crate::host::send(&mut sim, h1, unknown, vec![], 100, None).unwrap();
        sim.run(None).unwrap();
        assert!(sim.scheduler.ledger()[0].dropped);
    }
}
