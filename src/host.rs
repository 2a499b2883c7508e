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
//! Hosts: endpoints that originate traffic and terminate messages addressed to them.

use log::info;

use crate::error::Result;
use crate::ip::IpAddress;
use crate::message::{FiveTuple, Message, MessageId, Protocol, DEFAULT_TTL};
use crate::network_node::{self, NetworkNode};
use crate::node::NodeId;
use crate::simulation::Simulation;

#[derive(Debug, Clone)]
pub struct Host {
    pub network_node: NetworkNode,
    pub ip: IpAddress,
    pub delivered_count: u32,
}

impl Host {
    pub fn new(name: impl Into<String>, ip: IpAddress, max_connections: u32, max_path: u32) -> Self {
        Host {
            network_node: NetworkNode::new(name, max_connections, max_path),
            ip,
            delivered_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.network_node.name
    }
}

/// Originate a new message addressed to `dst_ip` and hand it to the forwarding path.
pub fn send(
    sim: &mut Simulation,
    node: NodeId,
    dst_ip: IpAddress,
    content: Vec<u8>,
    size_bytes: u64,
    ttl: Option<f64>,
) -> Result<MessageId> {
    let (src_ip, verbose) = {
        let host = sim.host(node);
        (host.ip, sim.verbose)
    };
    let now = sim.scheduler.current_time;
    let five_tuple = FiveTuple {
        src_ip,
        dst_ip,
        src_port: 0,
        dst_port: 0,
        protocol: Protocol::Tcp,
    };
    let message_id = sim.scheduler.register_message(|id| {
        let mut m = Message::new(
            id,
            five_tuple,
            size_bytes,
            now,
            content,
            ttl.unwrap_or(DEFAULT_TTL),
            verbose,
        );
        m.touch(node);
        m
    });
    network_node::forward(sim, node, message_id)?;
    Ok(message_id)
}

/// Terminate a message that reached this host, or fall through to forwarding if it
/// was addressed elsewhere (a host behaves as a plain `NetworkNode` in that case).
pub fn on_message(sim: &mut Simulation, node: NodeId, message_id: MessageId) -> Result<()> {
    let dst_matches = {
        let host = sim.host(node);
        sim.scheduler.message(message_id).five_tuple.dst_ip == host.ip
    };
    if dst_matches {
        let now = sim.scheduler.current_time;
        let message = sim.scheduler.message_mut(message_id);
        message.delivered = true;
        message.arrival_time = Some(now);
        sim.scheduler.message(message_id).assert_invariant();
        sim.host_mut(node).delivered_count += 1;
        info!("'{}' received message {message_id:?}", sim.host(node).name());
        Ok(())
    } else {
        network_node::forward(sim, node, message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::switch::Switch;

    #[test]
    fn send_registers_and_stamps_message() {
        let mut sim = Simulation::new(1972);
        let sw = sim.add_switch(Switch::new("sw", 2, 64));
        let h1 = sim.add_host(Host::new("h1", "10.0.0.1".parse().unwrap(), 1, 64));
        let l1 = sim.add_link(Link::new("l1", 1e9, 0.0));
        network_node::connect(&mut sim, sw, 1, l1).unwrap();
        network_node::connect(&mut sim, h1, 1, l1).unwrap();
        network_node::install_route(&mut sim, h1, "0.0.0.0/0".parse().unwrap(), 1);
        let id = send(&mut sim, h1, "10.0.0.2".parse().unwrap(), vec![], 10, None).unwrap();
        assert_eq!(sim.scheduler.message(id).path_length, 1);
    }
}
