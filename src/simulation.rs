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
//! The simulation context: node and link arenas, the scheduler, and the seeded RNG
//! that drives lost-mode port selection. Everything mutable lives here, addressed by
//! [`NodeId`]/[`LinkId`], rather than behind `Rc<RefCell<_>>` handles passed around —
//! keeping a single owner makes running independent experiments in parallel trivial.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::event::Action;
use crate::host::Host;
use crate::link::{Link, LinkId};
use crate::message::MessageId;
use crate::network_node::NetworkNode;
use crate::node::NodeId;
use crate::scheduler::Scheduler;
use crate::switch::Switch;
use crate::{host, switch};

#[derive(Debug, Clone)]
pub enum NodeEntity {
    Host(Host),
    Switch(Switch),
}

impl NodeEntity {
    pub fn network_node(&self) -> &NetworkNode {
        match self {
            NodeEntity::Host(h) => &h.network_node,
            NodeEntity::Switch(s) => &s.network_node,
        }
    }

    pub fn network_node_mut(&mut self) -> &mut NetworkNode {
        match self {
            NodeEntity::Host(h) => &mut h.network_node,
            NodeEntity::Switch(s) => &mut s.network_node,
        }
    }

    pub fn name(&self) -> &str {
        &self.network_node().name
    }
}

pub struct Simulation {
    pub scheduler: Scheduler,
    nodes: Vec<NodeEntity>,
    links: Vec<Link>,
    pub rng: StdRng,
    pub seed: u64,
    pub verbose: bool,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Simulation {
            scheduler: Scheduler::new(),
            nodes: Vec::new(),
            links: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn add_host(&mut self, host: Host) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntity::Host(host));
        id
    }

    pub fn add_switch(&mut self, switch: Switch) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntity::Switch(switch));
        id
    }

    pub fn add_link(&mut self, link: Link) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(link);
        id
    }

    pub fn node(&self, id: NodeId) -> &NodeEntity {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeEntity {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeEntity)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn host(&self, id: NodeId) -> &Host {
        match self.node(id) {
            NodeEntity::Host(h) => h,
            NodeEntity::Switch(_) => panic!("node {} is not a host", id.0),
        }
    }

    pub fn host_mut(&mut self, id: NodeId) -> &mut Host {
        match self.node_mut(id) {
            NodeEntity::Host(h) => h,
            NodeEntity::Switch(_) => panic!("node {} is not a host", id.0),
        }
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.0]
    }

    /// Serialize `message` onto `link`. Takes the link and scheduler as disjoint
    /// field borrows (rather than going through `link_mut` and `&mut self.scheduler`
    /// as two separate method calls, which the borrow checker cannot see as disjoint).
    pub fn transmit(
        &mut self,
        link: LinkId,
        sender: NodeId,
        message: MessageId,
        size_bytes: u64,
    ) -> Result<()> {
        self.links[link.0].transmit(&mut self.scheduler, sender, message, size_bytes)
    }

    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> {
        self.links.iter().enumerate().map(|(i, l)| (LinkId(i), l))
    }

    /// Run the event loop until the queue drains, or until `until` if given. Sets
    /// `scheduler.end_time` once the loop stops.
    pub fn run(&mut self, until: Option<f64>) -> Result<()> {
        while let Some(event) = self.scheduler.next_event(until) {
            self.dispatch(event.action)?;
        }
        self.scheduler.end_time = Some(self.scheduler.current_time);
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Deliver { node, message } => {
                self.node_mut(node).network_node_mut().inbox.push(message);
                self.scheduler.schedule(0.0, Action::Handle { node })
            }
            Action::Handle { node } => self.handle(node),
            Action::Originate {
                host: node,
                dst_ip,
                size_bytes,
            } => host::send(self, node, dst_ip, Vec::new(), size_bytes, None).map(|_| ()),
        }
    }

    fn handle(&mut self, node: NodeId) -> Result<()> {
        let message = self.node_mut(node).network_node_mut().inbox.pop();
        let Some(message) = message else {
            return Ok(());
        };
        match self.node(node) {
            NodeEntity::Host(_) => host::on_message(self, node, message)?,
            NodeEntity::Switch(_) => switch::on_message(self, node, message)?,
        }
        if !self.node(node).network_node().inbox.is_empty() {
            self.scheduler.schedule(0.0, Action::Handle { node })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_node;

    #[test]
    fn two_events_fire_in_fifo_order_at_the_same_time() {
        let mut sim = Simulation::new(1972);
        let sw = sim.add_switch(Switch::new("sw", 2, 64));
        sim.scheduler.schedule(1.0, Action::Handle { node: sw }).unwrap();
        sim.scheduler.schedule(1.0, Action::Handle { node: sw }).unwrap();
        sim.run(None).unwrap();
        assert_eq!(sim.scheduler.current_time, 1.0);
    }

    #[test]
    fn loop_triggers_lost_mode_and_still_delivers() {
        // Triangle of switches sw1-sw2-sw3 all pointing at each other for the
        // destination, forcing a loop that only lost-mode can escape.
        let mut sim = Simulation::new(1972);
        let sw1 = sim.add_switch(Switch::new("sw1", 4, 64));
        let sw2 = sim.add_switch(Switch::new("sw2", 4, 64));
        let sw3 = sim.add_switch(Switch::new("sw3", 4, 64));
        let h1 = sim.add_host(Host::new("h1", "10.0.0.1".parse().unwrap(), 1, 64));
        let h2 = sim.add_host(Host::new("h2", "10.0.0.2".parse().unwrap(), 1, 64));

        let l_h1 = sim.add_link(Link::new("l_h1", 1e9, 0.0));
        let l_h2 = sim.add_link(Link::new("l_h2", 1e9, 0.0));
        let l_12 = sim.add_link(Link::new("l_12", 1e9, 0.0));
        let l_23 = sim.add_link(Link::new("l_23", 1e9, 0.0));
        let l_13 = sim.add_link(Link::new("l_13", 1e9, 0.0));

        network_node::connect(&mut sim, h1, 1, l_h1).unwrap();
        network_node::connect(&mut sim, sw1, 1, l_h1).unwrap();
        network_node::connect(&mut sim, h2, 1, l_h2).unwrap();
        network_node::connect(&mut sim, sw2, 1, l_h2).unwrap();
        network_node::connect(&mut sim, sw1, 2, l_12).unwrap();
        network_node::connect(&mut sim, sw2, 2, l_12).unwrap();
        network_node::connect(&mut sim, sw2, 3, l_23).unwrap();
        network_node::connect(&mut sim, sw3, 2, l_23).unwrap();
        network_node::connect(&mut sim, sw1, 3, l_13).unwrap();
        network_node::connect(&mut sim, sw3, 1, l_13).unwrap();

        network_node::install_route(&mut sim, h1, "0.0.0.0/0".parse().unwrap(), 1);
        network_node::install_route(&mut sim, h2, "0.0.0.0/0".parse().unwrap(), 1);
        // sw1 sends everything for h2's /32 in a loop back to sw3, never toward sw2 directly.
        network_node::install_route(&mut sim, sw1, "10.0.0.2/32".parse().unwrap(), 3);
        network_node::install_route(&mut sim, sw3, "10.0.0.2/32".parse().unwrap(), 1);
        network_node::install_route(&mut sim, sw2, "10.0.0.2/32".parse().unwrap(), 1);

        let id = host::send(&mut sim, h1, "10.0.0.2".parse().unwrap(), vec![], 10, None).unwrap();
        sim.run(None).unwrap();
        let message = sim.scheduler.message(id);
        assert!(message.dropped || message.delivered);
    }
}
