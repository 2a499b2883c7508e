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
//! Switches: pure forwarders with no IP identity of their own.

use crate::error::Result;
use crate::message::MessageId;
use crate::network_node::{self, NetworkNode};
use crate::node::NodeId;
use crate::simulation::Simulation;

#[derive(Debug, Clone)]
pub struct Switch {
    pub network_node: NetworkNode,
}

impl Switch {
    pub fn new(name: impl Into<String>, max_connections: u32, max_path: u32) -> Self {
        Switch {
            network_node: NetworkNode::new(name, max_connections, max_path),
        }
    }

    pub fn name(&self) -> &str {
        &self.network_node.name
    }
}

pub fn on_message(sim: &mut Simulation, node: NodeId, message_id: MessageId) -> Result<()> {
    network_node::forward(sim, node, message_id)
}
