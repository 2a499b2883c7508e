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
//! Full-duplex links: per-direction serialization plus a fixed propagation delay.

use log::debug;

use crate::error::{Result, SimError};
use crate::event::Action;
use crate::message::MessageId;
use crate::node::NodeId;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub usize);

#[derive(Debug, Clone)]
pub struct Link {
    pub name: String,
    pub bandwidth_bps: f64,
    pub propagation_time: f64,
    endpoints: [Option<NodeId>; 2],
    next_available_time: [f64; 2],
    pub failed: bool,
    pub accumulated_transmitting_time: f64,
    pub accumulated_bytes_transmitted: u64,
}

impl Link {
    pub fn new(name: impl Into<String>, bandwidth_bps: f64, propagation_time: f64) -> Self {
        Link {
            name: name.into(),
            bandwidth_bps,
            propagation_time,
            endpoints: [None, None],
            next_available_time: [0.0, 0.0],
            failed: false,
            accumulated_transmitting_time: 0.0,
            accumulated_bytes_transmitted: 0,
        }
    }

    pub fn connect(&mut self, node: NodeId) -> Result<()> {
        for slot in self.endpoints.iter_mut() {
            if slot.is_none() {
                *slot = Some(node);
                return Ok(());
            }
        }
        Err(SimError::InvalidState(format!(
            "link '{}' already has both endpoints connected",
            self.name
        )))
    }

    pub fn endpoints(&self) -> [Option<NodeId>; 2] {
        self.endpoints
    }

    pub fn other_end(&self, from: NodeId) -> Option<NodeId> {
        match self.endpoints {
            [Some(a), Some(b)] if a == from => Some(b),
            [Some(a), Some(b)] if b == from => Some(a),
            _ => None,
        }
    }

    fn direction_of(&self, sender: NodeId) -> Result<usize> {
        match self.endpoints {
            [Some(a), _] if a == sender => Ok(0),
            [_, Some(b)] if b == sender => Ok(1),
            _ => Err(SimError::InvalidState(format!(
                "'{}' is not an endpoint of link '{}'",
                sender.0, self.name
            ))),
        }
    }

    /// Serialize and schedule delivery of `message`, returning the delay until the
    /// `Deliver` action will fire.
    pub fn transmit(
        &mut self,
        scheduler: &mut Scheduler,
        sender: NodeId,
        message: MessageId,
        size_bytes: u64,
    ) -> Result<()> {
        if self.failed {
            return Err(SimError::InvalidState(format!(
                "link '{}' has failed and cannot transmit",
                self.name
            )));
        }
        let dir = self.direction_of(sender)?;
        let dst = self.other_end(sender).ok_or_else(|| {
            SimError::InvalidState(format!("link '{}' has no opposite endpoint", self.name))
        })?;

        let now = scheduler.current_time;
        let start = now.max(self.next_available_time[dir]);
        let serialization_duration = (size_bytes as f64 * 8.0) / self.bandwidth_bps;
        self.accumulated_transmitting_time += serialization_duration;
        self.accumulated_bytes_transmitted += size_bytes;
        let finish = start + serialization_duration;
        self.next_available_time[dir] = finish;
        let arrival = finish + self.propagation_time;

        debug!(
            "link '{}' dir={dir} start={start} finish={finish} arrival={arrival}",
            self.name
        );
        scheduler.schedule(arrival - now, Action::Deliver { node: dst, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_and_propagation_delay() {
        let mut link = Link::new("l0", 1000.0, 0.01);
        link.connect(NodeId(0)).unwrap();
        link.connect(NodeId(1)).unwrap();
        let mut scheduler = Scheduler::new();
        scheduler.current_time = 0.1;
        link.transmit(&mut scheduler, NodeId(0), MessageId(0), 500_000)
            .unwrap();
        let event = scheduler.next_event(None).unwrap();
        // serialization = 500_000 * 8 / 1000 = 4000s, + 0.1 start + 0.01 propagation
        assert!((event.time.into_inner() - 4000.11).abs() < 1e-9);
    }

    #[test]
    fn back_to_back_sends_serialize_in_order() {
        let mut link = Link::new("l0", 1000.0, 0.01);
        link.connect(NodeId(0)).unwrap();
        link.connect(NodeId(1)).unwrap();
        let mut scheduler = Scheduler::new();
        scheduler.current_time = 0.1;
        link.transmit(&mut scheduler, NodeId(0), MessageId(0), 500_000)
            .unwrap();
        link.transmit(&mut scheduler, NodeId(0), MessageId(1), 500_000)
            .unwrap();
        let first = scheduler.next_event(None).unwrap();
        let second = scheduler.next_event(None).unwrap();
        assert!((first.time.into_inner() - 4000.11).abs() < 1e-9);
        assert!((second.time.into_inner() - 8000.11).abs() < 1e-9);
    }

    #[test]
    fn failed_link_rejects_transmit() {
        let mut link = Link::new("l0", 1000.0, 0.01);
        link.connect(NodeId(0)).unwrap();
        link.connect(NodeId(1)).unwrap();
        link.failed = true;
        let mut scheduler = Scheduler::new();
        assert!(link
            .transmit(&mut scheduler, NodeId(0), MessageId(0), 100)
            .is_err());
    }

    #[test]
    fn opposite_directions_do_not_contend() {
        let mut link = Link::new("l0", 1000.0, 0.0);
        link.connect(NodeId(0)).unwrap();
        link.connect(NodeId(1)).unwrap();
        let mut scheduler = Scheduler::new();
        link.transmit(&mut scheduler, NodeId(0), MessageId(0), 500_000)
            .unwrap();
        link.transmit(&mut scheduler, NodeId(1), MessageId(1), 500_000)
            .unwrap();
        let first = scheduler.next_event(None).unwrap();
        let second = scheduler.next_event(None).unwrap();
        assert!((first.time.into_inner() - 4000.0).abs() < 1e-9);
        assert!((second.time.into_inner() - 4000.0).abs() < 1e-9);
    }
}
