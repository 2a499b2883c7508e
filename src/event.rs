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
//! Events and the min-heap that orders them.
//!
//! Events are ordered on `(time, seq)`, a tagged [`Action`] rather than a boxed
//! closure so the queue stays inspectable. `std::collections::BinaryHeap` is a
//! max-heap, so [`Event`]'s `Ord` impl is reversed to make it behave as a min-heap;
//! this avoids pulling in an external indexed priority-queue crate whose
//! decrease-key semantics this queue never needs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::ip::IpAddress;
use crate::message::MessageId;
use crate::node::NodeId;

/// What the scheduler does when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A link finished serializing a message; post it into the destination's inbox.
    Deliver { node: NodeId, message: MessageId },
    /// Drain one message from a node's inbox.
    Handle { node: NodeId },
    /// A host originates a new message at this simulated time (used by traffic
    /// scenarios to give every send a jittered start time).
    Originate {
        host: NodeId,
        dst_ip: IpAddress,
        size_bytes: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: ordered_float::OrderedFloat<f64>,
    pub seq: u64,
    pub action: Action,
}

impl Event {
    pub fn new(time: f64, seq: u64, action: Action) -> Self {
        Event {
            time: ordered_float::OrderedFloat(time),
            seq,
            action,
        }
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `BinaryHeap` (a max-heap) pops the earliest (time, seq) first.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of [`Event`]s keyed by `(time, seq)`. No decrease-key is needed: every
/// event is inserted once and dequeued once.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue { heap: BinaryHeap::new() }
    }

    pub fn enqueue(&mut self, event: Event) {
        self.heap.push(event);
    }

    pub fn dequeue(&mut self) -> Option<Event> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(n: usize) -> NodeId {
        NodeId(n)
    }

    #[test]
    fn dequeues_in_time_order() {
        let mut q = EventQueue::new();
        q.enqueue(Event::new(2.0, 0, Action::Handle { node: node(0) }));
        q.enqueue(Event::new(1.0, 1, Action::Handle { node: node(1) }));
        let first = q.dequeue().unwrap();
        assert_eq!(first.time.into_inner(), 1.0);
        let second = q.dequeue().unwrap();
        assert_eq!(second.time.into_inner(), 2.0);
    }

    #[test]
    fn ties_broken_by_seq() {
        let mut q = EventQueue::new();
        q.enqueue(Event::new(1.0, 5, Action::Handle { node: node(0) }));
        q.enqueue(Event::new(1.0, 2, Action::Handle { node: node(1) }));
        assert_eq!(q.dequeue().unwrap().seq, 2);
        assert_eq!(q.dequeue().unwrap().seq, 5);
    }

    #[test]
    fn empty_queue_dequeues_none() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.dequeue(), None);
    }
}
