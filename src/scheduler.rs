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
//! Clock, event queue and message ledger. Dispatch of the action attached to each
//! event lives in `simulation.rs`, which also owns the node/link arenas a dispatch
//! needs to touch; the scheduler itself only knows about time and bookkeeping.

use log::trace;

use crate::error::{Result, SimError};
use crate::event::{Action, Event, EventQueue};
use crate::message::{Message, MessageId};

#[derive(Debug)]
pub struct Scheduler {
    pub current_time: f64,
    queue: EventQueue,
    seq_counter: u64,
    ledger: Vec<Message>,
    pub end_time: Option<f64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            current_time: 0.0,
            queue: EventQueue::new(),
            seq_counter: 0,
            ledger: Vec::new(),
            end_time: None,
        }
    }

    pub fn schedule(&mut self, delay: f64, action: Action) -> Result<()> {
        if delay < 0.0 {
            return Err(SimError::InvalidArgument(format!(
                "schedule delay must be non-negative, got {delay}"
            )));
        }
        let time = self.current_time + delay;
        let seq = self.seq_counter;
        self.seq_counter += 1;
        trace!("schedule seq={seq} time={time} action={action:?}");
        self.queue.enqueue(Event::new(time, seq, action));
        Ok(())
    }

    pub fn register_message(&mut self, build: impl FnOnce(MessageId) -> Message) -> MessageId {
        let id = MessageId(self.ledger.len());
        self.ledger.push(build(id));
        id
    }

    pub fn message(&self, id: MessageId) -> &Message {
        &self.ledger[id.0]
    }

    pub fn message_mut(&mut self, id: MessageId) -> &mut Message {
        &mut self.ledger[id.0]
    }

    pub fn ledger(&self) -> &[Message] {
        &self.ledger
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pop the next due event, advancing `current_time` to it, unless `until` is
    /// reached first — in which case the event is put back and `current_time` jumps
    /// to `until` instead.
    pub fn next_event(&mut self, until: Option<f64>) -> Option<Event> {
        let event = self.queue.dequeue()?;
        if let Some(until) = until {
            if event.time.into_inner() > until {
                self.queue.enqueue(event);
                self.current_time = until;
                return None;
            }
        }
        self.current_time = event.time.into_inner();
        Some(event)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn negative_delay_is_rejected() {
        let mut s = Scheduler::new();
        assert!(s.schedule(-1.0, Action::Handle { node: NodeId(0) }).is_err());
    }

    #[test]
    fn clock_advances_monotonically() {
        let mut s = Scheduler::new();
        s.schedule(2.0, Action::Handle { node: NodeId(0) }).unwrap();
        s.schedule(1.0, Action::Handle { node: NodeId(1) }).unwrap();
        let e1 = s.next_event(None).unwrap();
        assert_eq!(e1.time.into_inner(), 1.0);
        let e2 = s.next_event(None).unwrap();
        assert_eq!(e2.time.into_inner(), 2.0);
        assert!(s.current_time >= 1.0);
    }

    #[test]
    fn until_stops_early_and_requeues() {
        let mut s = Scheduler::new();
        s.schedule(5.0, Action::Handle { node: NodeId(0) }).unwrap();
        assert!(s.next_event(Some(1.0)).is_none());
        assert_eq!(s.current_time, 1.0);
        assert!(!s.is_empty());
    }
}
