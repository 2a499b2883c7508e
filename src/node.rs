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
//! The base node contract: a name and an inbox, shared by hosts and switches.
//!
//! Node state is plain data kept in the [`crate::simulation::Simulation`] arena and
//! addressed by [`NodeId`], rather than a graph of `Rc<RefCell<_>>` nodes — this keeps
//! the mutable state scoped to one place and trivially `Send`-free-to-reason-about.

use std::collections::VecDeque;

use crate::message::MessageId;

/// Index into the `Simulation`'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Inbox shared by every node kind. `post` and `handle` are implemented against the
/// `Simulation` in `simulation.rs`, since dispatching a `Handle` action also needs to
/// decide which on-message behavior (host or switch) to invoke.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    queue: VecDeque<MessageId>,
}

impl Inbox {
    pub fn push(&mut self, message: MessageId) {
        self.queue.push_back(message);
    }

    pub fn pop(&mut self) -> Option<MessageId> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_is_fifo() {
        let mut inbox = Inbox::default();
        inbox.push(MessageId(1));
        inbox.push(MessageId(2));
        assert_eq!(inbox.pop(), Some(MessageId(1)));
        assert_eq!(inbox.pop(), Some(MessageId(2)));
        assert_eq!(inbox.pop(), None);
    }
}
