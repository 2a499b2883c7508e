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
//! Messages and the five-tuple flow key they carry.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ip::IpAddress;
use crate::node::NodeId;

/// Index into the [`crate::scheduler::Scheduler`]'s message ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Control,
}

/// Flow key used to pick a stable ECMP path. The hash must be deterministic across
/// runs and processes, so it is taken with [`DefaultHasher`] rather than a
/// randomized-keyed `HashMap` hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub src_ip: IpAddress,
    pub dst_ip: IpAddress,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: Protocol,
}

impl FiveTuple {
    /// Deterministic hash of this flow key, stable across processes and runs.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

pub const DEFAULT_TTL: f64 = 2000.0;

#[derive(Debug, Clone)]
pub struct Message {
    pub id: MessageId,
    pub five_tuple: FiveTuple,
    pub size_bytes: u64,
    pub birth_time: f64,
    pub content: Vec<u8>,
    pub ttl: f64,
    pub path_length: u32,
    pub verbose_path: Option<Vec<NodeId>>,
    pub delivered: bool,
    pub dropped: bool,
    pub lost: bool,
    pub arrival_time: Option<f64>,
}

impl Message {
    pub fn new(
        id: MessageId,
        five_tuple: FiveTuple,
        size_bytes: u64,
        birth_time: f64,
        content: Vec<u8>,
        ttl: f64,
        verbose: bool,
    ) -> Self {
        Message {
            id,
            five_tuple,
            size_bytes,
            birth_time,
            content,
            ttl,
            path_length: 0,
            verbose_path: verbose.then(Vec::new),
            delivered: false,
            dropped: false,
            lost: false,
            arrival_time: None,
        }
    }

    /// A message is expired once its time-to-live or hop budget is exhausted.
    pub fn is_expired(&self, now: f64, max_path: u32) -> bool {
        (now - self.birth_time) > self.ttl || self.path_length > max_path
    }

    pub fn touch(&mut self, node: NodeId) {
        self.path_length += 1;
        if let Some(path) = self.verbose_path.as_mut() {
            path.push(node);
        }
    }

    /// `delivered` and `dropped` are mutually exclusive terminal outcomes; a message
    /// that is both is a forwarding-logic bug, not a state a caller should see.
    pub fn assert_invariant(&self) {
        debug_assert!(
            !(self.delivered && self.dropped),
            "message {:?} is marked both delivered and dropped",
            self.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple() -> FiveTuple {
        FiveTuple {
            src_ip: "10.0.0.1".parse().unwrap(),
            dst_ip: "10.0.0.2".parse().unwrap(),
            src_port: 0,
            dst_port: 0,
            protocol: Protocol::Tcp,
        }
    }

    #[test]
    fn stable_hash_is_deterministic() {
        let t = tuple();
        assert_eq!(t.stable_hash(), t.stable_hash());
    }

    #[test]
    fn expiry_by_ttl() {
        let m = Message::new(MessageId(0), tuple(), 100, 0.0, vec![], 10.0, false);
        assert!(!m.is_expired(5.0, 64));
        assert!(m.is_expired(10.1, 64));
    }

    #[test]
    fn expiry_by_path_length() {
        let mut m = Message::new(MessageId(0), tuple(), 100, 0.0, vec![], 2000.0, false);
        m.path_length = 65;
        assert!(m.is_expired(0.0, 64));
    }
}
