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
//! Library for simulating packet-level IP forwarding over a switched fabric under
//! discrete-event time, including link serialization, ECMP/LPM routing, loop recovery
//! and link-failure injection.

pub mod error;
pub mod event;
pub mod host;
pub mod ip;
pub mod link;
pub mod logging;
pub mod message;
pub mod network_node;
pub mod node;
pub mod scheduler;
pub mod simulation;
pub mod stats;
pub mod switch;
pub mod topology;
pub mod traffic;
pub mod visualize;

pub mod prelude {
    pub use super::{
        error::{Result, SimError},
        event::Action,
        ip::{IpAddress, IpPrefix},
        message::{Message, MessageId, Protocol},
        scheduler::Scheduler,
        simulation::Simulation,
    };
}
