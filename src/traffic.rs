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
//! Random host-to-host traffic generation, driven by the simulation's seeded RNG so
//! a given topology + seed always produces the same traffic pattern.

use rand::Rng;

use crate::error::Result;
use crate::event::Action;
use crate::node::NodeId;
use crate::simulation::Simulation;

const DEFAULT_SIZE_BYTES: u64 = 1000;
const JITTER_WINDOW: (f64, f64) = (0.1, 10.0);

/// Schedule `messages_per_host` sends from every host to a uniformly random other
/// host, each at a random offset within `JITTER_WINDOW`. Each send is an
/// `Action::Originate` event so the actual `Message` is only created (and stamped
/// with the right birth time) once its jittered start time arrives.
pub fn host_calls_random_host(
    sim: &mut Simulation,
    hosts: &[NodeId],
    messages_per_host: u32,
) -> Result<()> {
    if hosts.len() < 2 {
        return Ok(());
    }
    for &src in hosts {
        for _ in 0..messages_per_host {
            let mut dst = src;
            while dst == src {
                dst = hosts[sim.rng.gen_range(0..hosts.len())];
            }
            let dst_ip = sim.host(dst).ip;
            let delay = sim.rng.gen_range(JITTER_WINDOW.0..JITTER_WINDOW.1);
            sim.scheduler.schedule(
                delay,
                Action::Originate {
                    host: src,
                    dst_ip,
                    size_bytes: DEFAULT_SIZE_BYTES,
                },
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology;

    #[test]
    fn every_host_sends_configured_count() {
        let mut sim = Simulation::new(1972);
        let summary = topology::build_simple_star(&mut sim, 4, 0.0).unwrap();
        host_calls_random_host(&mut sim, &summary.hosts, 3).unwrap();
        sim.run(None).unwrap();
        assert_eq!(sim.scheduler.ledger().len(), 4 * 3);
    }
}
