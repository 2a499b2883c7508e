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
//! Dual console/file logging, configured programmatically instead of requiring an
//! external `log4rs.yml` next to the binary.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

use crate::error::{Result, SimError};

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const LOG_ROLLOVER_COUNT: u32 = 3;

/// `console_level` governs the threshold for the console appender (`INFO` by
/// default, `DEBUG` under `-verbose`); the file appender always records at `DEBUG`
/// into `simulation.log`, rolling over to `simulation.log.{1..3}` once it passes
/// `MAX_LOG_BYTES` so a long multi-experiment run doesn't grow one file without bound.
pub fn init(log_dir: &std::path::Path, console_level: LevelFilter) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let roller = FixedWindowRoller::builder()
        .build(
            &log_dir.join("simulation.log.{}.gz").to_string_lossy(),
            LOG_ROLLOVER_COUNT,
        )
        .map_err(|e| SimError::InvalidState(format!("failed to build log roller: {e}")))?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(MAX_LOG_BYTES)), Box::new(roller));
    let file = RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(log_dir.join("simulation.log"), Box::new(policy))?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(console_level)))
                .build("console", Box::new(console)),
        )
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(LevelFilter::Debug),
        )
        .map_err(|e| SimError::InvalidState(format!("failed to build logging config: {e}")))?;

    log4rs::init_config(config)
        .map_err(|e| SimError::InvalidState(format!("failed to initialize logging: {e}")))?;
    Ok(())
}
