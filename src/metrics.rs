/*
 *  metrics.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Local machine metrics from /proc and /sys
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */
//! Gathering the few system metrics the telemetry view can show without a
//! remote service.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LOADAVG: &str = "/proc/loadavg";
const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// One sample; `None` where the source file is missing or unreadable.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MachineMetrics {
    /// 1-minute load average as a percentage of one core
    pub cpu_load: Option<f64>,
    /// degrees Celsius
    pub cpu_temp: Option<f64>,
}

/// Where to read from, overridable so tests can point at fixtures.
#[derive(Debug, Clone)]
pub struct MetricsReader {
    loadavg: PathBuf,
    thermal: PathBuf,
}

impl Default for MetricsReader {
    fn default() -> Self {
        MetricsReader { loadavg: PathBuf::from(LOADAVG), thermal: PathBuf::from(THERMAL_ZONE) }
    }
}

impl MetricsReader {
    pub fn with_paths(loadavg: impl Into<PathBuf>, thermal: impl Into<PathBuf>) -> Self {
        MetricsReader { loadavg: loadavg.into(), thermal: thermal.into() }
    }

    /// Reads the first whitespace separated float from a file.
    fn read_first_float(path: &Path) -> io::Result<f64> {
        let content = fs::read_to_string(path)?;
        let first_word = content.split_whitespace().next().unwrap_or("");
        first_word.parse::<f64>().map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn cpu_load(&self) -> Option<f64> {
        Self::read_first_float(&self.loadavg).ok().map(|load| 100.0 * load)
    }

    fn cpu_temp(&self) -> Option<f64> {
        // millidegrees Celsius
        Self::read_first_float(&self.thermal).ok().map(|milli| milli / 1000.0)
    }

    pub fn check(&self) -> MachineMetrics {
        MachineMetrics {
            cpu_load: self.cpu_load(),
            cpu_temp: self.cpu_temp(),
        }
    }
}
