/*
 *  telemetry.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Telemetry readings for the stats view
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

use log::debug;
use std::time::{Duration, Instant};

use crate::config::TelemetrySource;
use crate::extract::extract_or;
use crate::metrics::{MachineMetrics, MetricsReader};
use crate::remote::RemoteSource;

pub const NOT_AVAILABLE: &str = "n/a";

/// Display-ready values; anything unknown reads `n/a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryReadings {
    pub cpu: String,
    pub gpu: String,
    pub temp_cpu: String,
    pub temp_gpu: String,
}

impl Default for TelemetryReadings {
    fn default() -> Self {
        TelemetryReadings {
            cpu: NOT_AVAILABLE.to_string(),
            gpu: NOT_AVAILABLE.to_string(),
            temp_cpu: NOT_AVAILABLE.to_string(),
            temp_gpu: NOT_AVAILABLE.to_string(),
        }
    }
}

impl TelemetryReadings {
    pub fn from_blob(blob: &str) -> Self {
        TelemetryReadings {
            cpu: extract_or(blob, "cpu", NOT_AVAILABLE),
            gpu: extract_or(blob, "gpu", NOT_AVAILABLE),
            temp_cpu: extract_or(blob, "temp_cpu", NOT_AVAILABLE),
            temp_gpu: extract_or(blob, "temp_gpu", NOT_AVAILABLE),
        }
    }

    pub fn from_metrics(metrics: &MachineMetrics) -> Self {
        let fmt = |v: Option<f64>| v.map(|v| format!("{:.0}", v)).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        TelemetryReadings {
            cpu: fmt(metrics.cpu_load),
            temp_cpu: fmt(metrics.cpu_temp),
            ..TelemetryReadings::default()
        }
    }

    /// Label/value rows in display order.
    pub fn rows(&self) -> [(&'static str, &str); 4] {
        [
            ("CPU", self.cpu.as_str()),
            ("GPU", self.gpu.as_str()),
            ("Temp CPU (°C)", self.temp_cpu.as_str()),
            ("Temp GPU (°C)", self.temp_gpu.as_str()),
        ]
    }
}

/// Caches the last readings and refreshes them when they go stale.
#[derive(Debug)]
pub struct TelemetryFeed {
    source: TelemetrySource,
    refresh: Duration,
    local: MetricsReader,
    readings: TelemetryReadings,
    fetched_at: Option<Instant>,
}

impl TelemetryFeed {
    pub fn new(source: TelemetrySource, refresh: Duration) -> Self {
        TelemetryFeed {
            source,
            refresh,
            local: MetricsReader::default(),
            readings: TelemetryReadings::default(),
            fetched_at: None,
        }
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) => now.saturating_duration_since(at) >= self.refresh,
            None => true,
        }
    }

    /// Current readings, fetched inline if stale. A failed remote fetch
    /// shows every field as `n/a` until the next attempt.
    pub async fn readings<S: RemoteSource>(&mut self, remote: &S, now: Instant) -> &TelemetryReadings {
        if self.is_stale(now) {
            self.readings = match self.source {
                TelemetrySource::Remote => match remote.fetch_telemetry().await {
                    Ok(blob) => TelemetryReadings::from_blob(&blob),
                    Err(e) => {
                        debug!("Telemetry fetch failed: {}", e);
                        TelemetryReadings::default()
                    }
                },
                TelemetrySource::Local => TelemetryReadings::from_metrics(&self.local.check()),
            };
            self.fetched_at = Some(now);
        }
        &self.readings
    }

    /// Forget the cache so the next view entry fetches fresh values.
    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }
}
