/*
 *  playback.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Remote playback state, blob decoding and local progress extrapolation
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

use crate::extract::{extract_f64, extract_str};

/// Shown for any text field the remote could not tell us about.
pub const PLACEHOLDER: &str = "—";

/// Lower bound for the track length, keeps the progress ratio finite.
pub const MIN_DURATION_MS: f64 = 1.0;

/// What the panel believes is playing right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub title: String,
    pub artist: String,
    pub is_playing: bool,
    pub progress_ms: f64,
    pub duration_ms: f64,
    pub art_url: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState {
            title: PLACEHOLDER.to_string(),
            artist: PLACEHOLDER.to_string(),
            is_playing: false,
            progress_ms: 0.0,
            duration_ms: MIN_DURATION_MS,
            art_url: None,
        }
    }
}

impl PlaybackState {
    /// Decode a now-playing blob. Never fails: every unreadable field falls
    /// back to its placeholder, and a bad `progress`/`duration` pair resets
    /// both to `0 / 1`.
    pub fn from_blob(blob: &str) -> Self {
        let text_or_placeholder = |key: &str| match extract_str(blob, key) {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => PLACEHOLDER.to_string(),
        };

        let is_playing = extract_str(blob, "is_playing")
            .map(|v| v.contains("true"))
            .unwrap_or(false);

        let (progress_ms, duration_ms) =
            match (extract_f64(blob, "progress"), extract_f64(blob, "duration")) {
                (Some(p), Some(d)) => (p.max(0.0), d.max(MIN_DURATION_MS)),
                _ => (0.0, MIN_DURATION_MS),
            };

        let art_url = extract_str(blob, "art_url")
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        PlaybackState {
            title: text_or_placeholder("title"),
            artist: text_or_placeholder("artist"),
            is_playing,
            progress_ms,
            duration_ms,
            art_url,
        }
    }

    /// Advance local progress by `delta_ms` of wall-clock time.
    ///
    /// Frozen while paused, clamped to the track length while playing. The
    /// next poll overwrites whatever drift accumulates here.
    pub fn advance(&mut self, delta_ms: f64) {
        if !self.is_playing || !delta_ms.is_finite() || delta_ms <= 0.0 {
            return;
        }
        self.progress_ms = (self.progress_ms + delta_ms).min(self.duration_ms);
    }

    /// Fraction of the track played, always within `0.0..=1.0`.
    pub fn progress_ratio(&self) -> f32 {
        let duration = self.duration_ms.max(MIN_DURATION_MS);
        (self.progress_ms / duration).clamp(0.0, 1.0) as f32
    }

    pub fn elapsed_display(&self) -> String {
        fmt_mss(self.progress_ms)
    }

    pub fn duration_display(&self) -> String {
        // a 1ms duration is the "unknown" sentinel
        if self.duration_ms <= MIN_DURATION_MS {
            return fmt_mss(0.0);
        }
        fmt_mss(self.duration_ms)
    }
}

/// Milliseconds as `M:SS`; minutes are not wrapped into hours.
pub fn fmt_mss(ms: f64) -> String {
    let total = if ms.is_finite() && ms > 0.0 { (ms / 1000.0).floor() as u64 } else { 0 };
    format!("{}:{:02}", total / 60, total % 60)
}
