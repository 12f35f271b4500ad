/*
 *  display/mode_controller.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  View mode switch - playback or telemetry, flipped by the mode button
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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Playback,
    Telemetry,
}

impl ViewMode {
    fn from_flag(telemetry: bool) -> Self {
        if telemetry { ViewMode::Telemetry } else { ViewMode::Playback }
    }
}

/// Shared single-bit view mode. Independent of the panel state lock, the
/// input task writes it and the render loop reads it once per frame.
#[derive(Debug, Clone, Default)]
pub struct ModeSwitch {
    telemetry: Arc<AtomicBool>,
}

impl ModeSwitch {
    /// Always starts on the playback view
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ViewMode {
        ViewMode::from_flag(self.telemetry.load(Ordering::Acquire))
    }

    /// Flip the view, returning the new mode
    pub fn toggle(&self) -> ViewMode {
        let was = ViewMode::from_flag(self.telemetry.fetch_xor(true, Ordering::AcqRel));
        let now = ViewMode::from_flag(was == ViewMode::Playback);
        log::info!("Display mode changed: {:?} -> {:?}", was, now);
        now
    }

    pub fn set(&self, mode: ViewMode) {
        self.telemetry.store(mode == ViewMode::Telemetry, Ordering::Release);
    }
}
