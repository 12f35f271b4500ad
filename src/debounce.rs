/*
 *  debounce.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button debouncing and rotary encoder decoding
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

use std::time::{Duration, Instant};

/// Edge-triggered debounce for one active-low button.
///
/// A press is reported once the line has read low continuously for the
/// window, and not again until it has been released.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_level: bool,
    stable_since: Instant,
    latched: bool,
}

impl Debouncer {
    /// Starts released (high) as of `now`.
    pub fn new(window: Duration, now: Instant) -> Self {
        Debouncer { window, last_level: true, stable_since: now, latched: false }
    }

    /// Feed one sample; returns true exactly once per qualified press.
    pub fn sample(&mut self, level: bool, now: Instant) -> bool {
        if level != self.last_level {
            self.last_level = level;
            self.stable_since = now;
        }

        if level {
            self.latched = false;
            return false;
        }

        if !self.latched && now.saturating_duration_since(self.stable_since) >= self.window {
            self.latched = true;
            return true;
        }
        false
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Two-phase encoder decoder: a change on A with B different is one step
/// clockwise, with B equal one step counter-clockwise.
#[derive(Debug, Clone, Default)]
pub struct Quadrature {
    last_a: Option<bool>,
}

impl Quadrature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, a: bool, b: bool) -> Option<Rotation> {
        let last = self.last_a.replace(a)?;
        if a == last {
            return None;
        }
        if a != b { Some(Rotation::Clockwise) } else { Some(Rotation::CounterClockwise) }
    }
}
