/*
 *  controls.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button and encoder sampling, turned into commands and mode toggles
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

use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::command::{self, Command, CommandPayload};
use crate::debounce::{Debouncer, Quadrature, Rotation};
use crate::display::mode_controller::ModeSwitch;
use crate::gpio::{InputLine, InputLines};
use crate::remote::RemoteSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Command(Command),
    ToggleMode,
}

/// Debounce state for every control on the panel.
#[derive(Debug, Clone)]
pub struct Controls {
    prev: Debouncer,
    play_pause: Debouncer,
    next: Debouncer,
    mode: Debouncer,
    encoder: Quadrature,
}

impl Controls {
    pub fn new(debounce: Duration, now: Instant) -> Self {
        Controls {
            prev: Debouncer::new(debounce, now),
            play_pause: Debouncer::new(debounce, now),
            next: Debouncer::new(debounce, now),
            mode: Debouncer::new(debounce, now),
            encoder: Quadrature::new(),
        }
    }

    /// Read every line once and report what happened since the last sample.
    pub fn sample<L: InputLines + ?Sized>(&mut self, lines: &mut L, now: Instant) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        let a = lines.read(InputLine::EncoderA);
        let b = lines.read(InputLine::EncoderB);
        match self.encoder.sample(a, b) {
            Some(Rotation::Clockwise) => events.push(ControlEvent::Command(Command::new(CommandPayload::VolUp))),
            Some(Rotation::CounterClockwise) => events.push(ControlEvent::Command(Command::new(CommandPayload::VolDown))),
            None => {}
        }

        let buttons = [
            (&mut self.prev, InputLine::Prev, CommandPayload::Prev),
            (&mut self.play_pause, InputLine::PlayPause, CommandPayload::PlayPause),
            (&mut self.next, InputLine::Next, CommandPayload::Next),
        ];
        for (debouncer, line, payload) in buttons {
            if debouncer.sample(lines.read(line), now) {
                events.push(ControlEvent::Command(Command::new(payload)));
            }
        }

        if self.mode.sample(lines.read(InputLine::Mode), now) {
            events.push(ControlEvent::ToggleMode);
        }
        events
    }
}

/// Sample the inputs every `sample_interval` until `shutdown` fires.
/// Commands go out on their own tasks so a slow remote never stalls sampling.
pub async fn run_input_loop<S>(
    mut lines: Box<dyn InputLines>,
    source: Arc<S>,
    mode: ModeSwitch,
    sample_interval: Duration,
    debounce: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: RemoteSource + 'static,
{
    info!("Input sampling every {}ms, debounce {}ms", sample_interval.as_millis(), debounce.as_millis());
    let mut controls = Controls::new(debounce, Instant::now());
    let mut ticker = tokio::time::interval(sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for event in controls.sample(lines.as_mut(), Instant::now()) {
                    match event {
                        ControlEvent::Command(cmd) => { command::dispatch(&source, cmd); }
                        ControlEvent::ToggleMode => { mode.toggle(); }
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("Input loop received stop signal. Exiting.");
                break;
            }
        }
    }
}
