/*
 *  gpio.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Input lines for the buttons and rotary encoder
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

use crate::config::{InputConfig, PinConfig};
use crate::display::error::DisplayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLine {
    Prev,
    PlayPause,
    Next,
    Mode,
    EncoderA,
    EncoderB,
}

impl InputLine {
    pub const ALL: [InputLine; 6] = [
        InputLine::Prev,
        InputLine::PlayPause,
        InputLine::Next,
        InputLine::Mode,
        InputLine::EncoderA,
        InputLine::EncoderB,
    ];

    /// BCM pin for this line
    pub fn pin(&self, pins: &PinConfig) -> u8 {
        match self {
            InputLine::Prev => pins.prev,
            InputLine::PlayPause => pins.play_pause,
            InputLine::Next => pins.next,
            InputLine::Mode => pins.mode,
            InputLine::EncoderA => pins.encoder_a,
            InputLine::EncoderB => pins.encoder_b,
        }
    }

    fn index(&self) -> usize {
        match self {
            InputLine::Prev => 0,
            InputLine::PlayPause => 1,
            InputLine::Next => 2,
            InputLine::Mode => 3,
            InputLine::EncoderA => 4,
            InputLine::EncoderB => 5,
        }
    }
}

/// Polled digital inputs. `true` is a high level; buttons pull up, so a
/// pressed button reads `false`.
pub trait InputLines: Send {
    fn read(&mut self, line: InputLine) -> bool;
}

#[cfg(feature = "rpi")]
pub struct RpiLines {
    pins: Vec<rppal::gpio::InputPin>,
}

#[cfg(feature = "rpi")]
impl RpiLines {
    pub fn open(pins: &PinConfig) -> Result<Self, DisplayError> {
        let gpio = rppal::gpio::Gpio::new()?;
        let mut inputs = Vec::with_capacity(InputLine::ALL.len());
        for line in InputLine::ALL {
            let pin = line.pin(pins);
            let input = gpio
                .get(pin)
                .map_err(|e| DisplayError::GpioError(format!("BCM {} ({:?}): {}", pin, line, e)))?
                .into_input_pullup();
            inputs.push(input);
        }
        log::info!("GPIO inputs on BCM {:?}", pins.all());
        Ok(RpiLines { pins: inputs })
    }
}

#[cfg(feature = "rpi")]
impl InputLines for RpiLines {
    fn read(&mut self, line: InputLine) -> bool {
        self.pins[line.index()].is_high()
    }
}

/// Open the configured input lines. Failure here is fatal at startup.
pub fn open(cfg: &InputConfig) -> Result<Box<dyn InputLines>, DisplayError> {
    #[cfg(feature = "rpi")]
    {
        Ok(Box::new(RpiLines::open(&cfg.pins)?))
    }
    #[cfg(not(feature = "rpi"))]
    {
        Err(DisplayError::GpioError(format!(
            "built without the `rpi` feature, cannot open BCM {:?} (use --no-input)",
            cfg.pins.all()
        )))
    }
}

/// Fixed levels set by the caller, for tests and bench setups.
#[derive(Debug, Clone)]
pub struct StaticLines {
    levels: [bool; 6],
}

impl Default for StaticLines {
    fn default() -> Self {
        // everything released
        StaticLines { levels: [true; 6] }
    }
}

impl StaticLines {
    pub fn set(&mut self, line: InputLine, level: bool) {
        self.levels[line.index()] = level;
    }
}

impl InputLines for StaticLines {
    fn read(&mut self, line: InputLine) -> bool {
        self.levels[line.index()]
    }
}
