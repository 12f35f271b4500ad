/*
 *  display/error.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for the local hardware: display surface and GPIO lines
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

use std::error::Error;
use std::fmt;

/// Local resource failures. These are the only errors that stop the panel,
/// and only during startup.
#[derive(Debug)]
pub enum DisplayError {
    /// Display device could not be opened or mapped
    InitializationFailed(String),

    /// GPIO chip or pin error
    GpioError(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Pixel depth the surface cannot encode
    UnsupportedPixelFormat(u32),

    /// Framebuffer size mismatch
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Device I/O
    Io(std::io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::GpioError(msg) =>
                write!(f, "GPIO error: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::UnsupportedPixelFormat(bpp) =>
                write!(f, "Unsupported framebuffer depth: {} bits per pixel", bpp),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} bytes, got {}", expected, actual),
            DisplayError::Io(err) =>
                write!(f, "Display I/O error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

#[cfg(feature = "rpi")]
impl From<rppal::gpio::Error> for DisplayError {
    fn from(err: rppal::gpio::Error) -> Self {
        DisplayError::GpioError(err.to_string())
    }
}
