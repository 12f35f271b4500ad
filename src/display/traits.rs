/*
 *  display/traits.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for the display surface abstraction
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

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::vframebuf::Canvas;

/// Native pixel layout of the surface memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16-bit 5-6-5, little endian (most SPI TFT panels behind fbtft)
    Rgb565,

    /// 32-bit, little endian B G R X byte order (HDMI/DSI framebuffers)
    Xrgb8888,
}

impl PixelFormat {
    pub fn from_bits_per_pixel(bpp: u32) -> Result<Self, DisplayError> {
        match bpp {
            16 => Ok(PixelFormat::Rgb565),
            32 => Ok(PixelFormat::Xrgb8888),
            other => Err(DisplayError::UnsupportedPixelFormat(other)),
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }

    /// Encode one pixel into `out`, which must hold `bytes_per_pixel()` bytes.
    #[inline]
    pub fn encode(&self, color: Rgb888, out: &mut [u8]) {
        match self {
            PixelFormat::Rgb565 => {
                let v = ((color.r() as u16 & 0xF8) << 8)
                    | ((color.g() as u16 & 0xFC) << 3)
                    | (color.b() as u16 >> 3);
                out[..2].copy_from_slice(&v.to_le_bytes());
            }
            PixelFormat::Xrgb8888 => {
                out[0] = color.b();
                out[1] = color.g();
                out[2] = color.r();
                out[3] = 0xFF;
            }
        }
    }
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Native width in pixels (after any mounting rotation)
    pub width: u32,

    /// Native height in pixels
    pub height: u32,

    pub pixel_format: PixelFormat,

    /// Bytes between the start of consecutive rows
    pub line_length: usize,

    /// Maximum recommended frame rate
    pub max_fps: u32,
}

/// Minimal hardware abstraction - everything the render loop needs from a screen
pub trait DisplaySurface: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Prepare the surface for presenting (unblank, clear)
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Show a fully composed frame.
    ///
    /// The frame is already rotated to native orientation. A frame smaller
    /// than the surface is drawn top-left, a larger one is clipped.
    fn present(&mut self, frame: &Canvas) -> Result<(), DisplayError>;

    /// Blank the display
    fn clear(&mut self) -> Result<(), DisplayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_from_depth() {
        assert_eq!(PixelFormat::from_bits_per_pixel(16).unwrap(), PixelFormat::Rgb565);
        assert_eq!(PixelFormat::from_bits_per_pixel(32).unwrap(), PixelFormat::Xrgb8888);
        assert!(PixelFormat::from_bits_per_pixel(24).is_err());
    }

    #[test]
    fn test_encode_rgb565() {
        let mut out = [0u8; 2];
        PixelFormat::Rgb565.encode(Rgb888::WHITE, &mut out);
        assert_eq!(out, [0xFF, 0xFF]);
        PixelFormat::Rgb565.encode(Rgb888::RED, &mut out);
        assert_eq!(u16::from_le_bytes(out), 0xF800);
        PixelFormat::Rgb565.encode(Rgb888::GREEN, &mut out);
        assert_eq!(u16::from_le_bytes(out), 0x07E0);
        PixelFormat::Rgb565.encode(Rgb888::BLUE, &mut out);
        assert_eq!(u16::from_le_bytes(out), 0x001F);
    }

    #[test]
    fn test_encode_xrgb8888() {
        let mut out = [0u8; 4];
        PixelFormat::Xrgb8888.encode(Rgb888::new(1, 2, 3), &mut out);
        assert_eq!(out, [3, 2, 1, 0xFF]);
    }
}
