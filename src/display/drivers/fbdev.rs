/*
 *  display/drivers/fbdev.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux framebuffer surface (/dev/fbN) over a shared memory mapping
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
use memmap2::{MmapMut, MmapOptions};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplaySurface, PixelFormat};
use crate::vframebuf::Canvas;

/// Screen geometry as the kernel reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbGeometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    pub line_length: usize,
}

impl FbGeometry {
    /// Read from `/sys/class/graphics/<fbN>/` for the given device node.
    pub fn from_sysfs(device: &Path) -> Result<Self, DisplayError> {
        let name = device
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DisplayError::InvalidConfiguration(format!("not a framebuffer device: {}", device.display())))?;
        let sysfs = PathBuf::from("/sys/class/graphics").join(name);

        let read = |attr: &str| -> Result<String, DisplayError> {
            fs::read_to_string(sysfs.join(attr)).map_err(|e| {
                DisplayError::InitializationFailed(format!("{}/{}: {}", sysfs.display(), attr, e))
            })
        };

        let (virtual_w, virtual_h) = parse_virtual_size(&read("virtual_size")?)
            .ok_or_else(|| DisplayError::InitializationFailed(format!("{}: bad virtual_size", name)))?;
        // double buffered drivers report a virtual area taller than the screen
        let (width, height) = read("modes")
            .ok()
            .and_then(|modes| parse_mode(&modes))
            .filter(|&(w, h)| w <= virtual_w && h <= virtual_h)
            .unwrap_or((virtual_w, virtual_h));
        if (width, height) != (virtual_w, virtual_h) {
            debug!("{}: visible {}x{} inside virtual {}x{}", name, width, height, virtual_w, virtual_h);
        }
        let bits_per_pixel = read("bits_per_pixel")?
            .trim()
            .parse::<u32>()
            .map_err(|e| DisplayError::InitializationFailed(format!("{}: bad bits_per_pixel: {}", name, e)))?;
        // older kernels lack `stride`, assume packed rows
        let line_length = read("stride")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(width as usize * (bits_per_pixel as usize / 8));

        Ok(FbGeometry { width, height, bits_per_pixel, line_length })
    }

    pub fn map_len(&self) -> usize {
        self.line_length * self.height as usize
    }
}

/// `"800,480"` as written by the kernel
pub fn parse_virtual_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(',')?;
    let (w, h) = (w.trim().parse().ok()?, h.trim().parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

/// First entry of the sysfs `modes` list, e.g. `"U:800x480p-0"`.
pub fn parse_mode(s: &str) -> Option<(u32, u32)> {
    let line = s.lines().next()?.trim();
    let spec = line.split_once(':').map_or(line, |(_, rest)| rest);
    let (w, rest) = spec.split_once('x')?;
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (w, h) = (w.parse().ok()?, rest[..digits].parse().ok()?);
    (w > 0 && h > 0).then_some((w, h))
}

pub struct FbdevSurface {
    device: PathBuf,
    map: MmapMut,
    back: Vec<u8>,
    capabilities: DisplayCapabilities,
}

impl FbdevSurface {
    /// Open a framebuffer device using the geometry sysfs reports for it.
    pub fn open(device: impl AsRef<Path>) -> Result<Self, DisplayError> {
        let device = device.as_ref();
        let geometry = FbGeometry::from_sysfs(device)?;
        Self::open_with_geometry(device, geometry)
    }

    /// Map `path` with an explicit geometry; any file of at least
    /// `geometry.map_len()` bytes will do.
    pub fn open_with_geometry(path: impl AsRef<Path>, geometry: FbGeometry) -> Result<Self, DisplayError> {
        let path = path.as_ref();
        let pixel_format = PixelFormat::from_bits_per_pixel(geometry.bits_per_pixel)?;
        let min_line = geometry.width as usize * pixel_format.bytes_per_pixel();
        if geometry.line_length < min_line {
            return Err(DisplayError::BufferSizeMismatch { expected: min_line, actual: geometry.line_length });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| DisplayError::InitializationFailed(format!("{}: {}", path.display(), e)))?;
        // the kernel owns the framebuffer memory, nothing else in this process aliases it
        let map = unsafe { MmapOptions::new().len(geometry.map_len()).map_mut(&file)? };

        info!(
            "Framebuffer {} {}x{} {}bpp stride {}",
            path.display(),
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel,
            geometry.line_length
        );

        Ok(FbdevSurface {
            device: path.to_path_buf(),
            back: vec![0u8; geometry.map_len()],
            map,
            capabilities: DisplayCapabilities {
                width: geometry.width,
                height: geometry.height,
                pixel_format,
                line_length: geometry.line_length,
                max_fps: 60,
            },
        })
    }

    fn unblank(&self) {
        let Some(name) = self.device.file_name() else { return };
        let blank = PathBuf::from("/sys/class/graphics").join(name).join("blank");
        if let Err(e) = fs::write(&blank, "0") {
            debug!("Could not unblank {}: {}", blank.display(), e);
        }
    }
}

impl DisplaySurface for FbdevSurface {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.unblank();
        self.clear()
    }

    fn present(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        let caps = &self.capabilities;
        let bpp = caps.pixel_format.bytes_per_pixel();
        let cols = frame.width().min(caps.width as usize);
        let rows = frame.height().min(caps.height as usize);

        for y in 0..rows {
            let line = &mut self.back[y * caps.line_length..y * caps.line_length + cols * bpp];
            for (px, out) in frame.row(y)[..cols].iter().zip(line.chunks_exact_mut(bpp)) {
                caps.pixel_format.encode(*px, out);
            }
        }
        // one copy into the mapping keeps partially drawn frames off screen
        self.map.copy_from_slice(&self.back);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.back.fill(0);
        self.map.fill(0);
        Ok(())
    }
}
