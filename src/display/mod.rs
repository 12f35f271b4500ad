/*
 *  display/mod.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: surfaces, text, view modes and the render loop
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

// Core trait definitions
pub mod traits;
pub mod error;

// Display drivers
pub mod drivers;

// Text styles and aligned drawing
pub mod text;

// Playback / telemetry view switch
pub mod mode_controller;

// Composition and the paced render loop
pub mod render;

// Re-exports for convenience
pub use traits::{DisplayCapabilities, DisplaySurface, PixelFormat};
pub use error::DisplayError;
pub use drivers::fbdev::FbdevSurface;
pub use mode_controller::{ModeSwitch, ViewMode};
pub use render::{RenderLoop, RenderSettings};
