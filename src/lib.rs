/*
 *  lib.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Now playing panel core: poll a remote media server, theme from the
 *  artwork, render to a Linux framebuffer and drive transport from GPIO
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

pub mod config;
pub mod extract;
pub mod playback;
pub mod vframebuf;
pub mod theme;
pub mod state;
pub mod remote;
pub mod command;
pub mod poller;
pub mod metrics;
pub mod telemetry;
pub mod debounce;
pub mod gpio;
pub mod controls;
pub mod pacer;
pub mod display;
