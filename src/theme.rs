/*
 *  theme.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Artwork derived colour theme and the background crossfade
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
use image::imageops::FilterType;
use image::DynamicImage;
use log::{info, warn};
use std::mem;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::SharedState;
use crate::vframebuf::Canvas;

/// Background used before any artwork arrives and whenever artwork is unreadable.
pub const NEUTRAL_BACKGROUND: Rgb888 = Rgb888::new(18, 18, 18);

/// Edge of the thumbnail the representative colour is averaged from.
pub const SAMPLE_EDGE: u32 = 32;

/// Luminance threshold (0..=255 scale) in thousandths, below it text is light.
const LIGHT_TEXT_BELOW: u32 = 128_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTone {
    Light,
    Dark,
}

impl TextTone {
    /// Pick a readable tone over `background` using Rec.601 luma weights.
    pub fn for_background(background: Rgb888) -> Self {
        let luma = 299 * background.r() as u32 + 587 * background.g() as u32 + 114 * background.b() as u32;
        if luma < LIGHT_TEXT_BELOW { TextTone::Light } else { TextTone::Dark }
    }

    pub fn primary(&self) -> Rgb888 {
        match self {
            TextTone::Light => Rgb888::WHITE,
            TextTone::Dark => Rgb888::new(16, 16, 16),
        }
    }

    pub fn secondary(&self) -> Rgb888 {
        match self {
            TextTone::Light => Rgb888::new(200, 200, 200),
            TextTone::Dark => Rgb888::new(56, 56, 56),
        }
    }
}

/// Two background slots and the timing of the blend between them.
///
/// `start` never queues: a fade started while another is running replaces
/// whatever sat in the previous slot with the layer that was current.
#[derive(Debug, Clone)]
pub struct Crossfade {
    current: Arc<Canvas>,
    previous: Option<Arc<Canvas>>,
    started_at: Instant,
    duration: Duration,
}

impl Crossfade {
    pub fn new(initial: Arc<Canvas>, duration: Duration) -> Self {
        Crossfade {
            current: initial,
            previous: None,
            started_at: Instant::now(),
            duration,
        }
    }

    pub fn start(&mut self, next: Arc<Canvas>, now: Instant) {
        let outgoing = mem::replace(&mut self.current, next);
        self.previous = Some(outgoing);
        self.started_at = now;
    }

    /// Opacity of the current layer over the previous one, or `None` when
    /// no fade is in flight.
    pub fn opacity(&self, now: Instant) -> Option<f32> {
        self.previous.as_ref()?;
        if self.duration.is_zero() {
            return Some(1.0);
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        Some((elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0))
    }

    /// Drop the previous layer once the fade has run its course.
    pub fn settle(&mut self, now: Instant) {
        if matches!(self.opacity(now), Some(o) if o >= 1.0) {
            self.previous = None;
        }
    }

    pub fn current(&self) -> &Arc<Canvas> {
        &self.current
    }

    pub fn previous(&self) -> Option<&Arc<Canvas>> {
        self.previous.as_ref()
    }
}

/// Everything drawn from the artwork: the bitmap itself, the background
/// layers and the text tone.
#[derive(Debug, Clone)]
pub struct ThemeState {
    pub artwork: Option<Arc<Canvas>>,
    pub background: Crossfade,
    pub text_tone: TextTone,
}

impl ThemeState {
    pub fn new(width: u32, height: u32, fade: Duration) -> Self {
        ThemeState {
            artwork: None,
            background: Crossfade::new(Arc::new(Canvas::new(width, height, NEUTRAL_BACKGROUND)), fade),
            text_tone: TextTone::Light,
        }
    }

    /// Swap in a freshly built theme and start the background fade.
    pub fn install(&mut self, update: ThemeUpdate, now: Instant) {
        match update {
            ThemeUpdate::Artwork { artwork, background, tone, .. } => {
                self.artwork = Some(artwork);
                self.background.start(background, now);
                self.text_tone = tone;
            }
            ThemeUpdate::Fallback { background } => {
                self.background.start(background, now);
                self.text_tone = TextTone::Light;
            }
        }
    }
}

/// Result of processing one artwork download, ready to install.
#[derive(Debug, Clone)]
pub enum ThemeUpdate {
    Artwork {
        artwork: Arc<Canvas>,
        background: Arc<Canvas>,
        tone: TextTone,
        color: Rgb888,
    },
    /// Artwork could not be decoded; the artwork slot is left alone.
    Fallback { background: Arc<Canvas> },
}

/// Turns artwork bytes into theme updates sized for the panel canvas.
#[derive(Debug, Clone, Copy)]
pub struct ThemeEngine {
    canvas_width: u32,
    canvas_height: u32,
    artwork_size: u32,
}

impl ThemeEngine {
    pub fn new(canvas_width: u32, canvas_height: u32, artwork_size: u32) -> Self {
        ThemeEngine { canvas_width, canvas_height, artwork_size }
    }

    /// Decode and derive everything. CPU bound, call from the blocking pool.
    pub fn build(&self, bytes: &[u8]) -> ThemeUpdate {
        let img = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                warn!("Artwork decode failed ({} bytes): {}", bytes.len(), e);
                return ThemeUpdate::Fallback {
                    background: Arc::new(Canvas::new(self.canvas_width, self.canvas_height, NEUTRAL_BACKGROUND)),
                };
            }
        };

        let color = representative_color(&img);
        let tone = TextTone::for_background(color);
        let background = Canvas::vertical_gradient(self.canvas_width, self.canvas_height, color, Rgb888::BLACK);

        ThemeUpdate::Artwork {
            artwork: Arc::new(artwork_canvas(&img, self.artwork_size)),
            background: Arc::new(background),
            tone,
            color,
        }
    }

    /// Build from `bytes` and install the result into `state`.
    pub fn apply(&self, bytes: &[u8], state: &SharedState) {
        let update = self.build(bytes);
        if let ThemeUpdate::Artwork { color, tone, .. } = &update {
            info!("Theme colour rgb({}, {}, {}) with {:?} text", color.r(), color.g(), color.b(), tone);
        }
        state.install_theme(update);
    }
}

/// Average colour of a `SAMPLE_EDGE` square nearest-neighbour thumbnail.
pub fn representative_color(img: &DynamicImage) -> Rgb888 {
    let thumb = img.resize_exact(SAMPLE_EDGE, SAMPLE_EDGE, FilterType::Nearest).to_rgb8();
    let count = (SAMPLE_EDGE * SAMPLE_EDGE) as u64;
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for px in thumb.pixels() {
        r += px[0] as u64;
        g += px[1] as u64;
        b += px[2] as u64;
    }
    Rgb888::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
}

/// Square RGB bitmap at `size`, stretched if the source is not square.
fn artwork_canvas(img: &DynamicImage, size: u32) -> Canvas {
    let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let pixels = rgb.pixels().map(|p| Rgb888::new(p[0], p[1], p[2])).collect();
    Canvas::from_pixels(size, size, pixels)
        .unwrap_or_else(|| Canvas::new(size, size, NEUTRAL_BACKGROUND))
}
