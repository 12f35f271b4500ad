/*
 *  display/render.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame composition and the fixed rate render loop
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

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle, Triangle},
};
use embedded_text::alignment::HorizontalAlignment;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::display::error::DisplayError;
use crate::display::mode_controller::{ModeSwitch, ViewMode};
use crate::display::text::{self, TextStyle};
use crate::display::traits::DisplaySurface;
use crate::pacer::FramePacer;
use crate::remote::RemoteSource;
use crate::state::{FrameSnapshot, SharedState};
use crate::telemetry::{TelemetryFeed, TelemetryReadings};
use crate::vframebuf::Canvas;

pub const BAR_BACKGROUND: Rgb888 = Rgb888::new(30, 30, 30);
pub const BAR_FILL: Rgb888 = Rgb888::new(30, 215, 96);
pub const TELEMETRY_BACKGROUND: Rgb888 = Rgb888::new(20, 20, 25);
const TELEMETRY_VALUE: Rgb888 = Rgb888::new(200, 200, 200);
const ARTWORK_PLACEHOLDER: Rgb888 = Rgb888::new(40, 40, 40);

const SIDE_MARGIN: i32 = 60;

/// Where everything sits on the playback view, derived from canvas and artwork size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackLayout {
    pub header_y: i32,
    pub artwork: Rectangle,
    pub title_y: i32,
    pub artist_y: i32,
    pub bar: Rectangle,
    pub times_y: i32,
    pub icons_center: Point,
}

impl PlaybackLayout {
    pub fn new(width: u32, artwork_size: u32) -> Self {
        let art_top = 60;
        let art_left = (width.saturating_sub(artwork_size) / 2) as i32;
        let title_y = art_top + artwork_size as i32 + 20;
        let artist_y = title_y + 40;
        let bar_y = artist_y + 50;
        let bar_width = width.saturating_sub(2 * SIDE_MARGIN as u32);
        let times_y = bar_y + 18;
        PlaybackLayout {
            header_y: 20,
            artwork: Rectangle::new(Point::new(art_left, art_top), Size::new(artwork_size, artwork_size)),
            title_y,
            artist_y,
            bar: Rectangle::new(Point::new(SIDE_MARGIN, bar_y), Size::new(bar_width, 10)),
            times_y,
            icons_center: Point::new(width as i32 / 2, times_y + 70),
        }
    }
}

fn fill(canvas: &mut Canvas, area: Rectangle, color: Rgb888) {
    let Ok(()) = area.into_styled(PrimitiveStyle::with_fill(color)).draw(canvas);
}

fn fill_triangle(canvas: &mut Canvas, a: Point, b: Point, c: Point, color: Rgb888) {
    let Ok(()) = Triangle::new(a, b, c).into_styled(PrimitiveStyle::with_fill(color)).draw(canvas);
}

/// Filled progress bar, `ratio` clamped to 0..=1.
pub fn draw_progress(canvas: &mut Canvas, bar: Rectangle, ratio: f32) {
    fill(canvas, bar, BAR_BACKGROUND);
    let filled = (bar.size.width as f32 * ratio.clamp(0.0, 1.0)) as u32;
    if filled > 0 {
        fill(canvas, Rectangle::new(bar.top_left, Size::new(filled, bar.size.height)), BAR_FILL);
    }
}

/// prev, play/pause, next around `center`
fn draw_transport(canvas: &mut Canvas, center: Point, is_playing: bool, color: Rgb888) {
    const HALF: i32 = 16;
    const GAP: i32 = 100;

    let prev = center - Point::new(GAP, 0);
    fill(canvas, Rectangle::new(prev + Point::new(-HALF, -HALF), Size::new(4, 2 * HALF as u32)), color);
    fill_triangle(canvas, prev + Point::new(HALF, -HALF), prev + Point::new(HALF, HALF), prev + Point::new(-HALF + 4, 0), color);

    if is_playing {
        fill(canvas, Rectangle::new(center + Point::new(-HALF + 4, -HALF), Size::new(10, 2 * HALF as u32)), color);
        fill(canvas, Rectangle::new(center + Point::new(HALF - 14, -HALF), Size::new(10, 2 * HALF as u32)), color);
    } else {
        fill_triangle(canvas, center + Point::new(-HALF + 4, -HALF), center + Point::new(-HALF + 4, HALF), center + Point::new(HALF, 0), color);
    }

    let next = center + Point::new(GAP, 0);
    fill_triangle(canvas, next + Point::new(-HALF, -HALF), next + Point::new(-HALF, HALF), next + Point::new(HALF - 4, 0), color);
    fill(canvas, Rectangle::new(next + Point::new(HALF - 4, -HALF), Size::new(4, 2 * HALF as u32)), color);
}

/// Background layers, honouring an in-flight crossfade.
fn draw_background(canvas: &mut Canvas, snap: &FrameSnapshot) {
    match (&snap.previous_background, snap.fade_opacity) {
        (Some(previous), Some(opacity)) if opacity < 1.0 => {
            canvas.blit(previous, Point::zero());
            canvas.blend_from(&snap.background, opacity);
        }
        _ => canvas.blit(&snap.background, Point::zero()),
    }
}

/// Compose the playback view from a snapshot.
pub fn compose_playback(canvas: &mut Canvas, snap: &FrameSnapshot, layout: &PlaybackLayout, header: &str) {
    draw_background(canvas, snap);

    let primary = snap.text_tone.primary();
    let secondary = snap.text_tone.secondary();
    let playback = &snap.playback;

    text::draw_centered(canvas, header, TextStyle::Small, primary, layout.header_y);

    match &snap.artwork {
        Some(art) => canvas.blit(art, layout.artwork.top_left),
        None => {
            fill(canvas, layout.artwork, ARTWORK_PLACEHOLDER);
            let mid_y = layout.artwork.center().y - TextStyle::Body.line_height() as i32 / 2;
            text::draw_centered(canvas, "loading…", TextStyle::Body, secondary, mid_y);
        }
    }

    text::draw_centered(canvas, &playback.title, TextStyle::Big, primary, layout.title_y);
    text::draw_centered(canvas, &playback.artist, TextStyle::Body, secondary, layout.artist_y);

    draw_progress(canvas, layout.bar, playback.progress_ratio());

    let bar = layout.bar;
    let half = bar.size.width / 2;
    text::draw_text(canvas, &playback.elapsed_display(), TextStyle::Small, secondary,
        Point::new(bar.top_left.x, layout.times_y), half, HorizontalAlignment::Left);
    text::draw_text(canvas, &playback.duration_display(), TextStyle::Small, secondary,
        Point::new(bar.top_left.x + half as i32, layout.times_y), bar.size.width - half, HorizontalAlignment::Right);

    draw_transport(canvas, layout.icons_center, playback.is_playing, primary);
}

/// Compose the telemetry view: label/value grid and a footer hint.
pub fn compose_telemetry(canvas: &mut Canvas, readings: &TelemetryReadings, footer: &str) {
    canvas.clear_color(TELEMETRY_BACKGROUND);
    let width = canvas.width() as u32;
    let band = width.saturating_sub(2 * SIDE_MARGIN as u32);

    let mut y = 100;
    for (label, value) in readings.rows() {
        text::draw_text(canvas, label, TextStyle::Big, Rgb888::WHITE,
            Point::new(SIDE_MARGIN, y), band, HorizontalAlignment::Left);
        text::draw_text(canvas, value, TextStyle::Big, TELEMETRY_VALUE,
            Point::new(SIDE_MARGIN, y), band, HorizontalAlignment::Right);
        y += 60;
    }

    let footer_y = canvas.height() as i32 - 60;
    text::draw_centered(canvas, footer, TextStyle::Small, TELEMETRY_VALUE, footer_y);
}

/// Applies the mounting rotation and hands frames to the surface.
pub struct Presenter {
    rotate_deg: u16,
    scratch: Canvas,
}

impl Presenter {
    pub fn new(rotate_deg: u16) -> Self {
        Presenter { rotate_deg, scratch: Canvas::new(0, 0, Rgb888::BLACK) }
    }

    pub fn present(&mut self, surface: &mut dyn DisplaySurface, frame: &Canvas) -> Result<(), DisplayError> {
        if self.rotate_deg == 0 {
            return surface.present(frame);
        }
        frame.rotated_into(self.rotate_deg, &mut self.scratch);
        surface.present(&self.scratch)
    }
}

/// Everything the render loop owns.
pub struct RenderLoop<S> {
    surface: Box<dyn DisplaySurface>,
    source: Arc<S>,
    state: SharedState,
    mode: ModeSwitch,
    telemetry: TelemetryFeed,
    presenter: Presenter,
    pacer: FramePacer,
    layout: PlaybackLayout,
    header: String,
    footer: String,
    frame: Canvas,
    last_tick: Instant,
    last_mode: ViewMode,
    present_failures: u64,
}

/// Construction parameters for [`RenderLoop`]
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub artwork_size: u32,
    pub rotate_deg: u16,
    pub fps: u32,
    pub header: String,
}

impl<S: RemoteSource + 'static> RenderLoop<S> {
    pub fn new(
        surface: Box<dyn DisplaySurface>,
        source: Arc<S>,
        state: SharedState,
        mode: ModeSwitch,
        telemetry: TelemetryFeed,
        settings: RenderSettings,
    ) -> Self {
        let footer = format!("B4: back to {}", settings.header);
        let max_fps = surface.capabilities().max_fps;
        let fps = settings.fps.min(max_fps.max(1));
        if fps < settings.fps {
            info!("Frame rate capped at {} fps by the display (asked for {})", fps, settings.fps);
        }
        RenderLoop {
            surface,
            source,
            state,
            mode,
            telemetry,
            presenter: Presenter::new(settings.rotate_deg),
            pacer: FramePacer::new(fps),
            layout: PlaybackLayout::new(settings.width, settings.artwork_size),
            header: settings.header,
            footer,
            frame: Canvas::new(settings.width, settings.height, Rgb888::BLACK),
            last_tick: Instant::now(),
            last_mode: ViewMode::Playback,
            present_failures: 0,
        }
    }

    /// One frame: extrapolate and snapshot under the lock, then draw and
    /// present without it.
    pub async fn tick(&mut self) {
        let now = Instant::now();
        let delta_ms = now.saturating_duration_since(self.last_tick).as_secs_f64() * 1000.0;
        self.last_tick = now;

        let snap = self.state.tick(delta_ms, now);

        let mode = self.mode.current();
        if mode != self.last_mode {
            if mode == ViewMode::Telemetry {
                self.telemetry.invalidate();
            }
            self.last_mode = mode;
        }

        match mode {
            ViewMode::Playback => compose_playback(&mut self.frame, &snap, &self.layout, &self.header),
            ViewMode::Telemetry => {
                let readings = self.telemetry.readings(self.source.as_ref(), now).await;
                compose_telemetry(&mut self.frame, readings, &self.footer);
            }
        }

        match self.presenter.present(self.surface.as_mut(), &self.frame) {
            Ok(()) => {
                if self.present_failures > 0 {
                    info!("Display recovered after {} failed frames", self.present_failures);
                    self.present_failures = 0;
                }
            }
            Err(e) => {
                if self.present_failures == 0 {
                    warn!("Frame present failed: {}", e);
                } else {
                    debug!("Frame present failed: {}", e);
                }
                self.present_failures += 1;
            }
        }
    }

    /// Render at the target rate until `shutdown` fires, then hand the
    /// surface back so the caller can blank it.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Box<dyn DisplaySurface> {
        info!("Render loop at {:.1}ms per frame", self.pacer.frame_budget().as_secs_f32() * 1000.0);
        loop {
            self.tick().await;
            tokio::select! {
                _ = self.pacer.wait() => {}
                _ = shutdown.changed() => {
                    debug!("Render loop received stop signal. Exiting.");
                    break;
                }
            }
        }
        if self.pacer.overruns() > 0 {
            debug!("{} frames overran their budget", self.pacer.overruns());
        }
        self.surface
    }
}
