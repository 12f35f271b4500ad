/*
 *  state.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared panel state: one lock around playback and theme
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

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::playback::PlaybackState;
use crate::theme::{TextTone, ThemeState, ThemeUpdate};
use crate::vframebuf::Canvas;

#[derive(Debug, Clone)]
pub struct PanelState {
    pub playback: PlaybackState,
    pub theme: ThemeState,
}

impl PanelState {
    /// Placeholders and the neutral theme at the logical canvas size.
    pub fn new(width: u32, height: u32, fade: Duration) -> Self {
        PanelState {
            playback: PlaybackState::default(),
            theme: ThemeState::new(width, height, fade),
        }
    }
}

/// What one frame needs, copied out so drawing happens without the lock.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub playback: PlaybackState,
    pub artwork: Option<Arc<Canvas>>,
    pub background: Arc<Canvas>,
    pub previous_background: Option<Arc<Canvas>>,
    /// opacity of `background` over `previous_background` while fading
    pub fade_opacity: Option<f32>,
    pub text_tone: TextTone,
}

/// Cloneable handle, one per task. Critical sections are field assignments
/// and `Arc` clones only.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<PanelState>>,
}

impl SharedState {
    pub fn new(panel: PanelState) -> Self {
        SharedState { inner: Arc::new(Mutex::new(panel)) }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        // a panicked holder leaves plain data behind, keep using it
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the whole playback field group at once.
    pub fn apply_playback(&self, playback: PlaybackState) {
        self.lock().playback = playback;
    }

    pub fn install_theme(&self, update: ThemeUpdate) {
        self.lock().theme.install(update, Instant::now());
    }

    /// Render tick: extrapolate progress, retire a finished fade and take the
    /// frame snapshot, all under a single acquisition.
    pub fn tick(&self, delta_ms: f64, now: Instant) -> FrameSnapshot {
        let mut panel = self.lock();
        panel.playback.advance(delta_ms);
        panel.theme.background.settle(now);

        let theme = &panel.theme;
        FrameSnapshot {
            playback: panel.playback.clone(),
            artwork: theme.artwork.clone(),
            background: Arc::clone(theme.background.current()),
            previous_background: theme.background.previous().cloned(),
            fade_opacity: theme.background.opacity(now),
            text_tone: theme.text_tone,
        }
    }

    pub fn playback(&self) -> PlaybackState {
        self.lock().playback.clone()
    }

    pub fn artwork(&self) -> Option<Arc<Canvas>> {
        self.lock().theme.artwork.clone()
    }

    pub fn text_tone(&self) -> TextTone {
        self.lock().theme.text_tone
    }

    pub fn background(&self) -> Arc<Canvas> {
        Arc::clone(self.lock().theme.background.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;

    fn shared() -> SharedState {
        SharedState::new(PanelState::new(8, 8, Duration::from_millis(500)))
    }

    #[test]
    fn test_starts_with_placeholders() {
        let state = shared();
        assert_eq!(state.playback(), PlaybackState::default());
        assert!(state.artwork().is_none());
        assert_eq!(state.text_tone(), TextTone::Light);
    }

    #[test]
    fn test_tick_extrapolates_while_playing() {
        let state = shared();
        state.apply_playback(PlaybackState {
            is_playing: true,
            progress_ms: 1000.0,
            duration_ms: 200_000.0,
            ..PlaybackState::default()
        });
        let now = Instant::now();
        state.tick(33.0, now);
        let snap = state.tick(33.0, now);
        assert_eq!(snap.playback.progress_ms, 1066.0);
        assert!(snap.fade_opacity.is_none());
    }

    #[test]
    fn test_poll_overwrites_extrapolated_progress() {
        let state = shared();
        let polled = PlaybackState {
            is_playing: true,
            progress_ms: 5000.0,
            duration_ms: 200_000.0,
            ..PlaybackState::default()
        };
        state.apply_playback(polled.clone());
        state.tick(1500.0, Instant::now());
        state.apply_playback(polled);
        assert_eq!(state.playback().progress_ms, 5000.0);
    }

    #[test]
    fn test_tick_snapshot_tracks_fade() {
        let state = shared();
        let bg = Arc::new(Canvas::new(8, 8, Rgb888::RED));
        state.install_theme(ThemeUpdate::Fallback { background: Arc::clone(&bg) });

        let snap = state.tick(0.0, Instant::now());
        assert!(Arc::ptr_eq(&snap.background, &bg));
        assert!(snap.previous_background.is_some());
        assert!(snap.fade_opacity.is_some());

        let later = state.tick(0.0, Instant::now() + Duration::from_secs(1));
        assert!(later.previous_background.is_none());
        assert!(later.fade_opacity.is_none());
    }
}
