/*
 *  poller.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Background poll of the remote playback state and artwork
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

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::playback::PlaybackState;
use crate::remote::RemoteSource;
use crate::state::SharedState;
use crate::theme::ThemeEngine;

/// What a single poll cycle achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// playback fetch failed, nothing changed
    Unreachable,
    /// playback fields written, artwork unchanged
    Updated,
    /// playback fields written and new artwork handed to the theme engine
    ArtworkApplied,
    /// playback fields written, artwork fetch failed and will be retried
    ArtworkFailed,
}

pub struct Poller<S> {
    source: Arc<S>,
    state: SharedState,
    engine: ThemeEngine,
    /// last artwork URL whose bytes actually arrived
    last_art_url: Option<String>,
}

impl<S: RemoteSource + 'static> Poller<S> {
    pub fn new(source: Arc<S>, state: SharedState, engine: ThemeEngine) -> Self {
        Poller { source, state, engine, last_art_url: None }
    }

    /// One fetch, parse, write and (maybe) artwork cycle. Never fails.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let blob = match self.source.fetch_playback().await {
            Ok(blob) => blob,
            Err(e) => {
                debug!("Now playing fetch skipped: {}", e);
                return PollOutcome::Unreachable;
            }
        };

        let playback = PlaybackState::from_blob(&blob);
        let art_url = playback.art_url.clone();
        self.state.apply_playback(playback);

        let Some(url) = art_url else {
            return PollOutcome::Updated;
        };
        if self.last_art_url.as_deref() == Some(url.as_str()) {
            return PollOutcome::Updated;
        }

        match self.source.fetch_artwork(&url).await {
            Ok(bytes) => {
                info!("Artwork changed: {} ({} bytes)", url, bytes.len());
                self.last_art_url = Some(url);
                let engine = self.engine;
                let state = self.state.clone();
                // decode off the async workers; only the final install locks
                if let Err(e) = tokio::task::spawn_blocking(move || engine.apply(&bytes, &state)).await {
                    warn!("Artwork decode task failed: {}", e);
                }
                PollOutcome::ArtworkApplied
            }
            Err(e) => {
                debug!("Artwork fetch failed, will retry: {}", e);
                PollOutcome::ArtworkFailed
            }
        }
    }

    /// Poll every `interval` until `shutdown` fires.
    pub async fn run(mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Poller started, every {}ms", interval.as_millis());
        loop {
            self.poll_once().await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    debug!("Poller received stop signal. Exiting.");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::remote::RemoteError;
    use crate::state::PanelState;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: one playback blob, artwork answers popped per call.
    struct ScriptedSource {
        blob: Option<String>,
        artwork: Mutex<Vec<Result<Vec<u8>, RemoteError>>>,
        artwork_calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(blob: Option<&str>, artwork: Vec<Result<Vec<u8>, RemoteError>>) -> Self {
            ScriptedSource {
                blob: blob.map(str::to_string),
                artwork: Mutex::new(artwork),
                artwork_calls: AtomicUsize::new(0),
            }
        }
    }

    impl RemoteSource for ScriptedSource {
        async fn fetch_playback(&self) -> Result<String, RemoteError> {
            self.blob.clone().ok_or(RemoteError::Timeout)
        }

        async fn fetch_artwork(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
            self.artwork_calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.artwork.lock().unwrap();
            if answers.is_empty() { Err(RemoteError::Timeout) } else { answers.remove(0) }
        }

        async fn fetch_telemetry(&self) -> Result<String, RemoteError> {
            Err(RemoteError::Timeout)
        }

        async fn send_command(&self, _cmd: Command) -> Result<(), RemoteError> {
            Ok(())
        }
    }

    fn poller(source: ScriptedSource) -> (Poller<ScriptedSource>, Arc<ScriptedSource>, SharedState) {
        let source = Arc::new(source);
        let state = SharedState::new(PanelState::new(8, 8, Duration::from_millis(500)));
        let engine = ThemeEngine::new(8, 8, 4);
        (Poller::new(Arc::clone(&source), state.clone(), engine), source, state)
    }

    #[tokio::test]
    async fn test_unreachable_leaves_state() {
        let (mut p, _, state) = poller(ScriptedSource::new(None, vec![]));
        assert_eq!(p.poll_once().await, PollOutcome::Unreachable);
        assert_eq!(state.playback(), PlaybackState::default());
    }

    #[tokio::test]
    async fn test_no_art_url_skips_artwork() {
        let (mut p, source, state) = poller(ScriptedSource::new(Some(r#"{"title":"Song"}"#), vec![]));
        assert_eq!(p.poll_once().await, PollOutcome::Updated);
        assert_eq!(state.playback().title, "Song");
        assert_eq!(source.artwork_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seen_artwork_not_refetched() {
        let blob = r#"{"title":"Song","art_url":"http://x/a.png"}"#;
        let (mut p, source, _) = poller(ScriptedSource::new(Some(blob), vec![Ok(b"junk".to_vec())]));
        assert_eq!(p.poll_once().await, PollOutcome::ArtworkApplied);
        assert_eq!(p.poll_once().await, PollOutcome::Updated);
        assert_eq!(source.artwork_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_artwork_retried() {
        let blob = r#"{"art_url":"http://x/a.png"}"#;
        let (mut p, source, _) = poller(ScriptedSource::new(
            Some(blob),
            vec![Err(RemoteError::Timeout), Ok(b"junk".to_vec())],
        ));
        assert_eq!(p.poll_once().await, PollOutcome::ArtworkFailed);
        assert_eq!(p.poll_once().await, PollOutcome::ArtworkApplied);
        assert_eq!(source.artwork_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_signal() {
        let (p, _, _) = poller(ScriptedSource::new(None, vec![]));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(p.run(Duration::from_secs(60), rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }
}
