/*
 *  tests/scenarios.rs
 *
 *  End to end behaviour against a scripted media server
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 */

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use pipanel::command::{Command, CommandPayload};
use pipanel::config::TelemetrySource;
use pipanel::poller::{PollOutcome, Poller};
use pipanel::remote::{RemoteError, RemoteSource};
use pipanel::state::{PanelState, SharedState};
use pipanel::telemetry::TelemetryFeed;
use pipanel::theme::{TextTone, ThemeEngine};

/// Media server stand-in. The now playing blob can be swapped between polls
/// and artwork answers are consumed in order.
struct FakeServer {
    playback: Mutex<String>,
    telemetry: String,
    artwork: Mutex<Vec<Result<Vec<u8>, RemoteError>>>,
    artwork_calls: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl FakeServer {
    fn new(playback: &str) -> Self {
        FakeServer {
            playback: Mutex::new(playback.to_string()),
            telemetry: r#"{"cpu":42,"gpu":"n/a"}"#.to_string(),
            artwork: Mutex::new(Vec::new()),
            artwork_calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn queue_artwork(&self, answer: Result<Vec<u8>, RemoteError>) {
        self.artwork.lock().unwrap().push(answer);
    }

    fn now_playing(&self, blob: &str) {
        *self.playback.lock().unwrap() = blob.to_string();
    }
}

impl RemoteSource for FakeServer {
    async fn fetch_playback(&self) -> Result<String, RemoteError> {
        Ok(self.playback.lock().unwrap().clone())
    }

    async fn fetch_artwork(&self, _url: &str) -> Result<Vec<u8>, RemoteError> {
        self.artwork_calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.artwork.lock().unwrap();
        if answers.is_empty() { Err(RemoteError::Status(404)) } else { answers.remove(0) }
    }

    async fn fetch_telemetry(&self) -> Result<String, RemoteError> {
        Ok(self.telemetry.clone())
    }

    async fn send_command(&self, cmd: Command) -> Result<(), RemoteError> {
        self.commands.lock().unwrap().push(cmd.body());
        Ok(())
    }
}

fn png(color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

fn panel() -> SharedState {
    SharedState::new(PanelState::new(48, 80, Duration::from_millis(500)))
}

#[tokio::test]
async fn scenario_a_now_playing_blob() {
    let blob = r#"{"title":"Song","artist":"Band","is_playing":true,"progress":1000,"duration":200000,"art_url":"http://x/a.png"}"#;
    let server = Arc::new(FakeServer::new(blob));
    server.queue_artwork(Ok(png([240, 240, 240])));
    let state = panel();
    let mut poller = Poller::new(Arc::clone(&server), state.clone(), ThemeEngine::new(48, 80, 24));

    assert_eq!(poller.poll_once().await, PollOutcome::ArtworkApplied);

    let playback = state.playback();
    assert_eq!(playback.title, "Song");
    assert_eq!(playback.artist, "Band");
    assert!(playback.is_playing);
    assert_eq!(playback.progress_ms, 1000.0);
    assert_eq!(playback.duration_ms, 200000.0);
    assert_eq!(playback.art_url.as_deref(), Some("http://x/a.png"));

    let artwork = state.artwork().expect("artwork installed");
    assert_eq!((artwork.width(), artwork.height()), (24, 24));
    assert_eq!(state.text_tone(), TextTone::Dark);

    // render ticks extrapolate, the next poll corrects
    let snap = state.tick(500.0, Instant::now());
    assert_eq!(snap.playback.progress_ms, 1500.0);
    poller.poll_once().await;
    assert_eq!(state.playback().progress_ms, 1000.0);
    assert_eq!(server.artwork_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scenario_b_telemetry_blob() {
    let server = FakeServer::new("{}");
    let mut feed = TelemetryFeed::new(TelemetrySource::Remote, Duration::from_secs(1));

    let readings = feed.readings(&server, Instant::now()).await;
    assert_eq!(readings.cpu, "42");
    assert_eq!(readings.gpu, "n/a");
    assert_eq!(readings.temp_cpu, "n/a");
    assert_eq!(readings.temp_gpu, "n/a");
}

#[tokio::test]
async fn scenario_c_artwork_fails_twice() {
    let server = Arc::new(FakeServer::new(r#"{"title":"One","art_url":"http://x/one.png"}"#));
    server.queue_artwork(Ok(png([240, 240, 240])));
    let state = panel();
    let mut poller = Poller::new(Arc::clone(&server), state.clone(), ThemeEngine::new(48, 80, 24));
    assert_eq!(poller.poll_once().await, PollOutcome::ArtworkApplied);

    let artwork = state.artwork().expect("artwork installed");
    let background = state.background();
    let tone = state.text_tone();

    server.now_playing(r#"{"title":"Two","art_url":"http://x/two.png"}"#);
    server.queue_artwork(Err(RemoteError::Timeout));
    server.queue_artwork(Err(RemoteError::Status(500)));
    assert_eq!(poller.poll_once().await, PollOutcome::ArtworkFailed);
    assert_eq!(poller.poll_once().await, PollOutcome::ArtworkFailed);

    // playback moved on, the theme did not
    assert_eq!(state.playback().title, "Two");
    assert!(Arc::ptr_eq(&state.artwork().unwrap(), &artwork));
    assert!(Arc::ptr_eq(&state.background(), &background));
    assert_eq!(state.text_tone(), tone);
    assert_eq!(server.artwork_calls.load(Ordering::SeqCst), 3);

    // and the third attempt still goes out
    server.queue_artwork(Ok(png([10, 10, 10])));
    assert_eq!(poller.poll_once().await, PollOutcome::ArtworkApplied);
    assert_eq!(state.text_tone(), TextTone::Light);
    assert_ne!(state.background().pixel(0, 0), Some(Rgb888::new(240, 240, 240)));
}

#[tokio::test]
async fn transport_command_reaches_server() {
    let server = Arc::new(FakeServer::new("{}"));
    pipanel::command::dispatch(&server, Command::new(CommandPayload::PlayPause))
        .await
        .unwrap();
    assert_eq!(server.commands.lock().unwrap().as_slice(), [r#"{"cmd":"playpause"}"#]);
}
