/*
 *  main.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup wiring: config, logging, display, input and the three loops
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

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;

use pipanel::config::{self, Config};
use pipanel::controls::run_input_loop;
use pipanel::display::{DisplaySurface, FbdevSurface, ModeSwitch, RenderLoop, RenderSettings};
use pipanel::gpio;
use pipanel::poller::Poller;
use pipanel::remote::HttpSource;
use pipanel::state::{PanelState, SharedState};
use pipanel::telemetry::TelemetryFeed;
use pipanel::theme::ThemeEngine;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load().context("loading configuration")?;

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_PROFILE);

    if let Err(e) = run(cfg).await {
        error!("{:#}", e);
        return Err(e);
    }
    info!("{} stopped", env!("CARGO_PKG_NAME"));
    Ok(())
}

/// Open hardware, start the poller and input tasks, then render until a
/// signal arrives.
async fn run(cfg: Config) -> anyhow::Result<()> {
    let source = Arc::new(HttpSource::new(&cfg.remote).context("building HTTP client")?);
    info!("Remote media server at {}", cfg.remote.base_url);

    let mut surface = FbdevSurface::open(&cfg.display.device)
        .with_context(|| format!("opening framebuffer {}", cfg.display.device))?;
    surface.init().context("initialising framebuffer")?;

    let (w, h) = (cfg.display.width, cfg.display.height);
    let expected = match cfg.display.rotate_deg {
        90 | 270 => (h, w),
        _ => (w, h),
    };
    if surface.dimensions() != expected {
        warn!(
            "Framebuffer is {:?} but {}x{} rotated {} needs {:?}; output will be clipped",
            surface.dimensions(), w, h, cfg.display.rotate_deg, expected
        );
    }

    let lines = if cfg.input.enabled {
        Some(gpio::open(&cfg.input).context("claiming GPIO inputs")?)
    } else {
        info!("Physical controls disabled");
        None
    };

    let state = SharedState::new(PanelState::new(w, h, cfg.display.fade_duration()));
    let mode = ModeSwitch::new();
    let engine = ThemeEngine::new(w, h, cfg.display.artwork_size);
    let (stop_tx, stop_rx) = watch::channel(false);

    let poller = Poller::new(Arc::clone(&source), state.clone(), engine);
    let poll_task = tokio::spawn(poller.run(cfg.remote.poll_interval(), stop_rx.clone()));

    let input_task = lines.map(|lines| {
        tokio::spawn(run_input_loop(
            lines,
            Arc::clone(&source),
            mode.clone(),
            cfg.input.sample_interval(),
            cfg.input.debounce(),
            stop_rx.clone(),
        ))
    });

    tokio::spawn(async move {
        if let Err(e) = signal_handler().await {
            error!("Signal handler failed: {}", e);
        }
        let _ = stop_tx.send(true);
    });

    let render = RenderLoop::new(
        Box::new(surface),
        Arc::clone(&source),
        state,
        mode,
        TelemetryFeed::new(cfg.telemetry.source, cfg.telemetry.refresh()),
        RenderSettings {
            width: w,
            height: h,
            artwork_size: cfg.display.artwork_size,
            rotate_deg: cfg.display.rotate_deg,
            fps: cfg.display.fps,
            header: cfg.display.header_label.clone(),
        },
    );
    let mut surface = render.run(stop_rx).await;

    if let Err(e) = poll_task.await {
        warn!("Poller task ended abnormally: {}", e);
    }
    if let Some(task) = input_task {
        if let Err(e) = task.await {
            warn!("Input task ended abnormally: {}", e);
        }
    }

    if let Err(e) = surface.clear() {
        warn!("Could not clear display on exit: {}", e);
    }
    Ok(())
}
