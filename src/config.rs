/*
 *  config.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line overrides
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

use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Effective panel configuration. Every group carries its own defaults so a
/// YAML file only needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    pub remote: RemoteConfig,
    pub display: DisplayConfig,
    pub input: InputConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub now_playing_path: String,
    pub telemetry_path: String,
    pub transport_path: String,
    pub volume_path: String,
    pub poll_interval_ms: u64,
    pub fetch_timeout_ms: u64,
    pub artwork_timeout_ms: u64,
    pub telemetry_timeout_ms: u64,
    pub command_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5005".to_string(),
            now_playing_path: "/spotify_now".to_string(),
            telemetry_path: "/metrics".to_string(),
            transport_path: "/media".to_string(),
            volume_path: "/media".to_string(),
            poll_interval_ms: 2000,
            fetch_timeout_ms: 1000,
            artwork_timeout_ms: 1500,
            telemetry_timeout_ms: 800,
            command_timeout_ms: 300,
        }
    }
}

impl RemoteConfig {
    /// Join a configured path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
    pub fn fetch_timeout(&self) -> Duration { Duration::from_millis(self.fetch_timeout_ms) }
    pub fn artwork_timeout(&self) -> Duration { Duration::from_millis(self.artwork_timeout_ms) }
    pub fn telemetry_timeout(&self) -> Duration { Duration::from_millis(self.telemetry_timeout_ms) }
    pub fn command_timeout(&self) -> Duration { Duration::from_millis(self.command_timeout_ms) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// framebuffer device, e.g. /dev/fb0 (HDMI/DSI) or /dev/fb1 (SPI TFT)
    pub device: String,
    /// logical (pre-rotation) canvas size
    pub width: u32,
    pub height: u32,
    pub rotate_deg: u16,
    pub fps: u32,
    pub fade_ms: u64,
    pub artwork_size: u32,
    /// source label drawn over the playback view
    pub header_label: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: "/dev/fb0".to_string(),
            width: 480,
            height: 800,
            rotate_deg: 90,
            fps: 30,
            fade_ms: 500,
            artwork_size: 300,
            header_label: "Spotify".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn fade_duration(&self) -> Duration { Duration::from_millis(self.fade_ms) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub enabled: bool,
    pub sample_interval_ms: u64,
    pub debounce_ms: u64,
    pub pins: PinConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_ms: 25,
            debounce_ms: 100,
            pins: PinConfig::default(),
        }
    }
}

impl InputConfig {
    pub fn sample_interval(&self) -> Duration { Duration::from_millis(self.sample_interval_ms) }
    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }
}

/// BCM pin numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub prev: u8,
    pub play_pause: u8,
    pub next: u8,
    pub mode: u8,
    pub encoder_a: u8,
    pub encoder_b: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self { prev: 17, play_pause: 27, next: 22, mode: 5, encoder_a: 6, encoder_b: 13 }
    }
}

impl PinConfig {
    pub fn all(&self) -> [u8; 6] {
        [self.prev, self.play_pause, self.next, self.mode, self.encoder_a, self.encoder_b]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub source: TelemetrySource,
    /// readings older than this are fetched again while the telemetry view is up
    pub refresh_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { source: TelemetrySource::Remote, refresh_ms: 1000 }
    }
}

impl TelemetryConfig {
    pub fn refresh(&self) -> Duration { Duration::from_millis(self.refresh_ms) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TelemetrySource {
    /// fetch the telemetry blob from the remote service
    #[default]
    Remote,
    /// read load and temperature from /proc and /sys on this machine
    Local,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "PiPanel", about = "PiPanel - now playing panel", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    /// remote service base URL, e.g. http://192.168.1.20:5000
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub device: Option<String>,
    #[arg(long)]
    pub display_rotate_deg: Option<u16>,
    #[arg(long)]
    pub fps: Option<u32>,
    #[arg(long)]
    pub fade_ms: Option<u64>,
    #[arg(long)]
    pub debounce_ms: Option<u64>,
    /// run without the GPIO buttons and encoder
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_input: bool,
    #[arg(long, value_enum)]
    pub telemetry_source: Option<TelemetrySource>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Layer defaults, YAML and `cli` into a validated config.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults + 2) YAML file (explicit path or search)
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/pipanel/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/pipanel/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/pipanel.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["pipanel.yaml", "config.yaml", "config/pipanel.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    // an empty file is a valid "all defaults" config
    if s.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(s)?)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()        { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                      { cfg.log_level = Some("debug".to_string()); }
    if let Some(u) = &cli.base_url    { cfg.remote.base_url = u.clone(); }
    if let Some(v) = cli.poll_interval_ms { cfg.remote.poll_interval_ms = v; }
    if let Some(d) = &cli.device      { cfg.display.device = d.clone(); }
    if let Some(r) = cli.display_rotate_deg { cfg.display.rotate_deg = r; }
    if let Some(f) = cli.fps          { cfg.display.fps = f; }
    if let Some(f) = cli.fade_ms      { cfg.display.fade_ms = f; }
    if let Some(d) = cli.debounce_ms  { cfg.input.debounce_ms = d; }
    if cli.no_input                   { cfg.input.enabled = false; }
    if let Some(s) = cli.telemetry_source { cfg.telemetry.source = s; }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let remote = &cfg.remote;
    if !(remote.base_url.starts_with("http://") || remote.base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "remote base_url must start with http:// or https:// (got {:?})",
            remote.base_url
        )));
    }
    for (name, path) in [
        ("now_playing_path", &remote.now_playing_path),
        ("telemetry_path", &remote.telemetry_path),
        ("transport_path", &remote.transport_path),
        ("volume_path", &remote.volume_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!("remote {name} must start with '/'")));
        }
    }
    for (name, ms) in [
        ("poll_interval_ms", remote.poll_interval_ms),
        ("fetch_timeout_ms", remote.fetch_timeout_ms),
        ("artwork_timeout_ms", remote.artwork_timeout_ms),
        ("telemetry_timeout_ms", remote.telemetry_timeout_ms),
        ("command_timeout_ms", remote.command_timeout_ms),
    ] {
        if ms == 0 {
            return Err(ConfigError::Validation(format!("remote {name} must be > 0")));
        }
    }

    let display = &cfg.display;
    if display.width == 0 || display.height == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    match display.rotate_deg {
        0 | 90 | 180 | 270 => {},
        _ => return Err(ConfigError::Validation("display rotate_deg must be 0|90|180|270".into()))
    }
    if display.fps == 0 || display.fps > 120 {
        return Err(ConfigError::Validation("display fps must be 1..=120".into()));
    }
    if display.artwork_size == 0 || display.artwork_size > display.width.min(display.height) {
        return Err(ConfigError::Validation(
            "display artwork_size must be > 0 and fit the canvas".into(),
        ));
    }

    let input = &cfg.input;
    if input.sample_interval_ms == 0 {
        return Err(ConfigError::Validation("input sample_interval_ms must be > 0".into()));
    }
    if input.debounce_ms == 0 {
        return Err(ConfigError::Validation("input debounce_ms must be > 0".into()));
    }
    let pins = input.pins.all();
    for (i, pin) in pins.iter().enumerate() {
        if *pin > 27 {
            return Err(ConfigError::Validation(format!("input pin {pin} is not a header BCM pin")));
        }
        if pins[i + 1..].contains(pin) {
            return Err(ConfigError::Validation(format!("input pin {pin} assigned twice")));
        }
    }
    Ok(())
}
