/*
 *  remote.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Remote data source: now playing, artwork, telemetry and commands
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

use reqwest::{header, Client, Error as ReqwestError};
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::time::Duration;

use crate::command::Command;
use crate::config::RemoteConfig;

/// Transport level failures. None of these are fatal, callers log and move on.
#[derive(Debug)]
pub enum RemoteError {
    /// Connection, protocol or body read error.
    Http(ReqwestError),
    /// The per-request timeout elapsed.
    Timeout,
    /// The service answered with a non-success status.
    Status(u16),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Http(e) => write!(f, "HTTP request error: {}", e),
            RemoteError::Timeout => write!(f, "request timed out"),
            RemoteError::Status(code) => write!(f, "remote answered HTTP {}", code),
        }
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemoteError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for RemoteError {
    fn from(err: ReqwestError) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if let Some(status) = err.status() {
            RemoteError::Status(status.as_u16())
        } else {
            RemoteError::Http(err)
        }
    }
}

/// Everything the panel asks of the outside world.
///
/// Every call is bounded by its own timeout; implementations never retry.
pub trait RemoteSource: Send + Sync {
    /// Raw now-playing blob
    fn fetch_playback(&self) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Raw artwork bytes from an absolute URL
    fn fetch_artwork(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;

    /// Raw telemetry blob
    fn fetch_telemetry(&self) -> impl Future<Output = Result<String, RemoteError>> + Send;

    fn send_command(&self, cmd: Command) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// HTTP implementation over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    remote: RemoteConfig,
}

impl HttpSource {
    /// Creates a new `HttpSource` inclusive populated headers and connect timeout.
    pub fn new(remote: &RemoteConfig) -> Result<Self, RemoteError> {
        const VERSION: &str = concat!("PiPanel ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert("Accept", header::HeaderValue::from_static("*/*"));

        // connect must fit inside the tightest request budget
        let connect = remote.command_timeout().min(Duration::from_millis(500));

        let client = Client::builder()
            .connect_timeout(connect)
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(HttpSource { client, remote: remote.clone() })
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, RemoteError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

impl RemoteSource for HttpSource {
    async fn fetch_playback(&self) -> Result<String, RemoteError> {
        let url = self.remote.url(&self.remote.now_playing_path);
        self.get_text(&url, self.remote.fetch_timeout()).await
    }

    async fn fetch_artwork(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .client
            .get(url)
            .timeout(self.remote.artwork_timeout())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_telemetry(&self) -> Result<String, RemoteError> {
        let url = self.remote.url(&self.remote.telemetry_path);
        self.get_text(&url, self.remote.telemetry_timeout()).await
    }

    async fn send_command(&self, cmd: Command) -> Result<(), RemoteError> {
        let url = self.remote.url(cmd.target.path(&self.remote));
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(cmd.body())
            .timeout(self.remote.command_timeout())
            .send()
            .await?;
        response.error_for_status_ref()?;
        Ok(())
    }
}
