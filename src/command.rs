/*
 *  command.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fire-and-forget playback and volume commands
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

use log::{debug, info};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::RemoteConfig;
use crate::remote::RemoteSource;

/// Which remote endpoint a command is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEndpoint {
    Transport,
    Volume,
}

impl RemoteEndpoint {
    pub fn path<'a>(&self, remote: &'a RemoteConfig) -> &'a str {
        match self {
            RemoteEndpoint::Transport => &remote.transport_path,
            RemoteEndpoint::Volume => &remote.volume_path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPayload {
    Prev,
    Next,
    PlayPause,
    VolUp,
    VolDown,
}

impl CommandPayload {
    /// Wire name carried in the `cmd` field
    pub fn name(&self) -> &'static str {
        match self {
            CommandPayload::Prev => "prev",
            CommandPayload::Next => "next",
            CommandPayload::PlayPause => "playpause",
            CommandPayload::VolUp => "vol_up",
            CommandPayload::VolDown => "vol_down",
        }
    }

    pub fn endpoint(&self) -> RemoteEndpoint {
        match self {
            CommandPayload::VolUp | CommandPayload::VolDown => RemoteEndpoint::Volume,
            _ => RemoteEndpoint::Transport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub target: RemoteEndpoint,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(payload: CommandPayload) -> Self {
        Command { target: payload.endpoint(), payload }
    }

    /// JSON body, e.g. `{"cmd":"vol_up"}`
    pub fn body(&self) -> String {
        json!({ "cmd": self.payload.name() }).to_string()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.payload.name(), self.target)
    }
}

/// Send `cmd` on its own task. The source applies the command timeout;
/// failures are logged and dropped, there is no retry.
pub fn dispatch<S>(source: &Arc<S>, cmd: Command) -> JoinHandle<()>
where
    S: RemoteSource + 'static,
{
    let source = Arc::clone(source);
    info!("Command {}", cmd);
    tokio::spawn(async move {
        if let Err(e) = source.send_command(cmd).await {
            debug!("Command {} dropped: {}", cmd, e);
        }
    })
}
