// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Server Aggregate
//!
//! The durable description of one game-server instance together with the
//! lifecycle state machine that governs its `status`.
//!
//! ## State Machine
//! | From | Operation | To |
//! |------|-----------|----|
//! | `stopped`, `error` | start | `starting` → `running` / `error` |
//! | `running`, `starting`, `error` | stop | `stopping` → `stopped` / `error` |
//! | any settled state | restart | stop phase, then start phase |
//!
//! The descriptor itself is persisted by an external collaborator; this core
//! is the only writer of `status`, `container_ref`, `last_started` and
//! `last_stopped`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::error::LifecycleError;
use crate::domain::runtime::ContainerRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub Uuid);

impl ServerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for ServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ServerStatus {
    /// A live status means a runtime container is expected to exist.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-adjustable fields of a server. Rejected while the server is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    pub port: u16,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u64,
    pub cpu_percent: u32,
    #[serde(rename = "diskMB")]
    pub disk_mb: u64,
    pub auto_restart: bool,
    pub backup_enabled: bool,
    pub backup_schedule: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 25565,
            memory_mb: 1024,
            cpu_percent: 100,
            disk_mb: 10240,
            auto_restart: false,
            backup_enabled: true,
            backup_schedule: "0 0 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    pub id: ServerId,
    pub name: String,
    pub game_type: String,
    pub port: u16,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u64,
    pub cpu_percent: u32,
    #[serde(rename = "diskMB")]
    pub disk_mb: u64,
    pub auto_restart: bool,
    pub backup_enabled: bool,
    /// Cron expression read by the external trigger; the core never parses it.
    pub backup_schedule: String,
    pub status: ServerStatus,
    pub container_ref: Option<ContainerRef>,
    pub last_started: Option<DateTime<Utc>>,
    pub last_stopped: Option<DateTime<Utc>>,
}

impl ServerDescriptor {
    pub fn new(name: impl Into<String>, game_type: impl Into<String>, settings: ServerSettings) -> Self {
        let mut server = Self {
            id: ServerId::new(),
            name: name.into(),
            game_type: game_type.into(),
            port: 0,
            memory_mb: 0,
            cpu_percent: 0,
            disk_mb: 0,
            auto_restart: false,
            backup_enabled: false,
            backup_schedule: String::new(),
            status: ServerStatus::Stopped,
            container_ref: None,
            last_started: None,
            last_stopped: None,
        };
        server.apply_settings(settings);
        server
    }

    pub fn settings(&self) -> ServerSettings {
        ServerSettings {
            port: self.port,
            memory_mb: self.memory_mb,
            cpu_percent: self.cpu_percent,
            disk_mb: self.disk_mb,
            auto_restart: self.auto_restart,
            backup_enabled: self.backup_enabled,
            backup_schedule: self.backup_schedule.clone(),
        }
    }

    fn apply_settings(&mut self, settings: ServerSettings) {
        self.port = settings.port;
        self.memory_mb = settings.memory_mb;
        self.cpu_percent = settings.cpu_percent;
        self.disk_mb = settings.disk_mb;
        self.auto_restart = settings.auto_restart;
        self.backup_enabled = settings.backup_enabled;
        self.backup_schedule = settings.backup_schedule;
    }

    /// Replace the adjustable settings. Fails with `ServerBusy` while live.
    pub fn update_settings(&mut self, settings: ServerSettings) -> Result<(), LifecycleError> {
        if self.status.is_live() {
            return Err(LifecycleError::ServerBusy {
                server_id: self.id,
                status: self.status,
            });
        }
        self.apply_settings(settings);
        Ok(())
    }

    pub fn begin_start(&mut self) -> Result<(), LifecycleError> {
        match self.status {
            ServerStatus::Stopped | ServerStatus::Error => {
                self.status = ServerStatus::Starting;
                Ok(())
            }
            other => Err(self.invalid_transition(other, "start")),
        }
    }

    pub fn mark_running(&mut self, container: ContainerRef) {
        self.status = ServerStatus::Running;
        self.container_ref = Some(container);
        self.last_started = Some(Utc::now());
    }

    /// Returns `false` when there is nothing to stop: the server is already
    /// `stopped`, or sits in `error` without a container.
    pub fn begin_stop(&mut self) -> Result<bool, LifecycleError> {
        match self.status {
            ServerStatus::Stopped => Ok(false),
            ServerStatus::Error if self.container_ref.is_none() => Ok(false),
            ServerStatus::Running | ServerStatus::Starting | ServerStatus::Error => {
                self.status = ServerStatus::Stopping;
                Ok(true)
            }
            other => Err(self.invalid_transition(other, "stop")),
        }
    }

    pub fn mark_stopped(&mut self) {
        self.status = ServerStatus::Stopped;
        self.container_ref = None;
        self.last_stopped = Some(Utc::now());
    }

    /// The container reference is kept: a failed attempt may leave a created
    /// container behind that the next start or stop must clean up.
    pub fn mark_error(&mut self) {
        self.status = ServerStatus::Error;
    }

    /// Image tag and container name share the same deterministic stem.
    pub fn container_name(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.id)
    }

    pub fn image_tag(&self, prefix: &str) -> String {
        format!("{}-{}:latest", prefix, self.id)
    }

    fn invalid_transition(&self, from: ServerStatus, operation: &'static str) -> LifecycleError {
        LifecycleError::InvalidTransition {
            server_id: self.id,
            from,
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerDescriptor {
        ServerDescriptor::new("alpha", "minecraft", ServerSettings::default())
    }

    #[test]
    fn test_start_only_from_stopped_or_error() {
        let mut s = server();
        assert!(s.begin_start().is_ok());
        assert_eq!(s.status, ServerStatus::Starting);

        let err = s.begin_start().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { from: ServerStatus::Starting, .. }));

        s.mark_running(ContainerRef::new("abc"));
        assert!(s.begin_start().is_err());

        s.mark_error();
        assert!(s.begin_start().is_ok());
    }

    #[test]
    fn test_stop_is_noop_when_nothing_runs() {
        let mut s = server();
        assert!(!s.begin_stop().unwrap());
        assert_eq!(s.status, ServerStatus::Stopped);

        s.mark_error();
        assert!(!s.begin_stop().unwrap());

        s.container_ref = Some(ContainerRef::new("leftover"));
        assert!(s.begin_stop().unwrap());
        assert_eq!(s.status, ServerStatus::Stopping);
        assert!(s.begin_stop().is_err());
    }

    #[test]
    fn test_container_ref_tracks_liveness() {
        let mut s = server();
        s.begin_start().unwrap();
        s.mark_running(ContainerRef::new("abc"));
        assert!(s.container_ref.is_some());
        assert!(s.last_started.is_some());

        s.begin_stop().unwrap();
        s.mark_stopped();
        assert!(s.container_ref.is_none());
        assert!(s.last_stopped.is_some());
    }

    #[test]
    fn test_update_settings_rejected_while_live() {
        let mut s = server();
        let mut settings = s.settings();
        settings.port = 27015;
        s.update_settings(settings.clone()).unwrap();
        assert_eq!(s.port, 27015);

        s.status = ServerStatus::Running;
        let err = s.update_settings(settings).unwrap_err();
        assert!(matches!(err, LifecycleError::ServerBusy { .. }));
    }

    #[test]
    fn test_descriptor_serializes_with_external_field_names() {
        let s = server();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["memoryMB"], 1024);
        assert_eq!(json["gameType"], "minecraft");
        assert_eq!(json["status"], "stopped");
    }
}
