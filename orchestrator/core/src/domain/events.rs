// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::backup::BackupId;
use crate::domain::runtime::ContainerRef;
use crate::domain::server::ServerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerEvent {
    ServerStarting {
        server_id: ServerId,
        requested_at: DateTime<Utc>,
    },
    ServerStarted {
        server_id: ServerId,
        container: ContainerRef,
        started_at: DateTime<Utc>,
    },
    ServerStopping {
        server_id: ServerId,
        requested_at: DateTime<Utc>,
    },
    ServerStopped {
        server_id: ServerId,
        stopped_at: DateTime<Utc>,
    },
    ServerFailed {
        server_id: ServerId,
        operation: String,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    ServerRemoved {
        server_id: ServerId,
        removed_at: DateTime<Utc>,
    },
    SettingsUpdated {
        server_id: ServerId,
        updated_at: DateTime<Utc>,
    },
}

impl ServerEvent {
    pub fn server_id(&self) -> ServerId {
        match self {
            ServerEvent::ServerStarting { server_id, .. }
            | ServerEvent::ServerStarted { server_id, .. }
            | ServerEvent::ServerStopping { server_id, .. }
            | ServerEvent::ServerStopped { server_id, .. }
            | ServerEvent::ServerFailed { server_id, .. }
            | ServerEvent::ServerRemoved { server_id, .. }
            | ServerEvent::SettingsUpdated { server_id, .. } => *server_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackupEvent {
    BackupCreated {
        backup_id: BackupId,
        server_id: ServerId,
        size: u64,
        is_automatic: bool,
        created_at: DateTime<Utc>,
    },
    BackupFailed {
        backup_id: BackupId,
        server_id: ServerId,
        reason: String,
        failed_at: DateTime<Utc>,
    },
    BackupRestored {
        backup_id: BackupId,
        server_id: ServerId,
        restored_at: DateTime<Utc>,
    },
    BackupDeleted {
        backup_id: BackupId,
        server_id: ServerId,
        deleted_at: DateTime<Utc>,
    },
    SweepCompleted {
        created: usize,
        failed: usize,
        completed_at: DateTime<Utc>,
    },
    RetentionCompleted {
        removed: usize,
        failed_servers: usize,
        completed_at: DateTime<Utc>,
    },
}

impl BackupEvent {
    /// Batch events are not tied to a single server.
    pub fn server_id(&self) -> Option<ServerId> {
        match self {
            BackupEvent::BackupCreated { server_id, .. }
            | BackupEvent::BackupFailed { server_id, .. }
            | BackupEvent::BackupRestored { server_id, .. }
            | BackupEvent::BackupDeleted { server_id, .. } => Some(*server_id),
            BackupEvent::SweepCompleted { .. } | BackupEvent::RetentionCompleted { .. } => None,
        }
    }
}
