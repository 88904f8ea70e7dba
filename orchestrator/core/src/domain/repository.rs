// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the records this core reads and writes. The
//! records themselves are owned by an external persistence layer; the core
//! receives these trait objects at construction time.
//!
//! | Trait | Record | Implementations |
//! |-------|--------|----------------|
//! | `ServerRepository` | `ServerDescriptor` | `InMemoryServerRepository` |
//! | `ScriptRepository` | `ScriptRecord` | `InMemoryScriptRepository` |
//! | `BackupRepository` | `BackupRecord` | `InMemoryBackupRepository` |

use async_trait::async_trait;

use crate::domain::backup::{BackupId, BackupRecord};
use crate::domain::script::{ScriptKind, ScriptRecord};
use crate::domain::server::{ServerDescriptor, ServerId};

#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Save server (create or update)
    async fn save(&self, server: &ServerDescriptor) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: ServerId) -> Result<Option<ServerDescriptor>, RepositoryError>;

    async fn list_all(&self) -> Result<Vec<ServerDescriptor>, RepositoryError>;

    /// Servers with `backup_enabled = true`
    async fn list_backup_enabled(&self) -> Result<Vec<ServerDescriptor>, RepositoryError>;
}

/// Read-only lookup of build material.
#[async_trait]
pub trait ScriptRepository: Send + Sync {
    /// The most recent script of `kind` for the server, if any.
    async fn find_active(&self, server_id: ServerId, kind: ScriptKind) -> Result<Option<ScriptRecord>, RepositoryError>;
}

#[async_trait]
pub trait BackupRepository: Send + Sync {
    /// Save backup (create or update)
    async fn save(&self, backup: &BackupRecord) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: BackupId) -> Result<Option<BackupRecord>, RepositoryError>;

    /// All backups for a server, in no particular order.
    async fn find_by_server(&self, server_id: ServerId) -> Result<Vec<BackupRecord>, RepositoryError>;

    async fn delete(&self, id: BackupId) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
