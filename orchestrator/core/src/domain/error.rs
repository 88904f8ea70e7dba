// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Lifecycle Error Taxonomy
//!
//! Every failure the core raises to its caller. The HTTP layer above maps
//! these to status codes; this crate only guarantees the kind and the cause.
//!
//! | Variant | Typical mapping |
//! |---------|-----------------|
//! | `ServerNotFound`, `BackupNotFound`, `BackupMissing` | not found |
//! | `InvalidTransition`, `OperationInProgress`, `ServerBusy`, `ServerNotRunning`, `BackupIncomplete` | conflict / precondition failed |
//! | `ScriptWrite`, `ImageBuild`, `ContainerOperation`, `Archive`, `RetentionCleanup`, `TaskAborted`, `Repository` | server error |

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::backup::BackupId;
use crate::domain::repository::RepositoryError;
use crate::domain::runtime::RuntimeError;
use crate::domain::server::{ServerId, ServerStatus};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to write build context file {path}: {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image build failed for server {server_id}: {source}")]
    ImageBuild {
        server_id: ServerId,
        #[source]
        source: RuntimeError,
    },

    #[error("Container operation failed for server {server_id}: {source}")]
    ContainerOperation {
        server_id: ServerId,
        #[source]
        source: RuntimeError,
    },

    #[error("Server {0} is not running")]
    ServerNotRunning(ServerId),

    #[error("Server {server_id} is busy ({status})")]
    ServerBusy { server_id: ServerId, status: ServerStatus },

    #[error("Cannot {operation} server {server_id} from status {from}")]
    InvalidTransition {
        server_id: ServerId,
        from: ServerStatus,
        operation: &'static str,
    },

    #[error("Another lifecycle operation is in progress for server {0}")]
    OperationInProgress(ServerId),

    #[error("Server not found: {0}")]
    ServerNotFound(ServerId),

    #[error("Backup not found: {0}")]
    BackupNotFound(BackupId),

    #[error("Archive for backup {backup_id} is missing at {path}")]
    BackupMissing { backup_id: BackupId, path: PathBuf },

    #[error("Backup {0} did not complete and cannot be restored")]
    BackupIncomplete(BackupId),

    #[error("Archive operation on {path} failed: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Retention cleanup failed for server {server_id}: {message}")]
    RetentionCleanup { server_id: ServerId, message: String },

    #[error("Background operation did not complete: {0}")]
    TaskAborted(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl LifecycleError {
    /// True for rejections that left no side effects behind.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition { .. }
                | Self::OperationInProgress(_)
                | Self::ServerBusy { .. }
                | Self::ServerNotRunning(_)
                | Self::BackupIncomplete(_)
        )
    }
}
