// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use tokio::task::JoinHandle;

use crate::domain::backup::BackupRecord;
use crate::domain::error::LifecycleError;
use crate::domain::server::ServerDescriptor;

/// An acknowledged operation whose terminal state is applied by a
/// background task.
///
/// Dropping the handle does not cancel the task: lifecycle transitions and
/// backups always run to completion or failure.
#[derive(Debug)]
pub struct PendingOperation<T> {
    acknowledged: T,
    handle: JoinHandle<Result<T, LifecycleError>>,
}

/// Start/stop/restart acknowledged in `starting` or `stopping`.
pub type PendingTransition = PendingOperation<ServerDescriptor>;

/// Backup acknowledged with its `in_progress` record.
pub type PendingBackup = PendingOperation<BackupRecord>;

impl<T> PendingOperation<T> {
    pub(crate) fn new(acknowledged: T, handle: JoinHandle<Result<T, LifecycleError>>) -> Self {
        Self { acknowledged, handle }
    }

    /// State persisted before the background work began.
    pub fn acknowledged(&self) -> &T {
        &self.acknowledged
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the terminal result.
    pub async fn wait(self) -> Result<T, LifecycleError> {
        self.handle
            .await
            .map_err(|e| LifecycleError::TaskAborted(e.to_string()))?
    }
}
