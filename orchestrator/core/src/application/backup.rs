// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Backup Engine Application Service
//!
//! Archives a server's directory, restores an archive into it, deletes
//! archives and enforces per-server retention.
//!
//! Records are persisted `in_progress` before the archive is touched. A
//! partially written archive is left on disk after a failure for inspection.
//! Archive work for one server is serialized by the same per-server lock the
//! lifecycle service uses; backups wait for it instead of failing.

use chrono::Utc;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::pending::PendingBackup;
use crate::application::server_locks::ServerLocks;
use crate::domain::backup::{BackupId, BackupRecord, BackupStatus};
use crate::domain::config::StorageConfig;
use crate::domain::error::LifecycleError;
use crate::domain::events::BackupEvent;
use crate::domain::repository::{BackupRepository, ServerRepository};
use crate::domain::server::{ServerDescriptor, ServerId};
use crate::infrastructure::archive;
use crate::infrastructure::event_bus::EventBus;

/// Outcome of one retention pass over every server.
#[derive(Debug, Default)]
pub struct RetentionReport {
    pub removed: Vec<BackupId>,
    /// One `RetentionCleanup` per server whose pass stopped early
    pub failures: Vec<LifecycleError>,
}

#[derive(Clone)]
pub struct BackupEngine {
    servers: Arc<dyn ServerRepository>,
    backups: Arc<dyn BackupRepository>,
    locks: ServerLocks,
    event_bus: Arc<EventBus>,
    storage: StorageConfig,
}

impl BackupEngine {
    pub fn new(
        servers: Arc<dyn ServerRepository>,
        backups: Arc<dyn BackupRepository>,
        locks: ServerLocks,
        event_bus: Arc<EventBus>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            servers,
            backups,
            locks,
            event_bus,
            storage,
        }
    }

    /// Archive the server's directory. Without a label the record is named
    /// `Manual backup - {timestamp}` (or `Automatic ...`).
    pub async fn create_backup(
        &self,
        server_id: ServerId,
        label: Option<String>,
        is_automatic: bool,
    ) -> Result<BackupRecord, LifecycleError> {
        self.create_backup_detached(server_id, label, is_automatic)
            .await?
            .wait()
            .await
    }

    /// Returns once the `in_progress` record is persisted.
    pub async fn create_backup_detached(
        &self,
        server_id: ServerId,
        label: Option<String>,
        is_automatic: bool,
    ) -> Result<PendingBackup, LifecycleError> {
        let server = self.server(server_id).await?;
        let record = BackupRecord::begin(&server, &self.storage.backups_root, label, is_automatic);
        self.backups.save(&record).await?;
        debug!(server_id = %server_id, backup_id = %record.id, "Backup record created");

        let engine = self.clone();
        let acknowledged = record.clone();
        let handle = tokio::spawn(async move {
            let _guard = engine.locks.acquire(server_id).await;
            engine.run_backup(record).await
        });
        Ok(PendingBackup::new(acknowledged, handle))
    }

    async fn run_backup(&self, mut record: BackupRecord) -> Result<BackupRecord, LifecycleError> {
        match self.archive_server_dir(&record).await {
            Ok(size) => {
                record.complete(size);
                self.backups.save(&record).await?;

                info!(
                    server_id = %record.server_id,
                    backup_id = %record.id,
                    "Backup created at {} ({} bytes)",
                    record.file_path.display(),
                    size
                );
                self.event_bus.publish_backup_event(BackupEvent::BackupCreated {
                    backup_id: record.id,
                    server_id: record.server_id,
                    size,
                    is_automatic: record.is_automatic,
                    created_at: Utc::now(),
                });
                Ok(record)
            }
            Err(source) => {
                let cause = LifecycleError::Archive {
                    path: record.file_path.clone(),
                    source,
                };
                record.fail();
                error!(server_id = %record.server_id, backup_id = %record.id, "Backup failed: {}", cause);

                if let Err(e) = self.backups.save(&record).await {
                    error!(backup_id = %record.id, "Failed to persist failed backup status: {}", e);
                }
                self.event_bus.publish_backup_event(BackupEvent::BackupFailed {
                    backup_id: record.id,
                    server_id: record.server_id,
                    reason: cause.to_string(),
                    failed_at: Utc::now(),
                });
                Err(cause)
            }
        }
    }

    /// A server that never ran has no directory yet; it archives as empty.
    async fn archive_server_dir(&self, record: &BackupRecord) -> io::Result<u64> {
        let source = self.storage.server_dir(record.server_id);
        tokio::fs::create_dir_all(&source).await?;
        archive::archive_directory(source, record.file_path.clone()).await
    }

    /// Replace the server's directory with the archive's contents.
    ///
    /// Not atomic: a failure during extraction leaves the directory partially
    /// populated and calls for another restore.
    pub async fn restore_backup(&self, server_id: ServerId, backup_id: BackupId) -> Result<BackupRecord, LifecycleError> {
        let guard = self.locks.acquire(server_id).await;

        let server = self.server(server_id).await?;
        if server.status.is_live() {
            return Err(LifecycleError::ServerBusy {
                server_id,
                status: server.status,
            });
        }

        let record = self
            .backups
            .find_by_id(backup_id)
            .await?
            .filter(|b| b.server_id == server_id)
            .ok_or(LifecycleError::BackupNotFound(backup_id))?;
        if record.status != BackupStatus::Completed {
            return Err(LifecycleError::BackupIncomplete(backup_id));
        }
        if !tokio::fs::try_exists(&record.file_path).await.unwrap_or(false) {
            return Err(LifecycleError::BackupMissing {
                backup_id,
                path: record.file_path.clone(),
            });
        }

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            engine.run_restore(record).await
        });

        handle
            .await
            .map_err(|e| LifecycleError::TaskAborted(e.to_string()))?
    }

    async fn run_restore(&self, record: BackupRecord) -> Result<BackupRecord, LifecycleError> {
        let target = self.storage.server_dir(record.server_id);
        info!(server_id = %record.server_id, backup_id = %record.id, "Restoring backup into {}", target.display());

        archive::restore_directory(record.file_path.clone(), target)
            .await
            .map_err(|source| LifecycleError::Archive {
                path: record.file_path.clone(),
                source,
            })?;

        self.event_bus.publish_backup_event(BackupEvent::BackupRestored {
            backup_id: record.id,
            server_id: record.server_id,
            restored_at: Utc::now(),
        });
        Ok(record)
    }

    /// Remove the archive (absent is fine) and then the record.
    pub async fn delete_backup(&self, backup_id: BackupId) -> Result<(), LifecycleError> {
        let record = self
            .backups
            .find_by_id(backup_id)
            .await?
            .ok_or(LifecycleError::BackupNotFound(backup_id))?;

        let _guard = self.locks.acquire(record.server_id).await;
        self.remove_backup(&record).await
    }

    async fn remove_backup(&self, record: &BackupRecord) -> Result<(), LifecycleError> {
        remove_archive(&record.file_path).await?;
        self.backups.delete(record.id).await?;

        debug!(server_id = %record.server_id, backup_id = %record.id, "Backup deleted");
        self.event_bus.publish_backup_event(BackupEvent::BackupDeleted {
            backup_id: record.id,
            server_id: record.server_id,
            deleted_at: Utc::now(),
        });
        Ok(())
    }

    /// Newest first.
    pub async fn list_backups(&self, server_id: ServerId) -> Result<Vec<BackupRecord>, LifecycleError> {
        let mut records = self.backups.find_by_server(server_id).await?;
        records.sort_by(BackupRecord::newest_first);
        Ok(records)
    }

    /// Keep the `max_per_server` newest backups of every server. A failing
    /// server is logged and skipped; the others are still cleaned.
    pub async fn cleanup(&self, max_per_server: usize) -> Result<RetentionReport, LifecycleError> {
        let servers = self.servers.list_all().await?;
        info!("Cleaning up backups for {} servers (keeping {} each)", servers.len(), max_per_server);

        let mut report = RetentionReport::default();
        for server in servers {
            match self.prune_server(server.id, max_per_server, &mut report.removed).await {
                Ok(0) => {}
                Ok(removed) => info!(server_id = %server.id, "Removed {} old backups", removed),
                Err(e) => {
                    let failure = LifecycleError::RetentionCleanup {
                        server_id: server.id,
                        message: e.to_string(),
                    };
                    warn!(server_id = %server.id, "{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        self.event_bus.publish_backup_event(BackupEvent::RetentionCompleted {
            removed: report.removed.len(),
            failed_servers: report.failures.len(),
            completed_at: Utc::now(),
        });
        Ok(report)
    }

    async fn prune_server(
        &self,
        server_id: ServerId,
        max_per_server: usize,
        removed: &mut Vec<BackupId>,
    ) -> Result<usize, LifecycleError> {
        let _guard = self.locks.acquire(server_id).await;
        let records = self.list_backups(server_id).await?;

        let mut count = 0;
        for record in records.iter().skip(max_per_server) {
            self.remove_backup(record).await?;
            removed.push(record.id);
            count += 1;
        }
        Ok(count)
    }

    async fn server(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        self.servers
            .find_by_id(server_id)
            .await?
            .ok_or(LifecycleError::ServerNotFound(server_id))
    }
}

async fn remove_archive(path: &Path) -> Result<(), LifecycleError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LifecycleError::Archive {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::{ServerSettings, ServerStatus};
    use crate::infrastructure::repositories::{InMemoryBackupRepository, InMemoryServerRepository};
    use std::fs;

    struct Fixture {
        root: tempfile::TempDir,
        servers: InMemoryServerRepository,
        backups: InMemoryBackupRepository,
        engine: BackupEngine,
        storage: StorageConfig,
        server: ServerDescriptor,
    }

    async fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            servers_root: root.path().join("servers"),
            backups_root: root.path().join("backups"),
            ..Default::default()
        };
        let servers = InMemoryServerRepository::new();
        let backups = InMemoryBackupRepository::new();
        let server = ServerDescriptor::new("alpha", "terraria", ServerSettings::default());
        servers.save(&server).await.unwrap();

        let dir = storage.server_dir(server.id);
        fs::create_dir_all(dir.join("world")).unwrap();
        fs::write(dir.join("world/level.dat"), b"seed=42").unwrap();

        let engine = BackupEngine::new(
            Arc::new(servers.clone()),
            Arc::new(backups.clone()),
            ServerLocks::new(),
            Arc::new(EventBus::with_default_capacity()),
            storage.clone(),
        );
        Fixture {
            root,
            servers,
            backups,
            engine,
            storage,
            server,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_backup_leaves_partial_archive() {
        let f = fixture().await;
        // Sorted after `world/`, and tar has no entry type for sockets
        let _socket = std::os::unix::net::UnixListener::bind(f.storage.server_dir(f.server.id).join("zz.sock")).unwrap();

        let err = f.engine.create_backup(f.server.id, None, false).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Archive { .. }));

        let records = f.backups.find_by_server(f.server.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, BackupStatus::Failed);
        assert!(records[0].file_path.is_file());
    }

    #[tokio::test]
    async fn test_create_backup_completes_with_size() {
        let f = fixture().await;
        let record = f.engine.create_backup(f.server.id, None, false).await.unwrap();

        assert_eq!(record.status, BackupStatus::Completed);
        assert!(record.size > 0);
        assert!(record.name.starts_with("Manual backup - "));
        assert!(record.file_path.starts_with(f.root.path().join("backups")));
        assert_eq!(fs::metadata(&record.file_path).unwrap().len(), record.size);

        let stored = f.backups.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BackupStatus::Completed);
    }

    #[tokio::test]
    async fn test_detached_backup_acknowledges_in_progress() {
        let f = fixture().await;
        let pending = f
            .engine
            .create_backup_detached(f.server.id, Some("before update".into()), false)
            .await
            .unwrap();
        assert_eq!(pending.acknowledged().status, BackupStatus::InProgress);
        assert_eq!(pending.acknowledged().name, "before update");

        let record = pending.wait().await.unwrap();
        assert_eq!(record.status, BackupStatus::Completed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unwritable_backups_root_marks_failed() {
        let f = fixture().await;
        // A file where the backups directory should be
        fs::write(f.root.path().join("backups"), b"").unwrap();

        let err = f.engine.create_backup(f.server.id, None, false).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Archive { .. }));

        let records = f.engine.list_backups(f.server.id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, BackupStatus::Failed);
    }

    #[tokio::test]
    async fn test_restore_rejects_live_server() {
        let f = fixture().await;
        let record = f.engine.create_backup(f.server.id, None, false).await.unwrap();

        let mut server = f.server.clone();
        server.status = ServerStatus::Running;
        f.servers.save(&server).await.unwrap();
        fs::write(f.storage.server_dir(server.id).join("world/level.dat"), b"seed=7").unwrap();

        let err = f.engine.restore_backup(server.id, record.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ServerBusy { .. }));
        assert_eq!(
            fs::read(f.storage.server_dir(server.id).join("world/level.dat")).unwrap(),
            b"seed=7"
        );
    }

    #[tokio::test]
    async fn test_restore_missing_archive() {
        let f = fixture().await;
        let record = f.engine.create_backup(f.server.id, None, false).await.unwrap();
        fs::remove_file(&record.file_path).unwrap();

        let err = f.engine.restore_backup(f.server.id, record.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::BackupMissing { .. }));
    }

    #[tokio::test]
    async fn test_restore_rejects_other_servers_backup() {
        let f = fixture().await;
        let record = f.engine.create_backup(f.server.id, None, false).await.unwrap();

        let other = ServerDescriptor::new("beta", "terraria", ServerSettings::default());
        f.servers.save(&other).await.unwrap();

        let err = f.engine.restore_backup(other.id, record.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::BackupNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_backup_tolerates_missing_file() {
        let f = fixture().await;
        let record = f.engine.create_backup(f.server.id, None, false).await.unwrap();
        fs::remove_file(&record.file_path).unwrap();

        f.engine.delete_backup(record.id).await.unwrap();
        assert!(f.backups.is_empty());

        let err = f.engine.delete_backup(record.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::BackupNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_backups_newest_first() {
        let f = fixture().await;
        let older = f.engine.create_backup(f.server.id, Some("one".into()), false).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = f.engine.create_backup(f.server.id, Some("two".into()), false).await.unwrap();

        let listed = f.engine.list_backups(f.server.id).await.unwrap();
        assert_eq!(listed.iter().map(|b| b.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
    }
}
