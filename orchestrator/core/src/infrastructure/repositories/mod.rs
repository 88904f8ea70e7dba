// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! In-memory implementations of the domain repository traits. The durable
//! store belongs to the embedding application; these adapters let the core
//! run standalone and back the test suite.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Store and retrieve server, script and backup records
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::backup::{BackupId, BackupRecord};
use crate::domain::repository::{BackupRepository, RepositoryError, ScriptRepository, ServerRepository};
use crate::domain::script::{ScriptKind, ScriptRecord};
use crate::domain::server::{ServerDescriptor, ServerId};

#[derive(Clone, Default)]
pub struct InMemoryServerRepository {
    servers: Arc<RwLock<HashMap<ServerId, ServerDescriptor>>>,
}

impl InMemoryServerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&self, id: ServerId) -> Option<ServerDescriptor> {
        self.servers.write().remove(&id)
    }
}

#[async_trait]
impl ServerRepository for InMemoryServerRepository {
    async fn save(&self, server: &ServerDescriptor) -> Result<(), RepositoryError> {
        self.servers.write().insert(server.id, server.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ServerId) -> Result<Option<ServerDescriptor>, RepositoryError> {
        Ok(self.servers.read().get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<ServerDescriptor>, RepositoryError> {
        let mut servers: Vec<ServerDescriptor> = self.servers.read().values().cloned().collect();
        servers.sort_by_key(|s| s.id);
        Ok(servers)
    }

    async fn list_backup_enabled(&self) -> Result<Vec<ServerDescriptor>, RepositoryError> {
        let mut servers: Vec<ServerDescriptor> = self
            .servers
            .read()
            .values()
            .filter(|s| s.backup_enabled)
            .cloned()
            .collect();
        servers.sort_by_key(|s| s.id);
        Ok(servers)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryScriptRepository {
    scripts: Arc<RwLock<Vec<ScriptRecord>>>,
}

impl InMemoryScriptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, script: ScriptRecord) {
        self.scripts.write().push(script);
    }
}

#[async_trait]
impl ScriptRepository for InMemoryScriptRepository {
    async fn find_active(&self, server_id: ServerId, kind: ScriptKind) -> Result<Option<ScriptRecord>, RepositoryError> {
        let scripts = self.scripts.read();
        Ok(scripts
            .iter()
            .filter(|s| s.server_id == server_id && s.kind == kind)
            .max_by_key(|s| s.updated_at)
            .cloned())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBackupRepository {
    backups: Arc<RwLock<HashMap<BackupId, BackupRecord>>>,
}

impl InMemoryBackupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.backups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backups.read().is_empty()
    }
}

#[async_trait]
impl BackupRepository for InMemoryBackupRepository {
    async fn save(&self, backup: &BackupRecord) -> Result<(), RepositoryError> {
        self.backups.write().insert(backup.id, backup.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: BackupId) -> Result<Option<BackupRecord>, RepositoryError> {
        Ok(self.backups.read().get(&id).cloned())
    }

    async fn find_by_server(&self, server_id: ServerId) -> Result<Vec<BackupRecord>, RepositoryError> {
        Ok(self
            .backups
            .read()
            .values()
            .filter(|b| b.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: BackupId) -> Result<(), RepositoryError> {
        self.backups
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("backup {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::ServerSettings;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_find_active_returns_most_recent() {
        let repo = InMemoryScriptRepository::new();
        let server_id = ServerId::new();

        let mut old = ScriptRecord::new(server_id, ScriptKind::Dockerfile, "old", "FROM alpine:3.18");
        old.updated_at = Utc::now() - Duration::minutes(5);
        let new = ScriptRecord::new(server_id, ScriptKind::Dockerfile, "new", "FROM alpine:3.20");
        repo.insert(old);
        repo.insert(new.clone());
        repo.insert(ScriptRecord::new(ServerId::new(), ScriptKind::Dockerfile, "other", "FROM debian"));

        let active = repo.find_active(server_id, ScriptKind::Dockerfile).await.unwrap();
        assert_eq!(active.unwrap().id, new.id);
        assert!(repo.find_active(server_id, ScriptKind::Startup).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_backup_enabled_filters() {
        let repo = InMemoryServerRepository::new();
        let enabled = ServerDescriptor::new("a", "rust", ServerSettings::default());
        let disabled = ServerDescriptor::new(
            "b",
            "rust",
            ServerSettings { backup_enabled: false, ..Default::default() },
        );
        repo.save(&enabled).await.unwrap();
        repo.save(&disabled).await.unwrap();

        let listed = repo.list_backup_enabled().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, enabled.id);
        assert_eq!(repo.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_backup_is_not_found() {
        let repo = InMemoryBackupRepository::new();
        let err = repo.delete(BackupId::new()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
