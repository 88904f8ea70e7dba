// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Unattended backup sweeps.
//!
//! One call backs up every backup-enabled server once. Timing (the servers'
//! `backup_schedule`) belongs to whoever calls `run_sweep`. A failing server
//! is recorded in the report and never stops the rest of the sweep.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

use crate::application::backup::{BackupEngine, RetentionReport};
use crate::domain::backup::BackupRecord;
use crate::domain::config::BackupConfig;
use crate::domain::error::LifecycleError;
use crate::domain::events::BackupEvent;
use crate::domain::repository::ServerRepository;
use crate::domain::server::ServerId;
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug)]
pub struct SweepFailure {
    pub server_id: ServerId,
    pub error: LifecycleError,
}

#[derive(Debug, Default)]
pub struct SweepReport {
    pub created: Vec<BackupRecord>,
    pub failures: Vec<SweepFailure>,
}

pub struct BackupScheduler {
    servers: Arc<dyn ServerRepository>,
    engine: BackupEngine,
    event_bus: Arc<EventBus>,
    config: BackupConfig,
}

impl BackupScheduler {
    pub fn new(
        servers: Arc<dyn ServerRepository>,
        engine: BackupEngine,
        event_bus: Arc<EventBus>,
        config: BackupConfig,
    ) -> Self {
        Self {
            servers,
            engine,
            event_bus,
            config,
        }
    }

    /// Create one automatic backup per backup-enabled server, up to
    /// `sweep_concurrency` at a time. Only failing to list servers is fatal.
    pub async fn run_sweep(&self) -> Result<SweepReport, LifecycleError> {
        let servers = self.servers.list_backup_enabled().await?;
        info!("Found {} servers with backup enabled", servers.len());

        let outcomes: Vec<(ServerId, Result<BackupRecord, LifecycleError>)> = stream::iter(servers)
            .map(|server| async move {
                let result = self.engine.create_backup(server.id, None, true).await;
                (server.id, result)
            })
            .buffer_unordered(self.config.sweep_concurrency.max(1))
            .collect()
            .await;

        let mut report = SweepReport::default();
        for (server_id, result) in outcomes {
            match result {
                Ok(record) => report.created.push(record),
                Err(error) => {
                    error!(server_id = %server_id, "Scheduled backup failed: {}", error);
                    report.failures.push(SweepFailure { server_id, error });
                }
            }
        }

        info!(
            "Scheduled backups completed: {} created, {} failed",
            report.created.len(),
            report.failures.len()
        );
        self.event_bus.publish_backup_event(BackupEvent::SweepCompleted {
            created: report.created.len(),
            failed: report.failures.len(),
            completed_at: Utc::now(),
        });
        Ok(report)
    }

    /// Retention pass with the configured `max_per_server`.
    pub async fn run_cleanup(&self) -> Result<RetentionReport, LifecycleError> {
        self.engine.cleanup(self.config.max_per_server).await
    }
}
