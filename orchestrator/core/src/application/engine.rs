// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Wires the services together from an `EngineConfigManifest`.
//!
//! The embedding application supplies the three repositories; the engine
//! owns the runtime client, the lock registry and the event bus, and shares
//! them between the services.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::application::backup::BackupEngine;
use crate::application::backup_scheduler::BackupScheduler;
use crate::application::build_context::BuildContextAssembler;
use crate::application::lifecycle::ServerLifecycleService;
use crate::application::server_locks::ServerLocks;
use crate::application::stats::StatsCollector;
use crate::domain::config::EngineConfigManifest;
use crate::domain::repository::{BackupRepository, ScriptRepository, ServerRepository};
use crate::domain::runtime::RuntimeClient;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::runtime::DockerRuntime;

pub struct Engine {
    config: EngineConfigManifest,
    event_bus: Arc<EventBus>,
    lifecycle: ServerLifecycleService,
    stats: StatsCollector,
    backups: BackupEngine,
    scheduler: BackupScheduler,
}

impl Engine {
    pub fn new(
        config: EngineConfigManifest,
        servers: Arc<dyn ServerRepository>,
        scripts: Arc<dyn ScriptRepository>,
        backups: Arc<dyn BackupRepository>,
        runtime: Arc<dyn RuntimeClient>,
    ) -> Self {
        let spec = &config.spec;
        let locks = ServerLocks::new();
        let event_bus = Arc::new(EventBus::with_default_capacity());

        let assembler = Arc::new(BuildContextAssembler::new(scripts, spec.storage.clone()));
        let lifecycle = ServerLifecycleService::new(
            servers.clone(),
            runtime.clone(),
            assembler,
            locks.clone(),
            event_bus.clone(),
            spec.storage.clone(),
            spec.runtime.clone(),
        );
        let stats = StatsCollector::new(servers.clone(), runtime);
        let backup_engine = BackupEngine::new(
            servers.clone(),
            backups,
            locks,
            event_bus.clone(),
            spec.storage.clone(),
        );
        let scheduler = BackupScheduler::new(
            servers,
            backup_engine.clone(),
            event_bus.clone(),
            spec.backups.clone(),
        );

        Self {
            config,
            event_bus,
            lifecycle,
            stats,
            backups: backup_engine,
            scheduler,
        }
    }

    /// Connect to the Docker daemon named by `spec.runtime` and verify it
    /// answers before wiring the services.
    pub async fn with_docker(
        config: EngineConfigManifest,
        servers: Arc<dyn ServerRepository>,
        scripts: Arc<dyn ScriptRepository>,
        backups: Arc<dyn BackupRepository>,
    ) -> anyhow::Result<Self> {
        let runtime = DockerRuntime::connect(&config.spec.runtime)?;
        runtime
            .healthcheck()
            .await
            .context("Docker daemon is not reachable")?;
        info!("Connected to Docker daemon");

        Ok(Self::new(config, servers, scripts, backups, Arc::new(runtime)))
    }

    pub fn config(&self) -> &EngineConfigManifest {
        &self.config
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn lifecycle(&self) -> &ServerLifecycleService {
        &self.lifecycle
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    pub fn backups(&self) -> &BackupEngine {
        &self.backups
    }

    pub fn scheduler(&self) -> &BackupScheduler {
        &self.scheduler
    }
}
