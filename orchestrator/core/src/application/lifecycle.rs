// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Server Lifecycle Application Service
//!
//! Drives the server state machine and the container runtime together:
//! - Domain layer: `ServerDescriptor` transitions, `RuntimeClient` trait
//! - Application layer: `BuildContextAssembler`, `ServerLocks`
//! - Event bus: publishing `ServerEvent`s for observers
//!
//! Every operation first takes the server's lock and checks-and-sets the
//! status while holding it. The terminal state is applied by a spawned task
//! that keeps the lock until it is done, so an abandoned caller never leaves
//! a transition half-applied. Any failure past the status check is persisted
//! as `error` before it is returned.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::build_context::BuildContextAssembler;
use crate::application::pending::PendingTransition;
use crate::application::server_locks::{ServerGuard, ServerLocks};
use crate::domain::config::{RuntimeConfig, StorageConfig};
use crate::domain::error::LifecycleError;
use crate::domain::events::ServerEvent;
use crate::domain::repository::ServerRepository;
use crate::domain::runtime::{
    BindMount, ContainerRef, ContainerSpec, RestartPolicy, RuntimeClient, RuntimeError,
};
use crate::domain::server::{ServerDescriptor, ServerId, ServerSettings, ServerStatus};
use crate::infrastructure::event_bus::EventBus;

const BYTES_PER_MB: i64 = 1024 * 1024;

#[derive(Clone)]
pub struct ServerLifecycleService {
    servers: Arc<dyn ServerRepository>,
    runtime: Arc<dyn RuntimeClient>,
    assembler: Arc<BuildContextAssembler>,
    locks: ServerLocks,
    event_bus: Arc<EventBus>,
    storage: StorageConfig,
    runtime_config: RuntimeConfig,
}

impl ServerLifecycleService {
    pub fn new(
        servers: Arc<dyn ServerRepository>,
        runtime: Arc<dyn RuntimeClient>,
        assembler: Arc<BuildContextAssembler>,
        locks: ServerLocks,
        event_bus: Arc<EventBus>,
        storage: StorageConfig,
        runtime_config: RuntimeConfig,
    ) -> Self {
        Self {
            servers,
            runtime,
            assembler,
            locks,
            event_bus,
            storage,
            runtime_config,
        }
    }

    pub async fn get(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        self.servers
            .find_by_id(server_id)
            .await?
            .ok_or(LifecycleError::ServerNotFound(server_id))
    }

    // ========================================================================
    // Start
    // ========================================================================

    /// Assemble, build, create and run the server's container.
    pub async fn start(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        self.start_detached(server_id).await?.wait().await
    }

    /// Returns once the server is persisted as `starting`.
    pub async fn start_detached(&self, server_id: ServerId) -> Result<PendingTransition, LifecycleError> {
        let guard = self.lock(server_id)?;
        let server = self.get(server_id).await?;
        let server = self.enter_starting(server).await?;

        let service = self.clone();
        let acknowledged = server.clone();
        let handle = tokio::spawn(async move {
            let _guard: ServerGuard = guard;
            service.run_start(server).await
        });
        Ok(PendingTransition::new(acknowledged, handle))
    }

    async fn enter_starting(&self, mut server: ServerDescriptor) -> Result<ServerDescriptor, LifecycleError> {
        server.begin_start()?;
        self.servers.save(&server).await?;

        info!(server_id = %server.id, "Starting server '{}'", server.name);
        self.event_bus.publish_server_event(ServerEvent::ServerStarting {
            server_id: server.id,
            requested_at: Utc::now(),
        });
        Ok(server)
    }

    async fn run_start(&self, mut server: ServerDescriptor) -> Result<ServerDescriptor, LifecycleError> {
        match self.bring_up(&mut server).await {
            Ok(container) => {
                server.mark_running(container.clone());
                self.servers.save(&server).await?;

                info!(server_id = %server.id, container = %container, "Server started");
                self.event_bus.publish_server_event(ServerEvent::ServerStarted {
                    server_id: server.id,
                    container,
                    started_at: Utc::now(),
                });
                Ok(server)
            }
            Err(e) => Err(self.fail(server, "start", e).await),
        }
    }

    /// On failure after create, `server.container_ref` keeps the created
    /// container so the next attempt removes it.
    async fn bring_up(&self, server: &mut ServerDescriptor) -> Result<ContainerRef, LifecycleError> {
        let context = self.assembler.assemble(server.id).await?;

        let tag = server.image_tag(&self.runtime_config.image_prefix);
        debug!(server_id = %server.id, "Building image {}", tag);
        self.runtime
            .build_image(&context, &tag)
            .await
            .map_err(|source| LifecycleError::ImageBuild {
                server_id: server.id,
                source,
            })?;

        self.discard_stale_containers(server).await?;

        let spec = self.container_spec(server, &context.dir);
        let container = self
            .runtime
            .create_container(&spec)
            .await
            .map_err(|source| container_error(server.id, source))?;
        server.container_ref = Some(container.clone());

        self.runtime
            .start_container(&container)
            .await
            .map_err(|source| container_error(server.id, source))?;

        Ok(container)
    }

    /// Remove a container left behind by an earlier failed attempt, either
    /// still referenced by the descriptor or only known by name.
    async fn discard_stale_containers(&self, server: &mut ServerDescriptor) -> Result<(), LifecycleError> {
        let mut stale = Vec::with_capacity(2);
        if let Some(previous) = server.container_ref.clone() {
            stale.push(previous);
        }
        stale.push(ContainerRef::new(server.container_name(&self.runtime_config.image_prefix)));

        for container in &stale {
            match self.runtime.remove_container(container).await {
                Ok(()) => warn!(server_id = %server.id, container = %container, "Removed stale container"),
                Err(RuntimeError::NotFound(_)) => {}
                Err(source) => return Err(container_error(server.id, source)),
            }
        }
        server.container_ref = None;
        Ok(())
    }

    fn container_spec(&self, server: &ServerDescriptor, server_dir: &Path) -> ContainerSpec {
        let name = server.container_name(&self.runtime_config.image_prefix);
        let memory_bytes = i64::try_from(server.memory_mb)
            .unwrap_or(i64::MAX)
            .saturating_mul(BYTES_PER_MB);
        let restart_policy = if server.auto_restart {
            RestartPolicy::UnlessStopped
        } else {
            RestartPolicy::Never
        };

        ContainerSpec {
            hostname: name.clone(),
            name,
            image: server.image_tag(&self.runtime_config.image_prefix),
            port: server.port,
            memory_bytes,
            memory_swap_bytes: memory_bytes.saturating_mul(2),
            cpu_percent: i64::from(server.cpu_percent),
            restart_policy,
            env: vec![
                ("SERVER_PORT".to_string(), server.port.to_string()),
                ("SERVER_MEMORY".to_string(), server.memory_mb.to_string()),
                ("SERVER_CPU".to_string(), server.cpu_percent.to_string()),
                ("GAME_TYPE".to_string(), server.game_type.clone()),
            ],
            mount: BindMount {
                host_path: server_dir.to_path_buf(),
                container_path: self.storage.container_data_path.clone(),
            },
        }
    }

    // ========================================================================
    // Stop
    // ========================================================================

    /// Gracefully stop and remove the container. Stopping a stopped server,
    /// or one whose container is already gone, succeeds.
    pub async fn stop(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        self.stop_detached(server_id).await?.wait().await
    }

    pub async fn stop_detached(&self, server_id: ServerId) -> Result<PendingTransition, LifecycleError> {
        let guard = self.lock(server_id)?;
        let server = self.get(server_id).await?;
        let (server, live) = self.enter_stopping(server).await?;

        let service = self.clone();
        let acknowledged = server.clone();
        let handle = tokio::spawn(async move {
            let _guard: ServerGuard = guard;
            service.run_stop(server, live).await
        });
        Ok(PendingTransition::new(acknowledged, handle))
    }

    async fn enter_stopping(&self, mut server: ServerDescriptor) -> Result<(ServerDescriptor, bool), LifecycleError> {
        let live = server.begin_stop()?;
        if live {
            self.servers.save(&server).await?;

            info!(server_id = %server.id, "Stopping server '{}'", server.name);
            self.event_bus.publish_server_event(ServerEvent::ServerStopping {
                server_id: server.id,
                requested_at: Utc::now(),
            });
        }
        Ok((server, live))
    }

    async fn run_stop(&self, mut server: ServerDescriptor, live: bool) -> Result<ServerDescriptor, LifecycleError> {
        if !live {
            if server.status == ServerStatus::Error {
                // Failed start that never created a container
                self.settle_stopped(&mut server).await?;
            } else {
                debug!(server_id = %server.id, "Server already stopped");
            }
            return Ok(server);
        }

        match self.tear_down(&server).await {
            Ok(()) => {
                self.settle_stopped(&mut server).await?;
                Ok(server)
            }
            Err(e) => Err(self.fail(server, "stop", e).await),
        }
    }

    async fn settle_stopped(&self, server: &mut ServerDescriptor) -> Result<(), LifecycleError> {
        server.mark_stopped();
        self.servers.save(server).await?;

        info!(server_id = %server.id, "Server stopped");
        self.event_bus.publish_server_event(ServerEvent::ServerStopped {
            server_id: server.id,
            stopped_at: Utc::now(),
        });
        Ok(())
    }

    /// A container that is already gone counts as stopped and removed.
    async fn tear_down(&self, server: &ServerDescriptor) -> Result<(), LifecycleError> {
        let container = server
            .container_ref
            .clone()
            .unwrap_or_else(|| ContainerRef::new(server.container_name(&self.runtime_config.image_prefix)));

        match self
            .runtime
            .stop_container(&container, self.runtime_config.stop_grace_period)
            .await
        {
            Ok(()) => debug!(server_id = %server.id, container = %container, "Container stopped"),
            Err(RuntimeError::NotFound(_)) => {
                warn!(server_id = %server.id, container = %container, "Container not found, treating as stopped");
                return Ok(());
            }
            Err(source) => return Err(container_error(server.id, source)),
        }

        match self.runtime.remove_container(&container).await {
            Ok(()) | Err(RuntimeError::NotFound(_)) => Ok(()),
            Err(source) => Err(container_error(server.id, source)),
        }
    }

    // ========================================================================
    // Restart
    // ========================================================================

    /// Stop then start. A failure in either half settles in `error`; the
    /// start half is not retried.
    pub async fn restart(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        self.restart_detached(server_id).await?.wait().await
    }

    pub async fn restart_detached(&self, server_id: ServerId) -> Result<PendingTransition, LifecycleError> {
        let guard = self.lock(server_id)?;
        let server = self.get(server_id).await?;
        if matches!(server.status, ServerStatus::Starting | ServerStatus::Stopping) {
            return Err(LifecycleError::InvalidTransition {
                server_id,
                from: server.status,
                operation: "restart",
            });
        }
        let (server, live) = self.enter_stopping(server).await?;

        let service = self.clone();
        let acknowledged = server.clone();
        let handle = tokio::spawn(async move {
            let _guard: ServerGuard = guard;
            service.run_restart(server, live).await
        });
        Ok(PendingTransition::new(acknowledged, handle))
    }

    async fn run_restart(&self, server: ServerDescriptor, live: bool) -> Result<ServerDescriptor, LifecycleError> {
        let server = self.run_stop(server, live).await?;
        let server = self.enter_starting(server).await?;
        self.run_start(server).await
    }

    // ========================================================================
    // Remove / settings
    // ========================================================================

    /// Stop if still live, then delete the runtime container for good.
    /// Called before the descriptor itself is deleted.
    pub async fn remove(&self, server_id: ServerId) -> Result<ServerDescriptor, LifecycleError> {
        let guard = self.lock(server_id)?;
        let server = self.get(server_id).await?;
        let (server, live) = self.enter_stopping(server).await?;

        let service = self.clone();
        let handle = tokio::spawn(async move {
            let result = service.run_remove(server, live).await;
            if result.is_ok() {
                service.locks.forget(guard);
            }
            result
        });

        handle
            .await
            .map_err(|e| LifecycleError::TaskAborted(e.to_string()))?
    }

    async fn run_remove(&self, server: ServerDescriptor, live: bool) -> Result<ServerDescriptor, LifecycleError> {
        let server = self.run_stop(server, live).await?;

        let by_name = ContainerRef::new(server.container_name(&self.runtime_config.image_prefix));
        match self.runtime.remove_container(&by_name).await {
            Ok(()) | Err(RuntimeError::NotFound(_)) => {}
            Err(source) => return Err(container_error(server.id, source)),
        }

        info!(server_id = %server.id, "Server removed from runtime");
        self.event_bus.publish_server_event(ServerEvent::ServerRemoved {
            server_id: server.id,
            removed_at: Utc::now(),
        });
        Ok(server)
    }

    /// Replace the adjustable settings. Rejected with `ServerBusy` while
    /// the server is live.
    pub async fn update_settings(
        &self,
        server_id: ServerId,
        settings: ServerSettings,
    ) -> Result<ServerDescriptor, LifecycleError> {
        let _guard = self.lock(server_id)?;
        let mut server = self.get(server_id).await?;
        server.update_settings(settings)?;
        self.servers.save(&server).await?;

        debug!(server_id = %server.id, "Server settings updated");
        self.event_bus.publish_server_event(ServerEvent::SettingsUpdated {
            server_id: server.id,
            updated_at: Utc::now(),
        });
        Ok(server)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn lock(&self, server_id: ServerId) -> Result<ServerGuard, LifecycleError> {
        self.locks
            .try_acquire(server_id)
            .ok_or(LifecycleError::OperationInProgress(server_id))
    }

    /// Persist `error`, publish the failure and hand the cause back.
    async fn fail(&self, mut server: ServerDescriptor, operation: &'static str, cause: LifecycleError) -> LifecycleError {
        server.mark_error();
        error!(server_id = %server.id, operation, "Lifecycle operation failed: {}", cause);

        if let Err(e) = self.servers.save(&server).await {
            error!(server_id = %server.id, "Failed to persist error status: {}", e);
        }
        self.event_bus.publish_server_event(ServerEvent::ServerFailed {
            server_id: server.id,
            operation: operation.to_string(),
            reason: cause.to_string(),
            failed_at: Utc::now(),
        });
        cause
    }
}

fn container_error(server_id: ServerId, source: RuntimeError) -> LifecycleError {
    LifecycleError::ContainerOperation { server_id, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::{ScriptKind, ScriptRecord};
    use crate::infrastructure::event_bus::DomainEvent;
    use crate::infrastructure::memory_runtime::{InMemoryRuntime, RuntimeOperation};
    use crate::infrastructure::repositories::{InMemoryScriptRepository, InMemoryServerRepository};
    use std::path::PathBuf;

    struct Fixture {
        _root: tempfile::TempDir,
        servers: InMemoryServerRepository,
        runtime: Arc<InMemoryRuntime>,
        event_bus: Arc<EventBus>,
        service: ServerLifecycleService,
        server: ServerDescriptor,
    }

    async fn fixture(settings: ServerSettings) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            servers_root: root.path().join("servers"),
            backups_root: root.path().join("backups"),
            ..Default::default()
        };
        let servers = InMemoryServerRepository::new();
        let scripts = InMemoryScriptRepository::new();
        let runtime = Arc::new(InMemoryRuntime::new());
        let event_bus = Arc::new(EventBus::with_default_capacity());

        let server = ServerDescriptor::new("alpha", "minecraft", settings);
        servers.save(&server).await.unwrap();
        scripts.insert(ScriptRecord::new(server.id, ScriptKind::Dockerfile, "df", "FROM eclipse-temurin:21\n"));

        let service = ServerLifecycleService::new(
            Arc::new(servers.clone()),
            runtime.clone(),
            Arc::new(BuildContextAssembler::new(Arc::new(scripts), storage.clone())),
            ServerLocks::new(),
            event_bus.clone(),
            storage,
            RuntimeConfig::default(),
        );

        Fixture {
            _root: root,
            servers,
            runtime,
            event_bus,
            service,
            server,
        }
    }

    #[tokio::test]
    async fn test_container_spec_maps_settings() {
        let settings = ServerSettings {
            port: 27015,
            memory_mb: 2048,
            cpu_percent: 50,
            auto_restart: true,
            ..Default::default()
        };
        let f = fixture(settings).await;
        let spec = f.service.container_spec(&f.server, &PathBuf::from("/srv/alpha"));

        assert_eq!(spec.name, format!("gameserver-{}", f.server.id));
        assert_eq!(spec.hostname, spec.name);
        assert_eq!(spec.image, format!("gameserver-{}:latest", f.server.id));
        assert_eq!(spec.port_key(), "27015/tcp");
        assert_eq!(spec.memory_bytes, 2048 * 1024 * 1024);
        assert_eq!(spec.memory_swap_bytes, 2 * 2048 * 1024 * 1024);
        assert_eq!(spec.cpu_percent, 50);
        assert_eq!(spec.restart_policy, RestartPolicy::UnlessStopped);
        assert!(spec.env_strings().contains(&"GAME_TYPE=minecraft".to_string()));
        assert!(spec.env_strings().contains(&"SERVER_MEMORY=2048".to_string()));
        assert_eq!(spec.mount.to_bind_string(), "/srv/alpha:/data");
    }

    #[tokio::test]
    async fn test_restart_policy_never_without_auto_restart() {
        let f = fixture(ServerSettings::default()).await;
        let spec = f.service.container_spec(&f.server, &PathBuf::from("/srv/alpha"));
        assert_eq!(spec.restart_policy, RestartPolicy::Never);
    }

    #[tokio::test]
    async fn test_start_then_stop() {
        let f = fixture(ServerSettings::default()).await;
        let mut events = f.event_bus.subscribe_server(f.server.id);

        let running = f.service.start(f.server.id).await.unwrap();
        assert_eq!(running.status, ServerStatus::Running);
        let container = running.container_ref.clone().unwrap();
        assert!(f.runtime.container(&container).unwrap().running);

        let stopped = f.service.stop(f.server.id).await.unwrap();
        assert_eq!(stopped.status, ServerStatus::Stopped);
        assert!(stopped.container_ref.is_none());
        assert!(stopped.last_stopped.is_some());
        assert!(f.runtime.containers().is_empty());

        let first = events.recv().await.unwrap();
        assert!(matches!(first, DomainEvent::Server(ServerEvent::ServerStarting { .. })));
        let second = events.recv().await.unwrap();
        assert!(matches!(second, DomainEvent::Server(ServerEvent::ServerStarted { .. })));
    }

    #[tokio::test]
    async fn test_start_detached_acknowledges_starting() {
        let f = fixture(ServerSettings::default()).await;
        f.runtime.set_build_delay(std::time::Duration::from_millis(50));

        let pending = f.service.start_detached(f.server.id).await.unwrap();
        assert_eq!(pending.acknowledged().status, ServerStatus::Starting);
        assert_eq!(
            f.servers.find_by_id(f.server.id).await.unwrap().unwrap().status,
            ServerStatus::Starting
        );

        let err = f.service.stop(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::OperationInProgress(_)));

        let running = pending.wait().await.unwrap();
        assert_eq!(running.status, ServerStatus::Running);
    }

    #[tokio::test]
    async fn test_build_failure_persists_error() {
        let f = fixture(ServerSettings::default()).await;
        f.runtime.fail_next(RuntimeOperation::Build);

        let err = f.service.start(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ImageBuild { .. }));

        let stored = f.servers.find_by_id(f.server.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ServerStatus::Error);
        assert!(stored.container_ref.is_none());
        assert_eq!(f.runtime.created_total(), 0);
    }

    #[tokio::test]
    async fn test_failed_container_start_is_cleaned_up_on_retry() {
        let f = fixture(ServerSettings::default()).await;
        f.runtime.fail_next(RuntimeOperation::Start);

        let err = f.service.start(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ContainerOperation { .. }));
        let stored = f.servers.find_by_id(f.server.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ServerStatus::Error);
        assert!(stored.container_ref.is_some());

        let running = f.service.start(f.server.id).await.unwrap();
        assert_eq!(running.status, ServerStatus::Running);
        assert_eq!(f.runtime.containers().len(), 1);
        assert_eq!(f.runtime.created_total(), 2);
    }

    #[tokio::test]
    async fn test_stop_on_error_without_container_settles_stopped() {
        let f = fixture(ServerSettings::default()).await;
        f.runtime.fail_next(RuntimeOperation::Build);
        f.service.start(f.server.id).await.unwrap_err();

        let stopped = f.service.stop(f.server.id).await.unwrap();
        assert_eq!(stopped.status, ServerStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_failure_persists_error() {
        let f = fixture(ServerSettings::default()).await;
        f.service.start(f.server.id).await.unwrap();
        f.runtime.fail_next(RuntimeOperation::Stop);

        let err = f.service.stop(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ContainerOperation { .. }));
        let stored = f.servers.find_by_id(f.server.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ServerStatus::Error);
        assert!(stored.container_ref.is_some());

        // The error state still owns a container, so a retry stops it
        let stopped = f.service.stop(f.server.id).await.unwrap();
        assert_eq!(stopped.status, ServerStatus::Stopped);
        assert_eq!(f.runtime.running_count(), 0);
    }

    #[tokio::test]
    async fn test_restart_replaces_container() {
        let f = fixture(ServerSettings::default()).await;
        let first = f.service.start(f.server.id).await.unwrap().container_ref.unwrap();

        let restarted = f.service.restart(f.server.id).await.unwrap();
        assert_eq!(restarted.status, ServerStatus::Running);
        assert_ne!(restarted.container_ref.unwrap(), first);
        assert_eq!(f.runtime.containers().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_with_failing_start_settles_in_error() {
        let f = fixture(ServerSettings::default()).await;
        f.service.start(f.server.id).await.unwrap();
        f.runtime.fail_next(RuntimeOperation::Create);

        let err = f.service.restart(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ContainerOperation { .. }));
        let stored = f.servers.find_by_id(f.server.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ServerStatus::Error);
        assert_eq!(f.runtime.running_count(), 0);
    }

    #[tokio::test]
    async fn test_restart_with_failing_stop_does_not_start() {
        let f = fixture(ServerSettings::default()).await;
        let running = f.service.start(f.server.id).await.unwrap();
        f.runtime.fail_next(RuntimeOperation::Stop);

        let err = f.service.restart(f.server.id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ContainerOperation { .. }));

        let stored = f.servers.find_by_id(f.server.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ServerStatus::Error);
        assert_eq!(stored.container_ref, running.container_ref);
        assert_eq!(f.runtime.created_total(), 1);
        assert_eq!(f.runtime.running_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_stops_live_server() {
        let f = fixture(ServerSettings::default()).await;
        f.service.start(f.server.id).await.unwrap();

        let removed = f.service.remove(f.server.id).await.unwrap();
        assert_eq!(removed.status, ServerStatus::Stopped);
        assert!(f.runtime.containers().is_empty());

        // Nothing left to find is not an error
        f.service.remove(f.server.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_settings_guard() {
        let f = fixture(ServerSettings::default()).await;
        let settings = ServerSettings {
            port: 7777,
            ..Default::default()
        };

        let updated = f.service.update_settings(f.server.id, settings.clone()).await.unwrap();
        assert_eq!(updated.port, 7777);

        f.service.start(f.server.id).await.unwrap();
        let err = f.service.update_settings(f.server.id, settings).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ServerBusy { status: ServerStatus::Running, .. }));
    }

    #[tokio::test]
    async fn test_unknown_server() {
        let f = fixture(ServerSettings::default()).await;
        let err = f.service.start(ServerId::new()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::ServerNotFound(_)));
    }
}
