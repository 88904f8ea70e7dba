// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! One-shot resource sampling for running servers. Nothing is cached: every
//! call polls the runtime once.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::domain::error::LifecycleError;
use crate::domain::repository::ServerRepository;
use crate::domain::runtime::{RuntimeClient, RuntimeError};
use crate::domain::server::{ServerId, ServerStatus};
use crate::domain::stats::StatsSnapshot;

pub struct StatsCollector {
    servers: Arc<dyn ServerRepository>,
    runtime: Arc<dyn RuntimeClient>,
}

impl StatsCollector {
    pub fn new(servers: Arc<dyn ServerRepository>, runtime: Arc<dyn RuntimeClient>) -> Self {
        Self { servers, runtime }
    }

    /// Fails with `ServerNotRunning` unless the server is `running` and its
    /// container still exists.
    pub async fn collect(&self, server_id: ServerId) -> Result<StatsSnapshot, LifecycleError> {
        let server = self
            .servers
            .find_by_id(server_id)
            .await?
            .ok_or(LifecycleError::ServerNotFound(server_id))?;

        let container = match (&server.status, &server.container_ref) {
            (ServerStatus::Running, Some(container)) => container.clone(),
            _ => return Err(LifecycleError::ServerNotRunning(server_id)),
        };

        let raw = match self.runtime.container_stats(&container).await {
            Ok(raw) => raw,
            Err(RuntimeError::NotFound(_)) => {
                debug!(server_id = %server_id, container = %container, "Container vanished before stats poll");
                return Err(LifecycleError::ServerNotRunning(server_id));
            }
            Err(source) => return Err(LifecycleError::ContainerOperation { server_id, source }),
        };

        Ok(StatsSnapshot::from_raw(&raw, Utc::now()))
    }
}
