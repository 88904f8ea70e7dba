// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Container runtime seam.
//!
//! `RuntimeClient` is the capability handed to the lifecycle service and the
//! stats collector. The Docker adapter lives in
//! `crate::infrastructure::runtime`; `crate::infrastructure::memory_runtime`
//! provides a process-local fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Opaque runtime handle for a live container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef(pub String);

impl ContainerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Always restart unless explicitly stopped.
    UnlessStopped,
    Never,
}

/// Host directory bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    pub host_path: PathBuf,
    pub container_path: String,
}

impl BindMount {
    pub fn to_bind_string(&self) -> String {
        format!("{}:{}", self.host_path.display(), self.container_path)
    }
}

/// Directory plus the files in it that form an image build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    pub dir: PathBuf,
    /// Relative names, e.g. `Dockerfile`, `start.sh`
    pub files: Vec<String>,
}

impl BuildContext {
    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }
}

/// Everything the runtime needs to create a game-server container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub hostname: String,
    pub port: u16,
    pub memory_bytes: i64,
    pub memory_swap_bytes: i64,
    pub cpu_percent: i64,
    pub restart_policy: RestartPolicy,
    pub env: Vec<(String, String)>,
    pub mount: BindMount,
}

impl ContainerSpec {
    pub fn env_strings(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{}={}", k, v)).collect()
    }

    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.port)
    }
}

/// One point-in-time poll as reported by the runtime. Counters are
/// cumulative; `precpu_*` are the runtime's previous readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContainerStats {
    pub cpu_total_usage: u64,
    pub precpu_total_usage: u64,
    pub system_cpu_usage: u64,
    pub presystem_cpu_usage: u64,
    pub online_cpus: u32,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub networks: Vec<InterfaceCounters>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Container not found: {0}")]
    NotFound(String),
    #[error("Image build for {tag} failed: {log}")]
    BuildFailed { tag: String, log: String },
    #[error("Container {operation} failed: {message}")]
    OperationFailed { operation: &'static str, message: String },
    #[error("Cannot reach container runtime: {0}")]
    ConnectionFailed(String),
}

impl RuntimeError {
    pub fn operation(operation: &'static str, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Build an image from the context's files, blocking until the runtime
    /// reports completion.
    async fn build_image(&self, context: &BuildContext, tag: &str) -> Result<(), RuntimeError>;

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerRef, RuntimeError>;

    async fn start_container(&self, container: &ContainerRef) -> Result<(), RuntimeError>;

    /// Graceful stop; the runtime force-kills after `grace`.
    /// Returns `RuntimeError::NotFound` when the container is gone.
    async fn stop_container(&self, container: &ContainerRef, grace: Duration) -> Result<(), RuntimeError>;

    /// Returns `RuntimeError::NotFound` when the container is gone.
    async fn remove_container(&self, container: &ContainerRef) -> Result<(), RuntimeError>;

    async fn container_stats(&self, container: &ContainerRef) -> Result<RawContainerStats, RuntimeError>;
}
