// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Process-local container runtime.
//!
//! Mirrors the Docker adapter's observable behavior (404-style `NotFound`,
//! name conflicts, builds needing a `Dockerfile`) without a daemon. Used for
//! development hosts without Docker and throughout the test suite, where
//! one-shot failures can be injected per operation.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use crate::domain::runtime::{
    BuildContext, ContainerRef, ContainerSpec, RawContainerStats, RuntimeClient, RuntimeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeOperation {
    Build,
    Create,
    Start,
    Stop,
    Remove,
    Stats,
}

#[derive(Debug, Clone)]
pub struct ContainerSnapshot {
    pub container: ContainerRef,
    pub spec: ContainerSpec,
    pub running: bool,
}

#[derive(Default)]
struct RuntimeState {
    images: BTreeSet<String>,
    containers: HashMap<String, ContainerSnapshot>,
    next_id: u64,
    created_total: usize,
    pending_failures: HashSet<RuntimeOperation>,
    stats: RawContainerStats,
    build_delay: Option<Duration>,
}

impl RuntimeState {
    fn take_failure(&mut self, op: RuntimeOperation) -> bool {
        self.pending_failures.remove(&op)
    }

    /// Docker resolves both ids and names.
    fn resolve(&self, container: &ContainerRef) -> Option<String> {
        if self.containers.contains_key(container.as_str()) {
            return Some(container.as_str().to_string());
        }
        self.containers
            .values()
            .find(|c| c.spec.name == container.as_str())
            .map(|c| c.container.as_str().to_string())
    }
}

#[derive(Default)]
pub struct InMemoryRuntime {
    state: Mutex<RuntimeState>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail.
    pub fn fail_next(&self, op: RuntimeOperation) {
        self.state.lock().pending_failures.insert(op);
    }

    pub fn set_stats(&self, stats: RawContainerStats) {
        self.state.lock().stats = stats;
    }

    /// Slow builds down so concurrent callers overlap.
    pub fn set_build_delay(&self, delay: Duration) {
        self.state.lock().build_delay = Some(delay);
    }

    /// Drop a container behind the core's back.
    pub fn vanish(&self, container: &ContainerRef) {
        let mut state = self.state.lock();
        if let Some(id) = state.resolve(container) {
            state.containers.remove(&id);
        }
    }

    pub fn containers(&self) -> Vec<ContainerSnapshot> {
        self.state.lock().containers.values().cloned().collect()
    }

    pub fn container(&self, container: &ContainerRef) -> Option<ContainerSnapshot> {
        let state = self.state.lock();
        state.resolve(container).and_then(|id| state.containers.get(&id).cloned())
    }

    pub fn running_count(&self) -> usize {
        self.state.lock().containers.values().filter(|c| c.running).count()
    }

    /// Containers ever created, including removed ones.
    pub fn created_total(&self) -> usize {
        self.state.lock().created_total
    }

    pub fn images(&self) -> Vec<String> {
        self.state.lock().images.iter().cloned().collect()
    }
}

#[async_trait]
impl RuntimeClient for InMemoryRuntime {
    async fn build_image(&self, context: &BuildContext, tag: &str) -> Result<(), RuntimeError> {
        let delay = self.state.lock().build_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Build) {
            return Err(RuntimeError::BuildFailed {
                tag: tag.to_string(),
                log: "Step 1/1 : RUN false\nThe command '/bin/sh -c false' returned a non-zero code: 1".to_string(),
            });
        }
        if !context.contains("Dockerfile") {
            return Err(RuntimeError::BuildFailed {
                tag: tag.to_string(),
                log: "Cannot locate specified Dockerfile: Dockerfile".to_string(),
            });
        }
        state.images.insert(tag.to_string());
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerRef, RuntimeError> {
        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Create) {
            return Err(RuntimeError::operation("create", "injected create failure"));
        }
        if !state.images.contains(&spec.image) {
            return Err(RuntimeError::operation("create", format!("No such image: {}", spec.image)));
        }
        if state.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(RuntimeError::operation(
                "create",
                format!("Conflict. The container name \"/{}\" is already in use", spec.name),
            ));
        }

        state.next_id += 1;
        state.created_total += 1;
        let container = ContainerRef::new(format!("{:012x}", state.next_id));
        state.containers.insert(
            container.as_str().to_string(),
            ContainerSnapshot {
                container: container.clone(),
                spec: spec.clone(),
                running: false,
            },
        );
        Ok(container)
    }

    async fn start_container(&self, container: &ContainerRef) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Start) {
            return Err(RuntimeError::operation("start", "injected start failure"));
        }
        let id = state
            .resolve(container)
            .ok_or_else(|| RuntimeError::NotFound(container.to_string()))?;
        if let Some(c) = state.containers.get_mut(&id) {
            c.running = true;
        }
        Ok(())
    }

    async fn stop_container(&self, container: &ContainerRef, _grace: Duration) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Stop) {
            return Err(RuntimeError::operation("stop", "injected stop failure"));
        }
        let id = state
            .resolve(container)
            .ok_or_else(|| RuntimeError::NotFound(container.to_string()))?;
        if let Some(c) = state.containers.get_mut(&id) {
            c.running = false;
        }
        Ok(())
    }

    async fn remove_container(&self, container: &ContainerRef) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Remove) {
            return Err(RuntimeError::operation("remove", "injected remove failure"));
        }
        let id = state
            .resolve(container)
            .ok_or_else(|| RuntimeError::NotFound(container.to_string()))?;
        state.containers.remove(&id);
        Ok(())
    }

    async fn container_stats(&self, container: &ContainerRef) -> Result<RawContainerStats, RuntimeError> {
        let mut state = self.state.lock();
        if state.take_failure(RuntimeOperation::Stats) {
            return Err(RuntimeError::operation("stats", "injected stats failure"));
        }
        let id = state
            .resolve(container)
            .ok_or_else(|| RuntimeError::NotFound(container.to_string()))?;
        match state.containers.get(&id) {
            Some(c) if c.running => Ok(state.stats.clone()),
            _ => Err(RuntimeError::operation("stats", format!("container {} is not running", container))),
        }
    }
}
