// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod archive;
pub mod event_bus;
pub mod memory_runtime;
pub mod repositories;
pub mod runtime;
pub mod telemetry;

pub use event_bus::{DomainEvent, EventBus};
pub use memory_runtime::{InMemoryRuntime, RuntimeOperation};
pub use runtime::DockerRuntime;
