// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Gamehost Orchestrator Core
//!
//! Container lifecycle and backup orchestration for game servers.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Turn server descriptors into running containers, sample
//!   their resource use, and archive/restore/prune their data directories
//! - **Entry point:** `application::Engine`, or the individual services

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
