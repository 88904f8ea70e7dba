// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Records, value objects and the seams (runtime, repositories) the
//! application services are wired against.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Server/backup/script records, lifecycle state machine, error taxonomy

pub mod backup;
pub mod config;
pub mod error;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod script;
pub mod server;
pub mod stats;
