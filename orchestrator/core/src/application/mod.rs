// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod backup;
pub mod backup_scheduler;
pub mod build_context;
pub mod engine;
pub mod lifecycle;
pub mod pending;
pub mod server_locks;
pub mod stats;

// Re-export services for convenience
pub use backup::{BackupEngine, RetentionReport};
pub use backup_scheduler::{BackupScheduler, SweepFailure, SweepReport};
pub use build_context::BuildContextAssembler;
pub use engine::Engine;
pub use lifecycle::ServerLifecycleService;
pub use pending::{PendingBackup, PendingOperation, PendingTransition};
pub use server_locks::{ServerGuard, ServerLocks};
pub use stats::StatsCollector;
