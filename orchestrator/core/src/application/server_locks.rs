// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Per-server mutual exclusion.
//!
//! There is no global lock: each server id maps to its own async mutex, so
//! operations on different servers never wait on each other. Whoever holds a
//! server's guard is the only writer of its status and of its directory.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::server::ServerId;

#[derive(Clone, Default)]
pub struct ServerLocks {
    locks: Arc<DashMap<ServerId, Arc<Mutex<()>>>>,
}

/// Held for the full duration of one operation on one server.
pub struct ServerGuard {
    server_id: ServerId,
    _guard: OwnedMutexGuard<()>,
}

impl ServerGuard {
    pub fn server_id(&self) -> ServerId {
        self.server_id
    }
}

impl ServerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, server_id: ServerId) -> Arc<Mutex<()>> {
        self.locks.entry(server_id).or_default().clone()
    }

    /// Non-blocking; `None` when another operation holds the server.
    pub fn try_acquire(&self, server_id: ServerId) -> Option<ServerGuard> {
        self.slot(server_id)
            .try_lock_owned()
            .ok()
            .map(|guard| ServerGuard { server_id, _guard: guard })
    }

    pub async fn acquire(&self, server_id: ServerId) -> ServerGuard {
        let guard = self.slot(server_id).lock_owned().await;
        ServerGuard { server_id, _guard: guard }
    }

    /// Drop the slot of a deleted server, releasing `guard`.
    ///
    /// The slot survives while any other task still references its mutex
    /// (a holder that raced in, or a waiter in `acquire`), so those tasks and
    /// later callers keep contending on the same lock.
    pub fn forget(&self, guard: ServerGuard) {
        let held = OwnedMutexGuard::mutex(&guard._guard).clone();
        // Map entry, our guard and `held`
        self.locks
            .remove_if(&guard.server_id, |_, slot| Arc::ptr_eq(slot, &held) && Arc::strong_count(slot) == 3);
        drop(guard);
    }
}
