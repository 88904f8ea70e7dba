// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Backup Aggregate
//!
//! A `BackupRecord` is created `in_progress` before any I/O happens so that
//! a crash or failure mid-archive stays observable. It moves to `completed`
//! with the final byte size, or to `failed`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::server::{ServerDescriptor, ServerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackupId(pub Uuid);

impl BackupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BackupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub id: BackupId,
    pub server_id: ServerId,
    pub name: String,
    pub file_path: PathBuf,
    pub size: u64,
    pub status: BackupStatus,
    pub is_automatic: bool,
    pub created_at: DateTime<Utc>,
}

impl BackupRecord {
    /// New in-progress record whose archive lands under `backups_root`.
    pub fn begin(
        server: &ServerDescriptor,
        backups_root: &Path,
        label: Option<String>,
        is_automatic: bool,
    ) -> Self {
        let id = BackupId::new();
        let created_at = Utc::now();
        let name = label.unwrap_or_else(|| default_label(is_automatic, created_at));
        let file_path = backups_root.join(archive_file_name(&server.name, created_at, id));
        Self {
            id,
            server_id: server.id,
            name,
            file_path,
            size: 0,
            status: BackupStatus::InProgress,
            is_automatic,
            created_at,
        }
    }

    pub fn complete(&mut self, size: u64) {
        self.size = size;
        self.status = BackupStatus::Completed;
    }

    pub fn fail(&mut self) {
        self.status = BackupStatus::Failed;
    }

    /// Newest first; ties broken by id so ordering is deterministic.
    pub fn newest_first(a: &BackupRecord, b: &BackupRecord) -> Ordering {
        b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
    }
}

fn default_label(is_automatic: bool, at: DateTime<Utc>) -> String {
    let kind = if is_automatic { "Automatic" } else { "Manual" };
    format!("{} backup - {}", kind, at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// `{serverName}-{timestamp}-{backupId}.tar.gz`, with the timestamp's `:` and
/// `.` replaced so the name is portable. The server name is reduced to a
/// single path component.
pub fn archive_file_name(server_name: &str, at: DateTime<Utc>, id: BackupId) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}-{}-{}.tar.gz", file_safe_name(server_name), timestamp, id)
}

/// Separators, NULs and dots opening a segment become `-`.
fn file_safe_name(name: &str) -> String {
    let mut segment_start = true;
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => {
                segment_start = true;
                '-'
            }
            '.' if segment_start => '-',
            other => {
                segment_start = false;
                other
            }
        })
        .collect()
}
