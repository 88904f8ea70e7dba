// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::server::ServerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(pub Uuid);

impl ScriptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScriptId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kinds of script that take part in a build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Dockerfile,
    Config,
    Startup,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 3] = [ScriptKind::Dockerfile, ScriptKind::Config, ScriptKind::Startup];

    /// Relative filename inside the build context. The image builder expects
    /// these exact names.
    pub fn file_name(&self) -> &'static str {
        match self {
            ScriptKind::Dockerfile => "Dockerfile",
            ScriptKind::Config => "server.config",
            ScriptKind::Startup => "start.sh",
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, ScriptKind::Startup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub server_id: ServerId,
    pub name: String,
    pub kind: ScriptKind,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl ScriptRecord {
    pub fn new(server_id: ServerId, kind: ScriptKind, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: ScriptId::new(),
            server_id,
            name: name.into(),
            kind,
            content: content.into(),
            updated_at: Utc::now(),
        }
    }
}
