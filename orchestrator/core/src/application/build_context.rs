// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Materializes a server's scripts into its directory so the image builder
//! can consume them.
//!
//! Assembly is not transactional: a failed write leaves the files written
//! before it in place. Every file is fully overwritten on each call, so
//! re-running is idempotent. The directory is never cleared here; it also
//! holds the live game data.

use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::domain::config::StorageConfig;
use crate::domain::error::LifecycleError;
use crate::domain::repository::ScriptRepository;
use crate::domain::runtime::BuildContext;
use crate::domain::script::ScriptKind;
use crate::domain::server::ServerId;

pub struct BuildContextAssembler {
    scripts: Arc<dyn ScriptRepository>,
    storage: StorageConfig,
}

impl BuildContextAssembler {
    pub fn new(scripts: Arc<dyn ScriptRepository>, storage: StorageConfig) -> Self {
        Self { scripts, storage }
    }

    pub async fn assemble(&self, server_id: ServerId) -> Result<BuildContext, LifecycleError> {
        let dir = self.storage.server_dir(server_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| LifecycleError::ScriptWrite { path: dir.clone(), source })?;
        // Bind mounts need an absolute host path
        let dir = tokio::fs::canonicalize(&dir)
            .await
            .map_err(|source| LifecycleError::ScriptWrite { path: dir.clone(), source })?;

        let mut files = Vec::new();
        for kind in ScriptKind::ALL {
            let Some(script) = self.scripts.find_active(server_id, kind).await? else {
                continue;
            };

            let path = dir.join(kind.file_name());
            tokio::fs::write(&path, script.content.as_bytes())
                .await
                .map_err(|source| LifecycleError::ScriptWrite { path: path.clone(), source })?;
            if kind.is_executable() {
                mark_executable(&path).await?;
            }

            debug!(server_id = %server_id, file = kind.file_name(), "Wrote build context file");
            files.push(kind.file_name().to_string());
        }

        Ok(BuildContext { dir, files })
    }
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> Result<(), LifecycleError> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| LifecycleError::ScriptWrite { path: path.to_path_buf(), source })
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> Result<(), LifecycleError> {
    Ok(())
}
