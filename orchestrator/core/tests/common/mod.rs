// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixture: an engine over the in-memory runtime and repositories,
//! rooted in a temporary directory.

#![allow(dead_code)]

use gamehost_orchestrator_core::application::Engine;
use gamehost_orchestrator_core::domain::config::EngineConfigManifest;
use gamehost_orchestrator_core::domain::repository::ServerRepository;
use gamehost_orchestrator_core::domain::script::{ScriptKind, ScriptRecord};
use gamehost_orchestrator_core::domain::server::{ServerDescriptor, ServerId, ServerSettings};
use gamehost_orchestrator_core::infrastructure::repositories::{
    InMemoryBackupRepository, InMemoryScriptRepository, InMemoryServerRepository,
};
use gamehost_orchestrator_core::infrastructure::InMemoryRuntime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

pub struct Harness {
    pub root: TempDir,
    pub servers: InMemoryServerRepository,
    pub scripts: InMemoryScriptRepository,
    pub backups: InMemoryBackupRepository,
    pub runtime: Arc<InMemoryRuntime>,
    pub engine: Engine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut EngineConfigManifest)) -> Self {
        let root = tempfile::tempdir().unwrap();
        let mut config = EngineConfigManifest::default();
        config.spec.storage.servers_root = root.path().join("servers");
        config.spec.storage.backups_root = root.path().join("backups");
        adjust(&mut config);
        config.validate().unwrap();

        let servers = InMemoryServerRepository::new();
        let scripts = InMemoryScriptRepository::new();
        let backups = InMemoryBackupRepository::new();
        let runtime = Arc::new(InMemoryRuntime::new());

        let engine = Engine::new(
            config,
            Arc::new(servers.clone()),
            Arc::new(scripts.clone()),
            Arc::new(backups.clone()),
            runtime.clone(),
        );

        Self {
            root,
            servers,
            scripts,
            backups,
            runtime,
            engine,
        }
    }

    /// A stopped server with a Dockerfile and a startup script.
    pub async fn add_server(&self, name: &str, settings: ServerSettings) -> ServerDescriptor {
        let server = ServerDescriptor::new(name, "minecraft", settings);
        self.servers.save(&server).await.unwrap();
        self.scripts.insert(ScriptRecord::new(
            server.id,
            ScriptKind::Dockerfile,
            "Dockerfile",
            "FROM eclipse-temurin:21-jre\nCOPY start.sh /start.sh\nCMD [\"/start.sh\"]\n",
        ));
        self.scripts.insert(ScriptRecord::new(
            server.id,
            ScriptKind::Startup,
            "start",
            "#!/bin/sh\ncd /data && exec java -jar server.jar nogui\n",
        ));
        server
    }

    pub fn server_dir(&self, server_id: ServerId) -> PathBuf {
        self.engine.config().spec.storage.server_dir(server_id)
    }

    pub async fn stored(&self, server_id: ServerId) -> ServerDescriptor {
        self.servers.find_by_id(server_id).await.unwrap().unwrap()
    }
}

/// Relative path → contents for every file under `dir`.
pub fn snapshot_dir(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            (relative, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

/// Some nested game data, including a binary file.
pub fn write_world(dir: &Path) {
    std::fs::create_dir_all(dir.join("world/region")).unwrap();
    std::fs::write(dir.join("server.properties"), "motd=A Gamehost Server\nmax-players=20\n").unwrap();
    std::fs::write(dir.join("world/level.dat"), (0u8..=255).collect::<Vec<u8>>()).unwrap();
    std::fs::write(dir.join("world/region/r.0.0.mca"), vec![0xAB; 16 * 1024]).unwrap();
}
