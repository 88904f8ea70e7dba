// Copyright (c) 2026 Gamehost Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::config::RuntimeConfig;
use crate::domain::runtime::{
    BuildContext, ContainerRef, ContainerSpec, InterfaceCounters, RawContainerStats, RestartPolicy,
    RuntimeClient, RuntimeError,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions, Stats, StatsOptions,
    StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::BuildImageOptions;
use bollard::models::{HostConfig, PortBinding, RestartPolicy as DockerRestartPolicy, RestartPolicyNameEnum};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let docker = if let Some(path) = &config.docker_socket_path {
            #[cfg(unix)]
            let result = Docker::connect_with_unix(path, config.connect_timeout_secs, bollard::API_DEFAULT_VERSION);

            #[cfg(windows)]
            let result = Docker::connect_with_named_pipe(path, config.connect_timeout_secs, bollard::API_DEFAULT_VERSION);

            result.map_err(|e| {
                RuntimeError::ConnectionFailed(format!(
                    "Failed to connect to Docker at {}: {}\n\n\
                     Ensure Docker is running and the socket path is correct.",
                    path, e
                ))
            })?
        } else {
            Docker::connect_with_local_defaults().map_err(|e| {
                RuntimeError::ConnectionFailed(format!(
                    "Failed to connect to Docker: {}\n\n\
                     Common causes:\n\
                     - Docker daemon not running (check: docker ps)\n\
                     - Permission denied accessing Docker socket\n\
                     - Current user not in 'docker' group",
                    e
                ))
            })?
        };

        Ok(Self { docker })
    }

    /// Verify Docker daemon is accessible
    pub async fn healthcheck(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::ConnectionFailed(format!("Cannot connect to Docker daemon: {}", e)))?;
        Ok(())
    }

    /// Tar the context's files in memory; only the declared build files
    /// are sent, never the game data that shares the directory.
    fn pack_context(context: &BuildContext) -> Result<Vec<u8>, RuntimeError> {
        let mut builder = tar::Builder::new(Vec::new());
        for name in &context.files {
            builder
                .append_path_with_name(context.dir.join(name), name)
                .map_err(|e| RuntimeError::operation("build", format!("cannot pack {}: {}", name, e)))?;
        }
        builder
            .into_inner()
            .map_err(|e| RuntimeError::operation("build", format!("cannot finish build context: {}", e)))
    }
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(err, DockerError::DockerResponseServerError { status_code: 404, .. })
}

fn is_not_modified(err: &DockerError) -> bool {
    matches!(err, DockerError::DockerResponseServerError { status_code: 304, .. })
}

fn map_error(operation: &'static str, container: &ContainerRef, err: DockerError) -> RuntimeError {
    if is_not_found(&err) {
        RuntimeError::NotFound(container.to_string())
    } else {
        RuntimeError::operation(operation, err.to_string())
    }
}

fn host_config(spec: &ContainerSpec) -> HostConfig {
    let binding = PortBinding {
        host_ip: None,
        host_port: Some(spec.port.to_string()),
    };
    let restart_policy = match spec.restart_policy {
        RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        RestartPolicy::Never => RestartPolicyNameEnum::NO,
    };

    HostConfig {
        port_bindings: Some(HashMap::from([(spec.port_key(), Some(vec![binding]))])),
        binds: Some(vec![spec.mount.to_bind_string()]),
        memory: Some(spec.memory_bytes),
        memory_swap: Some(spec.memory_swap_bytes),
        cpu_percent: Some(spec.cpu_percent),
        restart_policy: Some(DockerRestartPolicy {
            name: Some(restart_policy),
            maximum_retry_count: None,
        }),
        ..Default::default()
    }
}

fn raw_stats(stats: Stats) -> RawContainerStats {
    let cores = stats
        .cpu_stats
        .online_cpus
        .map(|n| n as u32)
        .or_else(|| stats.cpu_stats.cpu_usage.percpu_usage.as_ref().map(|v| v.len() as u32))
        .unwrap_or(1);

    let networks = stats
        .networks
        .unwrap_or_default()
        .into_iter()
        .map(|(name, counters)| InterfaceCounters {
            name,
            rx_bytes: counters.rx_bytes,
            tx_bytes: counters.tx_bytes,
        })
        .collect();

    RawContainerStats {
        cpu_total_usage: stats.cpu_stats.cpu_usage.total_usage,
        precpu_total_usage: stats.precpu_stats.cpu_usage.total_usage,
        system_cpu_usage: stats.cpu_stats.system_cpu_usage.unwrap_or(0),
        presystem_cpu_usage: stats.precpu_stats.system_cpu_usage.unwrap_or(0),
        online_cpus: cores,
        memory_usage: stats.memory_stats.usage.unwrap_or(0),
        memory_limit: stats.memory_stats.limit.unwrap_or(0),
        networks,
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    async fn build_image(&self, context: &BuildContext, tag: &str) -> Result<(), RuntimeError> {
        info!("Building image {} from {}", tag, context.dir.display());
        let body = Self::pack_context(context)?;

        let options = BuildImageOptions {
            dockerfile: "Dockerfile",
            t: tag,
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        let mut log = Vec::new();
        let mut stream = self.docker.build_image(options, None, Some(bytes::Bytes::from(body)));
        while let Some(item) = stream.next().await {
            match item {
                Ok(info) => {
                    if let Some(line) = info.stream {
                        debug!(image = tag, "{}", line.trim_end());
                        log.push(line);
                    }
                    if let Some(error) = info.error {
                        log.push(error);
                        return Err(RuntimeError::BuildFailed {
                            tag: tag.to_string(),
                            log: log.concat(),
                        });
                    }
                }
                Err(e) => {
                    log.push(e.to_string());
                    return Err(RuntimeError::BuildFailed {
                        tag: tag.to_string(),
                        log: log.concat(),
                    });
                }
            }
        }

        info!("Built image {}", tag);
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerRef, RuntimeError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let config = Config {
            image: Some(spec.image.clone()),
            hostname: Some(spec.hostname.clone()),
            exposed_ports: Some(HashMap::from([(spec.port_key(), HashMap::new())])),
            env: Some(spec.env_strings()),
            tty: Some(true),
            host_config: Some(host_config(spec)),
            ..Default::default()
        };

        let res = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| RuntimeError::operation("create", e.to_string()))?;

        for warning in &res.warnings {
            warn!(container = %spec.name, "Docker warning: {}", warning);
        }

        info!("Created container {} ({})", spec.name, res.id);
        Ok(ContainerRef::new(res.id))
    }

    async fn start_container(&self, container: &ContainerRef) -> Result<(), RuntimeError> {
        self.docker
            .start_container(container.as_str(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| map_error("start", container, e))?;
        info!("Started container {}", container);
        Ok(())
    }

    async fn stop_container(&self, container: &ContainerRef, grace: Duration) -> Result<(), RuntimeError> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };

        match self.docker.stop_container(container.as_str(), Some(options)).await {
            Ok(()) => {
                info!("Stopped container {}", container);
                Ok(())
            }
            Err(e) if is_not_modified(&e) => {
                debug!("Container {} was already stopped", container);
                Ok(())
            }
            Err(e) => Err(map_error("stop", container, e)),
        }
    }

    async fn remove_container(&self, container: &ContainerRef) -> Result<(), RuntimeError> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(container.as_str(), Some(options))
            .await
            .map_err(|e| map_error("remove", container, e))?;

        info!("Removed container {}", container);
        Ok(())
    }

    async fn container_stats(&self, container: &ContainerRef) -> Result<RawContainerStats, RuntimeError> {
        // one_shot=false so the daemon fills precpu_stats from its previous sample
        let options = StatsOptions {
            stream: false,
            one_shot: false,
        };

        let mut stream = self.docker.stats(container.as_str(), Some(options));
        match stream.next().await {
            Some(Ok(stats)) => Ok(raw_stats(stats)),
            Some(Err(e)) => Err(map_error("stats", container, e)),
            None => Err(RuntimeError::operation("stats", "runtime returned no sample")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runtime::BindMount;
    use std::path::PathBuf;

    fn spec(restart_policy: RestartPolicy) -> ContainerSpec {
        ContainerSpec {
            name: "gameserver-abc".to_string(),
            image: "gameserver-abc:latest".to_string(),
            hostname: "gameserver-abc".to_string(),
            port: 25565,
            memory_bytes: 1024 * 1024 * 1024,
            memory_swap_bytes: 2 * 1024 * 1024 * 1024,
            cpu_percent: 75,
            restart_policy,
            env: vec![("SERVER_PORT".to_string(), "25565".to_string())],
            mount: BindMount {
                host_path: PathBuf::from("/srv/servers/abc"),
                container_path: "/data".to_string(),
            },
        }
    }

    #[test]
    fn test_host_config_maps_limits_and_bindings() {
        let config = host_config(&spec(RestartPolicy::UnlessStopped));

        assert_eq!(config.memory, Some(1024 * 1024 * 1024));
        assert_eq!(config.memory_swap, Some(2 * 1024 * 1024 * 1024));
        assert_eq!(config.cpu_percent, Some(75));
        assert_eq!(config.binds, Some(vec!["/srv/servers/abc:/data".to_string()]));

        let bindings = config.port_bindings.unwrap();
        let host_port = bindings["25565/tcp"].as_ref().unwrap()[0].host_port.clone();
        assert_eq!(host_port, Some("25565".to_string()));

        let policy = config.restart_policy.unwrap().name;
        assert_eq!(policy, Some(RestartPolicyNameEnum::UNLESS_STOPPED));
    }

    #[test]
    fn test_no_auto_restart_maps_to_no() {
        let config = host_config(&spec(RestartPolicy::Never));
        assert_eq!(config.restart_policy.unwrap().name, Some(RestartPolicyNameEnum::NO));
    }

    #[test]
    fn test_build_context_excludes_game_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Dockerfile"), "FROM alpine:3.20\n").unwrap();
        std::fs::write(dir.path().join("world.dat"), vec![0u8; 1024]).unwrap();
        let context = BuildContext {
            dir: dir.path().to_path_buf(),
            files: vec!["Dockerfile".to_string()],
        };

        let body = DockerRuntime::pack_context(&context).unwrap();
        let mut archive = tar::Archive::new(body.as_slice());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Dockerfile".to_string()]);
    }
}
