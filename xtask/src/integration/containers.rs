//! Container management for the services the integration tests talk to.
//!
//! Pure functions build command arguments; I/O functions run the container
//! runtime and poll health.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::Command;

use super::error::{IntegrationError, Result};

// ============================================================================
// Types
// ============================================================================

/// Container runtime (Docker or Podman).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerRuntime {
    #[default]
    Docker,
    Podman,
}

/// Specification for a container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: &'static str,
    pub image: &'static str,
    pub port: u16,
    /// Named volume and mount path, for services that persist data.
    pub volume: Option<(&'static str, &'static str)>,
    pub command: Option<&'static str>,
    pub health_check: HealthCheck,
}

/// Health check strategy for a container.
#[derive(Debug, Clone)]
pub enum HealthCheck {
    /// Redis PING check.
    Redis,
    /// Memcached `version` over TCP.
    Memcached { port: u16 },
}

// ============================================================================
// Container Specifications (Constants)
// ============================================================================

/// Redis container specification. Append-only persistence is on so the
/// persistence demo sees Redis data survive a restart.
pub const REDIS_SPEC: ContainerSpec = ContainerSpec {
    name: "chatrelay-redis",
    image: "redis:7-alpine",
    port: 6379,
    volume: Some(("chatrelay-redis-data", "/data")),
    command: Some("redis-server --appendonly yes"),
    health_check: HealthCheck::Redis,
};

/// Memcached container specification.
pub const MEMCACHED_SPEC: ContainerSpec = ContainerSpec {
    name: "chatrelay-memcached",
    image: "memcached:1.6-alpine",
    port: 11211,
    volume: None,
    command: None,
    health_check: HealthCheck::Memcached { port: 11211 },
};

// ============================================================================
// Pure Functions (Functional Core)
// ============================================================================

/// Builds arguments for `docker run` / `podman run`.
///
/// Returns a vector of command arguments including:
/// - `--name {name}`
/// - `-d` (detached mode)
/// - `-p {port}:{port}` (port mapping)
/// - `-v {volume}:{path}` (volume mount, if any)
/// - `{image}`
/// - Command args if present (split by whitespace)
pub fn container_run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--name".to_string(),
        spec.name.to_string(),
        "-d".to_string(),
        "-p".to_string(),
        format!("{}:{}", spec.port, spec.port),
    ];

    if let Some((volume, path)) = spec.volume {
        args.push("-v".to_string());
        args.push(format!("{}:{}", volume, path));
    }

    args.push(spec.image.to_string());

    if let Some(cmd) = spec.command {
        args.extend(cmd.split_whitespace().map(String::from));
    }

    args
}

/// Environment the test suite needs to reach the containers.
pub fn test_environment() -> Vec<(&'static str, String)> {
    vec![
        ("REDIS_URL", format!("redis://localhost:{}", REDIS_SPEC.port)),
        ("MEMCACHED_ADDR", format!("localhost:{}", MEMCACHED_SPEC.port)),
    ]
}

/// Returns the command name for the container runtime.
pub fn runtime_command(runtime: ContainerRuntime) -> &'static str {
    match runtime {
        ContainerRuntime::Docker => "docker",
        ContainerRuntime::Podman => "podman",
    }
}

// ============================================================================
// I/O Functions (Imperative Shell)
// ============================================================================

/// Detects which container runtime is available.
///
/// If `prefer_podman` is true, checks Podman first, then Docker.
/// Otherwise checks Docker first, then Podman.
pub async fn detect_runtime(prefer_podman: bool) -> Result<ContainerRuntime> {
    let check_order = if prefer_podman {
        [ContainerRuntime::Podman, ContainerRuntime::Docker]
    } else {
        [ContainerRuntime::Docker, ContainerRuntime::Podman]
    };

    for runtime in check_order {
        let output = Command::new(runtime_command(runtime))
            .arg("--version")
            .output()
            .await;

        if let Ok(output) = output {
            if output.status.success() {
                return Ok(runtime);
            }
        }
    }

    Err(IntegrationError::DockerNotAvailable(
        "Neither docker nor podman found in PATH".to_string(),
    ))
}

/// Returns true if a container with this name is running.
pub async fn is_running(runtime: ContainerRuntime, name: &str) -> Result<bool> {
    let output = Command::new(runtime_command(runtime))
        .args(["ps", "-q", "-f", &format!("name={}", name)])
        .output()
        .await?;

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// Stops and removes a container.
///
/// Errors are ignored since the container might not exist.
pub async fn stop_container(runtime: ContainerRuntime, name: &str) -> Result<()> {
    let cmd = runtime_command(runtime);

    let _ = Command::new(cmd).args(["stop", name]).output().await;
    let _ = Command::new(cmd).args(["rm", name]).output().await;

    Ok(())
}

/// Starts a container with the given specification, replacing any stopped
/// container with the same name.
pub async fn start_container(runtime: ContainerRuntime, spec: &ContainerSpec) -> Result<()> {
    stop_container(runtime, spec.name).await?;

    let args = container_run_args(spec);
    let output = Command::new(runtime_command(runtime))
        .args(&args)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IntegrationError::ContainerFailed(format!(
            "Failed to start container '{}': {}",
            spec.name, stderr
        )));
    }

    Ok(())
}

/// Polls the container's health check until it passes or `timeout` elapses.
pub async fn wait_for_health(
    runtime: ContainerRuntime,
    spec: &ContainerSpec,
    timeout: Duration,
) -> Result<()> {
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(500);

    while start.elapsed() < timeout {
        let healthy = match &spec.health_check {
            HealthCheck::Redis => check_redis_health(runtime, spec.name).await,
            HealthCheck::Memcached { port } => check_memcached_health(*port).await,
        };

        if healthy {
            return Ok(());
        }

        tokio::time::sleep(poll_interval).await;
    }

    Err(IntegrationError::ContainerNotHealthy {
        name: spec.name.to_string(),
        timeout_secs: timeout.as_secs(),
    })
}

/// Checks Redis health by running `redis-cli ping` inside the container.
async fn check_redis_health(runtime: ContainerRuntime, name: &str) -> bool {
    let output = Command::new(runtime_command(runtime))
        .args(["exec", name, "redis-cli", "ping"])
        .output()
        .await;

    match output {
        Ok(output) => {
            output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "PONG"
        }
        Err(_) => false,
    }
}

/// Checks Memcached health by sending `version` and expecting `VERSION ...`.
async fn check_memcached_health(port: u16) -> bool {
    let probe = async {
        let mut stream = TcpStream::connect(("localhost", port)).await.ok()?;
        stream.write_all(b"version\r\n").await.ok()?;
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).await.ok()?;
        Some(line.starts_with("VERSION"))
    };

    matches!(
        tokio::time::timeout(Duration::from_secs(2), probe).await,
        Ok(Some(true))
    )
}
