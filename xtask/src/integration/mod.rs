//! Integration test infrastructure.
//!
//! Starts Redis and Memcached containers and runs the workspace test suite
//! against them. Tests that need a service skip themselves when it is not
//! reachable, so this is what turns them on.
//!
//! # Usage
//!
//! ```bash
//! # Start both services, run all tests, stop the services
//! cargo xtask integration
//!
//! # Skip container management (assumes services are already running)
//! cargo xtask integration --no-docker
//!
//! # Leave the containers up for manual demos afterwards
//! cargo xtask integration --keep-containers
//! ```

pub mod containers;
pub mod error;

pub use error::{IntegrationError, Result};

use std::time::Duration;

use crate::prelude::*;
use containers::{
    detect_runtime, is_running, start_container, stop_container, test_environment,
    wait_for_health, ContainerRuntime, ContainerSpec, MEMCACHED_SPEC, REDIS_SPEC,
};

/// Integration test command.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Run the test suite against real Redis and Memcached.

This command manages Docker/Podman containers for both services and runs
`cargo test --workspace` with the environment pointing at them.

Environment variables passed to the tests:
  REDIS_URL       - redis://localhost:6379
  MEMCACHED_ADDR  - localhost:11211")]
pub struct IntegrationCommand {
    /// Skip container management (assume services are already running).
    #[arg(long)]
    pub no_docker: bool,

    /// Keep containers running after tests complete.
    #[arg(long)]
    pub keep_containers: bool,

    /// Prefer Podman over Docker when both are installed.
    #[arg(long)]
    pub podman: bool,

    /// Timeout in seconds for container health checks.
    #[arg(long, default_value = "30")]
    pub health_timeout: u64,
}

/// Main entry point for integration command.
pub async fn run(command: IntegrationCommand, global: crate::Global) -> Result<()> {
    if !global.is_silent() {
        aprintln!("{}", p_b("Integration Tests"));
        aprintln!();
    }

    let runtime = if command.no_docker {
        if !global.is_silent() {
            aprintln!(
                "{} {}",
                p_y("⚠️"),
                "Skipping container management (--no-docker)"
            );
        }
        None
    } else {
        Some(detect_runtime(command.podman).await?)
    };

    let mut started = Vec::new();
    if let Some(rt) = runtime {
        for spec in [&REDIS_SPEC, &MEMCACHED_SPEC] {
            if ensure_container(rt, spec, command.health_timeout, &global).await? {
                started.push(spec);
            }
        }
    }

    let passed = run_tests(&global).await?;

    if let Some(rt) = runtime {
        if command.keep_containers {
            if !started.is_empty() && !global.is_silent() {
                aprintln!(
                    "{} {}",
                    p_y("⚠️"),
                    "Containers left running (--keep-containers)"
                );
            }
        } else {
            for spec in started {
                if !global.is_silent() {
                    aprintln!("{} Stopping {}...", p_b("🐳"), spec.name);
                }
                stop_container(rt, spec.name).await?;
            }
        }
    }

    aprintln!();
    if passed {
        aprintln!("{} {}", p_g("✅"), p_g("All integration tests passed!"));
        Ok(())
    } else {
        aprintln!("{} {}", p_r("❌"), p_r("Some integration tests failed"));
        Err(IntegrationError::TestFailed(
            "cargo test reported failures".to_string(),
        ))
    }
}

/// Starts `spec` unless it is already running and waits for it to be healthy.
///
/// Returns true if this call started the container.
async fn ensure_container(
    runtime: ContainerRuntime,
    spec: &ContainerSpec,
    timeout_secs: u64,
    global: &crate::Global,
) -> Result<bool> {
    if is_running(runtime, spec.name).await? {
        if !global.is_silent() {
            aprintln!("{} {} already running", p_y("⚠️"), spec.name);
        }
        return Ok(false);
    }

    if !global.is_silent() {
        aprintln!("{} Starting {}...", p_b("🐳"), spec.name);
    }
    start_container(runtime, spec).await?;

    if !global.is_silent() {
        aprintln!(
            "{} {}",
            p_b("⏳"),
            format!("Waiting for {} health (max {}s)...", spec.name, timeout_secs)
        );
    }
    wait_for_health(runtime, spec, Duration::from_secs(timeout_secs)).await?;

    if !global.is_silent() {
        aprintln!("{} {} is ready", p_g("✅"), spec.name);
    }
    Ok(true)
}

/// Runs `cargo test --workspace` against the services.
async fn run_tests(global: &crate::Global) -> Result<bool> {
    if !global.is_silent() {
        aprintln!("{} {}", p_b("🔧"), p_b("Running workspace tests..."));
    }

    let mut cmd = tokio::process::Command::new("cargo");
    cmd.args(["test", "--workspace"]);
    if global.is_verbose() {
        cmd.args(["--", "--nocapture"]);
    }
    for (key, value) in test_environment() {
        cmd.env(key, value);
    }

    let status = cmd.status().await?;
    Ok(status.success())
}
