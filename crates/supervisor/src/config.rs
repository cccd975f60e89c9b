// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Supervisor-wide configuration, resolved from environment variables
//! with documented defaults — the same shape as the teacher's
//! `daemon/src/env.rs`.

use std::path::PathBuf;
use std::time::Duration;

use dv_core::MasterConfig;

const ENV_CONFIG_GENERATOR: &str = "DV_CONFIG_GENERATOR";
const ENV_AUTH_MATERIALIZER: &str = "DV_AUTH_MATERIALIZER";
const ENV_CREDENTIAL_MINT: &str = "DV_CREDENTIAL_MINT";
const ENV_HOSTNAME: &str = "DV_HOSTNAME";
const ENV_DISPLAY_SERVER_BINARY: &str = "DV_DISPLAY_SERVER_BINARY";

const DEFAULT_CONFIG_GENERATOR: &str = "/usr/lib/vizstack/vs-config-generator";
const DEFAULT_AUTH_MATERIALIZER: &str = "/usr/lib/vizstack/vs-auth-helper";
const DEFAULT_CREDENTIAL_MINT: &str = "/usr/lib/vizstack/vs-munge-encode";
const DEFAULT_DISPLAY_SERVER_BINARY: &str = "/usr/bin/Xorg";

/// Everything the supervisor needs besides the per-launch `ServerIdentity`
/// and CLI arguments: external collaborator paths (§6.3), the master
/// configuration (§6.1), and the tunables resolved from §6.6.
pub struct Config {
    pub hostname: String,
    pub master_config: MasterConfig,
    pub runtime_dir: PathBuf,
    pub quiescence_delay: Duration,
    pub kill_timeout: Duration,
    pub config_generator: PathBuf,
    pub auth_materializer: PathBuf,
    pub credential_mint: PathBuf,
    pub display_server_binary: PathBuf,
}

impl Config {
    /// Resolve configuration for a real launch: reads and parses the
    /// master configuration file at `dv_core::master_config_path()` (or
    /// its `DV_MASTER_CONFIG` override).
    pub fn load() -> Result<Self, crate::error::SupervisorError> {
        let raw = std::fs::read_to_string(dv_core::master_config_path())?;
        let master_config = MasterConfig::parse(&raw)?;
        Ok(Self::from_master_config(master_config))
    }

    fn from_master_config(master_config: MasterConfig) -> Self {
        Self {
            hostname: resolve_hostname(),
            master_config,
            runtime_dir: dv_core::runtime_dir(),
            quiescence_delay: dv_core::quiescence_delay(),
            kill_timeout: dv_core::kill_timeout(),
            config_generator: path_env(ENV_CONFIG_GENERATOR, DEFAULT_CONFIG_GENERATOR),
            auth_materializer: path_env(ENV_AUTH_MATERIALIZER, DEFAULT_AUTH_MATERIALIZER),
            credential_mint: path_env(ENV_CREDENTIAL_MINT, DEFAULT_CREDENTIAL_MINT),
            display_server_binary: path_env(ENV_DISPLAY_SERVER_BINARY, DEFAULT_DISPLAY_SERVER_BINARY),
        }
    }
}

fn path_env(var: &str, default: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn resolve_hostname() -> String {
    if let Some(h) = std::env::var_os(ENV_HOSTNAME) {
        return h.to_string_lossy().into_owned();
    }
    nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}
