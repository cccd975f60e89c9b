// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Environment-variable configuration, resolved with documented
//! precedence and defaults — the same shape as the teacher's
//! `daemon/src/env.rs` (`OJ_STATE_DIR` > `XDG_STATE_HOME` > default).

use std::path::PathBuf;
use std::time::Duration;

use crate::{DEFAULT_KILL_TIMEOUT_SECS, DEFAULT_QUIESCENCE_DELAY_SECS};

const ENV_MASTER_CONFIG: &str = "DV_MASTER_CONFIG";
const ENV_LOCK_PATH: &str = "DV_LOCK_PATH";
const ENV_RUNTIME_DIR: &str = "DV_RUNTIME_DIR";
const ENV_QUIESCENCE_DELAY_MS: &str = "DV_QUIESCENCE_DELAY_MS";
const ENV_KILL_TIMEOUT_MS: &str = "DV_KILL_TIMEOUT_MS";
const ENV_DEBUG: &str = "VS_X_DEBUG";

const DEFAULT_MASTER_CONFIG: &str = "/etc/vizstack/master_config.xml";
const DEFAULT_LOCK_PATH: &str = "/var/lock/vs-X";
const DEFAULT_RUNTIME_DIR: &str = "/var/run/vizstack";

/// Path to `master_config.xml`, overridable via `DV_MASTER_CONFIG`.
pub fn master_config_path() -> PathBuf {
    std::env::var_os(ENV_MASTER_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MASTER_CONFIG))
}

/// Path to the cluster lock file, overridable via `DV_LOCK_PATH`.
pub fn lock_path(server_number: u32) -> PathBuf {
    let base = std::env::var_os(ENV_LOCK_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCK_PATH));
    // The original names one lock file per display: `/var/lock/vs-X` is a
    // prefix, the display number is appended (`vs-X7` for `:7`).
    let mut path = base.into_os_string();
    path.push(server_number.to_string());
    PathBuf::from(path)
}

/// Runtime directory root for persisted per-display state, overridable via
/// `DV_RUNTIME_DIR`.
pub fn runtime_dir() -> PathBuf {
    std::env::var_os(ENV_RUNTIME_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUNTIME_DIR))
}

/// Quiescence delay `D` between releasing the lock and declaring teardown
/// complete, overridable via `DV_QUIESCENCE_DELAY_MS` (§9 Open Question).
pub fn quiescence_delay() -> Duration {
    duration_from_ms_env(ENV_QUIESCENCE_DELAY_MS, DEFAULT_QUIESCENCE_DELAY_SECS * 1000)
}

/// Bound on how long to wait after `SIGTERM` before escalating to
/// `SIGKILL`, overridable via `DV_KILL_TIMEOUT_MS` (§9 Open Question).
pub fn kill_timeout() -> Duration {
    duration_from_ms_env(ENV_KILL_TIMEOUT_MS, DEFAULT_KILL_TIMEOUT_SECS * 1000)
}

/// `Some("debug")` if `VS_X_DEBUG` is set (any value, including empty),
/// to be used as a `tracing_subscriber::EnvFilter` override.
pub fn log_filter_override() -> Option<&'static str> {
    std::env::var_os(ENV_DEBUG).map(|_| "debug")
}

fn duration_from_ms_env(var: &str, default_ms: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        std::env::remove_var(ENV_QUIESCENCE_DELAY_MS);
        assert_eq!(quiescence_delay(), Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn override_is_honored() {
        std::env::set_var(ENV_QUIESCENCE_DELAY_MS, "1500");
        assert_eq!(quiescence_delay(), Duration::from_millis(1500));
        std::env::remove_var(ENV_QUIESCENCE_DELAY_MS);
    }
}
