// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

/// Errors raised anywhere in the supervisor, matching the error-kind
/// table in spec §7: each variant names where it's surfaced and whether
/// it is fatal pre-fork or tolerated post-`CHILD_READY`.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("master configuration invalid: {0}")]
    MasterConfig(#[from] dv_core::CoreError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cluster lock unavailable: {0}")]
    Lock(std::io::Error),

    #[error("argument rejected: {0}")]
    ArgumentDenied(String),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("config generator exited with status {0}")]
    ConfigGenerator(i32),

    #[error("SSM transport error: {0}")]
    Ssm(#[from] dv_wire::ProtocolError),

    #[error("failed to spawn display server: {0}")]
    Spawn(std::io::Error),

    #[error("privilege elevation failed: {0}")]
    Privilege(nix::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
