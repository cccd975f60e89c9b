// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

/// Errors raised by the domain types in this crate: master-configuration
/// parsing and the fixed `serverinfo-N.xml` schema.
///
/// Mirrors the teacher's `LifecycleError` shape — one `thiserror` enum per
/// crate, no `anyhow` in library code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("failed to parse master configuration: {0}")]
    MasterConfigXml(String),

    #[error("master configuration missing required field `{0}`")]
    MasterConfigMissingField(&'static str),

    #[error("invalid port `{0}`: must be a decimal integer in 1..=65535")]
    InvalidPort(String),

    #[error("failed to parse server info: {0}")]
    ServerInfoXml(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
