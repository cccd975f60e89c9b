// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Config Fetch & Materialize (C4): obtain the per-server XML
//! description, authorize its owner, invoke the external config
//! generator, and stage its output.

use std::path::{Path, PathBuf};

use dv_core::{Mode, RuntimeDirs, ServerInfo};
use dv_wire::{Identity, ServerTypeTag, SsmSession};

use crate::config::Config;
use crate::error::SupervisorError;

/// Per-server XML description plus the authorized owner, obtained either
/// from a local file (standalone) or the SSM (managed).
pub struct FetchedDescription {
    pub xml: String,
    /// `None` in standalone mode, where ownership checks are skipped.
    pub owner: Option<u32>,
}

/// Standalone mode (§4.4): read the per-server XML description from a
/// well-known path keyed by server number. No SSM session, no ownership
/// check.
pub fn fetch_standalone(dirs: &RuntimeDirs) -> Result<FetchedDescription, SupervisorError> {
    let path = standalone_xml_path(dirs);
    let xml = std::fs::read_to_string(&path)?;
    Ok(FetchedDescription { xml, owner: None })
}

fn standalone_xml_path(dirs: &RuntimeDirs) -> PathBuf {
    dirs.root()
        .join("standalone")
        .join(format!("Xconfig-{}.xml", dirs.server_number()))
}

/// Managed mode (§4.3/§4.4): run the SSM handshake and apply the
/// ownership rule — the invoking uid must equal the SSM-reported owner,
/// or be zero (trusted local launcher).
pub async fn fetch_managed(
    session: &mut SsmSession,
    identity: &Identity,
    expected_type: ServerTypeTag,
    invoking_uid: u32,
) -> Result<FetchedDescription, SupervisorError> {
    let auth = session.handshake(identity, expected_type).await?;
    if invoking_uid != auth.owner && invoking_uid != 0 {
        return Err(SupervisorError::Authorization(format!(
            "invoking uid {invoking_uid} does not own display (owner {})",
            auth.owner
        )));
    }
    Ok(FetchedDescription {
        xml: identity.to_xml()?,
        owner: Some(auth.owner),
    })
}

/// Invoke the external config generator (§6.3) and parse its server-info
/// output. Stages the description to `dirs.xconfig()` first.
pub async fn materialize(
    config: &Config,
    dirs: &RuntimeDirs,
    description_xml: &str,
    ignore_missing_devices: bool,
) -> Result<ServerInfo, SupervisorError> {
    std::fs::write(dirs.xconfig(), description_xml)?;

    let mut cmd = tokio::process::Command::new(&config.config_generator);
    cmd.arg(dirs.xconfig())
        .arg(dirs.xorg_conf())
        .arg(dirs.server_info());
    if ignore_missing_devices {
        cmd.arg("--ignore-missing-devices");
    }

    let status = cmd.status().await.map_err(SupervisorError::Spawn)?;
    if !status.success() {
        return Err(SupervisorError::ConfigGenerator(status.code().unwrap_or(-1)));
    }

    let raw = std::fs::read_to_string(dirs.server_info())?;
    Ok(ServerInfo::parse(&raw)?)
}

/// Invoke the auth-file materializer (§4.4/§6.3) when `-auth` was
/// supplied: regenerates a per-display auth file, owned by `owner`, mode
/// owner-read-only.
pub async fn materialize_auth_file(
    config: &Config,
    dirs: &RuntimeDirs,
    source_auth: &Path,
    display_designator: &str,
) -> Result<PathBuf, SupervisorError> {
    let dest = dirs.xauthority();
    let status = tokio::process::Command::new(&config.auth_materializer)
        .arg(display_designator)
        .arg(source_auth)
        .arg(&dest)
        .status()
        .await
        .map_err(SupervisorError::Spawn)?;
    if !status.success() {
        return Err(SupervisorError::Spawn(std::io::Error::other(format!(
            "auth materializer exited with {status}"
        ))));
    }
    Ok(dest)
}

pub fn mode_is_standalone(mode: &Mode) -> bool {
    matches!(mode, Mode::Standalone)
}
