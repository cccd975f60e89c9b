// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Third-party credential minting for remote SSM sessions (§6.2/§6.3).
//!
//! The mint is an external tool: the identity payload goes to its stdin,
//! the minted credential comes back on its stdout, and a nonzero exit is
//! a transport failure. Invoked with `tokio::process::Command` — the
//! async analogue of the teacher's occasional `std::process::Command`
//! use — because it runs inside the same async supervisor loop as
//! everything else.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::frame::ProtocolError;

/// Invoke the credential mint, writing `payload` to its stdin and
/// returning its stdout.
pub async fn mint_credential(mint_path: &Path, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut child = Command::new(mint_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ProtocolError::Encode("credential mint has no stdin".into()))?;
    stdin.write_all(payload).await?;
    drop(stdin);

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(ProtocolError::Encode(format!(
            "credential mint exited with {}",
            output.status
        )));
    }
    Ok(output.stdout)
}
