// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Per-display user record (§6.5): `xuser-<N>`, a single line
//! `<username> <supervisor-pid> <rgs-prompt-flag>`, written once the
//! display server is ready and deleted on teardown.

use std::path::Path;

pub fn write(path: &Path, username: &str, supervisor_pid: i32, rgs_prompt_user: bool) -> std::io::Result<()> {
    let contents = format!("{} {} {}\n", username, supervisor_pid, rgs_prompt_user as u8);
    std::fs::write(path, contents)
}

/// Best-effort removal; teardown proceeds regardless of whether the
/// record was ever written.
pub fn remove(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove xuser record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_username_pid_and_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("xuser-7");
        write(&path, "alice", 4242, true).expect("write");
        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "alice 4242 1\n");
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("xuser-does-not-exist");
        remove(&path);
    }
}
