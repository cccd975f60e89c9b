// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

use std::path::PathBuf;

/// Centralizes the per-display filesystem layout under the runtime
/// directory (§6.5), replacing the original's repeated
/// `sprintf(..., "/var/run/vizstack/xorg-%s.conf", display)` call sites
/// with one struct of path builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDirs {
    root: PathBuf,
    server_number: u32,
}

impl RuntimeDirs {
    pub fn new(root: PathBuf, server_number: u32) -> Self {
        Self { root, server_number }
    }

    /// Generated Xorg configuration for this display.
    pub fn xorg_conf(&self) -> PathBuf {
        self.root.join(format!("xorg-{}.conf", self.server_number))
    }

    /// Config-generator output describing this display's launch.
    pub fn server_info(&self) -> PathBuf {
        self.root
            .join(format!("serverinfo-{}.xml", self.server_number))
    }

    /// Raw XML config payload materialized for this display.
    pub fn xconfig(&self) -> PathBuf {
        self.root
            .join(format!("xconfig-{}.xml", self.server_number))
    }

    /// Per-display Xauthority file.
    pub fn xauthority(&self) -> PathBuf {
        self.root
            .join(format!("Xauthority-{}", self.server_number))
    }

    /// Per-user credential file for this display, `xuser-N`.
    pub fn xuser_file(&self) -> PathBuf {
        self.root.join(format!("xuser-{}", self.server_number))
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn server_number(&self) -> u32 {
        self.server_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_and_numbered() {
        let dirs = RuntimeDirs::new(PathBuf::from("/var/run/vizstack"), 7);
        assert_eq!(
            dirs.xorg_conf(),
            PathBuf::from("/var/run/vizstack/xorg-7.conf")
        );
        assert_eq!(
            dirs.server_info(),
            PathBuf::from("/var/run/vizstack/serverinfo-7.xml")
        );
        assert_eq!(
            dirs.xauthority(),
            PathBuf::from("/var/run/vizstack/Xauthority-7")
        );
        assert_eq!(
            dirs.xuser_file(),
            PathBuf::from("/var/run/vizstack/xuser-7")
        );
    }
}
