// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

use std::path::PathBuf;

use crate::error::CoreError;

/// Which binary variant is being supervised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerType {
    /// A real X display server, guarded by the full privileged pipeline.
    Normal,
    /// The unprivileged Virtual Variant (C7): no lock, no guardian, no
    /// privilege elevation.
    Virtual,
}

/// The configuration the supervisor needs to launch a display server,
/// whether obtained from the config-fetch step (C4) or supplied directly
/// by a caller for a standalone launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_type: ServerType,
    /// Absolute path to the display-server binary to exec.
    pub binary: PathBuf,
    /// Command-line arguments, already sanitized against the deny-list
    /// (§4.4/§6.4) by the caller of this type.
    pub args: Vec<String>,
    /// Raw XML payload as received from the config generator or the SSM,
    /// retained for diagnostics and for re-emitting in `GetServerConfig`
    /// responses.
    pub raw_xml: String,
}

/// Parsed shape of `serverinfo-N.xml`, the config generator's output
/// (§4.4, §6.1). This is the one fixed small XML schema the core parses;
/// general XML traversal remains out of scope per spec §1.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename = "serverinfo")]
pub struct ServerInfo {
    #[serde(rename = "usesAllGPUs", default)]
    pub uses_all_gpus: bool,
    #[serde(rename = "arg", default)]
    pub extra_args: Vec<ServerInfoArg>,
    #[serde(rename = "tempEdidFile", default)]
    pub temp_edid_files: Vec<String>,
}

/// One extra command-line argument the config generator asked to be
/// appended, optionally with a value (`--flag` vs `--flag=value`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ServerInfoArg {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
}

impl ServerInfo {
    /// Parse a `serverinfo-N.xml` document produced by the config
    /// generator.
    pub fn parse(xml: &str) -> Result<Self, CoreError> {
        quick_xml::de::from_str(xml).map_err(|e| CoreError::ServerInfoXml(e.to_string()))
    }

    /// `extra_args` as a flat list of argv-style tokens, in order.
    pub fn argv_tokens(&self) -> Vec<String> {
        self.extra_args
            .iter()
            .map(|a| match &a.value {
                Some(v) => format!("{}={}", a.name, v),
                None => a.name.clone(),
            })
            .collect()
    }

    /// Temp EDID files as `PathBuf`s, for cleanup during teardown.
    pub fn temp_edid_paths(&self) -> Vec<PathBuf> {
        self.temp_edid_files.iter().map(PathBuf::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extra_args_and_edid_files() {
        let xml = r#"
            <serverinfo>
                <usesAllGPUs>true</usesAllGPUs>
                <arg name="rgs-prompt-user"/>
                <arg name="depth" value="24"/>
                <tempEdidFile>/tmp/edid-7.bin</tempEdidFile>
            </serverinfo>
        "#;
        let info = ServerInfo::parse(xml).expect("parse");
        assert!(info.uses_all_gpus);
        assert_eq!(
            info.argv_tokens(),
            vec!["rgs-prompt-user".to_string(), "depth=24".to_string()]
        );
        assert_eq!(
            info.temp_edid_paths(),
            vec![PathBuf::from("/tmp/edid-7.bin")]
        );
    }

    #[test]
    fn defaults_when_fields_absent() {
        let xml = "<serverinfo></serverinfo>";
        let info = ServerInfo::parse(xml).expect("parse");
        assert!(!info.uses_all_gpus);
        assert!(info.extra_args.is_empty());
        assert!(info.temp_edid_files.is_empty());
    }
}
