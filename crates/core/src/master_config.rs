// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

use crate::error::CoreError;

/// How this host participates in a cluster: standalone (no SSM) or
/// managed by a State Manager at some address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Standalone,
    Managed { ssm_host: String, ssm_port: u16 },
}

/// Resolved transport for talking to the SSM, derived from `Mode::Managed`
/// per spec §6.1: the literal host `localhost` selects a Unix-domain
/// socket, anything else a TCP connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Unix(std::path::PathBuf),
    Tcp { host: String, port: u16 },
}

/// Default path to the Unix-domain SSM socket when `ssm_host` is
/// `localhost`, grounded in `vs-X.cpp`'s `SSM_UNIX_SOCKET` constant.
pub const LOCAL_SSM_SOCKET: &str = "/var/run/vizstack/ssm.sock";

/// Parsed `master_config.xml` (§6.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterConfig {
    pub mode: Mode,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename = "masterconfig")]
struct RawMasterConfig {
    #[serde(rename = "systemType", default)]
    system_type: Option<String>,
    #[serde(rename = "ssmHost", default)]
    ssm_host: Option<String>,
    #[serde(rename = "ssmPort", default)]
    ssm_port: Option<String>,
}

impl MasterConfig {
    /// Parse a `master_config.xml` document.
    ///
    /// `systemType` of `standalone` (case-insensitive) yields
    /// `Mode::Standalone`; anything else requires `ssmHost`/`ssmPort` and
    /// yields `Mode::Managed`, with strict decimal port validation in
    /// 1..=65535 matching `vs-X.cpp`'s `getSystemType`.
    pub fn parse(xml: &str) -> Result<Self, CoreError> {
        let raw: RawMasterConfig =
            quick_xml::de::from_str(xml).map_err(|e| CoreError::MasterConfigXml(e.to_string()))?;

        let is_standalone = raw
            .system_type
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("standalone"))
            .unwrap_or(false);

        if is_standalone {
            return Ok(MasterConfig {
                mode: Mode::Standalone,
            });
        }

        let ssm_host = raw
            .ssm_host
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MasterConfigMissingField("ssmHost"))?;
        let port_str = raw
            .ssm_port
            .filter(|s| !s.is_empty())
            .ok_or(CoreError::MasterConfigMissingField("ssmPort"))?;
        let ssm_port: u16 = port_str
            .parse()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| CoreError::InvalidPort(port_str.clone()))?;

        Ok(MasterConfig {
            mode: Mode::Managed { ssm_host, ssm_port },
        })
    }

    /// Resolve the transport to use to reach the SSM, or `None` in
    /// standalone mode.
    pub fn transport(&self) -> Option<Transport> {
        match &self.mode {
            Mode::Standalone => None,
            Mode::Managed { ssm_host, .. } if ssm_host == "localhost" => {
                Some(Transport::Unix(std::path::PathBuf::from(LOCAL_SSM_SOCKET)))
            }
            Mode::Managed { ssm_host, ssm_port } => Some(Transport::Tcp {
                host: ssm_host.clone(),
                port: *ssm_port,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_mode_parses() {
        let xml = r#"<masterconfig><systemType>standalone</systemType></masterconfig>"#;
        let cfg = MasterConfig::parse(xml).expect("parse");
        assert_eq!(cfg.mode, Mode::Standalone);
        assert!(cfg.transport().is_none());
    }

    #[test]
    fn managed_localhost_selects_unix_transport() {
        let xml = r#"<masterconfig><systemType>managed</systemType><ssmHost>localhost</ssmHost><ssmPort>5678</ssmPort></masterconfig>"#;
        let cfg = MasterConfig::parse(xml).expect("parse");
        assert_eq!(
            cfg.transport(),
            Some(Transport::Unix(std::path::PathBuf::from(LOCAL_SSM_SOCKET)))
        );
    }

    #[test]
    fn managed_remote_host_selects_tcp_transport() {
        let xml = r#"<masterconfig><systemType>managed</systemType><ssmHost>viz-master</ssmHost><ssmPort>5678</ssmPort></masterconfig>"#;
        let cfg = MasterConfig::parse(xml).expect("parse");
        assert_eq!(
            cfg.transport(),
            Some(Transport::Tcp {
                host: "viz-master".into(),
                port: 5678,
            })
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let xml = r#"<masterconfig><systemType>managed</systemType><ssmHost>viz-master</ssmHost><ssmPort>not-a-port</ssmPort></masterconfig>"#;
        assert!(matches!(
            MasterConfig::parse(xml),
            Err(CoreError::InvalidPort(_))
        ));
    }

    #[test]
    fn zero_port_is_rejected() {
        let xml = r#"<masterconfig><systemType>managed</systemType><ssmHost>viz-master</ssmHost><ssmPort>0</ssmPort></masterconfig>"#;
        assert!(matches!(
            MasterConfig::parse(xml),
            Err(CoreError::InvalidPort(_))
        ));
    }

    #[test]
    fn missing_ssm_host_is_rejected() {
        let xml = r#"<masterconfig><systemType>managed</systemType><ssmPort>5678</ssmPort></masterconfig>"#;
        assert!(matches!(
            MasterConfig::parse(xml),
            Err(CoreError::MasterConfigMissingField("ssmHost"))
        ));
    }
}
