// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! SSM XML message shapes (§4.3/§6.2), encoded/decoded with `quick_xml`'s
//! serde integration — the XML-ecosystem analogue of how the teacher's
//! `oj-wire` derives `Serialize`/`Deserialize` on `Request`/`Response` and
//! encodes with `serde_json`.

use serde::{Deserialize, Serialize};

use crate::frame::ProtocolError;

/// `(hostname, server_number)` — the identity subtree sent with every
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "serverconfig")]
pub struct Identity {
    pub hostname: String,
    pub server_number: u32,
}

impl Identity {
    pub fn new(hostname: impl Into<String>, server_number: u32) -> Self {
        Self {
            hostname: hostname.into(),
            server_number,
        }
    }

    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        quick_xml::se::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// `get_serverconfig` request (§4.3 step 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "get_serverconfig")]
pub struct GetServerConfigQuery {
    pub serverconfig: Identity,
}

impl GetServerConfigQuery {
    pub fn new(identity: Identity) -> Self {
        Self {
            serverconfig: identity,
        }
    }

    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        quick_xml::se::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// `update_x_avail` notification (§4.3): readiness (`newState=1`) or exit
/// (`newState=0`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "update_x_avail")]
pub struct UpdateXAvail {
    #[serde(rename = "newState")]
    pub new_state: u8,
    pub serverconfig: Identity,
}

impl UpdateXAvail {
    pub fn ready(identity: Identity) -> Self {
        Self {
            new_state: 1,
            serverconfig: identity,
        }
    }

    pub fn exited(identity: Identity) -> Self {
        Self {
            new_state: 0,
            serverconfig: identity,
        }
    }

    pub fn to_xml(&self) -> Result<String, ProtocolError> {
        quick_xml::se::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// `server_type` tag carried in a response's `return_value/serverconfig`
/// (§4.3 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerTypeTag {
    Normal,
    Virtual,
}

/// `return_value/serverconfig` payload of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "serverconfig")]
pub struct ResponseServerConfig {
    pub owner: u32,
    pub server_type: ServerTypeTag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "return_value", default)]
pub struct ReturnValue {
    pub serverconfig: Option<ResponseServerConfig>,
}

/// The SSM's response frame (§4.3 step 3, §6.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "response")]
pub struct Response {
    pub status: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub return_value: ReturnValue,
}

impl Response {
    pub fn from_xml(xml: &str) -> Result<Self, ProtocolError> {
        quick_xml::de::from_str(xml).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips_through_xml() {
        let identity = Identity::new("viz-host-1", 7);
        let xml = identity.to_xml().expect("encode");
        let decoded: Identity = quick_xml::de::from_str(&xml).expect("decode");
        assert_eq!(decoded, identity);
    }

    #[test]
    fn success_response_parses_owner_and_type() {
        let xml = r#"
            <response>
                <status>0</status>
                <return_value>
                    <serverconfig>
                        <owner>1000</owner>
                        <server_type>normal</server_type>
                    </serverconfig>
                </return_value>
            </response>
        "#;
        let response = Response::from_xml(xml).expect("parse");
        assert!(response.is_success());
        let cfg = response.return_value.serverconfig.expect("serverconfig");
        assert_eq!(cfg.owner, 1000);
        assert_eq!(cfg.server_type, ServerTypeTag::Normal);
    }

    #[test]
    fn failure_response_carries_message() {
        let xml = r#"
            <response>
                <status>13</status>
                <message>owner mismatch</message>
            </response>
        "#;
        let response = Response::from_xml(xml).expect("parse");
        assert!(!response.is_success());
        assert_eq!(response.message.as_deref(), Some("owner mismatch"));
    }
}
