// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! State Manager (SSM) wire protocol.
//!
//! Wire format: 5-byte ASCII decimal length prefix (space-padded) + UTF-8
//! XML payload (§4.3/§6.2).

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod credential;
mod frame;
mod messages;
mod session;

pub use credential::mint_credential;
pub use frame::{read_message, write_message, ProtocolError};
pub use messages::{
    GetServerConfigQuery, Identity, Response, ResponseServerConfig, ReturnValue, ServerTypeTag,
    UpdateXAvail,
};
pub use session::{Authorization, SsmSession, SsmStream};
