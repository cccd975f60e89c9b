// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

/// Identifies one display-server instance under management.
///
/// The pairing of `server_number` and `owner_uid` is the key the cluster
/// lock, the runtime directory layout, and the SSM session all key off of
/// — carried as one value instead of passed as two loose parameters, per
/// the original's habit of threading `display` and `uid` through nearly
/// every function in `vs-X.cpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServerIdentity {
    /// The X display number, e.g. `7` for `:7`.
    pub server_number: u32,
    /// UID of the user who is authorized to own this display, `None` for
    /// an unclaimed/standalone instance.
    pub owner_uid: Option<u32>,
}

impl ServerIdentity {
    pub const fn new(server_number: u32, owner_uid: Option<u32>) -> Self {
        Self {
            server_number,
            owner_uid,
        }
    }

    /// Display name as Xorg/clients expect it, e.g. `:7`.
    pub fn display_name(&self) -> String {
        format!(":{}", self.server_number)
    }

    /// True if `candidate_uid` is authorized to operate on this display.
    ///
    /// An unclaimed display (`owner_uid: None`) accepts any caller, which
    /// matches standalone mode in `vs-X.cpp` where no SSM arbitrates
    /// ownership.
    pub fn is_owned_by(&self, candidate_uid: u32) -> bool {
        match self.owner_uid {
            Some(uid) => uid == candidate_uid,
            None => true,
        }
    }
}
