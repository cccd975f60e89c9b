// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

/// States of the per-display supervisor state machine (C6).
///
/// Transitions are driven exclusively by the event loop in
/// `dv-supervisor`; this enum only names the states and the invariant
/// each implies, mirroring the state comments scattered through
/// `vs-X.cpp`'s `main` loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    /// Process has started; no lock held, no config fetched yet.
    Init,
    /// Cluster lock (C2) is held for this display number.
    LockHeld,
    /// Server configuration has been fetched and materialized to disk.
    ConfigReady,
    /// The display-server child has been forked and exec'd, but has not
    /// yet signalled readiness.
    ChildRunning,
    /// The display-server child has signalled `SIGUSR1`; ready for use.
    ChildReady,
    /// Teardown has been requested or the child has exited; cleanup is
    /// in progress.
    Teardown,
    /// Terminal state. The supervisor may exit once here.
    Done,
}

impl RuntimeState {
    /// Whether the cluster lock must be held while in this state.
    pub const fn holds_lock(self) -> bool {
        !matches!(self, RuntimeState::Init | RuntimeState::Done)
    }

    /// Whether a managed child process is expected to exist in this state.
    pub const fn has_child(self) -> bool {
        matches!(self, RuntimeState::ChildRunning | RuntimeState::ChildReady)
    }
}
