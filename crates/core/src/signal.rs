// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

/// Events the signal funnel (C1) delivers to the supervisor's event loop.
///
/// Byte codes mirror the single-character tokens the original
/// implementation wrote down its self-pipe (`vs-X.cpp`'s `'0'`..`'4'`
/// constants); the variants here carry the same ordering so tests can
/// assert on wire-compatible framing where relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// A managed child exited; reap it (`SIGCHLD`).
    ChildExited,
    /// Caller asked the server to shut down (`SIGTERM`).
    Terminate,
    /// Display server signalled it is ready to accept connections
    /// (`SIGUSR1`).
    ChildReady,
    /// Caller process that invoked us has gone away (detected via the
    /// liveness pipe closing, delivered through the funnel as a
    /// pseudo-signal so the event loop has one place to select over).
    CallerGone,
    /// Interrupt requesting immediate teardown (`SIGINT`).
    Interrupt,
    /// Forwarded verbatim to the child, never changes supervisor state
    /// (`SIGHUP`).
    Hangup,
}

impl SignalKind {
    /// The single-byte code the original self-pipe implementation used.
    pub const fn wire_code(self) -> u8 {
        match self {
            SignalKind::ChildExited => b'0',
            SignalKind::Terminate => b'1',
            SignalKind::ChildReady => b'2',
            SignalKind::CallerGone => b'3',
            SignalKind::Interrupt => b'4',
            SignalKind::Hangup => b'5',
        }
    }
}
