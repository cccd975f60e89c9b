// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Signal Funnel (C1), Tokio-native half.
//!
//! `tokio::signal::unix::signal` streams, one per kind, each forwarded
//! into a single `mpsc::Receiver<SignalKind>` — the funnel the
//! Supervisor's event loop selects over. This is the direct replacement
//! design note §9 asks for ("replace async-signal-safe handler bodies +
//! self-pipe with whatever idiom the target ecosystem offers... preserve
//! the property that the event loop is the sole consumer").
//!
//! The Guardian (pre-Tokio, see `guardian.rs`) uses a raw self-pipe
//! instead, since it runs before any runtime exists.

use tokio::signal::unix::{signal, SignalKind as UnixSignalKind};
use tokio::sync::mpsc;

use dv_core::SignalKind;

/// Spawns one Tokio task per signal kind and returns the funnel's
/// receiving end. Dropping the receiver stops delivery (the tasks end on
/// next send failure).
pub fn install() -> std::io::Result<mpsc::Receiver<SignalKind>> {
    let (tx, rx) = mpsc::channel(32);

    spawn_forwarder(UnixSignalKind::child(), SignalKind::ChildExited, tx.clone())?;
    spawn_forwarder(UnixSignalKind::terminate(), SignalKind::Terminate, tx.clone())?;
    spawn_forwarder(UnixSignalKind::user_defined1(), SignalKind::ChildReady, tx.clone())?;
    spawn_forwarder(UnixSignalKind::interrupt(), SignalKind::Interrupt, tx.clone())?;
    spawn_forwarder(UnixSignalKind::hangup(), SignalKind::Hangup, tx)?;

    Ok(rx)
}

fn spawn_forwarder(
    kind: UnixSignalKind,
    event: SignalKind,
    tx: mpsc::Sender<SignalKind>,
) -> std::io::Result<()> {
    let mut stream = signal(kind)?;
    tokio::spawn(async move {
        while stream.recv().await.is_some() {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
