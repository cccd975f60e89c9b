// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Virtual Variant (C7): an unprivileged supervisor for a display-server
//! binary that needs no privilege elevation, Cluster Lock, or Guardian
//! layer, but still runs the SSM session and signal-mirroring control
//! flow (§4.7).

use std::path::PathBuf;

use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use dv_core::{Mode, ServerIdentity, SignalKind};
use dv_wire::{Identity, ServerTypeTag, SsmSession};

use crate::config::Config;
use crate::error::SupervisorError;

pub struct VirtualSupervisor {
    identity: ServerIdentity,
    config: Config,
    session: Option<SsmSession>,
    child: Option<Child>,
    ready_latched: bool,
}

impl VirtualSupervisor {
    pub fn new(identity: ServerIdentity, config: Config) -> Self {
        Self {
            identity,
            config,
            session: None,
            child: None,
            ready_latched: false,
        }
    }

    /// Run the Virtual Variant's lifecycle: no config generator, no
    /// staging files — `binary` comes straight from the caller's
    /// argument vector and must already be executable.
    pub async fn run(
        mut self,
        binary: PathBuf,
        extra_args: Vec<String>,
        invoking_uid: u32,
        mut signals: mpsc::Receiver<SignalKind>,
    ) -> Result<i32, SupervisorError> {
        self.authorize(invoking_uid).await?;

        self.child = Some(
            Command::new(&binary)
                .args(&extra_args)
                .spawn()
                .map_err(SupervisorError::Spawn)?,
        );

        loop {
            tokio::select! {
                biased;

                result = wait_child(self.child.as_mut()), if self.child.is_some() => {
                    if let Some(status) = result {
                        self.notify_exit_best_effort().await;
                        return Ok(exit_code_for(status));
                    }
                }

                Some(event) = signals.recv() => {
                    match event {
                        SignalKind::ChildReady if !self.ready_latched => {
                            self.ready_latched = true;
                            self.notify_ready_best_effort().await;
                        }
                        SignalKind::Terminate | SignalKind::Interrupt => {
                            let code = self.terminate_child_and_reap().await;
                            self.notify_exit_best_effort().await;
                            return Ok(code);
                        }
                        SignalKind::Hangup => {
                            if let Some(child) = &self.child {
                                if let Some(pid) = child.id() {
                                    let _ = nix::sys::signal::kill(
                                        nix::unistd::Pid::from_raw(pid as i32),
                                        nix::sys::signal::Signal::SIGHUP,
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                }

                ready = wait_ssm_readable(self.session.as_ref()), if self.session.is_some() => {
                    if ready && self.session.as_ref().map(|s| s.peer_closed().unwrap_or(false)).unwrap_or(false) {
                        self.session = None;
                        let code = self.terminate_child_and_reap().await;
                        return Ok(code);
                    }
                }
            }
        }
    }

    /// §4.7: the ownership check allows only exact owner match — no root
    /// bypass, unlike the privileged Supervisor (§4.4).
    async fn authorize(&mut self, invoking_uid: u32) -> Result<(), SupervisorError> {
        let Mode::Managed { .. } = &self.config.master_config.mode else {
            return Ok(());
        };
        let transport = self.config.master_config.transport().ok_or_else(|| {
            SupervisorError::Configuration(
                "managed mode did not resolve an SSM transport".to_string(),
            )
        })?;
        let mut session =
            SsmSession::connect(&transport, Some(self.config.credential_mint.clone())).await?;
        let identity = Identity::new(self.config.hostname.clone(), self.identity.server_number);
        let auth = session.handshake(&identity, ServerTypeTag::Virtual).await?;
        if invoking_uid != auth.owner {
            return Err(SupervisorError::Authorization(format!(
                "invoking uid {invoking_uid} does not own display (owner {})",
                auth.owner
            )));
        }
        self.session = Some(session);
        Ok(())
    }

    async fn notify_ready_best_effort(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let identity =
                Identity::new(self.config.hostname.clone(), self.identity.server_number);
            if let Err(e) = session.notify_ready(&identity).await {
                tracing::warn!(error = %e, "failed to notify SSM of readiness");
            }
        }
    }

    async fn notify_exit_best_effort(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let identity =
                Identity::new(self.config.hostname.clone(), self.identity.server_number);
            if let Err(e) = session.notify_exit(&identity).await {
                tracing::warn!(error = %e, "best-effort exit notification failed");
            }
        }
    }

    async fn terminate_child_and_reap(&mut self) -> i32 {
        let Some(child) = self.child.as_mut() else {
            return 0;
        };
        if let Some(pid) = child.id() {
            let _ = nix::sys::signal::kill(
                nix::unistd::Pid::from_raw(pid as i32),
                nix::sys::signal::Signal::SIGTERM,
            );
        }
        match child.wait().await {
            Ok(status) => exit_code_for(status),
            Err(_) => 255,
        }
    }
}

async fn wait_child(child: Option<&mut Child>) -> Option<std::process::ExitStatus> {
    match child {
        Some(c) => c.wait().await.ok(),
        None => std::future::pending().await,
    }
}

async fn wait_ssm_readable(session: Option<&SsmSession>) -> bool {
    match session {
        Some(s) => {
            let _ = s.readable().await;
            true
        }
        None => std::future::pending().await,
    }
}

fn exit_code_for(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map(|s| 128 + s).unwrap_or(255),
    }
}
