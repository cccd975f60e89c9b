// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Supervisor Loop (C6): the state machine of spec §4.6.
//!
//! Owns the Cluster Lock, the optional SSM session, and the
//! display-server child; multiplexes signal events, SSM peer-close, and
//! caller-liveness into state transitions via a single `tokio::select!`.

use std::os::fd::RawFd;
use std::path::PathBuf;

use tokio::io::unix::AsyncFd;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use dv_core::{Mode, RuntimeDirs, RuntimeState, ServerIdentity, ServerInfo, SignalKind};
use dv_wire::{Identity, ServerTypeTag, SsmSession};

use crate::argv::{self, ParsedArgs};
use crate::config::Config;
use crate::config_fetch;
use crate::error::SupervisorError;
use crate::lock::ClusterLock;
use crate::xuser;

/// Wraps a raw fd this process does not own the lifetime of (it belongs
/// to `guardian::SupervisorHandles`, kept alive by the caller of
/// [`Supervisor::run`]) so it can be registered with Tokio's reactor.
struct BorrowedRawFd(RawFd);

impl std::os::fd::AsRawFd for BorrowedRawFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Everything the state machine needs to launch and tear down one
/// display server.
pub struct Supervisor {
    identity: ServerIdentity,
    config: Config,
    dirs: RuntimeDirs,
    server_type_tag: ServerTypeTag,
    lock: ClusterLock,
    state: RuntimeState,
    session: Option<SsmSession>,
    child: Option<Child>,
    server_info: Option<ServerInfo>,
    owner_uid: u32,
    rgs_prompt_user: bool,
    ready_latched: bool,
    xuser_written: bool,
}

impl Supervisor {
    pub fn new(
        identity: ServerIdentity,
        config: Config,
        server_type_tag: ServerTypeTag,
        lock_path: PathBuf,
    ) -> Self {
        let dirs = RuntimeDirs::new(config.runtime_dir.clone(), identity.server_number);
        Self {
            identity,
            config,
            dirs,
            server_type_tag,
            lock: ClusterLock::new(lock_path),
            state: RuntimeState::Init,
            session: None,
            child: None,
            server_info: None,
            owner_uid: 0,
            rgs_prompt_user: false,
            ready_latched: false,
            xuser_written: false,
        }
    }

    /// Run the full launch-to-teardown lifecycle. Returns the process
    /// exit code per §4.6 "Exit status". `caller_liveness_fd` is the read
    /// end of the Guardian's liveness pipe (§4.5); its EOF is folded into
    /// the same teardown path as `SIGTERM`/`SIGINT`/SSM peer close.
    pub async fn run(
        mut self,
        parsed_args: ParsedArgs,
        binary: PathBuf,
        invoking_uid: u32,
        signals: mpsc::Receiver<SignalKind>,
        caller_liveness_fd: RawFd,
    ) -> Result<i32, SupervisorError> {
        match self
            .launch(&parsed_args, &binary, invoking_uid, caller_liveness_fd)
            .await
        {
            Ok(()) => self.event_loop(signals, caller_liveness_fd).await,
            Err(e) => {
                tracing::error!(error = %e, "launch failed before child ready");
                self.teardown().await;
                Err(e)
            }
        }
    }

    async fn launch(
        &mut self,
        parsed_args: &ParsedArgs,
        binary: &PathBuf,
        invoking_uid: u32,
        caller_liveness_fd: RawFd,
    ) -> Result<(), SupervisorError> {
        self.lock.take_once().map_err(SupervisorError::Lock)?;
        self.state = RuntimeState::LockHeld;
        self.owner_uid = invoking_uid;
        self.rgs_prompt_user = parsed_args.rgs_prompt_user;

        let description = match &self.config.master_config.mode {
            Mode::Standalone => config_fetch::fetch_standalone(&self.dirs)?,
            Mode::Managed { .. } => {
                let transport = self.config.master_config.transport().ok_or_else(|| {
                    SupervisorError::Configuration(
                        "managed mode did not resolve an SSM transport".to_string(),
                    )
                })?;
                let mut session =
                    SsmSession::connect(&transport, Some(self.config.credential_mint.clone()))
                        .await?;
                let identity =
                    Identity::new(self.config.hostname.clone(), self.identity.server_number);
                let fetched = config_fetch::fetch_managed(
                    &mut session,
                    &identity,
                    self.server_type_tag,
                    invoking_uid,
                )
                .await?;
                self.session = Some(session);
                fetched
            }
        };
        if let Some(owner) = description.owner {
            self.owner_uid = owner;
        }

        let server_info = config_fetch::materialize(
            &self.config,
            &self.dirs,
            &description.xml,
            parsed_args.ignore_missing_devices,
        )
        .await?;
        self.state = RuntimeState::ConfigReady;

        if let Some(auth_path) = &parsed_args.auth_file {
            let designator = parsed_args
                .display_designator
                .clone()
                .unwrap_or_else(|| self.identity.display_name());
            config_fetch::materialize_auth_file(&self.config, &self.dirs, auth_path, &designator)
                .await?;
        }

        self.spawn_child(binary, parsed_args, &server_info, caller_liveness_fd)?;
        self.server_info = Some(server_info);
        self.state = RuntimeState::ChildRunning;
        Ok(())
    }

    fn spawn_child(
        &mut self,
        binary: &PathBuf,
        parsed_args: &ParsedArgs,
        server_info: &ServerInfo,
        caller_liveness_fd: RawFd,
    ) -> Result<(), SupervisorError> {
        let mut cmd = Command::new(binary);
        if let Some(designator) = &parsed_args.display_designator {
            cmd.arg(designator);
        }
        cmd.arg("-config").arg(self.dirs.xorg_conf());
        cmd.arg("-sharevts").arg("-novtswitch");
        cmd.args(&parsed_args.remaining);

        let extra_args = server_info.argv_tokens();
        if let Some(denied) = extra_args.iter().find(|token| argv::is_denied(token)) {
            return Err(SupervisorError::ArgumentDenied(denied.clone()));
        }
        cmd.args(&extra_args);

        // SAFETY: runs in the forked child between fork and exec; only
        // performs a `close(2)` on a fd this process owns, which is
        // async-signal-safe (§5: "File descriptors are closed across
        // exec... the caller-liveness pipe").
        unsafe {
            cmd.pre_exec(move || {
                let _ = nix::unistd::close(caller_liveness_fd);
                Ok(())
            });
        }

        self.child = Some(cmd.spawn().map_err(SupervisorError::Spawn)?);
        Ok(())
    }

    async fn event_loop(
        &mut self,
        mut signals: mpsc::Receiver<SignalKind>,
        caller_liveness_fd: RawFd,
    ) -> Result<i32, SupervisorError> {
        let liveness =
            AsyncFd::new(BorrowedRawFd(caller_liveness_fd)).map_err(SupervisorError::Io)?;

        loop {
            tokio::select! {
                biased;

                result = wait_child(self.child.as_mut()), if self.child.is_some() => {
                    if let Some(status) = result {
                        let code = exit_code_for(status);
                        self.teardown().await;
                        return Ok(code);
                    }
                }

                Some(event) = signals.recv() => {
                    if let Some(code) = self.handle_signal(event).await? {
                        return Ok(code);
                    }
                }

                guard = liveness.readable(), if self.state != RuntimeState::Teardown => {
                    let mut guard = guard.map_err(SupervisorError::Io)?;
                    let mut buf = [0u8; 1];
                    let probe = guard.try_io(|_| {
                        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(caller_liveness_fd) };
                        nix::unistd::read(borrowed, &mut buf).map_err(std::io::Error::from)
                    });
                    guard.clear_ready();
                    if matches!(probe, Ok(Ok(0))) {
                        let code = self.teardown_for_trigger().await?;
                        return Ok(code);
                    }
                }

                ready = wait_ssm_readable(self.session.as_ref()), if self.session.is_some() => {
                    if ready && self.session.as_ref().map(|s| s.peer_closed().unwrap_or(false)).unwrap_or(false) {
                        self.session = None;
                        let code = self.teardown_for_trigger().await?;
                        return Ok(code);
                    }
                }
            }
        }
    }

    async fn handle_signal(&mut self, event: SignalKind) -> Result<Option<i32>, SupervisorError> {
        match event {
            SignalKind::ChildReady => {
                if self.ready_latched {
                    return Ok(None);
                }
                self.ready_latched = true;
                self.on_child_ready().await?;
                Ok(None)
            }
            SignalKind::ChildExited => Ok(None), // the child-wait branch is authoritative
            SignalKind::Terminate | SignalKind::Interrupt => {
                let code = self.teardown_for_trigger().await?;
                Ok(Some(code))
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
                Ok(None)
            }
            SignalKind::CallerGone => Ok(None), // handled via the liveness-fd branch instead
        }
    }

    async fn on_child_ready(&mut self) -> Result<(), SupervisorError> {
        self.state = RuntimeState::ChildReady;
        tokio::time::sleep(self.config.quiescence_delay).await;
        self.lock.release_once().map_err(SupervisorError::Lock)?;
        tokio::time::sleep(self.config.quiescence_delay).await;

        xuser::write(
            &self.dirs.xuser_file(),
            &owner_username(self.owner_uid),
            std::process::id() as i32,
            self.rgs_prompt_user,
        )?;
        self.xuser_written = true;

        if let Some(session) = self.session.as_mut() {
            let identity =
                Identity::new(self.config.hostname.clone(), self.identity.server_number);
            if let Err(e) = session.notify_ready(&identity).await {
                tracing::warn!(error = %e, "failed to notify SSM of readiness");
            }
        }

        // §4.6 CHILD_READY: forward USR1 to the Guardian (our parent after
        // the fork), which relays it to the original caller (§4.5).
        let _ = nix::sys::signal::kill(nix::unistd::getppid(), nix::sys::signal::Signal::SIGUSR1);
        Ok(())
    }

    /// Common path for every teardown trigger (`SIGTERM`, `SIGINT`, SSM
    /// peer close, caller-liveness EOF): take the lock, wait `D`, send
    /// `TERM` with a bounded `KILL` escalation, reap, clean up (§4.6,
    /// §5 "Cancellation").
    async fn teardown_for_trigger(&mut self) -> Result<i32, SupervisorError> {
        self.lock.take_once().map_err(SupervisorError::Lock)?;
        tokio::time::sleep(self.config.quiescence_delay).await;
        self.kill_child_with_escalation().await;
        let code = self.reap_child().await;
        self.teardown().await;
        Ok(code)
    }

    /// Send `TERM`, wait up to `kill_timeout`, escalate to `KILL` if the
    /// child is still alive (§9 Open Question: hard-kill fallback).
    async fn kill_child_with_escalation(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        let Some(pid) = child.id() else {
            return;
        };
        let pid = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM);
        let waited = tokio::time::timeout(self.config.kill_timeout, child.wait()).await;
        if waited.is_err() {
            tracing::warn!(pid = %pid, "child did not exit within kill timeout, escalating to SIGKILL");
            let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGKILL);
        }
    }

    async fn reap_child(&mut self) -> i32 {
        match self.child.as_mut() {
            Some(child) => match child.wait().await {
                Ok(status) => exit_code_for(status),
                Err(_) => 255,
            },
            None => 0,
        }
    }

    /// Teardown cleanup (§4.6): delete staged artifacts, send the
    /// best-effort exit notification, release the lock.
    async fn teardown(&mut self) {
        self.state = RuntimeState::Teardown;

        if self.xuser_written {
            xuser::remove(&self.dirs.xuser_file());
        }

        let _ = std::fs::remove_file(self.dirs.server_info());
        let _ = std::fs::remove_file(self.dirs.xorg_conf());
        let _ = std::fs::remove_file(self.dirs.xconfig());
        let _ = std::fs::remove_file(self.dirs.xauthority());

        if let Some(server_info) = self.server_info.take() {
            for edid_path in server_info.temp_edid_paths() {
                let _ = std::fs::remove_file(edid_path);
            }
        }

        if let Some(session) = self.session.as_mut() {
            let identity =
                Identity::new(self.config.hostname.clone(), self.identity.server_number);
            if let Err(e) = session.notify_exit(&identity).await {
                tracing::warn!(error = %e, "best-effort exit notification failed");
            }
        }
        self.session = None;

        let _ = self.lock.release_once();
        self.state = RuntimeState::Done;
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

/// Resolve `uid` to a POSIX username for the `xuser-N` record (§6.5),
/// falling back to the numeric uid if the passwd lookup fails or the
/// account no longer exists.
fn owner_username(uid: u32) -> String {
    match nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

fn exit_code_for(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map(|s| 128 + s).unwrap_or(255),
    }
}
