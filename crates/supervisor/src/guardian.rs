// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Guardian Process (C5).
//!
//! Forks *before* any Tokio runtime is constructed — forking a
//! multi-threaded async runtime is unsound, so this is plain,
//! synchronous, signal-handler-and-`poll(2)` code. The parent becomes
//! the Guardian and never returns from [`split`]; the child becomes the
//! Supervisor, which goes on to build its own Tokio runtime.
//!
//! Handlers are async-signal-safe: each writes one byte to a raw
//! self-pipe and returns. All dispatch happens in [`run_guardian_loop`],
//! the funnel's sole consumer, per design note §9.

use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicI32, Ordering};

use nix::sys::signal::{sigaction, SigAction, SigHandler, SaFlags, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, fork, pipe, read, write, ForkResult, Pid};

const CODE_CHLD: u8 = b'0';
const CODE_TERM: u8 = b'1';
const CODE_USR1: u8 = b'2';
const CODE_INT: u8 = b'4';

static SELF_PIPE_WRITE: AtomicI32 = AtomicI32::new(-1);

extern "C" fn handle_signal(signum: libc_c_int) {
    let fd = SELF_PIPE_WRITE.load(Ordering::Relaxed);
    if fd < 0 {
        return;
    }
    let code = match signum {
        s if s == Signal::SIGCHLD as libc_c_int => CODE_CHLD,
        s if s == Signal::SIGTERM as libc_c_int => CODE_TERM,
        s if s == Signal::SIGUSR1 as libc_c_int => CODE_USR1,
        s if s == Signal::SIGINT as libc_c_int => CODE_INT,
        _ => return,
    };
    // SAFETY: fd was set by `split` before any handler could run, and
    // stays valid for the Guardian's lifetime; `write` on a single byte
    // is async-signal-safe.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    let _ = write(borrowed, &[code]);
}

// `nix`'s `Signal` discriminant type, named locally to avoid a direct
// `libc` dependency for one integer type alias.
#[allow(non_camel_case_types)]
type libc_c_int = i32;

/// Outcome of [`split`] in the Supervisor (child) process. The Guardian
/// (parent) process never returns from `split`.
pub struct SupervisorHandles {
    /// Read end of the caller-liveness pipe; its EOF means the Guardian
    /// has died (e.g. `SIGKILL`), which is the unambiguous signal that
    /// the original caller is gone (§4.5, §8 scenario 5).
    pub caller_liveness_read: OwnedFd,
}

/// Perform the Guardian/Supervisor fork (§4.5). Registers signal handlers
/// before forking so a race where the child exits before setup completes
/// cannot be missed.
pub fn split() -> nix::Result<SupervisorHandles> {
    let (liveness_read, liveness_write) = pipe()?;
    let (guardian_read, guardian_write) = pipe()?;

    SELF_PIPE_WRITE.store(guardian_write.as_raw_fd(), Ordering::Relaxed);
    install_handlers()?;

    // SAFETY: called before any threads exist and before a Tokio runtime
    // is built; the only work between fork and exec/exit in the parent
    // is async-signal-safe (`poll`, `read`, `write`, `waitpid`, `kill`).
    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            // Guardian owns the write end of the liveness pipe; its own
            // copy of the read end must close so only the Supervisor
            // holds it (§4.5).
            close(liveness_read.as_raw_fd())?;
            run_guardian_loop(child, guardian_read, liveness_write);
            unreachable!("run_guardian_loop exits the process")
        }
        ForkResult::Child => {
            close(guardian_read.as_raw_fd())?;
            close(guardian_write.as_raw_fd())?;
            drop(liveness_write);
            Ok(SupervisorHandles {
                caller_liveness_read: liveness_read,
            })
        }
    }
}

fn install_handlers() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: the handler only performs an async-signal-safe write.
    unsafe {
        sigaction(Signal::SIGCHLD, &action)?;
        sigaction(Signal::SIGTERM, &action)?;
        sigaction(Signal::SIGUSR1, &action)?;
        sigaction(Signal::SIGINT, &action)?;
    }
    Ok(())
}

/// The Guardian's event loop: blocks on its self-pipe, dispatches, and
/// on `SIGCHLD` reaps the Supervisor, mirrors its exit status, and exits
/// with the same code (§4.5). Never returns.
fn run_guardian_loop(supervisor: Pid, self_pipe_read: OwnedFd, liveness_write: OwnedFd) -> ! {
    let mut buf = [0u8; 1];
    loop {
        match read(&self_pipe_read, &mut buf) {
            Ok(0) => continue,
            Ok(_) => {}
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => continue,
        }
        match buf[0] {
            CODE_TERM => {
                let _ = nix::sys::signal::kill(supervisor, Signal::SIGTERM);
            }
            CODE_INT => {
                let _ = nix::sys::signal::kill(supervisor, Signal::SIGINT);
            }
            CODE_USR1 => {
                let _ = nix::sys::signal::kill(Pid::parent(), Signal::SIGUSR1);
            }
            CODE_CHLD => match waitpid(supervisor, Some(nix::sys::wait::WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(_, code)) => {
                    drop(liveness_write);
                    std::process::exit(code);
                }
                Ok(WaitStatus::Signaled(_, sig, _)) => {
                    drop(liveness_write);
                    std::process::exit(128 + sig as i32);
                }
                _ => continue,
            },
            _ => continue,
        }
    }
}

/// The raw fd a Supervisor holds for detecting Guardian death. Exposed as
/// a free function so `main.rs` can hand it to the Tokio runtime without
/// this module depending on Tokio.
pub fn raw_fd(handles: &SupervisorHandles) -> RawFd {
    handles.caller_liveness_read.as_raw_fd()
}
