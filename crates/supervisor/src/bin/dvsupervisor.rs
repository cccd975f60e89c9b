// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Privileged supervisor entry point. Performs argument sanitization and
//! the Guardian/Supervisor fork *before* building a Tokio runtime
//! (§4.5) — forking a multi-threaded async runtime is unsound.

use std::path::PathBuf;

use dv_supervisor::{argv, config::Config, guardian, signal_funnel, Supervisor, SupervisorError};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed_args = match argv::parse(&args) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "argument rejected");
            std::process::exit(1);
        }
    };

    let server_number = match parsed_args.server_number() {
        Some(n) => n,
        None => {
            tracing::error!("no display designator (`:N`) on the command line");
            std::process::exit(1);
        }
    };

    let invoking_uid = nix::unistd::getuid().as_raw();

    // Guardian/Supervisor split happens here, synchronously, before any
    // runtime exists. The Guardian branch of `split` never returns.
    let handles = match guardian::split() {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(error = %e, "failed to fork guardian/supervisor");
            std::process::exit(255);
        }
    };

    // §4.6 "Privilege elevation": set both real and effective uid/gid to
    // root. Required by the display server's loadable modules, not by
    // any operation the supervisor itself performs.
    let elevated = nix::unistd::setregid(nix::unistd::Gid::from_raw(0), nix::unistd::Gid::from_raw(0))
        .and_then(|_| nix::unistd::setreuid(nix::unistd::Uid::from_raw(0), nix::unistd::Uid::from_raw(0)));
    if let Err(e) = elevated {
        tracing::error!(error = %e, "privilege elevation failed");
        std::process::exit(255);
    }

    let caller_liveness_fd = guardian::raw_fd(&handles);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to build tokio runtime");
            std::process::exit(255);
        }
    };

    let exit_code = runtime.block_on(async move {
        run_supervisor(parsed_args, server_number, invoking_uid, caller_liveness_fd).await
    });

    std::process::exit(exit_code);
}

async fn run_supervisor(
    parsed_args: argv::ParsedArgs,
    server_number: u32,
    invoking_uid: u32,
    caller_liveness_fd: std::os::fd::RawFd,
) -> i32 {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to load master configuration");
            return 255;
        }
    };

    let signals = match signal_funnel::install() {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(error = %e, "failed to install signal funnel");
            return 255;
        }
    };

    let lock_path = dv_core::lock_path(server_number);
    let identity = dv_core::ServerIdentity::new(server_number, None);
    let binary: PathBuf = config.display_server_binary.clone();

    let supervisor = Supervisor::new(
        identity,
        config,
        dv_wire::ServerTypeTag::Normal,
        lock_path,
    );

    match supervisor
        .run(parsed_args, binary, invoking_uid, signals, caller_liveness_fd)
        .await
    {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "supervisor exited with error");
            fatal_code(&e)
        }
    }
}

fn fatal_code(_e: &SupervisorError) -> i32 {
    255
}

fn init_tracing() {
    let filter = dv_core::log_filter_override().unwrap_or("info");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}
