// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Virtual Variant entry point (C7, §4.7): no privilege elevation, no
//! Guardian layer, no Cluster Lock — the Tokio runtime is built directly
//! in `main`, unlike the privileged `dvsupervisor` binary.
//!
//! Usage: `dvsupervisor-virtual :N <binary> [args...]`

use std::path::PathBuf;

use dv_supervisor::{config::Config, signal_funnel, VirtualSupervisor};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (server_number, binary, extra_args) = match parse_args(&args) {
        Ok(v) => v,
        Err(msg) => {
            tracing::error!(%msg, "invalid arguments");
            std::process::exit(1);
        }
    };

    let invoking_uid = nix::unistd::getuid().as_raw();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "failed to build tokio runtime");
            std::process::exit(255);
        }
    };

    let exit_code = runtime.block_on(async move {
        run(server_number, binary, extra_args, invoking_uid).await
    });

    std::process::exit(exit_code);
}

fn parse_args(args: &[String]) -> Result<(u32, PathBuf, Vec<String>), String> {
    let mut iter = args.iter();
    let designator = iter.next().ok_or("missing display designator")?;
    let server_number = designator
        .strip_prefix(':')
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| format!("invalid display designator {designator:?}"))?;
    let binary = iter.next().ok_or("missing display-server binary path")?;
    Ok((server_number, PathBuf::from(binary), iter.cloned().collect()))
}

async fn run(server_number: u32, binary: PathBuf, extra_args: Vec<String>, invoking_uid: u32) -> i32 {
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

    let identity = dv_core::ServerIdentity::new(server_number, None);
    let supervisor = VirtualSupervisor::new(identity, config);

    match supervisor.run(binary, extra_args, invoking_uid, signals).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "virtual supervisor exited with error");
            255
        }
    }
}

fn init_tracing() {
    let filter = dv_core::log_filter_override().unwrap_or("info");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}
