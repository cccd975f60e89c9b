// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Vizstack Project Contributors

//! Argument sanitization (§4.4/§6.4).
//!
//! The caller's argument vector is filtered before anything privileged
//! happens: a fixed deny-list is rejected outright, the display
//! designator and `-auth` flag are captured, and two supervisor-only
//! flags are consumed rather than forwarded.

use std::path::PathBuf;

use crate::error::SupervisorError;

/// Flags that would subvert the generated configuration (§4.4). Presence
/// anywhere in argv is a fatal error, checked before any fork, lock
/// acquisition, or SSM connection (§8 scenario 6).
const DENY_LIST: &[&str] = &["-config", "-layout", "-sharevts", "-novtswitch"];

/// True if `token` names a deny-listed flag, with or without its leading
/// dash. Shared by argv sanitization and by the config generator's extra
/// arguments (§4.4: "same deny-list applied").
pub fn is_denied(token: &str) -> bool {
    let bare = token.trim_start_matches('-');
    DENY_LIST.iter().any(|d| d.trim_start_matches('-') == bare)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// The `:N` display designator, if present.
    pub display_designator: Option<String>,
    /// Path named by `-auth`, if present.
    pub auth_file: Option<PathBuf>,
    pub rgs_prompt_user: bool,
    pub ignore_missing_devices: bool,
    /// Everything else, in original order, to be forwarded to the
    /// display server alongside the generated config arguments.
    pub remaining: Vec<String>,
}

impl ParsedArgs {
    pub fn server_number(&self) -> Option<u32> {
        self.display_designator
            .as_deref()
            .and_then(|d| d.strip_prefix(':'))
            .and_then(|n| n.parse().ok())
    }
}

/// Parse and sanitize `args` (not including argv[0]).
///
/// `-auth <path>` is validated against the invoking (real) user's
/// read access to `path`, as required before privilege elevation.
pub fn parse(args: &[String]) -> Result<ParsedArgs, SupervisorError> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter().peekable();

    while let Some(arg) = iter.next() {
        if DENY_LIST.contains(&arg.as_str()) {
            return Err(SupervisorError::ArgumentDenied(arg.clone()));
        }
        match arg.as_str() {
            "-auth" => {
                let path = iter
                    .next()
                    .ok_or_else(|| SupervisorError::ArgumentDenied("-auth requires a path".into()))?;
                let path = PathBuf::from(path);
                check_readable(&path)?;
                parsed.auth_file = Some(path);
            }
            "--rgs-prompt-user" => parsed.rgs_prompt_user = true,
            "--ignore-missing-devices" => parsed.ignore_missing_devices = true,
            _ if arg.starts_with(':') && parsed.display_designator.is_none() => {
                parsed.display_designator = Some(arg.clone());
            }
            _ => parsed.remaining.push(arg.clone()),
        }
    }

    Ok(parsed)
}

fn check_readable(path: &std::path::Path) -> Result<(), SupervisorError> {
    std::fs::File::open(path)
        .map(|_| ())
        .map_err(|e| SupervisorError::ArgumentDenied(format!("-auth file {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_display_designator() {
        let args = vec![":7".to_string()];
        let parsed = parse(&args).expect("parse");
        assert_eq!(parsed.display_designator.as_deref(), Some(":7"));
        assert_eq!(parsed.server_number(), Some(7));
    }

    #[test]
    fn deny_listed_flag_is_rejected() {
        let args = vec!["-config".to_string(), "foo".to_string()];
        assert!(matches!(
            parse(&args),
            Err(SupervisorError::ArgumentDenied(_))
        ));
    }

    #[test]
    fn supervisor_only_flags_are_consumed_not_forwarded() {
        let args = vec![
            ":7".to_string(),
            "--rgs-prompt-user".to_string(),
            "--ignore-missing-devices".to_string(),
            "-extra".to_string(),
        ];
        let parsed = parse(&args).expect("parse");
        assert!(parsed.rgs_prompt_user);
        assert!(parsed.ignore_missing_devices);
        assert_eq!(parsed.remaining, vec!["-extra".to_string()]);
    }

    #[test]
    fn auth_file_must_be_readable() {
        let args = vec!["-auth".to_string(), "/no/such/file".to_string()];
        assert!(matches!(
            parse(&args),
            Err(SupervisorError::ArgumentDenied(_))
        ));
    }

    #[test]
    fn auth_file_readable_is_captured() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        let args = vec!["-auth".to_string(), file.path().display().to_string()];
        let parsed = parse(&args).expect("parse");
        assert_eq!(parsed.auth_file, Some(file.path().to_path_buf()));
    }
}
