//! Scenario 6 (spec §8): a deny-listed flag is rejected immediately, with
//! no process fork, no lock acquisition, and no SSM connection attempted
//! — here verified at the layer that makes those downstream side effects
//! impossible: sanitization happens before any of them can run.

use dv_supervisor::argv;

#[test]
fn config_flag_is_rejected_before_anything_else() {
    let args = vec![":0".to_string(), "-config".to_string(), "foo".to_string()];
    let err = argv::parse(&args).expect_err("deny-listed flag must be rejected");
    assert!(matches!(err, dv_supervisor::SupervisorError::ArgumentDenied(_)));
}

#[test]
fn layout_sharevts_and_novtswitch_are_also_denied() {
    for flag in ["-layout", "-sharevts", "-novtswitch"] {
        let args = vec![":0".to_string(), flag.to_string()];
        assert!(argv::parse(&args).is_err(), "{flag} should be denied");
    }
}

#[test]
fn ordinary_launch_is_accepted() {
    let args = vec![
        ":3".to_string(),
        "--rgs-prompt-user".to_string(),
        "-extra-flag".to_string(),
    ];
    let parsed = argv::parse(&args).expect("valid argv");
    assert_eq!(parsed.server_number(), Some(3));
    assert!(parsed.rgs_prompt_user);
    assert_eq!(parsed.remaining, vec!["-extra-flag".to_string()]);
}
