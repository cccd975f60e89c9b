//! Master Configuration resolution (C1, §4.1): parsing the on-disk XML
//! and picking the transport it implies, driven end-to-end through the
//! `DV_MASTER_CONFIG` override rather than the hardcoded default path.

use serial_test::serial;
use std::io::Write;

use dv_core::{master_config_path, MasterConfig, Mode, Transport, LOCAL_SSM_SOCKET};

fn write_master_config(contents: &str) -> tempfile::TempPath {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, "{contents}").expect("write");
    file.into_temp_path()
}

#[test]
#[serial]
fn standalone_mode_has_no_ssm_transport() {
    let path = write_master_config("<masterconfig><systemType>standalone</systemType></masterconfig>");
    std::env::set_var("DV_MASTER_CONFIG", &path);

    let resolved = master_config_path();
    assert_eq!(resolved, path.to_path_buf());

    let xml = std::fs::read_to_string(&resolved).expect("read");
    let config = MasterConfig::parse(&xml).expect("parse");
    assert!(matches!(config.mode, Mode::Standalone));
    assert!(config.transport().is_none());

    std::env::remove_var("DV_MASTER_CONFIG");
}

#[test]
#[serial]
fn managed_remote_host_resolves_to_tcp_transport() {
    let path = write_master_config(
        "<masterconfig><systemType>managed</systemType><ssmHost>ssm.example</ssmHost>\
         <ssmPort>7500</ssmPort></masterconfig>",
    );
    std::env::set_var("DV_MASTER_CONFIG", &path);

    let xml = std::fs::read_to_string(master_config_path()).expect("read");
    let config = MasterConfig::parse(&xml).expect("parse");
    match config.transport().expect("managed mode has a transport") {
        Transport::Tcp { host, port } => {
            assert_eq!(host, "ssm.example");
            assert_eq!(port, 7500);
        }
        Transport::Unix(_) => panic!("remote host must resolve to tcp, not unix"),
    }

    std::env::remove_var("DV_MASTER_CONFIG");
}

#[test]
#[serial]
fn managed_localhost_resolves_to_local_unix_socket() {
    let xml = "<masterconfig><systemType>managed</systemType><ssmHost>localhost</ssmHost>\
               <ssmPort>7500</ssmPort></masterconfig>";
    let config = MasterConfig::parse(xml).expect("parse");
    match config.transport().expect("managed mode has a transport") {
        Transport::Unix(path) => assert_eq!(path, std::path::PathBuf::from(LOCAL_SSM_SOCKET)),
        Transport::Tcp { .. } => panic!("localhost must resolve to the local unix socket"),
    }
}
