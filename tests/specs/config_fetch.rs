//! Config Fetch & Materialize (C4, §4.4) against fake external tools —
//! the config generator contract (input/output/server-info paths, exit
//! code propagation) and standalone-mode local file reads.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use dv_core::{MasterConfig, Mode, RuntimeDirs};
use dv_supervisor::config::Config;
use dv_supervisor::config_fetch;

fn fake_config(runtime_dir: PathBuf, generator: PathBuf) -> Config {
    Config {
        hostname: "viz-test-host".to_string(),
        master_config: MasterConfig {
            mode: Mode::Standalone,
        },
        runtime_dir,
        quiescence_delay: std::time::Duration::from_millis(1),
        kill_timeout: std::time::Duration::from_millis(50),
        config_generator: generator,
        auth_materializer: PathBuf::from("/bin/true"),
        credential_mint: PathBuf::from("/bin/true"),
        display_server_binary: PathBuf::from("/bin/true"),
    }
}

fn write_executable_script(path: &std::path::Path, body: &str) {
    let mut file = std::fs::File::create(path).expect("create script");
    writeln!(file, "#!/bin/sh\n{body}").expect("write script");
    let mut perms = std::fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod");
}

#[tokio::test]
async fn standalone_fetch_reads_local_xml_by_server_number() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = RuntimeDirs::new(dir.path().to_path_buf(), 5);
    let standalone_dir = dir.path().join("standalone");
    std::fs::create_dir_all(&standalone_dir).expect("mkdir");
    std::fs::write(
        standalone_dir.join("Xconfig-5.xml"),
        "<serverconfig><hostname>h</hostname><server_number>5</server_number></serverconfig>",
    )
    .expect("write xconfig");

    let fetched = config_fetch::fetch_standalone(&dirs).expect("fetch");
    assert!(fetched.xml.contains("server_number"));
    assert!(fetched.owner.is_none());
}

#[tokio::test]
async fn materialize_invokes_generator_and_parses_server_info() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = RuntimeDirs::new(dir.path().to_path_buf(), 9);
    let generator_path = dir.path().join("fake-generator.sh");
    // $3 is the server-info output path the generator must populate.
    write_executable_script(
        &generator_path,
        r#"echo "<serverinfo><usesAllGPUs>true</usesAllGPUs></serverinfo>" > "$3""#,
    );

    let config = fake_config(dir.path().to_path_buf(), generator_path);
    let server_info = config_fetch::materialize(&config, &dirs, "<serverconfig/>", false)
        .await
        .expect("materialize");
    assert!(server_info.uses_all_gpus);
    assert!(dirs.xconfig().exists(), "staged xml should be written");
}

#[tokio::test]
async fn materialize_propagates_nonzero_generator_exit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dirs = RuntimeDirs::new(dir.path().to_path_buf(), 9);
    let generator_path = dir.path().join("failing-generator.sh");
    write_executable_script(&generator_path, "exit 7");

    let config = fake_config(dir.path().to_path_buf(), generator_path);
    let err = config_fetch::materialize(&config, &dirs, "<serverconfig/>", false)
        .await
        .expect_err("generator failure must propagate");
    assert!(matches!(
        err,
        dv_supervisor::SupervisorError::ConfigGenerator(7)
    ));
}
