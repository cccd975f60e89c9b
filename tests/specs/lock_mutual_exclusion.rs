//! Invariant (spec §8): at most one supervisor holds the Cluster Lock at
//! any instant. Exercised with two independent `ClusterLock` handles (two
//! separate file descriptions on the same path), mirroring two competing
//! supervisor processes.

use std::sync::mpsc;
use std::time::Duration;

use dv_supervisor::lock::ClusterLock;

#[test]
fn second_acquirer_waits_for_first_to_release() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vs-X3");

    let mut first = ClusterLock::new(path.clone());
    first.take_once().expect("first take");

    let (tx, rx) = mpsc::channel();
    let second_path = path.clone();
    let handle = std::thread::spawn(move || {
        let mut second = ClusterLock::new(second_path);
        second.take_once().expect("second take, after release");
        tx.send(()).expect("signal acquired");
    });

    // The second thread must not have acquired the lock yet.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    first.release_once().expect("release");
    rx.recv_timeout(Duration::from_secs(5))
        .expect("second thread acquires once released");
    handle.join().expect("join");
}

#[test]
fn crash_recovery_via_implicit_release() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vs-X4");

    {
        let mut crashed = ClusterLock::new(path.clone());
        crashed.take_once().expect("take");
        // Dropped without calling release_once — simulates a supervisor
        // killed with SIGKILL while holding the lock (§8 "Crash safety").
    }

    let mut recovered = ClusterLock::new(path);
    recovered.take_once().expect("lock recoverable without operator intervention");
}
