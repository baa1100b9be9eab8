//! Connection specs: handshake contents, endpoint naming and cleanup.

use std::path::Path;

use crate::prelude::*;

#[test]
fn handshake_describes_the_process() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        let handshake = peer.read_handshake();
        let client = peer.client_path().map(Path::to_path_buf);
        peer.exit(0);
        (handshake, client)
    });

    controller
        .stub()
        .args(["make", "-j4", ""])
        .assert()
        .success();
    let (handshake, client) = script.join().unwrap();

    assert_eq!(handshake.magic, MAGIC_VERSION);
    assert_eq!(handshake.args.len(), 4);
    assert_eq!(
        &handshake.args[1..],
        &[b"make".to_vec(), b"-j4".to_vec(), Vec::new()]
    );
    let cwd = std::fs::canonicalize(controller.socket_dir()).unwrap();
    assert_eq!(handshake.cwd, cwd.as_os_str().as_encoded_bytes());
    assert_eq!(handshake.fingerprint.len(), 16);

    let client = client.unwrap();
    assert_eq!(client.parent(), Some(controller.socket_dir()));
    let name = client.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(&format!("{CONNECTION_ID}C")), "{name}");
}

#[test]
fn client_socket_is_removed_after_exit() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        let bound = peer.client_path().is_some_and(Path::exists);
        peer.exit(7);
        bound
    });

    controller.stub().assert().code(7);
    assert!(
        script.join().unwrap(),
        "client socket exists while connected"
    );
    let leftover = controller.client_files();
    assert!(leftover.is_empty(), "{leftover:?}");
}

#[test]
fn client_socket_is_removed_after_a_fatal_error() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.send(&42u32.to_le_bytes());
        peer.read_to_end();
    });

    controller.stub().assert().code(99);
    script.join().unwrap();
    let leftover = controller.client_files();
    assert!(leftover.is_empty(), "{leftover:?}");
}

#[test]
fn missing_controller_exits_99() {
    let controller = Controller::absent();

    let assert = controller.stub().assert().code(99).stdout("");
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(
        stderr.starts_with("cannot connect to controller"),
        "{stderr}"
    );
    let leftover = controller.client_files();
    assert!(leftover.is_empty(), "{leftover:?}");
}

#[test]
fn overlong_connection_id_exits_99() {
    let controller = Controller::absent();

    controller
        .stub()
        .env("REMOTE_JOBS_CONNECTION_ID", "x".repeat(200))
        .assert()
        .code(99)
        .stderr("connection id too long\n");
}

#[test]
fn socket_directory_is_created_on_demand() {
    let controller = Controller::absent();
    let nested = controller.socket_dir().join("sockets");

    controller
        .stub()
        .env("REMOTE_JOBS_SOCKET_DIR", &nested)
        .assert()
        .code(99);
    assert!(nested.is_dir());
}

#[test]
fn log_file_records_the_session() {
    let controller = Controller::start();
    let log = controller.socket_dir().join("stub.log");
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.send_output(OutputStream::Stdout, b"hi");
        peer.exit(5);
    });

    controller
        .stub()
        .env("REMOTE_JOBS_LOG", &log)
        .env("REMOTE_JOBS_LOG_LEVEL", "debug")
        .assert()
        .code(5)
        .stdout("hi")
        .stderr("");
    script.join().unwrap();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.contains("connected to controller"), "{contents}");
    assert!(contents.contains("handshake sent"), "{contents}");
    assert!(contents.contains("exit_code=5"), "{contents}");
}
