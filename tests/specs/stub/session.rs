//! Command loop specs: exit status, output forwarding and GetEnv.

use crate::prelude::*;

#[test]
fn exit_status_becomes_process_exit_code() {
    for status in [0, 1, 3, 255] {
        let controller = Controller::start();
        let script = controller.serve(move |peer| {
            peer.read_handshake();
            peer.exit(status);
            peer.read_to_end()
        });

        controller
            .stub()
            .assert()
            .code(status)
            .stdout("")
            .stderr("");
        assert!(
            script.join().unwrap().is_empty(),
            "nothing follows the handshake"
        );
    }
}

#[test]
fn negative_status_is_truncated_by_the_host() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.exit(-1);
    });

    controller.stub().assert().code(255);
    script.join().unwrap();
}

#[test]
fn output_is_forwarded_verbatim() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.send_output(OutputStream::Stdout, b"building...\n");
        peer.send_output(OutputStream::Stderr, b"warning: unused\n");
        peer.send_output(OutputStream::Stdout, b"done\n");
        peer.exit(0);
    });

    controller
        .stub()
        .assert()
        .success()
        .stdout("building...\ndone\n")
        .stderr("warning: unused\n");
    script.join().unwrap();
}

#[test]
fn large_output_survives_buffer_refills() {
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let controller = Controller::start();
    let script = controller.serve(move |peer| {
        peer.read_handshake();
        peer.send_output(OutputStream::Stdout, &payload);
        peer.exit(0);
    });

    let output = controller.stub().assert().success().get_output().clone();
    assert_eq!(output.stdout.len(), expected.len());
    assert!(output.stdout == expected, "stdout differs from the payload");
    script.join().unwrap();
}

#[test]
fn get_env_returns_the_stub_environment() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        let handshake = peer.read_handshake();
        peer.send_command(Command::GetEnv);
        let first = peer.read_env_reply();
        peer.send_command(Command::GetEnv);
        let second = peer.read_env_reply();
        peer.exit(0);
        (handshake, first, second)
    });

    controller
        .stub()
        .env("ZZ_LAST", "z")
        .env("AA_FIRST", "a")
        .assert()
        .success();
    let (handshake, first, second) = script.join().unwrap();

    assert_eq!(first, second, "replies are stable");
    let mut entries: Vec<String> = first
        .iter()
        .map(|e| String::from_utf8(e.clone()).unwrap())
        .collect();
    entries.sort();
    let socket_dir = controller.socket_dir().display();
    similar_asserts::assert_eq!(
        entries,
        vec![
            "AA_FIRST=a".to_string(),
            format!("REMOTE_JOBS_CONNECTION_ID={CONNECTION_ID}"),
            format!("REMOTE_JOBS_SOCKET_DIR={socket_dir}"),
            "ZZ_LAST=z".to_string(),
        ]
    );

    // The fingerprint depends on the set of entries, not on their order.
    let fingerprint = rj_core::fingerprint::<u8, _>(&first);
    assert_eq!(handshake.fingerprint, fingerprint);
}

#[test]
fn unknown_opcode_exits_99() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.send(&4u32.to_le_bytes());
        peer.read_to_end()
    });

    controller
        .stub()
        .assert()
        .code(99)
        .stdout("")
        .stderr("controller version mismatch (opcode 4)\n");
    assert!(
        script.join().unwrap().is_empty(),
        "stub sends nothing after a mismatch"
    );
}

#[test]
fn controller_hangup_exits_99() {
    let controller = Controller::start();
    let script = controller.serve(|peer| {
        peer.read_handshake();
        peer.send_output(OutputStream::Stdout, b"partial");
        // Dropping the peer closes the connection mid-session.
    });

    controller
        .stub()
        .assert()
        .code(99)
        .stdout("partial")
        .stderr("controller closed communication unexpectedly\n");
    script.join().unwrap();
}
