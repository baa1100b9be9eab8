//! Scripted controller and stub runner shared by the specs.

use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub use rj_wire::test_support::DecodedHandshake;
pub use rj_wire::{Command, OutputStream, MAGIC_VERSION};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Connection id used by every spec; each spec has its own socket directory.
pub const CONNECTION_ID: &str = "1";

/// Path to a freshly built `rj-stub`.
///
/// The binary belongs to another workspace member, so cargo does not build
/// it for this test target. Build it once into the same target directory.
pub fn stub_binary() -> &'static Path {
    static BINARY: OnceLock<PathBuf> = OnceLock::new();
    BINARY.get_or_init(|| {
        // <target>/<profile>/deps/specs-<hash>
        let exe = std::env::current_exe().unwrap();
        let profile_dir = exe.parent().and_then(Path::parent).unwrap();
        let target_dir = profile_dir.parent().unwrap();

        let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
        let mut build = process::Command::new(cargo);
        build
            .args(["build", "--quiet", "-p", "rj-stub", "--bin", "rj-stub"])
            .arg("--target-dir")
            .arg(target_dir)
            .current_dir(env!("CARGO_MANIFEST_DIR"));
        if profile_dir.file_name().is_some_and(|name| name == "release") {
            build.arg("--release");
        }
        let status = build.status().unwrap();
        assert!(status.success(), "building rj-stub failed: {status}");

        let binary = profile_dir.join(format!("rj-stub{}", std::env::consts::EXE_SUFFIX));
        assert!(binary.is_file(), "missing {}", binary.display());
        binary
    })
}

/// A private socket directory with an optional listening controller.
pub struct Controller {
    dir: tempfile::TempDir,
    listener: Option<UnixListener>,
}

impl Controller {
    /// Socket directory with a controller listening on `<dir>/1S`.
    pub fn start() -> Self {
        let mut controller = Self::absent();
        let listener = UnixListener::bind(controller.endpoint()).unwrap();
        listener.set_nonblocking(true).unwrap();
        controller.listener = Some(listener);
        controller
    }

    /// Socket directory where nothing is listening.
    pub fn absent() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            listener: None,
        }
    }

    pub fn socket_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn endpoint(&self) -> PathBuf {
        self.socket_dir().join(format!("{CONNECTION_ID}S"))
    }

    /// Socket files currently in the directory, excluding the controller's.
    pub fn client_files(&self) -> Vec<PathBuf> {
        let endpoint = self.endpoint();
        std::fs::read_dir(self.socket_dir())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| *path != endpoint)
            .collect()
    }

    /// A stub command pointed at this controller, with a minimal environment.
    pub fn stub(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(stub_binary());
        cmd.env_clear()
            .env("REMOTE_JOBS_SOCKET_DIR", self.socket_dir())
            .env("REMOTE_JOBS_CONNECTION_ID", CONNECTION_ID)
            .current_dir(self.socket_dir())
            .timeout(TIMEOUT);
        cmd
    }

    /// Accept one stub connection on a background thread and run `script`.
    pub fn serve<T, F>(&self, script: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Peer) -> T + Send + 'static,
    {
        let listener = self.listener.as_ref().unwrap().try_clone().unwrap();
        thread::spawn(move || {
            let mut peer = Peer::accept(&listener);
            script(&mut peer)
        })
    }
}

/// The controller's end of one connection.
pub struct Peer {
    stream: UnixStream,
    client_path: Option<PathBuf>,
}

impl Peer {
    fn accept(listener: &UnixListener) -> Self {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    stream.set_nonblocking(false).unwrap();
                    stream.set_read_timeout(Some(TIMEOUT)).unwrap();
                    let client_path = addr.as_pathname().map(Path::to_path_buf);
                    return Self { stream, client_path };
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock && Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => panic!("stub never connected: {e}"),
            }
        }
    }

    /// Path the stub bound its end of the socket to.
    pub fn client_path(&self) -> Option<&Path> {
        self.client_path.as_deref()
    }

    pub fn read_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.stream.read_exact(&mut buf).unwrap();
        u32::from_le_bytes(buf)
    }

    pub fn read_string(&mut self) -> Vec<u8> {
        let len = self.read_u32() as usize;
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).unwrap();
        buf
    }

    pub fn read_handshake(&mut self) -> DecodedHandshake {
        let magic = self.read_u32();
        let argc = self.read_u32();
        let args = (0..argc).map(|_| self.read_string()).collect();
        let cwd = self.read_string();
        let fingerprint = self.read_string();
        DecodedHandshake {
            magic,
            args,
            cwd,
            fingerprint,
        }
    }

    pub fn read_env_reply(&mut self) -> Vec<Vec<u8>> {
        let count = self.read_u32();
        (0..count).map(|_| self.read_string()).collect()
    }

    /// Everything the stub sends until it closes the connection.
    pub fn read_to_end(&mut self) -> Vec<u8> {
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest).unwrap();
        rest
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).unwrap();
    }

    pub fn send_command(&mut self, command: Command) {
        self.send(&command.encode());
    }

    pub fn send_output(&mut self, stream: OutputStream, payload: &[u8]) {
        let length = u32::try_from(payload.len()).unwrap();
        self.send_command(Command::Write { stream, length });
        self.send(payload);
    }

    pub fn exit(&mut self, status: i32) {
        self.send_command(Command::Exit { status });
    }
}
