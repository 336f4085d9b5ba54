//! PTY process capability.
//!
//! Wraps `portable-pty` behind the [`PtySpawner`]/[`PtyPort`] traits so the
//! session logic never touches the OS PTY directly. Output is pumped by a
//! reader thread into an mpsc channel and drained non-blockingly on the
//! owner thread, so no read ever stalls the host's event loop.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to open PTY: {0}")]
    Open(anyhow::Error),

    #[error("failed to spawn shell '{shell}': {cause}")]
    Spawn {
        shell: String,
        cause: anyhow::Error,
    },

    #[error("failed to write to PTY: {0}")]
    Write(std::io::Error),

    #[error("failed to resize PTY: {0}")]
    Resize(anyhow::Error),

    #[error("failed to kill PTY process: {0}")]
    Kill(std::io::Error),
}

pub type Result<T> = std::result::Result<T, PtyError>;

/// What to spawn and how.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub shell: String,
    pub args: Vec<String>,
    pub cols: u16,
    pub rows: u16,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl SpawnSpec {
    /// Build a spec from the configured shell override and the host's
    /// project root, with the standard resolution chain for both.
    pub fn new(
        shell_override: Option<&str>,
        project_root: Option<&Path>,
        cols: u16,
        rows: u16,
    ) -> Self {
        Self {
            shell: resolve_shell(shell_override),
            args: Vec::new(),
            cols,
            rows,
            cwd: resolve_cwd(project_root),
            env: vec![("TERM".to_string(), "xterm-256color".to_string())],
        }
    }
}

/// Shell resolution: explicit override, then `$SHELL`, then the platform
/// default.
pub fn resolve_shell(override_shell: Option<&str>) -> String {
    if let Some(shell) = override_shell {
        return shell.to_string();
    }
    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.is_empty() {
            return shell;
        }
    }
    #[cfg(windows)]
    {
        "powershell.exe".to_string()
    }
    #[cfg(not(windows))]
    {
        "/bin/zsh".to_string()
    }
}

/// Working directory resolution: host project root, then `$HOME`, then the
/// process cwd, then `/`.
pub fn resolve_cwd(project_root: Option<&Path>) -> PathBuf {
    if let Some(root) = project_root {
        if root.is_dir() {
            return root.to_path_buf();
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        return cwd;
    }
    PathBuf::from("/")
}

/// One spawned PTY process, exclusively owned by a session.
pub trait PtyPort {
    /// Drain all output chunks received since the last call (non-blocking).
    fn drain(&mut self) -> Vec<Vec<u8>>;

    /// Write input bytes to the shell.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Resize the PTY grid.
    fn resize(&mut self, cols: u16, rows: u16) -> Result<()>;

    /// Terminate the process.
    fn kill(&mut self) -> Result<()>;

    /// Whether the process is still believed to be running.
    fn is_running(&mut self) -> bool;
}

/// Spawns PTY processes; the native implementation uses `portable-pty`.
pub trait PtySpawner {
    fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn PtyPort>>;
}

/// `portable-pty`-backed spawner.
pub struct NativePtySpawner;

impl PtySpawner for NativePtySpawner {
    fn spawn(&self, spec: &SpawnSpec) -> Result<Box<dyn PtyPort>> {
        Ok(Box::new(NativePtyPort::spawn(spec)?))
    }
}

/// Native PTY handle: master + child + reader thread.
pub struct NativePtyPort {
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send>,
    writer: Box<dyn Write + Send>,
    output_rx: Receiver<Vec<u8>>,
    running: Arc<AtomicBool>,
    reader_thread: Option<JoinHandle<()>>,
}

impl NativePtyPort {
    fn spawn(spec: &SpawnSpec) -> Result<Self> {
        let pty_system = native_pty_system();
        let size = PtySize {
            rows: spec.rows,
            cols: spec.cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        let pair = pty_system.openpty(size).map_err(PtyError::Open)?;

        let mut cmd = CommandBuilder::new(&spec.shell);
        cmd.args(&spec.args);
        cmd.cwd(&spec.cwd);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|cause| PtyError::Spawn {
                shell: spec.shell.clone(),
                cause,
            })?;

        let mut reader = pair.master.try_clone_reader().map_err(PtyError::Open)?;
        let writer = pair.master.take_writer().map_err(PtyError::Open)?;

        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel::<Vec<u8>>();

        // Reader thread: blocking reads, chunks forwarded in arrival order.
        // Exits on EOF (process exit or master drop) or channel close.
        let thread_running = running.clone();
        let reader_thread = thread::spawn(move || {
            let mut buffer = vec![0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) => {
                        thread_running.store(false, Ordering::SeqCst);
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            thread_running.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                    Err(_) => {
                        thread_running.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }
        });

        debug!(shell = %spec.shell, cols = spec.cols, rows = spec.rows, "spawned PTY");

        Ok(Self {
            master: pair.master,
            child,
            writer,
            output_rx: rx,
            running,
            reader_thread: Some(reader_thread),
        })
    }
}

impl PtyPort for NativePtyPort {
    fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        loop {
            match self.output_rx.try_recv() {
                Ok(chunk) => chunks.push(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
        chunks
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).map_err(PtyError::Write)?;
        self.writer.flush().map_err(PtyError::Write)
    }

    fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        let size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self.master.resize(size).map_err(PtyError::Resize)
    }

    fn kill(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.child.kill().map_err(PtyError::Kill)
    }

    fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) | Err(_) => false,
        }
    }
}

impl Drop for NativePtyPort {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(err) = self.child.kill() {
            warn!(error = %err, "failed to kill PTY process on drop");
        }
        // Dropping the master closes the PTY and unblocks the reader
        // thread; it exits on its own, so no join is needed here.
        self.reader_thread.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_shell_override_wins() {
        assert_eq!(resolve_shell(Some("/bin/fish")), "/bin/fish");
    }

    #[test]
    fn test_resolve_cwd_prefers_project_root() {
        let root = std::env::temp_dir();
        assert_eq!(resolve_cwd(Some(&root)), root);
    }

    #[test]
    fn test_resolve_cwd_skips_missing_root() {
        let cwd = resolve_cwd(Some(Path::new("/no/such/directory/termdock")));
        assert_ne!(cwd, Path::new("/no/such/directory/termdock"));
    }

    #[test]
    fn test_spawn_spec_defaults() {
        let spec = SpawnSpec::new(Some("/bin/sh"), None, 80, 24);
        assert_eq!(spec.shell, "/bin/sh");
        assert_eq!((spec.cols, spec.rows), (80, 24));
        assert!(spec
            .env
            .iter()
            .any(|(k, v)| k == "TERM" && v == "xterm-256color"));
    }

    #[test]
    fn test_spawn_error_display_names_shell() {
        let err = PtyError::Spawn {
            shell: "/no/such/shell".to_string(),
            cause: anyhow::anyhow!("exec failed"),
        };
        assert!(err.to_string().contains("/no/such/shell"));
    }
}
