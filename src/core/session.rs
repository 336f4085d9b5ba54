//! Session management
//!
//! A [`TerminalSession`] owns one PTY process paired with one VT engine
//! instance and multiplexes data between them. It is pure logic: UI event
//! listeners are handed in as [`Subscription`] values, and all I/O arrives
//! through the capability traits, so the state machine is testable without
//! a host harness.
//!
//! # Lifecycle
//!
//! ```text
//! Created -> Starting -> Running -> Stopping -> Stopped
//! ```
//!
//! `stop()` is idempotent and tears down in a fixed order: UI
//! subscriptions, resize observer, PTY process, engine instance. The
//! engine is released even when the kill fails, so no native buffer leaks
//! on a partial teardown. A re-entrant `start()` on a running session
//! performs the same teardown first (restart), guaranteeing that no two
//! PTY/engine pairs are ever wired to the same slot.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::engine::{EngineFactory, VtEngine};
use super::pty::{PtyError, PtyPort, PtySpawner, SpawnSpec};
use crate::config::Theme;

/// Opaque session identity, unique for the registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("VT engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("failed to start shell: {0}")]
    PtySpawn(#[from] PtyError),
}

/// A cancellable handle to a UI-side listener or observer.
///
/// Subscribing returns one of these; teardown cancels every outstanding
/// handle exactly once. Dropping an uncancelled subscription cancels it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// One terminal session: PTY process + VT engine + wiring.
pub struct TerminalSession {
    id: SessionId,
    lifecycle: Lifecycle,
    /// Exclusively owned engine instance; never shared
    engine: Option<Box<dyn VtEngine>>,
    /// Exclusively owned PTY process; never shared
    pty: Option<Box<dyn PtyPort>>,
    /// UI listeners (key, paste, focus), cancelled first on teardown
    subscriptions: Vec<Subscription>,
    /// Resize observer, cancelled after the listeners
    resize_observer: Option<Subscription>,
    cols: u16,
    rows: u16,
    scrollback: usize,
    /// Human-readable status; carries the diagnostic in placeholder state
    status: String,
}

impl TerminalSession {
    pub fn new(id: SessionId, scrollback: usize) -> Self {
        Self {
            id,
            lifecycle: Lifecycle::Created,
            engine: None,
            pty: None,
            subscriptions: Vec::new(),
            resize_observer: None,
            cols: 80,
            rows: 24,
            scrollback,
            status: String::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Current status line (engine version, or the placeholder diagnostic)
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Session size as `(cols, rows)`
    pub fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Whether the session is degraded: created but with no engine wired
    pub fn is_placeholder(&self) -> bool {
        self.lifecycle == Lifecycle::Created && self.engine.is_none()
    }

    /// Record the engine-acquisition failure and stay in placeholder state
    pub fn mark_engine_unavailable(&mut self, message: &str) {
        warn!(id = %self.id, message, "VT engine unavailable, session degraded");
        self.status = message.to_string();
    }

    /// Start the session: create the engine, spawn the PTY, wire them up.
    ///
    /// Calling this on a running session restarts it. On spawn failure the
    /// engine instance created so far is released before returning.
    pub fn start(
        &mut self,
        factory: &dyn EngineFactory,
        spawner: &dyn PtySpawner,
        spec: &SpawnSpec,
    ) -> Result<(), SessionError> {
        if self.engine.is_some() || self.pty.is_some() {
            debug!(id = %self.id, "restarting running session");
            self.teardown();
        }
        self.lifecycle = Lifecycle::Starting;

        let engine = factory.create(spec.cols, spec.rows, self.scrollback);

        let pty = match spawner.spawn(spec) {
            Ok(pty) => pty,
            Err(err) => {
                // Partial failure: the engine was already created and must
                // not leak.
                drop(engine);
                self.status = format!("Failed to start shell: {err}");
                self.lifecycle = Lifecycle::Stopped;
                return Err(SessionError::PtySpawn(err));
            }
        };

        self.engine = Some(engine);
        self.pty = Some(pty);
        self.cols = spec.cols;
        self.rows = spec.rows;
        self.status = format!("Engine loaded: {}", factory.version());
        self.lifecycle = Lifecycle::Running;
        info!(id = %self.id, shell = %spec.shell, cols = spec.cols, rows = spec.rows, "session started");
        Ok(())
    }

    /// Track a UI listener subscription for teardown
    pub fn track(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Install the resize observer subscription, replacing any previous one
    pub fn set_resize_observer(&mut self, subscription: Subscription) {
        if let Some(previous) = self.resize_observer.replace(subscription) {
            previous.cancel();
        }
    }

    /// Drain PTY output and feed it to the engine in arrival order.
    ///
    /// Returns true if any bytes were fed, i.e. a repaint is warranted.
    /// Feeding is never skipped, reordered, or batched across chunk
    /// boundaries; only paint requests are coalesced, downstream.
    pub fn pump(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        let (Some(pty), Some(engine)) = (self.pty.as_mut(), self.engine.as_mut()) else {
            return false;
        };
        let chunks = pty.drain();
        if chunks.is_empty() {
            return false;
        }
        for chunk in &chunks {
            engine.feed(chunk);
        }
        true
    }

    /// Write input bytes to the shell.
    ///
    /// Returns true if the bytes were forwarded. Write failures against a
    /// dying process are swallowed and logged; a live session is not
    /// interrupted by a transient input failure.
    pub fn write_input(&mut self, bytes: &[u8]) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }
        let Some(pty) = self.pty.as_mut() else {
            return false;
        };
        match pty.write(bytes) {
            Ok(()) => true,
            Err(err) => {
                warn!(id = %self.id, error = %err, "PTY write failed");
                false
            }
        }
    }

    /// Forward pasted text to the shell. Returns true if forwarded, in
    /// which case the host must suppress the originating event.
    pub fn paste(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.write_input(text.as_bytes())
    }

    /// Resize engine and PTY as one logical operation.
    ///
    /// The engine resize and the PTY resize are decoupled failure domains:
    /// a PTY resize against an exited process is swallowed and logged, and
    /// the already-applied engine resize is not rolled back.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(2);
        let rows = rows.max(2);
        if let Some(engine) = self.engine.as_mut() {
            engine.resize(cols, rows);
        }
        if let Some(pty) = self.pty.as_mut() {
            if let Err(err) = pty.resize(cols, rows) {
                warn!(id = %self.id, error = %err, "PTY resize failed");
            }
        }
        self.cols = cols;
        self.rows = rows;
    }

    /// Current viewport snapshot, if an engine is wired
    pub fn snapshot(&self) -> Option<String> {
        self.engine.as_ref().map(|engine| engine.snapshot())
    }

    /// Re-push the palette to the engine
    pub fn sync_theme(&mut self, theme: &Theme) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_theme(theme);
        }
    }

    /// Stop the session. Idempotent; safe on a session that never started.
    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::Stopped {
            return;
        }
        self.lifecycle = Lifecycle::Stopping;
        self.teardown();
        self.lifecycle = Lifecycle::Stopped;
        info!(id = %self.id, "session stopped");
    }

    /// Fixed-order teardown. Best-effort throughout: a failing step is
    /// logged and the remaining steps still run.
    fn teardown(&mut self) {
        // 1. Detach UI listeners so no new events arrive mid-teardown.
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }

        // 2. Disconnect the resize observer.
        if let Some(observer) = self.resize_observer.take() {
            observer.cancel();
        }

        // 3. Terminate the PTY process.
        if let Some(mut pty) = self.pty.take() {
            if let Err(err) = pty.kill() {
                warn!(id = %self.id, error = %err, "failed to kill PTY process");
            }
        }

        // 4. Release the engine instance, also when the kill failed.
        self.engine = None;
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("size", &(self.cols, self.rows))
            .finish()
    }
}

/// Counting fakes shared by the session and registry tests.
#[cfg(test)]
pub(crate) mod testkit {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::config::Theme;
    use crate::core::engine::{EngineError, EngineFactory, EngineLoader, VtEngine};
    use crate::core::pty::{PtyError, PtyPort, PtySpawner, Result as PtyResult, SpawnSpec};

    /// Shared counters observing resource liveness from outside.
    #[derive(Clone, Default)]
    pub struct Counters {
        pub live_engines: Rc<Cell<usize>>,
        pub live_ptys: Rc<Cell<usize>>,
        pub events: Rc<RefCell<Vec<String>>>,
    }

    impl Counters {
        pub fn log(&self, event: &str) {
            self.events.borrow_mut().push(event.to_string());
        }
    }

    pub struct FakeEngine {
        counters: Counters,
        cols: u16,
        rows: u16,
        pub fed: Vec<u8>,
    }

    impl Drop for FakeEngine {
        fn drop(&mut self) {
            self.counters.live_engines.set(self.counters.live_engines.get() - 1);
            self.counters.log("engine-drop");
        }
    }

    impl VtEngine for FakeEngine {
        fn feed(&mut self, bytes: &[u8]) -> usize {
            self.fed.extend_from_slice(bytes);
            self.counters
                .log(&format!("feed:{}", String::from_utf8_lossy(bytes)));
            bytes.len()
        }

        fn resize(&mut self, cols: u16, rows: u16) {
            self.cols = cols;
            self.rows = rows;
            self.counters.log(&format!("engine-resize:{cols}x{rows}"));
        }

        fn size(&self) -> (u16, u16) {
            (self.cols, self.rows)
        }

        fn snapshot(&self) -> String {
            String::from_utf8_lossy(&self.fed).into_owned()
        }

        fn set_theme(&mut self, theme: &Theme) {
            self.counters.log(&format!("theme:{}", theme.name));
        }
    }

    pub struct FakeFactory {
        pub counters: Counters,
    }

    impl EngineFactory for FakeFactory {
        fn version(&self) -> String {
            "fake-engine 1.0".to_string()
        }

        fn create(&self, cols: u16, rows: u16, _scrollback: usize) -> Box<dyn VtEngine> {
            self.counters.live_engines.set(self.counters.live_engines.get() + 1);
            Box::new(FakeEngine {
                counters: self.counters.clone(),
                cols,
                rows,
                fed: Vec::new(),
            })
        }
    }

    pub struct FakePort {
        counters: Counters,
        pub queued: Vec<Vec<u8>>,
        pub written: Rc<RefCell<Vec<u8>>>,
        pub size: Rc<Cell<(u16, u16)>>,
        pub resize_fails: bool,
        pub kill_fails: bool,
    }

    impl Drop for FakePort {
        fn drop(&mut self) {
            self.counters.live_ptys.set(self.counters.live_ptys.get() - 1);
            self.counters.log("pty-drop");
        }
    }

    impl PtyPort for FakePort {
        fn drain(&mut self) -> Vec<Vec<u8>> {
            std::mem::take(&mut self.queued)
        }

        fn write(&mut self, bytes: &[u8]) -> PtyResult<()> {
            self.written.borrow_mut().extend_from_slice(bytes);
            Ok(())
        }

        fn resize(&mut self, cols: u16, rows: u16) -> PtyResult<()> {
            if self.resize_fails {
                return Err(PtyError::Resize(anyhow::anyhow!("process exited")));
            }
            self.size.set((cols, rows));
            Ok(())
        }

        fn kill(&mut self) -> PtyResult<()> {
            self.counters.log("kill");
            if self.kill_fails {
                return Err(PtyError::Kill(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "kill failed",
                )));
            }
            Ok(())
        }

        fn is_running(&mut self) -> bool {
            true
        }
    }

    pub struct FakeSpawner {
        pub counters: Counters,
        /// Shared so tests can flip spawn failure after boxing the spawner
        pub fail: Rc<Cell<bool>>,
        pub resize_fails: bool,
        pub kill_fails: bool,
        pub queued: RefCell<Vec<Vec<u8>>>,
        pub written: Rc<RefCell<Vec<u8>>>,
        pub pty_size: Rc<Cell<(u16, u16)>>,
    }

    impl FakeSpawner {
        pub fn new(counters: Counters) -> Self {
            Self {
                counters,
                fail: Rc::new(Cell::new(false)),
                resize_fails: false,
                kill_fails: false,
                queued: RefCell::new(Vec::new()),
                written: Rc::new(RefCell::new(Vec::new())),
                pty_size: Rc::new(Cell::new((0, 0))),
            }
        }
    }

    impl PtySpawner for FakeSpawner {
        fn spawn(&self, spec: &SpawnSpec) -> PtyResult<Box<dyn PtyPort>> {
            if self.fail.get() {
                return Err(PtyError::Spawn {
                    shell: spec.shell.clone(),
                    cause: anyhow::anyhow!("no such shell"),
                });
            }
            self.counters.live_ptys.set(self.counters.live_ptys.get() + 1);
            self.pty_size.set((spec.cols, spec.rows));
            Ok(Box::new(FakePort {
                counters: self.counters.clone(),
                queued: self.queued.borrow_mut().drain(..).collect(),
                written: self.written.clone(),
                size: self.pty_size.clone(),
                resize_fails: self.resize_fails,
                kill_fails: self.kill_fails,
            }))
        }
    }

    /// Loader that always fails, for the placeholder path.
    pub struct UnavailableLoader;

    impl EngineLoader for UnavailableLoader {
        fn load(&self) -> Result<Box<dyn EngineFactory>, EngineError> {
            Err(EngineError::Unavailable(
                "native module not found".to_string(),
            ))
        }
    }

    /// Loader handing out counting fake factories.
    pub struct FakeLoader {
        pub counters: Counters,
    }

    impl EngineLoader for FakeLoader {
        fn load(&self) -> Result<Box<dyn EngineFactory>, EngineError> {
            Ok(Box::new(FakeFactory {
                counters: self.counters.clone(),
            }))
        }
    }
}
