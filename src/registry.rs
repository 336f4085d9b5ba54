//! Session registry: tracks live sessions and maps host commands.
//!
//! Sessions are kept in creation order for cyclic navigation; `destroy`
//! stops the session and removes it in one synchronous step. A session
//! whose shell failed to spawn stays registered in `Stopped` state so the
//! host can surface its diagnostic, but cyclic navigation only rotates
//! over sessions that can still take focus. The registry holds the engine
//! loader and PTY spawner capabilities and owns identity allocation; it
//! never shares a session's engine or PTY handles.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{Config, Theme};
use crate::core::engine::{EngineFactory, EngineLoader};
use crate::core::pty::{PtySpawner, SpawnSpec};
use crate::core::session::{Lifecycle, SessionId, TerminalSession};

/// Host commands, each mapping onto one registry operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Open a session if none exists, otherwise close the focused one
    Toggle,
    /// Create a new session
    New,
    /// Close the focused session
    CloseFocused,
    /// Focus the next session in creation order
    CycleNext,
    /// Focus the previous session in creation order
    CyclePrev,
}

/// Externally supplied focus check: does this session have input focus?
pub type FocusPredicate = Box<dyn Fn(SessionId) -> bool>;

/// Registry of live terminal sessions
pub struct SessionRegistry {
    sessions: Vec<TerminalSession>,
    next_id: u64,
    loader: Box<dyn EngineLoader>,
    spawner: Box<dyn PtySpawner>,
    /// Cached engine capability; reacquired when absent
    factory: Option<Box<dyn EngineFactory>>,
    focus: FocusPredicate,
    config: Config,
    /// Host project root for working-directory resolution
    project_root: Option<PathBuf>,
}

impl SessionRegistry {
    pub fn new(
        loader: Box<dyn EngineLoader>,
        spawner: Box<dyn PtySpawner>,
        focus: FocusPredicate,
        config: Config,
    ) -> Self {
        Self {
            sessions: Vec::new(),
            next_id: 1,
            loader,
            spawner,
            factory: None,
            focus,
            config,
            project_root: None,
        }
    }

    /// Set the host project root used for new sessions' working directory
    pub fn set_project_root(&mut self, root: Option<PathBuf>) {
        self.project_root = root;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create and start a new session with the given grid size.
    ///
    /// When the engine capability cannot be acquired the session is still
    /// created and registered, degraded to a placeholder that carries the
    /// diagnostic; the host renders that instead of a terminal.
    pub fn create(&mut self, cols: u16, rows: u16) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let mut session = TerminalSession::new(id, self.config.scrollback);

        // Reacquire the engine capability if we do not hold it yet
        // (mirrors refreshing the native module state on view open).
        if self.factory.is_none() {
            match self.loader.load() {
                Ok(factory) => self.factory = Some(factory),
                Err(err) => {
                    session.mark_engine_unavailable(&err.to_string());
                    self.sessions.push(session);
                    return id;
                }
            }
        }

        let spec = SpawnSpec::new(
            self.config.shell.as_deref(),
            self.project_root.as_deref(),
            cols,
            rows,
        );
        let factory = self
            .factory
            .as_deref()
            .expect("engine factory present after successful load");
        if let Err(err) = session.start(factory, self.spawner.as_ref(), &spec) {
            warn!(id = %id, error = %err, "session failed to start");
        }
        self.sessions.push(session);
        info!(id = %id, total = self.sessions.len(), "session created");
        id
    }

    /// Stop and remove a session. Idempotent; no-op for unknown ids.
    pub fn destroy(&mut self, id: SessionId) {
        if let Some(index) = self.index_of(id) {
            let mut session = self.sessions.remove(index);
            session.stop();
            info!(id = %id, remaining = self.sessions.len(), "session destroyed");
        }
    }

    /// Session that currently has input focus, per the host's predicate
    pub fn focused(&self) -> Option<SessionId> {
        self.sessions
            .iter()
            .map(|session| session.id())
            .find(|id| (self.focus)(*id))
    }

    /// Rotate focus by `direction` (+1 next, -1 previous) over creation
    /// order, skipping stopped sessions so focus never lands on a dead
    /// one. Returns the target session; no-op with fewer than two
    /// focusable sessions.
    pub fn cycle(&self, direction: i32) -> Option<SessionId> {
        let eligible: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|session| session.lifecycle() != Lifecycle::Stopped)
            .map(|session| session.id())
            .collect();
        let n = eligible.len();
        if n < 2 {
            return None;
        }
        let current = self
            .focused()
            .and_then(|id| eligible.iter().position(|e| *e == id))
            .unwrap_or(0);
        let target = (current as i64 + direction as i64).rem_euclid(n as i64) as usize;
        Some(eligible[target])
    }

    /// Map a host command to its registry operation. Returns the session
    /// the host should focus afterwards, if any.
    pub fn handle_command(&mut self, command: Command, cols: u16, rows: u16) -> Option<SessionId> {
        match command {
            Command::Toggle => {
                if self.sessions.is_empty() {
                    Some(self.create(cols, rows))
                } else {
                    let target = self.focused().or_else(|| self.ids().next());
                    if let Some(id) = target {
                        self.destroy(id);
                    }
                    None
                }
            }
            Command::New => Some(self.create(cols, rows)),
            Command::CloseFocused => {
                if let Some(id) = self.focused() {
                    self.destroy(id);
                }
                None
            }
            Command::CycleNext => self.cycle(1),
            Command::CyclePrev => self.cycle(-1),
        }
    }

    /// Push a theme to every live session's engine
    pub fn sync_theme(&mut self, theme: &Theme) {
        for session in &mut self.sessions {
            session.sync_theme(theme);
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&TerminalSession> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut TerminalSession> {
        self.sessions.iter_mut().find(|session| session.id() == id)
    }

    /// Session ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.iter().map(|session| session.id())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn index_of(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| session.id() == id)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
