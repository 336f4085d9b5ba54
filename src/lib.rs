//! termdock - an embedded terminal session bridge.
//!
//! termdock lets a host application embed interactive shell sessions: it
//! spawns a shell on a PTY, feeds its output through a VT emulation
//! engine, and renders the resulting screen into a host-provided surface,
//! while relaying keystrokes, paste, and resize events back to the shell.
//!
//! # Features
//!
//! - **Session registry**: multiple concurrent sessions with cyclic
//!   navigation and a thin command surface
//! - **Deterministic teardown**: fixed-order release of listeners,
//!   observer, process, and engine; leak-free across restarts
//! - **Size negotiation**: pixel geometry + measured glyph metrics to a
//!   terminal grid, clamped to a 2x2 minimum
//! - **Key encoding**: UI key events to VT byte sequences, with reserved
//!   host chords left untouched
//! - **Paint coalescing**: at most one repaint per refresh tick
//! - **Graceful degradation**: a session without an engine backend stays
//!   registered as a diagnostic placeholder
//!
//! # Quick start
//!
//! ```no_run
//! use termdock::config::Config;
//! use termdock::core::engine::NativeEngineLoader;
//! use termdock::core::pty::NativePtySpawner;
//! use termdock::registry::SessionRegistry;
//! use termdock::ui::SessionView;
//!
//! let mut registry = SessionRegistry::new(
//!     Box::new(NativeEngineLoader),
//!     Box::new(NativePtySpawner),
//!     Box::new(|_id| false), // host focus predicate
//!     Config::load(),
//! );
//! let id = registry.create(80, 24);
//! let view = SessionView::new(id, registry.config().vertical_chrome_px);
//! // Host wires view.on_mount / on_tick / on_key / on_resize / on_unmount
//! ```
//!
//! The host drives the bridge from its own event loop: one `on_tick` per
//! refresh tick pumps PTY output into the engine and paints at most once.

pub mod config;
pub mod core;
pub mod registry;
pub mod ui;

pub use crate::config::{Config, Theme};
pub use crate::core::engine::{
    EngineError, EngineFactory, EngineLoader, NativeEngineLoader, VtEngine,
};
pub use crate::core::pty::{NativePtySpawner, PtyError, PtyPort, PtySpawner, SpawnSpec};
pub use crate::core::session::{
    Lifecycle, SessionError, SessionId, Subscription, TerminalSession,
};
pub use crate::registry::{Command, SessionRegistry};
pub use crate::ui::{EventOutcome, KeyDisposition, KeyEncoder, SessionView, ViewSurface};
