//! Core session bridge components.
//!
//! This module contains the UI-free session logic:
//!
//! - **engine**: VT engine capability trait, loader, and vt100 backend
//! - **pty**: PTY process capability on top of portable-pty
//! - **session**: session state machine combining engine + PTY
//!
//! # Architecture
//!
//! ```text
//! TerminalSession
//! ├── Box<dyn VtEngine>  (screen state, fed PTY output)
//! ├── Box<dyn PtyPort>   (shell process I/O)
//! └── Subscriptions      (UI listeners cancelled on teardown)
//! ```

pub mod engine;
pub mod pty;
pub mod session;
