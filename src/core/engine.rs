//! VT engine capability and loader.
//!
//! The bridge does not implement VT/ANSI emulation itself; it consumes an
//! engine through the [`VtEngine`] trait. The stock backend wraps the
//! `vt100` crate behind the `vt100` cargo feature. When the feature is
//! disabled the loader reports [`EngineError::Unavailable`] and sessions
//! stay in placeholder state instead of failing hard, mirroring the
//! behavior of an absent native module.

use thiserror::Error;

use crate::config::Theme;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("VT engine unavailable: {0}")]
    Unavailable(String),
}

/// One live VT emulation instance.
///
/// Exclusively owned by a single session; released by dropping.
pub trait VtEngine {
    /// Feed raw PTY output bytes, in arrival order. Returns bytes consumed.
    fn feed(&mut self, bytes: &[u8]) -> usize;

    /// Resize the screen grid.
    fn resize(&mut self, cols: u16, rows: u16);

    /// Current grid size as `(cols, rows)`.
    fn size(&self) -> (u16, u16);

    /// Current viewport contents, suitable for direct rendering.
    fn snapshot(&self) -> String;

    /// Push a palette to the engine's renderer.
    fn set_theme(&mut self, theme: &Theme);
}

/// Creates engine instances once the capability has been acquired.
pub trait EngineFactory {
    /// Backend identification, surfaced in the session status line.
    fn version(&self) -> String;

    /// Create an engine instance with the given grid size.
    fn create(&self, cols: u16, rows: u16, scrollback: usize) -> Box<dyn VtEngine>;
}

/// Acquires the VT engine capability.
///
/// Acquisition may fail; callers must handle [`EngineError::Unavailable`]
/// and never assume success.
pub trait EngineLoader {
    fn load(&self) -> Result<Box<dyn EngineFactory>, EngineError>;
}

/// Loader for the compiled-in vt100 backend.
pub struct NativeEngineLoader;

impl EngineLoader for NativeEngineLoader {
    #[cfg(feature = "vt100")]
    fn load(&self) -> Result<Box<dyn EngineFactory>, EngineError> {
        Ok(Box::new(vt100_backend::Vt100Factory))
    }

    #[cfg(not(feature = "vt100"))]
    fn load(&self) -> Result<Box<dyn EngineFactory>, EngineError> {
        Err(EngineError::Unavailable(
            "no VT backend compiled in (build with the `vt100` feature)".to_string(),
        ))
    }
}

#[cfg(feature = "vt100")]
mod vt100_backend {
    use super::{EngineFactory, VtEngine};
    use crate::config::Theme;

    pub struct Vt100Factory;

    impl EngineFactory for Vt100Factory {
        fn version(&self) -> String {
            "vt100".to_string()
        }

        fn create(&self, cols: u16, rows: u16, scrollback: usize) -> Box<dyn VtEngine> {
            Box::new(Vt100Engine {
                parser: vt100::Parser::new(rows, cols, scrollback),
                theme: None,
            })
        }
    }

    /// VT engine backed by `vt100::Parser`.
    pub struct Vt100Engine {
        parser: vt100::Parser,
        theme: Option<Theme>,
    }

    impl Vt100Engine {
        /// Last palette pushed by the host, if any
        #[allow(dead_code)]
        pub fn theme(&self) -> Option<&Theme> {
            self.theme.as_ref()
        }
    }

    impl VtEngine for Vt100Engine {
        fn feed(&mut self, bytes: &[u8]) -> usize {
            self.parser.process(bytes);
            bytes.len()
        }

        fn resize(&mut self, cols: u16, rows: u16) {
            self.parser.set_size(rows, cols);
        }

        fn size(&self) -> (u16, u16) {
            let (rows, cols) = self.parser.screen().size();
            (cols, rows)
        }

        fn snapshot(&self) -> String {
            self.parser.screen().contents()
        }

        fn set_theme(&mut self, theme: &Theme) {
            // vt100 renders attribute indices, not concrete colors; the
            // palette is kept for hosts that colorize the snapshot.
            self.theme = Some(theme.clone());
        }
    }
}
