//! UI-facing adapters and input handling.
//!
//! Everything that touches pixel geometry, key events, or the render
//! surface lives here, behind traits the host implements:
//!
//! - **keymap**: key event to PTY byte sequence encoding
//! - **size**: pixel geometry to terminal grid negotiation
//! - **render**: repaint coalescing per refresh tick
//! - **view**: per-session mount/unmount/tick adapter

pub mod keymap;
pub mod render;
pub mod size;
pub mod view;

pub use keymap::{KeyDisposition, KeyEncoder, Modifiers};
pub use render::RenderScheduler;
pub use size::{CellMetrics, ContainerSize, GlyphRuler, GridSize, SizeNegotiator};
pub use view::{EventOutcome, SessionView, ViewSurface};
