//! Host view adapter.
//!
//! The thin UI-facing layer over one session: mount/unmount lifecycle,
//! input relay, deferred size negotiation, and guarded painting. All UI
//! specifics stay behind the [`ViewSurface`] trait, so the adapter runs
//! against any widget toolkit or against a test double.
//!
//! The first size negotiation is deferred to the first tick after mount so
//! the host's layout has settled and the pixel geometry is accurate.

use crossterm::event::KeyEvent;
use tracing::debug;

use crate::core::session::{Lifecycle, SessionId};
use crate::registry::SessionRegistry;
use crate::ui::keymap::{KeyDisposition, KeyEncoder};
use crate::ui::render::RenderScheduler;
use crate::ui::size::{ContainerSize, GlyphRuler, SizeNegotiator};

/// What the host must do with the UI event that triggered a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Suppress default handling and stop propagation
    Suppress,
    /// Leave the event alone (host shortcuts keep working)
    PassThrough,
}

/// Render target plus the few host affordances the bridge needs
pub trait ViewSurface {
    /// Replace the rendered screen content with the viewport snapshot
    fn draw(&mut self, text: &str);

    /// Scroll the surface so the latest content is visible
    fn scroll_to_bottom(&mut self);

    /// Update the status line (engine version or diagnostic)
    fn set_status(&mut self, text: &str);

    /// Give keyboard focus to the terminal input area
    fn focus_input(&mut self);
}

/// Per-session view adapter
pub struct SessionView {
    id: SessionId,
    scheduler: RenderScheduler,
    negotiator: SizeNegotiator,
    mounted: bool,
    /// Set once the deferred post-mount measurement has run
    measured: bool,
}

impl SessionView {
    pub fn new(id: SessionId, vertical_chrome_px: f32) -> Self {
        Self {
            id,
            scheduler: RenderScheduler::new(),
            negotiator: SizeNegotiator::new(vertical_chrome_px),
            mounted: false,
            measured: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The host view has been attached to the widget tree.
    pub fn on_mount(&mut self, registry: &SessionRegistry, surface: &mut dyn ViewSurface) {
        self.mounted = true;
        self.measured = false;
        if let Some(session) = registry.get(self.id) {
            surface.set_status(session.status());
        }
        debug!(id = %self.id, "view mounted");
    }

    /// The host view is being detached; destroys the session.
    pub fn on_unmount(&mut self, registry: &mut SessionRegistry) {
        self.mounted = false;
        self.scheduler.clear();
        registry.destroy(self.id);
        debug!(id = %self.id, "view unmounted");
    }

    /// One refresh tick: deferred first measurement, output pumping, and
    /// at most one paint.
    pub fn on_tick(
        &mut self,
        registry: &mut SessionRegistry,
        container: ContainerSize,
        ruler: &dyn GlyphRuler,
        surface: &mut dyn ViewSurface,
    ) {
        if !self.mounted {
            return;
        }
        if !self.measured {
            // Layout has settled by the first tick after mount.
            let grid = self.negotiator.measure(container, ruler);
            if let Some(session) = registry.get_mut(self.id) {
                session.resize(grid.cols, grid.rows);
            }
            self.measured = true;
            self.scheduler.request();
        }
        if let Some(session) = registry.get_mut(self.id) {
            if session.pump() {
                self.scheduler.request();
            }
        }
        self.paint(registry, surface);
    }

    /// Key event relay: encode and forward, reporting the required event
    /// side effect to the host.
    pub fn on_key(&mut self, registry: &mut SessionRegistry, event: &KeyEvent) -> EventOutcome {
        match KeyEncoder::encode(event) {
            KeyDisposition::Forward(bytes) => {
                let forwarded = registry
                    .get_mut(self.id)
                    .map(|session| session.write_input(&bytes))
                    .unwrap_or(false);
                if forwarded {
                    EventOutcome::Suppress
                } else {
                    EventOutcome::PassThrough
                }
            }
            KeyDisposition::Reserved | KeyDisposition::Ignored => EventOutcome::PassThrough,
        }
    }

    /// Paste relay
    pub fn on_paste(&mut self, registry: &mut SessionRegistry, text: &str) -> EventOutcome {
        let forwarded = registry
            .get_mut(self.id)
            .map(|session| session.paste(text))
            .unwrap_or(false);
        if forwarded {
            EventOutcome::Suppress
        } else {
            EventOutcome::PassThrough
        }
    }

    /// Resize observer callback: renegotiate the grid and schedule a paint.
    /// A callback firing after unmount is a guarded no-op.
    pub fn on_resize(
        &mut self,
        registry: &mut SessionRegistry,
        container: ContainerSize,
        ruler: &dyn GlyphRuler,
    ) {
        if !self.mounted {
            return;
        }
        let grid = self.negotiator.measure(container, ruler);
        if let Some(session) = registry.get_mut(self.id) {
            session.resize(grid.cols, grid.rows);
        }
        self.scheduler.request();
    }

    /// Font-change notification: drop cached cell metrics
    pub fn on_font_change(&mut self) {
        self.negotiator.invalidate();
        self.measured = false;
    }

    pub fn focus_input(&self, surface: &mut dyn ViewSurface) {
        surface.focus_input();
    }

    /// Paint if due. A paint scheduled for a session that has since
    /// stopped or vanished must be a safe no-op.
    fn paint(&mut self, registry: &SessionRegistry, surface: &mut dyn ViewSurface) {
        if !self.scheduler.take() {
            return;
        }
        let Some(session) = registry.get(self.id) else {
            return;
        };
        if session.lifecycle() != Lifecycle::Running {
            return;
        }
        if let Some(snapshot) = session.snapshot() {
            surface.draw(&snapshot);
            surface.scroll_to_bottom();
        }
    }

    /// Direct render request, e.g. after a theme push
    pub fn request_render(&self) {
        self.scheduler.request();
    }
}
