//! Size negotiation: pixel geometry to terminal cells.
//!
//! Converts the host container's pixel size plus the measured glyph cell
//! metrics into a terminal grid. The result is clamped to 2x2 so a
//! collapsed container can never drive the engine into a degenerate
//! zero-cell state.

/// Pixel size of one character cell for the active monospace font
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub width: f32,
    pub height: f32,
}

impl CellMetrics {
    /// Fallback metrics used when measurement yields a degenerate value
    pub const FALLBACK: CellMetrics = CellMetrics {
        width: 8.0,
        height: 16.0,
    };
}

/// Pixel size of the host container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

/// Terminal grid size in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub cols: u16,
    pub rows: u16,
}

/// Measures the pixel bounding box of a single reference glyph rendered
/// off-screen in the terminal font. Supplied by the host UI.
pub trait GlyphRuler {
    fn measure_cell(&self) -> CellMetrics;
}

/// Negotiates the terminal grid from pixel geometry.
///
/// Cell metrics are measured once and cached; `invalidate` drops the cache
/// on a font-change notification.
pub struct SizeNegotiator {
    /// Vertical pixels reserved for host chrome around the screen area
    vertical_chrome_px: f32,
    cached_metrics: Option<CellMetrics>,
}

impl SizeNegotiator {
    pub fn new(vertical_chrome_px: f32) -> Self {
        Self {
            vertical_chrome_px,
            cached_metrics: None,
        }
    }

    /// Compute the grid for a container, measuring the cell on first use.
    pub fn measure(&mut self, container: ContainerSize, ruler: &dyn GlyphRuler) -> GridSize {
        let metrics = match self.cached_metrics {
            Some(metrics) => metrics,
            None => {
                let measured = sanitize(ruler.measure_cell());
                self.cached_metrics = Some(measured);
                measured
            }
        };
        grid_for(container, metrics, self.vertical_chrome_px)
    }

    /// Drop the cached metrics (font changed)
    pub fn invalidate(&mut self) {
        self.cached_metrics = None;
    }

    /// Cached metrics, if any
    pub fn metrics(&self) -> Option<CellMetrics> {
        self.cached_metrics
    }
}

/// Grid for a container and cell size, clamped to a 2x2 minimum.
pub fn grid_for(container: ContainerSize, cell: CellMetrics, chrome: f32) -> GridSize {
    let cols = (container.width / cell.width).floor() as i64;
    let rows = ((container.height - chrome) / cell.height).floor() as i64;
    GridSize {
        cols: cols.clamp(2, u16::MAX as i64) as u16,
        rows: rows.clamp(2, u16::MAX as i64) as u16,
    }
}

fn sanitize(metrics: CellMetrics) -> CellMetrics {
    if metrics.width <= 0.0 || metrics.height <= 0.0 {
        CellMetrics::FALLBACK
    } else {
        metrics
    }
}
