//! Canvas sizing: fit the display box to the container while preserving the
//! target aspect ratio, and pin the internal raster resolution.

use std::time::{Duration, Instant};

use crate::foundation::core::{AspectRatio, Point, Size, SurfaceSize};

/// Containers smaller than this are treated as this size on both axes, so a
/// collapsed layout never produces a degenerate canvas.
pub const MIN_CONTAINER_EXTENT: f64 = 200.0;

/// Fixed raster width of the compositing surface; height derives from the
/// aspect ratio.
pub const BASE_SURFACE_WIDTH: u32 = 1080;

/// Delay applied to resize notifications before they reach the layout.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Container display box supplied by the embedding surface, in client pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewBounds {
    /// Top-left of the container in client coordinates.
    pub origin: Point,
    /// Container extents; values below [`MIN_CONTAINER_EXTENT`] are clamped.
    pub size: Size,
}

impl ViewBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
}

impl Default for ViewBounds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Solved canvas geometry: on-screen display size plus raster resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasLayout {
    pub display: Size,
    pub surface: SurfaceSize,
}

/// Fit a display box of ratio `ratio` inside `bounds`.
///
/// Sizing is width-first: take the full container width and derive the
/// height; only when that height overflows does the height drive the width.
/// The order decides which axis ends up letterboxed, so it must not change.
pub fn solve(bounds: ViewBounds, ratio: AspectRatio) -> CanvasLayout {
    let r = ratio.as_f64();
    let max_w = bounds.size.width.max(MIN_CONTAINER_EXTENT);
    let max_h = bounds.size.height.max(MIN_CONTAINER_EXTENT);

    let width_first = Size::new(max_w, max_w / r);
    let display = if width_first.height <= max_h {
        width_first
    } else {
        Size::new(max_h * r, max_h)
    };

    let layout = CanvasLayout {
        display,
        surface: surface_for(ratio),
    };
    tracing::debug!(?bounds, %ratio, ?layout, "canvas layout solved");
    layout
}

/// Raster resolution for `ratio`: fixed base width, rounded derived height.
///
/// Recomputed only when the ratio changes, never per resize, so repeated
/// resizes cannot accumulate rounding drift.
pub fn surface_for(ratio: AspectRatio) -> SurfaceSize {
    let height = (f64::from(BASE_SURFACE_WIDTH) / ratio.as_f64()).round() as u32;
    SurfaceSize::new(BASE_SURFACE_WIDTH, height)
}

/// Component-owned debounce state for resize notifications: one pending
/// deadline, replaced on every new notification.
///
/// The clock is passed in explicitly; nothing here reads wall time on its
/// own.
#[derive(Debug)]
pub struct ResizeDebouncer {
    delay: Duration,
    pending: Option<(Instant, ViewBounds)>,
}

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self::with_delay(RESIZE_DEBOUNCE)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record `bounds` for delivery after the delay, cancelling any pending
    /// notification.
    pub fn notify(&mut self, bounds: ViewBounds, now: Instant) {
        self.pending = Some((now + self.delay, bounds));
    }

    /// Take the pending bounds once their deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<ViewBounds> {
        match self.pending {
            Some((deadline, bounds)) if deadline <= now => {
                self.pending = None;
                Some(bounds)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
