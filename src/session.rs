//! Session root: owns all mutable state and applies external events in a
//! deterministic mutate-then-render order.

use std::time::Instant;

use crate::foundation::core::AspectRatio;
use crate::foundation::error::{StudioError, StudioResult};
use crate::foundation::geom::SurfaceView;
use crate::gesture::controller::{GestureController, GestureSession, PointerEvent, TouchEvent};
use crate::layout::solver::{self, CanvasLayout, ResizeDebouncer, ViewBounds};
use crate::render::compositor::{Compositor, FrameRGBA};
use crate::scene::Scene;
use crate::scene::assets::ImageAsset;

/// Slider zoom range, in percent.
pub const MIN_ZOOM_PERCENT: u32 = 20;
pub const MAX_ZOOM_PERCENT: u32 = 100;

/// One interactive compositing session.
///
/// Every mutating entry point applies its state change atomically and then
/// runs a full composite pass before returning, so `frame()` always reflects
/// the latest committed state. All work happens on the caller's thread; no
/// event is ever observed half-applied.
pub struct EditorSession {
    aspect_ratio: AspectRatio,
    bounds: ViewBounds,
    layout: CanvasLayout,
    scene: Scene,
    gestures: GestureController,
    compositor: Compositor,
    resize_debounce: ResizeDebouncer,
    zoom_percent: u32,
    render_count: u64,
}

impl EditorSession {
    pub fn new(aspect_ratio: AspectRatio) -> StudioResult<Self> {
        let bounds = ViewBounds::default();
        let layout = solver::solve(bounds, aspect_ratio);
        let compositor = Compositor::new(layout.surface)?;
        let mut session = Self {
            aspect_ratio,
            bounds,
            layout,
            scene: Scene::new(),
            gestures: GestureController::new(),
            compositor,
            resize_debounce: ResizeDebouncer::new(),
            zoom_percent: 55,
            render_count: 0,
        };
        session.render()?;
        Ok(session)
    }

    /// Install a decoded background asset and re-derive its placement.
    #[tracing::instrument(skip(self, asset))]
    pub fn set_background(&mut self, asset: ImageAsset) -> StudioResult<()> {
        self.scene.set_background(asset, self.layout.surface);
        self.render()
    }

    /// Install a decoded card asset; resets the card to its initial
    /// placement and scale.
    #[tracing::instrument(skip(self, asset))]
    pub fn set_card(&mut self, asset: ImageAsset) -> StudioResult<()> {
        self.scene.set_card(asset, self.layout.surface);
        self.sync_zoom_percent();
        self.render()
    }

    /// Switch the target aspect ratio: re-solve the layout, recreate the
    /// surface, and re-initialize both layer placements.
    #[tracing::instrument(skip(self))]
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) -> StudioResult<()> {
        self.aspect_ratio = ratio;
        self.reattach()
    }

    /// The surface became visible/attached (or moved): adopt the container
    /// bounds and re-initialize, regardless of which UI mechanism caused it.
    #[tracing::instrument(skip(self))]
    pub fn attach_surface(&mut self, bounds: ViewBounds) -> StudioResult<()> {
        self.bounds = bounds;
        self.reattach()
    }

    /// Record a resize notification; it takes effect once
    /// [`EditorSession::poll_resize`] observes the debounce delay elapsed.
    pub fn notify_resize(&mut self, bounds: ViewBounds, now: Instant) {
        self.resize_debounce.notify(bounds, now);
    }

    /// Apply a pending debounced resize, if due. Returns true when a
    /// re-layout happened.
    pub fn poll_resize(&mut self, now: Instant) -> StudioResult<bool> {
        match self.resize_debounce.poll(now) {
            Some(bounds) => {
                self.attach_surface(bounds)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply one mouse-style event.
    #[tracing::instrument(skip(self))]
    pub fn on_pointer(&mut self, event: PointerEvent) -> StudioResult<()> {
        let view = self.surface_view();
        let changed = self.gestures.on_pointer(event, view, &mut self.scene);
        self.after_gesture(changed)
    }

    /// Apply one touch event carrying the full active touch list.
    #[tracing::instrument(skip(self))]
    pub fn on_touch(&mut self, event: &TouchEvent) -> StudioResult<()> {
        let view = self.surface_view();
        let changed = self.gestures.on_touch(event, view, &mut self.scene);
        self.after_gesture(changed)
    }

    /// The pointer left the interactive surface: terminate any active
    /// gesture.
    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel();
    }

    /// Direct slider zoom. Unlike a pinch, the pivot is the card's live
    /// center at the time of the change.
    #[tracing::instrument(skip(self))]
    pub fn set_zoom_percent(&mut self, percent: u32) -> StudioResult<()> {
        if !(MIN_ZOOM_PERCENT..=MAX_ZOOM_PERCENT).contains(&percent) {
            return Err(StudioError::validation(format!(
                "zoom percent {percent} outside {MIN_ZOOM_PERCENT}..={MAX_ZOOM_PERCENT}"
            )));
        }
        let (Some(card), Some(asset)) = (self.scene.card.as_mut(), self.scene.card_asset.as_ref())
        else {
            return Ok(());
        };
        let center = card.center();
        card.set_scale_about(
            f64::from(percent) / 100.0,
            center,
            asset.size(),
            self.layout.surface,
        );
        self.sync_zoom_percent();
        self.render()
    }

    /// Integer zoom mirror of the card scale, for display.
    pub fn zoom_percent(&self) -> u32 {
        self.zoom_percent
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn layout(&self) -> CanvasLayout {
        self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn gesture_session(&self) -> GestureSession {
        self.gestures.session()
    }

    /// Number of full composite passes run so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// The latest rendered frame; fully painted for every state-changing
    /// event already applied.
    pub fn frame(&self) -> FrameRGBA {
        self.compositor.frame()
    }

    fn reattach(&mut self) -> StudioResult<()> {
        self.gestures.cancel();
        self.layout = solver::solve(self.bounds, self.aspect_ratio);
        self.compositor.resize(self.layout.surface)?;
        self.scene.reinit(self.layout.surface);
        self.sync_zoom_percent();
        self.render()
    }

    fn after_gesture(&mut self, changed: bool) -> StudioResult<()> {
        if changed {
            self.sync_zoom_percent();
            self.render()?;
        }
        Ok(())
    }

    fn sync_zoom_percent(&mut self) {
        if let Some(card) = self.scene.card {
            self.zoom_percent = (card.scale * 100.0).round() as u32;
        }
    }

    fn surface_view(&self) -> SurfaceView {
        SurfaceView {
            origin: self.bounds.origin,
            display: self.layout.display,
            surface: self.layout.surface,
        }
    }

    fn render(&mut self) -> StudioResult<()> {
        self.compositor.render(&self.scene)?;
        self.render_count += 1;
        Ok(())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("aspect_ratio", &self.aspect_ratio)
            .field("layout", &self.layout)
            .field("zoom_percent", &self.zoom_percent)
            .field("render_count", &self.render_count)
            .finish_non_exhaustive()
    }
}
