//! Cardstudio is an interactive photocard compositing engine.
//!
//! It overlays a rotated, scalable card image onto a pannable background and
//! renders the composite deterministically into a fixed-resolution
//! premultiplied-RGBA8 buffer.
//!
//! # Pipeline overview
//!
//! 1. **Layout**: container bounds + aspect ratio -> display size and fixed
//!    raster resolution ([`layout::solver`])
//! 2. **Place**: decoded assets -> initial layer states ([`scene`])
//! 3. **Interact**: pointer/touch streams -> drag/pinch mutations
//!    ([`gesture`])
//! 4. **Render**: layer state -> raster surface, one full pass per change
//!    ([`render::compositor`])
//!
//! [`EditorSession`] wires the stages together and guarantees the
//! mutate-then-render ordering: every state-changing event is followed by a
//! complete composite pass before the next event is processed.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: rendering the same state twice produces
//!   byte-identical pixels.
//! - **No IO in the engine**: decoding and export live with the caller (see
//!   the `cardstudio` binary).
//! - **Premultiplied RGBA8** end-to-end.
#![forbid(unsafe_code)]

pub mod foundation;
pub mod gesture;
pub mod layout;
pub mod render;
pub mod scene;
pub mod session;

pub use foundation::core::{Affine, AspectRatio, Point, Rect, Size, SurfaceSize, Vec2};
pub use foundation::error::{StudioError, StudioResult};
pub use foundation::geom::{SurfaceView, distance, midpoint, point_in_rotated_rect};
pub use gesture::controller::{
    DragTarget, GestureController, GestureSession, PointerEvent, PointerPhase, TouchEvent,
    TouchPhase,
};
pub use layout::solver::{
    BASE_SURFACE_WIDTH, CanvasLayout, MIN_CONTAINER_EXTENT, RESIZE_DEBOUNCE, ResizeDebouncer,
    ViewBounds, solve, surface_for,
};
pub use render::compositor::{Compositor, FrameRGBA};
pub use scene::Scene;
pub use scene::assets::ImageAsset;
pub use scene::layers::{
    BackgroundLayer, CARD_TILT_RAD, CardLayer, DEFAULT_CARD_SCALE, MAX_CARD_SCALE, MIN_CARD_SCALE,
    PanAxis,
};
pub use session::{EditorSession, MAX_ZOOM_PERCENT, MIN_ZOOM_PERCENT};
