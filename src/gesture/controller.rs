//! Interprets raw pointer/touch streams into drag and pinch operations
//! against the scene's layer state.

use crate::foundation::core::{Point, Vec2};
use crate::foundation::geom::{self, SurfaceView};
use crate::scene::Scene;
use crate::scene::layers::CARD_TILT_RAD;

/// Phase of a mouse-style pointer stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// One mouse-style input event, in client (display) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Point,
}

/// Phase of a touch stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// One touch input event carrying the full active touch list, in client
/// coordinates. One touch drives a drag, two drive a pinch.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<Point>,
}

/// Which layer a single-pointer drag is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    Card,
    Background,
}

/// Transient state of the current input gesture; exists only for the
/// duration of one pointer/touch sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureSession {
    Idle,
    Dragging {
        target: DragTarget,
        /// Pointer minus layer position at grab time, in surface pixels.
        grab_offset: Vec2,
    },
    Pinching {
        /// Inter-finger distance at gesture start, in client pixels; always
        /// positive (a zero-distance start never enters this state).
        start_distance: f64,
        start_scale: f64,
        /// Zoom center frozen at gesture start, in surface pixels.
        pivot: Point,
    },
}

/// Drives the gesture state machine; the sole mutator of layer state while a
/// session is active.
#[derive(Debug)]
pub struct GestureController {
    session: GestureSession,
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            session: GestureSession::Idle,
        }
    }

    pub fn session(&self) -> GestureSession {
        self.session
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.session, GestureSession::Idle)
    }

    /// Apply a mouse-style event. Returns true when layer state changed and a
    /// re-render is due.
    pub fn on_pointer(&mut self, event: PointerEvent, view: SurfaceView, scene: &mut Scene) -> bool {
        match event.phase {
            PointerPhase::Down => self.begin_drag(event.position, view, scene),
            PointerPhase::Move => self.drag_move(event.position, view, scene),
            PointerPhase::Up => self.finish(),
        }
    }

    /// Apply a touch event. Returns true when layer state changed and a
    /// re-render is due.
    pub fn on_touch(&mut self, event: &TouchEvent, view: SurfaceView, scene: &mut Scene) -> bool {
        match event.phase {
            TouchPhase::Start => match event.touches.as_slice() {
                [a, b] => self.begin_pinch(*a, *b, view, scene),
                [p] => self.begin_drag(*p, view, scene),
                _ => false,
            },
            TouchPhase::Move => match event.touches.as_slice() {
                [a, b] => self.pinch_move(*a, *b, view, scene),
                [p] => self.drag_move(*p, view, scene),
                _ => false,
            },
            TouchPhase::End => self.finish(),
        }
    }

    /// Unconditionally terminate any active gesture, e.g. when the pointer
    /// leaves the interactive surface.
    pub fn cancel(&mut self) {
        self.session = GestureSession::Idle;
    }

    fn begin_drag(&mut self, client: Point, view: SurfaceView, scene: &mut Scene) -> bool {
        // A pinch in progress suppresses single-pointer handling.
        if matches!(self.session, GestureSession::Pinching { .. }) {
            return false;
        }
        let (Some(bg), Some(card)) = (scene.background, scene.card) else {
            return false;
        };

        let p = view.to_surface(client);
        let on_card = geom::point_in_rotated_rect(p, card.center(), card.half_size(), CARD_TILT_RAD);
        let (target, grab_offset) = if on_card {
            (DragTarget::Card, p - card.position)
        } else {
            (DragTarget::Background, p - bg.position)
        };
        self.session = GestureSession::Dragging {
            target,
            grab_offset,
        };
        false
    }

    fn drag_move(&mut self, client: Point, view: SurfaceView, scene: &mut Scene) -> bool {
        let GestureSession::Dragging {
            target,
            grab_offset,
        } = self.session
        else {
            return false;
        };
        let p = view.to_surface(client);
        match target {
            DragTarget::Card => {
                let Some(card) = scene.card.as_mut() else {
                    return false;
                };
                // Unconstrained; the card may leave the surface.
                card.position = p - grab_offset;
                true
            }
            DragTarget::Background => {
                let Some(bg) = scene.background.as_mut() else {
                    return false;
                };
                bg.drag_to(p - grab_offset, view.surface);
                true
            }
        }
    }

    fn begin_pinch(&mut self, a: Point, b: Point, view: SurfaceView, scene: &mut Scene) -> bool {
        // A second finger may supersede an active drag, but never an active
        // pinch.
        if matches!(self.session, GestureSession::Pinching { .. }) {
            return false;
        }
        let Some(card) = scene.card else {
            return false;
        };
        if scene.background.is_none() || scene.card_asset.is_none() {
            return false;
        }

        let start_distance = geom::distance(a, b);
        if start_distance <= 0.0 {
            return false;
        }
        let pivot = view.to_surface(geom::midpoint(a, b));
        if !geom::point_in_rotated_rect(pivot, card.center(), card.half_size(), CARD_TILT_RAD) {
            // Pinch must start on the card; staying Idle is the designed
            // outcome, not an error.
            return false;
        }
        self.session = GestureSession::Pinching {
            start_distance,
            start_scale: card.scale,
            pivot,
        };
        false
    }

    fn pinch_move(&mut self, a: Point, b: Point, view: SurfaceView, scene: &mut Scene) -> bool {
        let GestureSession::Pinching {
            start_distance,
            start_scale,
            pivot,
        } = self.session
        else {
            return false;
        };
        let Some(card) = scene.card.as_mut() else {
            return false;
        };
        let Some(asset) = scene.card_asset.as_ref() else {
            return false;
        };

        let scale = start_scale * geom::distance(a, b) / start_distance;
        card.set_scale_about(scale, pivot, asset.size(), view.surface);
        true
    }

    fn finish(&mut self) -> bool {
        self.session = GestureSession::Idle;
        false
    }
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::{Size, SurfaceSize};
    use crate::scene::assets::ImageAsset;
    use crate::scene::layers::{MAX_CARD_SCALE, MIN_CARD_SCALE};

    fn solid(width: u32, height: u32) -> ImageAsset {
        let bytes = [128u8, 128, 128, 255].repeat((width * height) as usize);
        ImageAsset::from_premul_rgba8(bytes, width, height).unwrap()
    }

    fn composed_scene(surface: SurfaceSize) -> Scene {
        let mut scene = Scene::new();
        scene.set_background(solid(1600, 900), surface);
        scene.set_card(solid(600, 800), surface);
        scene
    }

    // Identity view: client coordinates are surface coordinates.
    fn identity_view(surface: SurfaceSize) -> SurfaceView {
        SurfaceView {
            origin: Point::ORIGIN,
            display: surface.to_size(),
            surface,
        }
    }

    fn touch(phase: TouchPhase, touches: &[Point]) -> TouchEvent {
        TouchEvent {
            phase,
            touches: touches.to_vec(),
        }
    }

    #[test]
    fn down_on_card_targets_card_and_drags_unconstrained() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        let start = scene.card.unwrap().center();
        ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Down,
                position: start,
            },
            view,
            &mut scene,
        );
        assert!(matches!(
            ctl.session(),
            GestureSession::Dragging {
                target: DragTarget::Card,
                ..
            }
        ));

        let before = scene.card.unwrap().position;
        let changed = ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Move,
                position: start + Vec2::new(-2000.0, 30.0),
            },
            view,
            &mut scene,
        );
        assert!(changed);
        let after = scene.card.unwrap().position;
        assert!((after.x - (before.x - 2000.0)).abs() < 1e-9);
        assert!((after.y - (before.y + 30.0)).abs() < 1e-9);

        ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Up,
                position: after,
            },
            view,
            &mut scene,
        );
        assert_eq!(ctl.session(), GestureSession::Idle);
    }

    #[test]
    fn down_off_card_drags_background_clamped_to_pan_axis() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        // Top-left corner is far from the card's bottom-anchored placement.
        let start = Point::new(5.0, 5.0);
        ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Down,
                position: start,
            },
            view,
            &mut scene,
        );
        assert!(matches!(
            ctl.session(),
            GestureSession::Dragging {
                target: DragTarget::Background,
                ..
            }
        ));

        for dx in [-100.0, -5000.0, 4000.0, -20.0] {
            ctl.on_pointer(
                PointerEvent {
                    phase: PointerPhase::Move,
                    position: start + Vec2::new(dx, 77.0),
                },
                view,
                &mut scene,
            );
            let bg = scene.background.unwrap();
            let min = 1080.0 - bg.size.width;
            assert!(bg.position.x >= min - 1e-9 && bg.position.x <= 0.0);
            assert_eq!(bg.position.y, 0.0);
        }
    }

    #[test]
    fn pinch_scales_about_frozen_pivot_and_clamps() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        let center = scene.card.unwrap().center();
        let a = center + Vec2::new(-50.0, 0.0);
        let b = center + Vec2::new(50.0, 0.0);
        ctl.on_touch(&touch(TouchPhase::Start, &[a, b]), view, &mut scene);
        assert!(matches!(ctl.session(), GestureSession::Pinching { .. }));

        // Distance 100 -> 200 from scale 0.55: raw 1.1, clamped to 1.0.
        let a2 = center + Vec2::new(-100.0, 0.0);
        let b2 = center + Vec2::new(100.0, 0.0);
        let changed = ctl.on_touch(&touch(TouchPhase::Move, &[a2, b2]), view, &mut scene);
        assert!(changed);
        let card = scene.card.unwrap();
        assert_eq!(card.scale, MAX_CARD_SCALE);
        assert!((card.center().x - center.x).abs() < 1e-9);
        assert!((card.center().y - center.y).abs() < 1e-9);

        // Collapsing the fingers clamps at the lower bound.
        let a3 = center + Vec2::new(-1.0, 0.0);
        let b3 = center + Vec2::new(1.0, 0.0);
        ctl.on_touch(&touch(TouchPhase::Move, &[a3, b3]), view, &mut scene);
        assert_eq!(scene.card.unwrap().scale, MIN_CARD_SCALE);

        ctl.on_touch(&touch(TouchPhase::End, &[]), view, &mut scene);
        assert_eq!(ctl.session(), GestureSession::Idle);
    }

    #[test]
    fn pinch_off_card_or_zero_distance_stays_idle() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        // Midpoint far outside the card rect.
        let a = Point::new(10.0, 10.0);
        let b = Point::new(30.0, 10.0);
        ctl.on_touch(&touch(TouchPhase::Start, &[a, b]), view, &mut scene);
        assert_eq!(ctl.session(), GestureSession::Idle);

        // Coincident fingers on the card: guarded, never a division by zero.
        let c = scene.card.unwrap().center();
        ctl.on_touch(&touch(TouchPhase::Start, &[c, c]), view, &mut scene);
        assert_eq!(ctl.session(), GestureSession::Idle);
    }

    #[test]
    fn pinch_supersedes_drag_but_not_vice_versa() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        let center = scene.card.unwrap().center();
        ctl.on_touch(&touch(TouchPhase::Start, &[center]), view, &mut scene);
        assert!(matches!(ctl.session(), GestureSession::Dragging { .. }));

        let a = center + Vec2::new(-40.0, 0.0);
        let b = center + Vec2::new(40.0, 0.0);
        ctl.on_touch(&touch(TouchPhase::Start, &[a, b]), view, &mut scene);
        assert!(matches!(ctl.session(), GestureSession::Pinching { .. }));

        // Single-pointer handling is suppressed while pinching.
        let before = scene.card.unwrap().position;
        ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Down,
                position: center,
            },
            view,
            &mut scene,
        );
        assert!(matches!(ctl.session(), GestureSession::Pinching { .. }));
        assert_eq!(scene.card.unwrap().position, before);
    }

    #[test]
    fn gestures_require_a_composed_scene() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = Scene::new();
        scene.set_card(solid(600, 800), surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        ctl.on_pointer(
            PointerEvent {
                phase: PointerPhase::Down,
                position: Point::new(5.0, 5.0),
            },
            view,
            &mut scene,
        );
        assert_eq!(ctl.session(), GestureSession::Idle);
    }

    #[test]
    fn cancel_terminates_any_session() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut scene = composed_scene(surface);
        let view = identity_view(surface);
        let mut ctl = GestureController::new();

        ctl.on_touch(
            &touch(TouchPhase::Start, &[Point::new(5.0, 5.0)]),
            view,
            &mut scene,
        );
        assert!(ctl.is_active());
        ctl.cancel();
        assert!(!ctl.is_active());
    }

    #[test]
    fn event_json_roundtrip() {
        let e = TouchEvent {
            phase: TouchPhase::Move,
            touches: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
        };
        let s = serde_json::to_string(&e).unwrap();
        let de: TouchEvent = serde_json::from_str(&s).unwrap();
        assert_eq!(de, e);
    }
}
