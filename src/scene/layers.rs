//! Layer placement and scaling rules for the two composited layers.

use crate::foundation::core::{Point, Size, SurfaceSize};

/// Rotation applied to the card at render time, about its own center.
pub const CARD_TILT_RAD: f64 = 12.0 * std::f64::consts::PI / 180.0;

/// Card scale bounds; pinch and slider input both clamp into this range.
pub const MIN_CARD_SCALE: f64 = 0.2;
pub const MAX_CARD_SCALE: f64 = 1.0;

/// Starting card scale (zoom percent 55).
pub const DEFAULT_CARD_SCALE: f64 = 0.55;

const CARD_X_MARGIN_FRAC: f64 = 0.02;
// The vertical margin intentionally derives from the surface *width* with a
// negative coefficient; the calibrated bottom-anchored placement depends on
// both quirks.
const CARD_Y_MARGIN_FRAC: f64 = -0.04;

/// Axis along which the background overflows the surface and may be dragged.
/// The other axis is exactly surface-filling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PanAxis {
    Horizontal,
    Vertical,
}

/// Pan/fit state of the background layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackgroundLayer {
    /// Top-left corner in surface coordinates; <= 0 on the pan axis.
    pub position: Point,
    /// Drawn size; covers the surface on both axes.
    pub size: Size,
    pub pan_axis: PanAxis,
}

impl BackgroundLayer {
    /// Cover-fit `asset` over `surface`.
    ///
    /// An asset relatively wider than the surface fills the full height and
    /// overflows horizontally (pan axis horizontal, centered on x); otherwise
    /// it fills the full width and overflows vertically. Degenerate asset or
    /// surface dimensions produce no placement.
    pub fn fit(asset: Size, surface: SurfaceSize) -> Option<Self> {
        if asset.width <= 0.0 || asset.height <= 0.0 || surface.width == 0 || surface.height == 0 {
            return None;
        }
        let sw = f64::from(surface.width);
        let sh = f64::from(surface.height);
        let asset_ratio = asset.width / asset.height;

        if asset_ratio > surface.ratio() {
            let size = Size::new(sh * asset_ratio, sh);
            Some(Self {
                position: Point::new((sw - size.width) / 2.0, 0.0),
                size,
                pan_axis: PanAxis::Horizontal,
            })
        } else {
            let size = Size::new(sw, sw / asset_ratio);
            Some(Self {
                position: Point::new(0.0, (sh - size.height) / 2.0),
                size,
                pan_axis: PanAxis::Vertical,
            })
        }
    }

    /// Move toward `candidate`, updating only the pan-axis coordinate and
    /// clamping it so the background never exposes empty surface.
    pub fn drag_to(&mut self, candidate: Point, surface: SurfaceSize) {
        match self.pan_axis {
            PanAxis::Horizontal => {
                // Cover-fit keeps the overflow non-negative; the extra min
                // keeps the clamp well-ordered against float rounding.
                let min = (f64::from(surface.width) - self.size.width).min(0.0);
                self.position.x = candidate.x.clamp(min, 0.0);
            }
            PanAxis::Vertical => {
                let min = (f64::from(surface.height) - self.size.height).min(0.0);
                self.position.y = candidate.y.clamp(min, 0.0);
            }
        }
    }
}

/// Position/scale state of the photocard layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardLayer {
    /// Top-left corner before the render-time rotation; unconstrained, the
    /// card may be dragged off-surface.
    pub position: Point,
    pub size: Size,
    /// In `[MIN_CARD_SCALE, MAX_CARD_SCALE]`; width = surface width x scale.
    pub scale: f64,
}

impl CardLayer {
    /// Initial bottom-left-anchored placement at the default scale.
    pub fn place(asset: Size, surface: SurfaceSize) -> Option<Self> {
        if asset.width <= 0.0 || asset.height <= 0.0 || surface.width == 0 || surface.height == 0 {
            return None;
        }
        let sw = f64::from(surface.width);
        let sh = f64::from(surface.height);
        let size = card_size_for(DEFAULT_CARD_SCALE, asset, surface);
        Some(Self {
            position: Point::new(
                sw * CARD_X_MARGIN_FRAC,
                sh - size.height - sw * CARD_Y_MARGIN_FRAC,
            ),
            size,
            scale: DEFAULT_CARD_SCALE,
        })
    }

    /// Rotation center, in surface coordinates.
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }

    pub fn half_size(&self) -> Size {
        Size::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Clamp and apply `scale`, recomputing the size without moving the
    /// top-left corner.
    pub fn set_scale(&mut self, scale: f64, asset: Size, surface: SurfaceSize) {
        self.scale = scale.clamp(MIN_CARD_SCALE, MAX_CARD_SCALE);
        self.size = card_size_for(self.scale, asset, surface);
    }

    /// Clamp and apply `scale`, repositioning so the card center lands on
    /// `pivot`.
    pub fn set_scale_about(&mut self, scale: f64, pivot: Point, asset: Size, surface: SurfaceSize) {
        self.set_scale(scale, asset, surface);
        self.position = Point::new(
            pivot.x - self.size.width / 2.0,
            pivot.y - self.size.height / 2.0,
        );
    }
}

fn card_size_for(scale: f64, asset: Size, surface: SurfaceSize) -> Size {
    let width = f64::from(surface.width) * scale;
    Size::new(width, width * asset.height / asset.width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_background_pans_horizontally_and_centers_x() {
        // 1600x900 on a 1080x1350 surface: ratio 1.778 > 0.8.
        let bg = BackgroundLayer::fit(Size::new(1600.0, 900.0), SurfaceSize::new(1080, 1350))
            .unwrap();
        assert_eq!(bg.pan_axis, PanAxis::Horizontal);
        assert!((bg.size.width - 2400.0).abs() < 1e-9);
        assert_eq!(bg.size.height, 1350.0);
        assert!((bg.position.x - -660.0).abs() < 1e-9);
        assert_eq!(bg.position.y, 0.0);
    }

    #[test]
    fn tall_background_pans_vertically_and_centers_y() {
        let bg =
            BackgroundLayer::fit(Size::new(900.0, 1600.0), SurfaceSize::new(1080, 1080)).unwrap();
        assert_eq!(bg.pan_axis, PanAxis::Vertical);
        assert_eq!(bg.size.width, 1080.0);
        assert_eq!(bg.position.x, 0.0);
        assert!(bg.position.y <= 0.0);
    }

    #[test]
    fn fit_always_covers_the_surface() {
        let surface = SurfaceSize::new(1080, 1350);
        for asset in [
            Size::new(1600.0, 900.0),
            Size::new(900.0, 1600.0),
            Size::new(1080.0, 1350.0),
            Size::new(50.0, 50.0),
        ] {
            let bg = BackgroundLayer::fit(asset, surface).unwrap();
            assert!(bg.size.width >= 1080.0 - 1e-9, "{asset:?}");
            assert!(bg.size.height >= 1350.0 - 1e-9, "{asset:?}");
        }
    }

    #[test]
    fn fit_rejects_degenerate_input() {
        assert!(BackgroundLayer::fit(Size::new(0.0, 100.0), SurfaceSize::new(1080, 1350)).is_none());
        assert!(BackgroundLayer::fit(Size::new(100.0, 0.0), SurfaceSize::new(1080, 1350)).is_none());
        assert!(BackgroundLayer::fit(Size::new(100.0, 100.0), SurfaceSize::new(1080, 0)).is_none());
    }

    #[test]
    fn drag_clamps_to_overflow_range() {
        let surface = SurfaceSize::new(1080, 1350);
        let mut bg = BackgroundLayer::fit(Size::new(1600.0, 900.0), surface).unwrap();

        bg.drag_to(Point::new(500.0, 999.0), surface);
        assert_eq!(bg.position.x, 0.0);
        // Off-axis coordinate never moves.
        assert_eq!(bg.position.y, 0.0);

        bg.drag_to(Point::new(-5000.0, 0.0), surface);
        assert!((bg.position.x - (1080.0 - bg.size.width)).abs() < 1e-9);

        bg.drag_to(Point::new(-100.0, 0.0), surface);
        assert_eq!(bg.position.x, -100.0);
    }

    #[test]
    fn card_initial_placement_is_bottom_anchored() {
        // 600x800 card on a 1080x1350 surface.
        let card =
            CardLayer::place(Size::new(600.0, 800.0), SurfaceSize::new(1080, 1350)).unwrap();
        assert_eq!(card.scale, DEFAULT_CARD_SCALE);
        assert!((card.size.width - 594.0).abs() < 1e-9);
        assert!((card.size.height - 792.0).abs() < 1e-9);
        assert!((card.position.x - 21.6).abs() < 1e-9);
        // 1350 - 792 - (1080 * -0.04) = 601.2
        assert!((card.position.y - 601.2).abs() < 1e-9);
    }

    #[test]
    fn set_scale_clamps_and_keeps_corner() {
        let asset = Size::new(600.0, 800.0);
        let surface = SurfaceSize::new(1080, 1350);
        let mut card = CardLayer::place(asset, surface).unwrap();
        let corner = card.position;

        card.set_scale(5.0, asset, surface);
        assert_eq!(card.scale, MAX_CARD_SCALE);
        card.set_scale(0.01, asset, surface);
        assert_eq!(card.scale, MIN_CARD_SCALE);
        assert_eq!(card.position, corner);
    }

    #[test]
    fn set_scale_about_recenters_on_pivot() {
        let asset = Size::new(600.0, 800.0);
        let surface = SurfaceSize::new(1080, 1350);
        let mut card = CardLayer::place(asset, surface).unwrap();
        let pivot = Point::new(540.0, 675.0);

        card.set_scale_about(0.8, pivot, asset, surface);
        assert!((card.center().x - pivot.x).abs() < 1e-9);
        assert!((card.center().y - pivot.y).abs() < 1e-9);
        assert!((card.size.width - 1080.0 * 0.8).abs() < 1e-9);
    }
}
