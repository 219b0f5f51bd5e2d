//! Deterministic CPU compositing of the scene into the raster surface.
//!
//! One render is three passes, combined with premultiplied `over`:
//! base (backdrop + background), blurred sleeve shadow, and the card stack
//! (sleeve, rounded body, clipped image, gradient overlays). `vello_cpu`
//! rasterizes each pass into a fresh buffer, so the shadow and card passes go
//! through one reused scratch pixmap before being composited onto the output.

use vello_cpu::peniko::Color;

use crate::foundation::core::{Affine, SurfaceSize};
use crate::foundation::error::{StudioError, StudioResult};
use crate::render::{blur, composite};
use crate::scene::Scene;
use crate::scene::assets::ImageAsset;
use crate::scene::layers::{CARD_TILT_RAD, CardLayer};

/// Sleeve overhang beyond the card edge, in surface pixels.
const SLEEVE_MARGIN: f64 = 10.0;

/// Card corner radius at scale 1.0; shrinks proportionally with zoom so it
/// reads correctly at any size.
const CARD_CORNER_RADIUS_BASE: f64 = 80.0;

/// Sleeve drop shadow: offset in surface space, gaussian spread.
const SHADOW_OFFSET_X: f64 = 6.0;
const SHADOW_OFFSET_Y: f64 = 8.0;
const SHADOW_SIGMA: f32 = 10.0;
const SHADOW_RADIUS: u32 = 20;

/// Height of the sleeve opening shadow strip along the top edge.
const OPENING_SHADOW_EXTENT: f64 = 4.0;

/// One rendered frame: tightly packed premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Owns the raster surface and repaints it from layer state.
///
/// Rendering is a single full pass with no incremental redraw; repeated
/// renders of unchanged state produce byte-identical output.
pub struct Compositor {
    surface: SurfaceSize,
    ctx: vello_cpu::RenderContext,
    output: vello_cpu::Pixmap,
    scratch: vello_cpu::Pixmap,
}

impl Compositor {
    pub fn new(surface: SurfaceSize) -> StudioResult<Self> {
        let (w, h) = extents_u16(surface)?;
        Ok(Self {
            surface,
            ctx: vello_cpu::RenderContext::new(w, h),
            output: vello_cpu::Pixmap::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
        })
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    /// Recreate the surface at a new resolution (aspect-ratio change).
    pub fn resize(&mut self, surface: SurfaceSize) -> StudioResult<()> {
        if surface != self.surface {
            *self = Self::new(surface)?;
        }
        Ok(())
    }

    /// Repaint the whole surface from the current scene state.
    ///
    /// Layers without a placed state are skipped; the opaque backdrop always
    /// paints.
    pub fn render(&mut self, scene: &Scene) -> StudioResult<()> {
        self.render_base(scene);
        if let (Some(asset), Some(card)) = (scene.card_asset(), scene.card) {
            self.render_card_shadow(&card)?;
            self.render_card(asset, &card)?;
        }
        Ok(())
    }

    /// Copy of the latest rendered frame.
    pub fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.surface.width,
            height: self.surface.height,
            data: self.output.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    /// Borrow the latest rendered pixels (premultiplied RGBA8, row-major).
    pub fn pixels(&self) -> &[u8] {
        self.output.data_as_u8_slice()
    }

    fn render_base(&mut self, scene: &Scene) {
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // Opaque fallback for regions the cover-fit background cannot reach.
        ctx.set_paint(Color::from_rgba8(0, 0, 0, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.surface.width),
            f64::from(self.surface.height),
        ));

        if let (Some(asset), Some(bg)) = (scene.background_asset(), scene.background) {
            let natural = asset.size();
            // Stretch to the layer size; cropping happens implicitly because
            // the drawn size meets or exceeds the surface on both axes.
            let tr = Affine::translate((bg.position.x, bg.position.y))
                * Affine::scale_non_uniform(
                    bg.size.width / natural.width,
                    bg.size.height / natural.height,
                );
            ctx.set_transform(to_cpu(tr));
            ctx.set_paint(asset.paint());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                natural.width,
                natural.height,
            ));
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.output);
    }

    fn render_card_shadow(&mut self, card: &CardLayer) -> StudioResult<()> {
        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let tr = Affine::translate((SHADOW_OFFSET_X, SHADOW_OFFSET_Y)) * card_frame(card);
        ctx.set_transform(to_cpu(tr));
        ctx.set_paint(Color::from_rgba8(0, 0, 0, 102));
        ctx.fill_rect(&sleeve_rect(card));
        ctx.flush();

        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.scratch);

        let blurred = blur::blur_premul_rgba8(
            self.scratch.data_as_u8_slice(),
            self.surface.width,
            self.surface.height,
            SHADOW_RADIUS,
            SHADOW_SIGMA,
        )?;
        composite::over_in_place(self.output.data_as_u8_slice_mut(), &blurred)
    }

    fn render_card(&mut self, asset: &ImageAsset, card: &CardLayer) -> StudioResult<()> {
        let half = card.half_size();
        let (hw, hh) = (half.width, half.height);
        let m = SLEEVE_MARGIN;
        let sleeve = sleeve_rect(card);
        let frame = card_frame(card);
        let body_path = rounded_card_path(card);

        let ctx = &mut self.ctx;
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(to_cpu(frame));

        // Square vinyl sleeve: faint fill plus a rim stroke for the plastic
        // thickness.
        ctx.set_paint(Color::from_rgba8(240, 248, 255, 38));
        ctx.fill_rect(&sleeve);
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0));
        ctx.set_paint(Color::from_rgba8(200, 220, 240, 102));
        ctx.stroke_rect(&sleeve);

        // Rounded card body under the image.
        ctx.set_paint(Color::from_rgba8(255, 255, 255, 250));
        ctx.fill_path(&body_path);

        // Card image, clipped to the same rounded rect.
        ctx.push_clip_layer(&body_path);
        let natural = asset.size();
        let image_tr = frame
            * Affine::translate((-hw, -hh))
            * Affine::scale_non_uniform(
                card.size.width / natural.width,
                card.size.height / natural.height,
            );
        ctx.set_transform(to_cpu(image_tr));
        ctx.set_paint(asset.paint());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            natural.width,
            natural.height,
        ));
        ctx.pop_layer();
        ctx.set_transform(to_cpu(frame));

        // Overlay order matters: later passes alpha-composite over earlier
        // ones.
        ctx.set_paint(air_gap_gradient(hw, hh));
        ctx.fill_rect(&sleeve);
        ctx.set_paint(sleeve_gloss_gradient(hw, hh));
        ctx.fill_rect(&sleeve);
        ctx.set_paint(diagonal_glare_gradient(hw, hh));
        ctx.fill_rect(&sleeve);
        ctx.set_paint(opening_shadow_gradient(hw, hh));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            -hw - m,
            -hh - m,
            hw + m,
            -hh - m + OPENING_SHADOW_EXTENT,
        ));
        ctx.flush();

        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.scratch);
        composite::over_in_place(
            self.output.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
        )
    }
}

fn extents_u16(surface: SurfaceSize) -> StudioResult<(u16, u16)> {
    let w: u16 = surface
        .width
        .try_into()
        .map_err(|_| StudioError::render("surface width exceeds u16"))?;
    let h: u16 = surface
        .height
        .try_into()
        .map_err(|_| StudioError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(StudioError::render("surface extents must be > 0"));
    }
    Ok((w, h))
}

/// Local card frame: surface coordinates -> card-centered, tilted space.
fn card_frame(card: &CardLayer) -> Affine {
    let c = card.center();
    Affine::translate((c.x, c.y)) * Affine::rotate(CARD_TILT_RAD)
}

fn sleeve_rect(card: &CardLayer) -> vello_cpu::kurbo::Rect {
    let half = card.half_size();
    vello_cpu::kurbo::Rect::new(
        -half.width - SLEEVE_MARGIN,
        -half.height - SLEEVE_MARGIN,
        half.width + SLEEVE_MARGIN,
        half.height + SLEEVE_MARGIN,
    )
}

fn rounded_card_path(card: &CardLayer) -> vello_cpu::kurbo::BezPath {
    use kurbo::{PathEl, Shape};

    let half = card.half_size();
    let rr = kurbo::RoundedRect::new(
        -half.width,
        -half.height,
        half.width,
        half.height,
        CARD_CORNER_RADIUS_BASE * card.scale,
    );
    let cpu_pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in rr.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => out.move_to(cpu_pt(p)),
            PathEl::LineTo(p) => out.line_to(cpu_pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(cpu_pt(p1), cpu_pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(cpu_pt(p1), cpu_pt(p2), cpu_pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Soft air gap inside the sleeve.
fn air_gap_gradient(hw: f64, hh: f64) -> vello_cpu::peniko::Gradient {
    let m = SLEEVE_MARGIN;
    vello_cpu::peniko::Gradient::new_linear((-hw - m, -hh), (hw + m, hh)).with_stops([
        (0.0, Color::from_rgba8(255, 255, 255, 20)),
        (0.5, Color::from_rgba8(240, 248, 255, 15)),
        (1.0, Color::from_rgba8(255, 255, 255, 20)),
    ])
}

/// Directional gloss over the plastic surface.
fn sleeve_gloss_gradient(hw: f64, hh: f64) -> vello_cpu::peniko::Gradient {
    let m = SLEEVE_MARGIN;
    vello_cpu::peniko::Gradient::new_linear((-hw - m, -hh - m), (hw + m, hh / 2.0)).with_stops([
        (0.0, Color::from_rgba8(255, 255, 255, 51)),
        (0.3, Color::from_rgba8(255, 255, 255, 26)),
        (0.6, Color::from_rgba8(255, 255, 255, 13)),
        (1.0, Color::from_rgba8(255, 255, 255, 38)),
    ])
}

/// Diagonal specular stripe.
fn diagonal_glare_gradient(hw: f64, hh: f64) -> vello_cpu::peniko::Gradient {
    vello_cpu::peniko::Gradient::new_linear((-hw * 2.0 / 3.0, -hh * 2.0 / 3.0), (hw, hh / 2.0))
        .with_stops([
            (0.0, Color::from_rgba8(255, 255, 255, 0)),
            (0.4, Color::from_rgba8(255, 255, 255, 0)),
            (0.5, Color::from_rgba8(255, 255, 255, 77)),
            (0.6, Color::from_rgba8(255, 255, 255, 38)),
            (0.7, Color::from_rgba8(255, 255, 255, 0)),
            (1.0, Color::from_rgba8(255, 255, 255, 0)),
        ])
}

/// Shadow cast by the sleeve opening along the top edge.
fn opening_shadow_gradient(hw: f64, hh: f64) -> vello_cpu::peniko::Gradient {
    let m = SLEEVE_MARGIN;
    vello_cpu::peniko::Gradient::new_linear(
        (-hw - m, -hh - m),
        (hw + m, -hh - m + OPENING_SHADOW_EXTENT),
    )
    .with_stops([
        (0.0, Color::from_rgba8(0, 0, 0, 26)),
        (1.0, Color::from_rgba8(0, 0, 0, 0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgba: [u8; 4], width: u32, height: u32) -> ImageAsset {
        let bytes = rgba.repeat((width * height) as usize);
        ImageAsset::from_premul_rgba8(bytes, width, height).unwrap()
    }

    #[test]
    fn empty_scene_renders_opaque_backdrop() {
        let mut comp = Compositor::new(SurfaceSize::new(16, 20)).unwrap();
        comp.render(&Scene::new()).unwrap();
        for px in comp.pixels().chunks_exact(4) {
            assert_eq!(px, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn background_only_scene_paints_background() {
        let surface = SurfaceSize::new(16, 20);
        let mut scene = Scene::new();
        scene.set_background(solid([0, 200, 0, 255], 8, 10), surface);

        let mut comp = Compositor::new(surface).unwrap();
        comp.render(&scene).unwrap();

        // Center pixel of a solid cover-fit background is the solid color.
        let idx = ((10 * 16 + 8) * 4) as usize;
        assert_eq!(&comp.pixels()[idx..idx + 4], &[0, 200, 0, 255]);
    }

    #[test]
    fn card_layer_changes_pixels_over_base() {
        let surface = SurfaceSize::new(60, 80);
        let mut scene = Scene::new();
        scene.set_background(solid([0, 0, 200, 255], 30, 40), surface);

        let mut comp = Compositor::new(surface).unwrap();
        comp.render(&scene).unwrap();
        let without_card = comp.frame();

        scene.set_card(solid([200, 0, 0, 255], 6, 8), surface);
        comp.render(&scene).unwrap();
        let with_card = comp.frame();

        assert_ne!(without_card.data, with_card.data);
        assert!(with_card.premultiplied);
    }

    #[test]
    fn render_is_idempotent() {
        let surface = SurfaceSize::new(60, 80);
        let mut scene = Scene::new();
        scene.set_background(solid([10, 60, 120, 255], 30, 40), surface);
        scene.set_card(solid([200, 150, 100, 255], 6, 8), surface);

        let mut comp = Compositor::new(surface).unwrap();
        comp.render(&scene).unwrap();
        let a = comp.frame();
        comp.render(&scene).unwrap();
        let b = comp.frame();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn rejects_surfaces_beyond_u16() {
        assert!(Compositor::new(SurfaceSize::new(70_000, 100)).is_err());
        assert!(Compositor::new(SurfaceSize::new(100, 0)).is_err());
    }
}
