use std::sync::Arc;

use crate::foundation::core::Size;
use crate::foundation::error::{StudioError, StudioResult};

/// An immutable, fully decoded raster image ready for compositing.
///
/// Pixels are premultiplied RGBA8, wrapped once as a `vello_cpu` image paint
/// so repeated renders share the same pixmap.
#[derive(Clone)]
pub struct ImageAsset {
    width: u32,
    height: u32,
    paint: vello_cpu::Image,
}

impl ImageAsset {
    /// Decode encoded image bytes (PNG, JPEG, ...) into an asset.
    pub fn decode(bytes: &[u8]) -> StudioResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| StudioError::decode(format!("decode image from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self::from_premul_rgba8(rgba8_premul, width, height)
    }

    /// Wrap already-premultiplied RGBA8 pixels.
    pub fn from_premul_rgba8(bytes: Vec<u8>, width: u32, height: u32) -> StudioResult<Self> {
        if width == 0 || height == 0 {
            return Err(StudioError::decode("image must have width>0 and height>0"));
        }
        let w: u16 = width
            .try_into()
            .map_err(|_| StudioError::decode("image width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| StudioError::decode("image height exceeds u16"))?;
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if bytes.len() != expected {
            return Err(StudioError::decode("image byte len mismatch"));
        }

        let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
            (width as usize) * (height as usize),
        );
        for px in bytes.chunks_exact(4) {
            pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
                px[0], px[1], px[2], px[3],
            ]));
        }
        let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        Ok(Self {
            width,
            height,
            paint,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Natural dimensions as a float size.
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    pub(crate) fn paint(&self) -> vello_cpu::Image {
        self.paint.clone()
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(rgba: [u8; 4], width: u32, height: u32) -> ImageAsset {
        let bytes = rgba.repeat((width * height) as usize);
        ImageAsset::from_premul_rgba8(bytes, width, height).unwrap()
    }

    #[test]
    fn rejects_zero_dimensions_and_bad_lengths() {
        assert!(ImageAsset::from_premul_rgba8(vec![], 0, 4).is_err());
        assert!(ImageAsset::from_premul_rgba8(vec![0; 12], 2, 2).is_err());
    }

    #[test]
    fn wraps_valid_pixels() {
        let asset = solid([10, 20, 30, 255], 3, 2);
        assert_eq!(asset.width(), 3);
        assert_eq!(asset.height(), 2);
        assert_eq!(asset.size(), Size::new(3.0, 2.0));
    }

    #[test]
    fn premultiply_zero_alpha_clears_rgb() {
        let mut px = vec![200, 100, 50, 0];
        premultiply_rgba8_in_place(&mut px);
        assert_eq!(px, vec![0, 0, 0, 0]);
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        assert!(matches!(
            ImageAsset::decode(b"not an image"),
            Err(StudioError::Decode(_))
        ));
    }
}
