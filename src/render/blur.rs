//! Separable gaussian blur over premultiplied RGBA8, used for the sleeve
//! drop shadow.

use crate::foundation::error::{StudioError, StudioResult};

/// Blur `src` (premultiplied RGBA8, `width * height * 4` bytes) with a
/// gaussian kernel of the given radius and sigma. Radius 0 returns the input
/// unchanged.
pub fn blur_premul_rgba8(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> StudioResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| StudioError::render("blur buffer size overflow"))?;
    if src.len() != expected {
        return Err(StudioError::render(
            "blur_premul_rgba8 expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected];
    let mut out = vec![0u8; expected];
    directional_pass(src, &mut tmp, width, height, &kernel, Direction::Horizontal);
    directional_pass(&tmp, &mut out, width, height, &kernel, Direction::Vertical);
    Ok(out)
}

/// Normalized gaussian weights in Q16 fixed point. The rounding residual is
/// folded into the center tap so the weights sum to exactly 1<<16.
fn gaussian_kernel_q16(radius: u32, sigma: f32) -> StudioResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(StudioError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r).map(|i| (-((i * i) as f64) / denom).exp()).collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(StudioError::render("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|&wf| (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + (65536 - acc)).clamp(0, 65536) as u32;
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Vertical,
}

fn directional_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], dir: Direction) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                // Clamp-to-edge sampling along the blur direction.
                let (sx, sy) = match dir {
                    Direction::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Direction::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    (((acc + 32768) >> 16).min(255)) as u8
}
