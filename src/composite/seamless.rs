//! Gradient-domain (Poisson) blending with mixed gradients
//!
//! The source is placed so that its center lands on `center` in the
//! destination. Inside the region the result follows a guidance field built
//! from the stronger of the source and destination gradients, weighted by
//! the mask; the outer 1-pixel ring is pinned to the destination. The
//! Poisson equation is solved per channel with successive over-relaxation.

use image::{GrayImage, Rgb, RgbImage};
use rayon::prelude::*;
use tracing::debug;

use super::CompositeError;

/// Stop once the largest update in a sweep falls below this
const TOLERANCE: f32 = 0.01;

/// Iteration cap for the solver
const MAX_ITERATIONS: usize = 5000;

/// Smallest region edge that still has an interior
const MIN_REGION_SIZE: u32 = 3;

/// Blend `src` into `dst` centered at `center`.
///
/// `mask` must have the same size as `src`; its values weight the source
/// gradients from 0 (destination only) to 255 (mixed gradients).
pub fn seamless_clone(
    dst: &RgbImage,
    src: &RgbImage,
    mask: &GrayImage,
    center: (u32, u32),
) -> Result<RgbImage, CompositeError> {
    let (w, h) = src.dimensions();
    if w < MIN_REGION_SIZE || h < MIN_REGION_SIZE {
        return Err(CompositeError::RegionTooSmall {
            width: w,
            height: h,
        });
    }
    if mask.dimensions() != (w, h) {
        return Err(CompositeError::MaskMismatch {
            region: (w, h),
            mask: mask.dimensions(),
        });
    }
    if mask.pixels().all(|p| p.0[0] == 0) {
        return Err(CompositeError::EmptyMask);
    }

    let x0 = i64::from(center.0) - i64::from(w / 2);
    let y0 = i64::from(center.1) - i64::from(h / 2);
    if x0 < 0
        || y0 < 0
        || x0 + i64::from(w) > i64::from(dst.width())
        || y0 + i64::from(h) > i64::from(dst.height())
    {
        return Err(CompositeError::OutOfBounds {
            center,
            region: (w, h),
            image: dst.dimensions(),
        });
    }
    let (x0, y0) = (x0 as u32, y0 as u32);

    let (wu, hu) = (w as usize, h as usize);
    let weights: Vec<f32> = mask.pixels().map(|p| f32::from(p.0[0]) / 255.0).collect();

    let solved: Vec<Vec<f32>> = (0..3usize)
        .into_par_iter()
        .map(|c| {
            let s: Vec<f32> = src.pixels().map(|p| f32::from(p.0[c])).collect();
            let d: Vec<f32> = (0..h)
                .flat_map(|y| (0..w).map(move |x| (x, y)))
                .map(|(x, y)| f32::from(dst.get_pixel(x0 + x, y0 + y).0[c]))
                .collect();
            solve_channel(&s, &d, &weights, wu, hu)
        })
        .collect();

    let mut out = dst.clone();
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let px = [0usize, 1, 2].map(|c| solved[c][i].round().clamp(0.0, 255.0) as u8);
            out.put_pixel(x0 + x, y0 + y, Rgb(px));
        }
    }

    Ok(out)
}

/// Guidance difference between neighbours `p` and `q`
#[inline]
fn guidance(s: &[f32], d: &[f32], weights: &[f32], p: usize, q: usize) -> f32 {
    let gs = s[p] - s[q];
    let gd = d[p] - d[q];
    let mixed = if gs.abs() > gd.abs() { gs } else { gd };
    let wt = 0.5 * (weights[p] + weights[q]);
    wt * mixed + (1.0 - wt) * gd
}

fn solve_channel(s: &[f32], d: &[f32], weights: &[f32], w: usize, h: usize) -> Vec<f32> {
    // Divergence of the guidance field at interior pixels
    let mut div = vec![0.0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = y * w + x;
            div[p] = [p - 1, p + 1, p - w, p + w]
                .iter()
                .map(|&q| guidance(s, d, weights, p, q))
                .sum();
        }
    }

    // Boundary ring from the destination, interior starts at the alpha blend
    let mut f: Vec<f32> = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                d[i]
            } else {
                weights[i] * s[i] + (1.0 - weights[i]) * d[i]
            }
        })
        .collect();

    let omega = 2.0 / (1.0 + (std::f32::consts::PI / w.max(h) as f32).sin());

    let mut iterations = 0;
    for _ in 0..MAX_ITERATIONS {
        iterations += 1;
        let mut max_delta = 0.0f32;
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let p = y * w + x;
                let target = (f[p - 1] + f[p + 1] + f[p - w] + f[p + w] + div[p]) * 0.25;
                let delta = omega * (target - f[p]);
                f[p] += delta;
                max_delta = max_delta.max(delta.abs());
            }
        }
        if max_delta < TOLERANCE {
            break;
        }
    }
    debug!("Poisson solve {}x{} converged after {} sweeps", w, h, iterations);

    f
}
