//! Difference map export as viridis-colored PNGs with a colorbar.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use scielab::ImgVec;

/// viridis sampled at 0.0, 0.1, ..., 1.0
const VIRIDIS: [[u8; 3]; 11] = [
    [68, 1, 84],
    [72, 36, 117],
    [65, 68, 135],
    [53, 95, 141],
    [42, 120, 142],
    [33, 145, 140],
    [34, 168, 132],
    [68, 191, 112],
    [122, 209, 81],
    [189, 223, 38],
    [253, 231, 37],
];

const COLORBAR_GAP: u32 = 4;
const COLORBAR_MIN_WIDTH: u32 = 8;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Maps `t` in [0, 1] to a viridis color.
pub fn viridis(t: f32) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let pos = t * (VIRIDIS.len() - 1) as f32;
    let i = (pos.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = pos - i as f32;
    let (lo, hi) = (VIRIDIS[i], VIRIDIS[i + 1]);
    Rgb([0, 1, 2].map(|c| {
        let v = f32::from(lo[c]) + (f32::from(hi[c]) - f32::from(lo[c])) * frac;
        v.round() as u8
    }))
}

fn colorbar_width(map_width: u32) -> u32 {
    (map_width / 16).max(COLORBAR_MIN_WIDTH)
}

/// Colorizes a difference map, normalized to its maximum, and appends a
/// vertical colorbar (maximum at the top) on the right.
pub fn render_diffmap(map: &ImgVec<f32>) -> RgbImage {
    let (w, h) = (map.width() as u32, map.height() as u32);
    let max = map.buf().iter().copied().fold(0.0f32, f32::max);
    let scale = if max > 0.0 { 1.0 / max } else { 0.0 };

    let bar_w = colorbar_width(w);
    let mut out = RgbImage::from_pixel(w + COLORBAR_GAP + bar_w, h, BACKGROUND);

    for (y, row) in map.rows().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            out.put_pixel(x as u32, y as u32, viridis(v * scale));
        }
    }

    for y in 0..h {
        let t = if h > 1 { 1.0 - y as f32 / (h - 1) as f32 } else { 1.0 };
        let color = viridis(t);
        for x in 0..bar_w {
            out.put_pixel(w + COLORBAR_GAP + x, y, color);
        }
    }
    out
}

/// Writes `color_diff_{i}.png` for every map into `dir`, which must exist.
pub fn save_color_difference_maps(maps: &[ImgVec<f32>], dir: &Path) -> Result<Vec<PathBuf>> {
    maps.iter()
        .enumerate()
        .map(|(i, map)| {
            let path = dir.join(format!("color_diff_{i}.png"));
            render_diffmap(map)
                .save(&path)
                .with_context(|| format!("saving difference map {}", path.display()))?;
            Ok(path)
        })
        .collect()
}
