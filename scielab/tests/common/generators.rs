//! Deterministic synthetic images for scielab tests.
//!
//! All images are interleaved RGB bytes produced from an LCG PRNG, so test
//! inputs are identical across platforms.

#![allow(dead_code)]

use scielab::RGB8;

/// Convert RGB byte slice to Vec<RGB8>
pub fn rgb_bytes_to_pixels(rgb: &[u8]) -> Vec<RGB8> {
    rgb.chunks_exact(3)
        .map(|c| RGB8::new(c[0], c[1], c[2]))
        .collect()
}

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

// ============================================================================
// Image Generation Functions
// ============================================================================

/// Generate uniform color image
pub fn gen_uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    [r, g, b].repeat(width * height)
}

/// Generate horizontal color gradient (red rises, blue falls)
pub fn gen_color_gradient(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let t = if width > 1 { x * 255 / (width - 1) } else { 128 };
            let g = if height > 1 { y * 255 / (height - 1) } else { 128 };
            data.extend_from_slice(&[t as u8, g as u8, (255 - t) as u8]);
        }
    }
    data
}

/// Generate checkerboard pattern
pub fn gen_checkerboard(width: usize, height: usize, block_size: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / block_size + y / block_size) % 2 == 0 { lo } else { hi };
            data.extend_from_slice(&[v, v, v]);
        }
    }
    data
}

/// Generate random noise image
pub fn gen_random(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height * 3).map(|_| rng.next_u8()).collect()
}

// ============================================================================
// Distortion Functions
// ============================================================================

/// Replace one pixel with a fixed color
pub fn distort_pixel(img: &[u8], width: usize, x: usize, y: usize, rgb: [u8; 3]) -> Vec<u8> {
    let mut out = img.to_vec();
    let i = (y * width + x) * 3;
    out[i..i + 3].copy_from_slice(&rgb);
    out
}

/// Add deterministic noise of up to +/- amplitude
pub fn distort_noise(img: &[u8], seed: u64, amplitude: u8) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let span = 2 * i16::from(amplitude) + 1;
    img.iter()
        .map(|&v| {
            let n = i16::from(rng.next_u8()) % span - i16::from(amplitude);
            (i16::from(v) + n).clamp(0, 255) as u8
        })
        .collect()
}
