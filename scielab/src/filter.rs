//! Contrast-sensitivity spatial filters for the opponent channels.
//!
//! Each channel is blurred by a weighted sum of Gaussians whose spreads are
//! given in degrees of visual angle; chromatic channels get much wider
//! kernels than luminance. The 1-D kernel is applied separably.
//!
//! Borders extend the edge pixel outwards (clamp-to-edge), so a flat region
//! stays flat right up to the edge and a spot near a corner is never copied
//! into the virtual border.
//!
//! Optimizations:
//! - Transpose during each 1-D pass so the second pass is also row-wise
//! - Separate fast path for interior pixels (no index clamping)
//! - Explicit f32x8 SIMD for the interior

use crate::ScielabError;
use crate::consts::{
    BLUE_YELLOW_COMPONENTS, KERNEL_TRUNCATION_SIGMAS, LUMINANCE_COMPONENTS,
    MAX_KERNEL_EXTENT_DEGREES, MAX_PIXELS_PER_DEGREE, MIN_PIXELS_PER_DEGREE,
    RED_GREEN_COMPONENTS,
};
use crate::image::ImageF;
use crate::opponent::{Channel, OpponentImage};
use wide::f32x8;

/// One Gaussian term of a channel filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianComponent {
    /// Weight of this term in the channel filter. May be negative.
    pub weight: f64,
    /// Spread `s` of `exp(-(x / s)^2)`, in degrees of visual angle.
    pub spread_degrees: f64,
}

impl Channel {
    /// The Gaussian terms that make up this channel's filter.
    #[must_use]
    pub fn components(self) -> Vec<GaussianComponent> {
        let table: &[(f64, f64)] = match self {
            Channel::Luminance => &LUMINANCE_COMPONENTS,
            Channel::RedGreen => &RED_GREEN_COMPONENTS,
            Channel::BlueYellow => &BLUE_YELLOW_COMPONENTS,
        };
        table
            .iter()
            .map(|&(weight, spread_degrees)| GaussianComponent {
                weight,
                spread_degrees,
            })
            .collect()
    }
}

/// Normalized, symmetric 1-D filter kernel of odd length.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f32>,
}

impl Kernel {
    /// Kernel taps, centered at `half_width()`.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of taps on each side of the center.
    #[must_use]
    pub fn half_width(&self) -> usize {
        self.weights.len() / 2
    }

    /// Total number of taps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; kernels have at least three taps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

fn check_density(pixels_per_degree: f64) -> Result<(), ScielabError> {
    // NaN fails the range check
    if (MIN_PIXELS_PER_DEGREE..=MAX_PIXELS_PER_DEGREE).contains(&pixels_per_degree) {
        Ok(())
    } else {
        Err(ScielabError::InvalidSamplingDensity { pixels_per_degree })
    }
}

/// Number of taps on each side of the center for a channel.
///
/// Three standard deviations of the widest term, but never more than half
/// of [`MAX_KERNEL_EXTENT_DEGREES`]; at least one.
fn kernel_half_width(components: &[GaussianComponent], pixels_per_degree: f64) -> usize {
    let widest_std = components
        .iter()
        .map(|c| c.spread_degrees * pixels_per_degree / std::f64::consts::SQRT_2)
        .fold(0.0f64, f64::max);
    let by_sigma = (KERNEL_TRUNCATION_SIGMAS * widest_std).ceil();
    let by_extent = (pixels_per_degree * MAX_KERNEL_EXTENT_DEGREES / 2.0).ceil();
    by_sigma.min(by_extent).max(1.0) as usize
}

/// Builds the 1-D kernel for one opponent channel on a given display.
///
/// Every Gaussian term is sampled over the shared support and normalized to
/// unit sum on its own, the terms are mixed by weight, and the mix is
/// normalized to unit sum again.
///
/// # Errors
/// Returns [`ScielabError::InvalidSamplingDensity`] unless
/// `pixels_per_degree` lies in
/// [`MIN_PIXELS_PER_DEGREE`]`..=`[`MAX_PIXELS_PER_DEGREE`].
pub fn build_kernel(channel: Channel, pixels_per_degree: f64) -> Result<Kernel, ScielabError> {
    check_density(pixels_per_degree)?;

    let components = channel.components();
    let half = kernel_half_width(&components, pixels_per_degree);
    let size = 2 * half + 1;
    let mut mixed = vec![0.0f64; size];

    for c in &components {
        let spread_px = c.spread_degrees * pixels_per_degree;
        let term: Vec<f64> = (0..size)
            .map(|i| {
                let x = i as f64 - half as f64;
                (-(x / spread_px) * (x / spread_px)).exp()
            })
            .collect();
        let sum: f64 = term.iter().sum();
        for (m, t) in mixed.iter_mut().zip(&term) {
            *m += c.weight * t / sum;
        }
    }

    let total: f64 = mixed.iter().sum();
    Ok(Kernel {
        weights: mixed.iter().map(|&w| (w / total) as f32).collect(),
    })
}

/// Clamps a coordinate outside image bounds to the nearest edge pixel.
///
/// `size` must be at least 1.
#[inline]
fn clamp_to_edge(x: isize, size: usize) -> usize {
    x.clamp(0, size as isize - 1) as usize
}

/// One 1-D pass along rows, written transposed.
///
/// `output` must be (height, width) of `input`. Running it twice gives the
/// separable 2-D filter in the original orientation.
fn convolve_transpose_to(input: &ImageF, kernel: &[f32], output: &mut ImageF) {
    let width = input.width();
    let half = kernel.len() / 2;

    // [border1, border2) can be read without clamping
    let (border1, border2) = if width > 2 * half {
        (half, width - half)
    } else {
        (width, width)
    };

    for x in 0..border1 {
        convolve_border_column(input, kernel, x, output);
    }
    if border2 > border1 {
        convolve_interior_simd(input, kernel, border1, border2, output);
    }
    for x in border2.max(border1)..width {
        convolve_border_column(input, kernel, x, output);
    }
}

/// SIMD interior convolution with transpose.
///
/// Processes 8 x-positions at a time using f32x8 SIMD operations.
#[multiversion::multiversion(targets(
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
fn convolve_interior_simd(
    input: &ImageF,
    kernel: &[f32],
    border1: usize,
    border2: usize,
    output: &mut ImageF,
) {
    let half = kernel.len() / 2;
    let simd_end = border1 + (border2 - border1) / 8 * 8;

    for y in 0..input.height() {
        let row_in = input.row(y);

        for x in (border1..simd_end).step_by(8) {
            let d = x - half;
            let mut sum = f32x8::splat(0.0);
            for (j, &k) in kernel.iter().enumerate() {
                let mut lanes = [0.0f32; 8];
                lanes.copy_from_slice(&row_in[d + j..d + j + 8]);
                sum += f32x8::from(lanes) * f32x8::splat(k);
            }
            let results: [f32; 8] = sum.into();
            for (i, &val) in results.iter().enumerate() {
                output.set(y, x + i, val);
            }
        }

        // Scalar tail
        for x in simd_end..border2 {
            let d = x - half;
            let sum: f32 = kernel
                .iter()
                .zip(&row_in[d..d + kernel.len()])
                .map(|(&k, &v)| k * v)
                .sum();
            output.set(y, x, sum);
        }
    }
}

/// Border column of the horizontal pass, reading edge-clamped neighbors.
fn convolve_border_column(input: &ImageF, kernel: &[f32], x: usize, output: &mut ImageF) {
    let width = input.width();
    let half = kernel.len() as isize / 2;
    let taps: Vec<usize> = (0..kernel.len() as isize)
        .map(|j| clamp_to_edge(x as isize + j - half, width))
        .collect();

    for y in 0..input.height() {
        let row_in = input.row(y);
        let sum: f32 = kernel
            .iter()
            .zip(&taps)
            .map(|(&k, &src)| k * row_in[src])
            .sum();
        output.set(y, x, sum);
    }
}

/// Separable 2-D convolution of one plane. `input` is left untouched.
#[must_use]
pub fn convolve_separable(input: &ImageF, kernel: &Kernel) -> ImageF {
    let mut transposed = ImageF::new(input.height(), input.width());
    convolve_transpose_to(input, kernel.weights(), &mut transposed);

    let mut output = ImageF::new(input.width(), input.height());
    convolve_transpose_to(&transposed, kernel.weights(), &mut output);
    output
}

/// The three channel kernels for one sampling density.
///
/// Build once per display and reuse across images.
#[derive(Debug, Clone)]
pub struct FilterBank {
    pixels_per_degree: f64,
    kernels: [Kernel; 3],
}

impl FilterBank {
    /// Builds the kernels for all three channels.
    ///
    /// # Errors
    /// Returns [`ScielabError::InvalidSamplingDensity`] unless
    /// `pixels_per_degree` lies in
    /// [`MIN_PIXELS_PER_DEGREE`]`..=`[`MAX_PIXELS_PER_DEGREE`].
    pub fn new(pixels_per_degree: f64) -> Result<Self, ScielabError> {
        Ok(Self {
            pixels_per_degree,
            kernels: [
                build_kernel(Channel::Luminance, pixels_per_degree)?,
                build_kernel(Channel::RedGreen, pixels_per_degree)?,
                build_kernel(Channel::BlueYellow, pixels_per_degree)?,
            ],
        })
    }

    /// Sampling density the kernels were built for.
    #[must_use]
    pub fn pixels_per_degree(&self) -> f64 {
        self.pixels_per_degree
    }

    /// Kernel used for one channel.
    #[must_use]
    pub fn kernel(&self, channel: Channel) -> &Kernel {
        &self.kernels[channel.index()]
    }

    /// Filters every channel of an opponent image into a new image.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip(self, opponent),
            fields(w = opponent.width(), h = opponent.height(), ppd = self.pixels_per_degree)
        )
    )]
    #[must_use]
    pub fn apply(&self, opponent: &OpponentImage) -> OpponentImage {
        let filter = |channel: Channel| {
            convolve_separable(opponent.channel(channel), self.kernel(channel))
        };

        #[cfg(feature = "rayon")]
        let (lum, (rg, by)) = rayon::join(
            || filter(Channel::Luminance),
            || rayon::join(|| filter(Channel::RedGreen), || filter(Channel::BlueYellow)),
        );
        #[cfg(not(feature = "rayon"))]
        let (lum, rg, by) = (
            filter(Channel::Luminance),
            filter(Channel::RedGreen),
            filter(Channel::BlueYellow),
        );

        OpponentImage::from_planes([lum, rg, by])
    }
}

/// Applies the contrast-sensitivity filters for a display's sampling density.
///
/// # Errors
/// Returns [`ScielabError::InvalidSamplingDensity`] unless
/// `pixels_per_degree` lies in
/// [`MIN_PIXELS_PER_DEGREE`]`..=`[`MAX_PIXELS_PER_DEGREE`].
pub fn apply_filter(
    opponent: &OpponentImage,
    pixels_per_degree: f64,
) -> Result<OpponentImage, ScielabError> {
    Ok(FilterBank::new(pixels_per_degree)?.apply(opponent))
}
