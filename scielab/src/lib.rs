//! # S-CIELAB
//!
//! Display-aware perceptual color difference between two rendered images.
//!
//! Plain CIELAB compares colors pixel by pixel. The eye does not: fine
//! chromatic detail is blurred away long before fine luminance detail is.
//! S-CIELAB (Zhang & Wandell) models this by filtering each opponent color
//! channel with a blur sized for the physical display and viewing distance,
//! then measuring CIELAB distance on the filtered result.
//!
//! Pipeline:
//! - Display model: screen resolution and diagonal to pixels per degree
//! - Opponent transform: sRGB to XYZ to luminance / red-green / blue-yellow
//! - Spatial filters: per-channel sums of Gaussians, separable, edges clamped
//! - Difference: CIELAB per pixel (CIE76 or CIEDE2000), mean and maximum
//!
//! ## Example
//!
//! ```rust
//! use scielab::{scielab, DisplayGeometry, ScielabParams};
//! use imgref::Img;
//! use rgb::RGB8;
//!
//! let width = 16;
//! let height = 16;
//! let pixels: Vec<RGB8> = (0..width * height)
//!     .map(|i| RGB8::new((i % 256) as u8, ((i * 2) % 256) as u8, ((i * 3) % 256) as u8))
//!     .collect();
//!
//! let img1 = Img::new(pixels.clone(), width, height);
//! let img2 = Img::new(pixels, width, height);
//!
//! let params = ScielabParams::new().with_display(DisplayGeometry::new(3000, 2000, 14.0)?);
//! let result = scielab(img1.as_ref(), img2.as_ref(), &params)?;
//!
//! assert_eq!(result.avg_diff, 0.0);
//! assert_eq!(result.max_pos, (0, 0));
//! # Ok::<(), scielab::ScielabError>(())
//! ```
//!
//! ## Features
//!
//! - **`rayon`**: filter the three opponent channels in parallel
//! - **`tracing`**: `tracing` spans on the pipeline stages
//!
//! ## References
//!
//! - X. Zhang and B. A. Wandell, "A spatial extension of CIELAB for digital
//!   color image reproduction", SID Journal, 1997.
//! - <http://scarlet.stanford.edu/~brian/scielab/>

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
// Published filter and matrix constants are kept digit for digit
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod consts;
mod diff;
mod display;
mod filter;
pub mod image;
mod opponent;

pub mod precompute;
pub use precompute::ScielabReference;

pub mod quality;
pub use quality::{MetricName, NoQualityMetrics, QualityMetrics, QualityScores, graininess};

pub use consts::DEFAULT_VIEWING_DISTANCE_INCHES;
pub use diff::{ColorDifference, DeltaE, compute_color_difference, compute_color_difference_with};
pub use display::{DisplayGeometry, compute_sampling_density};
pub use filter::{
    FilterBank, GaussianComponent, Kernel, apply_filter, build_kernel, convolve_separable,
};
pub use image::ImageF;
pub use opponent::{
    Channel, DeviceRgb, LabImage, OpponentImage, opponent_to_lab, srgb_to_linear, to_opponent,
    xyz_to_lab,
};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{RGB, RGB8};

/// Error type for S-CIELAB operations.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScielabError {
    /// Display resolution is zero or the diagonal is not positive and finite.
    InvalidGeometry {
        /// Horizontal resolution.
        width_px: usize,
        /// Vertical resolution.
        height_px: usize,
        /// Screen diagonal in inches.
        diagonal_inches: f64,
    },
    /// Viewing distance is not positive and finite.
    InvalidViewingDistance {
        /// Distance provided.
        inches: f64,
    },
    /// Pixels per degree is outside
    /// [`MIN_PIXELS_PER_DEGREE`](consts::MIN_PIXELS_PER_DEGREE)`..=`[`MAX_PIXELS_PER_DEGREE`](consts::MAX_PIXELS_PER_DEGREE),
    /// or NaN.
    InvalidSamplingDensity {
        /// Density provided.
        pixels_per_degree: f64,
    },
    /// Image dimensions don't match.
    ShapeMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
    /// Image has no pixels.
    ///
    /// `imgref` already refuses a zero width when the image is built, so in
    /// practice this is a zero height.
    ImageTooSmall {
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// A float channel value is NaN or infinite.
    UnsupportedChannelRange {
        /// Column of the offending pixel.
        x: usize,
        /// Row of the offending pixel.
        y: usize,
    },
}

impl std::fmt::Display for ScielabError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGeometry {
                width_px,
                height_px,
                diagonal_inches,
            } => write!(
                f,
                "invalid display geometry: {width_px}x{height_px} px, {diagonal_inches} in diagonal"
            ),
            Self::InvalidViewingDistance { inches } => {
                write!(f, "invalid viewing distance: {inches} in")
            }
            Self::InvalidSamplingDensity { pixels_per_degree } => {
                write!(f, "invalid sampling density: {pixels_per_degree} pixels/degree")
            }
            Self::ShapeMismatch { w1, h1, w2, h2 } => {
                write!(f, "image dimensions don't match: {w1}x{h1} vs {w2}x{h2}")
            }
            Self::ImageTooSmall { width, height } => {
                write!(f, "image too small: {width}x{height} (minimum 1x1)")
            }
            Self::UnsupportedChannelRange { x, y } => {
                write!(f, "non-finite channel value at ({x}, {y})")
            }
        }
    }
}

impl std::error::Error for ScielabError {}

/// S-CIELAB comparison parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use scielab::{DeltaE, DisplayGeometry, ScielabParams};
///
/// let params = ScielabParams::new()
///     .with_display(DisplayGeometry::new(2560, 1440, 27.0)?)
///     .with_viewing_distance(24.0)
///     .with_delta_e(DeltaE::Ciede2000);
/// assert!(params.pixels_per_degree()? > 0.0);
/// # Ok::<(), scielab::ScielabError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScielabParams {
    display: DisplayGeometry,
    viewing_distance_inches: f64,
    delta_e: DeltaE,
}

impl Default for ScielabParams {
    fn default() -> Self {
        Self {
            display: DisplayGeometry::default(),
            viewing_distance_inches: DEFAULT_VIEWING_DISTANCE_INCHES,
            delta_e: DeltaE::default(),
        }
    }
}

impl ScielabParams {
    /// Creates a new `ScielabParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display the images are viewed on.
    #[must_use]
    pub fn with_display(mut self, display: DisplayGeometry) -> Self {
        self.display = display;
        self
    }

    /// Sets the viewing distance in inches.
    #[must_use]
    pub fn with_viewing_distance(mut self, inches: f64) -> Self {
        self.viewing_distance_inches = inches;
        self
    }

    /// Sets the per-pixel color difference formula.
    #[must_use]
    pub fn with_delta_e(mut self, delta_e: DeltaE) -> Self {
        self.delta_e = delta_e;
        self
    }

    /// Returns the display geometry.
    #[must_use]
    pub fn display(&self) -> &DisplayGeometry {
        &self.display
    }

    /// Returns the viewing distance in inches.
    #[must_use]
    pub fn viewing_distance_inches(&self) -> f64 {
        self.viewing_distance_inches
    }

    /// Returns the color difference formula.
    #[must_use]
    pub fn delta_e(&self) -> DeltaE {
        self.delta_e
    }

    /// Angular sampling density for this display and viewing distance.
    ///
    /// # Errors
    /// Returns [`ScielabError::InvalidViewingDistance`] for a non-positive or
    /// non-finite distance.
    pub fn pixels_per_degree(&self) -> Result<f64, ScielabError> {
        self.display.pixels_per_degree_at(self.viewing_distance_inches)
    }

    /// Checks the parameters without running a comparison.
    ///
    /// # Errors
    /// Same as [`ScielabParams::pixels_per_degree`].
    pub fn validate(&self) -> Result<(), ScielabError> {
        self.pixels_per_degree().map(|_| ())
    }
}

/// Computes the S-CIELAB difference between two images.
///
/// Both images are converted to opponent space, filtered for the display in
/// `params`, converted to CIELAB and compared pixel by pixel.
///
/// # Errors
/// Returns an error if:
/// - Image dimensions don't match
/// - An image has no pixels
/// - A float image holds NaN or infinity
/// - The viewing distance is invalid
///
/// # Example
/// ```rust
/// use scielab::{scielab, Img, ScielabParams, RGB8};
///
/// let a = Img::new(vec![RGB8::new(128, 128, 128); 64], 8, 8);
/// let mut pixels = vec![RGB8::new(128, 128, 128); 64];
/// pixels[27] = RGB8::new(255, 0, 0);
/// let b = Img::new(pixels, 8, 8);
///
/// let result = scielab(a.as_ref(), b.as_ref(), &ScielabParams::default())?;
/// assert_eq!(result.max_pos, (3, 3));
/// # Ok::<(), scielab::ScielabError>(())
/// ```
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip_all, fields(w = img1.width(), h = img1.height()))
)]
pub fn scielab<P: DeviceRgb>(
    img1: ImgRef<'_, P>,
    img2: ImgRef<'_, P>,
    params: &ScielabParams,
) -> Result<ColorDifference, ScielabError> {
    let (w1, h1) = (img1.width(), img1.height());
    let (w2, h2) = (img2.width(), img2.height());
    if w1 != w2 || h1 != h2 {
        return Err(ScielabError::ShapeMismatch { w1, h1, w2, h2 });
    }

    let bank = FilterBank::new(params.pixels_per_degree()?)?;
    let lab1 = opponent_to_lab(&bank.apply(&to_opponent(img1)?));
    let lab2 = opponent_to_lab(&bank.apply(&to_opponent(img2)?));
    compute_color_difference_with(&lab1, &lab2, params.delta_e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: usize, height: usize, v: u8) -> ImgVec<RGB8> {
        Img::new(vec![RGB8::new(v, v, v); width * height], width, height)
    }

    #[test]
    fn test_identical_gray_images() {
        let params =
            ScielabParams::new().with_display(DisplayGeometry::new(3000, 2000, 14.0).unwrap());
        let img = gray(4, 4, 128);
        let result = scielab(img.as_ref(), img.as_ref(), &params).unwrap();
        assert_eq!(result.avg_diff, 0.0);
        assert_eq!(result.max_diff, 0.0);
        assert_eq!(result.max_pos, (0, 0));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = gray(4, 4, 10);
        let b = gray(5, 4, 10);
        let err = scielab(a.as_ref(), b.as_ref(), &ScielabParams::default()).unwrap_err();
        assert_eq!(
            err,
            ScielabError::ShapeMismatch {
                w1: 4,
                h1: 4,
                w2: 5,
                h2: 4
            }
        );
    }

    #[test]
    fn test_empty_image() {
        let a = gray(5, 0, 10);
        let err = scielab(a.as_ref(), a.as_ref(), &ScielabParams::default()).unwrap_err();
        assert_eq!(err, ScielabError::ImageTooSmall { width: 5, height: 0 });
    }

    #[test]
    fn test_extreme_display_density_is_rejected() {
        let a = gray(4, 4, 10);
        // Sub-atomic and planet-sized panels fall outside the density range
        let tiny =
            ScielabParams::new().with_display(DisplayGeometry::new(1920, 1080, 1e-300).unwrap());
        assert!(matches!(
            scielab(a.as_ref(), a.as_ref(), &tiny),
            Err(ScielabError::InvalidSamplingDensity { .. })
        ));
        let huge = ScielabParams::new().with_display(DisplayGeometry::new(1, 1, 1e9).unwrap());
        assert!(matches!(
            scielab(a.as_ref(), a.as_ref(), &huge),
            Err(ScielabError::InvalidSamplingDensity { .. })
        ));
    }

    #[test]
    fn test_bad_viewing_distance() {
        let params = ScielabParams::new().with_viewing_distance(-1.0);
        assert!(params.validate().is_err());
        let a = gray(4, 4, 10);
        assert_eq!(
            scielab(a.as_ref(), a.as_ref(), &params).unwrap_err(),
            ScielabError::InvalidViewingDistance { inches: -1.0 }
        );
    }

    #[test]
    fn test_params_builder() {
        let display = DisplayGeometry::new(1280, 800, 13.3).unwrap();
        let params = ScielabParams::new()
            .with_display(display)
            .with_viewing_distance(20.0)
            .with_delta_e(DeltaE::Ciede2000);
        assert_eq!(params.display(), &display);
        assert_eq!(params.viewing_distance_inches(), 20.0);
        assert_eq!(params.delta_e(), DeltaE::Ciede2000);
        assert!(params.validate().is_ok());

        let defaults = ScielabParams::default();
        assert_eq!(defaults.viewing_distance_inches(), DEFAULT_VIEWING_DISTANCE_INCHES);
        assert_eq!(defaults.delta_e(), DeltaE::Cie76);
    }

    #[test]
    fn test_float_and_u8_agree() {
        let a8 = gray(6, 6, 100);
        let b8 = Img::new(
            (0..36u8).map(|i| RGB8::new(i * 7, 100, 255 - i)).collect::<Vec<RGB8>>(),
            6,
            6,
        );
        let to_f = |img: &ImgVec<RGB8>| {
            Img::new(
                img.buf()
                    .iter()
                    .map(|p| RGB::new(p.r as f32 / 255.0, p.g as f32 / 255.0, p.b as f32 / 255.0))
                    .collect::<Vec<RGB<f32>>>(),
                img.width(),
                img.height(),
            )
        };
        let params = ScielabParams::default();
        let r8 = scielab(a8.as_ref(), b8.as_ref(), &params).unwrap();
        let (af, bf) = (to_f(&a8), to_f(&b8));
        let rf = scielab(af.as_ref(), bf.as_ref(), &params).unwrap();
        assert!((r8.avg_diff - rf.avg_diff).abs() < 1e-3);
        assert_eq!(r8.max_pos, rf.max_pos);
    }

    #[test]
    fn test_error_display() {
        let err = ScielabError::ShapeMismatch {
            w1: 1,
            h1: 2,
            w2: 3,
            h2: 4,
        };
        assert_eq!(err.to_string(), "image dimensions don't match: 1x2 vs 3x4");
        let err = ScielabError::UnsupportedChannelRange { x: 5, y: 6 };
        assert!(err.to_string().contains("(5, 6)"));
    }
}
