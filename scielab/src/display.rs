//! Display model: physical screen description to angular sampling density.
//!
//! The spatial filters are specified in degrees of visual angle, so they have
//! to be rescaled for every screen. A pixel of pitch `p` inches seen from `d`
//! inches subtends `2 * atan(p / 2d)`; its reciprocal is the number of pixels
//! per degree.

use crate::ScielabError;
use crate::consts::DEFAULT_VIEWING_DISTANCE_INCHES;

/// Physical description of the screen the images are viewed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    width_px: usize,
    height_px: usize,
    diagonal_inches: f64,
}

impl DisplayGeometry {
    /// Creates a validated display geometry.
    ///
    /// # Errors
    /// Returns [`ScielabError::InvalidGeometry`] if either resolution is zero
    /// or the diagonal is not a positive finite number.
    pub fn new(
        width_px: usize,
        height_px: usize,
        diagonal_inches: f64,
    ) -> Result<Self, ScielabError> {
        if width_px == 0 || height_px == 0 || !(diagonal_inches > 0.0 && diagonal_inches.is_finite())
        {
            return Err(ScielabError::InvalidGeometry {
                width_px,
                height_px,
                diagonal_inches,
            });
        }
        Ok(Self {
            width_px,
            height_px,
            diagonal_inches,
        })
    }

    /// Horizontal resolution.
    #[must_use]
    pub fn width_px(&self) -> usize {
        self.width_px
    }

    /// Vertical resolution.
    #[must_use]
    pub fn height_px(&self) -> usize {
        self.height_px
    }

    /// Screen diagonal in inches.
    #[must_use]
    pub fn diagonal_inches(&self) -> f64 {
        self.diagonal_inches
    }

    /// Physical size of one pixel, in inches.
    #[must_use]
    pub fn pixel_pitch_inches(&self) -> f64 {
        let diagonal_px = (self.width_px as f64).hypot(self.height_px as f64);
        self.diagonal_inches / diagonal_px
    }

    /// Pixels per degree of visual angle at the nominal 18 inch distance.
    #[must_use]
    pub fn pixels_per_degree(&self) -> f64 {
        pixels_per_degree_for_pitch(self.pixel_pitch_inches(), DEFAULT_VIEWING_DISTANCE_INCHES)
    }

    /// Pixels per degree of visual angle at the given viewing distance.
    ///
    /// # Errors
    /// Returns [`ScielabError::InvalidViewingDistance`] unless the distance is
    /// positive and finite.
    pub fn pixels_per_degree_at(&self, viewing_distance_inches: f64) -> Result<f64, ScielabError> {
        if !(viewing_distance_inches > 0.0 && viewing_distance_inches.is_finite()) {
            return Err(ScielabError::InvalidViewingDistance {
                inches: viewing_distance_inches,
            });
        }
        Ok(pixels_per_degree_for_pitch(
            self.pixel_pitch_inches(),
            viewing_distance_inches,
        ))
    }
}

impl Default for DisplayGeometry {
    /// A 15.6 inch 1920x1080 laptop panel.
    fn default() -> Self {
        Self {
            width_px: 1920,
            height_px: 1080,
            diagonal_inches: 15.6,
        }
    }
}

fn pixels_per_degree_for_pitch(pitch_inches: f64, viewing_distance_inches: f64) -> f64 {
    let angle_rad = 2.0 * (pitch_inches / (2.0 * viewing_distance_inches)).atan();
    1.0 / angle_rad.to_degrees()
}

/// Computes the angular sampling density of a screen.
///
/// Uses the S-CIELAB convention of an 18 inch viewing distance.
///
/// # Errors
/// Returns [`ScielabError::InvalidGeometry`] for a zero resolution or a
/// non-positive (or non-finite) diagonal.
///
/// # Example
/// ```rust
/// let ppd = scielab::compute_sampling_density(3000, 2000, 14.0)?;
/// assert!(ppd > 80.0 && ppd < 82.0);
/// # Ok::<(), scielab::ScielabError>(())
/// ```
pub fn compute_sampling_density(
    width_px: usize,
    height_px: usize,
    diagonal_inches: f64,
) -> Result<f64, ScielabError> {
    Ok(DisplayGeometry::new(width_px, height_px, diagonal_inches)?.pixels_per_degree())
}
