//! Precomputed reference data for repeated S-CIELAB comparisons.
//!
//! When several candidates are compared against one reference, the
//! reference's transform and filtering only need to happen once.
//!
//! # Example
//!
//! ```
//! use scielab::{Img, RGB8, ScielabParams, ScielabReference};
//!
//! let reference = Img::new(vec![RGB8::new(128, 128, 128); 32 * 32], 32, 32);
//! let precomputed = ScielabReference::new(reference.as_ref(), &ScielabParams::default())?;
//!
//! for shade in [120u8, 124, 128] {
//!     let candidate = Img::new(vec![RGB8::new(shade, shade, shade); 32 * 32], 32, 32);
//!     let result = precomputed.compare(candidate.as_ref())?;
//!     println!("{shade}: avg {:.3}", result.avg_diff);
//! }
//! # Ok::<(), scielab::ScielabError>(())
//! ```

use crate::diff::{ColorDifference, DeltaE, compute_color_difference_with};
use crate::filter::FilterBank;
use crate::opponent::{DeviceRgb, LabImage, opponent_to_lab, to_opponent};
use crate::{ScielabError, ScielabParams};
use imgref::ImgRef;

/// Filtered CIELAB image of a reference plus the kernels that produced it.
#[derive(Debug, Clone)]
pub struct ScielabReference {
    lab: LabImage,
    bank: FilterBank,
    delta_e: DeltaE,
}

impl ScielabReference {
    /// Transforms and filters `reference` for the display in `params`.
    ///
    /// # Errors
    /// Same conditions as [`crate::scielab`] apart from the shape check.
    pub fn new<P: DeviceRgb>(
        reference: ImgRef<'_, P>,
        params: &ScielabParams,
    ) -> Result<Self, ScielabError> {
        let bank = FilterBank::new(params.pixels_per_degree()?)?;
        let lab = opponent_to_lab(&bank.apply(&to_opponent(reference)?));
        Ok(Self {
            lab,
            bank,
            delta_e: params.delta_e(),
        })
    }

    /// Reference width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.lab.width()
    }

    /// Reference height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.lab.height()
    }

    /// Filtered CIELAB image of the reference.
    #[must_use]
    pub fn lab(&self) -> &LabImage {
        &self.lab
    }

    /// Compares a candidate against the precomputed reference.
    ///
    /// The reference is the first image, so `max_pos` and the map are the
    /// same as `scielab(reference, candidate, params)`.
    ///
    /// # Errors
    /// Returns [`ScielabError::ShapeMismatch`] for a candidate of a different
    /// size, and the input errors of [`crate::to_opponent`].
    pub fn compare<P: DeviceRgb>(
        &self,
        candidate: ImgRef<'_, P>,
    ) -> Result<ColorDifference, ScielabError> {
        let (w1, h1) = (self.width(), self.height());
        let (w2, h2) = (candidate.width(), candidate.height());
        if w1 != w2 || h1 != h2 {
            return Err(ScielabError::ShapeMismatch { w1, h1, w2, h2 });
        }

        let lab = opponent_to_lab(&self.bank.apply(&to_opponent(candidate)?));
        compute_color_difference_with(&self.lab, &lab, self.delta_e)
    }
}
