//! Planar floating point image buffers.
//!
//! Every stage after the device RGB input works on planes of `f32` with a
//! row stride rounded up to 16 floats, so rows start on 64-byte boundaries
//! for the SIMD convolution.

use imgref::ImgVec;
use std::ops::{Index, IndexMut};

/// Single-channel floating point image.
#[derive(Debug, Clone)]
pub struct ImageF {
    data: Vec<f32>,
    width: usize,
    height: usize,
    stride: usize, // pixels per row (may be > width for alignment)
}

impl ImageF {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0.0)
    }

    /// Creates an image filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        let stride = (width + 15) & !15;
        Self {
            data: vec![value; stride * height],
            width,
            height,
            stride,
        }
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns a reference to a row.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Returns a mutable reference to a row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Gets a pixel value.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.stride + x]
    }

    /// Sets a pixel value.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.stride + x] = value;
    }

    /// Checks if two images have the same dimensions.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Drops the row padding and hands the pixels over as an `ImgVec`.
    #[must_use]
    pub fn into_imgvec(self) -> ImgVec<f32> {
        if self.stride == self.width {
            return ImgVec::new(self.data, self.width, self.height);
        }
        let mut packed = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }
        ImgVec::new(packed, self.width, self.height)
    }
}

impl Index<(usize, usize)> for ImageF {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.data[y * self.stride + x]
    }
}

impl IndexMut<(usize, usize)> for ImageF {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.data[y * self.stride + x]
    }
}

/// Three-channel floating point image.
///
/// Backs both [`OpponentImage`](crate::OpponentImage) and
/// [`LabImage`](crate::LabImage); the newtypes decide what the planes mean.
#[derive(Debug, Clone)]
pub struct Image3F {
    planes: [ImageF; 3],
}

impl Image3F {
    /// Creates a new zeroed 3-channel image.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            planes: [
                ImageF::new(width, height),
                ImageF::new(width, height),
                ImageF::new(width, height),
            ],
        }
    }

    /// Creates from three separate planes.
    ///
    /// # Panics
    /// Panics if the planes differ in size.
    #[must_use]
    pub fn from_planes(planes: [ImageF; 3]) -> Self {
        assert!(planes[0].same_size(&planes[1]));
        assert!(planes[0].same_size(&planes[2]));
        Self { planes }
    }

    /// Image width.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.planes[0].width()
    }

    /// Image height.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.planes[0].height()
    }

    /// Returns a reference to a specific plane.
    #[inline]
    #[must_use]
    pub fn plane(&self, index: usize) -> &ImageF {
        &self.planes[index]
    }

    /// Returns all three planes.
    #[inline]
    #[must_use]
    pub fn planes(&self) -> &[ImageF; 3] {
        &self.planes
    }

    /// Returns all three planes mutably.
    #[inline]
    pub fn planes_mut(&mut self) -> &mut [ImageF; 3] {
        &mut self.planes
    }

    /// Returns the three channel values at one pixel.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        [
            self.planes[0].get(x, y),
            self.planes[1].get(x, y),
            self.planes[2].get(x, y),
        ]
    }
}

impl Index<usize> for Image3F {
    type Output = ImageF;

    fn index(&self, index: usize) -> &Self::Output {
        &self.planes[index]
    }
}

impl IndexMut<usize> for Image3F {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.planes[index]
    }
}
