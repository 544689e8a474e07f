//! Device RGB to opponent color space, and opponent back to CIELAB.
//!
//! Forward chain, per pixel:
//! 1. device RGB -> linear RGB (sRGB transfer function)
//! 2. linear RGB -> CIE XYZ (sRGB primaries, D65, white Y = 100)
//! 3. XYZ -> opponent (luminance, red-green, blue-yellow)
//!
//! The way back does not return to device RGB. Filtered opponent values go
//! through the inverse opponent matrix to XYZ and are then expressed as CIELAB
//! relative to D65, which is where S-CIELAB measures color differences.

use crate::ScielabError;
use crate::consts::{
    LAB_EPSILON, LAB_LINEAR_OFFSET, LAB_LINEAR_SLOPE, OPPONENT_TO_XYZ, RGB_TO_XYZ, WHITE_D65,
    XYZ_TO_OPPONENT,
};
use crate::image::{Image3F, ImageF};
use imgref::ImgRef;
use rgb::{RGB, RGB8};

/// One of the three opponent channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Achromatic channel.
    Luminance,
    /// Red-green chromatic channel.
    RedGreen,
    /// Blue-yellow chromatic channel.
    BlueYellow,
}

impl Channel {
    /// All channels in plane order.
    pub const ALL: [Channel; 3] = [Channel::Luminance, Channel::RedGreen, Channel::BlueYellow];

    /// Plane index of this channel inside an [`OpponentImage`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Channel::Luminance => 0,
            Channel::RedGreen => 1,
            Channel::BlueYellow => 2,
        }
    }
}

/// A pixel type that can be decoded from display-encoded RGB.
pub trait DeviceRgb: Copy {
    /// Linear-light RGB in `0.0..=1.0`, or `None` if a component is NaN or
    /// infinite. Finite out-of-range values are clamped.
    fn to_linear(self) -> Option<[f32; 3]>;
}

impl DeviceRgb for RGB8 {
    #[inline]
    fn to_linear(self) -> Option<[f32; 3]> {
        let lut = &*SRGB_TO_LINEAR_LUT;
        Some([
            lut[self.r as usize],
            lut[self.g as usize],
            lut[self.b as usize],
        ])
    }
}

impl DeviceRgb for RGB<f32> {
    #[inline]
    fn to_linear(self) -> Option<[f32; 3]> {
        if !(self.r.is_finite() && self.g.is_finite() && self.b.is_finite()) {
            return None;
        }
        Some([
            srgb_eotf(self.r.clamp(0.0, 1.0)),
            srgb_eotf(self.g.clamp(0.0, 1.0)),
            srgb_eotf(self.b.clamp(0.0, 1.0)),
        ])
    }
}

/// sRGB transfer function (gamma decoding) on a `0..=1` value.
#[inline]
fn srgb_eotf(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Pre-computed sRGB to linear lookup table (256 entries)
static SRGB_TO_LINEAR_LUT: std::sync::LazyLock<[f32; 256]> = std::sync::LazyLock::new(|| {
    let mut lut = [0.0f32; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = srgb_eotf(i as f32 / 255.0);
    }
    lut
});

/// Converts an 8-bit sRGB component to linear light.
#[inline]
#[must_use]
pub fn srgb_to_linear(v: u8) -> f32 {
    SRGB_TO_LINEAR_LUT[v as usize]
}

#[inline]
fn mat3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Image in the opponent color space, one plane per [`Channel`].
#[derive(Debug, Clone)]
pub struct OpponentImage(Image3F);

impl OpponentImage {
    /// Wraps three planes (luminance, red-green, blue-yellow).
    ///
    /// # Panics
    /// Panics if the planes differ in size.
    #[must_use]
    pub fn from_planes(planes: [ImageF; 3]) -> Self {
        Self(Image3F::from_planes(planes))
    }

    /// Image width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.width()
    }

    /// Image height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.0.height()
    }

    /// One channel's plane.
    #[must_use]
    pub fn channel(&self, channel: Channel) -> &ImageF {
        self.0.plane(channel.index())
    }

    /// Opponent values at one pixel.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        self.0.pixel(x, y)
    }

    pub(crate) fn planes(&self) -> &[ImageF; 3] {
        self.0.planes()
    }
}

/// Image in CIELAB (L, a, b planes), D65 reference white.
#[derive(Debug, Clone)]
pub struct LabImage(Image3F);

impl LabImage {
    /// Wraps three planes (L, a, b).
    ///
    /// # Panics
    /// Panics if the planes differ in size.
    #[must_use]
    pub fn from_planes(planes: [ImageF; 3]) -> Self {
        Self(Image3F::from_planes(planes))
    }

    /// Image width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.0.width()
    }

    /// Image height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.0.height()
    }

    /// Plane 0 = L, 1 = a, 2 = b.
    #[must_use]
    pub fn plane(&self, index: usize) -> &ImageF {
        self.0.plane(index)
    }

    /// `[L, a, b]` at one pixel.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        self.0.pixel(x, y)
    }
}

/// Converts a device RGB image to the opponent color space.
///
/// Accepts `RGB8` (0-255) or `RGB<f32>` (0.0-1.0, display encoded) pixels.
/// Float components outside the range are clamped.
///
/// # Errors
/// - [`ScielabError::ImageTooSmall`] for an image with no pixels
/// - [`ScielabError::UnsupportedChannelRange`] for a NaN or infinite component
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(image), fields(w = image.width(), h = image.height()))
)]
pub fn to_opponent<P: DeviceRgb>(image: ImgRef<'_, P>) -> Result<OpponentImage, ScielabError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(ScielabError::ImageTooSmall { width, height });
    }

    let mut out = Image3F::new(width, height);
    for (y, row) in image.rows().enumerate() {
        let [lum, rg, by] = out.planes_mut();
        let (lum, rg, by) = (lum.row_mut(y), rg.row_mut(y), by.row_mut(y));
        for (x, &px) in row.iter().enumerate() {
            let linear = px
                .to_linear()
                .ok_or(ScielabError::UnsupportedChannelRange { x, y })?;
            let opp = mat3(&XYZ_TO_OPPONENT, mat3(&RGB_TO_XYZ, linear));
            lum[x] = opp[0];
            rg[x] = opp[1];
            by[x] = opp[2];
        }
    }
    Ok(OpponentImage(out))
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_LINEAR_SLOPE * t + LAB_LINEAR_OFFSET
    }
}

/// Converts one XYZ triple (white Y = 100) to CIELAB.
#[inline]
#[must_use]
pub fn xyz_to_lab(xyz: [f32; 3]) -> [f32; 3] {
    let fx = lab_f(xyz[0] / WHITE_D65[0]);
    let fy = lab_f(xyz[1] / WHITE_D65[1]);
    let fz = lab_f(xyz[2] / WHITE_D65[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// Maps an (optionally filtered) opponent image into CIELAB.
///
/// This is a perceptual remapping, not an inverse of [`to_opponent`]: the
/// opponent values are taken back to XYZ and expressed as Lab, never as
/// device RGB.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(opponent), fields(w = opponent.width(), h = opponent.height()))
)]
#[must_use]
pub fn opponent_to_lab(opponent: &OpponentImage) -> LabImage {
    let (width, height) = (opponent.width(), opponent.height());
    let [lum, rg, by] = opponent.planes();
    let mut out = Image3F::new(width, height);

    for y in 0..height {
        let (row_lum, row_rg, row_by) = (lum.row(y), rg.row(y), by.row(y));
        let [l_plane, a_plane, b_plane] = out.planes_mut();
        let (row_l, row_a, row_b) = (l_plane.row_mut(y), a_plane.row_mut(y), b_plane.row_mut(y));
        for x in 0..width {
            let xyz = mat3(&OPPONENT_TO_XYZ, [row_lum[x], row_rg[x], row_by[x]]);
            let [l, a, b] = xyz_to_lab(xyz);
            row_l[x] = l;
            row_a[x] = a;
            row_b[x] = b;
        }
    }
    LabImage(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    fn solid<P: Copy>(px: P, w: usize, h: usize) -> imgref::ImgVec<P> {
        Img::new(vec![px; w * h], w, h)
    }

    #[test]
    fn test_srgb_lut_endpoints() {
        assert_eq!(srgb_to_linear(0), 0.0);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-6);
        assert!((srgb_to_linear(128) - 0.2158605).abs() < 1e-5);
    }

    #[test]
    fn test_white_maps_to_lab_white() {
        let img = solid(RGB8::new(255, 255, 255), 2, 2);
        let lab = opponent_to_lab(&to_opponent(img.as_ref()).unwrap());
        let [l, a, b] = lab.pixel(1, 1);
        assert!((l - 100.0).abs() < 0.05, "L = {l}");
        assert!(a.abs() < 0.05, "a = {a}");
        assert!(b.abs() < 0.05, "b = {b}");
    }

    #[test]
    fn test_black_maps_to_zero_lightness() {
        let img = solid(RGB8::new(0, 0, 0), 1, 1);
        let lab = opponent_to_lab(&to_opponent(img.as_ref()).unwrap());
        let [l, a, b] = lab.pixel(0, 0);
        assert!(l.abs() < 1e-3 && a.abs() < 1e-3 && b.abs() < 1e-3);
    }

    #[test]
    fn test_pure_red_lab() {
        // sRGB red is roughly L=53.2, a=80.1, b=67.2
        let img = solid(RGB8::new(255, 0, 0), 1, 1);
        let lab = opponent_to_lab(&to_opponent(img.as_ref()).unwrap());
        let [l, a, b] = lab.pixel(0, 0);
        assert!((l - 53.24).abs() < 0.2, "L = {l}");
        assert!((a - 80.09).abs() < 0.3, "a = {a}");
        assert!((b - 67.20).abs() < 0.3, "b = {b}");
    }

    #[test]
    fn test_u8_and_float_inputs_agree() {
        let bytes = solid(RGB8::new(30, 140, 220), 3, 2);
        let floats = solid(RGB::new(30.0 / 255.0, 140.0 / 255.0, 220.0 / 255.0), 3, 2);
        let a = to_opponent(bytes.as_ref()).unwrap();
        let b = to_opponent(floats.as_ref()).unwrap();
        for (pa, pb) in a.pixel(2, 1).iter().zip(b.pixel(2, 1)) {
            assert!((pa - pb).abs() < 1e-3, "{pa} vs {pb}");
        }
    }

    #[test]
    fn test_float_input_is_clamped() {
        let over = solid(RGB::new(1.7f32, -0.3, 1.0), 1, 1);
        let clamped = solid(RGB::new(1.0f32, 0.0, 1.0), 1, 1);
        let a = to_opponent(over.as_ref()).unwrap().pixel(0, 0);
        let b = to_opponent(clamped.as_ref()).unwrap().pixel(0, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut img = solid(RGB::new(0.5f32, 0.5, 0.5), 4, 3);
        img[(2usize, 1usize)] = RGB::new(0.5, f32::NAN, 0.5);
        assert_eq!(
            to_opponent(img.as_ref()).unwrap_err(),
            ScielabError::UnsupportedChannelRange { x: 2, y: 1 }
        );

        img[(2usize, 1usize)] = RGB::new(f32::INFINITY, 0.5, 0.5);
        assert!(to_opponent(img.as_ref()).is_err());
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img: imgref::ImgVec<RGB8> = Img::new(Vec::new(), 5, 0);
        assert!(matches!(
            to_opponent(img.as_ref()),
            Err(ScielabError::ImageTooSmall { width: 5, height: 0 })
        ));
    }

    #[test]
    fn test_gray_has_no_chroma() {
        let img = solid(RGB8::new(128, 128, 128), 1, 1);
        let lab = opponent_to_lab(&to_opponent(img.as_ref()).unwrap());
        let [_, a, b] = lab.pixel(0, 0);
        assert!(a.abs() < 0.05 && b.abs() < 0.05);
    }
}
