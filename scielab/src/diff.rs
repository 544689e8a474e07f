//! Per-pixel color difference between two Lab images and its summary.

use crate::ScielabError;
use crate::image::ImageF;
use crate::opponent::LabImage;
use imgref::ImgVec;

/// Color difference formula applied per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DeltaE {
    /// CIE 1976: Euclidean distance in Lab. The classic S-CIELAB metric.
    #[default]
    Cie76,
    /// CIEDE2000 with kL = kC = kH = 1.
    Ciede2000,
}

impl DeltaE {
    /// Distance between two `[L, a, b]` triples.
    #[inline]
    #[must_use]
    pub fn distance(self, lab1: [f32; 3], lab2: [f32; 3]) -> f32 {
        match self {
            DeltaE::Cie76 => delta_e_76(lab1, lab2),
            DeltaE::Ciede2000 => delta_e_2000(lab1, lab2) as f32,
        }
    }
}

#[inline]
fn delta_e_76(lab1: [f32; 3], lab2: [f32; 3]) -> f32 {
    let dl = lab1[0] - lab2[0];
    let da = lab1[1] - lab2[1];
    let db = lab1[2] - lab2[2];
    (dl * dl + da * da + db * db).sqrt()
}

/// Hue angle in degrees, `[0, 360)`.
#[inline]
fn hue_degrees(b: f64, a: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    b.atan2(a).to_degrees().rem_euclid(360.0)
}

/// CIEDE2000 (Sharma, Wu, Dalal 2005). Symmetric in its arguments.
fn delta_e_2000(lab1: [f32; 3], lab2: [f32; 3]) -> f64 {
    let [l1, a1, b1] = lab1.map(f64::from);
    let [l2, a2, b2] = lab2.map(f64::from);

    let c1 = a1.hypot(b1);
    let c2 = a2.hypot(b2);
    let c_bar = (c1 + c2) / 2.0;
    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + 25.0f64.powi(7))).sqrt());

    let a1p = (1.0 + g) * a1;
    let a2p = (1.0 + g) * a2;
    let c1p = a1p.hypot(b1);
    let c2p = a2p.hypot(b2);
    let h1p = hue_degrees(b1, a1p);
    let h2p = hue_degrees(b2, a2p);

    let dl = l2 - l1;
    let dc = c2p - c1p;
    let dhp = if c1p * c2p == 0.0 {
        0.0
    } else if (h2p - h1p).abs() <= 180.0 {
        h2p - h1p
    } else if h2p - h1p > 180.0 {
        h2p - h1p - 360.0
    } else {
        h2p - h1p + 360.0
    };
    let dh = 2.0 * (c1p * c2p).sqrt() * (dhp / 2.0).to_radians().sin();

    let l_bar = (l1 + l2) / 2.0;
    let cp_bar = (c1p + c2p) / 2.0;
    let hp_bar = if c1p * c2p == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (hp_bar - 30.0).to_radians().cos()
        + 0.24 * (2.0 * hp_bar).to_radians().cos()
        + 0.32 * (3.0 * hp_bar + 6.0).to_radians().cos()
        - 0.20 * (4.0 * hp_bar - 63.0).to_radians().cos();
    let d_theta = 30.0 * (-((hp_bar - 275.0) / 25.0).powi(2)).exp();
    let cp_bar7 = cp_bar.powi(7);
    let r_c = 2.0 * (cp_bar7 / (cp_bar7 + 25.0f64.powi(7))).sqrt();
    let l50 = (l_bar - 50.0) * (l_bar - 50.0);
    let s_l = 1.0 + 0.015 * l50 / (20.0 + l50).sqrt();
    let s_c = 1.0 + 0.045 * cp_bar;
    let s_h = 1.0 + 0.015 * cp_bar * t;
    let r_t = -(2.0 * d_theta).to_radians().sin() * r_c;

    let tl = dl / s_l;
    let tc = dc / s_c;
    let th = dh / s_h;
    (tl * tl + tc * tc + th * th + r_t * tc * th).max(0.0).sqrt()
}

/// Difference map and its summary statistics.
#[derive(Debug, Clone)]
pub struct ColorDifference {
    /// Mean of the difference map.
    pub avg_diff: f64,
    /// Largest value in the difference map.
    pub max_diff: f64,
    /// `(row, column)` of the first pixel, in row-major order, holding `max_diff`.
    pub max_pos: (usize, usize),
    /// Per-pixel difference, same dimensions as the inputs.
    pub diffmap: ImgVec<f32>,
}

/// CIE76 difference between two Lab images.
///
/// # Errors
/// Returns [`ScielabError::ShapeMismatch`] if the images differ in size.
pub fn compute_color_difference(
    lab1: &LabImage,
    lab2: &LabImage,
) -> Result<ColorDifference, ScielabError> {
    compute_color_difference_with(lab1, lab2, DeltaE::Cie76)
}

/// Difference between two Lab images with a chosen formula.
///
/// # Errors
/// Returns [`ScielabError::ShapeMismatch`] if the images differ in size.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(level = "debug", skip(lab1, lab2), fields(w = lab1.width(), h = lab1.height()))
)]
pub fn compute_color_difference_with(
    lab1: &LabImage,
    lab2: &LabImage,
    formula: DeltaE,
) -> Result<ColorDifference, ScielabError> {
    let (w1, h1) = (lab1.width(), lab1.height());
    let (w2, h2) = (lab2.width(), lab2.height());
    if w1 != w2 || h1 != h2 {
        return Err(ScielabError::ShapeMismatch { w1, h1, w2, h2 });
    }

    let mut diffmap = ImageF::new(w1, h1);
    let mut sum = 0.0f64;
    let mut max_diff = 0.0f32;
    let mut max_pos = (0, 0);

    for y in 0..h1 {
        let rows1 = [lab1.plane(0).row(y), lab1.plane(1).row(y), lab1.plane(2).row(y)];
        let rows2 = [lab2.plane(0).row(y), lab2.plane(1).row(y), lab2.plane(2).row(y)];
        let out = diffmap.row_mut(y);
        for x in 0..w1 {
            let d = formula.distance(
                [rows1[0][x], rows1[1][x], rows1[2][x]],
                [rows2[0][x], rows2[1][x], rows2[2][x]],
            );
            out[x] = d;
            sum += f64::from(d);
            // Strict comparison keeps the first maximum
            if d > max_diff {
                max_diff = d;
                max_pos = (y, x);
            }
        }
    }

    let num_pixels = w1 * h1;
    let avg_diff = if num_pixels == 0 {
        0.0
    } else {
        sum / num_pixels as f64
    };

    Ok(ColorDifference {
        avg_diff,
        max_diff: f64::from(max_diff),
        max_pos,
        diffmap: diffmap.into_imgvec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_image(width: usize, height: usize, f: impl Fn(usize, usize) -> [f32; 3]) -> LabImage {
        let mut planes = [
            ImageF::new(width, height),
            ImageF::new(width, height),
            ImageF::new(width, height),
        ];
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                for c in 0..3 {
                    planes[c].set(x, y, px[c]);
                }
            }
        }
        LabImage::from_planes(planes)
    }

    #[test]
    fn test_delta_e_76() {
        assert_eq!(delta_e_76([50.0, 0.0, 0.0], [50.0, 3.0, 4.0]), 5.0);
        assert_eq!(delta_e_76([10.0, 1.0, 1.0], [10.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_delta_e_2000_reference_pairs() {
        // Sharma et al. test data, pairs 1, 7, 17 and 25
        let cases = [
            ([50.0, 2.6772, -79.7751], [50.0, 0.0, -82.7485], 2.0425),
            ([50.0, 0.0, 0.0], [50.0, -1.0, 2.0], 2.3669),
            ([50.0, 2.5, 0.0], [73.0, 25.0, -18.0], 27.1492),
            ([60.2574, -34.0099, 36.2677], [60.4626, -34.1751, 39.4387], 1.2644),
        ];
        for (lab1, lab2, expected) in cases {
            let got = delta_e_2000(lab1, lab2);
            assert!(
                (got - expected).abs() < 1e-3,
                "{lab1:?} vs {lab2:?}: {got} expected {expected}"
            );
        }
    }

    #[test]
    fn test_self_difference_is_zero() {
        let img = lab_image(7, 5, |x, y| [x as f32 * 10.0, y as f32 - 2.0, 3.0]);
        for formula in [DeltaE::Cie76, DeltaE::Ciede2000] {
            let diff = compute_color_difference_with(&img, &img, formula).unwrap();
            assert_eq!(diff.avg_diff, 0.0);
            assert_eq!(diff.max_diff, 0.0);
            assert_eq!(diff.max_pos, (0, 0));
            assert!(diff.diffmap.buf().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_symmetry() {
        let a = lab_image(6, 4, |x, y| [40.0 + x as f32, (y * 3) as f32, -(x as f32)]);
        let b = lab_image(6, 4, |x, y| [45.0, x as f32 * 2.0 - 5.0, y as f32]);
        for formula in [DeltaE::Cie76, DeltaE::Ciede2000] {
            let ab = compute_color_difference_with(&a, &b, formula).unwrap();
            let ba = compute_color_difference_with(&b, &a, formula).unwrap();
            for (p, q) in ab.diffmap.buf().iter().zip(ba.diffmap.buf()) {
                assert!((p - q).abs() < 1e-4, "{p} vs {q}");
            }
        }
    }

    #[test]
    fn test_max_position_and_average() {
        let a = lab_image(4, 3, |_, _| [50.0, 0.0, 0.0]);
        let b = lab_image(4, 3, |x, y| match (x, y) {
            (2, 1) => [50.0, 6.0, 8.0],
            (3, 2) => [50.0, 0.0, 10.0],
            _ => [50.0, 0.0, 0.0],
        });
        let diff = compute_color_difference(&a, &b).unwrap();
        assert_eq!(diff.max_diff, 10.0);
        // Ties resolve to the first maximum in row-major order
        assert_eq!(diff.max_pos, (1, 2));
        assert!((diff.avg_diff - 20.0 / 12.0).abs() < 1e-9);
        assert_eq!(diff.diffmap[(2usize, 1usize)], 10.0);
        assert_eq!(diff.diffmap.width(), 4);
        assert_eq!(diff.diffmap.height(), 3);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = lab_image(4, 4, |_, _| [0.0; 3]);
        let b = lab_image(4, 5, |_, _| [0.0; 3]);
        assert_eq!(
            compute_color_difference(&a, &b).unwrap_err(),
            ScielabError::ShapeMismatch {
                w1: 4,
                h1: 4,
                w2: 4,
                h2: 5
            }
        );
    }
}
