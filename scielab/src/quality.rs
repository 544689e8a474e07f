//! No-reference quality scores that accompany a color difference report.
//!
//! Learned estimators (NIQE, BRISQUE and friends) are not part of this crate.
//! They plug in through [`QualityMetrics`], so callers never depend on which
//! estimators happen to be installed.

use imgref::ImgRef;
use rgb::RGB8;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Names of the supported no-reference metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricName {
    /// Natural Image Quality Evaluator.
    Niqe,
    /// Perception-based Image Quality Evaluator.
    Piqe,
    /// Blind/Referenceless Image Spatial Quality Evaluator.
    Brisque,
    /// Neural Image Assessment.
    Nima,
    /// PaQ-2-PiQ patch-to-picture quality.
    Paq2piq,
}

impl MetricName {
    /// All metrics, in report order.
    pub const ALL: [MetricName; 5] = [
        MetricName::Niqe,
        MetricName::Piqe,
        MetricName::Brisque,
        MetricName::Nima,
        MetricName::Paq2piq,
    ];

    /// Upper-case label used in reports and score files.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MetricName::Niqe => "NIQE",
            MetricName::Piqe => "PIQE",
            MetricName::Brisque => "BRISQUE",
            MetricName::Nima => "NIMA",
            MetricName::Paq2piq => "PAQ2PIQ",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown metric '{s}', expected one of NIQE, PIQE, BRISQUE, NIMA, PAQ2PIQ")
            })
    }
}

/// Scores by metric. Metrics an estimator cannot produce are simply absent.
pub type QualityScores = BTreeMap<MetricName, f64>;

/// A source of no-reference quality scores for a single image.
pub trait QualityMetrics {
    /// Scores `image`. Returns an empty map if nothing is available.
    fn compute(&self, image: ImgRef<'_, RGB8>) -> QualityScores;
}

/// Estimator that produces no scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQualityMetrics;

impl QualityMetrics for NoQualityMetrics {
    fn compute(&self, _image: ImgRef<'_, RGB8>) -> QualityScores {
        QualityScores::new()
    }
}

impl QualityMetrics for QualityScores {
    /// Fixed scores, e.g. computed by an external tool ahead of time.
    fn compute(&self, _image: ImgRef<'_, RGB8>) -> QualityScores {
        self.clone()
    }
}

/// Graininess of a rendered image.
///
/// Mean over R, G and B of the population standard deviation of that
/// channel's values, on the 0-255 scale. Zero for a flat image or an image
/// without pixels.
#[must_use]
pub fn graininess(image: ImgRef<'_, RGB8>) -> f64 {
    let n = (image.width() * image.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }

    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    for px in image.pixels() {
        for (c, v) in [px.r, px.g, px.b].into_iter().enumerate() {
            let v = f64::from(v);
            sum[c] += v;
            sum_sq[c] += v * v;
        }
    }

    let std_total: f64 = (0..3)
        .map(|c| {
            let mean = sum[c] / n;
            (sum_sq[c] / n - mean * mean).max(0.0).sqrt()
        })
        .sum();
    std_total / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    #[test]
    fn test_metric_name_parsing() {
        assert_eq!("niqe".parse::<MetricName>().unwrap(), MetricName::Niqe);
        assert_eq!("PAQ2PIQ".parse::<MetricName>().unwrap(), MetricName::Paq2piq);
        assert_eq!("Brisque".parse::<MetricName>().unwrap(), MetricName::Brisque);
        assert!("ssim".parse::<MetricName>().is_err());
        for m in MetricName::ALL {
            assert_eq!(m.to_string().parse::<MetricName>().unwrap(), m);
        }
    }

    #[test]
    fn test_no_metrics_is_empty() {
        let img = Img::new(vec![RGB8::new(1, 2, 3); 4], 2, 2);
        assert!(NoQualityMetrics.compute(img.as_ref()).is_empty());
    }

    #[test]
    fn test_fixed_scores() {
        let mut scores = QualityScores::new();
        scores.insert(MetricName::Nima, 5.25);
        let img = Img::new(vec![RGB8::new(1, 2, 3); 4], 2, 2);
        assert_eq!(scores.compute(img.as_ref()).get(&MetricName::Nima), Some(&5.25));
    }

    #[test]
    fn test_graininess_flat_is_zero() {
        let img = Img::new(vec![RGB8::new(90, 10, 200); 16], 4, 4);
        assert_eq!(graininess(img.as_ref()), 0.0);
    }

    #[test]
    fn test_graininess_checkerboard() {
        // Half 0, half 100 in every channel: std = 50
        let pixels: Vec<RGB8> = (0..16)
            .map(|i| {
                let v = if (i + i / 4) % 2 == 0 { 0 } else { 100 };
                RGB8::new(v, v, v)
            })
            .collect();
        let img = Img::new(pixels, 4, 4);
        assert!((graininess(img.as_ref()) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_graininess_empty() {
        let img: imgref::ImgVec<RGB8> = Img::new(Vec::new(), 5, 0);
        assert_eq!(graininess(img.as_ref()), 0.0);
    }
}
