//! Constants for the S-CIELAB pipeline.
//!
//! Display primaries and white point are sRGB / D65 (IEC 61966-2-1).
//! Opponent matrix and filter parameters are from Zhang & Wandell,
//! "A spatial extension of CIELAB for digital color image reproduction" (1996).

// ============================================================================
// Viewing geometry
// ============================================================================

/// Nominal viewing distance used by [`compute_sampling_density`](crate::compute_sampling_density).
pub const DEFAULT_VIEWING_DISTANCE_INCHES: f64 = 18.0;

/// Kernels are never wider than this many degrees of visual angle in total.
pub const MAX_KERNEL_EXTENT_DEGREES: f64 = 1.0;

/// Kernel support, in standard deviations of the widest component.
pub const KERNEL_TRUNCATION_SIGMAS: f64 = 3.0;

/// Lowest accepted sampling density, in pixels per degree.
///
/// Below this every Gaussian term collapses onto the center tap.
pub const MIN_PIXELS_PER_DEGREE: f64 = 0.01;

/// Highest accepted sampling density, in pixels per degree.
///
/// Bounds the kernel at about 10k taps; real displays sit well under 1000.
pub const MAX_PIXELS_PER_DEGREE: f64 = 10_000.0;

// ============================================================================
// Color space matrices
// ============================================================================

/// Linear sRGB to CIE XYZ, D65, scaled so that white has Y = 100.
pub const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [41.245_64, 35.757_61, 18.043_75],
    [21.267_29, 71.515_22, 7.217_5],
    [1.933_39, 11.919_2, 95.030_41],
];

/// CIE XYZ to opponent channels (luminance, red-green, blue-yellow).
pub const XYZ_TO_OPPONENT: [[f32; 3]; 3] = [
    [0.279, 0.72, -0.107],
    [-0.449, 0.29, -0.077],
    [0.086, -0.59, 0.501],
];

/// Inverse of [`XYZ_TO_OPPONENT`].
pub const OPPONENT_TO_XYZ: [[f32; 3]; 3] = [
    [0.626_554_504_250, -1.867_177_597_834, -0.153_156_373_410],
    [1.369_855_450_124, 0.934_755_824_130, 0.436_229_005_232],
    [1.505_650_754_905, 1.421_323_771_758, 2.536_021_080_240],
];

/// D65 reference white, same scale as [`RGB_TO_XYZ`].
pub const WHITE_D65: [f32; 3] = [95.047, 100.0, 108.883];

// ============================================================================
// CIELAB
// ============================================================================

/// (6/29)^3: below this the Lab companding function is linear.
pub const LAB_EPSILON: f32 = 216.0 / 24389.0;

/// Slope of the linear segment, 1 / (3 * (6/29)^2).
pub const LAB_LINEAR_SLOPE: f32 = 841.0 / 108.0;

/// Offset of the linear segment, 4/29.
pub const LAB_LINEAR_OFFSET: f32 = 4.0 / 29.0;

// ============================================================================
// Contrast sensitivity filters: (weight, spread in degrees)
// ============================================================================

/// Luminance channel. The negative wide component models surround inhibition.
pub const LUMINANCE_COMPONENTS: [(f64, f64); 3] =
    [(1.00327, 0.0500), (0.114416, 0.2250), (-0.117686, 7.0000)];

/// Red-green channel.
pub const RED_GREEN_COMPONENTS: [(f64, f64); 2] = [(0.616725, 0.0685), (0.383275, 0.8260)];

/// Blue-yellow channel.
pub const BLUE_YELLOW_COMPONENTS: [(f64, f64); 2] = [(0.567885, 0.0920), (0.432115, 0.6451)];
