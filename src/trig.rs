//! Polynomial approximations of sin, cos and asin.
//!
//! The solar-angle predictor can trade accuracy for speed by replacing the
//! library trigonometric functions with truncated Taylor or Chebyshev series.
//! All evaluation happens in single precision, as on the low-power nodes the
//! traces come from.

use std::f32::consts::{FRAC_PI_2, PI};

/// Highest supported polynomial degree for sine and cosine.
pub const MAX_SIN_DEGREE: u32 = 11;

/// Highest supported polynomial degree for arcsine.
pub const MAX_ASIN_DEGREE: u32 = 13;

const SIN_TAYLOR: [f32; 6] = [
    1.0,
    0.166666667,
    0.008333333,
    0.000198413,
    0.000002756,
    0.000000025,
];

const ASIN_TAYLOR: [f32; 7] = [
    1.0,
    0.166666667,
    0.075,
    0.044642857,
    0.030381944,
    0.022372159,
    0.017352764,
];

const SIN_CHEBYSHEV: [&[f32]; 5] = [
    &[0.99749, 0.15652],
    &[0.999978675, -0.1664971, 0.00799224],
    &[0.999999904, -0.166665402, 0.008328768, -0.000192298],
    &[0.999999999, -0.166666661, 0.008333304, -0.000198345, 0.000002688],
    &[
        1.0,
        -0.166666667,
        0.008333333,
        -0.000198412,
        0.000002755,
        -0.000000025,
    ],
];

const ASIN_CHEBYSHEV: [&[f32]; 6] = [
    &[0.8614, 0.5408],
    &[1.08587, -0.35788, 0.719088],
    &[0.943528878, 0.780838836, -1.558348544, 1.301392704],
    &[
        1.037836385,
        -0.476593933,
        2.968409379,
        -4.734284512,
        2.682523200,
    ],
    &[
        0.974704947,
        0.786034821,
        -4.102311638,
        11.42736353,
        -13.47912484,
        5.876962924,
    ],
    &[
        1.016676946,
        -0.389181173,
        5.299416308,
        -20.80713228,
        40.24503485,
        -37.10236483,
        13.22440854,
    ],
];

/// Polynomial family used by [`TrigApprox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesKind {
    /// Truncated Maclaurin series.
    #[default]
    Taylor,
    /// Minimax (Chebyshev-economized) polynomials.
    Chebyshev,
}

/// Configurable sin/cos/asin evaluator.
///
/// A degree of 0 selects the exact library functions.
///
/// # Example
/// ```
/// use harvest_forecast::trig::TrigApprox;
///
/// let trig = TrigApprox::taylor(7);
/// let s = trig.sin(std::f32::consts::FRAC_PI_6);
/// assert!((s - 0.5).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrigApprox {
    kind: SeriesKind,
    degree: u32,
}

impl TrigApprox {
    /// Exact library trigonometry.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Taylor approximation of the given degree.
    pub fn taylor(degree: u32) -> Self {
        Self::new(SeriesKind::Taylor, degree)
    }

    /// Chebyshev approximation of the given degree.
    pub fn chebyshev(degree: u32) -> Self {
        Self::new(SeriesKind::Chebyshev, degree)
    }

    pub fn new(kind: SeriesKind, degree: u32) -> Self {
        Self {
            kind,
            degree: degree.min(MAX_ASIN_DEGREE),
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Whether the library functions are used.
    pub fn is_exact(&self) -> bool {
        self.degree == 0
    }

    /// Sine of `angle` (radians).
    pub fn sin(&self, angle: f32) -> f32 {
        if self.degree == 0 {
            return angle.sin();
        }
        let Some(x) = reduce_angle(angle) else {
            return f32::NAN;
        };
        let degree = self.degree.min(MAX_SIN_DEGREE);
        let x2 = x * x;
        match self.kind {
            SeriesKind::Taylor => {
                let mut acc = 0.0;
                for i in (1..=((degree - 1) / 2) as usize).rev() {
                    acc = x2 * (SIN_TAYLOR[i] - acc);
                }
                x * (1.0 - acc)
            }
            SeriesKind::Chebyshev => {
                let coefficients = SIN_CHEBYSHEV[chebyshev_row(degree)];
                let mut acc = 0.0;
                for i in (1..=((degree - 1) / 2) as usize).rev() {
                    acc = x2 * (coefficients[i] + acc);
                }
                x * (coefficients[0] + acc)
            }
        }
    }

    /// Cosine of `angle` (radians), evaluated as a shifted sine.
    pub fn cos(&self, angle: f32) -> f32 {
        if self.degree == 0 {
            return angle.cos();
        }
        self.sin(angle + FRAC_PI_2)
    }

    /// Arcsine of `value`, in radians.
    pub fn asin(&self, value: f32) -> f32 {
        if self.degree == 0 {
            return value.asin();
        }
        let v2 = value * value;
        let mut acc = 0.0;
        match self.kind {
            SeriesKind::Taylor => {
                for i in (1..=((self.degree - 1) / 2) as usize).rev() {
                    acc = v2 * (ASIN_TAYLOR[i] + acc);
                }
                value * (1.0 + acc)
            }
            SeriesKind::Chebyshev => {
                let coefficients = ASIN_CHEBYSHEV[chebyshev_row(self.degree)];
                for i in (1..=((self.degree - 1) / 2) as usize).rev() {
                    acc = v2 * (coefficients[i] + acc);
                }
                value * (coefficients[0] + acc)
            }
        }
    }
}

/// Row of the Chebyshev coefficient tables for a clamped degree.
fn chebyshev_row(degree: u32) -> usize {
    (degree.saturating_sub(3) / 2) as usize
}

/// Bring an angle into [-π, π].
fn reduce_angle(angle: f32) -> Option<f32> {
    if !angle.is_finite() {
        return None;
    }
    let mut x = angle;
    while x > PI {
        x -= 2.0 * PI;
    }
    while x < -PI {
        x += 2.0 * PI;
    }
    Some(x)
}
