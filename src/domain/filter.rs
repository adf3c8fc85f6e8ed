//! Zero-phase Butterworth low-pass filter
//!
//! The design follows the classic route: analog Butterworth prototype,
//! frequency pre-warping, bilinear transform, then expansion into
//! transfer-function coefficients. The filter is run forward and then
//! backward over the series so the output has no phase lag against the
//! input.
//!
//! Both ends are extended by odd reflection before filtering and each pass
//! starts from the steady-state filter memory for its first value, which
//! keeps edge transients small.

use crate::error::{AnalysisError, Result};
use std::f64::consts::PI;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Highest order accepted. The transfer-function form loses precision
/// quickly beyond this.
pub const MAX_ORDER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    const ONE: Complex = Complex { re: 1.0, im: 0.0 };

    fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    fn real(re: f64) -> Self {
        Self { re, im: 0.0 }
    }

    fn scale(self, k: f64) -> Self {
        Self::new(self.re * k, self.im * k)
    }
}

impl Add for Complex {
    type Output = Complex;
    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;
    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;
    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex {
    type Output = Complex;
    fn div(self, rhs: Complex) -> Complex {
        let denom = rhs.re * rhs.re + rhs.im * rhs.im;
        Complex::new(
            (self.re * rhs.re + self.im * rhs.im) / denom,
            (self.im * rhs.re - self.re * rhs.im) / denom,
        )
    }
}

impl Neg for Complex {
    type Output = Complex;
    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

/// Expand `prod(x - root)` into polynomial coefficients, highest power first
fn poly(roots: &[Complex]) -> Vec<Complex> {
    let mut coeffs = vec![Complex::ONE];
    for &root in roots {
        let mut next = vec![Complex::real(0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] = next[i] + c;
            next[i + 1] = next[i + 1] - c * root;
        }
        coeffs = next;
    }
    coeffs
}

/// Transfer-function coefficients `b` (numerator) and `a` (denominator),
/// with `a[0] == 1`
#[derive(Debug, Clone, PartialEq)]
pub struct ButterworthCoefficients {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl ButterworthCoefficients {
    /// Design a digital low-pass of the given order.
    ///
    /// `wn` is the cutoff normalized to Nyquist and must lie strictly
    /// between 0 and 1.
    pub fn low_pass(order: usize, wn: f64) -> Result<Self> {
        if order == 0 || order > MAX_ORDER {
            return Err(AnalysisError::InvalidParameter(format!(
                "filter order must be between 1 and {}, got {}",
                MAX_ORDER, order
            )));
        }
        if !(wn > 0.0 && wn < 1.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "normalized cutoff must be strictly between 0 and 1, got {}",
                wn
            )));
        }

        // Analog prototype poles on the left half of the unit circle
        let n = order as f64;
        let prototype: Vec<Complex> = (0..order)
            .map(|k| {
                let m = -(n - 1.0) + 2.0 * k as f64;
                let theta = PI * m / (2.0 * n);
                -Complex::new(theta.cos(), theta.sin())
            })
            .collect();

        // Pre-warp with a sampling rate of 2 (frequencies normalized to Nyquist)
        let fs = 2.0;
        let warped = 2.0 * fs * (PI * wn / fs).tan();
        let poles: Vec<Complex> = prototype.iter().map(|p| p.scale(warped)).collect();
        let gain = warped.powi(order as i32);

        // Bilinear transform; every analog zero at infinity maps to z = -1
        let fs2 = Complex::real(2.0 * fs);
        let digital_poles: Vec<Complex> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        let denom = poles
            .iter()
            .fold(Complex::ONE, |acc, &p| acc * (fs2 - p));
        let digital_gain = (Complex::real(gain) / denom).re;

        let zeros = vec![Complex::real(-1.0); order];
        let b = poly(&zeros)
            .into_iter()
            .map(|c| c.re * digital_gain)
            .collect();
        let a = poly(&digital_poles).into_iter().map(|c| c.re).collect();

        Ok(Self { b, a })
    }

    fn taps(&self) -> usize {
        self.a.len().max(self.b.len())
    }

    /// Filter memory that holds a unit step in steady state
    fn steady_state(&self) -> Vec<f64> {
        let taps = self.taps();
        let dc_gain = self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>();
        let mut zi = vec![0.0; taps - 1];
        let mut acc = 0.0;
        for k in (0..taps - 1).rev() {
            acc += self.b[k + 1] - self.a[k + 1] * dc_gain;
            zi[k] = acc;
        }
        zi
    }

    /// Single causal pass (direct form II transposed)
    fn run(&self, input: &[f64], initial: &[f64]) -> Vec<f64> {
        let taps = self.taps();
        let mut state = initial.to_vec();
        let mut output = Vec::with_capacity(input.len());

        for &x in input {
            let y = self.b[0] * x + state[0];
            for k in 0..taps - 2 {
                state[k] = self.b[k + 1] * x + state[k + 1] - self.a[k + 1] * y;
            }
            state[taps - 2] = self.b[taps - 1] * x - self.a[taps - 1] * y;
            output.push(y);
        }
        output
    }
}

/// Low-pass filter bound to a sampling rate, reusable across axes
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    coefficients: ButterworthCoefficients,
    zi: Vec<f64>,
}

impl LowPassFilter {
    pub fn new(sample_rate_hz: f64, cutoff_hz: f64, order: usize) -> Result<Self> {
        if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sample rate must be positive, got {}",
                sample_rate_hz
            )));
        }
        let nyquist = 0.5 * sample_rate_hz;
        let wn = cutoff_hz / nyquist;
        let coefficients = ButterworthCoefficients::low_pass(order, wn)?;
        let zi = coefficients.steady_state();

        Ok(Self { coefficients, zi })
    }

    /// Forward-backward filtering. Output has the same length as the input.
    pub fn apply(&self, series: &[f64]) -> Vec<f64> {
        let n = series.len();
        if n == 0 {
            return Vec::new();
        }

        let pad = (3 * self.coefficients.taps()).min(n - 1);
        let extended = odd_extend(series, pad);

        let initial: Vec<f64> = self.zi.iter().map(|z| z * extended[0]).collect();
        let mut forward = self.coefficients.run(&extended, &initial);

        forward.reverse();
        let initial: Vec<f64> = self.zi.iter().map(|z| z * forward[0]).collect();
        let mut backward = self.coefficients.run(&forward, &initial);
        backward.reverse();

        backward[pad..pad + n].to_vec()
    }
}

/// Reflect `pad` samples about each endpoint (point symmetry)
fn odd_extend(series: &[f64], pad: usize) -> Vec<f64> {
    let n = series.len();
    let first = series[0];
    let last = series[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - series[i]));
    extended.extend_from_slice(series);
    extended.extend((1..=pad).map(|i| 2.0 * last - series[n - 1 - i]));
    extended
}

/// One-shot zero-phase low-pass of a single series
pub fn low_pass(series: &[f64], sample_rate_hz: f64, cutoff_hz: f64, order: usize) -> Result<Vec<f64>> {
    Ok(LowPassFilter::new(sample_rate_hz, cutoff_hz, order)?.apply(series))
}
