//! Radix-2 forward and inverse discrete Fourier transforms.
//!
//! Sign convention: the forward transform uses the positive exponent
//! `e^{+2πi/N}` and is left unnormalized; the inverse uses `e^{-2πi/N}` and
//! divides every output by `N`. The pairing makes `inverse(forward(x)) == x`
//! up to rounding, and every engine in this module honors it.
//!
//! Lengths must be powers of two. Anything else is a caller bug and panics.

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;
use std::f64::consts::TAU;

/// Returns true when `n` is zero or a power of two.
pub fn is_power_of_two(n: usize) -> bool {
    n & n.wrapping_sub(1) == 0
}

/// Forward transform by recursive decimation in time.
///
/// Returns a new sequence of the same length.
///
/// # Panics
/// If `sequence.len()` is not a power of two.
pub fn forward(sequence: &[Complex32]) -> Vec<Complex32> {
    assert!(
        is_power_of_two(sequence.len()),
        "forward transform length {} is not a power of two",
        sequence.len()
    );
    radix2(sequence, 1.0)
}

/// Inverse transform: conjugate twiddles, then every output divided by `N`.
///
/// # Panics
/// If `sequence.len()` is not a power of two.
pub fn inverse(sequence: &[Complex32]) -> Vec<Complex32> {
    assert!(
        is_power_of_two(sequence.len()),
        "inverse transform length {} is not a power of two",
        sequence.len()
    );

    let mut output = radix2(sequence, -1.0);
    let n = output.len() as f32;
    for value in output.iter_mut() {
        *value /= n;
    }
    output
}

/// Recursive Cooley-Tukey step. `sign` selects the twiddle exponent.
fn radix2(sequence: &[Complex32], sign: f64) -> Vec<Complex32> {
    let n = sequence.len();
    if n <= 1 {
        return sequence.to_vec();
    }

    // Split by position, not by value
    let even: Vec<Complex32> = sequence.iter().step_by(2).copied().collect();
    let odd: Vec<Complex32> = sequence.iter().skip(1).step_by(2).copied().collect();

    let even = radix2(&even, sign);
    let odd = radix2(&odd, sign);

    let half = n / 2;
    let mut output = vec![Complex32::new(0.0, 0.0); n];
    for j in 0..half {
        let angle = sign * TAU * j as f64 / n as f64;
        let twiddle = Complex32::new(angle.cos() as f32, angle.sin() as f32);
        let t = twiddle * odd[j];
        output[j] = even[j] + t;
        output[j + half] = even[j] - t;
    }
    output
}

/// rustfft-backed engine with the same sign and normalization contract as
/// [`forward`] and [`inverse`].
///
/// rustfft's own "inverse" direction uses the positive exponent, so it backs
/// our forward transform and vice versa. Plans are cached by the planner.
pub struct PlannedTransform {
    planner: FftPlanner<f32>,
}

impl PlannedTransform {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// # Panics
    /// If `sequence.len()` is not a power of two.
    pub fn forward(&mut self, sequence: &[Complex32]) -> Vec<Complex32> {
        assert!(
            is_power_of_two(sequence.len()),
            "forward transform length {} is not a power of two",
            sequence.len()
        );

        let mut buffer = sequence.to_vec();
        if buffer.len() > 1 {
            let fft = self.planner.plan_fft_inverse(buffer.len());
            fft.process(&mut buffer);
        }
        buffer
    }

    /// # Panics
    /// If `sequence.len()` is not a power of two.
    pub fn inverse(&mut self, sequence: &[Complex32]) -> Vec<Complex32> {
        assert!(
            is_power_of_two(sequence.len()),
            "inverse transform length {} is not a power of two",
            sequence.len()
        );

        let mut buffer = sequence.to_vec();
        if buffer.len() > 1 {
            let fft = self.planner.plan_fft_forward(buffer.len());
            fft.process(&mut buffer);

            let n = buffer.len() as f32;
            for value in buffer.iter_mut() {
                *value /= n;
            }
        }
        buffer
    }
}

impl Default for PlannedTransform {
    fn default() -> Self {
        Self::new()
    }
}

/// Transform engine selected at session start.
pub enum TransformEngine {
    /// Allocating recursive radix-2
    Recursive,
    /// Planned rustfft
    Planned(PlannedTransform),
}

impl TransformEngine {
    pub fn forward(&mut self, sequence: &[Complex32]) -> Vec<Complex32> {
        match self {
            Self::Recursive => forward(sequence),
            Self::Planned(planned) => planned.forward(sequence),
        }
    }

    pub fn inverse(&mut self, sequence: &[Complex32]) -> Vec<Complex32> {
        match self {
            Self::Recursive => inverse(sequence),
            Self::Planned(planned) => planned.inverse(sequence),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Planned(_) => "planned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    fn test_signal(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| {
                let t = i as f32;
                Complex32::new((t * 0.37).sin() + 0.25 * (t * 1.9).cos(), (t * 0.11).cos() * 0.5)
            })
            .collect()
    }

    fn assert_close(a: &[Complex32], b: &[Complex32]) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!(
                (x - y).norm() < TOLERANCE,
                "index {}: {} vs {}",
                i,
                x,
                y
            );
        }
    }

    #[test]
    fn test_is_power_of_two() {
        assert!(is_power_of_two(0));
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(is_power_of_two(4096));
        assert!(!is_power_of_two(3));
        assert!(!is_power_of_two(1000));
    }

    #[test]
    fn test_round_trip_restores_input() {
        for n in [1, 2, 4, 8, 64, 1024] {
            let signal = test_signal(n);
            let restored = inverse(&forward(&signal));
            assert_close(&restored, &signal);
        }
    }

    #[test]
    fn test_lengths_are_preserved() {
        for n in [0, 1, 2, 16, 256] {
            let signal = test_signal(n);
            assert_eq!(forward(&signal).len(), n);
            assert_eq!(inverse(&signal).len(), n);
        }
    }

    #[test]
    fn test_single_point_is_identity() {
        let point = [Complex32::new(0.75, -2.0)];
        assert_eq!(forward(&point), point.to_vec());
        assert_eq!(inverse(&point), point.to_vec());
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let mut impulse = vec![Complex32::new(0.0, 0.0); 8];
        impulse[0] = Complex32::new(1.0, 0.0);

        let spectrum = forward(&impulse);
        for bin in &spectrum {
            assert!((bin.norm() - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn test_single_cycle_sinusoid_concentrates_in_bins_one_and_seven() {
        let signal: Vec<Complex32> = (0..8)
            .map(|i| Complex32::new((TAU as f32 * i as f32 / 8.0).cos(), 0.0))
            .collect();

        let spectrum = forward(&signal);
        for (k, bin) in spectrum.iter().enumerate() {
            if k == 1 || k == 7 {
                assert!((bin.norm() - 4.0).abs() < TOLERANCE, "bin {k}: {bin}");
            } else {
                assert!(bin.norm() < TOLERANCE, "bin {k}: {bin}");
            }
        }
    }

    #[test]
    fn test_forward_uses_positive_exponent() {
        // e^{+2πi n/8} lands in bin 7 under the positive-exponent convention
        let signal: Vec<Complex32> = (0..8)
            .map(|i| Complex32::from_polar(1.0, TAU as f32 * i as f32 / 8.0))
            .collect();

        let spectrum = forward(&signal);
        assert!((spectrum[7].norm() - 8.0).abs() < TOLERANCE);
        assert!(spectrum[1].norm() < TOLERANCE);
    }

    #[test]
    fn test_planned_engine_matches_recursive() {
        let signal = test_signal(256);
        let mut planned = PlannedTransform::new();

        let recursive_spectrum = forward(&signal);
        let planned_spectrum = planned.forward(&signal);
        for (a, b) in recursive_spectrum.iter().zip(planned_spectrum.iter()) {
            assert!((a - b).norm() < 1e-2);
        }

        assert_close(&planned.inverse(&planned_spectrum), &signal);
    }

    #[test]
    fn test_engine_dispatch() {
        let signal = test_signal(32);
        for mut engine in [
            TransformEngine::Recursive,
            TransformEngine::Planned(PlannedTransform::new()),
        ] {
            let spectrum = engine.forward(&signal);
            let restored = engine.inverse(&spectrum);
            assert_close(&restored, &signal);
        }
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn test_forward_panics_on_bad_length() {
        forward(&test_signal(6));
    }

    #[test]
    #[should_panic(expected = "not a power of two")]
    fn test_inverse_panics_on_bad_length() {
        inverse(&test_signal(12));
    }
}
