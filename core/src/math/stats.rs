use num_complex::Complex32;

pub struct StatsHelper;

impl StatsHelper {
    /// Mean of |x|^2.
    pub fn mean_power(samples: &[Complex32]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = samples.iter().map(|s| s.norm_sqr() as f64).sum();
        sum / samples.len() as f64
    }

    /// Lag-1 autocorrelation, mean of x[k+1] * conj(x[k]).
    pub fn lag1(samples: &[Complex32]) -> Complex32 {
        Self::lag_between(samples, samples, 1)
    }

    /// Mean of b[k+lag] * conj(a[k]) over the overlapping samples.
    pub fn lag_between(a: &[Complex32], b: &[Complex32], lag: usize) -> Complex32 {
        let count = a.len().min(b.len().saturating_sub(lag));
        if count == 0 {
            return Complex32::new(0.0, 0.0);
        }
        let sum: Complex32 = (0..count).map(|k| b[k + lag] * a[k].conj()).sum();
        sum / count as f32
    }

    /// Power spectrum reordered so DC sits at the centre.
    pub fn centered_power(spectrum: &[Complex32]) -> Vec<f64> {
        let n = spectrum.len();
        (0..n)
            .map(|ii| spectrum[(ii + n / 2) % n].norm_sqr() as f64)
            .collect()
    }

    pub fn to_db(power: f64) -> f64 {
        if power <= 0.0 {
            return f64::NEG_INFINITY;
        }
        10.0 * power.log10()
    }

    pub fn arg_deg(value: Complex32) -> f64 {
        (value.im as f64).atan2(value.re as f64).to_degrees()
    }
}
