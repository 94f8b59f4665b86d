use crate::prelude::WindowType;
use num_complex::Complex32;
use std::f64::consts::PI;

/// Builds a window of length `n`, normalized so the sum of squares is `n`
/// and windowing leaves white-noise power unchanged.
pub fn create_window(kind: WindowType, n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    let raw: Vec<f64> = (0..n)
        .map(|ii| {
            let angle = 2.0 * PI * (ii as f64 + 0.5) / n as f64;
            match kind {
                WindowType::Rect => 1.0,
                WindowType::Vonhann => 0.5 * (1.0 - angle.cos()),
                WindowType::Blackman => 0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos(),
            }
        })
        .collect();
    let sum_sq: f64 = raw.iter().map(|w| w * w).sum();
    let scale = if sum_sq > 0.0 {
        (n as f64 / sum_sq).sqrt()
    } else {
        1.0
    };
    raw.iter().map(|w| (w * scale) as f32).collect()
}

/// Multiplies the series by the window, sample by sample.
pub fn apply_window(iq: &[Complex32], window: &[f32]) -> Vec<Complex32> {
    iq.iter()
        .zip(window.iter())
        .map(|(sample, &weight)| *sample * weight)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_window_is_all_ones() {
        assert!(create_window(WindowType::Rect, 6)
            .iter()
            .all(|&w| (w - 1.0).abs() < 1e-6));
    }

    #[test]
    fn windows_preserve_power() {
        for kind in [WindowType::Vonhann, WindowType::Blackman] {
            let window = create_window(kind, 32);
            let sum_sq: f32 = window.iter().map(|w| w * w).sum();
            assert!((sum_sq - 32.0).abs() < 1e-3, "{:?}", kind);
            assert!(window[0] < window[16]);
        }
    }
}
