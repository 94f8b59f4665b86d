use crate::math::{apply_window, create_window, FftHelper, MatrixHelper, StatsHelper};
use crate::prelude::{BeamConfig, BeamError, BeamResult, WindowType};
use crate::spectra::moments::{
    compute_moments, compute_moments_staggered, GateMoments, MomentsContext, StaggeredContext,
};
use num_complex::Complex32;
use serde::Serialize;
use std::collections::HashMap;

const MIN_SNR: f64 = 1.0e-13;

/// Clutter-filter settings taken from the beam config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub window: WindowType,
    pub notch_width: usize,
    pub regression_order: usize,
    pub interp_across_notch: bool,
}

impl From<&BeamConfig> for FilterSettings {
    fn from(config: &BeamConfig) -> Self {
        Self {
            window: config.window,
            notch_width: config.clutter_notch_width,
            regression_order: config.regression_order,
            interp_across_notch: config.regression_interp_across_notch,
        }
    }
}

/// Scalar outcome of a clutter filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FilterSummary {
    /// Unfiltered over filtered power.
    pub filter_ratio: f64,
    pub spectral_noise: f64,
    pub spectral_snr: f64,
}

#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Filtered (windowed) time series.
    pub filtered: Vec<Complex32>,
    /// Windowed spectrum before filtering.
    pub spectrum: Vec<Complex32>,
    pub summary: FilterSummary,
}

#[derive(Debug, Clone)]
pub struct RegressionResult {
    pub filtered: Vec<Complex32>,
    /// Fitted clutter component that was removed.
    pub poly_fit: Vec<Complex32>,
    pub summary: FilterSummary,
}

/// Spectral processing needed by the moment engine.
pub trait DspBackend {
    fn windowed_fft(&mut self, iq: &[Complex32], window: WindowType) -> Vec<Complex32>;

    /// Notches the spectrum around DC and interpolates across the gap.
    fn apply_adaptive_filter(
        &mut self,
        iq: &[Complex32],
        settings: &FilterSettings,
        noise_power: f64,
    ) -> FilterResult;

    /// Removes a least-squares polynomial from I and Q. `stagger` gives
    /// the M/N pulse spacing for staggered series.
    fn apply_regression_filter(
        &mut self,
        iq: &[Complex32],
        stagger: Option<(u32, u32)>,
        settings: &FilterSettings,
        noise_power: f64,
    ) -> BeamResult<RegressionResult>;

    fn compute_moments(&self, iq: &[Complex32], ctx: &MomentsContext) -> GateMoments;

    fn compute_moments_staggered(
        &self,
        short: &[Complex32],
        long: &[Complex32],
        ctx: &StaggeredContext,
    ) -> GateMoments;
}

/// `DspBackend` on top of rustfft, with plans and windows cached per length.
#[derive(Default)]
pub struct RustFftBackend {
    ffts: HashMap<usize, FftHelper>,
    windows: HashMap<(WindowType, usize), Vec<f32>>,
}

impl RustFftBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn fft(&mut self, size: usize) -> &mut FftHelper {
        self.ffts
            .entry(size)
            .or_insert_with(|| FftHelper::new(size))
    }

    fn window(&mut self, kind: WindowType, size: usize) -> &[f32] {
        self.windows
            .entry((kind, size))
            .or_insert_with(|| create_window(kind, size))
    }

    fn windowed(&mut self, iq: &[Complex32], kind: WindowType) -> Vec<Complex32> {
        let window = self.window(kind, iq.len());
        apply_window(iq, window)
    }

    /// Bins within the notch, DC first then outward.
    fn notch_bins(n: usize, width: usize) -> Vec<usize> {
        let half = (width / 2).min(n.saturating_sub(1) / 2);
        let mut bins = vec![0];
        for offset in 1..=half {
            bins.push(offset);
            bins.push(n - offset);
        }
        bins
    }

    /// Power the notch bins would have on a line between the two bins
    /// just outside the notch.
    fn interp_power(power: &[f64], width: usize) -> Vec<(usize, f64)> {
        let n = power.len();
        let half = (width / 2).min(n.saturating_sub(1) / 2);
        if n < 3 || half + 1 >= n {
            return Vec::new();
        }
        let left = power[n - half - 1];
        let right = power[half + 1];
        let span = 2.0 * (half as f64 + 1.0);
        Self::notch_bins(n, width)
            .into_iter()
            .map(|bin| {
                let pos = if bin <= half {
                    bin as f64
                } else {
                    bin as f64 - n as f64
                };
                let frac = (pos + half as f64 + 1.0) / span;
                (bin, left + (right - left) * frac)
            })
            .collect()
    }

    fn rescale(spectrum: &mut [Complex32], bin: usize, target: f64) {
        let current = spectrum[bin].norm_sqr() as f64;
        if current > 0.0 {
            spectrum[bin] *= (target / current).sqrt() as f32;
        }
    }

    fn summarize(raw_power: f64, spectrum: &[Complex32]) -> FilterSummary {
        let n = spectrum.len().max(1) as f64;
        let mut power: Vec<f64> = spectrum.iter().map(|c| c.norm_sqr() as f64 / n).collect();
        let filtered_power: f64 = power.iter().sum::<f64>() / n;
        power.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let third = (power.len() / 3).max(1).min(power.len());
        let spectral_noise = if power.is_empty() {
            0.0
        } else {
            power[..third].iter().sum::<f64>() / third as f64
        };
        let spectral_snr = if spectral_noise > 0.0 {
            ((filtered_power - spectral_noise) / spectral_noise).max(MIN_SNR)
        } else {
            MIN_SNR
        };
        let filter_ratio = if filtered_power > 0.0 {
            raw_power / filtered_power
        } else {
            1.0
        };
        FilterSummary {
            filter_ratio,
            spectral_noise,
            spectral_snr,
        }
    }

    /// Sample times scaled to [-1, 1].
    fn sample_times(n: usize, stagger: Option<(u32, u32)>) -> Vec<f64> {
        let mut times = Vec::with_capacity(n);
        let mut t = 0.0;
        for index in 0..n {
            times.push(t);
            t += match stagger {
                Some((m, n_long)) => {
                    if index % 2 == 0 {
                        m as f64
                    } else {
                        n_long as f64
                    }
                }
                None => 1.0,
            };
        }
        let last = times.last().copied().unwrap_or(0.0);
        if last > 0.0 {
            for time in times.iter_mut() {
                *time = 2.0 * *time / last - 1.0;
            }
        }
        times
    }
}

impl DspBackend for RustFftBackend {
    fn windowed_fft(&mut self, iq: &[Complex32], window: WindowType) -> Vec<Complex32> {
        let windowed = self.windowed(iq, window);
        self.fft(iq.len()).forward(&windowed)
    }

    fn apply_adaptive_filter(
        &mut self,
        iq: &[Complex32],
        settings: &FilterSettings,
        noise_power: f64,
    ) -> FilterResult {
        let n = iq.len();
        let spectrum = self.windowed_fft(iq, settings.window);
        let power: Vec<f64> = spectrum.iter().map(|c| c.norm_sqr() as f64).collect();
        let raw_power = power.iter().sum::<f64>() / (n.max(1) * n.max(1)) as f64;

        let mut filtered_spectrum = spectrum.clone();
        let floor = noise_power * n as f64;
        for (bin, interp) in Self::interp_power(&power, settings.notch_width) {
            let target = interp.max(floor).min(power[bin]);
            Self::rescale(&mut filtered_spectrum, bin, target);
        }
        let filtered = self.fft(n).inverse(&filtered_spectrum);
        let summary = Self::summarize(raw_power, &filtered_spectrum);
        FilterResult {
            filtered,
            spectrum,
            summary,
        }
    }

    fn apply_regression_filter(
        &mut self,
        iq: &[Complex32],
        stagger: Option<(u32, u32)>,
        settings: &FilterSettings,
        _noise_power: f64,
    ) -> BeamResult<RegressionResult> {
        let n = iq.len();
        let times = Self::sample_times(n, stagger);
        let re: Vec<f64> = iq.iter().map(|c| c.re as f64).collect();
        let im: Vec<f64> = iq.iter().map(|c| c.im as f64).collect();
        let fit = |values: &[f64]| {
            MatrixHelper::polyfit(&times, values, settings.regression_order).ok_or_else(|| {
                BeamError::Dsp(format!(
                    "regression order {} is singular for {} samples",
                    settings.regression_order, n
                ))
            })
        };
        let coeffs_re = fit(&re)?;
        let coeffs_im = fit(&im)?;

        let poly_fit: Vec<Complex32> = times
            .iter()
            .map(|&t| {
                Complex32::new(
                    MatrixHelper::polyval(&coeffs_re, t) as f32,
                    MatrixHelper::polyval(&coeffs_im, t) as f32,
                )
            })
            .collect();
        let mut filtered: Vec<Complex32> = iq
            .iter()
            .zip(&poly_fit)
            .map(|(sample, fit)| sample - fit)
            .collect();

        let raw_power = StatsHelper::mean_power(iq);
        let mut spectrum = self.fft(n).forward(&filtered);
        if settings.interp_across_notch && stagger.is_none() {
            let power: Vec<f64> = spectrum.iter().map(|c| c.norm_sqr() as f64).collect();
            for (bin, interp) in Self::interp_power(&power, settings.notch_width) {
                Self::rescale(&mut spectrum, bin, interp);
            }
            filtered = self.fft(n).inverse(&spectrum);
        }
        let summary = Self::summarize(raw_power, &spectrum);
        Ok(RegressionResult {
            filtered,
            poly_fit,
            summary,
        })
    }

    fn compute_moments(&self, iq: &[Complex32], ctx: &MomentsContext) -> GateMoments {
        compute_moments(iq, ctx)
    }

    fn compute_moments_staggered(
        &self,
        short: &[Complex32],
        long: &[Complex32],
        ctx: &StaggeredContext,
    ) -> GateMoments {
        compute_moments_staggered(short, long, ctx)
    }
}
