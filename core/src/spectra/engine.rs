use crate::beam::{Beam, StaggeredPrt};
use crate::gate::{ChannelSeries, GateData};
use crate::math::StatsHelper;
use crate::prelude::{BeamConfig, BeamResult, Channel, ScanType, XmitRcvMode};
use crate::pulse_interface::Calibration;
use crate::spectra::dsp::{DspBackend, FilterSettings, FilterSummary, RustFftBackend};
use crate::spectra::moments::{GateMoments, MomentsContext, StaggeredContext};
use crate::spectra::staggered::{expand, separate};
use crate::telemetry::LogManager;
use num_complex::Complex32;
use serde::Serialize;

/// Spectrum, time series and moments of one channel at one gate.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelSpectra {
    pub channel: Channel,
    /// PRT between successive samples of the series.
    pub prt: f64,
    pub nyquist: f64,
    /// Windowed power spectrum, DC centred.
    pub spectrum: Vec<f64>,
    pub time_power: Vec<f64>,
    pub phase_deg: Vec<f64>,
    pub moments: GateMoments,
    pub filtered_moments: Option<GateMoments>,
    pub adaptive: Option<FilterSummary>,
    pub regression: Option<FilterSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GateSpectra {
    pub gate: usize,
    pub range_km: f64,
    pub channels: Vec<ChannelSpectra>,
}

impl GateSpectra {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelSpectra> {
        self.channels.iter().find(|spectra| spectra.channel == channel)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BeamSpectra {
    pub radar_name: String,
    pub time: f64,
    pub az: f64,
    pub el: f64,
    pub scan_type: ScanType,
    pub mode: XmitRcvMode,
    pub staggered: Option<StaggeredPrt>,
    pub n_samples: usize,
    pub prt: f64,
    pub nyquist: f64,
    pub start_range_km: f64,
    pub gate_spacing_km: f64,
    pub gates: Vec<GateSpectra>,
}

/// Runs windowing, clutter filtering and moment estimation over every
/// gate and channel of a de-interleaved beam.
pub struct SpectralMomentEngine<B: DspBackend = RustFftBackend> {
    backend: B,
    settings: FilterSettings,
    calibration: Calibration,
    logger: LogManager,
}

impl SpectralMomentEngine<RustFftBackend> {
    pub fn new(config: &BeamConfig, calibration: Calibration) -> Self {
        Self::with_backend(RustFftBackend::new(), config, calibration)
    }
}

impl<B: DspBackend> SpectralMomentEngine<B> {
    pub fn with_backend(backend: B, config: &BeamConfig, calibration: Calibration) -> Self {
        Self {
            backend,
            settings: FilterSettings::from(config),
            calibration,
            logger: LogManager::new("moments"),
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// `mode` is the mode the gates were de-interleaved with.
    pub fn process(
        &mut self,
        beam: &Beam,
        gates: &[GateData],
        mode: XmitRcvMode,
    ) -> BeamResult<BeamSpectra> {
        let ops = beam.ops();
        let mut gate_spectra = Vec::with_capacity(gates.len());
        for (gate_index, gate) in gates.iter().enumerate() {
            let range_km = ops.range_km(gate_index);
            let mut channels = Vec::with_capacity(mode.channels().len());
            for &channel in mode.channels() {
                let series = gate.channel(channel);
                let spectra = match beam.staggered() {
                    Some(stag) => self.staggered_channel(beam, stag, channel, series, gate_index, range_km)?,
                    None => self.uniform_channel(beam, mode, channel, series, range_km)?,
                };
                channels.push(spectra);
            }
            gate_spectra.push(GateSpectra {
                gate: gate_index,
                range_km,
                channels,
            });
        }
        self.logger.detail(&format!(
            "spectra for {} gates at az {:.2} el {:.2}",
            gate_spectra.len(),
            beam.az,
            beam.el
        ));

        Ok(BeamSpectra {
            radar_name: ops.radar_name.clone(),
            time: beam.time,
            az: beam.az,
            el: beam.el,
            scan_type: beam.scan_type,
            mode,
            staggered: beam.staggered().copied(),
            n_samples: beam.n_samples(),
            prt: beam.prt,
            nyquist: beam.nyquist,
            start_range_km: ops.start_range_km,
            gate_spacing_km: ops.gate_spacing_km,
            gates: gate_spectra,
        })
    }

    fn uniform_channel(
        &mut self,
        beam: &Beam,
        mode: XmitRcvMode,
        channel: Channel,
        series: &ChannelSeries,
        range_km: f64,
    ) -> BeamResult<ChannelSpectra> {
        // alternating channels see every other pulse
        let (prt, nyquist) = if mode.is_alternating() {
            (beam.prt * 2.0, beam.nyquist / 2.0)
        } else {
            (beam.prt, beam.nyquist)
        };
        let noise_power = self.calibration.noise_power(channel);
        let ctx = MomentsContext::new(self.calibration.channel(channel), nyquist, range_km);
        let iq = &series.full;

        let spectrum = self.backend.windowed_fft(iq, self.settings.window);
        let moments = self.backend.compute_moments(iq, &ctx);
        let adaptive = self
            .backend
            .apply_adaptive_filter(iq, &self.settings, noise_power);
        let regression =
            self.backend
                .apply_regression_filter(iq, None, &self.settings, noise_power)?;
        let filtered_moments = self.backend.compute_moments(&adaptive.filtered, &ctx);

        Ok(ChannelSpectra {
            channel,
            prt,
            nyquist,
            spectrum: StatsHelper::centered_power(&spectrum),
            time_power: time_power(iq),
            phase_deg: phase_deg(iq),
            moments,
            filtered_moments: Some(filtered_moments),
            adaptive: Some(adaptive.summary),
            regression: Some(regression.summary),
        })
    }

    fn staggered_channel(
        &mut self,
        beam: &Beam,
        stag: &StaggeredPrt,
        channel: Channel,
        series: &ChannelSeries,
        gate_index: usize,
        range_km: f64,
    ) -> BeamResult<ChannelSpectra> {
        let ops = beam.ops();
        let noise_power = self.calibration.noise_power(channel);
        let ctx = StaggeredContext {
            base: MomentsContext::new(self.calibration.channel(channel), beam.nyquist, range_km),
            nyquist_short: ops.nyquist(stag.prt_short),
            nyquist_long: ops.nyquist(stag.prt_long),
            m: stag.m,
            n: stag.n,
            long_only: gate_index >= stag.n_gates_short,
        };

        if ctx.long_only {
            let iq = &series.prt_long;
            let spectrum = self.backend.windowed_fft(iq, self.settings.window);
            return Ok(ChannelSpectra {
                channel,
                prt: stag.prt_short + stag.prt_long,
                nyquist: beam.nyquist,
                spectrum: StatsHelper::centered_power(&spectrum),
                time_power: time_power(iq),
                phase_deg: phase_deg(iq),
                moments: self.backend.compute_moments_staggered(&[], iq, &ctx),
                filtered_moments: None,
                adaptive: None,
                regression: None,
            });
        }

        let expanded = expand(&series.full, stag.m, stag.n);
        let spectrum = self.backend.windowed_fft(&expanded, self.settings.window);
        let moments =
            self.backend
                .compute_moments_staggered(&series.prt_short, &series.prt_long, &ctx);
        let regression = self.backend.apply_regression_filter(
            &series.full,
            Some((stag.m, stag.n)),
            &self.settings,
            noise_power,
        )?;
        let (short, long) = separate(&regression.filtered);
        let filtered_moments = self.backend.compute_moments_staggered(&short, &long, &ctx);

        // PRT unit of the expanded grid
        let unit_prt = stag.prt_short / stag.m.max(1) as f64;
        Ok(ChannelSpectra {
            channel,
            prt: unit_prt,
            nyquist: beam.nyquist,
            spectrum: StatsHelper::centered_power(&spectrum),
            time_power: time_power(&expanded),
            phase_deg: phase_deg(&expanded),
            moments,
            filtered_moments: Some(filtered_moments),
            adaptive: None,
            regression: Some(regression.summary),
        })
    }
}

fn time_power(iq: &[Complex32]) -> Vec<f64> {
    iq.iter().map(|sample| sample.norm_sqr() as f64).collect()
}

fn phase_deg(iq: &[Complex32]) -> Vec<f64> {
    iq.iter().map(|&sample| StatsHelper::arg_deg(sample)).collect()
}
