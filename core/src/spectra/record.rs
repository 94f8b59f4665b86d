use crate::prelude::{Channel, XmitRcvMode};
use crate::spectra::dsp::FilterSummary;
use crate::spectra::engine::{BeamSpectra, ChannelSpectra};
use crate::spectra::moments::GateMoments;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Angular and range limits on the spectra that get written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub min_el: f64,
    pub max_el: f64,
    /// When `min_az > max_az` the sector crosses north.
    pub min_az: f64,
    pub max_az: f64,
    pub min_range_km: f64,
    pub max_range_km: f64,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            min_el: -90.0,
            max_el: 90.0,
            min_az: 0.0,
            max_az: 360.0,
            min_range_km: 0.0,
            max_range_km: 1000.0,
        }
    }
}

impl Region {
    pub fn contains_beam(&self, az: f64, el: f64) -> bool {
        if el < self.min_el || el > self.max_el {
            return false;
        }
        if self.min_az > self.max_az {
            !(az < self.min_az && az > self.max_az)
        } else {
            az >= self.min_az && az <= self.max_az
        }
    }

    /// Gates inside the range limits, clamped to the beam.
    pub fn gate_span(
        &self,
        start_range_km: f64,
        gate_spacing_km: f64,
        n_gates: usize,
    ) -> Option<RangeInclusive<usize>> {
        if n_gates == 0 || gate_spacing_km <= 0.0 {
            return None;
        }
        let start = ((self.min_range_km - start_range_km) / gate_spacing_km).floor();
        let end = ((self.max_range_km - start_range_km) / gate_spacing_km + 1.0).floor();
        if end < 0.0 {
            return None;
        }
        let start = start.max(0.0) as usize;
        let end = (end as usize).min(n_gates - 1);
        if start > end {
            return None;
        }
        Some(start..=end)
    }
}

/// One channel at one gate, flattened for the JSON-lines output.
#[derive(Debug, Clone, Serialize)]
pub struct SpectraRecord {
    pub radar_name: String,
    pub time: f64,
    pub az: f64,
    pub el: f64,
    pub label: String,
    pub channel: Channel,
    pub staggered: bool,
    pub prt: f64,
    pub nyquist: f64,
    pub gate: usize,
    pub range_km: f64,
    pub moments: GateMoments,
    pub filtered_moments: Option<GateMoments>,
    pub adaptive: Option<FilterSummary>,
    pub regression: Option<FilterSummary>,
    pub spectrum: Vec<f64>,
    pub time_power: Vec<f64>,
    pub phase_deg: Vec<f64>,
}

impl SpectraRecord {
    /// Mode and channel tag, e.g. `DP_ALT_HV_CO_CROSS_HX`.
    pub fn label(mode: XmitRcvMode, channel: Channel) -> String {
        format!("{}_{}", mode.label(), channel.suffix())
    }

    fn from_channel(beam: &BeamSpectra, gate: usize, range_km: f64, spectra: &ChannelSpectra) -> Self {
        Self {
            radar_name: beam.radar_name.clone(),
            time: beam.time,
            az: beam.az,
            el: beam.el,
            label: Self::label(beam.mode, spectra.channel),
            channel: spectra.channel,
            staggered: beam.staggered.is_some(),
            prt: spectra.prt,
            nyquist: spectra.nyquist,
            gate,
            range_km,
            moments: spectra.moments,
            filtered_moments: spectra.filtered_moments,
            adaptive: spectra.adaptive,
            regression: spectra.regression,
            spectrum: spectra.spectrum.clone(),
            time_power: spectra.time_power.clone(),
            phase_deg: spectra.phase_deg.clone(),
        }
    }

    /// Records for every gate and channel of the beam inside the region.
    pub fn from_beam(beam: &BeamSpectra, region: &Region) -> Vec<SpectraRecord> {
        if !region.contains_beam(beam.az, beam.el) {
            return Vec::new();
        }
        let span = match region.gate_span(beam.start_range_km, beam.gate_spacing_km, beam.gates.len()) {
            Some(span) => span,
            None => return Vec::new(),
        };
        beam.gates[span]
            .iter()
            .flat_map(|gate| {
                gate.channels
                    .iter()
                    .map(move |spectra| Self::from_channel(beam, gate.gate, gate.range_km, spectra))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::ScanType;
    use crate::spectra::engine::GateSpectra;

    fn channel(channel: Channel) -> ChannelSpectra {
        ChannelSpectra {
            channel,
            prt: 0.001,
            nyquist: 25.0,
            spectrum: vec![1.0; 4],
            time_power: vec![1.0; 4],
            phase_deg: vec![0.0; 4],
            moments: GateMoments::default(),
            filtered_moments: None,
            adaptive: None,
            regression: None,
        }
    }

    fn beam_spectra(az: f64, n_gates: usize) -> BeamSpectra {
        BeamSpectra {
            radar_name: "SPOL".into(),
            time: 0.0,
            az,
            el: 0.5,
            scan_type: ScanType::Ppi,
            mode: XmitRcvMode::SimHvFixedHv,
            staggered: None,
            n_samples: 4,
            prt: 0.001,
            nyquist: 25.0,
            start_range_km: 0.075,
            gate_spacing_km: 0.15,
            gates: (0..n_gates)
                .map(|gate| GateSpectra {
                    gate,
                    range_km: 0.075 + 0.15 * gate as f64,
                    channels: vec![channel(Channel::Hc), channel(Channel::Vc)],
                })
                .collect(),
        }
    }

    #[test]
    fn sector_across_north() {
        let region = Region {
            min_az: 350.0,
            max_az: 10.0,
            ..Default::default()
        };
        assert!(region.contains_beam(355.0, 0.5));
        assert!(region.contains_beam(5.0, 0.5));
        assert!(!region.contains_beam(180.0, 0.5));
        assert!(!region.contains_beam(5.0, 95.0));
    }

    #[test]
    fn gate_span_is_clamped() {
        let region = Region {
            min_range_km: 0.5,
            max_range_km: 1.0,
            ..Default::default()
        };
        // (0.5 - 0.075) / 0.15 = 2.83, (1.0 - 0.075) / 0.15 + 1 = 7.17
        assert_eq!(region.gate_span(0.075, 0.15, 100), Some(2..=7));
        assert_eq!(region.gate_span(0.075, 0.15, 5), Some(2..=4));
        assert_eq!(region.gate_span(0.075, 0.15, 2), None);
    }

    #[test]
    fn records_flatten_gates_and_channels() {
        let region = Region {
            max_range_km: 0.3,
            ..Default::default()
        };
        let records = SpectraRecord::from_beam(&beam_spectra(45.0, 10), &region);
        // gates 0..=2, two channels each
        assert_eq!(records.len(), 6);
        assert_eq!(records[1].label, "DP_SIM_HV_FIXED_HV_VC");
        assert_eq!(records[5].gate, 2);

        let outside = Region {
            min_az: 90.0,
            max_az: 100.0,
            ..Default::default()
        };
        assert!(SpectraRecord::from_beam(&beam_spectra(45.0, 10), &outside).is_empty());
    }
}
