use serde::{Deserialize, Serialize};

/// Angle the beams are indexed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    /// Azimuth-indexed sweeps.
    Ppi,
    /// Elevation-indexed sweeps.
    Rhi,
}

/// Transmit/receive polarization scheme, mirroring the IWRF `xmit_rcv_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XmitRcvMode {
    SinglePol,
    AltHvCoOnly,
    AltHvCoCross,
    AltHvFixedHv,
    SimHvFixedHv,
    SimHvSwitchedHv,
    HOnlyFixedHv,
    VOnlyFixedHv,
}

impl XmitRcvMode {
    /// True for the modes that alternate H and V transmit pulse by pulse.
    pub fn is_alternating(&self) -> bool {
        matches!(
            self,
            XmitRcvMode::AltHvCoOnly | XmitRcvMode::AltHvCoCross | XmitRcvMode::AltHvFixedHv
        )
    }

    /// Logical channels filled by the de-interleaver.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            XmitRcvMode::SinglePol => &[Channel::Hc],
            XmitRcvMode::AltHvCoOnly | XmitRcvMode::SimHvFixedHv | XmitRcvMode::SimHvSwitchedHv => {
                &[Channel::Hc, Channel::Vc]
            }
            XmitRcvMode::AltHvCoCross | XmitRcvMode::AltHvFixedHv => {
                &[Channel::Hc, Channel::Vc, Channel::Hx, Channel::Vx]
            }
            XmitRcvMode::HOnlyFixedHv => &[Channel::Hc, Channel::Vx],
            XmitRcvMode::VOnlyFixedHv => &[Channel::Vc, Channel::Hx],
        }
    }

    /// Per-gate series length for a beam of `n_samples` pulses.
    pub fn series_len(&self, n_samples: usize) -> usize {
        if self.is_alternating() {
            n_samples / 2
        } else {
            n_samples
        }
    }

    /// Mode used for staggered-PRT beams, which have no alternating variant.
    pub fn staggered_equivalent(&self) -> XmitRcvMode {
        if self.is_alternating() {
            XmitRcvMode::SinglePol
        } else {
            *self
        }
    }

    /// Upper-case tag used in output labels.
    pub fn label(&self) -> &'static str {
        match self {
            XmitRcvMode::SinglePol => "SINGLE_POL",
            XmitRcvMode::AltHvCoOnly => "DP_ALT_HV_CO_ONLY",
            XmitRcvMode::AltHvCoCross => "DP_ALT_HV_CO_CROSS",
            XmitRcvMode::AltHvFixedHv => "DP_ALT_HV_FIXED_HV",
            XmitRcvMode::SimHvFixedHv => "DP_SIM_HV_FIXED_HV",
            XmitRcvMode::SimHvSwitchedHv => "DP_SIM_HV_SWITCHED_HV",
            XmitRcvMode::HOnlyFixedHv => "DP_H_ONLY_FIXED_HV",
            XmitRcvMode::VOnlyFixedHv => "DP_V_ONLY_FIXED_HV",
        }
    }
}

/// Logical polarization channel of a gate time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Hc,
    Vc,
    Hx,
    Vx,
}

impl Channel {
    pub fn suffix(&self) -> &'static str {
        match self {
            Channel::Hc => "HC",
            Channel::Vc => "VC",
            Channel::Hx => "HX",
            Channel::Vx => "VX",
        }
    }
}

/// Window applied before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Rect,
    Vonhann,
    Blackman,
}

/// One entry of the staggered-PRT ratio table, keyed on
/// `round(prt_short / prt_long * 60)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaggerRatio {
    pub ratio60: u32,
    pub m: u32,
    pub n: u32,
}

/// Default stagger table: 2/3, 3/4 and 4/5.
pub fn default_stagger_ratios() -> Vec<StaggerRatio> {
    vec![
        StaggerRatio { ratio60: 40, m: 2, n: 3 },
        StaggerRatio { ratio60: 45, m: 3, n: 4 },
        StaggerRatio { ratio60: 48, m: 4, n: 5 },
    ]
}

/// Configuration shared by the beam reader, the de-interleaver and the
/// moment engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Pulses per beam. Must be even.
    pub n_samples: usize,
    pub index_beams: bool,
    /// Angular resolution of the beam grid, deg.
    pub indexed_resolution: f64,
    pub xmit_rcv_mode: XmitRcvMode,
    pub check_sequence_gaps: bool,
    pub invert_hv_flag: bool,
    pub override_primary_prt: bool,
    pub primary_prt_secs: f64,
    pub stagger_ratios: Vec<StaggerRatio>,
    pub window: WindowType,
    pub regression_order: usize,
    pub regression_interp_across_notch: bool,
    /// Width of the adaptive-filter clutter notch, in spectral bins.
    pub clutter_notch_width: usize,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            n_samples: 64,
            index_beams: true,
            indexed_resolution: 1.0,
            xmit_rcv_mode: XmitRcvMode::SinglePol,
            check_sequence_gaps: false,
            invert_hv_flag: false,
            override_primary_prt: false,
            primary_prt_secs: 0.001,
            stagger_ratios: default_stagger_ratios(),
            window: WindowType::Vonhann,
            regression_order: 3,
            regression_interp_across_notch: true,
            clutter_notch_width: 3,
        }
    }
}

impl BeamConfig {
    pub fn validate(&self) -> BeamResult<()> {
        if self.n_samples < 4 || self.n_samples % 2 != 0 {
            return Err(BeamError::InvalidConfig(format!(
                "n_samples must be even and at least 4, got {}",
                self.n_samples
            )));
        }
        if !(self.indexed_resolution > 0.0 && self.indexed_resolution <= 45.0) {
            return Err(BeamError::InvalidConfig(format!(
                "indexed_resolution must be in (0, 45], got {}",
                self.indexed_resolution
            )));
        }
        if self.override_primary_prt && self.primary_prt_secs <= 0.0 {
            return Err(BeamError::InvalidConfig(
                "primary_prt_secs must be positive".into(),
            ));
        }
        if self.regression_order + 1 > self.n_samples / 2 {
            return Err(BeamError::InvalidConfig(format!(
                "regression_order {} too high for {} samples",
                self.regression_order, self.n_samples
            )));
        }
        Ok(())
    }

    /// Bound on the pulse queue.
    pub fn max_queue_len(&self) -> usize {
        self.n_samples * 5
    }

    /// Pulses without a beam after which a trigger is forced.
    pub fn trigger_timeout(&self) -> usize {
        self.n_samples * 16
    }
}

/// Common error type for the beam pipeline.
///
/// Data-quality problems never surface here; they are reported as
/// "not ready" through `Option` returns.
#[derive(thiserror::Error, Debug)]
pub enum BeamError {
    #[error("pulse source failure: {0}")]
    Source(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("dsp failure: {0}")]
    Dsp(String),
}

pub type BeamResult<T> = Result<T, BeamError>;
