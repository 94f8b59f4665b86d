use crate::prelude::Channel;
use serde::{Deserialize, Serialize};

/// Operating parameters from the time-series info stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsInfo {
    pub radar_name: String,
    pub wavelength_cm: f64,
    pub start_range_km: f64,
    pub gate_spacing_km: f64,
}

impl Default for OpsInfo {
    fn default() -> Self {
        Self {
            radar_name: "unknown".into(),
            wavelength_cm: 10.7,
            start_range_km: 0.075,
            gate_spacing_km: 0.15,
        }
    }
}

impl OpsInfo {
    pub fn wavelength_m(&self) -> f64 {
        self.wavelength_cm / 100.0
    }

    /// Nyquist velocity for a given PRT, m/s.
    pub fn nyquist(&self, prt: f64) -> f64 {
        if prt <= 0.0 {
            return 0.0;
        }
        (self.wavelength_m() / prt) / 4.0
    }

    pub fn range_km(&self, gate: usize) -> f64 {
        self.start_range_km + gate as f64 * self.gate_spacing_km
    }
}

/// Calibration for one receiver channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCalib {
    /// Noise power as seen in the IQ data, dBm.
    pub noise_dbm: f64,
    pub receiver_gain_db: f64,
    pub base_dbz_1km: f64,
}

impl Default for ChannelCalib {
    fn default() -> Self {
        Self {
            noise_dbm: -77.0,
            receiver_gain_db: 37.0,
            base_dbz_1km: -48.0,
        }
    }
}

/// Receiver calibration, one entry per logical channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub hc: ChannelCalib,
    pub vc: ChannelCalib,
    pub hx: ChannelCalib,
    pub vx: ChannelCalib,
}

impl Calibration {
    pub fn channel(&self, channel: Channel) -> &ChannelCalib {
        match channel {
            Channel::Hc => &self.hc,
            Channel::Vc => &self.vc,
            Channel::Hx => &self.hx,
            Channel::Vx => &self.vx,
        }
    }

    /// Linear noise power in IQ units for the channel.
    pub fn noise_power(&self, channel: Channel) -> f64 {
        10f64.powf(self.channel(channel).noise_dbm / 10.0)
    }
}
