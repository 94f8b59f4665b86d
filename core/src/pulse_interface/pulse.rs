use crate::prelude::ScanType;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Scan mode declared in the pulse header, after the IWRF scan modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Ppi,
    Sector,
    Rhi,
    ManualRhi,
    VerticalPointing,
    Other,
}

impl ScanMode {
    /// Scan type used for beam indexing.
    pub fn scan_type(&self) -> ScanType {
        match self {
            ScanMode::Rhi | ScanMode::ManualRhi | ScanMode::VerticalPointing => ScanType::Rhi,
            _ => ScanType::Ppi,
        }
    }
}

/// One received pulse: header plus one complex sample per gate and channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pulse {
    pub seq_num: u64,
    /// Seconds since the epoch.
    pub time: f64,
    pub az: f64,
    pub el: f64,
    /// Interval from the previous pulse to this one, secs.
    pub prt: f64,
    pub n_gates: usize,
    /// H transmit when true.
    pub horiz: bool,
    #[serde(default)]
    pub scan_mode: ScanMode,
    /// Receiver channels; channel 0 is always present.
    pub channels: Vec<Vec<Complex32>>,
}

impl Pulse {
    pub fn new(
        seq_num: u64,
        time: f64,
        az: f64,
        el: f64,
        prt: f64,
        horiz: bool,
        channels: Vec<Vec<Complex32>>,
    ) -> Self {
        let n_gates = channels.first().map(|chan| chan.len()).unwrap_or(0);
        Self {
            seq_num,
            time,
            az,
            el,
            prt,
            n_gates,
            horiz,
            scan_mode: ScanMode::Ppi,
            channels,
        }
    }

    pub fn with_scan_mode(mut self, scan_mode: ScanMode) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    pub fn channel(&self, index: usize) -> Option<&[Complex32]> {
        self.channels.get(index).map(|chan| chan.as_slice())
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Channel 0 holds at least `n_gates` samples.
    pub fn is_complete(&self) -> bool {
        self.channel(0)
            .map(|chan| !chan.is_empty() && chan.len() >= self.n_gates)
            .unwrap_or(false)
    }
}
