use crate::beam::polarization::{PolarizationMode, StaggeredPrt};
use crate::prelude::ScanType;
use crate::pulse_interface::{OpsInfo, Pulse};
use num_complex::Complex32;
use std::sync::Arc;

/// A fixed-length run of pulses centred on one trigger angle.
///
/// The beam shares its pulses with the queue; they stay alive for as
/// long as the beam does.
#[derive(Debug, Clone)]
pub struct Beam {
    pulses: Vec<Arc<Pulse>>,
    ops: Arc<OpsInfo>,
    pub scan_type: ScanType,
    pub az: f64,
    pub el: f64,
    /// Time of the centre pulse, secs.
    pub time: f64,
    pub mode: PolarizationMode,
    /// Beam PRT; the short PRT when staggered.
    pub prt: f64,
    pub n_gates: usize,
    pub nyquist: f64,
    pub indexed: bool,
    pub forced: bool,
}

impl Beam {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        pulses: Vec<Arc<Pulse>>,
        ops: Arc<OpsInfo>,
        scan_type: ScanType,
        az: f64,
        el: f64,
        mode: PolarizationMode,
        prt: f64,
        n_gates: usize,
        nyquist: f64,
        indexed: bool,
        forced: bool,
    ) -> Self {
        let time = pulses
            .get(pulses.len() / 2)
            .map(|pulse| pulse.time)
            .unwrap_or(0.0);
        Self {
            pulses,
            ops,
            scan_type,
            az,
            el,
            time,
            mode,
            prt,
            n_gates,
            nyquist,
            indexed,
            forced,
        }
    }

    /// Pulses oldest first.
    pub fn pulses(&self) -> &[Arc<Pulse>] {
        &self.pulses
    }

    pub fn n_samples(&self) -> usize {
        self.pulses.len()
    }

    pub fn ops(&self) -> &OpsInfo {
        &self.ops
    }

    pub fn staggered(&self) -> Option<&StaggeredPrt> {
        self.mode.staggered()
    }

    pub fn is_alternating(&self) -> bool {
        matches!(self.mode, PolarizationMode::AlternatingHv)
    }

    pub fn start_seq(&self) -> Option<u64> {
        self.pulses.first().map(|pulse| pulse.seq_num)
    }

    /// Channel 0 of every pulse.
    pub fn chan0(&self) -> Vec<&[Complex32]> {
        self.pulses
            .iter()
            .map(|pulse| pulse.channel(0).unwrap_or(&[]))
            .collect()
    }

    /// Channel 1 of every pulse, when every pulse carries one.
    pub fn chan1(&self) -> Option<Vec<&[Complex32]>> {
        self.pulses.iter().map(|pulse| pulse.channel(1)).collect()
    }

    pub fn mean_prf(&self) -> f64 {
        let mean_prt = match self.staggered() {
            Some(stag) => (stag.prt_short + stag.prt_long) / 2.0,
            None => self.prt,
        };
        if mean_prt > 0.0 {
            1.0 / mean_prt
        } else {
            0.0
        }
    }
}
