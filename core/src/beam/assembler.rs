use crate::beam::beam_data::Beam;
use crate::beam::polarization::{ModeDetection, PolarizationMode};
use crate::beam::queue::PulseQueue;
use crate::beam::trigger::TriggerCandidate;
use crate::prelude::BeamConfig;
use crate::pulse_interface::OpsInfo;
use log::debug;
use std::sync::Arc;

const PRT_TOLERANCE: f64 = 1.0e-5;

/// Cuts a beam out of the queue once a trigger has fired.
pub struct BeamAssembler {
    n_samples: usize,
    override_primary_prt: bool,
    primary_prt_secs: f64,
}

impl BeamAssembler {
    pub fn new(config: &BeamConfig) -> Self {
        Self {
            n_samples: config.n_samples,
            override_primary_prt: config.override_primary_prt,
            primary_prt_secs: config.primary_prt_secs,
        }
    }

    /// Builds the beam, or `None` when the window fails a consistency
    /// check. The queue is never modified.
    pub fn assemble(
        &self,
        queue: &PulseQueue,
        detection: &ModeDetection,
        candidate: &TriggerCandidate,
        ops: Arc<OpsInfo>,
    ) -> Option<Beam> {
        let pulses = queue.window(detection.offset, self.n_samples)?;
        if let Some(bad) = pulses.iter().find(|pulse| !pulse.is_complete()) {
            debug!("pulse {} is incomplete, skipping beam", bad.seq_num);
            return None;
        }

        let (mode, prt, n_gates, nyquist) = match detection.mode {
            PolarizationMode::StaggeredPrt(mut stag) => {
                if self.override_primary_prt && stag.prt_short > 0.0 {
                    stag.scale_prts(self.primary_prt_secs / stag.prt_short);
                }
                let nyquist = ops.nyquist(stag.prt_short) * stag.m as f64;
                (
                    PolarizationMode::StaggeredPrt(stag),
                    stag.prt_short,
                    stag.n_gates(),
                    nyquist,
                )
            }
            mode => {
                let first = pulses.first()?;
                let even_gates = first.n_gates;
                let odd_gates = pulses.get(1).map(|pulse| pulse.n_gates).unwrap_or(even_gates);
                for (position, pulse) in pulses.iter().enumerate() {
                    let expected = if position % 2 == 0 { even_gates } else { odd_gates };
                    if pulse.n_gates != expected {
                        debug!(
                            "gate count changes within beam at pulse {}, skipping",
                            pulse.seq_num
                        );
                        return None;
                    }
                    if (pulse.prt - first.prt).abs() > PRT_TOLERANCE {
                        debug!("prt changes within beam at pulse {}, skipping", pulse.seq_num);
                        return None;
                    }
                }
                let prt = if self.override_primary_prt {
                    self.primary_prt_secs
                } else {
                    first.prt
                };
                (mode, prt, even_gates.min(odd_gates), ops.nyquist(prt))
            }
        };

        Some(Beam::new(
            pulses,
            ops,
            candidate.scan_type,
            candidate.az,
            candidate.el,
            mode,
            prt,
            n_gates,
            nyquist,
            candidate.indexed,
            candidate.forced,
        ))
    }
}
