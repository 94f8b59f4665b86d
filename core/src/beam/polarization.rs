use crate::beam::queue::PulseQueue;
use crate::prelude::{default_stagger_ratios, StaggerRatio};
use log::warn;
use serde::{Deserialize, Serialize};

const PRT_TOLERANCE: f64 = 1.0e-5;

/// Staggered-PRT parameters for one beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaggeredPrt {
    pub m: u32,
    pub n: u32,
    pub prt_short: f64,
    pub prt_long: f64,
    pub n_gates_short: usize,
    pub n_gates_long: usize,
}

impl StaggeredPrt {
    pub fn n_gates(&self) -> usize {
        self.n_gates_short.max(self.n_gates_long)
    }

    pub fn scale_prts(&mut self, ratio: f64) {
        self.prt_short *= ratio;
        self.prt_long *= ratio;
    }
}

/// Pulse pattern in force over the candidate window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PolarizationMode {
    SinglePol,
    AlternatingHv,
    StaggeredPrt(StaggeredPrt),
}

impl PolarizationMode {
    pub fn staggered(&self) -> Option<&StaggeredPrt> {
        match self {
            PolarizationMode::StaggeredPrt(stag) => Some(stag),
            _ => None,
        }
    }
}

/// Detected mode plus the number of newest pulses to skip so the beam
/// starts on the right pulse (H transmit, or short PRT).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDetection {
    pub mode: PolarizationMode,
    pub offset: usize,
}

/// Classifies the newest `n_samples + 1` queued pulses.
pub struct PolarizationModeDetector {
    n_samples: usize,
    ratios: Vec<StaggerRatio>,
}

impl PolarizationModeDetector {
    pub fn new(n_samples: usize, ratios: Vec<StaggerRatio>) -> Self {
        let ratios = if ratios.is_empty() {
            default_stagger_ratios()
        } else {
            ratios
        };
        Self { n_samples, ratios }
    }

    /// `None` until `n_samples + 1` pulses are queued.
    pub fn detect(&self, queue: &PulseQueue) -> Option<ModeDetection> {
        let window_len = self.n_samples + 1;
        if queue.len() < window_len || self.n_samples < 2 {
            return None;
        }
        if let Some(detection) = self.check_alternating(queue, window_len) {
            return Some(detection);
        }
        if let Some(detection) = self.check_staggered(queue, window_len) {
            return Some(detection);
        }
        Some(ModeDetection {
            mode: PolarizationMode::SinglePol,
            offset: 0,
        })
    }

    fn check_alternating(&self, queue: &PulseQueue, window_len: usize) -> Option<ModeDetection> {
        let mut prev_horiz = queue.get(0)?.horiz;
        for index in 1..window_len {
            let horiz = queue.get(index)?.horiz;
            if horiz == prev_horiz {
                return None;
            }
            prev_horiz = horiz;
        }

        // The beam is read back in time from the queue front and holds an
        // even number of pulses, so it starts on H only if the front is V.
        let starts_on_horiz = !queue.get(0)?.horiz;
        Some(ModeDetection {
            mode: PolarizationMode::AlternatingHv,
            offset: if starts_on_horiz { 0 } else { 1 },
        })
    }

    fn check_staggered(&self, queue: &PulseQueue, window_len: usize) -> Option<ModeDetection> {
        let pulse0 = queue.get(0)?;
        let pulse1 = queue.get(1)?;
        let (prt0, prt1) = (pulse0.prt, pulse1.prt);
        if (prt0 - prt1).abs() < PRT_TOLERANCE {
            return None;
        }
        for index in 2..window_len {
            let pulse = queue.get(index)?;
            let (prt, n_gates) = if index % 2 == 0 {
                (prt0, pulse0.n_gates)
            } else {
                (prt1, pulse1.n_gates)
            };
            if (pulse.prt - prt).abs() > PRT_TOLERANCE || pulse.n_gates != n_gates {
                return None;
            }
        }

        // The recorded PRT is the interval from the previous pulse, so the
        // short-PRT pulse carries the longer recorded PRT.
        let (stag, front_is_short) = if prt0 > prt1 {
            (
                StaggeredPrt {
                    m: 0,
                    n: 0,
                    prt_short: prt1,
                    prt_long: prt0,
                    n_gates_short: pulse0.n_gates,
                    n_gates_long: pulse1.n_gates,
                },
                true,
            )
        } else {
            (
                StaggeredPrt {
                    m: 0,
                    n: 0,
                    prt_short: prt0,
                    prt_long: prt1,
                    n_gates_short: pulse1.n_gates,
                    n_gates_long: pulse0.n_gates,
                },
                false,
            )
        };
        let (m, n) = self.stagger_ratio(stag.prt_short, stag.prt_long);

        // the oldest beam pulse has the opposite parity to the window front
        Some(ModeDetection {
            mode: PolarizationMode::StaggeredPrt(StaggeredPrt { m, n, ..stag }),
            offset: if front_is_short { 1 } else { 0 },
        })
    }

    /// M/N stagger for the PRT pair. Unknown ratios fall back to 2/3.
    pub fn stagger_ratio(&self, prt_short: f64, prt_long: f64) -> (u32, u32) {
        let prt_ratio = prt_short / prt_long;
        let ratio60 = (prt_ratio * 60.0 + 0.5).floor() as i64;
        if let Some(entry) = self
            .ratios
            .iter()
            .find(|entry| entry.ratio60 as i64 == ratio60)
        {
            return (entry.m, entry.n);
        }
        warn!(
            "no support for staggered prt ratio {:.4}, assuming 2/3 stagger",
            prt_ratio
        );
        (2, 3)
    }
}
