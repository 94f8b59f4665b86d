use crate::beam::queue::PulseQueue;
use crate::prelude::{BeamConfig, ScanType};
use log::{debug, warn};

/// Azimuth folded into [0, 360).
pub fn condition_az(az: f64) -> f64 {
    let folded = az.rem_euclid(360.0);
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Elevation folded into [-180, 180).
pub fn condition_el(el: f64) -> f64 {
    let folded = (el + 180.0).rem_euclid(360.0) - 180.0;
    if folded >= 180.0 {
        -180.0
    } else {
        folded
    }
}

fn angle_diff(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs().rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// A proposed beam. It becomes the new trigger state only once `commit`
/// is called after the assembler accepted it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerCandidate {
    /// Queue index of the older centre pulse.
    pub mid_index1: usize,
    /// Queue index of the newer centre pulse.
    pub mid_index2: usize,
    pub az: f64,
    pub el: f64,
    pub az_index: Option<i64>,
    pub el_index: Option<i64>,
    pub scan_type: ScanType,
    pub indexed: bool,
    /// Fired by the timeout rather than a straddle.
    pub forced: bool,
}

/// Decides when the queue front holds a beam centred on the next
/// indexed angle.
pub struct BeamTrigger {
    n_samples: usize,
    index_beams: bool,
    resolution: f64,
    timeout: usize,
    pulses_since_beam: usize,
    prev_az_index: Option<i64>,
    prev_el_index: Option<i64>,
}

impl BeamTrigger {
    pub fn new(config: &BeamConfig) -> Self {
        // snap so a whole number of beams fits in 45 deg
        let steps = (45.0 / config.indexed_resolution).round().max(1.0);
        Self {
            n_samples: config.n_samples,
            index_beams: config.index_beams,
            resolution: 45.0 / steps,
            timeout: config.trigger_timeout(),
            pulses_since_beam: 0,
            prev_az_index: None,
            prev_el_index: None,
        }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn pulses_since_beam(&self) -> usize {
        self.pulses_since_beam
    }

    pub fn pulse_added(&mut self) {
        self.pulses_since_beam += 1;
    }

    /// Forgets the previous index for the given scan type.
    pub fn reset(&mut self, scan_type: ScanType) {
        match scan_type {
            ScanType::Ppi => self.prev_az_index = None,
            ScanType::Rhi => self.prev_el_index = None,
        }
    }

    pub fn commit(&mut self, candidate: &TriggerCandidate) {
        if candidate.indexed {
            if let Some(index) = candidate.az_index {
                self.prev_az_index = Some(index);
            }
            if let Some(index) = candidate.el_index {
                self.prev_el_index = Some(index);
            }
        }
        self.pulses_since_beam = 0;
    }

    pub fn evaluate(&self, queue: &PulseQueue, scan_type: ScanType) -> Option<TriggerCandidate> {
        let half = self.n_samples / 2;
        if half == 0 || queue.len() <= half {
            return None;
        }
        let mid_index1 = half;
        let mid_index2 = half - 1;

        if self.pulses_since_beam > self.timeout {
            warn!(
                "no beam after {} pulses, forcing trigger",
                self.pulses_since_beam
            );
            return self.centre_candidate(queue, scan_type, true);
        }
        if !self.index_beams {
            if self.pulses_since_beam >= self.n_samples {
                return self.centre_candidate(queue, scan_type, false);
            }
            return None;
        }

        let mid1 = queue.get(mid_index1)?;
        let mid2 = queue.get(mid_index2)?;
        let newest = queue.get(0)?;
        let res = self.resolution;
        let n_beams = (360.0 / res).round() as i64;

        match scan_type {
            ScanType::Ppi => {
                let mid_az1 = condition_az(mid1.az);
                let mid_az2 = condition_az(mid2.az);
                if angle_diff(mid_az1, mid_az2) > res {
                    return None;
                }
                let mut az_index = (mid_az1 / res + 0.5).floor() as i64;
                if az_index >= n_beams {
                    az_index = 0;
                }
                if self.prev_az_index == Some(az_index) {
                    return None;
                }
                let az = az_index as f64 * res;
                let straddles = (mid_az1 <= az && mid_az2 >= az)
                    || (mid_az1 >= az && mid_az2 <= az)
                    || (az_index == 0
                        && ((mid_az1 > 360.0 - res && mid_az2 < res)
                            || (mid_az1 < res && mid_az2 > 360.0 - res)));
                if !straddles {
                    return None;
                }
                debug!("ppi trigger at az {:.2} (index {})", az, az_index);
                Some(TriggerCandidate {
                    mid_index1,
                    mid_index2,
                    az,
                    el: condition_el(newest.el),
                    az_index: Some(az_index),
                    el_index: None,
                    scan_type,
                    indexed: true,
                    forced: false,
                })
            }
            ScanType::Rhi => {
                let mid_el1 = condition_el(mid1.el);
                let mid_el2 = condition_el(mid2.el);
                if angle_diff(mid_el1, mid_el2) > res {
                    return None;
                }
                let mut el_index = ((mid_el1 + 180.0) / res + 0.5).floor() as i64;
                if el_index >= n_beams {
                    el_index = 0;
                }
                if self.prev_el_index == Some(el_index) {
                    return None;
                }
                let el = -180.0 + el_index as f64 * res;
                let straddles =
                    (mid_el1 <= el && mid_el2 >= el) || (mid_el1 >= el && mid_el2 <= el);
                if !straddles {
                    return None;
                }
                debug!("rhi trigger at el {:.2} (index {})", el, el_index);
                Some(TriggerCandidate {
                    mid_index1,
                    mid_index2,
                    az: condition_az(newest.az),
                    el,
                    az_index: None,
                    el_index: Some(el_index),
                    scan_type,
                    indexed: true,
                    forced: false,
                })
            }
        }
    }

    fn centre_candidate(
        &self,
        queue: &PulseQueue,
        scan_type: ScanType,
        forced: bool,
    ) -> Option<TriggerCandidate> {
        let half = self.n_samples / 2;
        let centre = queue.get(half)?;
        Some(TriggerCandidate {
            mid_index1: half,
            mid_index2: half - 1,
            az: condition_az(centre.az),
            el: condition_el(centre.el),
            az_index: None,
            el_index: None,
            scan_type,
            indexed: false,
            forced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse_interface::Pulse;
    use num_complex::Complex32;
    use std::sync::Arc;

    fn config(n_samples: usize) -> BeamConfig {
        BeamConfig {
            n_samples,
            ..Default::default()
        }
    }

    /// Queue built from `(az, el)` pairs, oldest first.
    fn queue_from(angles: &[(f64, f64)]) -> PulseQueue {
        let mut queue = PulseQueue::with_capacity(40);
        for (seq, &(az, el)) in angles.iter().enumerate() {
            queue.push(Arc::new(Pulse::new(
                seq as u64,
                seq as f64,
                az,
                el,
                0.001,
                true,
                vec![vec![Complex32::new(1.0, 0.0); 4]],
            )));
        }
        queue
    }

    fn ppi(azimuths: &[f64]) -> PulseQueue {
        let angles: Vec<(f64, f64)> = azimuths.iter().map(|&az| (az, 0.5)).collect();
        queue_from(&angles)
    }

    #[test]
    fn conditioning_folds_angles() {
        assert!((condition_az(-10.0) - 350.0).abs() < 1e-9);
        assert!((condition_az(720.5) - 0.5).abs() < 1e-9);
        assert_eq!(condition_az(360.0), 0.0);
        assert!((condition_el(190.0) + 170.0).abs() < 1e-9);
        assert!((condition_el(-181.0) - 179.0).abs() < 1e-9);
    }

    #[test]
    fn resolution_snaps_to_divisor_of_45() {
        let trigger = BeamTrigger::new(&BeamConfig {
            indexed_resolution: 0.7,
            ..Default::default()
        });
        assert!((trigger.resolution() - 45.0 / 64.0).abs() < 1e-12);
    }

    #[test]
    fn ppi_straddle_fires_on_indexed_azimuth() {
        let queue = ppi(&[9.7, 10.0, 10.3, 10.6, 10.9, 11.2, 11.5, 11.8, 12.1]);
        let trigger = BeamTrigger::new(&config(8));
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(11));
        assert!((candidate.az - 11.0).abs() < 1e-9);
        assert!((candidate.el - 0.5).abs() < 1e-9);
        assert_eq!((candidate.mid_index1, candidate.mid_index2), (4, 3));
        assert!(candidate.indexed && !candidate.forced);
    }

    #[test]
    fn ppi_no_fire_before_target_is_reached() {
        let queue = ppi(&[9.1, 9.4, 9.7, 10.0, 10.3, 10.6, 10.9, 11.2, 11.5]);
        let trigger = BeamTrigger::new(&config(8));
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());
    }

    #[test]
    fn ppi_straddle_across_north() {
        let queue = ppi(&[358.5, 358.8, 359.1, 359.4, 359.7, 0.1, 0.4, 0.7, 1.0]);
        let trigger = BeamTrigger::new(&config(8));
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(0));
        assert_eq!(candidate.az, 0.0);
    }

    #[test]
    fn ppi_straddle_across_north_counter_clockwise() {
        let queue = ppi(&[1.5, 1.2, 0.9, 0.6, 0.3, 359.8, 359.5, 359.2, 358.9]);
        let trigger = BeamTrigger::new(&config(8));
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(0));
    }

    fn half_degree() -> BeamConfig {
        BeamConfig {
            n_samples: 8,
            indexed_resolution: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn half_degree_grid_fires_between_mid_pulses() {
        // mid pulses at 44.8 (older) and 45.3 (newer)
        let queue = ppi(&[42.8, 43.3, 43.8, 44.3, 44.8, 45.3, 45.8, 46.3, 46.8]);
        let mut trigger = BeamTrigger::new(&half_degree());
        assert_eq!(trigger.resolution(), 0.5);
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(90));
        assert!((candidate.az - 45.0).abs() < 1e-9);
        trigger.commit(&candidate);
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());

        // one pulse later the next half-degree index is straddled
        let queue = ppi(&[43.3, 43.8, 44.3, 44.8, 45.3, 45.8, 46.3, 46.8, 47.3]);
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(91));
        assert!((candidate.az - 45.5).abs() < 1e-9);
    }

    #[test]
    fn half_degree_grid_wraps_at_north() {
        // mid pulses at 359.8 (older) and 0.3 (newer)
        let queue = ppi(&[357.8, 358.3, 358.8, 359.3, 359.8, 0.3, 0.8, 1.3, 1.8]);
        let trigger = BeamTrigger::new(&half_degree());
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert_eq!(candidate.az_index, Some(0));
        assert_eq!(candidate.az, 0.0);

        // 359.8 -> 359.9 rounds to index 720 and wraps to 0 without crossing north
        let queue = ppi(&[359.4, 359.5, 359.6, 359.7, 359.8, 359.9, 0.0, 0.1, 0.2]);
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());
    }

    #[test]
    fn duplicate_index_is_suppressed_after_commit() {
        let queue = ppi(&[9.7, 10.0, 10.3, 10.6, 10.9, 11.2, 11.5, 11.8, 12.1]);
        let mut trigger = BeamTrigger::new(&config(8));
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_some());
        trigger.commit(&candidate);
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());

        trigger.reset(ScanType::Ppi);
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_some());
    }

    #[test]
    fn large_azimuth_jump_is_rejected() {
        let queue = ppi(&[9.0, 9.0, 9.0, 9.0, 10.9, 13.2, 13.5, 13.8, 14.1]);
        let trigger = BeamTrigger::new(&config(8));
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());
    }

    #[test]
    fn rhi_straddle_fires_on_indexed_elevation() {
        let angles: Vec<(f64, f64)> = [4.6, 4.9, 5.2, 5.5, 5.8, 6.1, 6.4, 6.7, 7.0]
            .iter()
            .map(|&el| (123.0, el))
            .collect();
        let queue = queue_from(&angles);
        let trigger = BeamTrigger::new(&config(8));
        let candidate = trigger.evaluate(&queue, ScanType::Rhi).unwrap();
        assert_eq!(candidate.el_index, Some(186));
        assert!((candidate.el - 6.0).abs() < 1e-9);
        assert!((candidate.az - 123.0).abs() < 1e-9);
        assert_eq!(candidate.scan_type, ScanType::Rhi);
    }

    #[test]
    fn stationary_antenna_forces_trigger_after_timeout() {
        let queue = ppi(&[50.3; 9]);
        let mut trigger = BeamTrigger::new(&config(8));
        for _ in 0..128 {
            trigger.pulse_added();
        }
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());
        trigger.pulse_added();
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert!(candidate.forced);
        assert!(!candidate.indexed);
        assert!((candidate.az - 50.3).abs() < 1e-9);

        trigger.commit(&candidate);
        assert_eq!(trigger.pulses_since_beam(), 0);
    }

    #[test]
    fn non_indexed_fires_every_n_samples() {
        let queue = ppi(&[50.3; 9]);
        let mut trigger = BeamTrigger::new(&BeamConfig {
            n_samples: 8,
            index_beams: false,
            ..Default::default()
        });
        for _ in 0..7 {
            trigger.pulse_added();
        }
        assert!(trigger.evaluate(&queue, ScanType::Ppi).is_none());
        trigger.pulse_added();
        let candidate = trigger.evaluate(&queue, ScanType::Ppi).unwrap();
        assert!(!candidate.indexed && !candidate.forced);
    }
}
