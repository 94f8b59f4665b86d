use crate::beam::assembler::BeamAssembler;
use crate::beam::beam_data::Beam;
use crate::beam::polarization::PolarizationModeDetector;
use crate::beam::queue::{Eviction, PulseQueue};
use crate::beam::scan::ScanModeDetector;
use crate::beam::trigger::BeamTrigger;
use crate::prelude::{BeamConfig, BeamResult};
use crate::pulse_interface::{OpsInfo, PulseSource};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::sync::Arc;

/// Pull loop turning a pulse stream into beams.
pub struct BeamReader {
    config: BeamConfig,
    queue: PulseQueue,
    scan: ScanModeDetector,
    polarization: PolarizationModeDetector,
    trigger: BeamTrigger,
    assembler: BeamAssembler,
    ops: Option<Arc<OpsInfo>>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl BeamReader {
    pub fn new(config: BeamConfig) -> BeamResult<Self> {
        config.validate()?;
        Ok(Self {
            queue: PulseQueue::with_capacity(config.max_queue_len()),
            scan: ScanModeDetector::new(),
            polarization: PolarizationModeDetector::new(
                config.n_samples,
                config.stagger_ratios.clone(),
            ),
            trigger: BeamTrigger::new(&config),
            assembler: BeamAssembler::new(&config),
            ops: None,
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("beam_reader"),
            config,
        })
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn queue(&self) -> &PulseQueue {
        &self.queue
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Reads pulses until the next beam is ready. `Ok(None)` once the
    /// source is exhausted; source errors are passed through.
    pub fn next_beam<S: PulseSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> BeamResult<Option<Beam>> {
        let n_samples = self.config.n_samples;
        loop {
            let mut pulse = match source.next_pulse()? {
                Some(pulse) => pulse,
                None => return Ok(None),
            };
            if self.config.invert_hv_flag {
                pulse.horiz = !pulse.horiz;
            }
            self.metrics.record_pulse();

            if self.scan.observe(pulse.scan_mode) {
                let scan_type = self.scan.current();
                self.trigger.reset(scan_type);
                self.metrics.record_scan_transition();
                self.logger
                    .detail(&format!("scan type now {:?} at pulse {}", scan_type, pulse.seq_num));
            }
            if self.config.check_sequence_gaps && self.queue.sequence_gap_check(&pulse).is_some() {
                self.metrics.record_sequence_gap();
            }

            if let Eviction::Released(seq_num) = self.queue.push(Arc::new(pulse)) {
                self.logger
                    .detail(&format!("pulse {} left the queue while held by a beam", seq_num));
            }
            self.trigger.pulse_added();

            if self.queue.len() < n_samples + 1 {
                continue;
            }
            let detection = match self.polarization.detect(&self.queue) {
                Some(detection) => detection,
                None => continue,
            };
            let candidate = match self.trigger.evaluate(&self.queue, self.scan.current()) {
                Some(candidate) => candidate,
                None => continue,
            };

            let ops = self.ops_snapshot(source.ops_info());
            match self
                .assembler
                .assemble(&self.queue, &detection, &candidate, ops)
            {
                Some(beam) => {
                    self.trigger.commit(&candidate);
                    if candidate.forced {
                        self.metrics.record_forced_trigger();
                    }
                    self.metrics.record_beam();
                    self.logger.detail(&format!(
                        "beam az {:.2} el {:.2} mode {:?} gates {}",
                        beam.az, beam.el, beam.mode, beam.n_gates
                    ));
                    return Ok(Some(beam));
                }
                None => self.metrics.record_rejected(),
            }
        }
    }

    /// Shares one `OpsInfo` across beams until the source's changes.
    fn ops_snapshot(&mut self, current: &OpsInfo) -> Arc<OpsInfo> {
        match &self.ops {
            Some(ops) if **ops == *current => Arc::clone(ops),
            _ => {
                let ops = Arc::new(current.clone());
                self.ops = Some(Arc::clone(&ops));
                ops
            }
        }
    }
}
