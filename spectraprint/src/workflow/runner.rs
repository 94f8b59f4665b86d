use crate::output::ascii::AsciiWriter;
use crate::output::bridge::SpectraBridge;
use crate::output::json::JsonLinesWriter;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use serde::Serialize;
use tsbeam::prelude::{ScanType, XmitRcvMode};
use tsbeam::pulse_interface::PulseSource;
use tsbeam::spectra::{BeamSpectra, SpectraRecord};
use tsbeam::telemetry::{LogManager, MetricsSnapshot};
use tsbeam::{Beam, BeamReader, GateDeinterleaver, SpectralMomentEngine};

/// What the bridge shows for one processed beam.
#[derive(Debug, Clone, Serialize)]
pub struct BeamSummary {
    pub time: f64,
    pub az: f64,
    pub el: f64,
    pub scan_type: ScanType,
    /// Mode the gates were de-interleaved with.
    pub mode: XmitRcvMode,
    pub staggered: bool,
    pub indexed: bool,
    pub forced: bool,
    pub n_samples: usize,
    pub n_gates: usize,
    pub nyquist: f64,
    pub records: usize,
}

impl BeamSummary {
    fn new(beam: &Beam, spectra: &BeamSpectra, records: usize) -> Self {
        Self {
            time: beam.time,
            az: beam.az,
            el: beam.el,
            scan_type: beam.scan_type,
            mode: spectra.mode,
            staggered: spectra.staggered.is_some(),
            indexed: beam.indexed,
            forced: beam.forced,
            n_samples: beam.n_samples(),
            n_gates: beam.n_gates,
            nyquist: beam.nyquist,
            records,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub beams: usize,
    pub records: usize,
    pub files: usize,
    pub metrics: MetricsSnapshot,
}

/// Pulls beams from a source and writes the spectra of each one.
pub struct Runner {
    config: WorkflowConfig,
    reader: BeamReader,
    deinterleaver: GateDeinterleaver,
    engine: SpectralMomentEngine,
    ascii: Option<AsciiWriter>,
    json: Option<JsonLinesWriter>,
    logger: LogManager,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let reader = BeamReader::new(config.beam.clone()).context("creating beam reader")?;
        let deinterleaver = GateDeinterleaver::new(config.beam.xmit_rcv_mode);
        let engine = SpectralMomentEngine::new(&config.beam, config.calibration.clone());
        let ascii = config
            .output
            .ascii_dir
            .as_ref()
            .map(|dir| AsciiWriter::new(dir, &config.output));
        let json = match config.output.json_path.as_ref() {
            Some(path) => Some(JsonLinesWriter::create(path)?),
            None => None,
        };
        Ok(Self {
            config,
            reader,
            deinterleaver,
            engine,
            ascii,
            json,
            logger: LogManager::new("spectraprint"),
        })
    }

    pub fn run<S: PulseSource + ?Sized>(
        &mut self,
        source: &mut S,
        bridge: Option<&SpectraBridge>,
    ) -> anyhow::Result<RunSummary> {
        let mut beams = 0;
        let mut records = 0;
        let mut files = 0;

        while let Some(beam) = self
            .reader
            .next_beam(source)
            .context("reading pulse stream")?
        {
            let mode = self.deinterleaver.effective_mode(&beam);
            let gates = self.deinterleaver.load(&beam);
            let spectra = self
                .engine
                .process(&beam, gates, mode)
                .with_context(|| format!("computing spectra at az {:.2} el {:.2}", beam.az, beam.el))?;

            let beam_records = SpectraRecord::from_beam(&spectra, &self.config.region);
            for record in &beam_records {
                if let Some(ascii) = self.ascii.as_ref() {
                    ascii.write(record)?;
                    files += 1;
                }
                if let Some(json) = self.json.as_mut() {
                    json.write(record)?;
                }
            }
            records += beam_records.len();
            beams += 1;

            if let Some(bridge) = bridge {
                bridge.publish(
                    BeamSummary::new(&beam, &spectra, beam_records.len()),
                    self.reader.metrics(),
                );
            }
            if self.config.output.max_beams.map_or(false, |max| beams >= max) {
                self.logger.record(&format!("stopping after {} beams", beams));
                break;
            }
        }

        if let Some(json) = self.json.as_mut() {
            json.flush()?;
            self.logger
                .detail(&format!("{} records in the spectra stream", json.written()));
        }
        let metrics = self.reader.metrics();
        self.logger.record(&format!(
            "{} beams, {} records, {} pulses, {} rejected, {} sequence gaps",
            beams, records, metrics.pulses, metrics.rejected, metrics.sequence_gaps
        ));
        Ok(RunSummary {
            beams,
            records,
            files,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_pulse_stream, sim_ops, GeneratorConfig, Scenario};
    use tsbeam::pulse_interface::VecPulseSource;
    use tsbeam::spectra::Region;

    #[test]
    fn runner_writes_ascii_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = WorkflowConfig::from_args(16, XmitRcvMode::SinglePol);
        cfg.region = Region {
            max_range_km: 0.3,
            ..Default::default()
        };
        cfg.output.ascii_dir = Some(dir.path().join("ascii"));
        cfg.output.json_path = Some(dir.path().join("spectra.jsonl"));
        cfg.output.max_beams = Some(3);

        let generator = GeneratorConfig {
            n_pulses: 400,
            n_gates: 10,
            scan_step: 0.1,
            ..Default::default()
        };
        let ops = sim_ops();
        let pulses = build_pulse_stream(&generator, &ops).unwrap();
        let mut source = VecPulseSource::new(ops, pulses);

        let bridge = SpectraBridge::new();
        let mut runner = Runner::new(cfg).unwrap();
        let summary = runner.run(&mut source, Some(&bridge)).unwrap();

        assert_eq!(summary.beams, 3);
        // gates 0..=2 with the default 0.075 km start and 0.15 km spacing
        assert_eq!(summary.records, 9);
        assert_eq!(summary.files, 9);
        let text = std::fs::read_to_string(dir.path().join("spectra.jsonl")).unwrap();
        assert_eq!(text.lines().count(), 9);
        assert_eq!(bridge.snapshot().beams.len(), 3);
        assert!(source.remaining() > 0);
    }

    #[test]
    fn alternating_stream_reports_all_channels() {
        let cfg = WorkflowConfig::from_args(16, XmitRcvMode::AltHvCoCross);
        let generator = GeneratorConfig {
            scenario: Scenario::Alternating,
            n_pulses: 200,
            n_gates: 4,
            scan_step: 0.1,
            ..Default::default()
        };
        let ops = sim_ops();
        let pulses = build_pulse_stream(&generator, &ops).unwrap();
        let mut source = VecPulseSource::new(ops, pulses);

        let bridge = SpectraBridge::new();
        let mut runner = Runner::new(cfg).unwrap();
        let summary = runner.run(&mut source, Some(&bridge)).unwrap();
        assert!(summary.beams >= 10);
        // four channels per gate
        assert_eq!(summary.records, summary.beams * 4 * 4);
        assert_eq!(summary.files, 0);
        let model = bridge.snapshot();
        assert!(model.beams.iter().all(|b| b.mode == XmitRcvMode::AltHvCoCross));
        assert_eq!(model.metrics.beams, summary.beams);
    }
}
