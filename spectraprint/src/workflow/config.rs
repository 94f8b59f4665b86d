use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tsbeam::prelude::{BeamConfig, XmitRcvMode};
use tsbeam::pulse_interface::Calibration;
use tsbeam::spectra::Region;

/// Where and how the spectra get written.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the per-day ASCII spectra directories.
    pub ascii_dir: Option<PathBuf>,
    pub include_time_in_file_name: bool,
    pub include_elevation_in_file_name: bool,
    pub include_azimuth_in_file_name: bool,
    pub include_range_in_file_name: bool,
    /// JSON-lines file receiving one record per gate and channel.
    pub json_path: Option<PathBuf>,
    /// Stop after this many beams.
    pub max_beams: Option<usize>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            ascii_dir: None,
            include_time_in_file_name: true,
            include_elevation_in_file_name: true,
            include_azimuth_in_file_name: true,
            include_range_in_file_name: true,
            json_path: None,
            max_beams: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub beam: BeamConfig,
    pub calibration: Calibration,
    pub region: Region,
    pub output: OutputConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(n_samples: usize, mode: XmitRcvMode) -> Self {
        let mut config = Self::default();
        config.beam.n_samples = n_samples;
        config.beam.xmit_rcv_mode = mode;
        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.beam.validate().context("validating beam config")?;
        anyhow::ensure!(
            self.region.min_el <= self.region.max_el,
            "region min_el {} exceeds max_el {}",
            self.region.min_el,
            self.region.max_el
        );
        anyhow::ensure!(
            self.region.min_range_km <= self.region.max_range_km,
            "region min_range_km {} exceeds max_range_km {}",
            self.region.min_range_km,
            self.region.max_range_km
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_beam() {
        let cfg = WorkflowConfig::from_args(32, XmitRcvMode::AltHvCoCross);
        assert_eq!(cfg.beam.n_samples, 32);
        assert_eq!(cfg.beam.xmit_rcv_mode, XmitRcvMode::AltHvCoCross);
        cfg.validate().unwrap();
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"beam:\n  n_samples: 32\n  xmit_rcv_mode: sim_hv_fixed_hv\n  indexed_resolution: 0.5\n\
calibration:\n  hc:\n    noise_dbm: -80.0\n\
region:\n  min_az: 350.0\n  max_az: 10.0\n\
output:\n  include_time_in_file_name: false\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.beam.n_samples, 32);
        assert_eq!(cfg.beam.xmit_rcv_mode, XmitRcvMode::SimHvFixedHv);
        assert_eq!(cfg.beam.window, BeamConfig::default().window);
        assert_eq!(cfg.calibration.hc.noise_dbm, -80.0);
        assert_eq!(cfg.calibration.vc.noise_dbm, -77.0);
        assert!(cfg.region.contains_beam(355.0, 0.5));
        assert!(!cfg.output.include_time_in_file_name);
        assert!(cfg.output.include_range_in_file_name);
    }

    #[test]
    fn odd_sample_count_is_rejected() {
        let cfg = WorkflowConfig::from_args(33, XmitRcvMode::SinglePol);
        assert!(cfg.validate().is_err());
    }
}
