use crate::workflow::config::OutputConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tsbeam::spectra::SpectraRecord;

/// Beam time in UTC; `time` is unix seconds.
pub fn beam_time(time: f64) -> anyhow::Result<DateTime<Utc>> {
    let secs = time.floor();
    let nanos = (((time - secs) * 1.0e9) as u32).min(999_999_999);
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .with_context(|| format!("beam time {} out of range", time))
}

/// Writes one text file per gate and channel under a per-day directory.
pub struct AsciiWriter {
    root: PathBuf,
    include_time: bool,
    include_elevation: bool,
    include_azimuth: bool,
    include_range: bool,
}

impl AsciiWriter {
    pub fn new<P: AsRef<Path>>(root: P, output: &OutputConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include_time: output.include_time_in_file_name,
            include_elevation: output.include_elevation_in_file_name,
            include_azimuth: output.include_azimuth_in_file_name,
            include_range: output.include_range_in_file_name,
        }
    }

    pub fn file_name(&self, record: &SpectraRecord) -> anyhow::Result<String> {
        let mut name = record.label.clone();
        if self.include_time {
            let _ = write!(name, "_{}", beam_time(record.time)?.format("%Y%m%d_%H%M%S"));
        }
        if self.include_elevation {
            let _ = write!(name, "_{:.2}", record.el);
        }
        if self.include_azimuth {
            let _ = write!(name, "_{:.1}", record.az);
        }
        if self.include_range {
            let _ = write!(name, "_{:.2}", record.range_km);
        }
        name.push_str(".spec.txt");
        Ok(name)
    }

    /// Columns: index, centred power spectrum, time-domain power, phase (deg).
    pub fn render(record: &SpectraRecord) -> String {
        let mut text = String::new();
        let rows = record
            .spectrum
            .iter()
            .zip(record.time_power.iter().zip(record.phase_deg.iter()));
        for (index, (spectrum, (power, phase))) in rows.enumerate() {
            let _ = writeln!(
                text,
                "{:4} {:15.4e} {:15.4e} {:15.4e}",
                index, spectrum, power, phase
            );
        }
        text
    }

    pub fn write(&self, record: &SpectraRecord) -> anyhow::Result<PathBuf> {
        let day_dir = self
            .root
            .join(beam_time(record.time)?.format("%Y%m%d").to_string());
        fs::create_dir_all(&day_dir)
            .with_context(|| format!("creating output dir {}", day_dir.display()))?;
        let path = day_dir.join(self.file_name(record)?);
        fs::write(&path, Self::render(record))
            .with_context(|| format!("writing spectrum file {}", path.display()))?;
        log::debug!("wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsbeam::prelude::Channel;
    use tsbeam::spectra::GateMoments;

    fn record() -> SpectraRecord {
        SpectraRecord {
            radar_name: "SIM".into(),
            time: 1.7e9,
            az: 123.456,
            el: 0.5,
            label: "SP_HC".into(),
            channel: Channel::Hc,
            staggered: false,
            prt: 0.001,
            nyquist: 26.75,
            gate: 3,
            range_km: 0.6,
            moments: GateMoments::default(),
            filtered_moments: None,
            adaptive: None,
            regression: None,
            spectrum: vec![0.5, 2.0, 1.0, 0.25],
            time_power: vec![1.0; 4],
            phase_deg: vec![0.0, 90.0, 180.0, -90.0],
        }
    }

    #[test]
    fn unix_time_converts_to_utc_calendar() {
        let stamp = |time: f64| beam_time(time).unwrap().format("%Y%m%d_%H%M%S").to_string();
        assert_eq!(stamp(1.7e9), "20231114_221320");
        assert_eq!(stamp(0.0), "19700101_000000");
        // leap day, fractional seconds truncate
        assert_eq!(stamp(951_782_400.75), "20000229_000000");
        assert!(beam_time(1.0e20).is_err());
    }

    #[test]
    fn file_name_carries_enabled_parts() {
        let output = OutputConfig::default();
        let writer = AsciiWriter::new("/tmp", &output);
        assert_eq!(
            writer.file_name(&record()).unwrap(),
            "SP_HC_20231114_221320_0.50_123.5_0.60.spec.txt"
        );

        let bare = OutputConfig {
            include_time_in_file_name: false,
            include_elevation_in_file_name: false,
            include_azimuth_in_file_name: false,
            include_range_in_file_name: false,
            ..Default::default()
        };
        assert_eq!(
            AsciiWriter::new("/tmp", &bare).file_name(&record()).unwrap(),
            "SP_HC.spec.txt"
        );
    }

    #[test]
    fn writes_into_day_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AsciiWriter::new(dir.path(), &OutputConfig::default());
        let path = writer.write(&record()).unwrap();
        assert!(path.starts_with(dir.path().join("20231114")));

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        let fields: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(fields[0], "1");
        assert_eq!(fields[1].parse::<f64>().unwrap(), 2.0);
        assert_eq!(fields[3].parse::<f64>().unwrap(), 90.0);
    }
}
