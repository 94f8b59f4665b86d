use anyhow::{ensure, Context};
use num_complex::Complex32;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tsbeam::pulse_interface::{OpsInfo, Pulse, ScanMode};

/// Pulse pattern of a synthetic stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Single-pol PPI rotation.
    Ppi,
    /// Alternating H/V transmit with co- and cross-polar receivers.
    Alternating,
    /// Staggered PRT with fewer gates on the short-PRT pulses.
    Staggered,
    /// Single-pol elevation sweep.
    Rhi,
}

/// Configuration for generating synthetic pulse streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub scenario: Scenario,
    pub n_pulses: usize,
    pub n_gates: usize,
    /// Gates on long-PRT pulses in the staggered scenario.
    pub n_gates_long: usize,
    pub prt: f64,
    pub prt_long: f64,
    /// Antenna motion per pulse, deg.
    pub scan_step: f64,
    pub fixed_angle: f64,
    /// Radial velocity of the weather echo, m/s.
    pub velocity: f32,
    /// Amplitude of the zero-velocity clutter echo.
    pub clutter: f32,
    pub noise: f32,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Ppi,
            n_pulses: 2000,
            n_gates: 100,
            n_gates_long: 150,
            prt: 0.001,
            prt_long: 0.0015,
            scan_step: 0.05,
            fixed_angle: 0.5,
            velocity: 8.0,
            clutter: 0.0,
            noise: 0.01,
            seed: 0,
        }
    }
}

pub fn sim_ops() -> OpsInfo {
    OpsInfo {
        radar_name: "SIM".into(),
        ..Default::default()
    }
}

/// Builds the pulse stream described by the config.
pub fn build_pulse_stream(config: &GeneratorConfig, ops: &OpsInfo) -> anyhow::Result<Vec<Pulse>> {
    ensure!(config.n_gates > 0, "generator needs at least one gate");
    ensure!(config.prt > 0.0, "generator prt must be positive");
    ensure!(config.noise >= 0.0, "generator noise must not be negative");
    let staggered = config.scenario == Scenario::Staggered;
    if staggered {
        ensure!(
            config.prt_long > config.prt,
            "staggered prt_long {} must exceed prt {}",
            config.prt_long,
            config.prt
        );
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let omega = -PI * config.velocity as f64 / (ops.wavelength_m() / 4.0);
    let n_channels = if config.scenario == Scenario::Alternating { 2 } else { 1 };
    let mut pulses = Vec::with_capacity(config.n_pulses);
    let mut time = 1.7e9;

    for seq in 0..config.n_pulses {
        // the pulse after a long interval opens a short-PRT interval
        let (prt, n_gates) = if staggered && seq % 2 == 0 {
            (config.prt_long, config.n_gates)
        } else if staggered {
            (config.prt, config.n_gates_long)
        } else {
            (config.prt, config.n_gates)
        };
        time += prt;

        let sweep = (seq as f64 * config.scan_step) % 360.0;
        let (az, el, scan_mode) = match config.scenario {
            Scenario::Rhi => (config.fixed_angle, sweep.min(90.0), ScanMode::Rhi),
            _ => (sweep, config.fixed_angle, ScanMode::Ppi),
        };
        let weather_phase = (omega * (time - 1.7e9)) as f32;

        let mut channels = Vec::with_capacity(n_channels);
        for chan in 0..n_channels {
            let gain = if chan == 0 { 1.0 } else { 0.1 };
            let samples = (0..n_gates)
                .map(|gate| {
                    let envelope = 1.0 / (1.0 + gate as f32 * 0.02);
                    let weather = Complex32::from_polar(envelope * gain, weather_phase);
                    let noise = Complex32::new(
                        rng.gen_range(-config.noise..=config.noise),
                        rng.gen_range(-config.noise..=config.noise),
                    );
                    weather + Complex32::new(config.clutter * gain, 0.0) + noise
                })
                .collect();
            channels.push(samples);
        }

        let pulse = Pulse::new(
            seq as u64,
            time,
            az,
            el,
            prt,
            config.scenario != Scenario::Alternating || seq % 2 == 0,
            channels,
        )
        .with_scan_mode(scan_mode);
        pulses.push(pulse);
    }

    Ok(pulses)
}

pub fn write_stream(path: &std::path::Path, ops: &OpsInfo, pulses: &[Pulse]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating pulse stream {}", path.display()))?;
    tsbeam::pulse_interface::write_pulse_stream(std::io::BufWriter::new(file), ops, pulses)
        .with_context(|| format!("writing pulse stream {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_requested_pulses() {
        let config = GeneratorConfig {
            n_pulses: 50,
            n_gates: 12,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config, &sim_ops()).unwrap();
        assert_eq!(pulses.len(), 50);
        assert_eq!(pulses[3].n_gates, 12);
        assert!((pulses[10].az - 0.5).abs() < 1e-9);
        assert!(pulses.iter().all(|p| p.horiz));
    }

    #[test]
    fn staggered_stream_alternates_prt_and_gates() {
        let config = GeneratorConfig {
            scenario: Scenario::Staggered,
            n_pulses: 10,
            n_gates: 20,
            n_gates_long: 30,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config, &sim_ops()).unwrap();
        assert!((pulses[0].prt - 0.0015).abs() < 1e-12);
        assert_eq!(pulses[0].n_gates, 20);
        assert!((pulses[1].prt - 0.001).abs() < 1e-12);
        assert_eq!(pulses[1].n_gates, 30);
    }

    #[test]
    fn alternating_stream_has_cross_channel() {
        let config = GeneratorConfig {
            scenario: Scenario::Alternating,
            n_pulses: 4,
            n_gates: 5,
            seed: 7,
            ..Default::default()
        };
        let pulses = build_pulse_stream(&config, &sim_ops()).unwrap();
        assert_eq!(pulses[0].n_channels(), 2);
        assert!(pulses[0].horiz && !pulses[1].horiz);
    }

    #[test]
    fn staggered_prts_must_differ() {
        let config = GeneratorConfig {
            scenario: Scenario::Staggered,
            prt_long: 0.0005,
            ..Default::default()
        };
        assert!(build_pulse_stream(&config, &sim_ops()).is_err());
    }
}
