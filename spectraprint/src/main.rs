use anyhow::Context;
use clap::Parser;
use generator::profile::{build_pulse_stream, sim_ops, write_stream, GeneratorConfig, Scenario};
use output::bridge::{bridge_bind_address, SpectraBridge};
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tsbeam::prelude::XmitRcvMode;
use tsbeam::pulse_interface::{JsonLinesPulseSource, PulseSource, VecPulseSource};
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod output;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Assembles beams from IQ pulse streams and prints per-gate spectra")]
struct Args {
    /// JSON-lines pulse stream to read
    #[arg(long)]
    input: Option<PathBuf>,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Pulses per beam
    #[arg(long)]
    n_samples: Option<usize>,
    /// Transmit/receive mode, e.g. alt_hv_co_cross
    #[arg(long)]
    mode: Option<String>,
    /// Root directory for the ASCII spectrum files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// JSON-lines file for the spectra records
    #[arg(long)]
    json_out: Option<PathBuf>,
    #[arg(long)]
    max_beams: Option<usize>,
    /// Generate a synthetic stream instead of reading one
    #[arg(long, value_enum)]
    simulate: Option<Scenario>,
    #[arg(long, default_value_t = 2000)]
    pulses: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Save the synthetic stream as JSON lines
    #[arg(long)]
    write_stream: Option<PathBuf>,
    /// Keep the HTTP bridge alive after the run
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn parse_mode(text: &str) -> anyhow::Result<XmitRcvMode> {
    serde_yaml::from_str(text).with_context(|| format!("unknown xmit_rcv_mode '{}'", text))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = match args.workflow.as_ref() {
        Some(path) => WorkflowConfig::load(path)?,
        None => WorkflowConfig::default(),
    };
    if let Some(n_samples) = args.n_samples {
        workflow_config.beam.n_samples = n_samples;
    }
    match args.mode.as_deref() {
        Some(mode) => workflow_config.beam.xmit_rcv_mode = parse_mode(mode)?,
        None if args.workflow.is_none() && args.simulate == Some(Scenario::Alternating) => {
            workflow_config.beam.xmit_rcv_mode = XmitRcvMode::AltHvCoCross;
        }
        None => {}
    }
    if args.output_dir.is_some() {
        workflow_config.output.ascii_dir = args.output_dir.clone();
    }
    if args.json_out.is_some() {
        workflow_config.output.json_path = args.json_out.clone();
    }
    if args.max_beams.is_some() {
        workflow_config.output.max_beams = args.max_beams;
    }

    let mut runner = Runner::new(workflow_config)?;
    let bridge = SpectraBridge::new();
    if args.serve {
        bridge.serve(bridge_bind_address())?;
    }

    let mut source: Box<dyn PulseSource> = match (args.input.as_ref(), args.simulate) {
        (Some(path), _) => Box::new(
            JsonLinesPulseSource::open(path)
                .with_context(|| format!("opening pulse stream {}", path.display()))?,
        ),
        (None, scenario) => {
            let generator = GeneratorConfig {
                scenario: scenario.unwrap_or(Scenario::Ppi),
                n_pulses: args.pulses,
                seed: args.seed,
                ..Default::default()
            };
            let ops = sim_ops();
            let pulses = build_pulse_stream(&generator, &ops)?;
            if let Some(path) = args.write_stream.as_ref() {
                write_stream(path, &ops, &pulses)?;
            }
            Box::new(VecPulseSource::new(ops, pulses))
        }
    };

    let summary = runner.run(source.as_mut(), Some(&bridge))?;
    println!(
        "Run -> beams {}, records {}, files {}, pulses {}, rejected {}, forced {}",
        summary.beams,
        summary.records,
        summary.files,
        summary.metrics.pulses,
        summary.metrics.rejected,
        summary.metrics.forced_triggers
    );

    if args.serve {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
