use anyhow::Context;
use bridge::bridge::MeterBridge;
use bridge::model::ReadingsModel;
use clap::{Parser, ValueEnum};
use generator::profile::{build_pcm_stream, GeneratorConfig};
use pcmpower::pcm::ContainerKind;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::{format_power, Runner};

mod bridge;
mod generator;
mod workflow;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Auto,
    Raw,
    Maud,
    Wav,
}

impl Format {
    fn container(self) -> Option<ContainerKind> {
        match self {
            Format::Auto => None,
            Format::Raw => Some(ContainerKind::Raw),
            Format::Maud => Some(ContainerKind::Maud),
            Format::Wav => Some(ContainerKind::Wav),
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Meters the RMS power of 16-bit PCM blocks as they play")]
struct Args {
    /// PCM source: raw samples, a MAUD resource or a WAV file
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,
    /// Meter a generated tone instead of a file
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 11_025)]
    sample_rate: u32,
    #[arg(long, default_value_t = 8)]
    blocks_per_second: usize,
    /// Size of each simulated network read
    #[arg(long, default_value_t = 1460)]
    chunk_bytes: usize,
    /// Print powers rounded to whole numbers
    #[arg(long, default_value_t = false)]
    round: bool,
    /// Print the full report as JSON instead of one line per block
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Append a one-line summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Keep the HTTP bridge alive for posted audio
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.sample_rate, args.blocks_per_second, args.chunk_bytes)
    };
    workflow_config.round_power |= args.round;

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let bridge = args.serve.then(|| MeterBridge::new(runner.clone()));

    let source = match (&args.input, args.synthetic) {
        (Some(path), _) => Some((
            fs::read(path).with_context(|| format!("reading PCM source {}", path.display()))?,
            args.format.container(),
        )),
        (None, true) => {
            let generator = GeneratorConfig {
                sample_rate: workflow_config.sample_rate,
                ..Default::default()
            };
            Some((build_pcm_stream(&generator)?, Some(generator.container)))
        }
        (None, false) => None,
    };

    if let Some((data, container)) = source {
        let report = runner.execute(&data, container)?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for reading in &report.readings {
                println!("{}", format_power(reading.rms, workflow_config.round_power));
            }
        }

        if let Some(bridge) = bridge.as_ref() {
            bridge.publish(&ReadingsModel::from(&report))?;
        }

        if let Some(report_path) = args.report.as_ref() {
            let line = format!(
                "blocks={} skipped={} overall_rms={:?} duration={:.3}s\n",
                report.readings.len(),
                report.skipped,
                report.overall_rms,
                report.duration_secs
            );
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(report_path)
                .with_context(|| format!("opening report {}", report_path.display()))?;
            file.write_all(line.as_bytes())?;
        }
    }

    if let Some(bridge) = bridge {
        bridge.publish_status("HTTP bridge running on 127.0.0.1:9000 (Ctrl+C to stop)...");
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
