// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! GripWatch - Grip Sensor Acquisition and Classification
//!
//! Command line front end:
//! - `acquire` records the serial stream (or a captured line log) into
//!   per-channel CSV sinks
//! - `stop` asks a running acquisition to finish
//! - `classify` counts grips per channel and prints the distribution
//! - `prepare-training` cleans a labelled recording for model fitting

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gripwatch::analysis::TrainingPrep;
use gripwatch::core::{AcquisitionLoop, FileSignal, RunContext, RunReport, ShutdownSignal};
use gripwatch::detection::{ClassificationAggregator, JsonModelProvider};
use gripwatch::sensors::{ReaderSource, SensorSimulator, SerialSource};
use gripwatch::streaming::{read_training_rows, write_training_rows, TrainingRecording};
use gripwatch::{build_info, Config, VERSION};

/// GripWatch - Grip Sensor Acquisition and Classification
#[derive(Parser, Debug)]
#[command(name = "gripwatch")]
#[command(author = "GripWatch Project")]
#[command(version = VERSION)]
#[command(about = "Serial grip-sensor acquisition and grip classification")]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable trace-level logging (every received line)
    #[arg(long, global = true)]
    trace: bool,

    /// Data output directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record sensor readings until stopped
    Acquire {
        /// Serial port, overrides the configuration
        #[arg(short, long)]
        port: Option<String>,

        /// Use simulated sensors instead of the serial port
        #[arg(long)]
        demo: bool,

        /// Replay a captured line log instead of reading the serial port
        #[arg(long, conflicts_with = "demo")]
        replay: Option<PathBuf>,
    },

    /// Request a running acquisition to stop
    Stop,

    /// Classify recorded sinks and print the grip distribution
    Classify {
        /// Do not write per-channel prediction files
        #[arg(long)]
        no_export: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clean a state-labelled recording for model fitting
    PrepareTraining {
        /// Recording with Timestamp,Resistance,ButtonState columns
        #[arg(short, long)]
        input: PathBuf,

        /// Cleaned output file
        #[arg(short, long)]
        output: PathBuf,

        /// Subtracted from every timestamp
        #[arg(long, default_value = "0")]
        time_offset: f64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; the flags take precedence over RUST_LOG
    let filter = if args.trace {
        EnvFilter::new("trace")
    } else if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("GripWatch v{}", VERSION);
    debug!("Build: {:?}", build_info());

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    config.validate()?;
    info!("Configuration loaded from {:?}", config_path);

    match args.command {
        Command::Acquire { port, demo, replay } => {
            if let Some(port) = port {
                config.acquisition.serial_port = port;
            }
            if demo {
                config.demo_mode = true;
            }
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run_acquisition(config, replay))?;
            print_run_report(&report);
        }
        Command::Stop => {
            let signal = FileSignal::new(config.shutdown_signal_path());
            signal.request()?;
            println!("Stop requested ({})", signal.describe());
        }
        Command::Classify { no_export, json } => {
            let config = Arc::new(config);
            let provider = JsonModelProvider::new(Arc::clone(&config));
            let report = ClassificationAggregator::new(Arc::clone(&config))
                .with_export(!no_export)
                .run(&provider);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let distribution = report.distribution();
                println!("Grip distribution ({} grips):", distribution.total);
                for summary in report.summaries.values() {
                    let note = summary
                        .skipped
                        .as_deref()
                        .map(|reason| format!("  [skipped: {}]", reason))
                        .unwrap_or_default();
                    println!(
                        "  {} ({}): {} grips, {:.1}%{}",
                        summary.sensor_id,
                        summary.label,
                        summary.grip_count,
                        distribution.percentage(summary.sensor_id),
                        note
                    );
                }
            }
        }
        Command::PrepareTraining { input, output, time_offset } => {
            let recording = read_training_rows(&input)
                .with_context(|| format!("reading training recording {:?}", input))?;
            let prep = TrainingPrep::new(&config.cleaning, time_offset);
            let cleaned = TrainingRecording {
                headers: recording.headers,
                rows: prep.run(recording.rows),
            };
            write_training_rows(&output, &cleaned)
                .with_context(|| format!("writing cleaned recording {:?}", output))?;
            println!("Wrote {} rows to {:?}", cleaned.rows.len(), output);
        }
    }

    Ok(())
}

/// Run the blocking acquisition loop off the async runtime while Ctrl+C
/// is watched on it
async fn run_acquisition(config: Config, replay: Option<PathBuf>) -> Result<RunReport> {
    let ctx = RunContext::from_config(&config);
    let interrupt = ctx.interrupt_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, draining buffers...");
            interrupt.store(true, Ordering::SeqCst);
        }
    });

    info!("Recording into {:?}", config.data_dir);
    info!("   Run `gripwatch stop` or press Ctrl+C to finish");

    let channels = config.channel_ids();
    let demo = config.demo_mode;
    let acquisition = config.acquisition.clone();
    let report = tokio::task::spawn_blocking(move || {
        let engine = AcquisitionLoop::new(ctx);
        if let Some(path) = replay {
            info!("Replaying captured lines from {:?}", path);
            engine.run(|| {
                let file = File::open(&path)?;
                Ok(ReaderSource::new(&path.display().to_string(), BufReader::new(file)))
            })
        } else if demo {
            warn!("Demo mode: readings are simulated");
            engine.run(|| Ok(SensorSimulator::new(&channels, Duration::from_millis(10))))
        } else {
            engine.run(|| SerialSource::open(&acquisition))
        }
    })
    .await??;

    Ok(report)
}

fn print_run_report(report: &RunReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Acquisition stopped ({:?}) after {}s",
        report.stop_reason,
        elapsed.num_seconds()
    );
    println!(
        "  {} lines, {} accepted, {} dropped, {} timeouts",
        report.counters.lines,
        report.counters.accepted,
        report.counters.dropped(),
        report.counters.timeouts
    );
    for (channel, written) in &report.records_written {
        println!("  channel {}: {} records", channel, written);
    }
}
