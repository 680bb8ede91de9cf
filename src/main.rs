use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::{error, info};

use pcmon::config::{self, load_config, load_config_from_path};
use pcmon::logging::{self, LogFormat, parse_level};
use pcmon::metrics::Calibration;
use pcmon::monitor::{self, Monitor, RunOptions};
use pcmon::system::collector::Collector;
use pcmon::transport::{LineSink, SerialLink, StdoutSink};

#[derive(Parser)]
#[command(
    name = "pcmon",
    about = "Stream host CPU, memory, GPU, network and disk activity to a serial display"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device, e.g. /dev/ttyUSB0 or COM8
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Milliseconds between records
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Network interface to report instead of the default choice
    #[arg(long)]
    interface: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Log format: text, json
    #[arg(long)]
    log_format: Option<String>,

    /// Print records to stdout instead of opening the serial port.
    #[arg(long, default_value_t = false)]
    stdout: bool,

    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);

    logging::init(
        parse_level(&config.general.log_level),
        LogFormat::parse(&config.general.log_format),
    )?;
    config.validate(!cli.stdout)?;

    let sink: Box<dyn LineSink> = if cli.stdout {
        info!("writing records to stdout");
        Box::new(StdoutSink)
    } else {
        let serial = &config.serial;
        match SerialLink::open(
            &serial.port,
            serial.baud_rate,
            std::time::Duration::from_millis(serial.write_timeout_ms),
        ) {
            Ok(link) => {
                info!(port = link.name(), baud_rate = serial.baud_rate, "streaming");
                Box::new(link)
            }
            Err(err) => {
                error!(error = %err, "could not open serial port");
                return Err(err.into());
            }
        }
    };

    let collector = Collector::new(config.sampler.interface.clone());
    let monitor = Monitor::new(collector, sink, Calibration::from(&config.calibration))
        .with_tick_timeout(config.general.tick_timeout());
    let options = RunOptions {
        interval: config.general.interval(),
        max_ticks: cli.ticks,
    };
    info!(interval = ?options.interval, "sampling");

    let summary = monitor::run(monitor, options, shutdown_signal()).await?;
    info!(
        ticks = summary.ticks,
        sent = summary.sent,
        sample_failures = summary.sample_failures,
        write_failures = summary.write_failures,
        deadline_misses = summary.deadline_misses,
        "stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a handler the process only stops when killed.
        std::future::pending::<()>().await;
    }
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref port) = cli.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = cli.baud_rate {
        config.serial.baud_rate = baud;
    }
    if let Some(interval) = cli.interval_ms {
        config.general.interval_ms = interval;
    }
    if let Some(ref interface) = cli.interface {
        config.sampler.interface = Some(interface.clone());
    }
    if let Some(ref level) = cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.general.log_format = format.clone();
    }

    config
}
