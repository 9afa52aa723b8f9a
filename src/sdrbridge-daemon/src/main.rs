// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Bootstrap for the Linux SDR I/O core: CLI parsing, config load,
//! logging init, transport/driver construction, and the synchronous
//! real-time main loop.
//!
//! Grounded on `trx-server/src/main.rs`'s `Cli` struct and bootstrap
//! sequence (`--config`/`--print-config`, `load_from_default_paths`,
//! `init_logging`), adapted from an async Tokio daemon to the
//! single-threaded, `SCHED_RR`-scheduled loop the real-time sample path
//! requires — there is no work here an async executor would help with,
//! and pulling one in would only add allocation-bearing machinery next to
//! a loop that has none.

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use trx_app::{init_logging, ConfigFile};

use config::BridgeConfig;
use sdrbridge_io::driver::{DriverConfig as IoDriverConfig, IoDriver};
use sdrbridge_io::transport::file::FileTransport;
#[cfg(feature = "soapysdr-sys")]
use sdrbridge_io::transport::soapysdr::{SoapySdrConfig, SoapySdrTransport};
use sdrbridge_io::transport::file::DEFAULT_OUTPUT_PATH;
use sdrbridge_io::IqTransport;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - SDR I/O bridge");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", BridgeConfig::example_toml());
        return ExitCode::SUCCESS;
    }

    let (cfg, config_path) = match &cli.config {
        Some(path) => match BridgeConfig::load_from_file(path) {
            Ok(cfg) => (cfg, Some(path.clone())),
            Err(err) => {
                eprintln!("failed to load {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => match BridgeConfig::load_from_default_paths() {
            Ok(found) => found,
            Err(err) => {
                eprintln!("failed to load configuration: {err}");
                return ExitCode::FAILURE;
            }
        },
    };

    if let Err(err) = cfg.validate() {
        eprintln!("invalid configuration: {err}");
        return ExitCode::FAILURE;
    }

    init_logging(cfg.general.log_level.as_deref());

    if let Some(path) = &config_path {
        info!("loaded configuration from {}", path.display());
    }

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "fatal error, exiting");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &BridgeConfig) -> Result<(), sdrbridge_io::BridgeError> {
    let running = sdrbridge_io::lifecycle::install();

    let transport: Box<dyn IqTransport> = build_transport(cfg)?;

    let driver_cfg = IoDriverConfig {
        driver: cfg.driver.driver.clone(),
        carrier_rx_hz: cfg.driver.rx_freq_hz,
        carrier_tx_hz: cfg.driver.tx_freq_hz,
        rx_if_num: cfg.driver.rx_if_num,
        rx_if_den: cfg.driver.rx_if_den,
        tx_if_num: cfg.driver.tx_if_num,
        tx_if_den: cfg.driver.tx_if_den,
        rx_gain_db: cfg.driver.rx_gain_db,
        tx_gain_db: cfg.driver.tx_gain_db,
        latency_blocks: cfg.driver.latency_blocks,
    };

    let mut driver = IoDriver::new(&driver_cfg, transport)?;

    #[cfg(feature = "monitor")]
    if cfg.monitor.enabled {
        match sdrbridge_io::observation::ObservationPublisher::bind(&cfg.monitor.endpoint) {
            Ok(publisher) => driver = driver.with_observation(publisher),
            Err(err) => {
                info!(%err, endpoint = %cfg.monitor.endpoint, "observation channel disabled: bind failed");
            }
        }
    }

    let mut serial = match sdrbridge_io::serial::VirtualSerialPort::open(&cfg.serial.symlink_path) {
        Ok(port) => Some(port),
        Err(err) => {
            info!(%err, "virtual serial port unavailable, host port disabled");
            None
        }
    };

    info!("entering main loop");
    while running.is_running() {
        // The host-protocol parser (serial.processInt in the original
        // firmware) lives outside this crate's scope; polling the port
        // here only drains bytes so the PTY's kernel buffer never backs
        // up while nothing consumes them.
        if let Some(port) = serial.as_mut() {
            while port.read_byte().is_some() {}
        }
        driver.process()?;
    }

    info!("shutting down");
    driver.exit()?;
    Ok(())
}

fn build_transport(cfg: &BridgeConfig) -> Result<Box<dyn IqTransport>, sdrbridge_io::BridgeError> {
    match cfg.driver.driver.as_str() {
        "file" => Ok(Box::new(FileTransport::open(DEFAULT_OUTPUT_PATH)?)),
        #[cfg(feature = "soapysdr-sys")]
        "limesdr" | "sxxcvr" => {
            let profile = sdrbridge_io::DriverProfile::lookup(&cfg.driver.driver)?;
            let sample_rate = profile.sdr_sample_rate();
            let soapy_cfg = SoapySdrConfig {
                args: cfg.driver.args.clone(),
                sample_rate,
                rx_freq: cfg.driver.rx_freq_hz
                    - sample_rate * cfg.driver.rx_if_num as f64 / cfg.driver.rx_if_den as f64,
                tx_freq: cfg.driver.tx_freq_hz
                    - sample_rate * cfg.driver.tx_if_num as f64 / cfg.driver.tx_if_den as f64,
                rx_gain: cfg.driver.rx_gain_db,
                tx_gain: cfg.driver.tx_gain_db,
                rx_antenna: cfg.driver.rx_antenna.clone(),
                tx_antenna: cfg.driver.tx_antenna.clone(),
                timestamped: profile.timestamped,
                read_timeout_us: 1_000_000,
                write_timeout_us: 1_000_000,
            };
            Ok(Box::new(SoapySdrTransport::open(&soapy_cfg)?))
        }
        #[cfg(not(feature = "soapysdr-sys"))]
        "limesdr" | "sxxcvr" => Err(sdrbridge_io::BridgeError::SdrOpen(
            "built without the soapysdr-sys feature".to_string(),
        )),
        other => Err(sdrbridge_io::BridgeError::UnknownDriver(other.to_string())),
    }
}
