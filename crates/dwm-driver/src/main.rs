//! dwm - command-line access to a DWM1001 module over UART.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dwm_driver::{DriverConfig, DriverSession, SerialTransport};
use dwm_protocol::{Location, NodeConfig, SystemStatus, VersionInfo};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dwm")]
#[command(author, version, about = "DWM1001 UART driver")]
struct Cli {
    /// Serial port
    #[arg(short, long, env = "DWM_PORT")]
    port: Option<String>,

    /// Baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Per-read timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Configuration file path (YAML)
    #[arg(short, long, env = "DWM_CONFIG")]
    config: Option<PathBuf>,

    /// Soft reset and configure interrupts before the command
    #[arg(long)]
    init: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show firmware, configuration and hardware versions
    Version,
    /// Show system status flags
    Status,
    /// Show node configuration
    Config,
    /// Show current position
    Position,
    /// Show position and anchor distances
    Location,
    /// Return the module's API state machine to idle
    SoftReset,
    /// Reboot the module and initialise it
    Reset,
    /// Print locations repeatedly
    Poll {
        /// Number of reads (0 = until an error)
        #[arg(short = 'n', long, default_value = "0")]
        count: u64,

        /// Delay between reads in milliseconds
        #[arg(short, long, default_value = "100")]
        interval_ms: u64,
    },
    /// Send a hex-encoded request and print the raw response
    Raw {
        /// Request bytes, e.g. 0200
        request: String,
    },
}

fn load_config(cli: &Cli) -> Result<DriverConfig> {
    let mut config = match &cli.config {
        Some(path) => DriverConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DriverConfig::default(),
    };
    if let Some(port) = &cli.port {
        config.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        config.baud_rate = baud;
    }
    if let Some(timeout) = cli.timeout_ms {
        config.read_timeout_ms = timeout;
    }
    config.validate()?;
    Ok(config)
}

fn print_version(ver: &VersionInfo) {
    println!("firmware: {}", ver.firmware);
    println!("config:   0x{:08X}", ver.config);
    println!("hardware: 0x{:08X}", ver.hardware);
}

fn print_status(status: &SystemStatus) {
    println!("loc_ready:        {}", status.loc_ready());
    println!("uwbmac_joined:    {}", status.uwbmac_joined());
    println!("bh_data_ready:    {}", status.bh_data_ready());
    println!("bh_status_changed:{}", status.bh_status_changed());
    println!("uwb_scan_ready:   {}", status.uwb_scan_ready());
    println!("usr_data_ready:   {}", status.usr_data_ready());
    println!("usr_data_sent:    {}", status.usr_data_sent());
    println!("fwup_in_progress: {}", status.fwup_in_progress());
}

fn print_config(cfg: &NodeConfig) {
    println!("mode:          {:?}", cfg.mode);
    println!("uwb_mode:      {:?}", cfg.uwb_mode);
    println!("meas_mode:     {:?}", cfg.meas_mode);
    println!("initiator:     {}", cfg.initiator);
    println!("bridge:        {}", cfg.bridge);
    println!("loc_engine_en: {}", cfg.loc_engine_en);
    println!("low_power_en:  {}", cfg.low_power_en);
    println!("accel_en:      {}", cfg.accel_en);
    println!("led_en:        {}", cfg.led_en);
    println!("ble_en:        {}", cfg.ble_en);
    println!("enc_en:        {}", cfg.enc_en);
    println!("fw_update_en:  {}", cfg.fw_update_en);
}

fn print_location(loc: &Location) {
    println!("{}", loc.position);
    for d in &loc.distances {
        match &d.position {
            Some(pos) => println!(
                "  0x{:04X}: {} mm (q={}) at {}",
                d.address, d.distance, d.quality, pos
            ),
            None => println!("  0x{:016X}: {} mm (q={})", d.address, d.distance, d.quality),
        }
    }
}

fn run(cli: &Cli, session: &mut DriverSession<SerialTransport>) -> Result<()> {
    if cli.init {
        session.init().context("initialising module")?;
    }
    match &cli.command {
        Commands::Version => print_version(&session.get_ver()?),
        Commands::Status => print_status(&session.get_status()?),
        Commands::Config => print_config(&session.get_cfg()?),
        Commands::Position => println!("{}", session.get_pos()?),
        Commands::Location => print_location(&session.get_loc()?),
        Commands::SoftReset => session.soft_reset()?,
        Commands::Reset => session.reset()?,
        Commands::Poll { count, interval_ms } => {
            let interval = Duration::from_millis(*interval_ms);
            let mut n = 0u64;
            while *count == 0 || n < *count {
                print_location(&session.get_loc()?);
                n += 1;
                std::thread::sleep(interval);
            }
        }
        Commands::Raw { request } => {
            let bytes = hex::decode(request).context("request is not valid hex")?;
            let raw = session.execute(&bytes)?;
            println!("{}", hex::encode(raw));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let config = load_config(&cli)?;
    let mut session = DriverSession::open(&config)
        .with_context(|| format!("opening {}", config.port))?;
    info!("connected to {}", session.transport().name());

    let result = run(&cli, &mut session);
    session.close()?;
    result
}
