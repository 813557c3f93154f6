// src/main.rs
//! GPS Collector - collects NMEA position fixes into an append-only log

use clap::{Args, Parser, Subcommand};
use gps_collector::{
    config::GpsConfig,
    display::terminal::TerminalDisplay,
    error::{GpsError, Result},
    gps::ChecksumPolicy,
    run_session, source,
};
use log::{error, info, warn};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

#[derive(Debug, Parser)]
#[command(name = "gps-collector", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Collect fixes until Ctrl+C or the source runs out
    Collect(CollectArgs),
    /// List available serial ports
    Ports,
    /// Print the effective configuration as JSON
    Config(CollectArgs),
}

#[derive(Debug, Args)]
struct CollectArgs {
    /// simulated, replay, serial or tcp
    #[arg(long)]
    source: Option<String>,
    /// Serial port name
    #[arg(long)]
    port: Option<String>,
    #[arg(long)]
    baud: Option<u32>,
    /// gpsd host
    #[arg(long)]
    host: Option<String>,
    /// gpsd port
    #[arg(long)]
    tcp_port: Option<u16>,
    /// NMEA file to replay
    #[arg(long)]
    file: Option<PathBuf>,
    /// Fix log path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Milliseconds between batches
    #[arg(long)]
    interval_ms: Option<u64>,
    /// lenient, strict or ignore
    #[arg(long)]
    checksum: Option<ChecksumPolicy>,
    /// Start with an empty fix log
    #[arg(long)]
    truncate: bool,
    /// Local object store root
    #[arg(long)]
    upload_dir: Option<PathBuf>,
    #[arg(long)]
    bucket: Option<String>,
    #[arg(long)]
    key: Option<String>,
    /// Skip the upload even if configured
    #[arg(long)]
    no_upload: bool,
    /// Persist these settings to the config file
    #[arg(long)]
    save: bool,
}

impl CollectArgs {
    fn apply(&self, config: &mut GpsConfig) {
        if let Some(ref source) = self.source {
            config.update_source(source);
        }
        if let Some(ref port) = self.port {
            config.serial_port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.serial_baudrate = Some(baud);
        }
        if let Some(ref host) = self.host {
            config.tcp_host = Some(host.clone());
        }
        if let Some(port) = self.tcp_port {
            config.tcp_port = Some(port);
        }
        if let Some(ref file) = self.file {
            config.replay_file = Some(file.clone());
        }
        if let Some(ref output) = self.output {
            config.output_path = output.clone();
        }
        if let Some(interval) = self.interval_ms {
            config.batch_interval_ms = interval;
        }
        if let Some(policy) = self.checksum {
            config.checksum_policy = policy;
        }
        if self.truncate {
            config.truncate_log = true;
        }
        if let Some(ref dir) = self.upload_dir {
            config.upload_dir = Some(dir.clone());
        }
        if let Some(ref bucket) = self.bucket {
            config.upload_bucket = bucket.clone();
        }
        if let Some(ref key) = self.key {
            config.upload_key = key.clone();
        }
        if self.no_upload {
            config.upload_dir = None;
        }
    }

    fn resolve(&self) -> Result<GpsConfig> {
        let mut config = GpsConfig::load().unwrap_or_else(|e| {
            warn!("Using default configuration: {}", e);
            GpsConfig::default()
        });
        self.apply(&mut config);
        if self.save {
            config.save()?;
            info!("Saved configuration to {}", GpsConfig::get_config_path()?.display());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::builder().parse_default_env().init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Collect(args) => collect(args.resolve()?).await,
        Command::Ports => {
            let ports = source::list_serial_ports()?;
            if ports.is_empty() {
                println!("No serial ports found.");
            } else {
                println!("Available serial ports:");
                for port in ports {
                    println!("  {}", port);
                }
            }
            Ok(())
        }
        Command::Config(args) => {
            println!("{}", serde_json::to_string_pretty(&args.resolve()?)?);
            Ok(())
        }
    }
}

async fn collect(config: GpsConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));

    // Ctrl+C is the stop button
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Stopping after the current batch...");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let worker = tokio::spawn(async move {
        let mut display = TerminalDisplay::new();
        display.header(&config.source_type)?;
        run_session(&config, running, &mut display).await
    });

    let summary = worker
        .await
        .map_err(|e| GpsError::Other(format!("Collector task failed: {}", e)))??;

    println!(
        "Collected {} batch(es), {} fix(es), {} record(s)",
        summary.batches, summary.fixes, summary.records
    );
    if let Some(bytes) = summary.uploaded_bytes {
        println!("Uploaded {} bytes", bytes);
    }

    Ok(())
}
