//! TLS Certificate Monitor Command Line Tool
//!
//! This binary is the command-line interface for the monitoring engine.
//! Results are printed to stdout as JSON; logs go to stderr.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use tls_cert_monitor::common::{init_logger, set_log_level, MonitorError, Result};
use tls_cert_monitor::config::defaults::LOG_LEVEL_STR;
use tls_cert_monitor::config::{BackoffKind, ConfigOverrides, MonitorConfig};
use tls_cert_monitor::monitor::{LogNotifier, MemoryInventory, Monitor, MonitoredHost};
use tls_cert_monitor::tls::TlsProber;
use tls_cert_monitor::{APP_NAME, VERSION};

/// TLS Certificate Monitor: certificate probing and expiry monitoring
#[derive(Parser, Debug)]
#[command(author, version = VERSION, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags overriding the loaded configuration
#[derive(Args, Debug)]
struct OverrideArgs {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Port used for hosts without an explicit port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Per-connection timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Hosts probed concurrently in a batch
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Attempts per host, the first one included
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Delay between attempts in milliseconds
    #[arg(long, global = true)]
    retry_delay_ms: Option<u64>,

    /// Retry backoff (fixed, exponential)
    #[arg(long, global = true)]
    backoff: Option<BackoffKind>,

    /// Hosts probed concurrently in a monitoring cycle
    #[arg(long, global = true)]
    cycle_concurrency: Option<usize>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            port: args.port,
            timeout_ms: args.timeout_ms,
            batch_size: args.batch_size,
            max_retries: args.max_retries,
            retry_delay_ms: args.retry_delay_ms,
            backoff: args.backoff,
            log_level: args.log_level,
            cycle_concurrency: args.cycle_concurrency,
            ..ConfigOverrides::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the certificate of one host
    Check {
        /// Host name, host:port or https:// URL
        host: String,
    },
    /// Probe the negotiated protocol version and cipher of one host
    Transport {
        /// Host name, host:port or https:// URL
        host: String,
    },
    /// Check a host before adding it to an inventory
    Register {
        /// Host name, host:port or https:// URL
        url: String,
    },
    /// Probe many hosts in groups with retries
    Batch {
        /// Hosts to probe
        #[arg(required = true)]
        hosts: Vec<String>,
    },
    /// Run one monitoring cycle over a JSON host list
    Cycle {
        /// JSON file holding an array of monitored hosts
        #[arg(long)]
        hosts: PathBuf,

        /// Write the refreshed hosts back to the file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger before loading so loader and validator output is shown
    init_logger(cli.overrides.log_level.as_deref().unwrap_or(LOG_LEVEL_STR));

    info!("Starting {} v{}", APP_NAME, VERSION);

    let config = MonitorConfig::load(cli.config.as_deref())?.merge(cli.overrides.into());
    config.validate()?;

    set_log_level(&config.log_level);

    let config = Arc::new(config);

    match cli.command {
        Command::Check { host } => {
            let prober = TlsProber::new(config.port, config.timeout())?;
            match prober.probe_certificate(&host).await {
                Ok(record) => print_json(&record)?,
                Err(e) => {
                    print_json(&e)?;
                    process::exit(1);
                }
            }
        }
        Command::Transport { host } => {
            let prober = TlsProber::new(config.port, config.timeout())?;
            match prober.probe_transport_config(&host).await {
                Ok(info) => print_json(&info)?,
                Err(e) => {
                    print_json(&e)?;
                    process::exit(1);
                }
            }
        }
        Command::Register { url } => {
            let monitor = Monitor::from_config(
                config,
                Arc::new(MemoryInventory::default()),
                Arc::new(LogNotifier),
            )?;
            print_json(&monitor.present_new_host(&url).await)?;
        }
        Command::Batch { hosts } => {
            let monitor = Monitor::from_config(
                config,
                Arc::new(MemoryInventory::default()),
                Arc::new(LogNotifier),
            )?;
            let report = monitor.probe_many(&hosts).await;
            print_json(&report)?;
            if !report.is_complete() {
                process::exit(1);
            }
        }
        Command::Cycle { hosts, write } => {
            let content = fs::read_to_string(&hosts).map_err(|e| {
                MonitorError::Inventory(format!("Failed to read host list {}: {}", hosts.display(), e))
            })?;
            let listed: Vec<MonitoredHost> = serde_json::from_str(&content)?;

            let inventory = Arc::new(MemoryInventory::new(listed));
            let monitor = Monitor::from_config(config, inventory.clone(), Arc::new(LogNotifier))?;
            let report = monitor.refresh_all().await?;

            if write {
                let refreshed = inventory.snapshot().await;
                fs::write(&hosts, serde_json::to_string_pretty(&refreshed)?)?;
                info!("Wrote {} hosts to {}", refreshed.len(), hosts.display());
            }
            if !report.write_failures.is_empty() {
                warn!("{} hosts could not be stored", report.write_failures.len());
            }

            print_json(&report)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
