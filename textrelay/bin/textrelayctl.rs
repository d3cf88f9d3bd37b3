//! Command-line utility for textrelay
//!
//! - `send`: run a dispatch from a RON job file and print the summary
//! - `probe`: test a relay's connection with the configured backoff

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use textrelay::{controller::build_dispatcher, job::load_job};
use textrelay_common::logging;
use textrelay_dispatch::{DispatchSettings, RelayCredential, SmtpTransport, probe_relay};

/// Send text messages through carrier email gateways
#[derive(Parser, Debug)]
#[command(name = "textrelayctl")]
#[command(about = "Dispatch and relay tooling for textrelay", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a dispatch from a job file and print the summary as JSON
    Send {
        /// RON job file
        #[arg(short, long)]
        job: PathBuf,

        /// Carrier gateway table (JSON object of carrier name to domain)
        #[arg(short, long, default_value = "carriers.json")]
        carriers: PathBuf,

        /// Sends in flight at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Print every outcome, not just the summary
        #[arg(long)]
        outcomes: bool,
    },
    /// Test a relay connection
    Probe {
        #[arg(long)]
        host: String,

        #[arg(long, default_value_t = 587)]
        port: u16,

        #[arg(long, default_value = "")]
        username: String,

        #[arg(long, default_value = "")]
        password: String,

        /// Sender address; the test message is sent to it
        #[arg(long)]
        from: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stderr();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            job,
            carriers,
            concurrency,
            outcomes,
        } => {
            let request = load_job(&job)?;
            let settings = DispatchSettings {
                max_concurrent_sends: concurrency,
                ..DispatchSettings::default()
            };
            let dispatcher = build_dispatcher(&carriers, settings)?;
            let report = dispatcher
                .dispatch(
                    &request.message(),
                    &request.carriers,
                    &request.numbers,
                    request.smtp_configs,
                    &request.usage_limits,
                )
                .await?;

            let output = if outcomes {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string_pretty(&report.summary)?
            };
            println!("{output}");
        }
        Commands::Probe {
            host,
            port,
            username,
            password,
            from,
        } => {
            let relay = RelayCredential {
                host,
                port,
                username,
                secret: password,
                sender: from,
                enabled: true,
            };

            let settings = DispatchSettings::default();
            let transport = SmtpTransport::from_settings(&settings);
            probe_relay(&transport, &relay, &settings.probe).await?;
            println!("SMTP Test Passed");
        }
    }

    Ok(())
}
