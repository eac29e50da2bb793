//! Pulsar Publisher - publish Pulsar messages through an external producer executable.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pulsar_publisher::command::{MessageOptions, Payload};
use pulsar_publisher::config::{ConfigLoader, PublisherConfig};
use pulsar_publisher::display;
use pulsar_publisher::observer::ObserverBus;
use pulsar_publisher::{PublishError, Publisher};

#[derive(Parser)]
#[command(
    name = "pulsar-publisher",
    about = "Publish Pulsar messages through the pulsar-publish producer",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: search standard locations).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the producer executable.
    #[arg(long, global = true)]
    bin: Option<PathBuf>,

    /// Show full field values without truncation.
    #[arg(long, global = true)]
    raw: bool,

    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AuthArgs {
    /// JWT, or path to a file containing one.
    #[arg(long, global = true)]
    jwt: Option<String>,

    /// Username for basic authentication.
    #[arg(long, global = true, requires = "password")]
    username: Option<String>,

    /// Password for basic authentication.
    #[arg(long, global = true, requires = "username")]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one message.
    Publish {
        /// Topic URL, e.g. pulsar://localhost:6650/persistent/public/default/orders.
        target: String,
        /// Message payload.
        payload: String,
        /// Parse the payload as JSON before sending.
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        message: MessageArgs,
    },
    /// Check that the topic is reachable without sending a message.
    Test {
        /// Topic URL.
        target: String,
        #[command(flatten)]
        message: MessageArgs,
    },
}

#[derive(Args)]
struct MessageArgs {
    /// Message options as a JSON object; explicit flags take precedence.
    #[arg(long, value_name = "JSON")]
    options: Option<String>,
    /// Message key.
    #[arg(long)]
    key: Option<String>,
    /// Ordering key.
    #[arg(long)]
    ordering_key: Option<String>,
    /// Event time in epoch milliseconds.
    #[arg(long)]
    event_time: Option<u64>,
    /// Replicate to this cluster (repeatable).
    #[arg(long = "replication-cluster")]
    replication_clusters: Vec<String>,
    /// Disable geo-replication.
    #[arg(long)]
    disable_replication: bool,
    /// Sequence id.
    #[arg(long)]
    sequence_id: Option<u64>,
    /// Delivery delay in milliseconds.
    #[arg(long)]
    deliver_after: Option<u64>,
    /// Delivery time in epoch milliseconds.
    #[arg(long)]
    deliver_at: Option<u64>,
    /// Message property KEY=VALUE (repeatable).
    #[arg(long = "property", value_parser = parse_key_val)]
    properties: Vec<(String, String)>,
}

impl MessageArgs {
    fn into_options(self) -> Result<MessageOptions, String> {
        let mut options = match self.options {
            Some(raw) => {
                let value: serde_json::Value =
                    serde_json::from_str(&raw).map_err(|e| format!("invalid --options: {e}"))?;
                MessageOptions::from_value(&value)
            }
            None => MessageOptions::new(),
        };

        if let Some(key) = self.key {
            options.key = Some(key);
        }
        if let Some(key) = self.ordering_key {
            options.ordering_key = Some(key);
        }
        if self.event_time.is_some() {
            options.event_time = self.event_time;
        }
        if !self.replication_clusters.is_empty() {
            options.replication_clusters = self.replication_clusters;
        }
        if self.disable_replication {
            options.disable_replication = true;
        }
        if self.sequence_id.is_some() {
            options.sequence_id = self.sequence_id;
        }
        if self.deliver_after.is_some() {
            options.deliver_after = self.deliver_after;
        }
        if self.deliver_at.is_some() {
            options.deliver_at = self.deliver_at;
        }
        options.properties.extend(self.properties);
        Ok(options)
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<PublisherConfig, String> {
    cli.config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path)
        .executable_override(cli.bin.clone())
        .load()
        .map_err(|e| e.to_string())
}

fn build_publisher(cli: &Cli, bus: ObserverBus) -> Result<Publisher, String> {
    let config = load_config(cli)?;
    let mut publisher = Publisher::from_config(&config)
        .map_err(|e| e.to_string())?
        .with_observer(bus);

    if let Some(token) = &cli.auth.jwt {
        publisher
            .set_jwt(token, false)
            .map_err(|e| e.to_string())?;
    }
    if let (Some(user), Some(pass)) = (&cli.auth.username, &cli.auth.password) {
        publisher
            .set_basic_auth(user, pass)
            .map_err(|e| e.to_string())?;
    }
    Ok(publisher)
}

async fn run(cli: Cli, publisher: &Publisher) -> Result<(), String> {
    match cli.command {
        Commands::Publish {
            target,
            payload,
            json,
            message,
        } => {
            let payload = if json {
                Payload::Json(
                    serde_json::from_str(&payload).map_err(|e| format!("invalid JSON payload: {e}"))?,
                )
            } else {
                Payload::Text(payload)
            };
            let options = message.into_options()?;
            tracing::info!(topic = %target, "Publishing message");
            let id = publisher
                .publish(&target, payload, options)
                .await
                .map_err(|e: PublishError| e.to_string())?;
            display::print_message_id(&id);
            Ok(())
        }
        Commands::Test { target, message } => {
            let options = message.into_options()?;
            tracing::info!(topic = %target, "Testing connectivity");
            let ok = publisher
                .test(&target, options)
                .await
                .map_err(|e| e.to_string())?;
            display::print_test_result(&target, ok);
            if ok {
                Ok(())
            } else {
                Err(format!("connectivity test failed for {target}"))
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let raw_mode = cli.raw;

    let bus = ObserverBus::default();
    let mut rx = bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => display::print_event(&event, raw_mode),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let publisher = match build_publisher(&cli, bus) {
        Ok(publisher) => publisher,
        Err(e) => {
            display::print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli, &publisher).await;
    drop(publisher);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Event printer task failed");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
