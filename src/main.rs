use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::time;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mychain_dashboard::config::{ContextMode, Overrides, Settings};
use mychain_dashboard::sync::{FormField, SyncLoop};
use mychain_dashboard::{HttpLedgerClient, TransactionView};

// -----------------------------
// Command line
// -----------------------------

#[derive(Parser, Debug)]
#[clap(name = "mychain-dashboard", about = "Submit transactions to and watch a mychain node")]
struct Cli {
    /// Settings file (defaults to ./mychain.toml when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Node API port: 5000, 5001 or 5002
    #[clap(long, global = true)]
    port: Option<String>,

    /// How to address the node: container, loopback, named or hostname
    #[clap(long, global = true, value_parser = parse_context)]
    context: Option<ContextMode>,

    /// Poll interval in milliseconds
    #[clap(long, global = true)]
    interval_ms: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the chain and redraw the dashboard until Ctrl-C
    Watch,
    /// Submit one transaction, then print the dashboard
    Send {
        #[clap(long)]
        sender: String,
        #[clap(long)]
        recipient: String,
        #[clap(long)]
        amount: String,
    },
    /// Print the node URL that would be used
    Endpoint,
}

fn parse_context(value: &str) -> Result<ContextMode, String> {
    match value {
        "container" => Ok(ContextMode::Container),
        "loopback" => Ok(ContextMode::Loopback),
        "named" => Ok(ContextMode::Named),
        "hostname" => Ok(ContextMode::Hostname),
        other => Err(format!("unknown context `{other}`")),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("could not load settings")?;
    settings.apply(Overrides {
        api_port: cli.port.clone(),
        context: cli.context,
        poll_interval_ms: cli.interval_ms,
    });
    Ok(settings)
}

// -----------------------------
// Dashboard
// -----------------------------

fn render(sync: &SyncLoop) {
    let state = sync.snapshot();
    let view = TransactionView::project(&state.chain);
    // clear screen, cursor home
    print!("\x1B[2J\x1B[H");
    println!("Blockchain Network");
    println!();
    if state.submitting {
        println!("Sending...");
    }
    if let Some(error) = &state.last_error {
        println!("! {error}");
        println!();
    }
    println!("{view}");
}

async fn watch(sync: Arc<SyncLoop>, settings: &Settings) -> Result<()> {
    let handle = sync.spawn(settings.poll_interval());
    let mut redraw = time::interval(settings.poll_interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = redraw.tick() => render(&sync),
        }
    }

    info!("shutting down");
    handle.stop().await;
    Ok(())
}

async fn send(sync: Arc<SyncLoop>, sender: String, recipient: String, amount: String) -> Result<()> {
    sync.set_field(FormField::Sender, sender);
    sync.set_field(FormField::Recipient, recipient);
    sync.set_field(FormField::Amount, amount);

    let result = sync.submit().await.context("transaction not submitted")?;
    println!("{}", result.message);
    if let Some(error) = sync.last_error() {
        warn!(%error, "chain refresh after submit failed");
    }
    println!();
    println!("{}", sync.view());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let resolver = settings.resolver();

    match cli.command {
        Command::Endpoint => {
            println!("{}", resolver.resolve());
            Ok(())
        }
        Command::Watch => {
            info!(endpoint = %resolver.resolve(), interval_ms = settings.poll_interval_ms, "watching chain");
            let client = Arc::new(HttpLedgerClient::new(resolver));
            watch(Arc::new(SyncLoop::new(client)), &settings).await
        }
        Command::Send {
            sender,
            recipient,
            amount,
        } => {
            let client = Arc::new(HttpLedgerClient::new(resolver));
            send(Arc::new(SyncLoop::new(client)), sender, recipient, amount).await
        }
    }
}
