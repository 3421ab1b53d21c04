//! SEQQUORUM CLI - query a replicated sequencer by majority vote

mod commands;

use clap::{Parser, Subcommand};
use commands::{exit_code, Query};
use seqquorum_client::MultipleNodesClient;
use seqquorum_core::CallContext;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "seqquorum")]
#[command(about = "Query sequencer nodes and accept only what a majority agrees on")]
#[command(version)]
struct Cli {
    /// Query node URL, repeat once per node
    #[arg(short, long = "node")]
    nodes: Vec<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deadline of the whole call in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level, RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest block height
    Height,

    /// Block header at a height
    Header { height: u64 },

    /// Block headers in [from, until)
    Headers { from: u64, until: u64 },

    /// Transaction by tagged base64 hash
    Transaction { hash: String },

    /// Explorer view of a transaction
    ExplorerTransaction { hash: String },

    /// VID common data at a height
    VidCommon { height: u64 },

    /// Transactions of a namespace in a block
    Namespace { height: u64, namespace: u64 },

    /// Block merkle proof at a snapshot height
    MerkleProof { root_height: u64, height: u64 },

    /// Submit a transaction
    Submit {
        /// Target namespace
        #[arg(long)]
        namespace: u64,

        /// Payload as hex
        #[arg(long, conflicts_with = "payload_base64", required_unless_present = "payload_base64")]
        payload_hex: Option<String>,

        /// Payload as standard base64
        #[arg(long)]
        payload_base64: Option<String>,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with the current settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr, stdout carries command output
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli.config.clone().or_else(commands::default_config_path);

    let mut config = match commands::load_config(config_path.as_deref(), explicit) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    };
    if !cli.nodes.is_empty() {
        config.nodes = cli.nodes.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.call_timeout_ms = timeout_ms;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }

    init_logging(&config.log_level);

    let query = match cli.command {
        Commands::Config { action } => {
            match action {
                ConfigAction::Init { force } => {
                    let Some(path) = config_path else {
                        anyhow::bail!("no configuration directory, pass --config");
                    };
                    if let Err(e) = commands::init_config(&path, &config, force) {
                        eprintln!("Error: {}", e);
                        std::process::exit(exit_code(&e));
                    }
                    println!("Configuration written to: {}", path.display());
                }
                ConfigAction::Show => println!("{}", config.to_json()?),
            }
            return Ok(());
        }
        Commands::Height => Query::Height,
        Commands::Header { height } => Query::Header { height },
        Commands::Headers { from, until } => Query::Headers { from, until },
        Commands::Transaction { hash } => Query::Transaction { hash },
        Commands::ExplorerTransaction { hash } => Query::ExplorerTransaction { hash },
        Commands::VidCommon { height } => Query::VidCommon { height },
        Commands::Namespace { height, namespace } => Query::Namespace { height, namespace },
        Commands::MerkleProof { root_height, height } => Query::MerkleProof { root_height, height },
        Commands::Submit {
            namespace,
            payload_hex,
            payload_base64,
        } => match commands::parse_payload(payload_hex.as_deref(), payload_base64.as_deref()) {
            Ok(payload) => Query::Submit { namespace, payload },
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(exit_code(&e));
            }
        },
    };

    let client = match MultipleNodesClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    let ctx = CallContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling in-flight requests");
            canceller.cancel();
        }
    });

    debug!("Running {:?} against {} nodes", query, config.nodes.len());

    match commands::run_query(&client, &ctx, query).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error ({}): {}", e.kind(), e);
            std::process::exit(exit_code(&e));
        }
    }
}
