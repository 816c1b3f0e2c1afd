use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mcnp_cli::cli::{execute, ChannelArg, CliCommand, CliConfig, Workspace};

#[derive(Parser)]
#[command(name = "mcnp-cli")]
#[command(about = "Inspect and repair the MCNP client's local data")]
struct Cli {
    /// Data directory holding storage.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, short, global = true)]
    pretty: bool,

    /// Path to JSON config file (dataDir, apiUrl)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Notification history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Ingest a raw notification payload (JSON)
    Ingest {
        json: String,
        #[arg(long, value_enum, default_value = "foreground")]
        channel: ChannelArg,
    },

    /// Session validity flag
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Cached profile form state
    Form {
        #[command(subcommand)]
        action: FormAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List records, newest first
    List {
        #[arg(long)]
        unread: bool,
        /// Only records with this data.type
        #[arg(long = "type")]
        kind: Option<String>,
    },
    Stats,
    Search {
        query: String,
    },
    MarkRead {
        id: String,
    },
    MarkAllRead,
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Clear,
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    Import {
        input: PathBuf,
    },
    /// Recompute the unread counter from the list
    Sync,
    /// Strip payloads down to navigation and type fields
    Compress,
}

#[derive(Subcommand)]
enum SessionAction {
    Status,
    /// Mark the session invalid, as a force logout would
    Invalidate {
        #[arg(long)]
        reason: Option<String>,
    },
    Validate,
    Clear,
}

#[derive(Subcommand)]
enum FormAction {
    Show { user_id: String },
    Clear { user_id: String },
}

fn main() {
    let mut cli = Cli::parse();
    mcnp_core::tracing_setup::init_tracing_with_service("mcnp-cli");

    let command = match cli.command.take() {
        Some(Commands::History { action }) => match action {
            HistoryAction::List { unread, kind } => CliCommand::HistoryList {
                unread_only: unread,
                kind,
            },
            HistoryAction::Stats => CliCommand::HistoryStats,
            HistoryAction::Search { query } => CliCommand::HistorySearch { query },
            HistoryAction::MarkRead { id } => CliCommand::HistoryMarkRead { id },
            HistoryAction::MarkAllRead => CliCommand::HistoryMarkAllRead,
            HistoryAction::Delete { ids } => CliCommand::HistoryDelete { ids },
            HistoryAction::Clear => CliCommand::HistoryClear,
            HistoryAction::Export { output } => CliCommand::HistoryExport { output },
            HistoryAction::Import { input } => CliCommand::HistoryImport { input },
            HistoryAction::Sync => CliCommand::HistorySync,
            HistoryAction::Compress => CliCommand::HistoryCompress,
        },
        Some(Commands::Ingest { json, channel }) => CliCommand::Ingest { json, channel },
        Some(Commands::Session { action }) => match action {
            SessionAction::Status => CliCommand::SessionStatus,
            SessionAction::Invalidate { reason } => CliCommand::SessionInvalidate { reason },
            SessionAction::Validate => CliCommand::SessionValidate,
            SessionAction::Clear => CliCommand::SessionClear,
        },
        Some(Commands::Form { action }) => match action {
            FormAction::Show { user_id } => CliCommand::FormShow { user_id },
            FormAction::Clear { user_id } => CliCommand::FormClear { user_id },
        },
        None => {
            eprintln!("No command specified. Use --help for usage.");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(command, &cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: CliCommand, cli: &Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let config = file_config.core_config(cli.data_dir.clone());
    let workspace = Workspace::open(&config)?;

    let result = execute(command, &workspace)?;
    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}
