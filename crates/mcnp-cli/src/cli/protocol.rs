use std::path::PathBuf;

use mcnp_core::DeliveryChannel;

/// Delivery channel as named on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChannelArg {
    Foreground,
    Background,
    Presented,
    Tapped,
}

impl From<ChannelArg> for DeliveryChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Foreground => DeliveryChannel::Foreground,
            ChannelArg::Background => DeliveryChannel::Background,
            ChannelArg::Presented => DeliveryChannel::AlreadyPresented,
            ChannelArg::Tapped => DeliveryChannel::Tapped,
        }
    }
}

/// CLI command parsed from arguments
#[derive(Debug, Clone)]
pub enum CliCommand {
    /// List history records, optionally filtered
    HistoryList {
        unread_only: bool,
        kind: Option<String>,
    },
    HistoryStats,
    HistorySearch { query: String },
    HistoryMarkRead { id: String },
    HistoryMarkAllRead,
    HistoryDelete { ids: Vec<String> },
    HistoryClear,
    /// Write the export envelope to a file, or return it inline
    HistoryExport { output: Option<PathBuf> },
    HistoryImport { input: PathBuf },
    /// Recompute the unread counter from the list
    HistorySync,
    HistoryCompress,
    /// Ingest one raw notification payload
    Ingest { json: String, channel: ChannelArg },
    SessionStatus,
    /// Simulate a force logout
    SessionInvalidate { reason: Option<String> },
    SessionValidate,
    SessionClear,
    FormShow { user_id: String },
    FormClear { user_id: String },
}
