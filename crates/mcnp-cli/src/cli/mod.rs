pub mod commands;
pub mod config;
pub mod protocol;

pub use commands::{execute, Workspace};
pub use config::CliConfig;
pub use protocol::{ChannelArg, CliCommand};
