//! `docsync`: keeps a terminal view of uploaded PDFs in step with the document service.

mod platform;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use docsync_logging::LogDestination;

#[derive(Parser)]
#[command(name = "docsync", about = "Upload PDFs and follow their processing status")]
pub(crate) struct Cli {
    /// Base URL of the document service
    #[arg(long, env = "DOCSYNC_API_URL", default_value = "http://localhost:8010")]
    pub api_url: String,
    /// Seconds between status polls
    #[arg(long, default_value = "3")]
    pub poll_secs: u64,
    /// Directory holding the remembered selection
    #[arg(long, default_value = ".")]
    pub state_dir: PathBuf,
    /// Where log output goes
    #[arg(long, value_enum, default_value = "file")]
    pub log: LogTarget,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List documents and their status
    List,
    /// Upload PDF files
    Upload {
        /// Files to upload; anything that is not a PDF is skipped
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep polling until every uploaded document has finished processing
        #[arg(long)]
        wait: bool,
    },
    /// Follow processing status until interrupted
    Watch,
    /// Show one document; defaults to the last one shown
    Show {
        /// Document id
        id: Option<String>,
    },
    /// Delete a document
    Delete {
        /// Document id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogTarget {
    Terminal,
    File,
    Both,
    Off,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
            LogTarget::Off => LogDestination::Off,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    docsync_logging::initialize(cli.log.into(), log::LevelFilter::Info);
    platform::run(cli).await
}
