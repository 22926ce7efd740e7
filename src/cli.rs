//! Command-line interface definition using clap.
//!
//! This module defines:
//! - [`Args`] - top-level CLI structure with one [`Command`] per action
//! - [`ListArgs`], [`SplitArgs`], [`MediaArgs`] - per-command arguments
//! - [`OutputFormat`] and [`MediaPolicyArg`] - value enums mapped onto the
//!   library types
//!
//! The argument structs turn themselves into library configuration, so the
//! binary only wires I/O around them:
//!
//! ```rust
//! use chatzip::cli::Args;
//! use clap::Parser;
//!
//! let args = Args::parse_from(["chatzip", "split", "chat.zip", "--start", "2024-01-10", "--end", "2024-01-20"]);
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{TranscriptConfig, ViewerConfig};
use crate::error::Result;
use crate::filter::FilterConfig;
use crate::output::OutputConfig;
use crate::split::{MediaPolicy, SplitOptions};
use crate::transcript::DateOrder;

/// Browse, filter and split WhatsApp-style chat export archives.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatzip")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatzip list chat.zip --search holiday
    chatzip list chat.zip --after 2024-01-01 --format csv -o listing.csv
    chatzip split chat.zip --start 2024-01-10 --end 2024-01-20
    chatzip split chat.zip --start 2024-01-10 --end 2024-01-20 --no-media
    chatzip media chat.zip")]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read numeric dates as month/day instead of day/month
    #[arg(long, global = true)]
    pub month_first: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available actions.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print or export the messages of an archive
    #[command(alias = "ls")]
    List(ListArgs),

    /// Write a new archive limited to a time range
    Split(SplitArgs),

    /// List the media entries of an archive
    Media(MediaArgs),
}

/// Arguments of `chatzip list`.
#[derive(ClapArgs, Debug, Clone)]
pub struct ListArgs {
    /// Path to the export archive
    pub archive: String,

    /// Case-insensitive substring to look for in sender or text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only messages from this sender (case-insensitive)
    #[arg(long, value_name = "USER")]
    pub from: Option<String>,

    /// Only messages at or after this date (YYYY-MM-DD[THH:MM[:SS]])
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Only messages at or before this date (YYYY-MM-DD[THH:MM[:SS]])
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Name of the archive owner, used to mark own messages
    #[arg(long, value_name = "NAME")]
    pub owner: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Include resolved attachments in the output
    #[arg(short, long)]
    pub attachments: bool,

    /// Include timestamps in structured output
    #[arg(short = 't', long)]
    pub timestamps: bool,

    /// Include the source transcript in structured output
    #[arg(long)]
    pub source: bool,
}

impl ListArgs {
    /// Builds the filter described by the arguments.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChatzipError::InvalidDate`] for malformed dates.
    pub fn filter_config(&self) -> Result<FilterConfig> {
        let mut config = FilterConfig::new();
        if let Some(ref search) = self.search {
            config = config.with_search(search.clone());
        }
        if let Some(ref from) = self.from {
            config = config.with_sender(from.clone());
        }
        if let Some(ref after) = self.after {
            config = config.with_date_from(after)?;
        }
        if let Some(ref before) = self.before {
            config = config.with_date_to(before)?;
        }
        Ok(config)
    }

    /// Builds the column selection for structured formats.
    pub fn output_config(&self) -> OutputConfig {
        let mut config = OutputConfig::new();
        if self.timestamps {
            config = config.with_timestamps();
        }
        if self.attachments {
            config = config.with_attachments();
        }
        if self.source {
            config = config.with_source();
        }
        config
    }
}

/// Arguments of `chatzip split`.
#[derive(ClapArgs, Debug, Clone)]
pub struct SplitArgs {
    /// Path to the export archive
    pub archive: String,

    /// Range start (YYYY-MM-DD[THH:MM[:SS]])
    #[arg(long, value_name = "DATE")]
    pub start: String,

    /// Range end, inclusive (a bare date covers the whole day)
    #[arg(long, value_name = "DATE")]
    pub end: String,

    /// Leave the chat transcript out
    #[arg(long)]
    pub no_chat: bool,

    /// Leave all media out
    #[arg(long)]
    pub no_media: bool,

    /// Only copy media with these extensions (comma separated)
    #[arg(long, value_name = "LIST")]
    pub media_ext: Option<String>,

    /// Which media to copy
    #[arg(long, value_enum, default_value = "linked")]
    pub media: MediaPolicyArg,

    /// Shortcut for `--media all`
    #[arg(long, conflicts_with = "media")]
    pub all_media: bool,

    /// Output path (defaults to <archive>-split-<start>-<end>.zip)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print progress to stderr
    #[arg(long)]
    pub progress: bool,
}

impl SplitArgs {
    /// Builds validated split options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ChatzipError::InvalidDate`] for malformed dates and
    /// [`crate::ChatzipError::InvalidRange`] if the end precedes the start.
    pub fn options(&self) -> Result<SplitOptions> {
        let policy = if self.all_media {
            MediaPolicy::All
        } else {
            self.media.into()
        };
        let mut options = SplitOptions::from_inputs(&self.start, &self.end)?
            .with_chat_text(!self.no_chat)
            .with_media(!self.no_media)
            .with_media_policy(policy);
        if let Some(ref list) = self.media_ext {
            options = options.with_media_extensions(list.split(','));
        }
        Ok(options)
    }
}

/// Arguments of `chatzip media`.
#[derive(ClapArgs, Debug, Clone)]
pub struct MediaArgs {
    /// Path to the export archive
    pub archive: String,

    /// Also list which messages reference each entry
    #[arg(short, long)]
    pub linked: bool,
}

impl Args {
    /// Session configuration derived from global flags.
    pub fn viewer_config(&self) -> ViewerConfig {
        let order = if self.month_first {
            DateOrder::MonthFirst
        } else {
            DateOrder::DayFirst
        };
        let transcript = TranscriptConfig::default()
            .with_date_order(order)
            .with_detect_date_order(!self.month_first);
        let config = ViewerConfig::default().with_transcript(transcript);
        match self.command {
            Command::List(ListArgs {
                owner: Some(ref owner),
                ..
            }) => config.with_owner_name(owner.clone()),
            _ => config,
        }
    }

    /// Default log directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Transcript lines as they appear in the export
    #[default]
    #[value(alias = "txt")]
    Text,

    /// CSV with semicolon delimiter
    Csv,

    /// JSON array of messages
    Json,

    /// JSON Lines - one JSON object per line
    #[value(alias = "ndjson")]
    Jsonl,
}

// Conversion to library format type
impl From<OutputFormat> for crate::format::OutputFormat {
    fn from(format: OutputFormat) -> crate::format::OutputFormat {
        match format {
            OutputFormat::Text => crate::format::OutputFormat::Text,
            OutputFormat::Csv => crate::format::OutputFormat::Csv,
            OutputFormat::Json => crate::format::OutputFormat::Json,
            OutputFormat::Jsonl => crate::format::OutputFormat::Jsonl,
        }
    }
}

/// Media selection options for `split`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
pub enum MediaPolicyArg {
    /// Media referenced by selected messages
    #[default]
    Linked,
    /// Linked media plus media whose filename date is in range
    InRange,
    /// Every media entry
    All,
}

impl From<MediaPolicyArg> for MediaPolicy {
    fn from(policy: MediaPolicyArg) -> MediaPolicy {
        match policy {
            MediaPolicyArg::Linked => MediaPolicy::Linked,
            MediaPolicyArg::InRange => MediaPolicy::InRange,
            MediaPolicyArg::All => MediaPolicy::All,
        }
    }
}
