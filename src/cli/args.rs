//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::application::SortDirection;

/// Build and query parent-keyed record hierarchies
#[derive(Parser, Debug)]
#[command(name = "hiertree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory searched for a local .hiertree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Record field holding the primary key
    #[arg(long, global = true, env = "HIERTREE_KEY_FIELD")]
    pub key_field: Option<String>,

    /// Record field holding the parent's primary key
    #[arg(long, global = true, env = "HIERTREE_PARENT_KEY_FIELD")]
    pub parent_key_field: Option<String>,

    /// Indentation unit for listings
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the flattened, indented value → label listing
    List {
        /// JSON file with an array of records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Listing key field
        #[arg(long)]
        value: Option<String>,
        /// Listing label field
        #[arg(long)]
        label: Option<String>,
        /// Do not indent labels
        #[arg(long)]
        no_prefix: bool,
    },

    /// Print the values below the root or below one record
    Values {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Start below this primary key instead of the root
        #[arg(long)]
        from: Option<String>,
        /// Field to collect
        #[arg(long)]
        value: Option<String>,
    },

    /// Print the records at one depth (top-level records are level 1)
    Level {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        level: usize,
    },

    /// Draw the hierarchy
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long)]
        label: Option<String>,
    },

    /// Print the keys that cannot become the parent of a record
    Disabled {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Primary key of the record being re-parented
        pk: String,
    },

    /// Print nested option groups as JSON
    Groups {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortDirection>,
    },

    /// Print a parent-selection control model as JSON
    Select {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long)]
        label: Option<String>,
        /// Record being edited; it and its subtree are disabled
        #[arg(long)]
        current: Option<String>,
        /// Empty first option text
        #[arg(long, default_value = "")]
        prompt: String,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented configuration template
    Template,
}
