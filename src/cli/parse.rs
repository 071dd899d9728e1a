//! CLI parse: clap types for treemeld. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// treemeld - policy-driven deep merge of layered configuration trees
#[derive(Parser)]
#[command(name = "treemeld")]
#[command(about = "Deep-merge layered configuration and specification trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml lookup)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge RIGHT onto LEFT and print the result
    Merge {
        /// Base document (.json or .toml)
        left: PathBuf,

        /// Override document (.json or .toml)
        right: PathBuf,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        output: OutputFormat,
    },
    /// Print the effective merge policy
    Policy {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Per-invocation overrides of the configured policy
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// List strategy (concatenate, replace, element_wise)
    #[arg(long)]
    pub list_strategy: Option<String>,

    /// None policy (skip_none, allow_none)
    #[arg(long)]
    pub none_policy: Option<String>,

    /// Type mismatch policy (error, skip_on_mismatch, force_override)
    #[arg(long)]
    pub on_mismatch: Option<String>,

    /// Maximum container nesting
    #[arg(long)]
    pub max_depth: Option<i64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Toml,
}
