//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// X-Fidelity - archetype-driven repository static analysis
#[derive(Parser)]
#[command(name = "xfidelity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a repository against an archetype's rule set
    Scan {
        /// Repository root to scan
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Archetype name
        #[arg(long, default_value = "node-fullstack")]
        archetype: String,

        /// Remote config server base URL
        #[arg(long)]
        config_server: Option<String>,

        /// Local directory holding `{archetype}.json` and exemption files
        #[arg(long)]
        local_config_path: Option<String>,

        /// Additional plugin names to load beyond the archetype's own declarations
        #[arg(long = "plugin")]
        extra_plugins: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Inspect the plugin registry
    Plugins {
        #[command(subcommand)]
        command: PluginsCommands,
    },
}

#[derive(Subcommand)]
pub enum PluginsCommands {
    /// Resolve an archetype's declared plugins and list what loaded
    List {
        /// Archetype name
        #[arg(long, default_value = "node-fullstack")]
        archetype: String,

        /// Local directory holding `{archetype}.json`
        #[arg(long)]
        local_config_path: Option<String>,
    },
}
