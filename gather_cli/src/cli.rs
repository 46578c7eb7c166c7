use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gather")]
#[command(about = "Gather - search many providers at once, merged by key")]
#[command(version)]
#[command(after_help = "\x1b[1;36mQuick Start:\x1b[0m
  gather config init                      Write a starter config
  gather providers                        List configured providers
  gather search c.68 --context BRCA1      Search every provider within BRCA1
  gather validate rs1                     Check whether any provider knows rs1

\x1b[1;36mMore Info:\x1b[0m
  gather <command> --help                 Get help for any command")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/gather/config.yaml)
    #[arg(long, global = true, env = "GATHER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every enabled provider and merge the results by key
    ///
    /// Nothing is searched until a context is chosen with --context.
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  gather search hg19 --context GENE_X
  gather search c.68 --context BRCA1 --partial
  gather search rs --context TP53 --timeout-ms 2000 --output json")]
    Search {
        /// Search term
        term: String,
        /// Context the search runs under (e.g. a gene symbol)
        #[arg(short, long)]
        context: Option<String>,
        /// Return what succeeded instead of failing when a provider errors
        #[arg(long)]
        partial: bool,
        /// Per-provider timeout in milliseconds (overrides the config)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Check whether any provider recognizes an identifier
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  gather validate rs1
  gather validate NM_007294.3:c.68_69del --partial")]
    Validate {
        /// Identifier to check
        id: String,
        /// Ignore failing providers when no provider confirms the identifier
        #[arg(long)]
        partial: bool,
    },

    /// List configured providers in registration order
    #[command(alias = "ls")]
    Providers,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Pretty,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Plain text output
    Text,
}
