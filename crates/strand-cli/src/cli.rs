use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strand",
    about = "Strand: drive an object sync bridge from the command line",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML bridge configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a bridge and run one operation
    Call(CallArgs),
    /// Run one operation per line against a single bridge
    Script(ScriptArgs),
    /// List the operations a bridge accepts
    Ops,
}

#[derive(Args)]
pub struct CallArgs {
    /// Operation name, e.g. `get` or `requestStream`
    pub op: String,
    /// Raw payload; empty when omitted
    pub payload: Option<String>,
}

#[derive(Args)]
pub struct ScriptArgs {
    /// File of `<op> [payload]` lines; `$_` expands to the previous reply
    pub file: PathBuf,
    /// Stop at the first failing line
    #[arg(long)]
    pub fail_fast: bool,
}
