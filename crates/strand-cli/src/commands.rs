use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use strand_bridge::{Bridge, BridgeConfig, Operation, Reply};
use tracing::Level;

use crate::cli::*;

/// Placeholder in script lines for the previous successful reply.
const LAST_REPLY: &str = "$_";

pub fn load_config(path: Option<&Path>) -> anyhow::Result<BridgeConfig> {
    match path {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

pub fn log_level(verbose: bool, config: &BridgeConfig) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    config.log_level.parse().unwrap_or(Level::INFO)
}

pub fn run_command(cli: Cli, config: BridgeConfig) -> anyhow::Result<()> {
    match cli.command {
        Command::Call(args) => cmd_call(args, config, cli.format),
        Command::Script(args) => cmd_script(args, config, cli.format),
        Command::Ops => cmd_ops(),
    }
}

fn start(config: BridgeConfig) -> anyhow::Result<Bridge> {
    let bridge = Bridge::new(config);
    if let Reply::Error(e) = bridge.call(Operation::Init.name(), b"") {
        bail!("init failed: {e}");
    }
    Ok(bridge)
}

fn cmd_call(args: CallArgs, config: BridgeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let bridge = start(config)?;
    let payload = args.payload.unwrap_or_default();
    let reply = bridge.call(&args.op, payload.as_bytes());
    print_reply(&args.op, &reply, format);
    if let Reply::Error(e) = reply {
        bail!("{} failed: {e}", args.op);
    }
    Ok(())
}

fn cmd_script(args: ScriptArgs, config: BridgeConfig, format: OutputFormat) -> anyhow::Result<()> {
    let script = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading script {}", args.file.display()))?;
    let bridge = start(config)?;

    let mut last = String::new();
    let mut failures = 0usize;
    for (op, payload) in parse_script(&script) {
        let payload = payload.replace(LAST_REPLY, &last);
        let reply = bridge.call(op, payload.as_bytes());
        print_reply(op, &reply, format);
        match reply {
            Reply::Payload(bytes) => last = String::from_utf8_lossy(&bytes).into_owned(),
            Reply::Error(_) => {
                failures += 1;
                if args.fail_fast {
                    break;
                }
            }
        }
    }
    if failures > 0 {
        bail!("{failures} call(s) failed");
    }
    Ok(())
}

fn cmd_ops() -> anyhow::Result<()> {
    for op in Operation::ALL {
        println!("  {}", op.name().cyan());
    }
    Ok(())
}

/// Split a script into `(op, payload)` pairs, skipping blanks and `#` comments.
fn parse_script(script: &str) -> Vec<(&str, &str)> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((op, payload)) => (op, payload.trim()),
            None => (line, ""),
        })
        .collect()
}

fn print_reply(op: &str, reply: &Reply, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = match reply {
                Reply::Payload(bytes) => serde_json::json!({
                    "op": op,
                    "ok": true,
                    "payload": String::from_utf8_lossy(bytes),
                }),
                Reply::Error(e) => serde_json::json!({"op": op, "ok": false, "error": e}),
            };
            println!("{value}");
        }
        OutputFormat::Text => match reply {
            Reply::Payload(bytes) if bytes.is_empty() => println!("{} {}", "✓".green().bold(), op),
            Reply::Payload(bytes) => println!(
                "{} {} {}",
                "✓".green().bold(),
                op,
                String::from_utf8_lossy(bytes)
            ),
            Reply::Error(e) => println!("{} {} {}", "✗".red().bold(), op, e.red()),
        },
    }
}
