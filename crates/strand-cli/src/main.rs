use clap::Parser;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    tracing_subscriber::fmt()
        .with_max_level(commands::log_level(cli.verbose, &config))
        .with_writer(std::io::stderr)
        .init();
    commands::run_command(cli, config)
}
