use std::error::Error;

use clap::{command, Parser};
use colored::Colorize;
use env_logger::Env;
use fireside::{commands, model::registry::Registry};

#[derive(Parser)]
#[command(name = "fireside")]
#[command(version = "0.1.0")]
#[command(about = "Plain text accounting journals.", long_about = None)]
struct Cli {
    /// Default currency for amounts without a currency code
    #[arg(long, global = true, default_value = "USD")]
    currency: String,

    #[command(subcommand)]
    command: commands::Commands,
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let registry = Registry::with_default(&cli.currency)?;
    match &cli.command {
        commands::Commands::Check(c) => c.run(&registry),
        commands::Commands::Print(c) => c.run(&registry),
        commands::Commands::Balance(c) => c.run(&registry),
        commands::Commands::Income(c) => c.run(&registry),
        commands::Commands::Add(c) => c.run(&registry),
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "error:".red().bold(), e.to_string().trim_end());
        std::process::exit(1)
    };
}
