pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "stockbot",
    about = "Stockbot operator CLI",
    long_about = "Inspect configuration, check credential readiness, and try chat commands locally.",
    after_help = "Examples:\n  stockbot doctor --json\n  stockbot config\n  stockbot ask sym:AAPL"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check Marketstack and Twilio credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Compute the reply for a chat message without sending it")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Message text, e.g. `Hi` or `sym:AAPL`")]
        text: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { text } => commands::ask::run(&text.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
