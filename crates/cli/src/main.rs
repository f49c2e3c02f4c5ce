use std::process::ExitCode;

fn main() -> ExitCode {
    stockbot_cli::run()
}
