use stockbot_core::config::{AppConfig, LoadOptions};
use stockbot_core::CommandInterpreter;
use stockbot_marketstack::MarketstackClient;

use crate::commands::CommandResult;

/// Runs one message through the interpreter against the configured quote API. Nothing is sent.
pub fn run(text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("ask", "config_validation", error.to_string(), 2),
    };

    let lookup = match MarketstackClient::new(&config.marketstack) {
        Ok(lookup) => lookup,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "client_init",
                format!("failed to build market data client: {error}"),
                3,
            )
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                4,
            )
        }
    };

    let interpreter = CommandInterpreter::new(lookup);
    let reply = runtime.block_on(interpreter.reply(text));
    CommandResult::success("ask", reply.into_string())
}
