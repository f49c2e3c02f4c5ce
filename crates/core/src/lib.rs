pub mod config;
pub mod domain;
pub mod errors;
pub mod interpreter;

pub use domain::message::{InboundMessage, Reply};
pub use domain::quote::{PriceQuote, QuoteLookup};
pub use errors::{InterfaceError, LookupError};
pub use interpreter::{parse_message_command, CommandInterpreter, MessageCommand};
