//! Chat command grammar and reply rendering.
//!
//! Three mutually exclusive forms, checked in order:
//! - `Hi` (exact) → greeting
//! - `sym:<symbol>` (prefix is case-insensitive) → latest price lookup
//! - anything else → usage help

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::message::Reply;
use crate::domain::quote::QuoteLookup;

pub const GREETING_REPLY: &str = "Hello, welcome to the Stock Market bot! Type sym:<stock_symbol> to know the price of the latest stock.";
pub const FORMAT_ERROR_REPLY: &str = "Invalid format. Please use sym:<stock_symbol>.";
pub const USAGE_REPLY: &str = "Invalid input. Please type 'Hi' to get started or use the format sym:<stock_symbol> to get stock prices.";
pub const LOOKUP_FAILED_REPLY: &str = "Unable to fetch the stock price right now.";

const GREETING: &str = "Hi";
const SYMBOL_PREFIX: &str = "sym:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageCommand {
    Greeting,
    Lookup { symbol: String },
    MalformedLookup,
    Unknown,
}

pub fn parse_message_command(input: &str) -> MessageCommand {
    let trimmed = input.trim();
    if trimmed == GREETING {
        return MessageCommand::Greeting;
    }

    if !has_symbol_prefix(trimmed) {
        return MessageCommand::Unknown;
    }

    match trimmed.split_once(':') {
        Some((_, rest)) if !rest.trim().is_empty() => {
            MessageCommand::Lookup { symbol: rest.trim().to_owned() }
        }
        _ => MessageCommand::MalformedLookup,
    }
}

fn has_symbol_prefix(text: &str) -> bool {
    text.get(..SYMBOL_PREFIX.len()).is_some_and(|head| head.eq_ignore_ascii_case(SYMBOL_PREFIX))
}

pub fn price_reply(symbol: &str, last_price: Decimal) -> Reply {
    Reply::from(format!("The stock price of {symbol} is: ${last_price}"))
}

/// Turns message text into a reply. Never fails: lookup errors become the reply text.
pub struct CommandInterpreter<L> {
    lookup: L,
}

impl<L> CommandInterpreter<L>
where
    L: QuoteLookup,
{
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub async fn reply(&self, text: &str) -> Reply {
        match parse_message_command(text) {
            MessageCommand::Greeting => Reply::from(GREETING_REPLY),
            MessageCommand::Lookup { symbol } => self.lookup_reply(&symbol).await,
            MessageCommand::MalformedLookup => Reply::from(FORMAT_ERROR_REPLY),
            MessageCommand::Unknown => Reply::from(USAGE_REPLY),
        }
    }

    async fn lookup_reply(&self, symbol: &str) -> Reply {
        match self.lookup.latest_price(symbol).await {
            Ok(quote) => {
                debug!(
                    event_name = "interpreter.lookup.succeeded",
                    symbol = %symbol,
                    last_price = %quote.last_price,
                    "quote lookup succeeded"
                );
                price_reply(symbol, quote.last_price)
            }
            Err(error) => {
                warn!(
                    event_name = "interpreter.lookup.failed",
                    symbol = %symbol,
                    error = %error,
                    "quote lookup failed"
                );
                let message = error.to_string();
                if message.is_empty() {
                    Reply::from(LOOKUP_FAILED_REPLY)
                } else {
                    Reply::from(message)
                }
            }
        }
    }
}
