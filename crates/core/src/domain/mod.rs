pub mod message;
pub mod quote;
