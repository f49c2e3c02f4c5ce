use thiserror::Error;

/// Failures of a quote lookup. The `Display` text is sent to the user verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("API_KEY is not set in environment variables")]
    MissingApiKey,
    #[error("Error fetching data: {status} - {body}")]
    Upstream { status: u16, body: String },
    #[error("Stock price not available")]
    PriceUnavailable,
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("missing parameters: {fields}")]
    MissingParameters { fields: String, correlation_id: String },
    #[error("malformed webhook payload: {detail}")]
    MalformedPayload { detail: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingParameters { .. } | Self::MalformedPayload { .. } => "Missing parameters",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::MissingParameters { correlation_id, .. }
            | Self::MalformedPayload { correlation_id, .. } => correlation_id,
        }
    }
}
