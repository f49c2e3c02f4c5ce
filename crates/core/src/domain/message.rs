use serde::{Deserialize, Serialize};

/// One inbound chat message. Lives for a single webhook request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub sender_id: String,
}

impl InboundMessage {
    /// Builds a message from raw webhook fields. The text is trimmed; `None` when either
    /// field is empty after trimming.
    pub fn from_raw(text: &str, sender_id: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || sender_id.trim().is_empty() {
            return None;
        }
        Some(Self { text: text.to_owned(), sender_id: sender_id.to_owned() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reply(String);

impl Reply {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
