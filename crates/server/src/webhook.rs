use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use stockbot_core::{CommandInterpreter, InboundMessage, InterfaceError, QuoteLookup};
use stockbot_twilio::MessageSender;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct WebhookState {
    interpreter: Arc<CommandInterpreter<Arc<dyn QuoteLookup>>>,
    sender: Arc<dyn MessageSender>,
}

impl WebhookState {
    pub fn new(lookup: Arc<dyn QuoteLookup>, sender: Arc<dyn MessageSender>) -> Self {
        Self { interpreter: Arc::new(CommandInterpreter::new(lookup)), sender }
    }
}

/// Form fields posted by the messaging provider.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
    #[serde(rename = "From", default)]
    pub from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/webhook", post(receive_message)).with_state(state)
}

pub async fn receive_message(
    State(state): State<WebhookState>,
    form: Result<Form<WebhookForm>, FormRejection>,
) -> Result<(StatusCode, Json<WebhookAck>), (StatusCode, Json<WebhookError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let Form(form) = form.map_err(|rejection| {
        reject(InterfaceError::MalformedPayload {
            detail: rejection.body_text(),
            correlation_id: correlation_id.clone(),
        })
    })?;

    let text = form.body.as_deref().unwrap_or_default().trim();
    let sender = form.from.as_deref().unwrap_or_default();
    info!(
        event_name = "webhook.message.received",
        correlation_id = %correlation_id,
        sender = %sender,
        text = %text,
        "received message"
    );

    let message = InboundMessage::from_raw(text, sender).ok_or_else(|| {
        reject(InterfaceError::MissingParameters {
            fields: missing_fields(text, sender),
            correlation_id: correlation_id.clone(),
        })
    })?;

    let reply = state.interpreter.reply(&message.text).await;

    match state.sender.send(reply.as_str(), &message.sender_id).await {
        Ok(receipt) => info!(
            event_name = "webhook.reply.sent",
            correlation_id = %correlation_id,
            sender = %message.sender_id,
            message_sid = %receipt.message_sid,
            "reply delivered"
        ),
        // Delivery failures never reach the provider; the webhook still acknowledges.
        Err(delivery_error) => error!(
            event_name = "webhook.reply.failed",
            correlation_id = %correlation_id,
            sender = %message.sender_id,
            error = %delivery_error,
            "Failed to send message"
        ),
    }

    Ok((StatusCode::OK, Json(WebhookAck { status: "OK" })))
}

fn missing_fields(text: &str, sender: &str) -> String {
    let mut fields = Vec::new();
    if text.is_empty() {
        fields.push("Body");
    }
    if sender.trim().is_empty() {
        fields.push("From");
    }
    fields.join(", ")
}

fn reject(interface_error: InterfaceError) -> (StatusCode, Json<WebhookError>) {
    warn!(
        event_name = "webhook.request.rejected",
        correlation_id = %interface_error.correlation_id(),
        error = %interface_error,
        "webhook request rejected"
    );
    (
        StatusCode::BAD_REQUEST,
        Json(WebhookError {
            error: interface_error.user_message().to_owned(),
            correlation_id: interface_error.correlation_id().to_owned(),
        }),
    )
}
