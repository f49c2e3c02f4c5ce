use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use stockbot_core::config::AppConfig;

#[derive(Clone)]
pub struct HealthState {
    quote_api: HealthCheck,
    messaging: HealthCheck,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub quote_api: HealthCheck,
    pub messaging: HealthCheck,
    pub checked_at: String,
}

impl HealthState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self { quote_api: quote_api_check(config), messaging: messaging_check(config) }
    }
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.quote_api.status == "ready" && state.messaging.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "stockbot-server runtime initialized".to_string(),
        },
        quote_api: state.quote_api,
        messaging: state.messaging,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn quote_api_check(config: &AppConfig) -> HealthCheck {
    if config.marketstack.has_access_key() {
        HealthCheck {
            status: "ready",
            detail: format!("marketstack access key configured for {}", config.marketstack.base_url),
        }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "marketstack access key is not configured; lookups will fail".to_string(),
        }
    }
}

fn messaging_check(config: &AppConfig) -> HealthCheck {
    if config.twilio.uses_placeholder_credentials() {
        HealthCheck {
            status: "degraded",
            detail: "twilio credentials are placeholder defaults; replies will not be delivered"
                .to_string(),
        }
    } else {
        HealthCheck {
            status: "ready",
            detail: format!("twilio sender `{}` configured", config.twilio.from_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use stockbot_core::config::AppConfig;

    use crate::health::{health, HealthState};

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.marketstack.access_key = Some("ms-key".to_string().into());
        config.twilio.account_sid = "AC123".to_string();
        config.twilio.auth_token = "token".to_string().into();
        config
    }

    #[tokio::test]
    async fn health_returns_ready_when_credentials_are_configured() {
        let (status, Json(payload)) =
            health(State(HealthState::from_config(&configured()))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.quote_api.status, "ready");
        assert_eq!(payload.messaging.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_is_degraded_without_marketstack_key() {
        let mut config = configured();
        config.marketstack.access_key = None;

        let (status, Json(payload)) = health(State(HealthState::from_config(&config))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.quote_api.status, "degraded");
        assert_eq!(payload.messaging.status, "ready");
    }

    #[tokio::test]
    async fn health_is_degraded_with_placeholder_twilio_credentials() {
        let mut config = configured();
        let defaults = AppConfig::default();
        config.twilio.account_sid = defaults.twilio.account_sid;

        let (status, Json(payload)) = health(State(HealthState::from_config(&config))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.messaging.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
