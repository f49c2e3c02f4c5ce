use std::sync::Arc;

use axum::Router;
use stockbot_core::config::AppConfig;
use stockbot_core::QuoteLookup;
use stockbot_marketstack::MarketstackClient;
use stockbot_twilio::{MessageSender, TwilioClient};
use thiserror::Error;
use tracing::{info, warn};

use crate::health::{self, HealthState};
use crate::webhook::{self, WebhookState};

pub struct Application {
    pub config: AppConfig,
    pub quote_lookup: Arc<dyn QuoteLookup>,
    pub message_sender: Arc<dyn MessageSender>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("market data client could not be built: {0}")]
    MarketDataClient(#[source] reqwest::Error),
    #[error("messaging client could not be built: {0}")]
    MessagingClient(#[source] reqwest::Error),
}

impl Application {
    pub fn router(&self) -> Router {
        webhook::router(WebhookState::new(
            self.quote_lookup.clone(),
            self.message_sender.clone(),
        ))
        .merge(health::router(HealthState::from_config(&self.config)))
    }
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let quote_lookup =
        MarketstackClient::new(&config.marketstack).map_err(BootstrapError::MarketDataClient)?;
    if !config.marketstack.has_access_key() {
        warn!(
            event_name = "system.bootstrap.marketstack_key_missing",
            correlation_id = "bootstrap",
            "marketstack access key is not set; symbol lookups will reply with an error"
        );
    }

    let message_sender =
        TwilioClient::new(&config.twilio).map_err(BootstrapError::MessagingClient)?;
    if config.twilio.uses_placeholder_credentials() {
        warn!(
            event_name = "system.bootstrap.twilio_placeholder_credentials",
            correlation_id = "bootstrap",
            "twilio credentials are placeholder defaults; replies will fail to send"
        );
    }
    info!(
        event_name = "system.bootstrap.clients_ready",
        correlation_id = "bootstrap",
        from_number = %message_sender.from_number(),
        "outbound clients initialized"
    );

    Ok(Application {
        config,
        quote_lookup: Arc::new(quote_lookup),
        message_sender: Arc::new(message_sender),
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use stockbot_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use tower::ServiceExt;

    use crate::bootstrap::bootstrap_with_config;

    fn health_request() -> Request<Body> {
        Request::builder().uri("/health").body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn placeholder_defaults_still_bootstrap_in_degraded_mode() {
        let app = bootstrap_with_config(AppConfig::default())
            .expect("placeholder credentials are not fatal");

        let health = app.router().oneshot(health_request()).await.expect("health response");

        assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!app.config.marketstack.has_access_key());
        assert!(app.config.twilio.uses_placeholder_credentials());
    }

    #[tokio::test]
    async fn bootstrapped_router_serves_webhook_and_health() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                marketstack_access_key: Some("ms-test".to_string()),
                twilio_account_sid: Some("ACtest".to_string()),
                twilio_auth_token: Some("secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load with valid overrides");
        let app = bootstrap_with_config(config).expect("bootstrap should succeed");

        let health = app.router().oneshot(health_request()).await.expect("health response");
        assert_eq!(health.status(), StatusCode::OK);

        let rejected = app
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("Body=Hi"))
                    .expect("request"),
            )
            .await
            .expect("webhook response");
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
