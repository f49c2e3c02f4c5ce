//! Marketstack latest-price client.
//!
//! Calls `GET {base_url}/tickers/{symbol}/intraday/latest?access_key=...` and reads the `last`
//! field of the response. Error messages are user-facing: they are relayed to the chat as-is.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use stockbot_core::config::MarketstackConfig;
use stockbot_core::{LookupError, PriceQuote, QuoteLookup};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct MarketstackClient {
    client: Client,
    base_url: String,
    access_key: Option<SecretString>,
}

#[derive(Debug, Default, Deserialize)]
struct IntradayLatest {
    #[serde(default)]
    last: Option<Value>,
}

impl MarketstackClient {
    pub fn new(config: &MarketstackConfig) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            access_key: config.access_key.clone(),
        })
    }

    fn latest_url(&self, symbol: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| LookupError::Transport(format!("invalid base url: {error}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                LookupError::Transport("invalid base url: cannot hold a path".to_owned())
            })?;
            segments.pop_if_empty().extend(["tickers", symbol, "intraday", "latest"]);
        }
        Ok(url)
    }
}

#[async_trait]
impl QuoteLookup for MarketstackClient {
    async fn latest_price(&self, symbol: &str) -> Result<PriceQuote, LookupError> {
        let access_key = self
            .access_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(LookupError::MissingApiKey)?;

        let url = self.latest_url(symbol)?;
        debug!(event_name = "marketstack.request", symbol = %symbol, "requesting latest price");

        let response = self
            .client
            .get(url)
            .query(&[("access_key", access_key.expose_secret())])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Upstream { status: status.as_u16(), body });
        }

        let payload: IntradayLatest =
            response.json().await.map_err(transport_error)?;
        let last_price =
            payload.last.as_ref().and_then(parse_price).ok_or(LookupError::PriceUnavailable)?;

        Ok(PriceQuote { symbol: symbol.to_owned(), last_price })
    }
}

// The request URL carries the access key, so it never reaches a reply.
fn transport_error(error: reqwest::Error) -> LookupError {
    LookupError::Transport(error.without_url().to_string())
}

/// Accepts JSON numbers and numeric strings.
fn parse_price(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use axum::{
        extract::{Path, Query},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use stockbot_core::config::MarketstackConfig;
    use stockbot_core::{LookupError, QuoteLookup};

    use super::{parse_price, MarketstackClient};

    async fn latest(
        Path(symbol): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if params.get("access_key").map(String::as_str) != Some("test-key") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": { "code": "invalid_access_key" } })),
            );
        }

        match symbol.as_str() {
            "AAPL" => (StatusCode::OK, Json(json!({ "symbol": "AAPL", "last": 187.42 }))),
            "MSFT" => (StatusCode::OK, Json(json!({ "symbol": "MSFT", "last": "410.50" }))),
            "BRK/B" => (StatusCode::OK, Json(json!({ "symbol": "BRK/B", "last": 455 }))),
            "HALT" => (StatusCode::OK, Json(json!({ "symbol": "HALT", "last": null }))),
            "EMPTY" => (StatusCode::OK, Json(json!({ "symbol": "EMPTY" }))),
            "SUSP" => (StatusCode::OK, Json(json!({ "symbol": "SUSP", "last": "n/a" }))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown symbol" }))),
        }
    }

    async fn spawn_stub() -> String {
        let router = Router::new().route("/v1/tickers/{symbol}/intraday/latest", get(latest));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{address}/v1")
    }

    fn client(base_url: &str, access_key: Option<&str>) -> MarketstackClient {
        MarketstackClient::new(&MarketstackConfig {
            access_key: access_key.map(|key| key.to_owned().into()),
            base_url: base_url.to_owned(),
            timeout_secs: 5,
        })
        .expect("client")
    }

    #[tokio::test]
    async fn numeric_last_price_is_returned() {
        let base_url = spawn_stub().await;

        let quote = client(&base_url, Some("test-key")).latest_price("AAPL").await.expect("quote");

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.last_price, Decimal::from_str("187.42").expect("decimal"));
    }

    #[tokio::test]
    async fn string_last_price_is_accepted() {
        let base_url = spawn_stub().await;

        let quote = client(&base_url, Some("test-key")).latest_price("MSFT").await.expect("quote");

        assert_eq!(quote.last_price.to_string(), "410.50");
    }

    #[tokio::test]
    async fn symbol_is_sent_as_a_single_path_segment() {
        let base_url = spawn_stub().await;

        let quote = client(&base_url, Some("test-key")).latest_price("BRK/B").await.expect("quote");

        assert_eq!(quote.last_price, Decimal::from(455));
    }

    #[tokio::test]
    async fn missing_access_key_fails_before_any_request() {
        let error = client("http://127.0.0.1:9/v1", None)
            .latest_price("AAPL")
            .await
            .expect_err("missing key");

        assert_eq!(error, LookupError::MissingApiKey);
        assert_eq!(error.to_string(), "API_KEY is not set in environment variables");
    }

    #[tokio::test]
    async fn non_ok_status_reports_status_and_body() {
        let base_url = spawn_stub().await;

        let error = client(&base_url, Some("test-key"))
            .latest_price("NOPE")
            .await
            .expect_err("unknown symbol");

        let message = error.to_string();
        assert!(message.starts_with("Error fetching data: 404 - "), "got `{message}`");
        assert!(message.contains("unknown symbol"), "got `{message}`");
    }

    #[tokio::test]
    async fn rejected_access_key_surfaces_upstream_status() {
        let base_url = spawn_stub().await;

        let error =
            client(&base_url, Some("wrong-key")).latest_price("AAPL").await.expect_err("401");

        assert!(matches!(error, LookupError::Upstream { status: 401, .. }));
    }

    #[tokio::test]
    async fn null_or_absent_last_price_is_unavailable() {
        let base_url = spawn_stub().await;
        let client = client(&base_url, Some("test-key"));

        let halted = client.latest_price("HALT").await.expect_err("null last");
        let empty = client.latest_price("EMPTY").await.expect_err("absent last");

        assert_eq!(halted, LookupError::PriceUnavailable);
        assert_eq!(empty.to_string(), "Stock price not available");
    }

    #[tokio::test]
    async fn non_numeric_string_last_price_is_unavailable() {
        let base_url = spawn_stub().await;

        let error = client(&base_url, Some("test-key"))
            .latest_price("SUSP")
            .await
            .expect_err("non-numeric last");

        assert_eq!(error, LookupError::PriceUnavailable);
        assert_eq!(error.to_string(), "Stock price not available");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_transport_error() {
        let error = client("http://127.0.0.1:9/v1", Some("test-key"))
            .latest_price("AAPL")
            .await
            .expect_err("connection refused");

        let message = error.to_string();
        assert!(matches!(error, LookupError::Transport(_)));
        assert!(!message.is_empty());
        assert!(!message.starts_with("Error fetching data"), "got `{message}`");
        assert!(!message.contains("test-key"), "access key leaked into `{message}`");
    }

    #[test]
    fn parse_price_rejects_non_numeric_values() {
        assert_eq!(parse_price(&json!("12.5")), Some(Decimal::from_str("12.5").expect("decimal")));
        assert_eq!(parse_price(&json!("n/a")), None);
        assert_eq!(parse_price(&json!(true)), None);
        assert_eq!(parse_price(&Value::Null), None);
    }
}
