use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::LookupError;

/// Latest traded price for a symbol.
///
/// Providers may report the price as a JSON number or a numeric string; both are normalized to
/// `Decimal`, keeping the scale the provider sent. A `last` that is not numeric is treated as no
/// price at all (`LookupError::PriceUnavailable`) rather than being echoed into the reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub last_price: Decimal,
}

/// Latest-price lookup against a market data provider.
#[async_trait]
pub trait QuoteLookup: Send + Sync {
    async fn latest_price(&self, symbol: &str) -> Result<PriceQuote, LookupError>;
}

#[async_trait]
impl<T> QuoteLookup for std::sync::Arc<T>
where
    T: QuoteLookup + ?Sized,
{
    async fn latest_price(&self, symbol: &str) -> Result<PriceQuote, LookupError> {
        (**self).latest_price(symbol).await
    }
}
