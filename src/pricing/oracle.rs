use std::time::{Duration, SystemTime};

use isahc::{config::Configurable, AsyncReadResponseExt, HttpClient};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use super::{PriceFeed, PriceQuote};
use crate::{
    common::types::{FallbackPrices, OracleEndpoints, ProgramConfig},
    error::ClientError,
};

/// Timeout of a single market data request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct UsdPrice {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    solana: Option<UsdPrice>,
}

/// Liquidity reported for a trading pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairLiquidity {
    pub usd: Option<f64>,
}

/// Token side of a trading pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PairToken {
    pub address: String,
    pub symbol: Option<String>,
}

/// Trading pair as reported by DexScreener
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    pub dex_id: Option<String>,
    pub pair_address: Option<String>,
    /// Reported as a decimal string, occasionally as a number
    pub price_usd: Option<serde_json::Value>,
    pub liquidity: Option<PairLiquidity>,
    pub base_token: Option<PairToken>,
}

impl DexPair {
    /// USD liquidity of the pair, 0 when not reported
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|liquidity| liquidity.usd)
            .filter(|usd| usd.is_finite())
            .unwrap_or(0.0)
    }

    /// USD price of the pair's base token, if it is a positive finite number
    pub fn price(&self) -> Option<f64> {
        let price = match self.price_usd.as_ref()? {
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            serde_json::Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

#[derive(Debug, Deserialize)]
struct DexTokensResponse {
    pairs: Option<Vec<DexPair>>,
}

/// Extracts `solana.usd` from a CoinGecko simple price response
pub fn parse_base_asset_price(body: &str) -> Result<f64, ClientError> {
    let response: SimplePriceResponse = serde_json::from_str(body)?;
    response
        .solana
        .and_then(|price| price.usd)
        .filter(|usd| usd.is_finite() && *usd > 0.0)
        .ok_or_else(|| ClientError::PriceUnavailable("solana.usd missing or not positive".to_string()))
}

/// Selects the trading pair with the highest USD liquidity
///
/// Pairs whose base token is not `token` are ignored. Missing liquidity counts as zero and
/// ties go to the pair listed first.
pub fn select_most_liquid_pair<'a>(pairs: &'a [DexPair], token: &Pubkey) -> Option<&'a DexPair> {
    let token = token.to_string();
    pairs
        .iter()
        .filter(|pair| {
            pair.base_token
                .as_ref()
                .map_or(true, |base| base.address == token)
        })
        .fold(None, |best: Option<&DexPair>, pair| match best {
            Some(current) if current.liquidity_usd() >= pair.liquidity_usd() => Some(current),
            _ => Some(pair),
        })
}

/// Parses a DexScreener token response into the price and liquidity of the deepest pair
pub fn parse_reward_token_price(body: &str, token: &Pubkey) -> Result<(f64, f64), ClientError> {
    let response: DexTokensResponse = serde_json::from_str(body)?;
    let pairs = response.pairs.unwrap_or_default();

    let pair = select_most_liquid_pair(&pairs, token)
        .ok_or_else(|| ClientError::PriceUnavailable(format!("no trading pairs for {}", token)))?;
    let price = pair.price().ok_or_else(|| {
        ClientError::PriceUnavailable(format!(
            "pair {} has no usable priceUsd",
            pair.pair_address.as_deref().unwrap_or("unknown")
        ))
    })?;

    debug!(
        %token,
        price,
        liquidity_usd = pair.liquidity_usd(),
        dex = pair.dex_id.as_deref().unwrap_or("unknown"),
        pair = pair.pair_address.as_deref().unwrap_or("unknown"),
        "resolved reward token price"
    );

    Ok((price, pair.liquidity_usd()))
}

/// Live price oracle backed by CoinGecko (SOL) and DexScreener (reward token)
///
/// Lookups never fail from the caller's point of view: any transport error, non-2xx status,
/// malformed body or empty pair list is logged and replaced by the configured fallback price.
///
/// # Examples
///
/// ```no_run
/// use solbridge::{common::types::{FallbackPrices, OracleEndpoints}, pricing::{PriceFeed, PriceOracle}};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let oracle = PriceOracle::new(OracleEndpoints::default(), FallbackPrices::default())?;
/// let sol_usd = oracle.base_asset_price().await;
/// println!("SOL: {} USD", sol_usd);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PriceOracle {
    http: HttpClient,
    endpoints: OracleEndpoints,
    fallback: FallbackPrices,
}

impl PriceOracle {
    /// Creates an oracle with the given endpoints and fallback prices
    pub fn new(endpoints: OracleEndpoints, fallback: FallbackPrices) -> Result<Self, ClientError> {
        let http = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoints,
            fallback,
        })
    }

    /// Creates an oracle from the program configuration
    pub fn from_config(config: &ProgramConfig) -> Result<Self, ClientError> {
        Self::new(config.endpoints.clone(), config.fallback_prices)
    }

    /// Fallback prices this oracle substitutes
    pub fn fallback(&self) -> FallbackPrices {
        self.fallback
    }

    async fn get_text(&self, url: &str) -> Result<String, ClientError> {
        let mut response = self.http.get_async(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::PriceUnavailable(format!(
                "{} responded with {}",
                url, status
            )));
        }
        response
            .text()
            .await
            .map_err(|e| ClientError::PriceUnavailable(format!("{}: {}", url, e)))
    }

    /// Fetches the SOL price, returning the error instead of falling back
    pub async fn fetch_base_asset_price(&self) -> Result<f64, ClientError> {
        let url = format!(
            "{}/simple/price?ids=solana&vs_currencies=usd",
            self.endpoints.coingecko.trim_end_matches('/')
        );
        parse_base_asset_price(&self.get_text(&url).await?)
    }

    /// Fetches the reward token price and the liquidity of the pair it was read from,
    /// returning the error instead of falling back
    pub async fn fetch_reward_token_price(&self, token: &Pubkey) -> Result<(f64, f64), ClientError> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.endpoints.dexscreener.trim_end_matches('/'),
            token
        );
        parse_reward_token_price(&self.get_text(&url).await?, token)
    }

    /// Fetches a complete quote for one purchase attempt
    pub async fn quote(&self, reward_token: &Pubkey) -> PriceQuote {
        let (base_asset_price_usd, reward) = tokio::join!(
            self.base_asset_price(),
            self.fetch_reward_token_price(reward_token)
        );
        let (reward_token_price_usd, source_liquidity_usd) = match reward {
            Ok((price, liquidity)) => (price, Some(liquidity)),
            Err(err) => (self.reward_fallback(reward_token, &err), None),
        };

        PriceQuote {
            base_asset_price_usd,
            reward_token_price_usd,
            source_liquidity_usd,
            fetched_at: SystemTime::now(),
        }
    }

    fn reward_fallback(&self, token: &Pubkey, err: &ClientError) -> f64 {
        warn!(
            %token,
            error = %err,
            fallback = self.fallback.spl_token_usd,
            "reward token price unavailable, using fallback"
        );
        self.fallback.spl_token_usd
    }
}

impl PriceFeed for PriceOracle {
    async fn base_asset_price(&self) -> f64 {
        match self.fetch_base_asset_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = self.fallback.sol_usd,
                    "SOL price unavailable, using fallback"
                );
                self.fallback.sol_usd
            }
        }
    }

    async fn reward_token_price(&self, token: &Pubkey) -> f64 {
        match self.fetch_reward_token_price(token).await {
            Ok((price, _)) => price,
            Err(err) => self.reward_fallback(token, &err),
        }
    }
}
