//! Client for the claim-status REST API
//!
//! Buyers of the reward token can look up and trigger their claim through this service. The
//! API answers with a `code` (`-1` on failure) and an optional `value`.
//!
//! Transport failures are folded into a `code = -1` response carrying the error description,
//! so callers only ever branch on `code`.

use std::time::{SystemTime, UNIX_EPOCH};

use isahc::{config::Configurable, AsyncReadResponseExt, HttpClient, Request};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::error;

use crate::{constants, error::ClientError};

/// Claim record of an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimerInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub amount: f64,
    /// Unix timestamp in milliseconds from which the claim is allowed
    pub valid_from: i64,
    pub is_claimed: bool,
    #[serde(default)]
    pub claim_transaction: Option<String>,
    #[serde(default)]
    pub claimed_timestamp: Option<i64>,
}

/// Response of `POST /claimer/findClaimer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimerApiResponse {
    pub code: i64,
    pub value: Option<ClaimerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response of `POST /claimer/claim`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub code: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimerRequest<'a> {
    claimer_address: &'a str,
}

/// Claim-status API client
#[derive(Debug, Clone)]
pub struct ClaimApi {
    http: HttpClient,
    base_url: String,
}

impl ClaimApi {
    /// Creates a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = HttpClient::builder()
            .timeout(crate::pricing::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client for the production claim API
    pub fn production() -> Result<Self, ClientError> {
        Self::new(constants::endpoints::CLAIM_API)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, address: &str) -> Result<T, ClientError> {
        let body = serde_json::to_string(&ClaimerRequest {
            claimer_address: address,
        })?;
        let request = Request::post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|e| ClientError::OtherError(format!("failed to build request: {}", e)))?;

        let mut response = self.http.send_async(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::OtherError(format!("HTTP error! status: {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::OtherError(format!("failed to read response: {}", e)))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Looks up the claim record of an address
    pub async fn find_claimer(&self, claimer_address: &str) -> ClaimerApiResponse {
        match self.post("/claimer/findClaimer", claimer_address).await {
            Ok(response) => response,
            Err(err) => {
                error!(claimer = claimer_address, error = %err, "error fetching claimer info");
                ClaimerApiResponse {
                    code: -1,
                    value: None,
                    description: Some(err.to_string()),
                }
            }
        }
    }

    /// Claims the tokens of an address
    pub async fn claim_tokens(&self, claimer_address: &str) -> ClaimResponse {
        match self.post("/claimer/claim", claimer_address).await {
            Ok(response) => response,
            Err(err) => {
                error!(claimer = claimer_address, error = %err, "error claiming tokens");
                ClaimResponse { code: -1 }
            }
        }
    }
}

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// Whether the claim can be made at `now_ms`
pub fn is_claim_valid(info: &ClaimerInfo, now_ms: i64) -> bool {
    !info.is_claimed && now_ms >= info.valid_from
}

/// Milliseconds until the claim opens, 0 once it is open
pub fn time_until_valid(info: &ClaimerInfo, now_ms: i64) -> u64 {
    (info.valid_from - now_ms).max(0) as u64
}

/// Formats a remaining duration as `1d 2h 3m 4s`, omitting leading zero units
pub fn format_time_remaining(remaining_ms: u64) -> String {
    if remaining_ms == 0 {
        return "Available now".to_string();
    }

    let days = remaining_ms / 86_400_000;
    let hours = (remaining_ms % 86_400_000) / 3_600_000;
    let minutes = (remaining_ms % 3_600_000) / 60_000;
    let seconds = (remaining_ms % 60_000) / 1_000;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(valid_from: i64, is_claimed: bool) -> ClaimerInfo {
        ClaimerInfo {
            id: "66f0c0ffee".to_string(),
            amount: 1250.0,
            valid_from,
            is_claimed,
            claim_transaction: None,
            claimed_timestamp: None,
        }
    }

    #[test]
    fn test_claimer_response_shape() {
        let body = r#"{"code":0,"value":{"_id":"abc","amount":12.5,"validFrom":1700000000000,
            "isClaimed":false,"claimTransaction":"","claimedTimestamp":0}}"#;
        let response: ClaimerApiResponse = serde_json::from_str(body).unwrap();

        let value = response.value.unwrap();
        assert_eq!(value.id, "abc");
        assert_eq!(value.valid_from, 1_700_000_000_000);
        assert_eq!(response.description, None);

        let request = serde_json::to_string(&ClaimerRequest {
            claimer_address: "addr",
        })
        .unwrap();
        assert_eq!(request, r#"{"claimerAddress":"addr"}"#);
    }

    #[test]
    fn test_claim_validity() {
        assert!(is_claim_valid(&info(1_000, false), 1_000));
        assert!(!is_claim_valid(&info(1_000, false), 999));
        assert!(!is_claim_valid(&info(1_000, true), 5_000));

        assert_eq!(time_until_valid(&info(5_000, false), 1_000), 4_000);
        assert_eq!(time_until_valid(&info(1_000, false), 5_000), 0);
    }

    #[test]
    fn test_format_time_remaining() {
        assert_eq!(format_time_remaining(0), "Available now");
        assert_eq!(format_time_remaining(42_500), "42s");
        assert_eq!(format_time_remaining(61_000), "1m 1s");
        assert_eq!(format_time_remaining(3_600_000), "1h 0m 0s");
        assert_eq!(format_time_remaining(90_061_000), "1d 1h 1m 1s");
    }

    #[tokio::test]
    async fn test_unreachable_api_returns_failure_code() {
        let api = ClaimApi::new("http://127.0.0.1:9/").unwrap();

        let response = api.find_claimer("addr").await;
        assert_eq!(response.code, -1);
        assert!(response.value.is_none());
        assert!(response.description.is_some());

        assert_eq!(api.claim_tokens("addr").await.code, -1);
    }
}
