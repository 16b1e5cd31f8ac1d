//! Error types for the solbridge SDK.
//!
//! This module defines the `ClientError` enum, which covers every failure a purchase flow can hit:
//! bad user input, unusable recipient addresses, encoding bugs, payment widget failures and
//! configuration problems, plus the transport and serialization errors of the underlying crates.
//!
//! # Error Types
//!
//! - `InvalidPurchaseInput`: The fiat amount or a supplied price is not a positive finite number.
//! - `PriceUnavailable`: A live price lookup failed. The price oracle absorbs this and falls back.
//! - `InvalidRecipientAddress`: The recipient is not a valid on-curve base58 public key.
//! - `EncodingFailure`: The instruction or envelope could not be encoded or decoded.
//! - `ExternalWidgetError`: The payment widget reported a failure.
//! - `MissingConfiguration`: A required configuration value is absent.
//! - `InvalidConfiguration`: A configuration value is present but unusable.
//! - `PurchaseInProgress`: Another purchase is already running on this client.
//! - `HttpError`: An error occurred while talking to an HTTP service.
//! - `JsonError`: An error occurred while serializing or deserializing JSON.
//! - `BorshError`: An error occurred while serializing or deserializing data using Borsh.
//! - `OtherError`: An error occurred that is not covered by the other error types.

#[derive(Debug)]
pub enum ClientError {
    /// Fiat amount or price is not usable
    InvalidPurchaseInput(String),
    /// Live price could not be resolved
    PriceUnavailable(String),
    /// Recipient address is malformed or off-curve
    InvalidRecipientAddress(String),
    /// Instruction or envelope encoding failed
    EncodingFailure(String),
    /// Failure reported by the payment widget
    ExternalWidgetError(String),
    /// Required configuration value is missing
    MissingConfiguration(String),
    /// Configuration value could not be parsed
    InvalidConfiguration(String),
    /// A purchase is already in flight
    PurchaseInProgress,
    /// Error from the HTTP client
    #[cfg(feature = "oracle")]
    HttpError(isahc::Error),
    /// Error (de)serializing JSON
    JsonError(serde_json::Error),
    /// Error (de)serializing data using Borsh
    BorshError(std::io::Error),
    /// Other error
    OtherError(String),
}

impl ClientError {
    /// Single message suitable for showing to the end user
    ///
    /// Internal details stay in the `Display` output, which is what gets logged.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidPurchaseInput(_) => "Please enter a valid amount".to_string(),
            Self::InvalidRecipientAddress(_) => {
                "The connected wallet address cannot receive tokens".to_string()
            }
            Self::ExternalWidgetError(msg) => format!("Payment failed: {}", msg),
            Self::PurchaseInProgress => "A purchase is already in progress".to_string(),
            _ => "Something went wrong while preparing the purchase. Please try again.".to_string(),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPurchaseInput(msg) => write!(f, "Invalid purchase input: {}", msg),
            Self::PriceUnavailable(msg) => write!(f, "Price unavailable: {}", msg),
            Self::InvalidRecipientAddress(msg) => write!(f, "Invalid recipient address: {}", msg),
            Self::EncodingFailure(msg) => write!(f, "Encoding failure: {}", msg),
            Self::ExternalWidgetError(msg) => write!(f, "Payment widget error: {}", msg),
            Self::MissingConfiguration(key) => write!(f, "Missing configuration: {}", key),
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::PurchaseInProgress => write!(f, "Purchase already in progress"),
            #[cfg(feature = "oracle")]
            Self::HttpError(err) => write!(f, "HTTP error: {}", err),
            Self::JsonError(err) => write!(f, "JSON error: {}", err),
            Self::BorshError(err) => write!(f, "Borsh serialization error: {}", err),
            Self::OtherError(msg) => write!(f, "Other error: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "oracle")]
            Self::HttpError(err) => Some(err),
            Self::JsonError(err) => Some(err),
            Self::BorshError(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(feature = "oracle")]
impl From<isahc::Error> for ClientError {
    fn from(err: isahc::Error) -> Self {
        Self::HttpError(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::BorshError(err)
    }
}
