//! Payment widget boundary
//!
//! The payment widget is an external signer and executor: it charges the user in fiat, buys
//! SOL into its signing account and executes the smart contract call described by the order.
//! This module defines the order handed to it, the events it reports back and how those
//! events map to a purchase outcome.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{common::types::WidgetCredentials, constants, error::ClientError};

/// Smart contract order in the shape the payment widget signs
///
/// `sc_input_data` is the hex encoded [`InstructionEnvelope`](crate::utils::envelope::InstructionEnvelope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartContractOrder {
    /// Wallet receiving the purchase
    pub address: String,
    pub commodity: String,
    pub network: String,
    /// SOL the widget must acquire to fund the instruction
    pub commodity_amount: f64,
    /// Program executing the instruction
    pub sc_address: String,
    pub sc_input_data: String,
}

/// Event reported by the payment widget when an order settles or the user leaves
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// `payment-status` event with its raw payload
    PaymentStatus { status: String, payload: Value },
    /// The widget was closed before a status was reported
    Closed,
    /// The widget failed on its own
    Error(String),
}

impl WidgetEvent {
    /// Builds a `PaymentStatus` event from the raw `payment-status` payload
    pub fn from_payment_status(payload: Value) -> Self {
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self::PaymentStatus { status, payload }
    }
}

/// Final state of a purchase handed to the payment widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Payment settled. The transaction id is absent if the widget did not report one.
    Completed { tx_id: Option<String> },
    /// The user closed the widget
    Cancelled,
}

/// External payment widget
///
/// `open` presents the order to the user and resolves with the first terminal event: a
/// payment status, a close, or an error.
pub trait PaymentWidget: Send + Sync {
    fn open(
        &self,
        order: &SmartContractOrder,
        credentials: &WidgetCredentials,
    ) -> impl Future<Output = Result<WidgetEvent, ClientError>> + Send;
}

/// Returns the first non-empty transaction id in a `payment-status` payload
pub fn extract_transaction_id(payload: &Value) -> Option<String> {
    constants::widget::TX_ID_FIELDS.iter().find_map(|field| {
        payload
            .get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    })
}

/// Maps a widget event to the outcome of the purchase
///
/// # Errors
///
/// Returns `ExternalWidgetError` for failed payments and widget errors.
pub fn interpret_event(event: WidgetEvent) -> Result<PurchaseOutcome, ClientError> {
    match event {
        WidgetEvent::PaymentStatus { status, payload } => {
            let normalized = status.to_ascii_lowercase();
            if normalized == constants::widget::STATUS_SUCCESS {
                let tx_id = extract_transaction_id(&payload);
                if tx_id.is_none() {
                    warn!(%payload, "payment succeeded without a transaction id");
                }
                Ok(PurchaseOutcome::Completed { tx_id })
            } else if constants::widget::STATUS_FAILURES.contains(&normalized.as_str()) {
                let reason = payload
                    .get("message")
                    .or_else(|| payload.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or(&status)
                    .to_string();
                Err(ClientError::ExternalWidgetError(reason))
            } else {
                warn!(%status, "widget closed with a non-terminal payment status");
                Ok(PurchaseOutcome::Cancelled)
            }
        }
        WidgetEvent::Closed => Ok(PurchaseOutcome::Cancelled),
        WidgetEvent::Error(reason) => Err(ClientError::ExternalWidgetError(reason)),
    }
}
