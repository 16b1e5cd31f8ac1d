#![doc = include_str!("../RUSTDOC.md")]

pub mod accounts;
#[cfg(feature = "oracle")]
pub mod api;
pub mod common;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod pricing;
pub mod utils;
pub mod widget;

use common::types::{ProgramConfig, WidgetCredentials};
use pricing::{PriceFeed, PurchaseAmounts};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};
use utils::envelope::InstructionEnvelope;
use widget::{interpret_event, PaymentWidget, PurchaseOutcome, SmartContractOrder};

/// Fiat purchase as entered by the user
#[derive(Debug, Clone, PartialEq)]
pub struct FiatPurchaseRequest {
    /// USD amount the user pays
    pub fiat_amount: f64,
    /// Base58 wallet address receiving the tokens
    pub recipient_address: String,
}

impl FiatPurchaseRequest {
    pub fn new(fiat_amount: f64, recipient_address: impl Into<String>) -> Self {
        Self {
            fiat_amount,
            recipient_address: recipient_address.into(),
        }
    }

    /// Builds a request from raw form input
    ///
    /// # Errors
    ///
    /// Returns `InvalidPurchaseInput` if the amount is not a positive finite number.
    pub fn parse(fiat_amount: &str, recipient_address: &str) -> Result<Self, error::ClientError> {
        let amount = fiat_amount.trim().parse::<f64>().map_err(|_| {
            error::ClientError::InvalidPurchaseInput(format!(
                "{:?} is not a number",
                fiat_amount
            ))
        })?;
        let request = Self::new(amount, recipient_address.trim());
        request.validate()?;
        Ok(request)
    }

    /// Checks the amount and the recipient without touching the network
    pub fn validate(&self) -> Result<Pubkey, error::ClientError> {
        if !self.fiat_amount.is_finite() || self.fiat_amount <= 0.0 {
            return Err(error::ClientError::InvalidPurchaseInput(format!(
                "fiat amount must be a positive finite number, got {}",
                self.fiat_amount
            )));
        }
        accounts::parse_recipient(&self.recipient_address)
    }
}

/// Everything computed for a purchase before it is handed to the payment widget
#[derive(Debug, Clone)]
pub struct PreparedPurchase {
    pub amounts: PurchaseAmounts,
    pub accounts: accounts::DerivedAccounts,
    pub instruction: Instruction,
    pub order: SmartContractOrder,
}

/// Clears the in-flight flag when the purchase ends, whichever way it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, error::ClientError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| error::ClientError::PurchaseInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Main client for fiat funded purchases through the `purchase_with_sol` program
///
/// `SolBridge` prices a fiat amount, derives the recipient's token accounts, encodes the
/// `purchase_with_sol` instruction and hands it to a payment widget that funds and executes
/// it. Only one purchase runs at a time per client.
///
/// # Examples
///
/// ```no_run
/// use solbridge::{SolBridge, FiatPurchaseRequest, pricing::FixedPrices};
/// use solbridge::common::types::{ProgramConfig, WidgetCredentials};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ProgramConfig::from_env()?;
/// let credentials = WidgetCredentials::from_env()?;
/// let client = SolBridge::new(config, credentials, FixedPrices::new(150.0, 1.0));
///
/// let request = FiatPurchaseRequest::parse("100", "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin")?;
/// let envelope = client.get_purchase_instruction_hex(&request).await?;
/// println!("sc_input_data: {}", envelope);
/// # Ok(())
/// # }
/// ```
pub struct SolBridge<F: PriceFeed> {
    /// Static program configuration
    pub config: Arc<ProgramConfig>,
    /// Credentials the payment widget signs orders with
    pub credentials: WidgetCredentials,
    /// Price source for purchases
    pub prices: F,
    in_flight: AtomicBool,
}

#[cfg(feature = "oracle")]
impl SolBridge<pricing::PriceOracle> {
    /// Creates a client from `SOLBRIDGE_*` environment variables with live prices
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` or `InvalidConfiguration` for bad environment values,
    /// and `HttpError` if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, error::ClientError> {
        let config = ProgramConfig::from_env()?;
        let credentials = WidgetCredentials::from_env()?;
        let prices = pricing::PriceOracle::from_config(&config)?;
        Ok(Self::new(config, credentials, prices))
    }
}

impl<F: PriceFeed> SolBridge<F> {
    /// Creates a new client
    ///
    /// # Arguments
    ///
    /// * `config` - Program and pool addresses the instruction is built from
    /// * `credentials` - Widget partner credentials
    /// * `prices` - Price source for the purchase split
    pub fn new(config: impl Into<Arc<ProgramConfig>>, credentials: WidgetCredentials, prices: F) -> Self {
        Self {
            config: config.into(),
            credentials,
            prices,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a purchase is currently running on this client
    pub fn is_purchase_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Calculates the purchase split at current prices
    ///
    /// Prices that are not supplied are fetched from the client's price feed.
    pub async fn calculate_purchase_amounts(
        &self,
        fiat_amount: f64,
        base_price: Option<f64>,
        reward_price: Option<f64>,
    ) -> Result<PurchaseAmounts, error::ClientError> {
        pricing::calculate_purchase_amounts(
            &self.prices,
            fiat_amount,
            base_price,
            reward_price,
            &self.config.reward_price_token,
        )
        .await
    }

    /// Derives the recipient's Token-2022 and SPL token accounts
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecipientAddress` if the address is malformed or off curve.
    pub fn derive_recipient_token_accounts(
        &self,
        recipient: &str,
    ) -> Result<accounts::DerivedAccounts, error::ClientError> {
        accounts::derive_recipient_token_accounts_with_programs(
            recipient,
            (&self.config.token2022_mint, &self.config.token2022_program),
            (&self.config.spl_token_mint, &self.config.spl_token_program),
        )
    }

    /// Builds the `purchase_with_sol` instruction for computed amounts
    ///
    /// The payload carries the total lamports, the recipient, the reward token amount and the
    /// minimum swap output.
    pub fn get_purchase_instruction(
        &self,
        recipient: Pubkey,
        amounts: &PurchaseAmounts,
        derived: &accounts::DerivedAccounts,
    ) -> Result<Instruction, error::ClientError> {
        let accounts = instructions::PurchaseWithSolAccounts::new(&self.config, recipient, derived);
        instructions::purchase_with_sol(
            &self.config.program_id,
            &accounts,
            instructions::PurchaseWithSol {
                amount: amounts.total_lamports,
                recipient_address: recipient,
                spl_token_amount: amounts.reward_token_amount,
                minimum_token2022_out: amounts.minimum_swap_output,
            },
        )
    }

    /// Prices, derives and encodes a purchase without opening the widget
    ///
    /// The request is validated before any price is fetched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPurchaseInput`, `InvalidRecipientAddress` or `EncodingFailure`.
    pub async fn prepare_purchase(
        &self,
        request: &FiatPurchaseRequest,
    ) -> Result<PreparedPurchase, error::ClientError> {
        let recipient = request.validate()?;

        let amounts = self
            .calculate_purchase_amounts(request.fiat_amount, None, None)
            .await?;
        let derived = self.derive_recipient_token_accounts(&request.recipient_address)?;
        let instruction = self.get_purchase_instruction(recipient, &amounts, &derived)?;
        let envelope = InstructionEnvelope::from_instruction(&instruction).to_hex()?;

        let order = SmartContractOrder {
            address: recipient.to_string(),
            commodity: constants::widget::COMMODITY.to_string(),
            network: constants::widget::NETWORK.to_string(),
            commodity_amount: utils::lamports_to_sol(amounts.total_lamports),
            sc_address: self.config.program_id.to_string(),
            sc_input_data: envelope,
        };

        Ok(PreparedPurchase {
            amounts,
            accounts: derived,
            instruction,
            order,
        })
    }

    /// Returns the hex envelope of a purchase, ready for the payment widget
    pub async fn get_purchase_instruction_hex(
        &self,
        request: &FiatPurchaseRequest,
    ) -> Result<String, error::ClientError> {
        Ok(self.prepare_purchase(request).await?.order.sc_input_data)
    }

    /// Runs a fiat purchase end to end
    ///
    /// The order is built, handed to the payment widget, and the widget's terminal event is
    /// mapped to an outcome. A second call while one is running fails with
    /// `PurchaseInProgress`.
    ///
    /// # Errors
    ///
    /// Any stage error is returned as is. Use [`error::ClientError::user_message`] for the
    /// text shown to the user.
    pub async fn purchase<W: PaymentWidget>(
        &self,
        request: &FiatPurchaseRequest,
        widget: &W,
    ) -> Result<PurchaseOutcome, error::ClientError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let prepared = self.prepare_purchase(request).await?;
        info!(
            recipient = %prepared.order.address,
            fiat_amount = request.fiat_amount,
            lamports = prepared.amounts.total_lamports,
            "opening payment widget"
        );

        let event = widget.open(&prepared.order, &self.credentials).await?;
        let outcome = interpret_event(event);
        match &outcome {
            Ok(PurchaseOutcome::Completed { tx_id }) => {
                info!(tx_id = tx_id.as_deref().unwrap_or("unknown"), "purchase completed")
            }
            Ok(PurchaseOutcome::Cancelled) => info!("purchase cancelled"),
            Err(err) => warn!(error = %err, "purchase failed"),
        }
        outcome
    }
}
