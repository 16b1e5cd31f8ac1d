use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, Once,
    },
};

use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer};
use solbridge::{
    common::types::{ProgramConfig, WidgetCredentials, ENV_PREFIX},
    error::ClientError,
    pricing::FixedPrices,
    widget::{PaymentWidget, SmartContractOrder, WidgetEvent},
    SolBridge,
};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber once, honouring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Required configuration keys, without the `SOLBRIDGE_` prefix
pub const REQUIRED_KEYS: [&str; 17] = [
    "PROGRAM_ID",
    "SPL_TOKEN_MINT",
    "TOKEN2022_MINT",
    "SIGNING_ACCOUNT",
    "AMM_ID",
    "AMM_AUTHORITY",
    "AMM_OPEN_ORDERS",
    "AMM_TARGET_ORDERS",
    "POOL_COIN_TOKEN_ACCOUNT",
    "POOL_PC_TOKEN_ACCOUNT",
    "SERUM_MARKET",
    "SERUM_BIDS",
    "SERUM_ASKS",
    "SERUM_EVENT_QUEUE",
    "SERUM_COIN_VAULT",
    "SERUM_PC_VAULT",
    "SERUM_VAULT_SIGNER",
];

/// A complete environment with a fresh address for every required key
pub fn test_env() -> HashMap<String, String> {
    let mut env: HashMap<String, String> = REQUIRED_KEYS
        .iter()
        .map(|key| {
            (
                format!("{}{}", ENV_PREFIX, key),
                Pubkey::new_unique().to_string(),
            )
        })
        .collect();
    env.insert(format!("{}PARTNER_ID", ENV_PREFIX), "01TESTPARTNER".to_string());
    env.insert(
        format!("{}SIGNING_PRIVATE_KEY", ENV_PREFIX),
        "0x57466afb5491ee372b3b30d82ef7e7a0583c9e36aef0f02435bd164fe172b1d3".to_string(),
    );
    env
}

pub struct TestContext {
    pub config: ProgramConfig,
    pub recipient: Keypair,
    pub client: SolBridge<FixedPrices>,
}

impl TestContext {
    pub fn with_prices(base_price: f64, reward_price: f64) -> Self {
        init_tracing();

        let env = test_env();
        let config = ProgramConfig::from_lookup(|key| env.get(key).cloned())
            .expect("Failed to build test configuration");
        let credentials = WidgetCredentials::from_lookup(|key| env.get(key).cloned())
            .expect("Failed to build test credentials");

        Self {
            client: SolBridge::new(
                config.clone(),
                credentials,
                FixedPrices::new(base_price, reward_price),
            ),
            config,
            recipient: Keypair::new(),
        }
    }

    pub fn recipient_address(&self) -> String {
        self.recipient.pubkey().to_string()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::with_prices(150.0, 1.0)
    }
}

/// Payment widget answering every order with a scripted event
pub struct MockWidget {
    event: WidgetEvent,
    orders: Mutex<Vec<SmartContractOrder>>,
    calls: AtomicUsize,
    release: Option<Notify>,
}

impl MockWidget {
    pub fn new(event: WidgetEvent) -> Self {
        Self {
            event,
            orders: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            release: None,
        }
    }

    /// A widget that holds every order open until [`MockWidget::release`] is called
    pub fn blocking(event: WidgetEvent) -> Self {
        Self {
            release: Some(Notify::new()),
            ..Self::new(event)
        }
    }

    pub fn release(&self) {
        if let Some(release) = &self.release {
            release.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> Vec<SmartContractOrder> {
        self.orders.lock().expect("orders lock poisoned").clone()
    }
}

impl PaymentWidget for MockWidget {
    async fn open(
        &self,
        order: &SmartContractOrder,
        credentials: &WidgetCredentials,
    ) -> Result<WidgetEvent, ClientError> {
        assert_eq!(credentials.partner_id, "01TESTPARTNER");

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.orders
            .lock()
            .expect("orders lock poisoned")
            .push(order.clone());

        if let Some(release) = &self.release {
            release.notified().await;
        }
        Ok(self.event.clone())
    }
}
