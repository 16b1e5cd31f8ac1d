//! Constants used by the SDK
//!
//! Program ids, PDA seeds, pricing parameters and the default endpoints of the
//! external services the purchase flow talks to.

/// Seeds for deriving Program Derived Addresses
pub mod seeds {
    /// Seed for the purchase program's global state account
    pub const PROGRAM_STATE_SEED: &[u8] = b"program_state";
}

/// Well-known program accounts
pub mod accounts {
    use solana_sdk::{pubkey, pubkey::Pubkey};

    /// Classic SPL Token program
    pub const TOKEN_PROGRAM: Pubkey = spl_token::ID;
    /// Token-2022 program
    pub const TOKEN_2022_PROGRAM: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
    /// Associated Token Account program
    pub const ASSOCIATED_TOKEN_PROGRAM: Pubkey = spl_associated_token_account::ID;
    /// System program
    pub const SYSTEM_PROGRAM: Pubkey = solana_sdk::system_program::ID;
    /// Raydium CPMM program used for the swap leg
    pub const RAYDIUM_AMM_PROGRAM: Pubkey = pubkey!("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK");
    /// Serum DEX v3 program
    pub const SERUM_PROGRAM: Pubkey = pubkey!("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX");
}

/// Anchor instruction naming
pub mod instruction {
    /// Namespace Anchor prefixes to instruction names before hashing
    pub const NAMESPACE: &str = "global";
    /// Entry point of the purchase program
    pub const PURCHASE_WITH_SOL: &str = "purchase_with_sol";
}

/// Parameters of the purchase split and unit conversion
pub mod pricing {
    /// Decimals of native SOL (lamports)
    pub const BASE_ASSET_DECIMALS: u32 = 9;
    /// Decimals of the distributed reward token
    pub const REWARD_TOKEN_DECIMALS: u32 = 9;
    /// Denominator for all basis point values
    pub const BPS_DENOMINATOR: u64 = 10_000;
    /// Share of the lamports routed to the swap leg (80%)
    pub const SWAP_SHARE_BPS: u64 = 8_000;
    /// Share of the fiat value paid out in reward tokens (20%)
    pub const DISTRIBUTION_SHARE: f64 = 0.2;
    /// Static slippage tolerance applied to the swap leg (5%)
    pub const SWAP_SLIPPAGE_BPS: u64 = 500;
    /// SOL price substituted when the market data service is unreachable
    pub const FALLBACK_SOL_PRICE_USD: f64 = 150.0;
    /// Reward token price substituted when no trading pair can be resolved
    pub const FALLBACK_SPL_TOKEN_PRICE_USD: f64 = 1.0;
}

/// Default endpoints of external services
pub mod endpoints {
    pub const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";
    pub const DEXSCREENER_API: &str = "https://api.dexscreener.com";
    pub const CLAIM_API: &str = "https://magal-claim-api.proskillowner.com";
    pub const WIDGET_ORIGIN: &str = "https://widget.wert.io";
}

/// Values exchanged with the payment widget
pub mod widget {
    /// Commodity the widget buys on the user's behalf
    pub const COMMODITY: &str = "SOL";
    /// Network the smart contract call is executed on
    pub const NETWORK: &str = "solana";
    /// Status reported by a settled payment
    pub const STATUS_SUCCESS: &str = "success";
    /// Statuses reported by a failed payment
    pub const STATUS_FAILURES: [&str; 2] = ["error", "failed"];
    /// Field names the widget may use for the transaction id, in lookup order
    pub const TX_ID_FIELDS: [&str; 7] = [
        "tx_id",
        "txId",
        "transaction_id",
        "transactionId",
        "signature",
        "tx_hash",
        "txHash",
    ];
}
