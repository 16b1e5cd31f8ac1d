//! Instruction for buying tokens with SOL through the purchase program
//!
//! This module provides the instruction data layout, the ordered account list and a helper to
//! build the Solana instruction. The purchase program splits the SOL it receives: 80% is
//! swapped into the Token-2022 mint on Raydium, and reward SPL tokens worth 20% of the fiat
//! value are sent from the program's own account.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::{
    accounts::DerivedAccounts, common::types::ProgramConfig, constants, error::ClientError,
};

/// Computes the Anchor discriminator of a global instruction
///
/// This is the first 8 bytes of `sha256("global:<name>")`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", constants::instruction::NAMESPACE, name);
    let digest = hash::hash(preimage.as_bytes()).to_bytes();
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&digest[..8]);
    discriminator
}

/// Instruction data for `purchase_with_sol`
///
/// # Fields
///
/// * `amount` - Total lamports paid in by the signing account
/// * `recipient_address` - Wallet receiving both tokens
/// * `spl_token_amount` - Reward tokens to distribute (in token smallest units)
/// * `minimum_token2022_out` - Minimum acceptable swap output (slippage protection)
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurchaseWithSol {
    pub amount: u64,
    pub recipient_address: Pubkey,
    pub spl_token_amount: u64,
    pub minimum_token2022_out: u64,
}

impl PurchaseWithSol {
    /// Size of the Borsh encoded arguments
    pub const ARGS_LEN: usize = 8 + 32 + 8 + 8;
    /// Size of the full instruction data, discriminator included
    pub const DATA_LEN: usize = 8 + Self::ARGS_LEN;

    /// Instruction discriminator used to identify this instruction
    pub fn discriminator() -> [u8; 8] {
        instruction_discriminator(constants::instruction::PURCHASE_WITH_SOL)
    }

    /// Serializes the instruction data with the appropriate discriminator
    ///
    /// # Returns
    ///
    /// The 64-byte instruction data: discriminator followed by the little-endian arguments
    pub fn data(&self) -> Result<Vec<u8>, ClientError> {
        let mut data = Vec::with_capacity(Self::DATA_LEN);
        data.extend_from_slice(&Self::discriminator());
        self.serialize(&mut data)
            .map_err(|e| ClientError::EncodingFailure(format!("purchase_with_sol args: {}", e)))?;

        if data.len() != Self::DATA_LEN {
            return Err(ClientError::EncodingFailure(format!(
                "purchase_with_sol data is {} bytes, expected {}",
                data.len(),
                Self::DATA_LEN
            )));
        }
        Ok(data)
    }

    /// Decodes instruction data produced by [`PurchaseWithSol::data`]
    pub fn unpack(data: &[u8]) -> Result<Self, ClientError> {
        if data.len() != Self::DATA_LEN {
            return Err(ClientError::EncodingFailure(format!(
                "purchase_with_sol data is {} bytes, expected {}",
                data.len(),
                Self::DATA_LEN
            )));
        }

        let (discriminator, args) = data.split_at(8);
        if discriminator != Self::discriminator() {
            return Err(ClientError::EncodingFailure(
                "discriminator does not match purchase_with_sol".to_string(),
            ));
        }

        Self::try_from_slice(args).map_err(ClientError::BorshError)
    }
}

/// Accounts of the `purchase_with_sol` instruction
///
/// The purchase program indexes its accounts positionally. The order of
/// [`PurchaseWithSolAccounts::ROLES`] is what [`PurchaseWithSolAccounts::to_account_metas`]
/// emits, and must not be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseWithSolAccounts {
    pub program_state: Pubkey,
    pub payer: Pubkey,
    pub program_spl_token_account: Pubkey,
    pub recipient_spl_token_account: Pubkey,
    pub spl_token_mint: Pubkey,
    pub program_token2022_account: Pubkey,
    pub recipient_token2022_account: Pubkey,
    pub token2022_mint: Pubkey,
    pub recipient_address: Pubkey,
    pub raydium_amm_program: Pubkey,
    pub amm_id: Pubkey,
    pub amm_authority: Pubkey,
    pub amm_open_orders: Pubkey,
    pub amm_target_orders: Pubkey,
    pub pool_coin_token_account: Pubkey,
    pub pool_pc_token_account: Pubkey,
    pub serum_program_id: Pubkey,
    pub serum_market: Pubkey,
    pub serum_bids: Pubkey,
    pub serum_asks: Pubkey,
    pub serum_event_queue: Pubkey,
    pub serum_coin_vault_account: Pubkey,
    pub serum_pc_vault_account: Pubkey,
    pub serum_vault_signer: Pubkey,
    pub token_program: Pubkey,
    pub system_program: Pubkey,
}

impl PurchaseWithSolAccounts {
    /// Number of accounts the instruction takes
    pub const LEN: usize = 26;

    /// Account roles in instruction order
    pub const ROLES: [&'static str; Self::LEN] = [
        "program_state",
        "payer",
        "program_spl_token_account",
        "recipient_spl_token_account",
        "spl_token_mint",
        "program_token2022_account",
        "recipient_token2022_account",
        "token2022_mint",
        "recipient_address",
        "raydium_amm_program",
        "amm_id",
        "amm_authority",
        "amm_open_orders",
        "amm_target_orders",
        "pool_coin_token_account",
        "pool_pc_token_account",
        "serum_program_id",
        "serum_market",
        "serum_bids",
        "serum_asks",
        "serum_event_queue",
        "serum_coin_vault_account",
        "serum_pc_vault_account",
        "serum_vault_signer",
        "token_program",
        "system_program",
    ];

    /// Resolves the accounts for one recipient from the static configuration
    ///
    /// The payer is the payment widget's signing account.
    pub fn new(config: &ProgramConfig, recipient: Pubkey, derived: &DerivedAccounts) -> Self {
        let pool = &config.pool;
        Self {
            program_state: config.program_state,
            payer: config.signing_account,
            program_spl_token_account: config.program_spl_token_account,
            recipient_spl_token_account: derived.recipient_distribution_token_account,
            spl_token_mint: config.spl_token_mint,
            program_token2022_account: config.program_token2022_account,
            recipient_token2022_account: derived.recipient_swap_token_account,
            token2022_mint: config.token2022_mint,
            recipient_address: recipient,
            raydium_amm_program: pool.raydium_amm_program,
            amm_id: pool.amm_id,
            amm_authority: pool.amm_authority,
            amm_open_orders: pool.amm_open_orders,
            amm_target_orders: pool.amm_target_orders,
            pool_coin_token_account: pool.pool_coin_token_account,
            pool_pc_token_account: pool.pool_pc_token_account,
            serum_program_id: pool.serum_program_id,
            serum_market: pool.serum_market,
            serum_bids: pool.serum_bids,
            serum_asks: pool.serum_asks,
            serum_event_queue: pool.serum_event_queue,
            serum_coin_vault_account: pool.serum_coin_vault_account,
            serum_pc_vault_account: pool.serum_pc_vault_account,
            serum_vault_signer: pool.serum_vault_signer,
            token_program: config.token_program,
            system_program: config.system_program,
        }
    }

    /// Returns each account with its role, in instruction order
    pub fn entries(&self) -> [(&'static str, AccountMeta); Self::LEN] {
        [
            ("program_state", AccountMeta::new(self.program_state, false)),
            ("payer", AccountMeta::new(self.payer, true)),
            ("program_spl_token_account", AccountMeta::new(self.program_spl_token_account, false)),
            ("recipient_spl_token_account", AccountMeta::new(self.recipient_spl_token_account, false)),
            ("spl_token_mint", AccountMeta::new_readonly(self.spl_token_mint, false)),
            ("program_token2022_account", AccountMeta::new(self.program_token2022_account, false)),
            ("recipient_token2022_account", AccountMeta::new(self.recipient_token2022_account, false)),
            ("token2022_mint", AccountMeta::new_readonly(self.token2022_mint, false)),
            ("recipient_address", AccountMeta::new_readonly(self.recipient_address, false)),
            ("raydium_amm_program", AccountMeta::new_readonly(self.raydium_amm_program, false)),
            ("amm_id", AccountMeta::new(self.amm_id, false)),
            ("amm_authority", AccountMeta::new_readonly(self.amm_authority, false)),
            ("amm_open_orders", AccountMeta::new(self.amm_open_orders, false)),
            ("amm_target_orders", AccountMeta::new(self.amm_target_orders, false)),
            ("pool_coin_token_account", AccountMeta::new(self.pool_coin_token_account, false)),
            ("pool_pc_token_account", AccountMeta::new(self.pool_pc_token_account, false)),
            ("serum_program_id", AccountMeta::new_readonly(self.serum_program_id, false)),
            ("serum_market", AccountMeta::new(self.serum_market, false)),
            ("serum_bids", AccountMeta::new(self.serum_bids, false)),
            ("serum_asks", AccountMeta::new(self.serum_asks, false)),
            ("serum_event_queue", AccountMeta::new(self.serum_event_queue, false)),
            ("serum_coin_vault_account", AccountMeta::new(self.serum_coin_vault_account, false)),
            ("serum_pc_vault_account", AccountMeta::new(self.serum_pc_vault_account, false)),
            ("serum_vault_signer", AccountMeta::new_readonly(self.serum_vault_signer, false)),
            ("token_program", AccountMeta::new_readonly(self.token_program, false)),
            ("system_program", AccountMeta::new_readonly(self.system_program, false)),
        ]
    }

    /// Returns the account metas in instruction order
    pub fn to_account_metas(&self) -> Vec<AccountMeta> {
        self.entries().into_iter().map(|(_, meta)| meta).collect()
    }
}

/// Creates the `purchase_with_sol` instruction
///
/// # Arguments
///
/// * `program_id` - Purchase program id
/// * `accounts` - Resolved instruction accounts
/// * `args` - Amounts and recipient encoded into the instruction data
///
/// # Account Requirements
///
/// The instruction requires the following accounts in this order:
/// 1. Program state PDA (writable)
/// 2. Payer, the payment widget's signing account (signer, writable)
/// 3. Program SPL token account (writable)
/// 4. Recipient SPL token account (writable)
/// 5. SPL token mint (readonly)
/// 6. Program Token-2022 account (writable)
/// 7. Recipient Token-2022 account (writable)
/// 8. Token-2022 mint (readonly)
/// 9. Recipient wallet (readonly)
/// 10. Raydium AMM program (readonly)
/// 11. AMM id (writable)
/// 12. AMM authority (readonly)
/// 13. AMM open orders (writable)
/// 14. AMM target orders (writable)
/// 15. Pool coin token account (writable)
/// 16. Pool pc token account (writable)
/// 17. Serum program (readonly)
/// 18. Serum market (writable)
/// 19. Serum bids (writable)
/// 20. Serum asks (writable)
/// 21. Serum event queue (writable)
/// 22. Serum coin vault (writable)
/// 23. Serum pc vault (writable)
/// 24. Serum vault signer (readonly)
/// 25. Token program (readonly)
/// 26. System program (readonly)
pub fn purchase_with_sol(
    program_id: &Pubkey,
    accounts: &PurchaseWithSolAccounts,
    args: PurchaseWithSol,
) -> Result<Instruction, ClientError> {
    if args.recipient_address != accounts.recipient_address {
        return Err(ClientError::EncodingFailure(format!(
            "recipient {} in data does not match recipient account {}",
            args.recipient_address, accounts.recipient_address
        )));
    }

    Ok(Instruction::new_with_bytes(
        *program_id,
        &args.data()?,
        accounts.to_account_metas(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_accounts() -> PurchaseWithSolAccounts {
        let mut keys = (0..PurchaseWithSolAccounts::LEN).map(|_| Pubkey::new_unique());
        let mut next = || keys.next().unwrap();
        PurchaseWithSolAccounts {
            program_state: next(),
            payer: next(),
            program_spl_token_account: next(),
            recipient_spl_token_account: next(),
            spl_token_mint: next(),
            program_token2022_account: next(),
            recipient_token2022_account: next(),
            token2022_mint: next(),
            recipient_address: next(),
            raydium_amm_program: next(),
            amm_id: next(),
            amm_authority: next(),
            amm_open_orders: next(),
            amm_target_orders: next(),
            pool_coin_token_account: next(),
            pool_pc_token_account: next(),
            serum_program_id: next(),
            serum_market: next(),
            serum_bids: next(),
            serum_asks: next(),
            serum_event_queue: next(),
            serum_coin_vault_account: next(),
            serum_pc_vault_account: next(),
            serum_vault_signer: next(),
            token_program: next(),
            system_program: next(),
        }
    }

    #[test]
    fn test_discriminator_is_sha256_prefix() {
        let first = PurchaseWithSol::discriminator();
        let second = instruction_discriminator("purchase_with_sol");
        assert_eq!(first, second);

        let digest = hash::hash(b"global:purchase_with_sol").to_bytes();
        assert_eq!(first, digest[..8]);

        assert_ne!(first, instruction_discriminator("withdraw_sol"));
    }

    #[test]
    fn test_data_layout() {
        let recipient = Pubkey::new_unique();
        let args = PurchaseWithSol {
            amount: 0x0102_0304_0506_0708,
            recipient_address: recipient,
            spl_token_amount: 20_000_000_000,
            minimum_token2022_out: 1,
        };

        let data = args.data().unwrap();
        assert_eq!(data.len(), 64);
        assert_eq!(data[..8], PurchaseWithSol::discriminator());
        assert_eq!(data[8..16], [8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(data[16..48], recipient.to_bytes());
        assert_eq!(data[48..56], 20_000_000_000u64.to_le_bytes());
        assert_eq!(data[56..64], 1u64.to_le_bytes());
    }

    #[test]
    fn test_unpack_boundaries() {
        for value in [0u64, 1, u64::MAX] {
            let args = PurchaseWithSol {
                amount: value,
                recipient_address: Pubkey::new_unique(),
                spl_token_amount: value,
                minimum_token2022_out: value,
            };
            let decoded = PurchaseWithSol::unpack(&args.data().unwrap()).unwrap();
            assert_eq!(decoded, args);
        }
    }

    #[test]
    fn test_unpack_rejects_foreign_data() {
        let args = PurchaseWithSol {
            amount: 1,
            recipient_address: Pubkey::new_unique(),
            spl_token_amount: 2,
            minimum_token2022_out: 3,
        };
        let mut data = args.data().unwrap();

        assert!(PurchaseWithSol::unpack(&data[..63]).is_err());

        data[0] ^= 0xff;
        assert!(matches!(
            PurchaseWithSol::unpack(&data),
            Err(ClientError::EncodingFailure(_))
        ));
    }

    #[test]
    fn test_account_order_matches_roles() {
        let accounts = sample_accounts();
        let entries = accounts.entries();

        let roles: Vec<&str> = entries.iter().map(|(role, _)| *role).collect();
        assert_eq!(roles, PurchaseWithSolAccounts::ROLES);

        let metas = accounts.to_account_metas();
        assert_eq!(metas.len(), 26);
        assert_eq!(metas[0].pubkey, accounts.program_state);
        assert_eq!(metas[1].pubkey, accounts.payer);
        assert_eq!(metas[8].pubkey, accounts.recipient_address);
        assert_eq!(metas[9].pubkey, accounts.raydium_amm_program);
        assert_eq!(metas[25].pubkey, accounts.system_program);
    }

    #[test]
    fn test_account_permissions() {
        let metas = sample_accounts().to_account_metas();

        let signers: Vec<usize> = (0..metas.len()).filter(|&i| metas[i].is_signer).collect();
        assert_eq!(signers, vec![1]);

        let writable: Vec<usize> = (0..metas.len()).filter(|&i| metas[i].is_writable).collect();
        assert_eq!(
            writable,
            vec![0, 1, 2, 3, 5, 6, 10, 12, 13, 14, 15, 17, 18, 19, 20, 21, 22]
        );
    }

    #[test]
    fn test_purchase_with_sol_instruction() {
        let accounts = sample_accounts();
        let program_id = Pubkey::new_unique();
        let args = PurchaseWithSol {
            amount: 666_666_666,
            recipient_address: accounts.recipient_address,
            spl_token_amount: 20_000_000_000,
            minimum_token2022_out: 506_666_665,
        };

        let ix = purchase_with_sol(&program_id, &accounts, args).unwrap();
        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.accounts, accounts.to_account_metas());
        assert_eq!(PurchaseWithSol::unpack(&ix.data).unwrap(), args);
    }

    #[test]
    fn test_purchase_with_sol_recipient_mismatch() {
        let accounts = sample_accounts();
        let args = PurchaseWithSol {
            amount: 1,
            recipient_address: Pubkey::new_unique(),
            spl_token_amount: 1,
            minimum_token2022_out: 1,
        };

        assert!(matches!(
            purchase_with_sol(&Pubkey::new_unique(), &accounts, args),
            Err(ClientError::EncodingFailure(_))
        ));
    }
}
