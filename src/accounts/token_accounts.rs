//! Associated token account derivation for purchase recipients
//!
//! The purchase program references the recipient's token accounts positionally, so the
//! addresses derived here must match the Associated Token Account program byte for byte:
//! the PDA of `[owner, token_program, mint]` under the ATA program, with canonical bump.
//!
//! Derivation is pure address arithmetic. No account is created and no network call is made.

use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;

use crate::{constants, error::ClientError};

/// Token accounts of a purchase recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAccounts {
    /// Recipient's account for the token bought by the swap leg
    pub recipient_swap_token_account: Pubkey,
    /// Recipient's account for the distributed reward token
    pub recipient_distribution_token_account: Pubkey,
}

/// Parses a base58 recipient address and checks that it is a signable wallet key
///
/// # Errors
///
/// Returns `InvalidRecipientAddress` if the string is not a 32-byte base58 key, or if the key
/// is off the ed25519 curve (a PDA cannot own a recipient token account in this flow).
pub fn parse_recipient(recipient: &str) -> Result<Pubkey, ClientError> {
    let pubkey = Pubkey::from_str(recipient.trim()).map_err(|e| {
        ClientError::InvalidRecipientAddress(format!("{}: {}", recipient, e))
    })?;

    if !pubkey.is_on_curve() {
        return Err(ClientError::InvalidRecipientAddress(format!(
            "{}: owner is off curve and cannot sign",
            recipient
        )));
    }

    Ok(pubkey)
}

/// Returns the associated token account of `owner` for `mint`
///
/// # Arguments
///
/// * `owner` - Wallet owning the token account
/// * `mint` - Token mint
/// * `token_program` - Token program that owns the mint
/// * `allow_owner_off_curve` - Accept owners that are PDAs
pub fn get_associated_token_address_checked(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
    allow_owner_off_curve: bool,
) -> Result<Pubkey, ClientError> {
    if !allow_owner_off_curve && !owner.is_on_curve() {
        return Err(ClientError::InvalidRecipientAddress(format!(
            "{}: owner is off curve and cannot sign",
            owner
        )));
    }

    Ok(get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    ))
}

/// Derives the recipient's token accounts for the swap and distribution mints
///
/// Both accounts are derived under the classic token program, matching what the purchase
/// program expects. Use [`derive_recipient_token_accounts_with_programs`] when a mint is
/// owned by a different token program.
///
/// # Arguments
///
/// * `recipient` - Base58 wallet address receiving the tokens
/// * `swap_mint` - Mint bought by the swap leg
/// * `distribution_mint` - Mint of the reward token
///
/// # Errors
///
/// Returns `InvalidRecipientAddress` if the recipient is malformed or off curve.
pub fn derive_recipient_token_accounts(
    recipient: &str,
    swap_mint: &Pubkey,
    distribution_mint: &Pubkey,
) -> Result<DerivedAccounts, ClientError> {
    derive_recipient_token_accounts_with_programs(
        recipient,
        (swap_mint, &constants::accounts::TOKEN_PROGRAM),
        (distribution_mint, &constants::accounts::TOKEN_PROGRAM),
    )
}

/// Derives the recipient's token accounts with an explicit token program per mint
///
/// Each mint is paired with the token program that owns it: `(mint, token_program)`.
pub fn derive_recipient_token_accounts_with_programs(
    recipient: &str,
    swap: (&Pubkey, &Pubkey),
    distribution: (&Pubkey, &Pubkey),
) -> Result<DerivedAccounts, ClientError> {
    let owner = parse_recipient(recipient)?;

    Ok(DerivedAccounts {
        recipient_swap_token_account: get_associated_token_address_checked(
            &owner, swap.0, swap.1, false,
        )?,
        recipient_distribution_token_account: get_associated_token_address_checked(
            &owner,
            distribution.0,
            distribution.1,
            false,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{signature::Keypair, signer::Signer};

    #[test]
    fn test_derivation_is_deterministic() {
        let recipient = Keypair::new().pubkey().to_string();
        let swap_mint = Pubkey::new_unique();
        let distribution_mint = Pubkey::new_unique();

        let first =
            derive_recipient_token_accounts(&recipient, &swap_mint, &distribution_mint).unwrap();
        let second =
            derive_recipient_token_accounts(&recipient, &swap_mint, &distribution_mint).unwrap();

        assert_eq!(first, second);
        assert_ne!(
            first.recipient_swap_token_account,
            first.recipient_distribution_token_account
        );
    }

    #[test]
    fn test_matches_manual_pda() {
        let owner = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();

        let (expected, _bump) = Pubkey::find_program_address(
            &[
                owner.as_ref(),
                constants::accounts::TOKEN_PROGRAM.as_ref(),
                mint.as_ref(),
            ],
            &constants::accounts::ASSOCIATED_TOKEN_PROGRAM,
        );

        let derived = get_associated_token_address_checked(
            &owner,
            &mint,
            &constants::accounts::TOKEN_PROGRAM,
            false,
        )
        .unwrap();
        assert_eq!(derived, expected);
    }

    #[test]
    fn test_token_program_changes_address() {
        let recipient = Keypair::new().pubkey();
        let mint = Pubkey::new_unique();

        let classic = derive_recipient_token_accounts_with_programs(
            &recipient.to_string(),
            (&mint, &constants::accounts::TOKEN_PROGRAM),
            (&mint, &constants::accounts::TOKEN_PROGRAM),
        )
        .unwrap();
        let token_2022 = derive_recipient_token_accounts_with_programs(
            &recipient.to_string(),
            (&mint, &constants::accounts::TOKEN_2022_PROGRAM),
            (&mint, &constants::accounts::TOKEN_PROGRAM),
        )
        .unwrap();

        assert_ne!(
            classic.recipient_swap_token_account,
            token_2022.recipient_swap_token_account
        );
        assert_eq!(
            classic.recipient_distribution_token_account,
            token_2022.recipient_distribution_token_account
        );
    }

    #[test]
    fn test_malformed_recipient() {
        let mint = Pubkey::new_unique();
        for bad in ["", "not-base58-0OIl", "3yZe7d", "11111111111111111111111111111111111111111111111"] {
            assert!(
                matches!(
                    derive_recipient_token_accounts(bad, &mint, &mint),
                    Err(ClientError::InvalidRecipientAddress(_))
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_off_curve_recipient() {
        let pda = crate::accounts::program_state_pda(&Pubkey::new_unique());
        let mint = Pubkey::new_unique();

        assert!(matches!(
            derive_recipient_token_accounts(&pda.to_string(), &mint, &mint),
            Err(ClientError::InvalidRecipientAddress(_))
        ));
        assert!(get_associated_token_address_checked(
            &pda,
            &mint,
            &constants::accounts::TOKEN_PROGRAM,
            true
        )
        .is_ok());
    }
}
