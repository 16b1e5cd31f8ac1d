//! Account derivation for the purchase program
//!
//! # Accounts
//!
//! - Program state PDA (`[b"program_state"]` under the purchase program)
//! - Associated token accounts of the recipient and of the program state

mod token_accounts;

pub use token_accounts::*;

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address_with_program_id;

use crate::constants;

/// Returns the program state PDA of the purchase program
pub fn program_state_pda(program_id: &Pubkey) -> Pubkey {
    let seeds: &[&[u8]; 1] = &[constants::seeds::PROGRAM_STATE_SEED];
    Pubkey::find_program_address(seeds, program_id).0
}

/// Returns the program state's token accounts as `(spl_token_account, token2022_account)`
///
/// Each mint is paired with the token program that owns it. The program state is a PDA, so
/// the owner is allowed off curve.
pub fn program_token_accounts(
    program_state: &Pubkey,
    spl_token: (&Pubkey, &Pubkey),
    token2022: (&Pubkey, &Pubkey),
) -> (Pubkey, Pubkey) {
    (
        get_associated_token_address_with_program_id(program_state, spl_token.0, spl_token.1),
        get_associated_token_address_with_program_id(program_state, token2022.0, token2022.1),
    )
}
