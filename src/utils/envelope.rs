//! Serialized instruction envelope consumed by the payment widget
//!
//! The widget takes a smart contract call as `sc_input_data`: the instruction is written as
//! JSON (`program_id`, `accounts`, hex `data`) and the UTF-8 bytes of that JSON are hex
//! encoded once more.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use crate::error::ClientError;

/// Account entry of an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeAccount {
    pub address: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl From<&AccountMeta> for EnvelopeAccount {
    fn from(meta: &AccountMeta) -> Self {
        Self {
            address: meta.pubkey.to_string(),
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        }
    }
}

/// Instruction in the JSON shape expected by the payment widget
///
/// Field order is significant: it is the key order of the serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionEnvelope {
    pub program_id: String,
    pub accounts: Vec<EnvelopeAccount>,
    /// Lowercase hex of the instruction data
    pub data: String,
}

impl InstructionEnvelope {
    /// Wraps a Solana instruction
    pub fn from_instruction(instruction: &Instruction) -> Self {
        Self {
            program_id: instruction.program_id.to_string(),
            accounts: instruction.accounts.iter().map(EnvelopeAccount::from).collect(),
            data: hex::encode(&instruction.data),
        }
    }

    /// Serializes the envelope to compact JSON
    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::EncodingFailure(format!("envelope json: {}", e)))
    }

    /// Serializes the envelope to the hex-of-JSON form handed to the widget
    pub fn to_hex(&self) -> Result<String, ClientError> {
        Ok(hex::encode(self.to_json()?.as_bytes()))
    }

    /// Parses the hex-of-JSON form produced by [`InstructionEnvelope::to_hex`]
    pub fn from_hex(encoded: &str) -> Result<Self, ClientError> {
        let bytes = hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| ClientError::EncodingFailure(format!("envelope hex: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::EncodingFailure(format!("envelope json: {}", e)))
    }

    /// Rebuilds the Solana instruction described by the envelope
    pub fn to_instruction(&self) -> Result<Instruction, ClientError> {
        let program_id = parse_address(&self.program_id)?;
        let accounts = self
            .accounts
            .iter()
            .map(|account| {
                let pubkey = parse_address(&account.address)?;
                Ok(if account.is_writable {
                    AccountMeta::new(pubkey, account.is_signer)
                } else {
                    AccountMeta::new_readonly(pubkey, account.is_signer)
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;
        let data = hex::decode(&self.data)
            .map_err(|e| ClientError::EncodingFailure(format!("instruction data hex: {}", e)))?;

        Ok(Instruction::new_with_bytes(program_id, &data, accounts))
    }
}

fn parse_address(address: &str) -> Result<Pubkey, ClientError> {
    Pubkey::from_str(address)
        .map_err(|e| ClientError::EncodingFailure(format!("address {}: {}", address, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let program_id = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let ix = Instruction::new_with_bytes(
            program_id,
            &[0xde, 0xad, 0x01],
            vec![AccountMeta::new(payer, true), AccountMeta::new_readonly(mint, false)],
        );

        let json = InstructionEnvelope::from_instruction(&ix).to_json().unwrap();
        let expected = format!(
            concat!(
                r#"{{"program_id":"{}","accounts":["#,
                r#"{{"address":"{}","is_signer":true,"is_writable":true}},"#,
                r#"{{"address":"{}","is_signer":false,"is_writable":false}}"#,
                r#"],"data":"dead01"}}"#
            ),
            program_id, payer, mint
        );
        assert_eq!(json, expected);
    }

    #[test]
    fn test_hex_is_utf8_of_json() {
        let ix = Instruction::new_with_bytes(Pubkey::new_unique(), &[7], vec![]);
        let envelope = InstructionEnvelope::from_instruction(&ix);

        let encoded = envelope.to_hex().unwrap();
        assert!(encoded.starts_with(&hex::encode(r#"{"program_id":""#)));
        assert_eq!(
            String::from_utf8(hex::decode(&encoded).unwrap()).unwrap(),
            envelope.to_json().unwrap()
        );
        assert_eq!(InstructionEnvelope::from_hex(&encoded).unwrap(), envelope);
        assert_eq!(envelope.to_instruction().unwrap(), ix);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert!(matches!(
            InstructionEnvelope::from_hex("zz"),
            Err(ClientError::EncodingFailure(_))
        ));
        assert!(matches!(
            InstructionEnvelope::from_hex(&hex::encode("[1,2]")),
            Err(ClientError::EncodingFailure(_))
        ));
    }
}
