//! Token bridge transfer payload
//!
//! ```text
//! id 1: payload_id u8 | amount u256 | token_address [32] | token_chain u16 | to [32] | to_chain u16 | fee u256
//! id 3: payload_id u8 | amount u256 | token_address [32] | token_chain u16 | to [32] | to_chain u16 | from_address [32] | payload
//! ```
//!
//! All integers big-endian. Destination parsers are bit-exact against this layout.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::core_types::{Address32, AssetRef, ChainFamily, ChainId};
use crate::error::BridgeError;

pub const PAYLOAD_ID_TRANSFER: u8 = 1;
pub const PAYLOAD_ID_TRANSFER_WITH_PAYLOAD: u8 = 3;

/// Fixed prefix length shared by both payload ids
pub const HEADER_LEN: usize = 1 + 32 + 32 + 2 + 32 + 2;

/// Variant-specific tail of the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferBody {
    WithFee { fee: u128 },
    WithPayload { from_address: Address32, payload: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub amount: u128,
    pub token_address: Address32,
    pub token_chain: ChainId,
    pub to: Address32,
    pub to_chain: ChainId,
    pub body: TransferBody,
}

impl TransferMessage {
    pub fn payload_id(&self) -> u8 {
        match self.body {
            TransferBody::WithFee { .. } => PAYLOAD_ID_TRANSFER,
            TransferBody::WithPayload { .. } => PAYLOAD_ID_TRANSFER_WITH_PAYLOAD,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let tail = match &self.body {
            TransferBody::WithFee { .. } => 32,
            TransferBody::WithPayload { payload, .. } => 32 + payload.len(),
        };
        let mut out = Vec::with_capacity(HEADER_LEN + tail);
        out.push(self.payload_id());
        out.extend_from_slice(&u256_be(self.amount));
        out.extend_from_slice(self.token_address.as_bytes());
        out.extend_from_slice(&self.token_chain.id().to_be_bytes());
        out.extend_from_slice(self.to.as_bytes());
        out.extend_from_slice(&self.to_chain.id().to_be_bytes());
        match &self.body {
            TransferBody::WithFee { fee } => out.extend_from_slice(&u256_be(*fee)),
            TransferBody::WithPayload {
                from_address,
                payload,
            } => {
                out.extend_from_slice(from_address.as_bytes());
                out.extend_from_slice(payload);
            }
        }
        out
    }
}

/// u128 widened to a big-endian u256 word
pub fn u256_be(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

// ============================================================
// ADDRESS NORMALIZATION
// ============================================================

/// Wire identity of a token native to `asset.chain`.
///
/// Gas currencies have no token address of their own and are rejected here;
/// callers map them to the chain's wrapped-native token first.
pub fn normalize_asset(asset: &AssetRef) -> Result<Address32, BridgeError> {
    if asset.is_gas_currency() && asset.chain.family() != ChainFamily::Algorand {
        return Err(BridgeError::InvalidAddress(format!(
            "{} gas currency has no token address",
            asset.chain
        )));
    }
    match asset.chain.family() {
        ChainFamily::Evm => {
            if asset.address.len() != 20 {
                return Err(BridgeError::InvalidAddress(format!(
                    "EVM token must be 20 bytes, got {}",
                    asset.address.len()
                )));
            }
            Address32::left_pad(&asset.address)
        }
        ChainFamily::Solana => Address32::from_slice(&asset.address),
        ChainFamily::Algorand => {
            let id = asset.algorand_asset_id()?;
            Ok(Address32(u256_be(id as u128)))
        }
        ChainFamily::Near => Ok(near_account_hash(asset.as_text()?)),
        ChainFamily::CosmWasm => {
            let text = asset.as_text()?;
            let is_denom = is_bank_denom(asset.chain, text);
            match asset.chain {
                ChainId::Terra if is_denom => bank_denom_id(text),
                ChainId::Terra => bech32_address(text),
                _ => Ok(hashed_token_id(text, is_denom)),
            }
        }
    }
}

/// NEAR accounts are identified on the wire by sha256 of the account id
pub fn near_account_hash(account: &str) -> Address32 {
    let digest = Sha256::digest(account.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Address32(out)
}

/// `0x01 ‖ left-padded denom`
pub fn bank_denom_id(denom: &str) -> Result<Address32, BridgeError> {
    let bytes = denom.as_bytes();
    if bytes.len() > 31 {
        return Err(BridgeError::InvalidAddress(format!(
            "denom {} longer than 31 bytes",
            denom
        )));
    }
    let mut out = [0u8; 32];
    out[0] = 1;
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(Address32(out))
}

/// Terra2, Injective and XPLA token id:
/// `(0x01 denom | 0x00 cw20) ‖ keccak256(address)[1..]`
pub fn hashed_token_id(address: &str, is_denom: bool) -> Address32 {
    let digest = Keccak256::digest(address.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out[0] = u8::from(is_denom);
    Address32(out)
}

/// Canonical bytes of a bech32 contract or account, left-padded
pub fn bech32_address(address: &str) -> Result<Address32, BridgeError> {
    let (_hrp, data) = bech32::decode(address)
        .map_err(|e| BridgeError::InvalidAddress(format!("{}: {}", address, e)))?;
    Address32::left_pad(&data)
}

/// Structural native-denom test for CosmWasm chains
pub fn is_bank_denom(chain: ChainId, address: &str) -> bool {
    match chain {
        ChainId::Terra => {
            address == "uluna" || (address.len() == 4 && address.starts_with('u'))
        }
        ChainId::Terra2 => address == "uluna",
        ChainId::Injective => address == "inj",
        ChainId::Xpla => address == "axpla",
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address32 {
        Address32([byte; 32])
    }

    #[test]
    fn test_encode_transfer_with_fee_layout() {
        let msg = TransferMessage {
            amount: 1000,
            token_address: addr(0xAA),
            token_chain: ChainId::Ethereum,
            to: addr(0xBB),
            to_chain: ChainId::Solana,
            body: TransferBody::WithFee { fee: 10 },
        };
        let bytes = msg.encode();
        assert_eq!(bytes.len(), 133);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..31], &[0u8; 30]);
        assert_eq!(&bytes[31..33], &1000u16.to_be_bytes());
        assert_eq!(&bytes[33..65], &[0xAA; 32]);
        assert_eq!(&bytes[65..67], &[0, 2]);
        assert_eq!(&bytes[67..99], &[0xBB; 32]);
        assert_eq!(&bytes[99..101], &[0, 1]);
        assert_eq!(bytes[132], 10);
    }

    #[test]
    fn test_encode_transfer_with_payload_layout() {
        let msg = TransferMessage {
            amount: 500,
            token_address: addr(0xAA),
            token_chain: ChainId::Bsc,
            to: addr(0xBB),
            to_chain: ChainId::Ethereum,
            body: TransferBody::WithPayload {
                from_address: addr(0xCC),
                payload: vec![0xDE, 0xAD],
            },
        };
        let bytes = msg.encode();
        assert_eq!(bytes[0], 3);
        assert_eq!(bytes.len(), HEADER_LEN + 32 + 2);
        assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 32], &[0xCC; 32]);
        assert_eq!(&bytes[HEADER_LEN + 32..], &[0xDE, 0xAD]);
    }

    #[test]
    fn test_u256_max_amount() {
        let word = u256_be(u128::MAX);
        assert_eq!(&word[..16], &[0u8; 16]);
        assert_eq!(&word[16..], &[0xFF; 16]);
    }

    #[test]
    fn test_normalize_evm() {
        let usdc =
            AssetRef::evm(ChainId::Ethereum, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap();
        let id = normalize_asset(&usdc).unwrap();
        assert_eq!(&id.0[..12], &[0u8; 12]);
        assert_eq!(&id.0[12..], usdc.address.as_slice());
    }

    #[test]
    fn test_normalize_algorand() {
        assert_eq!(
            normalize_asset(&AssetRef::algorand(0)).unwrap(),
            Address32::ZERO
        );
        let id = normalize_asset(&AssetRef::algorand(258)).unwrap();
        assert_eq!(&id.0[30..], &[1, 2]);
    }

    #[test]
    fn test_bank_denom_id() {
        let id = bank_denom_id("uluna").unwrap();
        assert_eq!(id.0[0], 1);
        assert_eq!(&id.0[27..], b"uluna");
        assert!(id.0[1..27].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_bank_denom_predicate() {
        assert!(is_bank_denom(ChainId::Terra, "uluna"));
        assert!(is_bank_denom(ChainId::Terra, "uusd"));
        assert!(!is_bank_denom(ChainId::Terra, "terra1abcd"));
        assert!(is_bank_denom(ChainId::Terra2, "uluna"));
        assert!(!is_bank_denom(ChainId::Terra2, "uusd"));
        assert!(is_bank_denom(ChainId::Injective, "inj"));
        assert!(is_bank_denom(ChainId::Xpla, "axpla"));
        assert!(!is_bank_denom(ChainId::Ethereum, "uluna"));
    }

    #[test]
    fn test_terra_denom_with_capitals() {
        assert!(is_bank_denom(ChainId::Terra, "uKRW"));
        assert!(!is_bank_denom(ChainId::Terra, "uluna2"));
        assert!(!is_bank_denom(ChainId::Terra, "ukrwx"));
    }

    #[test]
    fn test_normalize_terra_classic_is_left_padded() {
        let denom = normalize_asset(&AssetRef::text(ChainId::Terra, "uusd")).unwrap();
        assert_eq!(denom, bank_denom_id("uusd").unwrap());
        assert_eq!(&denom.0[28..], b"uusd");

        let contract = "terra1x46rqay4d3cssq8gxxvqz8xt6nwlz4td20k38v";
        let (_hrp, data) = bech32::decode(contract).unwrap();
        let id = normalize_asset(&AssetRef::text(ChainId::Terra, contract)).unwrap();
        assert_eq!(id, Address32::left_pad(&data).unwrap());
        assert_eq!(&id.0[..12], &[0u8; 12]);
    }

    #[test]
    fn test_normalize_hashed_denoms() {
        let cases = [
            (
                ChainId::Terra2,
                "uluna",
                "01fa6c6fbc36d8c245b0a852a43eb5d644e8b4c477b27bfab9537c10945939da",
            ),
            (
                ChainId::Injective,
                "inj",
                "017038850bf3af746c36803cce35009268f00d22ae2b55ffb59ac5f2a6add40b",
            ),
            (
                ChainId::Xpla,
                "axpla",
                "017ce8aec5af3bb3ac0158d49771d4c8feba2e54a614fa2a1c0c95e9c4c37185",
            ),
        ];
        for (chain, denom, expected) in cases {
            let id = normalize_asset(&AssetRef::text(chain, denom)).unwrap();
            assert_eq!(id.to_hex(), expected, "{} {}", chain, denom);
        }
    }

    #[test]
    fn test_normalize_hashed_cw20() {
        let contract = "terra1nc5tatafv6eyq7llkr2gv50ff9e22mnf70qgjlv737ktmt4eswrquka9l6";
        let expected = "002bc088809237642934e8175d7118b5436ffc8c8b908b7d11c70c0c8e0975b4";
        for chain in [ChainId::Terra2, ChainId::Injective, ChainId::Xpla] {
            let id = normalize_asset(&AssetRef::text(chain, contract)).unwrap();
            assert_eq!(id.to_hex(), expected, "{}", chain);
        }
    }

    #[test]
    fn test_near_hash_is_sha256() {
        let a = near_account_hash("usdc.near");
        let b = near_account_hash("usdc.near");
        assert_eq!(a, b);
        assert_ne!(a, near_account_hash("usdt.near"));
    }

    #[test]
    fn test_gas_currency_has_no_token_address() {
        assert!(normalize_asset(&AssetRef::gas(ChainId::Ethereum)).is_err());
        assert!(normalize_asset(&AssetRef::gas(ChainId::Near)).is_err());
    }
}
