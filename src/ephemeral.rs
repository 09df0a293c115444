//! Ephemeral co-signers
//!
//! One-time Ed25519 identities for chains that need per-transfer key material
//! (Solana message account, wrapped-SOL holding account). Generated fresh per
//! call, moved into the submission unit and dropped once it is submitted.
//! Key bytes are zeroized on drop and never leave this module.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::fmt;

use crate::chain::NativeSubmission;
use crate::core_types::{Address32, ChainFamily, Holding};
use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EphemeralRole {
    /// Bridge message account
    Message,
    /// Temporary token account wrapping the gas currency
    HoldingAccount,
}

/// Not `Clone`: each identity exists exactly once.
pub struct EphemeralIdentity {
    role: EphemeralRole,
    key: SigningKey,
}

impl EphemeralIdentity {
    pub fn generate(role: EphemeralRole) -> Self {
        Self {
            role,
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn role(&self) -> EphemeralRole {
        self.role
    }

    pub fn pubkey(&self) -> Address32 {
        Address32(self.key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.key.sign(message).to_bytes()
    }
}

impl fmt::Debug for EphemeralIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralIdentity")
            .field("role", &self.role)
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Identities owned by one transfer
#[derive(Debug, Default)]
pub struct EphemeralSet {
    identities: Vec<EphemeralIdentity>,
}

impl EphemeralSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Identities a transfer on `family` with `holding` requires
    pub fn for_transfer(family: ChainFamily, holding: Holding) -> Self {
        let mut identities = Vec::new();
        if family == ChainFamily::Solana {
            identities.push(EphemeralIdentity::generate(EphemeralRole::Message));
            if holding == Holding::GasCurrency {
                identities.push(EphemeralIdentity::generate(EphemeralRole::HoldingAccount));
            }
        }
        Self { identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn pubkey(&self, role: EphemeralRole) -> Option<Address32> {
        self.identities
            .iter()
            .find(|id| id.role == role)
            .map(|id| id.pubkey())
    }

    /// Public key for `role`, or a composition error when it was never generated
    pub fn require(&self, role: EphemeralRole) -> Result<Address32, BridgeError> {
        self.pubkey(role).ok_or_else(|| {
            BridgeError::CompositionInvariantViolated(format!(
                "no ephemeral {:?} identity for this transfer",
                role
            ))
        })
    }

    pub fn pubkeys(&self) -> Vec<Address32> {
        self.identities.iter().map(|id| id.pubkey()).collect()
    }

    /// Adds a signature from every identity listed as a required signer.
    /// Returns how many signatures were attached.
    pub fn co_sign(&self, submission: &mut NativeSubmission) -> usize {
        let mut signed = 0;
        for identity in &self.identities {
            let pubkey = identity.pubkey();
            if submission.required_signers.contains(&pubkey) {
                let signature = identity.sign(&submission.message);
                submission.signatures.push((pubkey, signature));
                signed += 1;
            }
        }
        signed
    }
}
