//! Bridge Error Types
//!
//! Every failure in the prepare/submit pipeline surfaces as a [`BridgeError`]
//! carrying enough context (chain, step index, cause) for the caller to tell
//! "nothing happened" apart from "partially happened".

use thiserror::Error;

use crate::core_types::ChainId;

/// Failure reported by a chain collaborator (RPC, builder, submitter).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Rejected by chain: {0}")]
    Rejected(String),

    #[error("Submission not confirmed: {0}")]
    Unconfirmed(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

/// Transfer pipeline error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    // === Validation Errors ===
    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Amount {amount} exceeds the {chain} transfer range")]
    AmountOverflow { chain: ChainId, amount: u128 },

    #[error("Configuration error: {0}")]
    Config(String),

    // === Pipeline Errors ===
    #[error("Asset classification failed on {chain}: {reason}")]
    ClassificationFailed { chain: ChainId, reason: String },

    #[error("Wrapped asset on {chain} has no origin chain/address")]
    MissingOriginData { chain: ChainId },

    #[error("Fee resolution failed on {chain}: {reason}")]
    FeeResolutionFailed { chain: ChainId, reason: String },

    #[error("Composition invariant violated: {0}")]
    CompositionInvariantViolated(String),

    #[error("Submission failed on {chain} at step {step} ({completed} step(s) already confirmed): {cause}")]
    SubmissionFailed {
        chain: ChainId,
        step: usize,
        completed: usize,
        cause: ChainError,
    },

    #[error("Bridge sequence not found in {chain} confirmation {tx_id}")]
    SequenceNotFound { chain: ChainId, tx_id: String },
}

impl BridgeError {
    /// Stable error code for callers and logs
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::UnsupportedChain(_) => "UNSUPPORTED_CHAIN",
            BridgeError::InvalidAddress(_) => "INVALID_ADDRESS",
            BridgeError::AmountOverflow { .. } => "AMOUNT_OVERFLOW",
            BridgeError::Config(_) => "CONFIG_ERROR",
            BridgeError::ClassificationFailed { .. } => "CLASSIFICATION_FAILED",
            BridgeError::MissingOriginData { .. } => "MISSING_ORIGIN_DATA",
            BridgeError::FeeResolutionFailed { .. } => "FEE_RESOLUTION_FAILED",
            BridgeError::CompositionInvariantViolated(_) => "COMPOSITION_INVARIANT_VIOLATED",
            BridgeError::SubmissionFailed { .. } => "SUBMISSION_FAILED",
            BridgeError::SequenceNotFound { .. } => "SEQUENCE_NOT_FOUND",
        }
    }

    /// True when some chain-side state was already mutated before the failure.
    ///
    /// Only a non-atomic submission that confirmed at least one step can leave
    /// the caller partially executed. Nothing is rolled back.
    pub fn partially_executed(&self) -> bool {
        matches!(self, BridgeError::SubmissionFailed { completed, .. } if *completed > 0)
    }

    /// Chain the error is attributed to, when known
    pub fn chain(&self) -> Option<ChainId> {
        match self {
            BridgeError::AmountOverflow { chain, .. }
            | BridgeError::ClassificationFailed { chain, .. }
            | BridgeError::MissingOriginData { chain }
            | BridgeError::FeeResolutionFailed { chain, .. }
            | BridgeError::SubmissionFailed { chain, .. }
            | BridgeError::SequenceNotFound { chain, .. } => Some(*chain),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for BridgeError {
    fn from(e: anyhow::Error) -> Self {
        BridgeError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            BridgeError::UnsupportedChain("7777".into()).code(),
            "UNSUPPORTED_CHAIN"
        );
        assert_eq!(
            BridgeError::MissingOriginData {
                chain: ChainId::Solana
            }
            .code(),
            "MISSING_ORIGIN_DATA"
        );
        assert_eq!(
            BridgeError::SequenceNotFound {
                chain: ChainId::Ethereum,
                tx_id: "0xabc".into()
            }
            .code(),
            "SEQUENCE_NOT_FOUND"
        );
    }

    #[test]
    fn test_partial_execution_flag() {
        let nothing = BridgeError::SubmissionFailed {
            chain: ChainId::Near,
            step: 0,
            completed: 0,
            cause: ChainError::Rejected("out of gas".into()),
        };
        assert!(!nothing.partially_executed());

        let partial = BridgeError::SubmissionFailed {
            chain: ChainId::Near,
            step: 2,
            completed: 2,
            cause: ChainError::Rejected("out of gas".into()),
        };
        assert!(partial.partially_executed());

        assert!(!BridgeError::Config("x".into()).partially_executed());
    }

    #[test]
    fn test_display() {
        let err = BridgeError::SubmissionFailed {
            chain: ChainId::Ethereum,
            step: 1,
            completed: 1,
            cause: ChainError::Rpc("timeout".into()),
        };
        assert_eq!(
            err.to_string(),
            "Submission failed on ethereum at step 1 (1 step(s) already confirmed): RPC error: timeout"
        );
        assert_eq!(err.chain(), Some(ChainId::Ethereum));
    }
}
