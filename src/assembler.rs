//! Submission Assembler
//!
//! Packages composed operations into what the chain can take in one go.
//! Atomic families get a single batch; the rest get one batch per
//! operation, submitted in order and stopped at the first failure. Nothing
//! already confirmed is rolled back; the error says how far it got.

use tracing::{debug, info, warn};

use crate::chain::{ChainClient, ChainError, ConfirmedResult};
use crate::core_types::{ChainFamily, ChainId, TransferId};
use crate::ephemeral::EphemeralSet;
use crate::error::BridgeError;
use crate::logging::STEP_TARGET;
use crate::operation::ComposedOperation;

/// Maximum transactions in one Algorand atomic group
pub const ALGORAND_MAX_GROUP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// One transaction, all or nothing
    Atomic,
    /// Dependent calls, in order
    Sequential,
}

impl SubmissionMode {
    pub fn for_family(family: ChainFamily) -> Self {
        match family {
            ChainFamily::Solana | ChainFamily::CosmWasm | ChainFamily::Algorand => {
                SubmissionMode::Atomic
            }
            ChainFamily::Evm | ChainFamily::Near => SubmissionMode::Sequential,
        }
    }
}

/// Ready-to-submit transfer. Owns the ephemeral co-signers; they are
/// dropped when the unit is consumed by [`SubmissionUnit::submit`].
#[derive(Debug)]
pub struct SubmissionUnit {
    pub chain: ChainId,
    pub mode: SubmissionMode,
    batches: Vec<Vec<ComposedOperation>>,
    ephemeral: EphemeralSet,
}

pub fn assemble(
    chain: ChainId,
    operations: Vec<ComposedOperation>,
    ephemeral: EphemeralSet,
) -> Result<SubmissionUnit, BridgeError> {
    if operations.is_empty() {
        return Err(BridgeError::CompositionInvariantViolated(
            "nothing to submit".into(),
        ));
    }
    let family = chain.family();
    if family == ChainFamily::Algorand && operations.len() > ALGORAND_MAX_GROUP {
        return Err(BridgeError::CompositionInvariantViolated(format!(
            "{} transactions exceed the Algorand group limit of {}",
            operations.len(),
            ALGORAND_MAX_GROUP
        )));
    }
    let mode = SubmissionMode::for_family(family);
    let batches = match mode {
        SubmissionMode::Atomic => vec![operations],
        SubmissionMode::Sequential => operations.into_iter().map(|op| vec![op]).collect(),
    };
    Ok(SubmissionUnit {
        chain,
        mode,
        batches,
        ephemeral,
    })
}

impl SubmissionUnit {
    /// Number of separate submissions
    pub fn step_count(&self) -> usize {
        self.batches.len()
    }

    pub fn batches(&self) -> &[Vec<ComposedOperation>] {
        &self.batches
    }

    pub fn operations(&self) -> impl Iterator<Item = &ComposedOperation> {
        self.batches.iter().flatten()
    }

    pub fn ephemeral_count(&self) -> usize {
        self.ephemeral.len()
    }

    /// Build, co-sign and submit every batch in order.
    ///
    /// Fails with `SubmissionFailed { step, completed }` where `completed`
    /// counts batches that were already confirmed.
    pub async fn submit(
        self,
        client: &dyn ChainClient,
        transfer_id: TransferId,
    ) -> Result<Vec<ConfirmedResult>, BridgeError> {
        let SubmissionUnit {
            chain,
            mode,
            batches,
            ephemeral,
        } = self;
        let total = batches.len();
        let mut confirmations = Vec::with_capacity(total);

        for (step, batch) in batches.iter().enumerate() {
            let failed = |cause: ChainError| {
                if step > 0 {
                    warn!(
                        transfer_id = %transfer_id,
                        chain = %chain,
                        step,
                        completed = step,
                        "Transfer partially executed; confirmed steps are not rolled back"
                    );
                }
                BridgeError::SubmissionFailed {
                    chain,
                    step,
                    completed: step,
                    cause,
                }
            };

            let mut native = client.build(batch).await.map_err(failed)?;

            let expected: Vec<_> = batch.iter().flat_map(|op| op.ephemeral_signers()).collect();
            if let Some(missing) = expected
                .iter()
                .find(|key| !native.required_signers.contains(*key))
            {
                return Err(failed(ChainError::Unexpected(format!(
                    "built submission does not require ephemeral signer {}",
                    missing
                ))));
            }
            let signed = ephemeral.co_sign(&mut native);

            debug!(
                target: STEP_TARGET,
                transfer_id = %transfer_id,
                chain = %chain,
                step,
                ops = batch.len(),
                co_signers = signed,
                "Submitting"
            );

            let confirmed = client.submit(native).await.map_err(failed)?;
            info!(
                transfer_id = %transfer_id,
                chain = %chain,
                step,
                tx_id = %confirmed.tx_id,
                "Step confirmed"
            );
            confirmations.push(confirmed);
        }

        debug!(
            transfer_id = %transfer_id,
            chain = %chain,
            mode = ?mode,
            steps = total,
            "Submission complete"
        );
        drop(ephemeral);
        Ok(confirmations)
    }
}
