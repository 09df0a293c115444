//! Transfer Coordinator
//!
//! Runs one outbound transfer through the pipeline:
//! validate → classify → resolve fees → ephemeral keys → compose → assemble
//! (`prepare`), then build → co-sign → submit → extract (`submit`).
//! Holds no per-transfer state between calls.

use std::sync::Arc;
use tracing::{Instrument, info, warn};

use crate::assembler::{self, SubmissionUnit};
use crate::chain::{ChainClient, ConfirmedResult};
use crate::classifier;
use crate::compose::{self, ComposeContext, Strategy};
use crate::config::{AppConfig, ChainContracts};
use crate::core_types::{
    Address32, AssetOrigin, ChainFamily, ChainId, TransferId, TransferIntent, Wallet,
};
use crate::ephemeral::EphemeralSet;
use crate::error::BridgeError;
use crate::extractor;
use crate::logging::transfer_span;
use crate::fees::{self, FeePlan};
use crate::nonce::{NonceProvider, RandomNonce};
use crate::wire::TransferMessage;

/// Composed and assembled transfer, not yet submitted
#[derive(Debug)]
pub struct PreparedTransfer {
    pub id: TransferId,
    pub chain: ChainId,
    pub nonce: u32,
    pub origin: AssetOrigin,
    pub strategy: Strategy,
    pub fee_plan: FeePlan,
    /// Bridge message the transfer will publish, when derivable locally
    pub wire: Option<TransferMessage>,
    pub unit: SubmissionUnit,
}

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub id: TransferId,
    pub chain: ChainId,
    pub sequence: u64,
    pub emitter: Address32,
    pub confirmations: Vec<ConfirmedResult>,
}

pub struct TransferCoordinator {
    config: Arc<AppConfig>,
    nonces: Arc<dyn NonceProvider>,
}

impl TransferCoordinator {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_nonce_provider(config, Arc::new(RandomNonce::default()))
    }

    pub fn with_nonce_provider(config: Arc<AppConfig>, nonces: Arc<dyn NonceProvider>) -> Self {
        Self { config, nonces }
    }

    /// Classify, plan fees and compose; nothing is written to the chain
    pub async fn prepare(
        &self,
        intent: TransferIntent,
        wallet: &Wallet,
        client: &dyn ChainClient,
    ) -> Result<PreparedTransfer, BridgeError> {
        let id = TransferId::new();
        let span = transfer_span(id, intent.source_chain);
        self.prepare_transfer(id, intent, wallet, client)
            .instrument(span)
            .await
    }

    async fn prepare_transfer(
        &self,
        id: TransferId,
        intent: TransferIntent,
        wallet: &Wallet,
        client: &dyn ChainClient,
    ) -> Result<PreparedTransfer, BridgeError> {
        let chain = intent.source_chain;
        let contracts = self.validate(&intent, client)?;

        info!(
            asset = %intent.asset,
            amount = %intent.amount,
            destination = %intent.destination_chain,
            with_payload = intent.has_payload(),
            "Preparing transfer"
        );

        let origin = classifier::classify(&intent, contracts, client)
            .await
            .inspect_err(|e| warn!(error = %e, "Classification failed"))?;
        let fee_plan = fees::resolve_fees(&intent, &origin, wallet, contracts, client)
            .await
            .inspect_err(|e| warn!(error = %e, "Fee resolution failed"))?;

        let ephemeral = EphemeralSet::for_transfer(chain.family(), origin.holding);
        let nonce = self.nonces.next_nonce();
        let composition = compose::compose(&ComposeContext {
            intent: &intent,
            origin: &origin,
            fee_plan: &fee_plan,
            contracts,
            wallet,
            ephemeral: &ephemeral,
            nonce,
        })?;
        let unit = assembler::assemble(chain, composition.operations, ephemeral)?;

        info!(
            nonce,
            ops = unit.operations().count(),
            steps = unit.step_count(),
            mode = ?unit.mode,
            "Transfer prepared"
        );

        Ok(PreparedTransfer {
            id,
            chain,
            nonce,
            origin,
            strategy: composition.strategy,
            fee_plan,
            wire: composition.wire,
            unit,
        })
    }

    /// Submit a prepared transfer and recover its bridge sequence
    pub async fn submit(
        &self,
        prepared: PreparedTransfer,
        client: &dyn ChainClient,
    ) -> Result<TransferReceipt, BridgeError> {
        let span = transfer_span(prepared.id, prepared.chain);
        self.submit_transfer(prepared, client).instrument(span).await
    }

    async fn submit_transfer(
        &self,
        prepared: PreparedTransfer,
        client: &dyn ChainClient,
    ) -> Result<TransferReceipt, BridgeError> {
        let PreparedTransfer {
            id, chain, unit, ..
        } = prepared;
        let contracts = self.config.contracts(chain)?;
        check_client(chain, client)?;

        let confirmations = unit.submit(client, id).await.inspect_err(|e| {
            warn!(
                partial = e.partially_executed(),
                error = %e,
                "Submission failed"
            )
        })?;

        let last = confirmations
            .last()
            .ok_or_else(|| BridgeError::CompositionInvariantViolated("no confirmations".into()))?;
        let correlation = extractor::extract_sequence(last, contracts)?;

        info!(
            sequence = correlation.sequence,
            emitter = %correlation.emitter,
            "Transfer published"
        );

        Ok(TransferReceipt {
            id,
            chain,
            sequence: correlation.sequence,
            emitter: correlation.emitter,
            confirmations,
        })
    }

    /// `prepare` then `submit`
    pub async fn execute(
        &self,
        intent: TransferIntent,
        wallet: &Wallet,
        client: &dyn ChainClient,
    ) -> Result<TransferReceipt, BridgeError> {
        let prepared = self.prepare(intent, wallet, client).await?;
        self.submit(prepared, client).await
    }

    fn validate(
        &self,
        intent: &TransferIntent,
        client: &dyn ChainClient,
    ) -> Result<&ChainContracts, BridgeError> {
        let chain = intent.source_chain;
        let contracts = self.config.contracts(chain)?;
        check_client(chain, client)?;
        if intent.asset.chain != chain {
            return Err(BridgeError::InvalidAddress(format!(
                "asset {} does not live on source chain {}",
                intent.asset, chain
            )));
        }
        if matches!(chain.family(), ChainFamily::Solana | ChainFamily::Algorand) {
            for amount in [intent.amount, intent.relayer_fee] {
                if amount > u64::MAX as u128 {
                    return Err(BridgeError::AmountOverflow { chain, amount });
                }
            }
        }
        Ok(contracts)
    }
}

fn check_client(chain: ChainId, client: &dyn ChainClient) -> Result<(), BridgeError> {
    if client.chain() != chain {
        return Err(BridgeError::Config(format!(
            "client for {} cannot serve a {} transfer",
            client.chain(),
            chain
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock::MockChain;
    use crate::chain::{LogRecord, StateQuery, StateValue};
    use crate::core_types::AssetRef;
    use crate::nonce::FixedNonce;
    use crate::operation::OperationKind;

    fn config() -> Arc<AppConfig> {
        Arc::new(
            AppConfig::default()
                .with_bridge(
                    ChainId::Near,
                    ChainContracts::new("wormhole.near", "tb.near"),
                )
                .with_bridge(
                    ChainId::Solana,
                    ChainContracts {
                        emitter: Some(Address32([0xEE; 32]).to_hex()),
                        mint_authority: Some(Address32([0x33; 32]).to_hex()),
                        ..ChainContracts::new("core", "token")
                    },
                ),
        )
    }

    fn coordinator() -> TransferCoordinator {
        TransferCoordinator::with_nonce_provider(config(), Arc::new(FixedNonce(9)))
    }

    #[tokio::test]
    async fn test_unconfigured_source_chain() {
        let client = MockChain::new(ChainId::Ethereum);
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Ethereum),
            1,
            ChainId::Solana,
            Address32::ZERO,
        );
        let err = coordinator()
            .prepare(intent, &Wallet::new(vec![1; 20]), &client)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_CHAIN");
        assert!(client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_client_chain_mismatch() {
        let client = MockChain::new(ChainId::Solana);
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Near),
            1,
            ChainId::Ethereum,
            Address32::ZERO,
        );
        let err = coordinator()
            .prepare(intent, &Wallet::text("alice.near"), &client)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_solana_amount_overflow_before_queries() {
        let client = MockChain::new(ChainId::Solana);
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Solana),
            u64::MAX as u128 + 1,
            ChainId::Ethereum,
            Address32::ZERO,
        );
        let err = coordinator()
            .prepare(intent, &Wallet::new(vec![1; 32]), &client)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AMOUNT_OVERFLOW");
        assert!(client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_near_gas_execute() {
        let client = MockChain::new(ChainId::Near);
        client.answer(StateQuery::MessageFee, StateValue::Amount(0));
        let emitter = Address32([0x4E; 32]);
        client.set_logs(vec![LogRecord::Text(format!(
            r#"EVENT_JSON:{{"standard":"wormhole","event":"publish","seq":12,"emitter":"{}"}}"#,
            emitter.to_hex()
        ))]);
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Near),
            1_000,
            ChainId::Ethereum,
            Address32([1; 32]),
        );
        let receipt = coordinator()
            .execute(intent, &Wallet::text("alice.near"), &client)
            .await
            .unwrap();
        assert_eq!(receipt.sequence, 12);
        assert_eq!(receipt.emitter, emitter);
        assert_eq!(receipt.confirmations.len(), 1);
        assert_eq!(client.built()[0][0].kind, OperationKind::TransferWithFee);
    }

    #[tokio::test]
    async fn test_prepare_does_not_submit() {
        let client = MockChain::new(ChainId::Solana);
        client.answer(StateQuery::MessageFee, StateValue::Amount(100));
        client.answer(
            StateQuery::RentExemptMinimum { space: 165 },
            StateValue::Amount(2_039_280),
        );
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Solana),
            1_000,
            ChainId::Ethereum,
            Address32([1; 32]),
        );
        let prepared = coordinator()
            .prepare(intent, &Wallet::new(vec![1; 32]), &client)
            .await
            .unwrap();
        assert_eq!(prepared.nonce, 9);
        assert_eq!(prepared.unit.step_count(), 1);
        assert_eq!(prepared.unit.ephemeral_count(), 2);
        assert!(prepared.wire.is_some());
        assert!(client.built().is_empty());
        assert_eq!(client.submit_count(), 0);
    }
}
