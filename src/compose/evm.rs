//! EVM token bridge calls.
//!
//! The message fee rides along as call value; there are no separate fee
//! operations on this family.

use super::{AssetPath, ComposeContext, Strategy, TransferVariant, unsupported_path};
use crate::error::BridgeError;
use crate::operation::{ComposedOperation, EvmCall, EvmMethod, OperationKind};

pub fn compose(
    ctx: &ComposeContext<'_>,
    strategy: &Strategy,
) -> Result<Vec<ComposedOperation>, BridgeError> {
    if !ctx.fee_plan.is_empty() {
        return Err(BridgeError::CompositionInvariantViolated(
            "EVM fee plans carry no standalone steps".into(),
        ));
    }
    let intent = ctx.intent;
    let bridge = ctx.contracts.token_bridge.clone();
    let fee = ctx.fee_plan.attached_fee;
    let recipient_chain = intent.destination_chain.id();
    let recipient = intent.destination_address;
    let kind = strategy.variant.kind();

    let mut ops = Vec::with_capacity(2);
    match &strategy.path {
        AssetPath::GasCurrency => {
            let value = intent.amount.checked_add(fee).ok_or(BridgeError::AmountOverflow {
                chain: ctx.chain(),
                amount: intent.amount,
            })?;
            let method = match &strategy.variant {
                TransferVariant::WithFee { relayer_fee } => EvmMethod::WrapAndTransferEth {
                    recipient_chain,
                    recipient,
                    arbiter_fee: *relayer_fee,
                    nonce: ctx.nonce,
                },
                TransferVariant::WithPayload { payload } => {
                    EvmMethod::WrapAndTransferEthWithPayload {
                        recipient_chain,
                        recipient,
                        nonce: ctx.nonce,
                        payload: payload.clone(),
                    }
                }
            };
            ops.push(ComposedOperation::new(kind, EvmCall {
                to: bridge,
                method,
                value,
            }));
        }
        AssetPath::Native | AssetPath::Wrapped { .. } => {
            let token = intent.asset.to_hex();
            if strategy.needs_approval() {
                ops.push(ComposedOperation::new(OperationKind::Approve, EvmCall {
                    to: token.clone(),
                    method: EvmMethod::Approve {
                        spender: bridge.clone(),
                        amount: intent.amount,
                    },
                    value: 0,
                }));
            }
            let method = match &strategy.variant {
                TransferVariant::WithFee { relayer_fee } => EvmMethod::TransferTokens {
                    token,
                    amount: intent.amount,
                    recipient_chain,
                    recipient,
                    arbiter_fee: *relayer_fee,
                    nonce: ctx.nonce,
                },
                TransferVariant::WithPayload { payload } => EvmMethod::TransferTokensWithPayload {
                    token,
                    amount: intent.amount,
                    recipient_chain,
                    recipient,
                    nonce: ctx.nonce,
                    payload: payload.clone(),
                },
            };
            ops.push(ComposedOperation::new(kind, EvmCall {
                to: bridge,
                method,
                value: fee,
            }));
        }
        AssetPath::BankDenom => return Err(unsupported_path(strategy)),
    }
    Ok(ops)
}
