//! CosmWasm token bridge messages.
//!
//! Bank denoms are deposited into the bridge with funds attached; cw20
//! contracts grant the bridge an allowance. Both then `initiate_transfer`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use super::{AssetPath, ComposeContext, Strategy, TransferVariant, unsupported_path};
use crate::error::BridgeError;
use crate::operation::{Coin, ComposedOperation, CosmWasmMsg, OperationKind};

pub fn compose(
    ctx: &ComposeContext<'_>,
    strategy: &Strategy,
) -> Result<Vec<ComposedOperation>, BridgeError> {
    if !ctx.fee_plan.is_empty() {
        return Err(BridgeError::CompositionInvariantViolated(
            "CosmWasm fee plans carry no standalone steps".into(),
        ));
    }
    let sender = ctx.wallet.as_text()?.to_string();
    let bridge = ctx.contracts.token_bridge.clone();
    let asset = ctx.intent.asset.as_text()?.to_string();
    let amount = ctx.intent.amount.to_string();

    let mut ops = Vec::with_capacity(2);
    let info = match &strategy.path {
        AssetPath::BankDenom => {
            ops.push(ComposedOperation::new(OperationKind::Deposit, CosmWasmMsg {
                sender: sender.clone(),
                contract: bridge.clone(),
                msg: json!({ "deposit_tokens": {} }),
                funds: vec![Coin {
                    denom: asset.clone(),
                    amount: amount.clone(),
                }],
            }));
            json!({ "native_token": { "denom": asset } })
        }
        AssetPath::Wrapped { .. } => {
            // The allowance is granted on the token contract itself
            ops.push(ComposedOperation::new(OperationKind::Approve, CosmWasmMsg {
                sender: sender.clone(),
                contract: asset.clone(),
                msg: json!({
                    "increase_allowance": {
                        "spender": bridge,
                        "amount": amount,
                        "expires": { "never": {} },
                    }
                }),
                funds: Vec::new(),
            }));
            json!({ "token": { "contract_addr": asset } })
        }
        AssetPath::Native | AssetPath::GasCurrency => return Err(unsupported_path(strategy)),
    };

    ops.push(ComposedOperation::new(strategy.variant.kind(), CosmWasmMsg {
        sender,
        contract: bridge,
        msg: initiate_transfer(ctx, &strategy.variant, info, amount),
        funds: Vec::new(),
    }));
    Ok(ops)
}

fn initiate_transfer(
    ctx: &ComposeContext<'_>,
    variant: &TransferVariant,
    info: Value,
    amount: String,
) -> Value {
    let mut body = json!({
        "asset": { "amount": amount, "info": info },
        "recipient_chain": ctx.intent.destination_chain.id(),
        "recipient": STANDARD.encode(ctx.intent.destination_address.as_bytes()),
        "fee": variant.relayer_fee().to_string(),
        "nonce": ctx.nonce,
    });
    match variant.payload() {
        Some(payload) => {
            body["payload"] = Value::String(STANDARD.encode(payload));
            json!({ "initiate_transfer_with_payload": body })
        }
        None => json!({ "initiate_transfer": body }),
    }
}
