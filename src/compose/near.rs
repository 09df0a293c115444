//! NEAR token bridge calls.

use serde_json::{Value, json};

use super::{AssetPath, ComposeContext, Strategy, unsupported_path};
use crate::error::BridgeError;
use crate::fees::{FeeStep, Registration};
use crate::operation::{ComposedOperation, NearCall, OperationKind};

pub fn compose(
    ctx: &ComposeContext<'_>,
    strategy: &Strategy,
) -> Result<Vec<ComposedOperation>, BridgeError> {
    let intent = ctx.intent;
    let bridge = ctx.contracts.token_bridge.clone();
    let message_fee = ctx.fee_plan.attached_fee;

    let mut ops = Vec::new();
    for step in &ctx.fee_plan.steps {
        let op = match step {
            FeeStep::Register {
                registration: Registration::StorageDeposit { token, account },
                deposit,
            } => ComposedOperation::new(
                OperationKind::Register,
                NearCall::new(
                    token.clone(),
                    "storage_deposit",
                    json!({ "account_id": account, "registration_only": true }),
                    *deposit,
                ),
            ),
            FeeStep::Register {
                registration: Registration::Bank,
                deposit,
            } => ComposedOperation::new(
                OperationKind::Register,
                NearCall::new(bridge.clone(), "register_bank", json!({}), *deposit),
            ),
            FeeStep::TopUp { amount } => ComposedOperation::new(
                OperationKind::TopUpBank,
                NearCall::new(bridge.clone(), "fill_bank", json!({}), *amount),
            ),
            other => {
                return Err(BridgeError::CompositionInvariantViolated(format!(
                    "fee step {:?} has no NEAR form",
                    other
                )));
            }
        };
        ops.push(op);
    }

    let mut args = json!({
        "receiver": intent.destination_address.to_hex(),
        "chain": intent.destination_chain.id(),
        "fee": strategy.variant.relayer_fee().to_string(),
        "payload": strategy.variant.payload().map(hex::encode).unwrap_or_default(),
        "message_fee": json_amount(message_fee),
    });
    let kind = strategy.variant.kind();

    let call = match &strategy.path {
        AssetPath::GasCurrency => {
            let deposit =
                intent
                    .amount
                    .checked_add(message_fee)
                    .ok_or(BridgeError::AmountOverflow {
                        chain: ctx.chain(),
                        amount: intent.amount,
                    })?;
            NearCall::new(bridge, "send_transfer_near", args, deposit)
        }
        AssetPath::Wrapped { .. } => {
            args["token"] = Value::String(intent.asset.as_text()?.to_string());
            args["amount"] = Value::String(intent.amount.to_string());
            let deposit = message_fee
                .checked_add(1)
                .ok_or(BridgeError::AmountOverflow {
                    chain: ctx.chain(),
                    amount: message_fee,
                })?;
            NearCall::new(bridge, "send_transfer_wormhole_token", args, deposit)
        }
        AssetPath::Native => {
            let token = intent.asset.as_text()?.to_string();
            let ft_args = json!({
                "receiver_id": bridge,
                "amount": intent.amount.to_string(),
                "msg": args.to_string(),
            });
            NearCall::new(token, "ft_transfer_call", ft_args, 1)
        }
        AssetPath::BankDenom => return Err(unsupported_path(strategy)),
    };
    ops.push(ComposedOperation::new(kind, call));
    Ok(ops)
}

/// JSON number when it fits u64, decimal string otherwise
fn json_amount(value: u128) -> Value {
    match u64::try_from(value) {
        Ok(v) => json!(v),
        Err(_) => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::compose as compose_all;
    use crate::config::ChainContracts;
    use crate::core_types::{Address32, AssetOrigin, AssetRef, ChainId, TransferIntent, Wallet};
    use crate::ephemeral::EphemeralSet;
    use crate::fees::{FeePlan, NEAR_REGISTRATION_DEPOSIT};
    use crate::operation::Operation;

    fn run(intent: &TransferIntent, origin: &AssetOrigin, plan: &FeePlan) -> Vec<ComposedOperation> {
        let contracts = ChainContracts::new("wormhole.near", "tb.near");
        let wallet = Wallet::text("alice.near");
        let ephemeral = EphemeralSet::empty();
        let ctx = ComposeContext {
            intent,
            origin,
            fee_plan: plan,
            contracts: &contracts,
            wallet: &wallet,
            ephemeral: &ephemeral,
            nonce: 0,
        };
        compose_all(&ctx).unwrap().operations
    }

    fn call(op: &ComposedOperation) -> &NearCall {
        match &op.op {
            Operation::Near(call) => call,
            other => panic!("expected NEAR call, got {:?}", other),
        }
    }

    #[test]
    fn test_native_ft_with_registration() {
        let intent = TransferIntent::new(
            AssetRef::text(ChainId::Near, "usdc.near"),
            1000,
            ChainId::Ethereum,
            Address32([1; 32]),
        );
        let plan = FeePlan {
            steps: vec![FeeStep::Register {
                registration: Registration::StorageDeposit {
                    token: "usdc.near".into(),
                    account: "tb.near".into(),
                },
                deposit: NEAR_REGISTRATION_DEPOSIT,
            }],
            ..Default::default()
        };
        let ops = run(&intent, &AssetOrigin::native_token(), &plan);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, OperationKind::Register);
        assert_eq!(call(&ops[0]).contract, "usdc.near");
        assert_eq!(call(&ops[0]).method, "storage_deposit");
        assert_eq!(call(&ops[0]).deposit, NEAR_REGISTRATION_DEPOSIT);

        let transfer = call(&ops[1]);
        assert_eq!(ops[1].kind, OperationKind::TransferWithFee);
        assert_eq!(transfer.method, "ft_transfer_call");
        assert_eq!(transfer.deposit, 1);
        assert_eq!(transfer.args["receiver_id"], "tb.near");
        let msg: Value = serde_json::from_str(transfer.args["msg"].as_str().unwrap()).unwrap();
        assert_eq!(msg["chain"], 2);
        assert_eq!(msg["receiver"], "01".repeat(32).as_str());
    }

    #[test]
    fn test_gas_deposit_includes_fee() {
        let intent = TransferIntent::new(
            AssetRef::gas(ChainId::Near),
            5_000,
            ChainId::Ethereum,
            Address32([1; 32]),
        );
        let plan = FeePlan {
            attached_fee: 7,
            ..Default::default()
        };
        let ops = run(&intent, &AssetOrigin::gas_currency(), &plan);
        assert_eq!(call(&ops[0]).method, "send_transfer_near");
        assert_eq!(call(&ops[0]).deposit, 5_007);
        assert_eq!(call(&ops[0]).args["message_fee"], 7);
    }

    #[test]
    fn test_wrapped_burn_with_payload() {
        let intent = TransferIntent::new(
            AssetRef::text(ChainId::Near, "abc.tb.near"),
            5,
            ChainId::Ethereum,
            Address32([1; 32]),
        )
        .with_payload(vec![0xBE, 0xEF]);
        let plan = FeePlan {
            attached_fee: 7,
            ..Default::default()
        };
        let ops = run(&intent, &AssetOrigin::wrapped(None, None), &plan);
        let burn = call(&ops[0]);
        assert_eq!(ops[0].kind, OperationKind::TransferWithPayload);
        assert_eq!(burn.method, "send_transfer_wormhole_token");
        assert_eq!(burn.deposit, 8);
        assert_eq!(burn.args["payload"], "beef");
        assert_eq!(burn.args["fee"], "0");
        assert_eq!(burn.args["token"], "abc.tb.near");
    }

    #[test]
    fn test_wrapped_deposit_overflow_is_rejected() {
        let intent = TransferIntent::new(
            AssetRef::text(ChainId::Near, "abc.tb.near"),
            5,
            ChainId::Ethereum,
            Address32([1; 32]),
        );
        let plan = FeePlan {
            attached_fee: u128::MAX,
            ..Default::default()
        };
        let contracts = ChainContracts::new("wormhole.near", "tb.near");
        let wallet = Wallet::text("alice.near");
        let ephemeral = EphemeralSet::empty();
        let origin = AssetOrigin::wrapped(None, None);
        let ctx = ComposeContext {
            intent: &intent,
            origin: &origin,
            fee_plan: &plan,
            contracts: &contracts,
            wallet: &wallet,
            ephemeral: &ephemeral,
            nonce: 0,
        };
        let err = compose_all(&ctx).unwrap_err();
        assert_eq!(
            err,
            BridgeError::AmountOverflow {
                chain: ChainId::Near,
                amount: u128::MAX,
            }
        );
    }

    #[test]
    fn test_json_amount() {
        assert_eq!(json_amount(5), json!(5));
        assert_eq!(json_amount(u128::MAX), Value::String(u128::MAX.to_string()));
    }
}
