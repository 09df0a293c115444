//! Algorand token bridge group.
//!
//! Storage opt-ins and the message fee come first, then a `nop` budget call,
//! the escrow into custody and the `sendTransfer` call. App calls that make
//! inner transactions pay double fees.

use super::{AssetPath, ComposeContext, Strategy, to_u64};
use crate::error::BridgeError;
use crate::fees::{FeeStep, Registration};
use crate::operation::{AlgorandTxn, ComposedOperation, OperationKind};

pub fn compose(
    ctx: &ComposeContext<'_>,
    strategy: &Strategy,
) -> Result<Vec<ComposedOperation>, BridgeError> {
    let chain = ctx.chain();
    let intent = ctx.intent;
    let sender = ctx.wallet.as_text()?.to_string();
    let token_app_id = ctx.contracts.token_app_id()?;
    let core_app_id = ctx.contracts.core_app_id()?;
    let asset_id = intent.asset.algorand_asset_id()?;
    let qty = to_u64(chain, intent.amount)?;
    let fee = to_u64(chain, strategy.variant.relayer_fee())?;
    let plan = ctx.fee_plan;
    let missing = |what: &str| {
        BridgeError::CompositionInvariantViolated(format!("{} was not resolved", what))
    };
    let emitter = plan
        .emitter_account
        .clone()
        .ok_or_else(|| missing("emitter account"))?;
    let custody = plan
        .custody_account
        .clone()
        .ok_or_else(|| missing("custody account"))?;

    let mut ops = Vec::new();
    for step in &plan.steps {
        let op = match step {
            FeeStep::FundAccount { account, amount } => ComposedOperation::new(
                OperationKind::FundAccount,
                AlgorandTxn::Payment {
                    sender: sender.clone(),
                    receiver: account.clone(),
                    amount: to_u64(chain, *amount)?,
                },
            ),
            FeeStep::PayMessageFee { amount } => ComposedOperation::new(
                OperationKind::PayMessageFee,
                AlgorandTxn::Payment {
                    sender: sender.clone(),
                    receiver: ctx.contracts.token_app_address()?.to_string(),
                    amount: to_u64(chain, *amount)?,
                },
            ),
            FeeStep::Register {
                registration: Registration::AppOptIn { app_id, storage },
                ..
            } => ComposedOperation::new(
                OperationKind::Register,
                AlgorandTxn::StorageOptIn {
                    storage: storage.clone(),
                    app_id: *app_id,
                },
            ),
            FeeStep::Register {
                registration: Registration::AssetOptIn { asset_id, account },
                ..
            } => ComposedOperation::new(
                OperationKind::Register,
                AlgorandTxn::AppCall {
                    sender: sender.clone(),
                    app_id: token_app_id,
                    args: vec![b"optin".to_vec(), asset_id.to_be_bytes().to_vec()],
                    foreign_apps: Vec::new(),
                    foreign_assets: vec![*asset_id],
                    accounts: vec![account.clone()],
                    fee_multiplier: 2,
                },
            ),
            other => {
                return Err(BridgeError::CompositionInvariantViolated(format!(
                    "fee step {:?} has no Algorand form",
                    other
                )));
            }
        };
        ops.push(op);
    }

    ops.push(ComposedOperation::new(OperationKind::Nop, AlgorandTxn::AppCall {
        sender: sender.clone(),
        app_id: token_app_id,
        args: vec![b"nop".to_vec()],
        foreign_apps: Vec::new(),
        foreign_assets: Vec::new(),
        accounts: Vec::new(),
        fee_multiplier: 1,
    }));

    let third_account = match &strategy.path {
        AssetPath::GasCurrency => {
            ops.push(ComposedOperation::new(OperationKind::Escrow, AlgorandTxn::Payment {
                sender: sender.clone(),
                receiver: custody.clone(),
                amount: qty,
            }));
            custody.clone()
        }
        AssetPath::Native | AssetPath::Wrapped { .. } => {
            ops.push(ComposedOperation::new(
                OperationKind::Escrow,
                AlgorandTxn::AssetTransfer {
                    sender: sender.clone(),
                    receiver: custody.clone(),
                    asset_id,
                    amount: qty,
                },
            ));
            ctx.origin
                .controller
                .clone()
                .ok_or_else(|| missing("asset creator"))?
        }
        AssetPath::BankDenom => return Err(super::unsupported_path(strategy)),
    };

    let mut args = vec![
        b"sendTransfer".to_vec(),
        asset_id.to_be_bytes().to_vec(),
        qty.to_be_bytes().to_vec(),
        intent.destination_address.as_bytes().to_vec(),
        (intent.destination_chain.id() as u64).to_be_bytes().to_vec(),
        fee.to_be_bytes().to_vec(),
    ];
    if let Some(payload) = strategy.variant.payload() {
        args.push(payload.to_vec());
    }
    ops.push(ComposedOperation::new(strategy.variant.kind(), AlgorandTxn::AppCall {
        sender,
        app_id: token_app_id,
        args,
        foreign_apps: vec![core_app_id],
        foreign_assets: vec![asset_id],
        accounts: vec![emitter, custody, third_account],
        fee_multiplier: 2,
    }));
    Ok(ops)
}
