//! Solana token bridge instructions.
//!
//! Gas-currency transfers wrap SOL in a one-off token account owned by the
//! payer: create → fund → initialize → transfer → close. The close returns
//! rent and any residue to the payer.

use super::{AssetPath, ComposeContext, Strategy, TransferVariant, to_u64, unsupported_path};
use crate::core_types::Address32;
use crate::ephemeral::EphemeralRole;
use crate::error::BridgeError;
use crate::fees::{FeeStep, SPL_TOKEN_ACCOUNT_SPACE};
use crate::operation::{ComposedOperation, OperationKind, SolanaInstruction, SolanaTransferTail};

/// Wrapped SOL mint (`So11111111111111111111111111111111111111112`)
pub const NATIVE_MINT: [u8; 32] = [
    6, 155, 136, 87, 254, 171, 129, 132, 251, 104, 127, 99, 70, 24, 192, 53, 218, 196, 57, 220,
    26, 235, 59, 85, 152, 160, 240, 0, 0, 0, 0, 1,
];

pub fn compose(
    ctx: &ComposeContext<'_>,
    strategy: &Strategy,
) -> Result<Vec<ComposedOperation>, BridgeError> {
    let chain = ctx.chain();
    let intent = ctx.intent;
    let payer = ctx.wallet.address32()?;
    let message = ctx.ephemeral.require(EphemeralRole::Message)?;
    let amount = to_u64(chain, intent.amount)?;
    let tail = match &strategy.variant {
        TransferVariant::WithFee { relayer_fee } => {
            SolanaTransferTail::Fee(to_u64(chain, *relayer_fee)?)
        }
        TransferVariant::WithPayload { payload } => SolanaTransferTail::Payload(payload.clone()),
    };
    let target_address = intent.destination_address;
    let target_chain = intent.destination_chain.id();
    let kind = strategy.variant.kind();

    let mut ops = Vec::new();
    for step in &ctx.fee_plan.steps {
        match step {
            FeeStep::PayMessageFee { amount } => ops.push(ComposedOperation::new(
                OperationKind::PayMessageFee,
                SolanaInstruction::PayBridgeFee {
                    payer,
                    lamports: to_u64(chain, *amount)?,
                },
            )),
            other => {
                return Err(BridgeError::CompositionInvariantViolated(format!(
                    "fee step {:?} has no Solana form",
                    other
                )));
            }
        }
    }

    match &strategy.path {
        AssetPath::GasCurrency => {
            let holding = ctx.ephemeral.require(EphemeralRole::HoldingAccount)?;
            let rent = ctx.fee_plan.holding_rent.ok_or_else(|| {
                BridgeError::CompositionInvariantViolated(
                    "holding account rent was not resolved".into(),
                )
            })?;
            let mint = Address32(NATIVE_MINT);
            ops.push(ComposedOperation::new(
                OperationKind::CreateHoldingAccount,
                SolanaInstruction::CreateHoldingAccount {
                    payer,
                    holding,
                    lamports: rent,
                    space: SPL_TOKEN_ACCOUNT_SPACE,
                },
            ));
            ops.push(ComposedOperation::new(
                OperationKind::FundHoldingAccount,
                SolanaInstruction::FundHoldingAccount {
                    payer,
                    holding,
                    lamports: amount,
                },
            ));
            ops.push(ComposedOperation::new(
                OperationKind::InitializeHoldingAccount,
                SolanaInstruction::InitializeHoldingAccount {
                    holding,
                    mint,
                    owner: payer,
                },
            ));
            ops.push(delegate(holding, payer, amount));
            ops.push(ComposedOperation::new(kind, SolanaInstruction::TransferNative {
                payer,
                message,
                from: holding,
                mint,
                amount,
                nonce: ctx.nonce,
                target_address,
                target_chain,
                tail,
            }));
            ops.push(ComposedOperation::new(
                OperationKind::CloseHoldingAccount,
                SolanaInstruction::CloseHoldingAccount {
                    holding,
                    destination: payer,
                    owner: payer,
                },
            ));
        }
        AssetPath::Native => {
            let (from, owner) = token_account(ctx, payer)?;
            let mint = Address32::from_slice(&intent.asset.address)?;
            ops.push(delegate(from, owner, amount));
            ops.push(ComposedOperation::new(kind, SolanaInstruction::TransferNative {
                payer,
                message,
                from,
                mint,
                amount,
                nonce: ctx.nonce,
                target_address,
                target_chain,
                tail,
            }));
        }
        AssetPath::Wrapped { origin } => {
            let (origin_chain, origin_address) =
                (*origin).ok_or(BridgeError::MissingOriginData { chain })?;
            let (from, owner) = token_account(ctx, payer)?;
            ops.push(delegate(from, owner, amount));
            ops.push(ComposedOperation::new(kind, SolanaInstruction::TransferWrapped {
                payer,
                message,
                from,
                from_owner: owner,
                origin_chain: origin_chain.id(),
                origin_address,
                amount,
                nonce: ctx.nonce,
                target_address,
                target_chain,
                tail,
            }));
        }
        AssetPath::BankDenom => return Err(unsupported_path(strategy)),
    }
    Ok(ops)
}

fn delegate(token_account: Address32, owner: Address32, amount: u64) -> ComposedOperation {
    ComposedOperation::new(
        OperationKind::DelegateAuthority,
        SolanaInstruction::DelegateAuthority {
            token_account,
            owner,
            amount,
        },
    )
}

/// Source token account and its owner, defaulting both to the payer
fn token_account(
    ctx: &ComposeContext<'_>,
    payer: Address32,
) -> Result<(Address32, Address32), BridgeError> {
    let from = match &ctx.wallet.token_account {
        Some(account) => Address32::from_slice(account)?,
        None => payer,
    };
    let owner = match &ctx.wallet.token_owner {
        Some(owner) => Address32::from_slice(owner)?,
        None => payer,
    };
    Ok((from, owner))
}
