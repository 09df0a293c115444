//! Fee & Deposit Resolver
//!
//! Works out the ancillary payments a transfer needs before the bridge will
//! accept it: message fee, storage/opt-in registrations and their funding,
//! fee-bank top-ups. Steps are emitted in dependency order; funding precedes
//! the registration it pays for, registration precedes use.

use tracing::debug;

use crate::chain::{ChainClient, StateQuery, StateValue};
use crate::config::ChainContracts;
use crate::core_types::{AssetOrigin, ChainFamily, ChainId, Holding, TransferIntent, Wallet};
use crate::error::BridgeError;

/// Minimum balance seeded into a fresh Algorand storage account (µALGO)
pub const ALGORAND_STORAGE_SEED: u128 = 1_002_000;
/// Minimum balance added for one more Algorand asset holding (µALGO)
pub const ALGORAND_ASSET_OPTIN_SEED: u128 = 100_000;
/// NEAR storage / bank registration deposit, 0.002 NEAR (yocto)
pub const NEAR_REGISTRATION_DEPOSIT: u128 = 2_000_000_000_000_000_000_000;
/// SPL token account size
pub const SPL_TOKEN_ACCOUNT_SPACE: u64 = 165;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// NEP-145 storage for `account` on `token`
    StorageDeposit { token: String, account: String },
    /// NEAR token bridge fee bank for the sender
    Bank,
    /// Algorand storage account opt-in to `app_id`
    AppOptIn { app_id: u64, storage: String },
    /// Algorand custody account opt-in to `asset_id`
    AssetOptIn { asset_id: u64, account: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeStep {
    PayMessageFee { amount: u128 },
    FundAccount { account: String, amount: u128 },
    Register { registration: Registration, deposit: u128 },
    TopUp { amount: u128 },
}

/// Ordered ancillary payments plus the resolved values composition needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeePlan {
    pub steps: Vec<FeeStep>,
    /// Message fee carried by the transfer call itself (EVM value, NEAR deposit)
    pub attached_fee: u128,
    /// Rent-exempt minimum for a Solana holding account
    pub holding_rent: Option<u64>,
    /// Algorand emitter storage account
    pub emitter_account: Option<String>,
    /// Algorand account that receives the escrowed asset
    pub custody_account: Option<String>,
}

impl FeePlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub async fn resolve_fees(
    intent: &TransferIntent,
    origin: &AssetOrigin,
    wallet: &Wallet,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<FeePlan, BridgeError> {
    let chain = intent.source_chain;
    let plan = match chain.family() {
        ChainFamily::Evm => FeePlan {
            attached_fee: message_fee(client, chain).await?,
            ..Default::default()
        },
        ChainFamily::Solana => resolve_solana(origin, client, chain).await?,
        ChainFamily::CosmWasm => FeePlan::default(),
        ChainFamily::Algorand => resolve_algorand(intent, origin, contracts, client).await?,
        ChainFamily::Near => resolve_near(intent, origin, wallet, contracts, client).await?,
    };
    debug!(
        chain = %chain,
        steps = plan.steps.len(),
        attached_fee = %plan.attached_fee,
        "Fee plan resolved"
    );
    Ok(plan)
}

async fn resolve_solana(
    origin: &AssetOrigin,
    client: &dyn ChainClient,
    chain: ChainId,
) -> Result<FeePlan, BridgeError> {
    let mut plan = FeePlan::default();
    let fee = message_fee(client, chain).await?;
    if fee > 0 {
        plan.steps.push(FeeStep::PayMessageFee { amount: fee });
    }
    if origin.holding == Holding::GasCurrency {
        let rent = amount(
            client,
            chain,
            StateQuery::RentExemptMinimum {
                space: SPL_TOKEN_ACCOUNT_SPACE,
            },
        )
        .await?;
        let rent = u64::try_from(rent).map_err(|_| BridgeError::FeeResolutionFailed {
            chain,
            reason: format!("rent {} exceeds u64", rent),
        })?;
        plan.holding_rent = Some(rent);
    }
    Ok(plan)
}

async fn resolve_algorand(
    intent: &TransferIntent,
    origin: &AssetOrigin,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<FeePlan, BridgeError> {
    let chain = intent.source_chain;
    let core_app_id = contracts.core_app_id()?;
    let token_app_id = contracts.token_app_id()?;
    let asset_id = intent.asset.algorand_asset_id()?;
    let mut plan = FeePlan::default();

    // Emitter storage on the core bridge
    let emitter_tag = contracts.emitter()?.to_hex();
    let emitter = storage_opt_in(&mut plan, client, chain, core_app_id, 0, emitter_tag).await?;
    plan.emitter_account = Some(emitter);

    let fee = message_fee(client, chain).await?;
    if fee > 0 {
        plan.steps.push(FeeStep::PayMessageFee { amount: fee });
    }

    // Wrapped assets are held by their creator; everything else by native custody
    let custody = if origin.is_native {
        storage_opt_in(
            &mut plan,
            client,
            chain,
            token_app_id,
            asset_id,
            hex::encode("native"),
        )
        .await?
    } else {
        origin
            .controller
            .clone()
            .ok_or_else(|| BridgeError::FeeResolutionFailed {
                chain,
                reason: "wrapped asset has no creator account".into(),
            })?
    };

    if asset_id != 0 {
        let query = StateQuery::AssetOptedIn {
            asset_id,
            account: custody.clone(),
        };
        if !flag(client, chain, query).await? {
            plan.steps.push(FeeStep::FundAccount {
                account: custody.clone(),
                amount: ALGORAND_ASSET_OPTIN_SEED,
            });
            plan.steps.push(FeeStep::Register {
                registration: Registration::AssetOptIn {
                    asset_id,
                    account: custody.clone(),
                },
                deposit: 0,
            });
        }
    }
    plan.custody_account = Some(custody);
    Ok(plan)
}

/// Looks up the storage account for `(app_id, index, tag)` and schedules
/// funding plus opt-in when it has not joined the app yet.
async fn storage_opt_in(
    plan: &mut FeePlan,
    client: &dyn ChainClient,
    chain: ChainId,
    app_id: u64,
    index: u64,
    tag: String,
) -> Result<String, BridgeError> {
    let query = StateQuery::StorageAccount { app_id, index, tag };
    match fetch(client, chain, query).await? {
        StateValue::Storage { address, opted_in } => {
            if !opted_in {
                plan.steps.push(FeeStep::FundAccount {
                    account: address.clone(),
                    amount: ALGORAND_STORAGE_SEED,
                });
                plan.steps.push(FeeStep::Register {
                    registration: Registration::AppOptIn {
                        app_id,
                        storage: address.clone(),
                    },
                    deposit: 0,
                });
            }
            Ok(address)
        }
        other => Err(unexpected(chain, "storage_account", &other)),
    }
}

async fn resolve_near(
    intent: &TransferIntent,
    origin: &AssetOrigin,
    wallet: &Wallet,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<FeePlan, BridgeError> {
    let chain = intent.source_chain;
    let fee = message_fee(client, chain).await?;
    let mut plan = FeePlan {
        attached_fee: fee,
        ..Default::default()
    };
    // Gas currency and wrapped tokens pay the fee as attached deposit
    if origin.holding == Holding::GasCurrency || !origin.is_native {
        return Ok(plan);
    }

    let token = intent.asset.as_text()?.to_string();
    let bridge = contracts.token_bridge.clone();
    let registered = StateQuery::StorageRegistered {
        token: token.clone(),
        account: bridge.clone(),
    };
    if !flag(client, chain, registered).await? {
        plan.steps.push(FeeStep::Register {
            registration: Registration::StorageDeposit {
                token,
                account: bridge,
            },
            deposit: NEAR_REGISTRATION_DEPOSIT,
        });
    }

    if fee > 0 {
        let account = wallet.as_text()?.to_string();
        match fetch(client, chain, StateQuery::BankBalance { account }).await? {
            StateValue::Bank {
                registered,
                balance,
            } => {
                if !registered {
                    plan.steps.push(FeeStep::Register {
                        registration: Registration::Bank,
                        deposit: NEAR_REGISTRATION_DEPOSIT,
                    });
                }
                if balance < fee {
                    // Full fee, not the shortfall
                    plan.steps.push(FeeStep::TopUp { amount: fee });
                }
            }
            other => return Err(unexpected(chain, "bank_balance", &other)),
        }
    }
    Ok(plan)
}

async fn message_fee(client: &dyn ChainClient, chain: ChainId) -> Result<u128, BridgeError> {
    amount(client, chain, StateQuery::MessageFee).await
}

async fn amount(
    client: &dyn ChainClient,
    chain: ChainId,
    query: StateQuery,
) -> Result<u128, BridgeError> {
    let name = query.name();
    match fetch(client, chain, query).await? {
        StateValue::Amount(amount) => Ok(amount),
        other => Err(unexpected(chain, name, &other)),
    }
}

async fn flag(
    client: &dyn ChainClient,
    chain: ChainId,
    query: StateQuery,
) -> Result<bool, BridgeError> {
    let name = query.name();
    match fetch(client, chain, query).await? {
        StateValue::Flag(flag) => Ok(flag),
        other => Err(unexpected(chain, name, &other)),
    }
}

async fn fetch(
    client: &dyn ChainClient,
    chain: ChainId,
    query: StateQuery,
) -> Result<StateValue, BridgeError> {
    client
        .query(&query)
        .await
        .map_err(|e| BridgeError::FeeResolutionFailed {
            chain,
            reason: format!("{} query failed: {}", query.name(), e),
        })
}

fn unexpected(chain: ChainId, query: &str, value: &StateValue) -> BridgeError {
    BridgeError::FeeResolutionFailed {
        chain,
        reason: format!("{} returned unexpected {} value", query, value.kind()),
    }
}
