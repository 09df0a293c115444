//! Asset Classifier
//!
//! Decides whether the asset is native to the source chain or a bridge-wrapped
//! representation. Registry families (Evm, Solana, Algorand) ask the chain;
//! CosmWasm and NEAR read nativeness off the address. A failed or ambiguous
//! query aborts the transfer; it never defaults to native.

use tracing::debug;

use crate::chain::{ChainClient, StateQuery, StateValue};
use crate::config::ChainContracts;
use crate::core_types::{Address32, AssetOrigin, ChainFamily, ChainId, TransferIntent};
use crate::error::BridgeError;
use crate::wire;

pub async fn classify(
    intent: &TransferIntent,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<AssetOrigin, BridgeError> {
    let chain = intent.source_chain;
    let origin = match chain.family() {
        ChainFamily::Evm => classify_evm(intent, client).await?,
        ChainFamily::Solana => classify_solana(intent, contracts, client).await?,
        ChainFamily::CosmWasm => classify_cosmwasm(intent)?,
        ChainFamily::Algorand => classify_algorand(intent, contracts, client).await?,
        ChainFamily::Near => classify_near(intent, contracts)?,
    };
    debug!(
        chain = %chain,
        asset = %intent.asset,
        is_native = origin.is_native,
        holding = ?origin.holding,
        "Asset classified"
    );
    Ok(origin)
}

async fn classify_evm(
    intent: &TransferIntent,
    client: &dyn ChainClient,
) -> Result<AssetOrigin, BridgeError> {
    let chain = intent.source_chain;
    if intent.asset.is_gas_currency() {
        return Ok(AssetOrigin::gas_currency());
    }
    if let Some(origin) = from_hint(intent)? {
        return Ok(origin);
    }
    let value = query(
        client,
        chain,
        StateQuery::WrappedMeta {
            asset: intent.asset.address.clone(),
        },
    )
    .await?;
    match value {
        StateValue::Origin(None) => Ok(AssetOrigin::native_token()),
        StateValue::Origin(Some((id, address))) => {
            let origin_chain = origin_chain(chain, id)?;
            Ok(AssetOrigin::wrapped(Some(origin_chain), Some(address)))
        }
        other => Err(ambiguous(chain, "wrapped_meta", &other)),
    }
}

async fn classify_solana(
    intent: &TransferIntent,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<AssetOrigin, BridgeError> {
    let chain = intent.source_chain;
    if intent.asset.is_gas_currency() {
        return Ok(AssetOrigin::gas_currency());
    }
    if let Some(hint) = &intent.origin_hint {
        if hint.chain == chain {
            return Ok(AssetOrigin::native_token());
        }
        let Some(address) = hint.address else {
            return Err(BridgeError::MissingOriginData { chain });
        };
        return Ok(AssetOrigin::wrapped(Some(hint.chain), Some(address)));
    }

    let mint = Address32::from_slice(&intent.asset.address)?;
    let bridge_authority = contracts.mint_authority()?;
    let authority = match query(client, chain, StateQuery::MintAuthority { mint }).await? {
        StateValue::Account(authority) => authority,
        other => return Err(ambiguous(chain, "mint_authority", &other)),
    };
    if authority.as_deref() != Some(bridge_authority.as_bytes().as_slice()) {
        return Ok(AssetOrigin::native_token());
    }

    let meta = query(
        client,
        chain,
        StateQuery::WrappedMeta {
            asset: intent.asset.address.clone(),
        },
    )
    .await?;
    match meta {
        StateValue::Origin(Some((id, address))) => {
            let origin_chain = origin_chain(chain, id)?;
            Ok(AssetOrigin::wrapped(Some(origin_chain), Some(address)))
        }
        StateValue::Origin(None) => Err(BridgeError::MissingOriginData { chain }),
        other => Err(ambiguous(chain, "wrapped_meta", &other)),
    }
}

/// Bank denoms are native and escrowed by deposit. Every cw20 contract is
/// moved through an allowance and takes the wrapped path.
fn classify_cosmwasm(intent: &TransferIntent) -> Result<AssetOrigin, BridgeError> {
    let chain = intent.source_chain;
    if intent.asset.is_gas_currency() {
        return Err(BridgeError::InvalidAddress(format!(
            "{} assets are addressed by denom or contract",
            chain
        )));
    }
    let address = intent.asset.as_text()?;
    if wire::is_bank_denom(chain, address) {
        return Ok(AssetOrigin::bank_denom());
    }
    let origin = match &intent.origin_hint {
        Some(hint) if hint.chain == chain => AssetOrigin::wrapped(
            Some(chain),
            Some(hint.address.map_or_else(|| wire::bech32_address(address), Ok)?),
        ),
        Some(hint) => AssetOrigin::wrapped(Some(hint.chain), hint.address),
        None => AssetOrigin::wrapped(None, None),
    };
    Ok(origin.with_controller(address))
}

async fn classify_algorand(
    intent: &TransferIntent,
    contracts: &ChainContracts,
    client: &dyn ChainClient,
) -> Result<AssetOrigin, BridgeError> {
    let chain = intent.source_chain;
    let asset_id = intent.asset.algorand_asset_id()?;
    if asset_id == 0 {
        return Ok(AssetOrigin::gas_currency());
    }

    let creator = match query(client, chain, StateQuery::AssetCreator { asset_id }).await? {
        StateValue::Account(Some(bytes)) => text_account(chain, bytes)?,
        other => return Err(ambiguous(chain, "asset_creator", &other)),
    };
    let auth = match query(
        client,
        chain,
        StateQuery::AuthAddress {
            account: creator.clone(),
        },
    )
    .await?
    {
        StateValue::Account(auth) => auth.map(|bytes| text_account(chain, bytes)).transpose()?,
        other => return Err(ambiguous(chain, "auth_address", &other)),
    };

    let token_app_address = contracts.token_app_address()?;
    let origin = if auth.as_deref() == Some(token_app_address) {
        let hint = intent.origin_hint.as_ref();
        AssetOrigin::wrapped(hint.map(|h| h.chain), hint.and_then(|h| h.address))
    } else {
        AssetOrigin::native_token()
    };
    Ok(origin.with_controller(creator))
}

fn classify_near(
    intent: &TransferIntent,
    contracts: &ChainContracts,
) -> Result<AssetOrigin, BridgeError> {
    if intent.asset.is_gas_currency() {
        return Ok(AssetOrigin::gas_currency());
    }
    let account = intent.asset.as_text()?;
    let suffix = format!(".{}", contracts.token_bridge);
    if account.ends_with(&suffix) {
        let hint = intent.origin_hint.as_ref();
        Ok(AssetOrigin::wrapped(
            hint.map(|h| h.chain),
            hint.and_then(|h| h.address),
        ))
    } else {
        Ok(AssetOrigin::native_token())
    }
}

/// Caller-supplied origin short-circuits the registry lookup
fn from_hint(intent: &TransferIntent) -> Result<Option<AssetOrigin>, BridgeError> {
    let Some(hint) = &intent.origin_hint else {
        return Ok(None);
    };
    if hint.chain == intent.source_chain {
        return Ok(Some(AssetOrigin::native_token()));
    }
    match hint.address {
        Some(address) => Ok(Some(AssetOrigin::wrapped(Some(hint.chain), Some(address)))),
        None => Err(BridgeError::MissingOriginData {
            chain: intent.source_chain,
        }),
    }
}

async fn query(
    client: &dyn ChainClient,
    chain: ChainId,
    query: StateQuery,
) -> Result<StateValue, BridgeError> {
    client
        .query(&query)
        .await
        .map_err(|e| BridgeError::ClassificationFailed {
            chain,
            reason: format!("{} query failed: {}", query.name(), e),
        })
}

fn origin_chain(chain: ChainId, id: u16) -> Result<ChainId, BridgeError> {
    ChainId::try_from(id).map_err(|_| BridgeError::ClassificationFailed {
        chain,
        reason: format!("wrapped asset reports unregistered origin chain {}", id),
    })
}

fn text_account(chain: ChainId, bytes: Vec<u8>) -> Result<String, BridgeError> {
    String::from_utf8(bytes).map_err(|_| BridgeError::ClassificationFailed {
        chain,
        reason: "account is not valid UTF-8".into(),
    })
}

fn ambiguous(chain: ChainId, query: &str, value: &StateValue) -> BridgeError {
    BridgeError::ClassificationFailed {
        chain,
        reason: format!("{} returned unexpected {} value", query, value.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainError;
    use crate::chain::mock::MockChain;
    use crate::core_types::{AssetRef, Holding};

    fn usdc() -> AssetRef {
        AssetRef::evm(ChainId::Ethereum, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48").unwrap()
    }

    fn intent(asset: AssetRef) -> TransferIntent {
        TransferIntent::new(asset, 1000, ChainId::Solana, Address32([9; 32]))
    }

    #[tokio::test]
    async fn test_evm_native_token() {
        let client = MockChain::new(ChainId::Ethereum);
        client.answer(
            StateQuery::WrappedMeta {
                asset: usdc().address,
            },
            StateValue::Origin(None),
        );
        let origin = classify(&intent(usdc()), &ChainContracts::default(), &client)
            .await
            .unwrap();
        assert!(origin.is_native);
        assert_eq!(origin.holding, Holding::Token);
    }

    #[tokio::test]
    async fn test_evm_wrapped_token() {
        let client = MockChain::new(ChainId::Ethereum);
        client.answer(
            StateQuery::WrappedMeta {
                asset: usdc().address,
            },
            StateValue::Origin(Some((1, Address32([0xAA; 32])))),
        );
        let origin = classify(&intent(usdc()), &ChainContracts::default(), &client)
            .await
            .unwrap();
        assert!(!origin.is_native);
        assert_eq!(origin.origin_chain, Some(ChainId::Solana));
        assert_eq!(origin.origin_address, Some(Address32([0xAA; 32])));
    }

    #[tokio::test]
    async fn test_query_failure_never_defaults_to_native() {
        let client = MockChain::new(ChainId::Ethereum);
        client.fail_query(
            StateQuery::WrappedMeta {
                asset: usdc().address,
            },
            ChainError::Rpc("connection reset".into()),
        );
        let err = classify(&intent(usdc()), &ChainContracts::default(), &client)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CLASSIFICATION_FAILED");
    }

    #[tokio::test]
    async fn test_evm_gas_needs_no_query() {
        let client = MockChain::new(ChainId::Ethereum);
        let origin = classify(
            &intent(AssetRef::gas(ChainId::Ethereum)),
            &ChainContracts::default(),
            &client,
        )
        .await
        .unwrap();
        assert_eq!(origin.holding, Holding::GasCurrency);
        assert!(client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_solana_hint_without_address() {
        let client = MockChain::new(ChainId::Solana);
        let asset = AssetRef::new(ChainId::Solana, vec![5u8; 32]);
        let intent = intent(asset).with_origin_hint(ChainId::Ethereum, None);
        let err = classify(&intent, &ChainContracts::default(), &client)
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::MissingOriginData {
            chain: ChainId::Solana
        });
    }

    #[tokio::test]
    async fn test_solana_wrapped_by_mint_authority() {
        let client = MockChain::new(ChainId::Solana);
        let authority = Address32([3; 32]);
        let contracts = ChainContracts {
            mint_authority: Some(authority.to_hex()),
            ..Default::default()
        };
        let mint = Address32([5; 32]);
        client.answer(
            StateQuery::MintAuthority { mint },
            StateValue::Account(Some(authority.0.to_vec())),
        );
        client.answer(
            StateQuery::WrappedMeta {
                asset: mint.0.to_vec(),
            },
            StateValue::Origin(Some((2, Address32([0xAA; 32])))),
        );
        let asset = AssetRef::new(ChainId::Solana, mint.0.to_vec());
        let origin = classify(&intent(asset), &contracts, &client).await.unwrap();
        assert!(!origin.is_native);
        assert_eq!(origin.origin_chain, Some(ChainId::Ethereum));
    }

    #[tokio::test]
    async fn test_solana_other_authority_is_native() {
        let client = MockChain::new(ChainId::Solana);
        let contracts = ChainContracts {
            mint_authority: Some(Address32([3; 32]).to_hex()),
            ..Default::default()
        };
        let mint = Address32([5; 32]);
        client.answer(
            StateQuery::MintAuthority { mint },
            StateValue::Account(Some(vec![4; 32])),
        );
        let asset = AssetRef::new(ChainId::Solana, mint.0.to_vec());
        let origin = classify(&intent(asset), &contracts, &client).await.unwrap();
        assert!(origin.is_native);
    }

    #[tokio::test]
    async fn test_cosmwasm_structural() {
        let client = MockChain::new(ChainId::Terra2);
        let denom = intent(AssetRef::text(ChainId::Terra2, "uluna"));
        let origin = classify(&denom, &ChainContracts::default(), &client)
            .await
            .unwrap();
        assert_eq!(origin.holding, Holding::BankDenom);
        assert!(origin.is_native);
        assert!(client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_algorand_wrapped_by_rekey() {
        let client = MockChain::new(ChainId::Algorand);
        let contracts = ChainContracts {
            token_app_address: Some("TOKENAPP".into()),
            ..Default::default()
        };
        client.answer(
            StateQuery::AssetCreator { asset_id: 77 },
            StateValue::Account(Some(b"CREATOR".to_vec())),
        );
        client.answer(
            StateQuery::AuthAddress {
                account: "CREATOR".into(),
            },
            StateValue::Account(Some(b"TOKENAPP".to_vec())),
        );
        let origin = classify(&intent(AssetRef::algorand(77)), &contracts, &client)
            .await
            .unwrap();
        assert!(!origin.is_native);
        assert_eq!(origin.controller.as_deref(), Some("CREATOR"));
    }

    #[tokio::test]
    async fn test_algorand_ambiguous_creator() {
        let client = MockChain::new(ChainId::Algorand);
        client.answer(
            StateQuery::AssetCreator { asset_id: 77 },
            StateValue::Flag(true),
        );
        let err = classify(
            &intent(AssetRef::algorand(77)),
            &ChainContracts::default(),
            &client,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BridgeError::ClassificationFailed { .. }));
    }

    #[tokio::test]
    async fn test_near_suffix() {
        let client = MockChain::new(ChainId::Near);
        let contracts = ChainContracts::new("wormhole.near", "tb.near");
        let wrapped = intent(AssetRef::text(ChainId::Near, "abc123.tb.near"));
        assert!(
            !classify(&wrapped, &contracts, &client)
                .await
                .unwrap()
                .is_native
        );
        let native = intent(AssetRef::text(ChainId::Near, "usdc.near"));
        assert!(classify(&native, &contracts, &client).await.unwrap().is_native);
    }
}
