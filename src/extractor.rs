//! Result Extractor
//!
//! Recovers the bridge sequence and emitter from a confirmed submission.
//! This is where the cross-chain correlation id first becomes known.

use serde::Deserialize;
use sha3::{Digest, Keccak256};

use crate::chain::{ConfirmedResult, LogRecord};
use crate::config::ChainContracts;
use crate::core_types::{Address32, ChainFamily};
use crate::error::BridgeError;

pub const LOG_MESSAGE_PUBLISHED: &str = "LogMessagePublished(address,uint64,uint32,bytes,uint8)";
const SOLANA_SEQUENCE_PREFIX: &str = "Sequence: ";
const NEAR_EVENT_PREFIX: &str = "EVENT_JSON:";

/// Sequence assigned by the core bridge plus the emitting contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correlation {
    pub sequence: u64,
    pub emitter: Address32,
}

pub fn extract_sequence(
    confirmed: &ConfirmedResult,
    contracts: &ChainContracts,
) -> Result<Correlation, BridgeError> {
    let found = match confirmed.chain.family() {
        ChainFamily::Evm => from_evm(confirmed, contracts)?,
        ChainFamily::Solana => from_text(confirmed, parse_solana_line)
            .map(|sequence| contracts.emitter().map(|emitter| Correlation { sequence, emitter }))
            .transpose()?,
        ChainFamily::CosmWasm => from_cosmwasm(confirmed)?,
        ChainFamily::Algorand => from_algorand(confirmed, contracts)?,
        ChainFamily::Near => from_near(confirmed)?,
    };
    found.ok_or_else(|| BridgeError::SequenceNotFound {
        chain: confirmed.chain,
        tx_id: confirmed.tx_id.clone(),
    })
}

/// topic0 of the core bridge publish event
pub fn log_message_published_topic() -> [u8; 32] {
    let mut topic = [0u8; 32];
    topic.copy_from_slice(&Keccak256::digest(LOG_MESSAGE_PUBLISHED.as_bytes()));
    topic
}

/// `sequence` is the first non-indexed word; the emitter is indexed topic 1
fn from_evm(
    confirmed: &ConfirmedResult,
    contracts: &ChainContracts,
) -> Result<Option<Correlation>, BridgeError> {
    let core = contracts.core_bridge_bytes()?;
    let topic0 = log_message_published_topic();
    for log in &confirmed.logs {
        let LogRecord::Evm {
            address,
            topics,
            data,
        } = log
        else {
            continue;
        };
        if *address != core || topics.len() < 2 || topics[0] != topic0 || data.len() < 32 {
            continue;
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&data[24..32]);
        return Ok(Some(Correlation {
            sequence: u64::from_be_bytes(word),
            emitter: Address32(topics[1]),
        }));
    }
    Ok(None)
}

fn from_text<T>(confirmed: &ConfirmedResult, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    confirmed.logs.iter().find_map(|log| match log {
        LogRecord::Text(line) => parse(line),
        _ => None,
    })
}

fn parse_solana_line(line: &str) -> Option<u64> {
    let idx = line.find(SOLANA_SEQUENCE_PREFIX)?;
    line[idx + SOLANA_SEQUENCE_PREFIX.len()..].trim().parse().ok()
}

fn from_cosmwasm(confirmed: &ConfirmedResult) -> Result<Option<Correlation>, BridgeError> {
    let attr = |name: &str| {
        confirmed.logs.iter().find_map(|log| match log {
            LogRecord::Attribute { key, value } if key == name => Some(value.as_str()),
            _ => None,
        })
    };
    let Some(sequence) = attr("message.sequence").and_then(|v| v.parse::<u64>().ok()) else {
        return Ok(None);
    };
    let Some(sender) = attr("message.sender") else {
        return Ok(None);
    };
    let emitter = Address32::from_hex(sender)?;
    Ok(Some(Correlation { sequence, emitter }))
}

fn from_algorand(
    confirmed: &ConfirmedResult,
    contracts: &ChainContracts,
) -> Result<Option<Correlation>, BridgeError> {
    let core_app_id = contracts.core_app_id()?;
    let sequence = confirmed.logs.iter().find_map(|log| match log {
        LogRecord::Binary { app_id, data } if *app_id == core_app_id && data.len() == 8 => {
            let mut word = [0u8; 8];
            word.copy_from_slice(data);
            Some(u64::from_be_bytes(word))
        }
        _ => None,
    });
    match sequence {
        Some(sequence) => Ok(Some(Correlation {
            sequence,
            emitter: contracts.emitter()?,
        })),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
struct NearEvent {
    standard: String,
    event: String,
    #[serde(default)]
    seq: Option<u64>,
    #[serde(default)]
    emitter: Option<String>,
}

fn from_near(confirmed: &ConfirmedResult) -> Result<Option<Correlation>, BridgeError> {
    let event = from_text(confirmed, |line| {
        let json = line.strip_prefix(NEAR_EVENT_PREFIX)?;
        let event: NearEvent = serde_json::from_str(json.trim()).ok()?;
        (event.standard == "wormhole" && event.event == "publish").then_some(event)
    });
    let Some(event) = event else {
        return Ok(None);
    };
    match (event.seq, event.emitter) {
        (Some(sequence), Some(emitter)) => Ok(Some(Correlation {
            sequence,
            emitter: Address32::from_hex(&emitter)?,
        })),
        _ => Ok(None),
    }
}
