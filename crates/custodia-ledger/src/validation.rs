use serde::{Deserialize, Serialize};

use custodia_crypto::ContentHasher;
use custodia_types::RecordHash;

use crate::records::CustodyEvent;

/// Result of a full chain walk. `first_invalid_index` and `reason` are set
/// only when `valid` is false; the walk is fail-fast, so they describe the
/// earliest broken record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub event_count: u64,
    pub first_invalid_index: Option<u64>,
    pub reason: Option<String>,
}

/// Recomputes every record against the stored chain.
///
/// Three checks per event, in order: the record hash over the stable
/// fields, the `prev_hash` link to the predecessor's stored hash, and the
/// signature over the stored record hash. Pure over a snapshot, so two
/// walks over the same log always produce the same report.
pub struct ChainValidator;

impl ChainValidator {
    pub fn validate(events: &[CustodyEvent]) -> ValidationReport {
        for (index, event) in events.iter().enumerate() {
            if let Some(reason) = Self::check_event(events, index, event) {
                return ValidationReport {
                    valid: false,
                    event_count: events.len() as u64,
                    first_invalid_index: Some(index as u64),
                    reason: Some(reason),
                };
            }
        }

        ValidationReport {
            valid: true,
            event_count: events.len() as u64,
            first_invalid_index: None,
            reason: None,
        }
    }

    fn check_event(events: &[CustodyEvent], index: usize, event: &CustodyEvent) -> Option<String> {
        let recomputed = match ContentHasher::EVENT.hash_json(&event.preimage()) {
            Ok(hash) => hash,
            Err(e) => return Some(format!("canonical encoding failed: {e}")),
        };
        if recomputed != event.record_hash {
            return Some("record hash mismatch".into());
        }

        let expected_prev = if index == 0 {
            RecordHash::GENESIS
        } else {
            events[index - 1].record_hash
        };
        if event.prev_hash != expected_prev {
            return Some("previous hash link mismatch".into());
        }

        if !event
            .signer_pubkey
            .verify(event.record_hash.as_bytes(), &event.signature)
        {
            return Some("signature verification failed".into());
        }

        None
    }
}
