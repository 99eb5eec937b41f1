use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::debug;

use custodia_crypto::{ContentHasher, EventSigner, SigningError};
use custodia_types::{ActionType, EvidenceId, OrgId, RecordHash, TxId};

use crate::error::LedgerError;
use crate::journal::EventJournal;
use crate::records::{CandidateEvent, CustodyEvent, EventPreimage};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{ChainValidator, ValidationReport};

/// The custody ledger: one globally ordered, append-only event log.
///
/// Appends run inside a single exclusive section so that no two events can
/// observe the same chain tail; hashing, signing, linking, and persisting
/// happen as one indivisible step. Reads clone a consistent snapshot and
/// never hold the write lock.
pub struct CustodyLedger {
    signer: Arc<dyn EventSigner>,
    journal: Option<EventJournal>,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    events: Vec<CustodyEvent>,
    tx_index: HashMap<TxId, usize>,
    by_evidence: HashMap<EvidenceId, Vec<usize>>,
    /// Organizations with an accepted ENDORSE per target, for the
    /// duplicate check inside the append section. Rebuilt on recovery;
    /// never read outside the write path.
    endorsed_orgs: HashMap<TxId, HashSet<OrgId>>,
}

impl LedgerState {
    fn index_event(&mut self, event: &CustodyEvent) {
        let index = self.events.len();
        self.tx_index.insert(event.tx_id, index);
        self.by_evidence
            .entry(event.evidence_id)
            .or_default()
            .push(index);
        if event.action == ActionType::Endorse {
            if let Some(target) = event.target_tx_id {
                self.endorsed_orgs
                    .entry(target)
                    .or_default()
                    .insert(event.actor.org.clone());
            }
        }
        self.events.push(event.clone());
    }

    /// Organizations counted toward `target`'s endorsement threshold so far.
    fn endorsing_orgs(&self, target: &CustodyEvent) -> HashSet<OrgId> {
        let mut orgs = self
            .endorsed_orgs
            .get(&target.tx_id)
            .cloned()
            .unwrap_or_default();
        if target.self_endorsed {
            orgs.insert(target.actor.org.clone());
        }
        orgs
    }
}

impl CustodyLedger {
    /// In-memory ledger with no persistence, for tests and embedding.
    pub fn new(signer: Arc<dyn EventSigner>) -> Self {
        Self {
            signer,
            journal: None,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Journal-backed ledger: replays the segment into memory, then
    /// writes through on every append.
    pub fn with_journal(
        signer: Arc<dyn EventSigner>,
        journal: EventJournal,
    ) -> Result<Self, LedgerError> {
        let recovered = journal.recover()?;
        let mut state = LedgerState::default();
        for event in &recovered {
            state.index_event(event);
        }
        if !state.events.is_empty() {
            debug!(events = state.events.len(), "ledger state rebuilt from journal");
        }

        Ok(Self {
            signer,
            journal: Some(journal),
            inner: RwLock::new(state),
        })
    }

    /// Structural and endorsement checks that must run against the same
    /// state snapshot the append will extend.
    fn check_candidate(
        state: &LedgerState,
        candidate: &CandidateEvent,
    ) -> Result<(), LedgerError> {
        match (candidate.action, candidate.target_tx_id) {
            (ActionType::Endorse, None) => Err(LedgerError::CandidateRejected(
                "ENDORSE requires a target transaction".into(),
            )),
            (ActionType::Endorse, Some(target)) => {
                let target_event = state
                    .tx_index
                    .get(&target)
                    .map(|&i| &state.events[i])
                    .ok_or(LedgerError::TargetNotFound(target))?;
                if target_event.action == ActionType::Endorse
                    || target_event.evidence_id != candidate.evidence_id
                {
                    return Err(LedgerError::TargetNotFound(target));
                }
                if state
                    .endorsing_orgs(target_event)
                    .contains(&candidate.actor.org)
                {
                    return Err(LedgerError::DuplicateEndorsement {
                        target,
                        org: candidate.actor.org.clone(),
                    });
                }
                Ok(())
            }
            (_, Some(_)) => Err(LedgerError::CandidateRejected(
                "only ENDORSE events may carry a target transaction".into(),
            )),
            (_, None) => Ok(()),
        }
    }
}

impl LedgerWriter for CustodyLedger {
    fn append(&self, candidate: CandidateEvent) -> Result<CustodyEvent, LedgerError> {
        let mut state = self.inner.write().map_err(|_| LedgerError::LockPoisoned)?;
        Self::check_candidate(&state, &candidate)?;

        let prev_hash = state
            .events
            .last()
            .map(|e| e.record_hash)
            .unwrap_or(RecordHash::GENESIS);
        let tx_id = TxId::new();
        let recorded_at = Utc::now();
        let signer_pubkey = self.signer.verifying_key(&candidate.actor.actor_id)?;

        let preimage = EventPreimage {
            tx_id: &tx_id,
            evidence_id: &candidate.evidence_id,
            action: candidate.action,
            actor: &candidate.actor,
            recorded_at: &recorded_at,
            details: &candidate.details,
            presented_sha256: &candidate.presented_sha256,
            target_tx_id: &candidate.target_tx_id,
            self_endorsed: candidate.self_endorsed,
            prev_hash: &prev_hash,
            signer_pubkey: &signer_pubkey,
        };
        let record_hash = ContentHasher::EVENT
            .hash_json(&preimage)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let (signature, signing_key) = self.signer.sign(&candidate.actor.actor_id, &record_hash)?;
        if signing_key != signer_pubkey {
            return Err(SigningError::Unavailable(
                "signer key changed while sealing the event".into(),
            )
            .into());
        }

        let event = CustodyEvent {
            tx_id,
            evidence_id: candidate.evidence_id,
            action: candidate.action,
            actor: candidate.actor,
            recorded_at,
            details: candidate.details,
            presented_sha256: candidate.presented_sha256,
            target_tx_id: candidate.target_tx_id,
            self_endorsed: candidate.self_endorsed,
            prev_hash,
            record_hash,
            signer_pubkey,
            signature,
        };

        // Persist before exposing: if the journal write fails, the
        // in-memory chain is still exactly as it was.
        if let Some(journal) = &self.journal {
            journal.append(&event)?;
        }

        state.index_event(&event);
        debug!(
            tx = %event.tx_id,
            action = %event.action,
            index = state.events.len() - 1,
            "appended custody event"
        );
        Ok(event)
    }
}

impl LedgerReader for CustodyLedger {
    fn read_timeline(&self, evidence_id: &EvidenceId) -> Result<Vec<CustodyEvent>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .by_evidence
            .get(evidence_id)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&i| state.events[i].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn events(&self) -> Result<Vec<CustodyEvent>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.events.clone())
    }

    fn get(&self, tx_id: &TxId) -> Result<Option<CustodyEvent>, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .tx_index
            .get(tx_id)
            .map(|&i| state.events[i].clone()))
    }

    fn event_count(&self) -> Result<u64, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state.events.len() as u64)
    }

    fn tail_hash(&self) -> Result<RecordHash, LedgerError> {
        let state = self.inner.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(state
            .events
            .last()
            .map(|e| e.record_hash)
            .unwrap_or(RecordHash::GENESIS))
    }

    fn validate_chain(&self) -> Result<ValidationReport, LedgerError> {
        let events = self.events()?;
        Ok(ChainValidator::validate(&events))
    }
}
