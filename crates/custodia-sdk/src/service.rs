use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use custodia_compliance::{CaseAudit, CaseAuditor, EndorsementIndex, TimelineEntry};
use custodia_crypto::{sha256_digest, ActorKeyring, EventSigner, EvidenceCipher, VerifyingKey};
use custodia_ledger::{
    CandidateEvent, CustodyEvent, CustodyLedger, EventDetails, EventJournal, LedgerError,
    LedgerReader, LedgerWriter,
};
use custodia_policy::{IdentityDirectory, PolicyTable};
use custodia_store::{EvidenceCatalog, InMemoryCatalog, InMemoryPayloadStore, PayloadStore};
use custodia_types::{ActionType, Actor, ActorId, CaseId, Evidence, EvidenceId, TxId};

use crate::error::{ServiceError, ServiceResult};
use crate::request::{
    ChainHealth, EndorsementReceipt, EventReceipt, EventRequest, IntakeReceipt, IntakeRequest,
    VerificationReport,
};

/// Purpose recorded on the ACCESS event an integrity verification appends.
const VERIFY_PURPOSE: &str = "integrity_verification";

/// High-level chain-of-custody service.
///
/// One facade over identity resolution, policy checks, payload encryption
/// and storage, the signed hash-chained ledger, and the derived compliance
/// views. Every exposed operation either completes fully or leaves the
/// ledger untouched.
pub struct Custodia {
    directory: IdentityDirectory,
    policy: PolicyTable,
    signer: Arc<dyn EventSigner>,
    cipher: EvidenceCipher,
    catalog: Arc<dyn EvidenceCatalog>,
    payloads: Arc<dyn PayloadStore>,
    ledger: CustodyLedger,
}

impl Custodia {
    /// Fully in-memory service with a fresh random storage key, for tests
    /// and embedding.
    pub fn in_memory() -> Self {
        let signer: Arc<dyn EventSigner> = Arc::new(ActorKeyring::new());
        let (cipher, _key) = EvidenceCipher::generate();
        let ledger = CustodyLedger::new(Arc::clone(&signer));
        Self {
            directory: IdentityDirectory::new(),
            policy: PolicyTable::standard(),
            signer,
            cipher,
            catalog: Arc::new(InMemoryCatalog::new()),
            payloads: Arc::new(InMemoryPayloadStore::new()),
            ledger,
        }
    }

    /// Service over caller-chosen backends. A journal adds write-through
    /// persistence; opening replays it into memory first.
    pub fn open(
        signer: Arc<dyn EventSigner>,
        cipher: EvidenceCipher,
        catalog: Arc<dyn EvidenceCatalog>,
        payloads: Arc<dyn PayloadStore>,
        journal: Option<EventJournal>,
    ) -> ServiceResult<Self> {
        let ledger = match journal {
            Some(journal) => CustodyLedger::with_journal(Arc::clone(&signer), journal)?,
            None => CustodyLedger::new(Arc::clone(&signer)),
        };
        Ok(Self {
            directory: IdentityDirectory::new(),
            policy: PolicyTable::standard(),
            signer,
            cipher,
            catalog,
            payloads,
            ledger,
        })
    }

    /// Replace the standard policy table.
    pub fn with_policy(mut self, policy: PolicyTable) -> Self {
        self.policy = policy;
        self
    }

    // ---- Identity operations ----

    /// Register an actor in the directory and make sure it can sign.
    ///
    /// Returns the actor's public key. Re-registering replaces the
    /// directory entry but keeps the existing keypair.
    pub fn register_actor(&self, actor: Actor) -> ServiceResult<VerifyingKey> {
        let key = self.signer.ensure_key(&actor.actor_id)?;
        self.directory.register(actor);
        Ok(key)
    }

    /// All registered actors, sorted by ID.
    pub fn actors(&self) -> Vec<Actor> {
        self.directory.actors()
    }

    /// Public signing key of a registered actor.
    pub fn actor_key(&self, actor_id: &ActorId) -> ServiceResult<VerifyingKey> {
        self.directory.resolve(actor_id)?;
        Ok(self.signer.verifying_key(actor_id)?)
    }

    // ---- Custody operations ----

    /// Register new evidence: encrypt and store the payload, catalog the
    /// metadata, and append the self-endorsed INTAKE event.
    ///
    /// The canonical SHA-256 is computed here, over the original plaintext
    /// bytes, exactly once.
    pub fn intake(&self, request: IntakeRequest) -> ServiceResult<IntakeReceipt> {
        let actor = self.directory.resolve(&request.actor_id)?;
        self.policy.check(&actor, ActionType::Intake)?;

        let canonical_sha256 = sha256_digest(&request.bytes);
        let evidence_id = EvidenceId::new();

        let envelope = self.cipher.encrypt(&request.bytes)?;
        let location = self
            .payloads
            .put(&evidence_id, &request.file_name, &envelope)?;

        let evidence = Evidence {
            evidence_id,
            case_id: request.case_id.clone(),
            description: request.description.clone(),
            source_device: request.source_device.clone(),
            acquisition_method: request.effective_acquisition_method().to_string(),
            file_name: request.file_name.clone(),
            canonical_sha256,
            created_at: Utc::now(),
        };
        self.catalog.insert(evidence, location.clone())?;

        let event = self.ledger.append(
            CandidateEvent::new(
                evidence_id,
                ActionType::Intake,
                actor,
                EventDetails::Intake {
                    case_id: request.case_id.clone(),
                    file_name: request.file_name.clone(),
                },
            )
            .with_presented_sha256(canonical_sha256)
            .self_endorsed(),
        )?;

        debug!(evidence = %evidence_id, case = %request.case_id, "evidence registered");
        Ok(IntakeReceipt {
            evidence_id,
            case_id: request.case_id,
            canonical_sha256,
            location,
            tx_id: event.tx_id,
            recorded_at: event.recorded_at,
        })
    }

    /// Record a custody event against cataloged evidence.
    ///
    /// INTAKE and ENDORSE are recorded through [`Custodia::intake`] and
    /// [`Custodia::record_endorsement`] and rejected here.
    pub fn record_event(&self, request: EventRequest) -> ServiceResult<EventReceipt> {
        match request.action {
            ActionType::Intake => {
                return Err(ServiceError::InvalidOperation(
                    "INTAKE events are appended by the intake operation".into(),
                ))
            }
            ActionType::Endorse => {
                return Err(ServiceError::InvalidOperation(
                    "ENDORSE events are appended by the endorsement operation".into(),
                ))
            }
            _ => {}
        }

        let actor = self.directory.resolve(&request.actor_id)?;
        self.policy.check(&actor, request.action)?;
        self.require_evidence(&request.evidence_id)?;

        let mut candidate =
            CandidateEvent::new(request.evidence_id, request.action, actor, request.details);
        candidate.presented_sha256 = request.presented_sha256;
        candidate.self_endorsed = request.self_endorse;

        let event = self.ledger.append(candidate)?;
        self.receipt_for(event)
    }

    /// Endorse an earlier event on behalf of the actor's organization.
    pub fn record_endorsement(
        &self,
        actor_id: &ActorId,
        evidence_id: EvidenceId,
        target_tx_id: TxId,
    ) -> ServiceResult<EndorsementReceipt> {
        let actor = self.directory.resolve(actor_id)?;
        self.policy.check(&actor, ActionType::Endorse)?;
        self.require_evidence(&evidence_id)?;

        let event = self
            .ledger
            .append(CandidateEvent::endorsement(evidence_id, actor, target_tx_id))?;

        let events = self.ledger.events()?;
        let target = events
            .iter()
            .find(|e| e.tx_id == target_tx_id)
            .ok_or(ServiceError::Ledger(LedgerError::TargetNotFound(
                target_tx_id,
            )))?;
        let target_endorsement = EndorsementIndex::build(&events).status_of(target, &self.policy);

        Ok(EndorsementReceipt {
            tx_id: event.tx_id,
            target_tx_id,
            target_endorsement,
        })
    }

    /// Re-derive the evidence digest from stored bytes and record the
    /// check as a self-endorsed ACCESS event.
    ///
    /// A digest mismatch is a recorded outcome, not an error; only
    /// missing evidence, unreadable storage, or a failed decryption
    /// aborts before the append.
    pub fn verify_integrity(
        &self,
        actor_id: &ActorId,
        evidence_id: EvidenceId,
    ) -> ServiceResult<VerificationReport> {
        let actor = self.directory.resolve(actor_id)?;
        self.policy.check(&actor, ActionType::Access)?;
        let evidence = self.require_evidence(&evidence_id)?;

        let location = self
            .catalog
            .location(&evidence_id)?
            .ok_or(ServiceError::EvidenceNotFound(evidence_id))?;
        let stored = self.payloads.get(&location)?;
        let plaintext = self.cipher.decrypt(&stored)?;

        let actual_sha256 = sha256_digest(&plaintext);
        let integrity_ok = actual_sha256 == evidence.canonical_sha256;
        if !integrity_ok {
            warn!(evidence = %evidence_id, "integrity verification failed");
        }

        let event = self.ledger.append(
            CandidateEvent::new(
                evidence_id,
                ActionType::Access,
                actor,
                EventDetails::Access {
                    purpose: VERIFY_PURPOSE.into(),
                },
            )
            .with_presented_sha256(actual_sha256)
            .self_endorsed(),
        )?;

        Ok(VerificationReport {
            evidence_id,
            integrity_ok,
            expected_sha256: evidence.canonical_sha256,
            actual_sha256,
            tx_id: event.tx_id,
        })
    }

    // ---- Views ----

    /// Cataloged metadata for one evidence item.
    pub fn evidence(&self, evidence_id: &EvidenceId) -> ServiceResult<Evidence> {
        self.require_evidence(evidence_id)
    }

    /// Ordered event history for one evidence item, each event paired
    /// with its derived endorsement status.
    pub fn timeline(&self, evidence_id: &EvidenceId) -> ServiceResult<Vec<TimelineEntry>> {
        self.require_evidence(evidence_id)?;
        let events = self.ledger.read_timeline(evidence_id)?;
        let index = EndorsementIndex::build(&events);
        Ok(index.annotate(events, &self.policy))
    }

    /// Aggregate compliance report over every evidence item in a case.
    pub fn case_audit(&self, case_id: &CaseId) -> ServiceResult<CaseAudit> {
        let items = self.catalog.list_by_case(case_id)?;
        if items.is_empty() {
            return Err(ServiceError::CaseNotFound(case_id.clone()));
        }
        Ok(CaseAuditor::audit(
            &self.ledger,
            case_id,
            &items,
            &self.policy,
        )?)
    }

    /// Full chain validation plus catalog size.
    pub fn chain_health(&self) -> ServiceResult<ChainHealth> {
        let chain = self.ledger.validate_chain()?;
        let evidence_count = self.catalog.count()? as u64;
        Ok(ChainHealth {
            chain,
            evidence_count,
        })
    }

    // ---- Accessors ----

    pub fn ledger(&self) -> &CustodyLedger {
        &self.ledger
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// SHA-256 fingerprint of the storage key (hex), for operational
    /// display. Never the key itself.
    pub fn key_fingerprint(&self) -> &str {
        self.cipher.key_fingerprint()
    }

    pub fn event_count(&self) -> ServiceResult<u64> {
        Ok(self.ledger.event_count()?)
    }

    fn require_evidence(&self, evidence_id: &EvidenceId) -> ServiceResult<Evidence> {
        self.catalog
            .get(evidence_id)?
            .ok_or(ServiceError::EvidenceNotFound(*evidence_id))
    }

    /// Build an event receipt with the endorsement status the event has
    /// in the current log.
    fn receipt_for(&self, event: CustodyEvent) -> ServiceResult<EventReceipt> {
        let events = self.ledger.events()?;
        let endorsement = EndorsementIndex::build(&events).status_of(&event, &self.policy);
        Ok(EventReceipt {
            tx_id: event.tx_id,
            evidence_id: event.evidence_id,
            action: event.action,
            recorded_at: event.recorded_at,
            endorsement,
        })
    }
}

impl std::fmt::Debug for Custodia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Custodia")
            .field("actors", &self.directory.len())
            .field("cipher", &self.cipher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use custodia_compliance::ComplianceStatus;
    use custodia_crypto::{DirKeyring, ENVELOPE_MARKER};
    use custodia_ledger::JournalConfig;
    use custodia_policy::PolicyError;
    use custodia_store::{FsCatalog, FsPayloadStore};
    use custodia_types::{OrgId, Role};

    const ABC_SHA256: &str = "b5d4045c3f466fa91fe2cc6abe79232a1a57cdf104f7a26e716e0a1e2789df78";

    fn roster(svc: &Custodia) {
        for (id, role, org) in [
            ("officer1", Role::Officer, "KPS"),
            ("analyst1", Role::Analyst, "FORENSIC_LAB"),
            ("supervisor1", Role::Supervisor, "KPS"),
            ("judge1", Role::Judge, "JUDICIARY"),
            ("auditor1", Role::Auditor, "INTERNAL_AUDIT"),
        ] {
            svc.register_actor(Actor::new(ActorId::new(id), role, OrgId::new(org)))
                .unwrap();
        }
    }

    fn service() -> Custodia {
        let svc = Custodia::in_memory();
        roster(&svc);
        svc
    }

    /// Service whose payload store the test keeps a handle to, for
    /// simulating storage tampering.
    fn service_with_store() -> (Custodia, Arc<InMemoryPayloadStore>) {
        let signer: Arc<dyn EventSigner> = Arc::new(ActorKeyring::new());
        let payloads = Arc::new(InMemoryPayloadStore::new());
        let svc = Custodia::open(
            signer,
            EvidenceCipher::new(&[0x42; 32]),
            Arc::new(InMemoryCatalog::new()),
            payloads.clone(),
            None,
        )
        .unwrap();
        roster(&svc);
        (svc, payloads)
    }

    fn intake_abc(svc: &Custodia) -> IntakeReceipt {
        svc.intake(IntakeRequest::new(
            ActorId::new("officer1"),
            CaseId::new("CASE-2024-001"),
            "seized usb stick",
            "usb.img",
            b"ABC".to_vec(),
        ))
        .unwrap()
    }

    fn transfer_request(evidence_id: EvidenceId) -> EventRequest {
        EventRequest::new(
            ActorId::new("officer1"),
            evidence_id,
            ActionType::Transfer,
            EventDetails::Transfer {
                from_org: OrgId::new("KPS"),
                to_org: OrgId::new("FORENSIC_LAB"),
            },
        )
        .self_endorsed()
    }

    // ---- construction and identity ----

    #[test]
    fn in_memory_service_starts_empty() {
        let svc = Custodia::in_memory();
        assert_eq!(svc.event_count().unwrap(), 0);
        assert!(svc.actors().is_empty());

        let health = svc.chain_health().unwrap();
        assert!(health.chain.valid);
        assert_eq!(health.chain.event_count, 0);
        assert_eq!(health.evidence_count, 0);
    }

    #[test]
    fn reregistering_keeps_the_signing_key() {
        let svc = Custodia::in_memory();
        let vk1 = svc
            .register_actor(Actor::new(
                ActorId::new("officer1"),
                Role::Officer,
                OrgId::new("KPS"),
            ))
            .unwrap();
        let vk2 = svc
            .register_actor(Actor::new(
                ActorId::new("officer1"),
                Role::Supervisor,
                OrgId::new("KPS"),
            ))
            .unwrap();

        assert_eq!(vk1, vk2);
        assert_eq!(svc.actors().len(), 1);
        assert_eq!(svc.actors()[0].role, Role::Supervisor);
    }

    #[test]
    fn actor_key_requires_a_registered_actor() {
        let svc = service();
        let key = svc.actor_key(&ActorId::new("officer1")).unwrap();
        assert_eq!(key.to_hex().len(), 64);

        assert!(matches!(
            svc.actor_key(&ActorId::new("ghost")),
            Err(ServiceError::Policy(PolicyError::UnknownIdentity(_)))
        ));
    }

    // ---- intake ----

    #[test]
    fn intake_computes_known_digest() {
        let svc = service();
        let receipt = intake_abc(&svc);

        assert_eq!(receipt.canonical_sha256.to_hex(), ABC_SHA256);
        assert_eq!(receipt.case_id, CaseId::new("CASE-2024-001"));
        assert_eq!(svc.event_count().unwrap(), 1);
        assert_eq!(svc.chain_health().unwrap().evidence_count, 1);
    }

    #[test]
    fn intake_event_is_self_endorsed_and_final() {
        let svc = service();
        let receipt = intake_abc(&svc);

        let timeline = svc.timeline(&receipt.evidence_id).unwrap();
        assert_eq!(timeline.len(), 1);
        let entry = &timeline[0];
        assert_eq!(entry.event.action, ActionType::Intake);
        assert_eq!(entry.event.presented_sha256, Some(receipt.canonical_sha256));
        assert!(entry.event.self_endorsed);
        assert!(entry.event.prev_hash.is_genesis());
        assert_eq!(
            entry.event.details,
            EventDetails::Intake {
                case_id: CaseId::new("CASE-2024-001"),
                file_name: "usb.img".into(),
            }
        );
        assert!(entry.endorsement.is_final());
        assert_eq!(entry.endorsement.required, 1);
    }

    #[test]
    fn intake_rejects_unknown_identity() {
        let svc = service();
        let err = svc
            .intake(IntakeRequest::new(
                ActorId::new("ghost"),
                CaseId::new("CASE-1"),
                "item",
                "a.bin",
                b"x".to_vec(),
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::UnknownIdentity(_))
        ));
        assert_eq!(svc.event_count().unwrap(), 0);
    }

    #[test]
    fn intake_denied_by_policy_leaves_no_trace() {
        let svc = service();
        let err = svc
            .intake(IntakeRequest::new(
                ActorId::new("analyst1"),
                CaseId::new("CASE-1"),
                "item",
                "a.bin",
                b"x".to_vec(),
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::RoleNotAuthorized { .. })
        ));
        assert_eq!(svc.event_count().unwrap(), 0);
        assert_eq!(svc.chain_health().unwrap().evidence_count, 0);
    }

    #[test]
    fn payloads_are_stored_encrypted() {
        let (svc, payloads) = service_with_store();
        let receipt = intake_abc(&svc);

        let stored = payloads.get(&receipt.location).unwrap();
        assert!(EvidenceCipher::is_encrypted(&stored));
        assert_ne!(stored, b"ABC");
    }

    // ---- custody events and endorsements ----

    #[test]
    fn transfer_needs_a_second_organization() {
        let svc = service();
        let receipt = intake_abc(&svc);

        let transfer = svc.record_event(transfer_request(receipt.evidence_id)).unwrap();
        assert_eq!(transfer.action, ActionType::Transfer);
        assert!(!transfer.endorsement.is_final());
        assert_eq!(transfer.endorsement.required, 2);
        assert_eq!(
            transfer.endorsement.unique_orgs,
            BTreeSet::from([OrgId::new("KPS")])
        );
    }

    #[test]
    fn second_org_endorsement_finalizes_transfer() {
        let svc = service();
        let receipt = intake_abc(&svc);
        let transfer = svc.record_event(transfer_request(receipt.evidence_id)).unwrap();

        let endorsement = svc
            .record_endorsement(&ActorId::new("analyst1"), receipt.evidence_id, transfer.tx_id)
            .unwrap();

        assert_ne!(endorsement.tx_id, transfer.tx_id);
        assert_eq!(endorsement.target_tx_id, transfer.tx_id);
        assert!(endorsement.target_endorsement.is_final());
        assert_eq!(
            endorsement.target_endorsement.unique_orgs,
            BTreeSet::from([OrgId::new("KPS"), OrgId::new("FORENSIC_LAB")])
        );
    }

    #[test]
    fn duplicate_endorsement_is_rejected() {
        let svc = service();
        let receipt = intake_abc(&svc);
        let transfer = svc.record_event(transfer_request(receipt.evidence_id)).unwrap();
        svc.record_endorsement(&ActorId::new("analyst1"), receipt.evidence_id, transfer.tx_id)
            .unwrap();
        let count = svc.event_count().unwrap();

        let err = svc
            .record_endorsement(&ActorId::new("analyst1"), receipt.evidence_id, transfer.tx_id)
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::DuplicateEndorsement { .. })
        ));
        assert_eq!(svc.event_count().unwrap(), count);

        // The target stays FINAL.
        let timeline = svc.timeline(&receipt.evidence_id).unwrap();
        assert!(timeline[1].endorsement.is_final());
    }

    #[test]
    fn endorsing_a_missing_target_fails() {
        let svc = service();
        let receipt = intake_abc(&svc);

        let err = svc
            .record_endorsement(&ActorId::new("analyst1"), receipt.evidence_id, TxId::new())
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Ledger(LedgerError::TargetNotFound(_))
        ));
        assert_eq!(svc.event_count().unwrap(), 1);
    }

    #[test]
    fn record_event_rejects_reserved_actions() {
        let svc = service();
        let receipt = intake_abc(&svc);

        for action in [ActionType::Intake, ActionType::Endorse] {
            let err = svc
                .record_event(EventRequest::new(
                    ActorId::new("supervisor1"),
                    receipt.evidence_id,
                    action,
                    EventDetails::note(Default::default()),
                ))
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidOperation(_)));
        }
        assert_eq!(svc.event_count().unwrap(), 1);
    }

    #[test]
    fn record_event_requires_cataloged_evidence() {
        let svc = service();
        let err = svc
            .record_event(transfer_request(EvidenceId::new()))
            .unwrap_err();

        assert!(matches!(err, ServiceError::EvidenceNotFound(_)));
        assert_eq!(svc.event_count().unwrap(), 0);
    }

    #[test]
    fn court_submission_denied_for_judge_leaves_ledger_unchanged() {
        let svc = service();
        let receipt = intake_abc(&svc);

        let err = svc
            .record_event(EventRequest::new(
                ActorId::new("judge1"),
                receipt.evidence_id,
                ActionType::CourtSubmission,
                EventDetails::note(Default::default()),
            ))
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Policy(PolicyError::RoleNotAuthorized {
                role: Role::Judge,
                action: ActionType::CourtSubmission,
            })
        ));
        assert_eq!(svc.event_count().unwrap(), 1);
    }

    // ---- verification ----

    #[test]
    fn verify_integrity_passes_for_untouched_payload() {
        let svc = service();
        let receipt = intake_abc(&svc);

        let report = svc
            .verify_integrity(&ActorId::new("auditor1"), receipt.evidence_id)
            .unwrap();

        assert!(report.integrity_ok);
        assert_eq!(report.expected_sha256, receipt.canonical_sha256);
        assert_eq!(report.actual_sha256, receipt.canonical_sha256);
        assert_eq!(svc.event_count().unwrap(), 2);

        let timeline = svc.timeline(&receipt.evidence_id).unwrap();
        let access = &timeline[1];
        assert_eq!(access.event.action, ActionType::Access);
        assert_eq!(
            access.event.details,
            EventDetails::Access {
                purpose: "integrity_verification".into(),
            }
        );
        assert!(access.event.self_endorsed);
        assert!(access.endorsement.is_final());
    }

    #[test]
    fn verify_integrity_flags_swapped_payload() {
        let (svc, payloads) = service_with_store();
        let receipt = intake_abc(&svc);
        // Unmarked bytes read back as legacy plaintext, so the check sees
        // the swapped content rather than a decryption failure.
        payloads
            .overwrite(&receipt.location, b"tampered".to_vec())
            .unwrap();

        let report = svc
            .verify_integrity(&ActorId::new("auditor1"), receipt.evidence_id)
            .unwrap();

        assert!(!report.integrity_ok);
        assert_eq!(report.expected_sha256, receipt.canonical_sha256);
        assert_ne!(report.actual_sha256, report.expected_sha256);
        assert_eq!(svc.event_count().unwrap(), 2);

        let audit = svc.case_audit(&CaseId::new("CASE-2024-001")).unwrap();
        let row = &audit.evidence_audits[0];
        assert_eq!(row.integrity_failures, 1);
        assert_eq!(row.last_integrity_ok, Some(false));
        assert_eq!(row.compliance, ComplianceStatus::AttentionRequired);
    }

    #[test]
    fn corrupted_envelope_is_an_error_not_a_verdict() {
        let (svc, payloads) = service_with_store();
        let receipt = intake_abc(&svc);

        let mut garbage = ENVELOPE_MARKER.to_vec();
        garbage.extend_from_slice(&[0u8; 40]);
        payloads.overwrite(&receipt.location, garbage).unwrap();

        let err = svc
            .verify_integrity(&ActorId::new("auditor1"), receipt.evidence_id)
            .unwrap_err();

        assert!(matches!(err, ServiceError::Cipher(_)));
        // No ACCESS event for a check that never produced a digest.
        assert_eq!(svc.event_count().unwrap(), 1);
    }

    // ---- views ----

    #[test]
    fn timeline_requires_cataloged_evidence() {
        let svc = service();
        assert!(matches!(
            svc.timeline(&EvidenceId::new()),
            Err(ServiceError::EvidenceNotFound(_))
        ));
    }

    #[test]
    fn case_audit_requires_a_known_case() {
        let svc = service();
        assert!(matches!(
            svc.case_audit(&CaseId::new("CASE-UNKNOWN")),
            Err(ServiceError::CaseNotFound(_))
        ));
    }

    #[test]
    fn case_audit_aggregates_per_evidence_rows() {
        let svc = service();
        let first = intake_abc(&svc);
        let second = svc
            .intake(IntakeRequest::new(
                ActorId::new("officer1"),
                CaseId::new("CASE-2024-001"),
                "seized phone",
                "phone.img",
                b"DEF".to_vec(),
            ))
            .unwrap();
        svc.record_event(transfer_request(first.evidence_id)).unwrap();

        let audit = svc.case_audit(&CaseId::new("CASE-2024-001")).unwrap();
        assert_eq!(audit.evidence_count, 2);
        assert_eq!(audit.total_events, 3);
        assert_eq!(audit.pending_endorsements, 1);
        assert_eq!(audit.integrity_failures, 0);
        assert_eq!(audit.compliant_evidence_count, 1);
        assert!(audit.chain_valid);

        let rows: Vec<_> = audit
            .evidence_audits
            .iter()
            .map(|row| (row.evidence_id, row.compliance))
            .collect();
        assert!(rows.contains(&(first.evidence_id, ComplianceStatus::AttentionRequired)));
        assert!(rows.contains(&(second.evidence_id, ComplianceStatus::Compliant)));
    }

    // ---- end to end ----

    #[test]
    fn full_custody_flow_reaches_four_valid_events() {
        let svc = service();
        let receipt = intake_abc(&svc);
        assert_eq!(receipt.canonical_sha256.to_hex(), ABC_SHA256);

        let transfer = svc.record_event(transfer_request(receipt.evidence_id)).unwrap();
        assert!(!transfer.endorsement.is_final());

        let endorsement = svc
            .record_endorsement(&ActorId::new("analyst1"), receipt.evidence_id, transfer.tx_id)
            .unwrap();
        assert!(endorsement.target_endorsement.is_final());

        let verification = svc
            .verify_integrity(&ActorId::new("auditor1"), receipt.evidence_id)
            .unwrap();
        assert!(verification.integrity_ok);

        assert_eq!(svc.event_count().unwrap(), 4);
        let actions: Vec<_> = svc
            .timeline(&receipt.evidence_id)
            .unwrap()
            .iter()
            .map(|entry| entry.event.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                ActionType::Intake,
                ActionType::Transfer,
                ActionType::Endorse,
                ActionType::Access,
            ]
        );

        let first = svc.chain_health().unwrap();
        let second = svc.chain_health().unwrap();
        assert!(first.chain.valid);
        assert_eq!(first.chain.event_count, 4);
        assert_eq!(first.chain, second.chain);
    }

    #[test]
    fn durable_backends_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let open = || -> Custodia {
            let signer: Arc<dyn EventSigner> =
                Arc::new(DirKeyring::open(dir.path().join("keys")).unwrap());
            let journal = EventJournal::open(
                &dir.path().join("ledger.journal"),
                JournalConfig::default(),
            )
            .unwrap();
            let svc = Custodia::open(
                signer,
                EvidenceCipher::new(&[7; 32]),
                Arc::new(FsCatalog::open(dir.path().join("catalog")).unwrap()),
                Arc::new(FsPayloadStore::open(dir.path().join("payloads")).unwrap()),
                Some(journal),
            )
            .unwrap();
            roster(&svc);
            svc
        };

        let (evidence_id, transfer_tx) = {
            let svc = open();
            let receipt = intake_abc(&svc);
            let transfer = svc.record_event(transfer_request(receipt.evidence_id)).unwrap();
            (receipt.evidence_id, transfer.tx_id)
        };

        let svc = open();
        assert_eq!(svc.event_count().unwrap(), 2);
        assert!(svc.chain_health().unwrap().chain.valid);

        // Recovered state supports the full range of operations: endorse
        // the persisted transfer, then re-verify the stored payload.
        let endorsement = svc
            .record_endorsement(&ActorId::new("analyst1"), evidence_id, transfer_tx)
            .unwrap();
        assert!(endorsement.target_endorsement.is_final());

        let report = svc
            .verify_integrity(&ActorId::new("auditor1"), evidence_id)
            .unwrap();
        assert!(report.integrity_ok);

        let health = svc.chain_health().unwrap();
        assert!(health.chain.valid);
        assert_eq!(health.chain.event_count, 4);
        assert_eq!(health.evidence_count, 1);
    }
}
