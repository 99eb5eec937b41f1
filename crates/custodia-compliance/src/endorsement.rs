use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use custodia_ledger::CustodyEvent;
use custodia_policy::PolicyTable;
use custodia_types::{ActionType, OrgId, TxId};

/// Derived endorsement state of a ledger event. Starts `Pending` and moves
/// to `Final` once enough distinct organizations have attested; it never
/// moves back, because endorsements are themselves append-only events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndorsementState {
    Pending,
    Final,
}

impl EndorsementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Final => "FINAL",
        }
    }
}

impl fmt::Display for EndorsementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endorsement progress for one event: which organizations have attested
/// so far, and how many the policy requires for its action type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementStatus {
    pub status: EndorsementState,
    pub unique_orgs: BTreeSet<OrgId>,
    pub required: u32,
}

impl EndorsementStatus {
    pub fn is_final(&self) -> bool {
        self.status == EndorsementState::Final
    }
}

/// A ledger event paired with its derived endorsement status, as returned
/// by timeline reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub event: CustodyEvent,
    pub endorsement: EndorsementStatus,
}

/// Endorsing organizations grouped by target, built once per log snapshot.
///
/// Status is always recomputed from this index plus the event itself; it is
/// never stored, so it cannot drift from the ledger.
pub struct EndorsementIndex {
    orgs_by_target: HashMap<TxId, BTreeSet<OrgId>>,
}

impl EndorsementIndex {
    pub fn build(events: &[CustodyEvent]) -> Self {
        let mut orgs_by_target: HashMap<TxId, BTreeSet<OrgId>> = HashMap::new();
        for event in events {
            if event.action != ActionType::Endorse {
                continue;
            }
            if let Some(target) = event.target_tx_id {
                orgs_by_target
                    .entry(target)
                    .or_default()
                    .insert(event.actor.org.clone());
            }
        }
        Self { orgs_by_target }
    }

    /// Derive the endorsement status of one event.
    ///
    /// ENDORSE events are attestations rather than endorsable acts; they
    /// read as `Final` backed by their own organization.
    pub fn status_of(&self, event: &CustodyEvent, policy: &PolicyTable) -> EndorsementStatus {
        if event.action == ActionType::Endorse {
            let mut unique_orgs = BTreeSet::new();
            unique_orgs.insert(event.actor.org.clone());
            return EndorsementStatus {
                status: EndorsementState::Final,
                unique_orgs,
                required: policy.required_endorsing_orgs(ActionType::Endorse),
            };
        }

        let mut unique_orgs = self
            .orgs_by_target
            .get(&event.tx_id)
            .cloned()
            .unwrap_or_default();
        if event.self_endorsed {
            unique_orgs.insert(event.actor.org.clone());
        }

        let required = policy.required_endorsing_orgs(event.action);
        let status = if unique_orgs.len() as u32 >= required {
            EndorsementState::Final
        } else {
            EndorsementState::Pending
        };

        EndorsementStatus {
            status,
            unique_orgs,
            required,
        }
    }

    /// Pair each event with its derived status, preserving order.
    pub fn annotate(
        &self,
        events: Vec<CustodyEvent>,
        policy: &PolicyTable,
    ) -> Vec<TimelineEntry> {
        events
            .into_iter()
            .map(|event| TimelineEntry {
                endorsement: self.status_of(&event, policy),
                event,
            })
            .collect()
    }
}
