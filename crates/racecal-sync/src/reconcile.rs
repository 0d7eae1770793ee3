//! Reconciliation of desired records against existing calendar events.
//!
//! For one race type:
//! - delete every existing event whose id has no desired record,
//! - upsert every desired record.
//!
//! Events are matched on [`RaceId`] alone. Both inputs are partitioned to
//! the race type first, so a cycle for one race type can never plan a
//! delete for another's events. Deletes must be applied before upserts.

use std::collections::{HashMap, HashSet};

use racecal_core::{CalendarEvent, RaceId, RaceRecord, RaceType};
use tracing::{debug, error};

/// The actions needed to bring one race type's calendar in line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub race_type: RaceType,
    /// Existing events with no desired counterpart.
    pub to_delete: Vec<CalendarEvent>,
    /// Desired records, one per id.
    pub to_upsert: Vec<RaceRecord>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.to_delete.is_empty() && self.to_upsert.is_empty()
    }

    pub fn delete_ids(&self) -> impl Iterator<Item = &RaceId> {
        self.to_delete.iter().map(|e| &e.id)
    }
}

/// Computes the plan for `race_type`.
///
/// Records and events of other race types are ignored. When `desired` holds
/// several records with the same id, the last one wins and keeps the
/// position of the first.
pub fn reconcile(
    desired: Vec<RaceRecord>,
    existing: Vec<CalendarEvent>,
    race_type: RaceType,
) -> ReconcilePlan {
    let mut records: Vec<RaceRecord> = Vec::new();
    let mut positions: HashMap<RaceId, usize> = HashMap::new();
    for record in desired.into_iter().filter(|r| r.race_type() == race_type) {
        match positions.get(record.id()) {
            Some(&index) => {
                debug!(id = %record.id(), "Duplicate desired record, keeping the last");
                records[index] = record;
            }
            None => {
                positions.insert(record.id().clone(), records.len());
                records.push(record);
            }
        }
    }

    let mut seen = HashSet::new();
    let to_delete: Vec<CalendarEvent> = existing
        .into_iter()
        .filter(|e| e.race_type == race_type && e.id.race_type() == race_type)
        .filter(|e| !positions.contains_key(&e.id))
        .filter(|e| seen.insert(e.id.clone()))
        .collect();

    let before = records.len();
    let to_upsert: Vec<RaceRecord> = records
        .into_iter()
        .filter(|r| !seen.contains(r.id()))
        .collect();
    if to_upsert.len() != before {
        error!(
            %race_type,
            dropped = before - to_upsert.len(),
            "Desired records overlapped planned deletes"
        );
    }
    debug_assert_eq!(to_upsert.len(), before, "upsert set must be disjoint from delete set");

    debug!(
        %race_type,
        deletes = to_delete.len(),
        upserts = to_upsert.len(),
        "Reconciled"
    );
    ReconcilePlan {
        race_type,
        to_delete,
        to_upsert,
    }
}
