//! Attendance marks and reconciliation results.
//!
//! # Invariants
//! - A key present in `MarkSet` is an explicit decision; a missing key is
//!   undecided. There is no third "cleared" value.
//! - Re-marking a participant overwrites the previous decision; no history
//!   is kept.

use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-progress presence decisions for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkSet {
    marks: BTreeMap<ParticipantId, bool>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest decision for one participant.
    pub fn mark(&mut self, participant_id: ParticipantId, present: bool) {
        self.marks.insert(participant_id, present);
    }

    pub fn get(&self, participant_id: ParticipantId) -> Option<bool> {
        self.marks.get(&participant_id).copied()
    }

    pub fn is_marked(&self, participant_id: ParticipantId) -> bool {
        self.marks.contains_key(&participant_id)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParticipantId, bool)> + '_ {
        self.marks.iter().map(|(id, present)| (*id, *present))
    }

    pub fn present_count(&self) -> usize {
        self.marks.values().filter(|present| **present).count()
    }

    pub fn absent_count(&self) -> usize {
        self.marks.values().filter(|present| !**present).count()
    }
}

impl FromIterator<(ParticipantId, bool)> for MarkSet {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, bool)>>(iter: T) -> Self {
        Self {
            marks: iter.into_iter().collect(),
        }
    }
}

/// One persisted presence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub participant_id: ParticipantId,
    pub present: bool,
}

/// Completeness check for a MarkSet against the eligible roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub total: usize,
    pub marked: usize,
    pub unmarked: usize,
    /// Display names in roster order.
    pub unmarked_names: Vec<String>,
    /// True exactly when `unmarked > 0`.
    pub needs_confirmation: bool,
    pub message: String,
}

/// Counts reported after a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub total: usize,
    pub present: usize,
    /// Every stored `present=false`, explicit or defaulted.
    pub absent: usize,
    /// Absences defaulted because no mark was given.
    pub auto_absent: usize,
}

#[cfg(test)]
mod tests {
    use super::MarkSet;
    use uuid::Uuid;

    #[test]
    fn latest_mark_wins() {
        let id = Uuid::new_v4();
        let mut marks = MarkSet::new();
        marks.mark(id, true);
        marks.mark(id, false);
        assert_eq!(marks.get(id), Some(false));
        assert_eq!(marks.len(), 1);
        assert_eq!(marks.absent_count(), 1);
        assert_eq!(marks.present_count(), 0);
    }

    #[test]
    fn missing_key_is_undecided() {
        let marks = MarkSet::new();
        let id = Uuid::new_v4();
        assert_eq!(marks.get(id), None);
        assert!(!marks.is_marked(id));
        assert!(marks.is_empty());
    }
}
