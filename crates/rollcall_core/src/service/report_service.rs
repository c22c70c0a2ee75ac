//! Attendance reports and dashboard counters.
//!
//! # Responsibility
//! - Aggregate persisted attendance into per-participant and per-session
//!   figures for one context.
//!
//! # Invariants
//! - Reports are read-only.
//! - Percentages are rounded to a whole percent and only exist when the
//!   participant has at least one record.

use crate::model::context::Context;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::session::Session;
use crate::repo::attendance_repo::AttendanceStore;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::session_repo::SessionRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Report thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Participants strictly below this percentage are listed as low attendance.
    pub low_attendance_percent: u8,
    /// How many sessions `recent_sessions` returns.
    pub recent_sessions: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            low_attendance_percent: 50,
            recent_sessions: 10,
        }
    }
}

/// Attendance history of one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantReport {
    pub participant: Participant,
    pub presences: u32,
    pub absences: u32,
    pub percentage: Option<u32>,
}

/// Participants recorded absent at the latest session with records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenceReport {
    pub session: Session,
    pub absent: Vec<Participant>,
}

/// Counts of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session: Session,
    pub present: usize,
    pub absent: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub context: Context,
    pub total_participants: usize,
    pub total_sessions: usize,
    pub last_session_date: Option<NaiveDate>,
}

/// Read-only report facade for one context.
pub struct ReportService<P, S, A> {
    participants: P,
    sessions: S,
    store: A,
    settings: ReportSettings,
}

impl<P, S, A> ReportService<P, S, A>
where
    P: ParticipantRepository,
    S: SessionRepository,
    A: AttendanceStore,
{
    pub fn new(participants: P, sessions: S, store: A, settings: ReportSettings) -> Self {
        Self {
            participants,
            sessions,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Per-participant totals over every session, roster order. Participants
    /// without any record are left out.
    pub fn participant_stats(&self) -> RepoResult<Vec<ParticipantReport>> {
        let mut counts: HashMap<ParticipantId, (u32, u32)> = HashMap::new();
        for session in self.sessions.list_sessions()? {
            for (participant_id, present) in self.store.get_attendance(session.id())?.iter() {
                let entry = counts.entry(participant_id).or_default();
                if present {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
            }
        }

        Ok(self
            .participants
            .list_participants()?
            .into_iter()
            .filter_map(|participant| {
                let (presences, absences) = counts.get(&participant.id()).copied()?;
                Some(ParticipantReport {
                    percentage: rounded_percentage(presences, absences),
                    participant,
                    presences,
                    absences,
                })
            })
            .collect())
    }

    /// Absentees of the most recent session that has any record.
    ///
    /// Newer sessions whose attendance was never taken are skipped rather
    /// than reported with an empty list, so a lesson created ahead of time
    /// does not hide last week's absentees.
    pub fn absent_last_session(&self) -> RepoResult<Option<AbsenceReport>> {
        for session in self.sessions.list_sessions()? {
            let marks = self.store.get_attendance(session.id())?;
            if marks.is_empty() {
                continue;
            }
            let absent = self
                .participants
                .list_participants()?
                .into_iter()
                .filter(|participant| marks.get(participant.id()) == Some(false))
                .collect();
            return Ok(Some(AbsenceReport { session, absent }));
        }
        Ok(None)
    }

    /// Participants whose percentage is below the configured threshold.
    pub fn low_attendance(&self) -> RepoResult<Vec<ParticipantReport>> {
        let threshold = u32::from(self.settings.low_attendance_percent);
        Ok(self
            .participant_stats()?
            .into_iter()
            .filter(|report| report.percentage.is_some_and(|pct| pct < threshold))
            .collect())
    }

    /// Latest sessions, newest first, with their recorded counts.
    pub fn recent_sessions(&self) -> RepoResult<Vec<SessionReport>> {
        let limit = usize::try_from(self.settings.recent_sessions).unwrap_or(usize::MAX);
        self.sessions
            .list_sessions()?
            .into_iter()
            .take(limit)
            .map(|session| -> RepoResult<SessionReport> {
                let marks = self.store.get_attendance(session.id())?;
                let present = marks.present_count();
                let absent = marks.absent_count();
                Ok(SessionReport {
                    session,
                    present,
                    absent,
                    total: present + absent,
                })
            })
            .collect()
    }

    pub fn dashboard(&self) -> RepoResult<DashboardStats> {
        let sessions = self.sessions.list_sessions()?;
        Ok(DashboardStats {
            context: self.participants.context(),
            total_participants: self.participants.list_participants()?.len(),
            total_sessions: sessions.len(),
            last_session_date: sessions.first().map(Session::date),
        })
    }
}

fn rounded_percentage(presences: u32, absences: u32) -> Option<u32> {
    let total = presences + absences;
    if total == 0 {
        return None;
    }
    Some((f64::from(presences) * 100.0 / f64::from(total)).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::rounded_percentage;

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(rounded_percentage(1, 2), Some(33));
        assert_eq!(rounded_percentage(2, 1), Some(67));
        assert_eq!(rounded_percentage(1, 1), Some(50));
        assert_eq!(rounded_percentage(1, 7), Some(13));
    }

    #[test]
    fn percentage_is_none_without_records() {
        assert_eq!(rounded_percentage(0, 0), None);
    }
}
