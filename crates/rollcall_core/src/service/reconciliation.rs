//! Attendance reconciliation engine.
//!
//! # Responsibility
//! - Work out which eligible participants a MarkSet leaves undecided.
//! - Commit a complete snapshot for a session: explicit marks as given,
//!   every unmarked eligible participant as absent.
//!
//! # Invariants
//! - `commit_attendance` is the only code path that turns marks into
//!   attendance rows.
//! - After a successful commit the session holds exactly one record per
//!   eligible participant; "unmarked" never persists.
//! - Marks for participants outside the eligible set are ignored, and are
//!   not handed back when a session's attendance is reloaded.
//! - Verification has no side effects; the same inputs give the same result.

use crate::model::attendance::{AttendanceRecord, MarkSet, ReconciliationResult, SaveSummary};
use crate::model::context::Context;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::session::{Session, SessionId};
use crate::repo::attendance_repo::AttendanceStore;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::session_repo::SessionRepository;
use crate::repo::{RepoError, RepoResult};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Failures of the save workflow.
#[derive(Debug)]
pub enum ReconcileError {
    /// No session selected, or the id does not resolve. Raised before any
    /// write.
    InvalidSession(Option<SessionId>),
    /// Reading roster, catalog or persisted marks failed.
    Verification(RepoError),
    /// The replace operation failed; the session's attendance is unchanged.
    Persistence(RepoError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSession(None) => write!(f, "no session selected"),
            Self::InvalidSession(Some(id)) => write!(f, "session not found: {id}"),
            Self::Verification(err) => write!(f, "failed to verify attendance: {err}"),
            Self::Persistence(err) => write!(f, "failed to save attendance: {err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSession(_) => None,
            Self::Verification(err) | Self::Persistence(err) => Some(err),
        }
    }
}

impl ReconcileError {
    /// Stable code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSession(_) => "invalid_session",
            Self::Verification(_) => "verification_failed",
            Self::Persistence(_) => "persistence_failed",
        }
    }
}

/// Parameterized engine over one context's roster, catalog and store.
pub struct ReconciliationEngine<P, S, A> {
    participants: P,
    sessions: S,
    store: A,
    context: Context,
}

impl<P, S, A> ReconciliationEngine<P, S, A>
where
    P: ParticipantRepository,
    S: SessionRepository,
    A: AttendanceStore,
{
    /// Builds an engine; all three collaborators must serve the same context.
    pub fn new(participants: P, sessions: S, store: A) -> RepoResult<Self> {
        let context = participants.context();
        if sessions.context() != context || store.context() != context {
            return Err(RepoError::InvalidData(format!(
                "collaborators disagree on context: roster={} catalog={} store={}",
                context.as_str(),
                sessions.context().as_str(),
                store.context().as_str()
            )));
        }
        Ok(Self {
            participants,
            sessions,
            store,
            context,
        })
    }

    pub fn context(&self) -> Context {
        self.context
    }

    /// Participants expected at `session`.
    ///
    /// Ministry sessions scoped to a group expect only that group's members;
    /// every other session expects the full roster.
    pub fn eligible_participants(&self, session: &Session) -> RepoResult<Vec<Participant>> {
        let roster = self.participants.list_participants()?;
        match (self.context.scopes_by_group(), session.group_id()) {
            (true, Some(group_id)) => Ok(roster
                .into_iter()
                .filter(|participant| participant.group_id() == Some(group_id))
                .collect()),
            _ => Ok(roster),
        }
    }

    /// Reports which eligible participants `marks` leaves undecided.
    pub fn verify_completeness(
        &self,
        session_id: Option<SessionId>,
        marks: &MarkSet,
    ) -> Result<ReconciliationResult, ReconcileError> {
        let started_at = Instant::now();
        let session = self.resolve_session(session_id, ReconcileError::Verification)?;
        let eligible = self
            .eligible_participants(&session)
            .map_err(ReconcileError::Verification)
            .inspect_err(|err| self.log_failure("attendance_verify", session.id(), err))?;

        let result = reconcile(&eligible, marks, self.context);
        info!(
            "event=attendance_verify module=reconciliation status=ok context={} session={} total={} marked={} unmarked={} duration_ms={}",
            self.context.as_str(),
            session.id(),
            result.total,
            result.marked,
            result.unmarked,
            started_at.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Replaces the session's attendance with a complete snapshot.
    ///
    /// # Errors
    /// - `InvalidSession` before any write when the session does not resolve.
    /// - `Persistence` when reading eligibility or the replace fails; nothing
    ///   is committed in that case.
    pub fn commit_attendance(
        &self,
        session_id: Option<SessionId>,
        marks: &MarkSet,
    ) -> Result<SaveSummary, ReconcileError> {
        let started_at = Instant::now();
        let session = self.resolve_session(session_id, ReconcileError::Persistence)?;
        let eligible = self
            .eligible_participants(&session)
            .map_err(ReconcileError::Persistence)
            .inspect_err(|err| self.log_failure("attendance_commit", session.id(), err))?;

        let (records, summary) = build_snapshot(&eligible, marks);
        self.store
            .replace_attendance(session.id(), &records)
            .map_err(ReconcileError::Persistence)
            .inspect_err(|err| self.log_failure("attendance_commit", session.id(), err))?;

        info!(
            "event=attendance_commit module=reconciliation status=ok context={} session={} total={} present={} absent={} auto_absent={} duration_ms={}",
            self.context.as_str(),
            session.id(),
            summary.total,
            summary.present,
            summary.absent,
            summary.auto_absent,
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Loads the persisted marks of a session (ground truth after commit).
    ///
    /// Rows of participants no longer eligible for the session (moved out of
    /// the lesson's group, say) are left out, so the returned set only holds
    /// decisions a commit would keep.
    pub fn load_attendance(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<MarkSet, ReconcileError> {
        let session = self.resolve_session(session_id, ReconcileError::Verification)?;
        let stored = self
            .store
            .get_attendance(session.id())
            .map_err(ReconcileError::Verification)
            .inspect_err(|err| self.log_failure("attendance_reload", session.id(), err))?;
        let eligible: HashSet<ParticipantId> = self
            .eligible_participants(&session)
            .map_err(ReconcileError::Verification)
            .inspect_err(|err| self.log_failure("attendance_reload", session.id(), err))?
            .iter()
            .map(Participant::id)
            .collect();

        let marks: MarkSet = stored
            .iter()
            .filter(|(participant_id, _)| eligible.contains(participant_id))
            .collect();
        info!(
            "event=attendance_reload module=reconciliation status=ok context={} session={} records={} dropped={}",
            self.context.as_str(),
            session.id(),
            marks.len(),
            stored.len() - marks.len()
        );
        Ok(marks)
    }

    fn resolve_session(
        &self,
        session_id: Option<SessionId>,
        wrap: fn(RepoError) -> ReconcileError,
    ) -> Result<Session, ReconcileError> {
        let Some(id) = session_id else {
            warn!(
                "event=session_resolve module=reconciliation status=error context={} error_code=no_session",
                self.context.as_str()
            );
            return Err(ReconcileError::InvalidSession(None));
        };

        match self.sessions.get_session(id) {
            Ok(Some(session)) => Ok(session),
            Ok(None) => {
                warn!(
                    "event=session_resolve module=reconciliation status=error context={} session={} error_code=session_not_found",
                    self.context.as_str(),
                    id
                );
                Err(ReconcileError::InvalidSession(Some(id)))
            }
            Err(err) => {
                let err = wrap(err);
                self.log_failure("session_resolve", id, &err);
                Err(err)
            }
        }
    }

    fn log_failure(&self, event: &str, session_id: SessionId, err: &ReconcileError) {
        error!(
            "event={event} module=reconciliation status=error context={} session={} error_code={} error={}",
            self.context.as_str(),
            session_id,
            err.code(),
            err
        );
    }
}

fn reconcile(eligible: &[Participant], marks: &MarkSet, context: Context) -> ReconciliationResult {
    let unmarked_names: Vec<String> = eligible
        .iter()
        .filter(|participant| !marks.is_marked(participant.id()))
        .map(|participant| participant.name().to_string())
        .collect();
    let total = eligible.len();
    let unmarked = unmarked_names.len();

    ReconciliationResult {
        total,
        marked: total - unmarked,
        unmarked,
        unmarked_names,
        needs_confirmation: unmarked > 0,
        message: confirmation_message(context, total, unmarked),
    }
}

fn build_snapshot(
    eligible: &[Participant],
    marks: &MarkSet,
) -> (Vec<AttendanceRecord>, SaveSummary) {
    let mut summary = SaveSummary {
        total: eligible.len(),
        ..SaveSummary::default()
    };
    let records = eligible
        .iter()
        .map(|participant| {
            let mark = marks.get(participant.id());
            let present = mark.unwrap_or(false);
            if present {
                summary.present += 1;
            } else {
                summary.absent += 1;
                if mark.is_none() {
                    summary.auto_absent += 1;
                }
            }
            AttendanceRecord {
                participant_id: participant.id(),
                present,
            }
        })
        .collect();
    (records, summary)
}

fn confirmation_message(context: Context, total: usize, unmarked: usize) -> String {
    let schema = context.schema();
    if unmarked == 0 {
        return format!("All {total} {} marked.", schema.noun_for(total));
    }
    format!(
        "{unmarked} {} not marked and will be recorded as absent.",
        schema.noun_for(unmarked)
    )
}

#[cfg(test)]
mod tests {
    use super::{build_snapshot, confirmation_message, reconcile};
    use crate::model::attendance::MarkSet;
    use crate::model::context::Context;
    use crate::model::participant::{MinistryParticipant, Participant};

    fn roster(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|name| Participant::from(MinistryParticipant::new(*name)))
            .collect()
    }

    #[test]
    fn reconcile_lists_unmarked_in_roster_order() {
        let eligible = roster(&["Ana", "Bia", "Caio"]);
        let marks: MarkSet = [(eligible[1].id(), true)].into_iter().collect();

        let result = reconcile(&eligible, &marks, Context::Ministry);
        assert_eq!(result.total, 3);
        assert_eq!(result.marked, 1);
        assert_eq!(result.unmarked, 2);
        assert_eq!(result.unmarked_names, vec!["Ana", "Caio"]);
        assert!(result.needs_confirmation);
        assert!(result.message.starts_with("2 students"));
    }

    #[test]
    fn reconcile_ignores_marks_outside_eligible_set() {
        let eligible = roster(&["Ana"]);
        let outsider = Participant::from(MinistryParticipant::new("Outsider"));
        let marks: MarkSet = [(eligible[0].id(), false), (outsider.id(), true)]
            .into_iter()
            .collect();

        let result = reconcile(&eligible, &marks, Context::Ministry);
        assert_eq!(result.marked, 1);
        assert_eq!(result.unmarked, 0);
        assert!(!result.needs_confirmation);

        let (records, summary) = build_snapshot(&eligible, &marks);
        assert_eq!(records.len(), 1);
        assert_eq!(summary.present, 0);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.auto_absent, 0);
    }

    #[test]
    fn snapshot_defaults_unmarked_to_absent() {
        let eligible = roster(&["Ana", "Bia"]);
        let marks: MarkSet = [(eligible[0].id(), true)].into_iter().collect();

        let (records, summary) = build_snapshot(&eligible, &marks);
        assert_eq!(records.len(), 2);
        assert!(records[0].present);
        assert!(!records[1].present);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.present, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.auto_absent, 1);
    }

    #[test]
    fn message_uses_context_wording() {
        assert_eq!(
            confirmation_message(Context::Reception, 5, 1),
            "1 member not marked and will be recorded as absent."
        );
        assert_eq!(
            confirmation_message(Context::Ministry, 0, 0),
            "All 0 students marked."
        );
    }
}
