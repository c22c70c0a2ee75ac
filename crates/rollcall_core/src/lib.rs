//! Core domain logic for Rollcall, attendance tracking for a children's
//! ministry and a congregation reception desk.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ContactSettings, RollcallConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::attendance::{AttendanceRecord, MarkSet, ReconciliationResult, SaveSummary};
pub use model::context::{Context, ContextSchema};
pub use model::group::{Group, GroupId};
pub use model::participant::{
    AttendanceStats, AttendanceStatus, MemberType, MinistryParticipant, Participant,
    ParticipantId, ReceptionParticipant, RosterEntry, Sex, StatusPolicy,
};
pub use model::session::{EventType, Lesson, ReceptionEvent, Session, SessionId};
pub use model::ValidationError;
pub use repo::attendance_repo::{AttendanceStore, SqliteAttendanceStore};
pub use repo::group_repo::{GroupRepository, SqliteGroupRepository};
pub use repo::participant_repo::{ParticipantRepository, SqliteParticipantRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::reconciliation::{ReconcileError, ReconciliationEngine};
pub use service::report_service::{ReportService, ReportSettings};
pub use service::roster_service::{RosterFilter, RosterService};
pub use service::session_service::SessionService;
pub use service::workflow::{
    AttendanceWorkflow, ConfirmationPrompt, Confirmer, LogNotifier, NoticeKind, Notifier,
    SaveOutcome, SaveState, WorkflowError,
};
pub use service::ServiceError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
