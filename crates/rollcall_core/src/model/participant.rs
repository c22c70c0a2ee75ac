//! Participant model for both contexts.
//!
//! # Responsibility
//! - Define ministry students and reception members as one tagged union.
//! - Classify attendance history into a status label.
//!
//! # Invariants
//! - Reconciliation only reads `id`, `name` and `group_id`; contact fields
//!   are for presentation and outreach.
//! - Status is derived from history, never stored.

use crate::model::context::Context;
use crate::model::group::GroupId;
use crate::model::ValidationError;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ParticipantId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Reception classification of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Member,
    Visitor,
}

impl MemberType {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Visitor => "visitor",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "member" => Some(Self::Member),
            "visitor" => Some(Self::Visitor),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Member => "Membro",
            Self::Visitor => "Visitante",
        }
    }
}

/// Derived attendance classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Active,
    /// "Faltoso" for ministry, "Moderado" for reception.
    AtRisk,
    Inactive,
    /// No attendance record inside the status window.
    Unregistered,
}

impl AttendanceStatus {
    /// Display label used by each front desk.
    pub fn label(self, context: Context) -> &'static str {
        match (self, context) {
            (Self::Active, _) => "Ativo",
            (Self::AtRisk, Context::Ministry) => "Faltoso",
            (Self::AtRisk, Context::Reception) => "Moderado",
            (Self::Inactive, _) => "Inativo",
            (Self::Unregistered, _) => "Sem Registro",
        }
    }

    /// Classifies recent history with the configured thresholds.
    pub fn classify(stats: &AttendanceStats, policy: &StatusPolicy) -> Self {
        match stats.percentage() {
            None => Self::Unregistered,
            Some(pct) if pct >= f64::from(policy.active_min_percent) => Self::Active,
            Some(pct) if pct >= f64::from(policy.at_risk_min_percent) => Self::AtRisk,
            Some(_) => Self::Inactive,
        }
    }
}

/// Attendance counters over a window of sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Sessions in the window with a record for this participant.
    pub sessions_recorded: u32,
    pub presences: u32,
}

impl AttendanceStats {
    pub fn absences(&self) -> u32 {
        self.sessions_recorded.saturating_sub(self.presences)
    }

    /// Presence ratio in percent; `None` without any record.
    pub fn percentage(&self) -> Option<f64> {
        if self.sessions_recorded == 0 {
            return None;
        }
        Some(f64::from(self.presences) * 100.0 / f64::from(self.sessions_recorded))
    }
}

/// Thresholds for deriving `AttendanceStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    /// Number of most recent sessions considered.
    pub window_sessions: u32,
    pub active_min_percent: u8,
    pub at_risk_min_percent: u8,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            window_sessions: 4,
            active_min_percent: 75,
            at_risk_min_percent: 50,
        }
    }
}

/// A child enrolled in the ministry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinistryParticipant {
    pub id: ParticipantId,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub group_id: Option<GroupId>,
    pub guardian_name: Option<String>,
    /// Guardian phone, used for outreach links.
    pub guardian_contact: Option<String>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
}

impl MinistryParticipant {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            birth_date: None,
            sex: None,
            group_id: None,
            guardian_name: None,
            guardian_contact: None,
            notes: None,
            photo_url: None,
        }
    }
}

/// A member or visitor registered at the front desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionParticipant {
    pub id: ParticipantId,
    pub full_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub member_type: MemberType,
    pub group_id: Option<GroupId>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl ReceptionParticipant {
    pub fn new(full_name: impl Into<String>, member_type: MemberType) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            birth_date: None,
            sex: None,
            member_type,
            group_id: None,
            contact_phone: None,
            contact_email: None,
            address: None,
            notes: None,
        }
    }
}

/// Person trackable for attendance in either context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum Participant {
    Ministry(MinistryParticipant),
    Reception(ReceptionParticipant),
}

impl Participant {
    pub fn id(&self) -> ParticipantId {
        match self {
            Self::Ministry(p) => p.id,
            Self::Reception(p) => p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Ministry(p) => &p.full_name,
            Self::Reception(p) => &p.full_name,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Ministry(p) => p.group_id,
            Self::Reception(p) => p.group_id,
        }
    }

    pub fn context(&self) -> Context {
        match self {
            Self::Ministry(_) => Context::Ministry,
            Self::Reception(_) => Context::Reception,
        }
    }

    /// Phone to reach about this participant: the guardian for children,
    /// the member themself at reception.
    pub fn contact_phone(&self) -> Option<&str> {
        match self {
            Self::Ministry(p) => p.guardian_contact.as_deref(),
            Self::Reception(p) => p.contact_phone.as_deref(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name().trim().is_empty() {
            return Err(ValidationError::BlankName);
        }

        let birth_date = match self {
            Self::Ministry(p) => p.birth_date,
            Self::Reception(p) => p.birth_date,
        };
        if let Some(date) = birth_date {
            if date > Local::now().date_naive() {
                return Err(ValidationError::BirthDateInFuture(date));
            }
        }

        if let Self::Reception(p) = self {
            if let Some(email) = p.contact_email.as_deref() {
                let email = email.trim();
                if !email.is_empty() && !email.contains('@') {
                    return Err(ValidationError::InvalidEmail(email.to_string()));
                }
            }
        }

        Ok(())
    }
}

impl From<MinistryParticipant> for Participant {
    fn from(value: MinistryParticipant) -> Self {
        Self::Ministry(value)
    }
}

impl From<ReceptionParticipant> for Participant {
    fn from(value: ReceptionParticipant) -> Self {
        Self::Reception(value)
    }
}

/// Roster row handed to presentation: participant plus derived status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub participant: Participant,
    pub group_name: Option<String>,
    pub stats: AttendanceStats,
    pub status: AttendanceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(sessions_recorded: u32, presences: u32) -> AttendanceStats {
        AttendanceStats {
            sessions_recorded,
            presences,
        }
    }

    #[test]
    fn classify_uses_thresholds_inclusively() {
        let policy = StatusPolicy::default();
        assert_eq!(
            AttendanceStatus::classify(&stats(4, 3), &policy),
            AttendanceStatus::Active
        );
        assert_eq!(
            AttendanceStatus::classify(&stats(4, 2), &policy),
            AttendanceStatus::AtRisk
        );
        assert_eq!(
            AttendanceStatus::classify(&stats(4, 1), &policy),
            AttendanceStatus::Inactive
        );
        assert_eq!(
            AttendanceStatus::classify(&stats(0, 0), &policy),
            AttendanceStatus::Unregistered
        );
    }

    #[test]
    fn at_risk_label_depends_on_context() {
        assert_eq!(AttendanceStatus::AtRisk.label(Context::Ministry), "Faltoso");
        assert_eq!(AttendanceStatus::AtRisk.label(Context::Reception), "Moderado");
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_email() {
        let blank = Participant::from(MinistryParticipant::new("   "));
        assert_eq!(blank.validate(), Err(ValidationError::BlankName));

        let mut member = ReceptionParticipant::new("Ana", MemberType::Member);
        member.contact_email = Some("not-an-address".to_string());
        let err = Participant::from(member).validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEmail(_)));
    }

    #[test]
    fn contact_phone_prefers_guardian_for_children() {
        let mut child = MinistryParticipant::new("Davi");
        child.guardian_contact = Some("(11) 91234-5678".to_string());
        let participant = Participant::from(child);
        assert_eq!(participant.contact_phone(), Some("(11) 91234-5678"));
        assert_eq!(participant.context(), Context::Ministry);
    }
}
