//! Organizational context selection.
//!
//! The ministry and reception front desks track attendance with the same
//! rules over different tables. A `Context` value picks the table/column
//! names and the wording; nothing else in core branches on it except the
//! sub-group eligibility rule.

use serde::{Deserialize, Serialize};

/// Organizational mode whose entity family is being managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    /// Children's ministry: students, lessons.
    Ministry,
    /// Front desk: members/visitors, events.
    Reception,
}

/// Storage and wording parameters for one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSchema {
    pub groups_table: &'static str,
    pub participants_table: &'static str,
    pub sessions_table: &'static str,
    pub attendance_table: &'static str,
    /// Attendance column referencing the participant row.
    pub participant_column: &'static str,
    /// Attendance column referencing the session row.
    pub session_column: &'static str,
    pub participant_noun: &'static str,
    pub participant_noun_plural: &'static str,
}

const MINISTRY_SCHEMA: ContextSchema = ContextSchema {
    groups_table: "groups",
    participants_table: "students",
    sessions_table: "lessons",
    attendance_table: "attendance",
    participant_column: "student_id",
    session_column: "lesson_id",
    participant_noun: "student",
    participant_noun_plural: "students",
};

const RECEPTION_SCHEMA: ContextSchema = ContextSchema {
    groups_table: "reception_groups",
    participants_table: "reception_members",
    sessions_table: "reception_events",
    attendance_table: "reception_attendance",
    participant_column: "member_id",
    session_column: "event_id",
    participant_noun: "member",
    participant_noun_plural: "members",
};

impl Context {
    pub const ALL: [Context; 2] = [Context::Ministry, Context::Reception];

    pub fn schema(self) -> &'static ContextSchema {
        match self {
            Self::Ministry => &MINISTRY_SCHEMA,
            Self::Reception => &RECEPTION_SCHEMA,
        }
    }

    /// Whether a session's sub-group narrows the eligible roster.
    ///
    /// Reception always takes attendance over the full roster, even when an
    /// event carries a group.
    pub fn scopes_by_group(self) -> bool {
        matches!(self, Self::Ministry)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ministry => "ministry",
            Self::Reception => "reception",
        }
    }
}

impl ContextSchema {
    /// Singular or plural participant noun for `count`.
    pub fn noun_for(&self, count: usize) -> &'static str {
        if count == 1 {
            self.participant_noun
        } else {
            self.participant_noun_plural
        }
    }
}
