//! Lessons and events that attendance is taken against.

use crate::model::context::Context;
use crate::model::group::GroupId;
use crate::model::ValidationError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;

/// Kind of reception gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Service,
    Meeting,
    SpecialEvent,
}

impl EventType {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Meeting => "meeting",
            Self::SpecialEvent => "special_event",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "service" => Some(Self::Service),
            "meeting" => Some(Self::Meeting),
            "special_event" => Some(Self::SpecialEvent),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Service => "Culto",
            Self::Meeting => "Reunião",
            Self::SpecialEvent => "Evento Especial",
        }
    }
}

/// Ministry lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: SessionId,
    pub title: String,
    pub date: NaiveDate,
    pub teacher: Option<String>,
    pub notes: Option<String>,
    /// When set, only students of this group are expected.
    pub group_id: Option<GroupId>,
}

impl Lesson {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            date,
            teacher: None,
            notes: None,
            group_id: None,
        }
    }
}

/// Reception event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionEvent {
    pub id: SessionId,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub event_type: EventType,
    pub leader: Option<String>,
    pub notes: Option<String>,
    /// Informational only: reception always expects the full roster.
    pub group_id: Option<GroupId>,
}

impl ReceptionEvent {
    pub fn new(title: impl Into<String>, date: NaiveDate, event_type: EventType) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            date,
            start_time: None,
            event_type,
            leader: None,
            notes: None,
            group_id: None,
        }
    }
}

/// One lesson or event instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "context", rename_all = "snake_case")]
pub enum Session {
    Ministry(Lesson),
    Reception(ReceptionEvent),
}

impl Session {
    pub fn id(&self) -> SessionId {
        match self {
            Self::Ministry(s) => s.id,
            Self::Reception(s) => s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Ministry(s) => &s.title,
            Self::Reception(s) => &s.title,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Ministry(s) => s.date,
            Self::Reception(s) => s.date,
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Ministry(s) => s.group_id,
            Self::Reception(s) => s.group_id,
        }
    }

    pub fn context(&self) -> Context {
        match self {
            Self::Ministry(_) => Context::Ministry,
            Self::Reception(_) => Context::Reception,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title().trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        Ok(())
    }
}

impl From<Lesson> for Session {
    fn from(value: Lesson) -> Self {
        Self::Ministry(value)
    }
}

impl From<ReceptionEvent> for Session {
    fn from(value: ReceptionEvent) -> Self {
        Self::Reception(value)
    }
}
