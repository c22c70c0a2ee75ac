//! Domain model for roster, sessions and attendance.
//!
//! # Responsibility
//! - Define the canonical records shared by both organizational contexts.
//! - Keep context-specific fields behind tagged unions, so core logic only
//!   sees the common `id`/`name`/`group_id`/`status` surface.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Records validate themselves before any repository writes them.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attendance;
pub mod context;
pub mod group;
pub mod participant;
pub mod session;

/// Domain validation failures raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Participant full name is blank after trim.
    BlankName,
    /// Session title is blank after trim.
    BlankTitle,
    /// Group name is blank after trim.
    BlankGroupName,
    /// Contact e-mail does not look like an address.
    InvalidEmail(String),
    /// Birth date lies after the current day.
    BirthDateInFuture(NaiveDate),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "full name must not be blank"),
            Self::BlankTitle => write!(f, "session title must not be blank"),
            Self::BlankGroupName => write!(f, "group name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid e-mail address `{value}`"),
            Self::BirthDateInFuture(date) => write!(f, "birth date {date} is in the future"),
        }
    }
}

impl Error for ValidationError {}
