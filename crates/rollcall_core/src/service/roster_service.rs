//! Roster use-case service.
//!
//! # Responsibility
//! - Participant and group CRUD for one context.
//! - Build roster rows with group names and derived attendance status.
//!
//! # Invariants
//! - Roster rows keep repository roster order after filtering.
//! - Status is always classified with the service's `StatusPolicy`.

use crate::model::context::Context;
use crate::model::group::{Group, GroupId};
use crate::model::participant::{
    AttendanceStatus, Participant, ParticipantId, RosterEntry, StatusPolicy,
};
use crate::repo::group_repo::GroupRepository;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::RepoError;
use crate::service::ServiceError;
use log::{error, info};
use std::collections::HashMap;

/// Roster filters; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterFilter {
    /// Case-insensitive substring of the participant name.
    pub search: Option<String>,
    pub group_id: Option<GroupId>,
    pub status: Option<AttendanceStatus>,
}

impl RosterFilter {
    fn matches(&self, entry: &RosterEntry) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim) {
            if !needle.is_empty()
                && !entry
                    .participant
                    .name()
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(group_id) = self.group_id {
            if entry.participant.group_id() != Some(group_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        true
    }
}

/// Roster facade over participant and group repositories.
pub struct RosterService<P, G> {
    participants: P,
    groups: G,
    policy: StatusPolicy,
}

impl<P: ParticipantRepository, G: GroupRepository> RosterService<P, G> {
    /// Creates a service; both repositories must serve the same context.
    pub fn new(participants: P, groups: G, policy: StatusPolicy) -> Result<Self, ServiceError> {
        if participants.context() != groups.context() {
            return Err(ServiceError::Repo(RepoError::InvalidData(format!(
                "roster and groups disagree on context: {} vs {}",
                participants.context().as_str(),
                groups.context().as_str()
            ))));
        }
        Ok(Self {
            participants,
            groups,
            policy,
        })
    }

    pub fn context(&self) -> Context {
        self.participants.context()
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    pub fn create_participant(
        &self,
        participant: &Participant,
    ) -> Result<Participant, ServiceError> {
        let id = self
            .participants
            .create_participant(participant)
            .inspect_err(|err| self.log_write_error("create", err))?;
        self.log_write("create", id);
        self.participants
            .get_participant(id)?
            .ok_or(ServiceError::InconsistentState(
                "created participant not found in read-back",
            ))
    }

    /// Full replacement of the participant's fields.
    pub fn update_participant(
        &self,
        participant: &Participant,
    ) -> Result<Participant, ServiceError> {
        self.participants
            .update_participant(participant)
            .inspect_err(|err| self.log_write_error("update", err))?;
        self.log_write("update", participant.id());
        self.participants
            .get_participant(participant.id())?
            .ok_or(ServiceError::InconsistentState(
                "updated participant not found in read-back",
            ))
    }

    pub fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, ServiceError> {
        Ok(self.participants.get_participant(id)?)
    }

    /// Removes the participant together with its attendance history.
    pub fn delete_participant(&self, id: ParticipantId) -> Result<(), ServiceError> {
        self.participants
            .delete_participant(id)
            .inspect_err(|err| self.log_write_error("delete", err))?;
        self.log_write("delete", id);
        Ok(())
    }

    /// Roster rows matching `filter`, each with its group name and status.
    pub fn list_roster(&self, filter: &RosterFilter) -> Result<Vec<RosterEntry>, ServiceError> {
        let roster = self.participants.list_participants()?;
        let stats = self
            .participants
            .attendance_stats(self.policy.window_sessions)?;
        let group_names: HashMap<GroupId, String> = self
            .groups
            .list_groups()?
            .into_iter()
            .map(|group| (group.id, group.name))
            .collect();

        Ok(roster
            .into_iter()
            .map(|participant| {
                let stats = stats.get(&participant.id()).copied().unwrap_or_default();
                RosterEntry {
                    group_name: participant
                        .group_id()
                        .and_then(|id| group_names.get(&id).cloned()),
                    status: AttendanceStatus::classify(&stats, &self.policy),
                    stats,
                    participant,
                }
            })
            .filter(|entry| filter.matches(entry))
            .collect())
    }

    pub fn create_group(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Group, ServiceError> {
        let mut group = Group::new(name);
        group.name = group.name.trim().to_string();
        group.description = description.filter(|value| !value.trim().is_empty());
        self.groups.create_group(&group)?;
        info!(
            "event=roster_write module=roster_service status=ok context={} op=create_group id={}",
            self.context().as_str(),
            group.id
        );
        Ok(group)
    }

    pub fn list_groups(&self) -> Result<Vec<Group>, ServiceError> {
        Ok(self.groups.list_groups()?)
    }

    /// Deletes the group; its members and sessions become ungrouped.
    pub fn delete_group(&self, id: GroupId) -> Result<(), ServiceError> {
        self.groups.delete_group(id)?;
        info!(
            "event=roster_write module=roster_service status=ok context={} op=delete_group id={}",
            self.context().as_str(),
            id
        );
        Ok(())
    }

    fn log_write(&self, op: &str, id: ParticipantId) {
        info!(
            "event=roster_write module=roster_service status=ok context={} op={op} id={id}",
            self.context().as_str()
        );
    }

    fn log_write_error(&self, op: &str, err: &RepoError) {
        error!(
            "event=roster_write module=roster_service status=error context={} op={op} error={err}",
            self.context().as_str()
        );
    }
}
