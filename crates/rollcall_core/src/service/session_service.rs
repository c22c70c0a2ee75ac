//! Session catalog use-case service.

use crate::model::context::Context;
use crate::model::session::{Session, SessionId};
use crate::repo::session_repo::SessionRepository;
use crate::service::ServiceError;
use log::{error, info};

/// Session CRUD facade for one context.
pub struct SessionService<S> {
    repo: S,
}

impl<S: SessionRepository> SessionService<S> {
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    pub fn context(&self) -> Context {
        self.repo.context()
    }

    pub fn create_session(&self, session: &Session) -> Result<Session, ServiceError> {
        session.validate()?;
        let id = self
            .repo
            .create_session(session)
            .inspect_err(|err| self.log_error("create", err))?;
        self.log_ok("create", id);
        self.repo
            .get_session(id)?
            .ok_or(ServiceError::InconsistentState(
                "created session not found in read-back",
            ))
    }

    pub fn update_session(&self, session: &Session) -> Result<Session, ServiceError> {
        session.validate()?;
        self.repo
            .update_session(session)
            .inspect_err(|err| self.log_error("update", err))?;
        self.log_ok("update", session.id());
        self.repo
            .get_session(session.id())?
            .ok_or(ServiceError::InconsistentState(
                "updated session not found in read-back",
            ))
    }

    pub fn get_session(&self, id: SessionId) -> Result<Option<Session>, ServiceError> {
        Ok(self.repo.get_session(id)?)
    }

    /// Sessions newest first.
    pub fn list_sessions(&self) -> Result<Vec<Session>, ServiceError> {
        Ok(self.repo.list_sessions()?)
    }

    /// Deletes the session and every attendance record taken for it.
    pub fn delete_session(&self, id: SessionId) -> Result<(), ServiceError> {
        self.repo
            .delete_session(id)
            .inspect_err(|err| self.log_error("delete", err))?;
        self.log_ok("delete", id);
        Ok(())
    }

    fn log_ok(&self, op: &str, id: SessionId) {
        info!(
            "event=session_write module=session_service status=ok context={} op={op} id={id}",
            self.context().as_str()
        );
    }

    fn log_error(&self, op: &str, err: &impl std::fmt::Display) {
        error!(
            "event=session_write module=session_service status=error context={} op={op} error={err}",
            self.context().as_str()
        );
    }
}
