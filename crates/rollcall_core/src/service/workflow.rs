//! Save workflow for taking attendance on one selected session.
//!
//! # Responsibility
//! - Hold the live MarkSet for the selected session.
//! - Drive verify -> (confirm) -> commit and surface every outcome through
//!   an injected `Notifier`.
//!
//! # Invariants
//! - Only one save attempt is in flight; requests in any non-idle state
//!   are ignored.
//! - The MarkSet committed after confirmation is the snapshot captured at
//!   verification time.
//! - Failures never modify the live MarkSet.
//! - Changing the selected session discards unsaved marks.

use crate::model::attendance::{MarkSet, ReconciliationResult, SaveSummary};
use crate::model::participant::ParticipantId;
use crate::model::session::SessionId;
use crate::repo::attendance_repo::AttendanceStore;
use crate::repo::participant_repo::ParticipantRepository;
use crate::repo::session_repo::SessionRepository;
use crate::service::reconciliation::{ReconcileError, ReconciliationEngine};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Port for dismissable notifications.
pub trait Notifier {
    fn notify(&self, kind: NoticeKind, title: &str, message: &str);
}

/// Notifier that only writes to the log; for headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, title: &str, message: &str) {
        match kind {
            NoticeKind::Error => {
                error!("event=notice module=workflow kind=error title={title} message={message}")
            }
            NoticeKind::Warning => {
                warn!("event=notice module=workflow kind=warning title={title} message={message}")
            }
            NoticeKind::Success | NoticeKind::Info => info!(
                "event=notice module=workflow kind={} title={title} message={message}",
                kind.as_str()
            ),
        }
    }
}

/// What the human is asked before unmarked participants are defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub session_id: SessionId,
    pub title: String,
    pub message: String,
    pub unmarked: usize,
    pub unmarked_names: Vec<String>,
}

/// Port for the yes/no confirmation dialog.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool;
}

impl<F> Confirmer for F
where
    F: FnMut(&ConfirmationPrompt) -> bool,
{
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
        self(prompt)
    }
}

/// Phase of the current save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Verifying,
    AwaitingConfirmation,
    Committing,
}

/// Result of one save interaction.
#[derive(Debug)]
pub enum SaveOutcome {
    Committed(SaveSummary),
    AwaitingConfirmation(ConfirmationPrompt),
    Cancelled,
    Failed(ReconcileError),
    /// Request arrived while another attempt was in flight, or there was
    /// nothing to confirm/cancel.
    Ignored,
}

/// Errors of mark editing and session selection.
#[derive(Debug)]
pub enum WorkflowError {
    /// A save attempt is in flight or awaiting confirmation.
    Busy,
    NoSessionSelected,
    Load(ReconcileError),
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "a save is in progress"),
            Self::NoSessionSelected => write!(f, "no session selected"),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Busy | Self::NoSessionSelected => None,
        }
    }
}

struct PendingSave {
    session_id: SessionId,
    snapshot: MarkSet,
    prompt: ConfirmationPrompt,
}

/// Attendance-taking state for one selected session.
pub struct AttendanceWorkflow<P, S, A, N> {
    engine: ReconciliationEngine<P, S, A>,
    notifier: N,
    session_id: Option<SessionId>,
    marks: MarkSet,
    state: SaveState,
    pending: Option<PendingSave>,
    last_summary: Option<SaveSummary>,
}

impl<P, S, A, N> AttendanceWorkflow<P, S, A, N>
where
    P: ParticipantRepository,
    S: SessionRepository,
    A: AttendanceStore,
    N: Notifier,
{
    pub fn new(engine: ReconciliationEngine<P, S, A>, notifier: N) -> Self {
        Self {
            engine,
            notifier,
            session_id: None,
            marks: MarkSet::new(),
            state: SaveState::Idle,
            pending: None,
            last_summary: None,
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine<P, S, A> {
        &self.engine
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn selected_session(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn present_count(&self) -> usize {
        self.marks.present_count()
    }

    pub fn absent_count(&self) -> usize {
        self.marks.absent_count()
    }

    pub fn last_summary(&self) -> Option<SaveSummary> {
        self.last_summary
    }

    pub fn pending_prompt(&self) -> Option<&ConfirmationPrompt> {
        self.pending.as_ref().map(|pending| &pending.prompt)
    }

    /// Switches to another session (or none), replacing the live marks with
    /// the persisted ones.
    pub fn select_session(
        &mut self,
        session_id: Option<SessionId>,
    ) -> Result<(), WorkflowError> {
        if self.state != SaveState::Idle {
            return Err(WorkflowError::Busy);
        }

        self.marks = MarkSet::new();
        self.last_summary = None;
        self.session_id = None;

        if session_id.is_none() {
            return Ok(());
        }

        match self.engine.load_attendance(session_id) {
            Ok(marks) => {
                self.marks = marks;
                self.session_id = session_id;
                debug!(
                    "event=save_flow module=workflow status=ok transition=select_session marks={}",
                    self.marks.len()
                );
                Ok(())
            }
            Err(err) => {
                self.report_failure("Could not load attendance", &err);
                Err(WorkflowError::Load(err))
            }
        }
    }

    /// Records a presence decision; pure local update.
    pub fn toggle(
        &mut self,
        participant_id: ParticipantId,
        present: bool,
    ) -> Result<(), WorkflowError> {
        if self.session_id.is_none() {
            return Err(WorkflowError::NoSessionSelected);
        }
        if self.state != SaveState::Idle {
            return Err(WorkflowError::Busy);
        }
        self.marks.mark(participant_id, present);
        Ok(())
    }

    /// Starts a save attempt: verifies, then commits directly or waits for
    /// confirmation.
    pub fn request_save(&mut self) -> SaveOutcome {
        if self.state != SaveState::Idle {
            debug!(
                "event=save_flow module=workflow status=ignored transition=request_save state={:?}",
                self.state
            );
            return SaveOutcome::Ignored;
        }

        let Some(session_id) = self.session_id else {
            let err = ReconcileError::InvalidSession(None);
            self.report_failure("Select a session first", &err);
            return SaveOutcome::Failed(err);
        };

        self.state = SaveState::Verifying;
        let snapshot = self.marks.clone();
        let verification = match self.engine.verify_completeness(Some(session_id), &snapshot) {
            Ok(result) => result,
            Err(err) => {
                self.state = SaveState::Idle;
                self.report_failure("Could not verify attendance", &err);
                return SaveOutcome::Failed(err);
            }
        };

        if !verification.needs_confirmation {
            return self.commit(session_id, snapshot);
        }

        let prompt = build_prompt(session_id, verification);
        info!(
            "event=save_flow module=workflow status=ok transition=awaiting_confirmation session={} unmarked={}",
            session_id, prompt.unmarked
        );
        self.state = SaveState::AwaitingConfirmation;
        self.pending = Some(PendingSave {
            session_id,
            snapshot,
            prompt: prompt.clone(),
        });
        SaveOutcome::AwaitingConfirmation(prompt)
    }

    /// Commits the snapshot held for confirmation.
    pub fn confirm(&mut self) -> SaveOutcome {
        if self.state != SaveState::AwaitingConfirmation {
            return SaveOutcome::Ignored;
        }
        let Some(pending) = self.pending.take() else {
            self.state = SaveState::Idle;
            return SaveOutcome::Ignored;
        };
        self.commit(pending.session_id, pending.snapshot)
    }

    /// Drops the pending confirmation; nothing is written.
    pub fn cancel(&mut self) -> SaveOutcome {
        if self.state != SaveState::AwaitingConfirmation {
            return SaveOutcome::Ignored;
        }
        self.pending = None;
        self.state = SaveState::Idle;
        info!("event=save_flow module=workflow status=ok transition=cancel");
        SaveOutcome::Cancelled
    }

    /// Runs a full save, asking `confirmer` when participants are unmarked.
    pub fn save_with(&mut self, confirmer: &mut impl Confirmer) -> SaveOutcome {
        match self.request_save() {
            SaveOutcome::AwaitingConfirmation(prompt) => {
                if confirmer.confirm(&prompt) {
                    self.confirm()
                } else {
                    self.cancel()
                }
            }
            other => other,
        }
    }

    fn commit(&mut self, session_id: SessionId, snapshot: MarkSet) -> SaveOutcome {
        self.state = SaveState::Committing;
        let summary = match self.engine.commit_attendance(Some(session_id), &snapshot) {
            Ok(summary) => summary,
            Err(err) => {
                self.state = SaveState::Idle;
                self.report_failure("Could not save attendance", &err);
                return SaveOutcome::Failed(err);
            }
        };

        self.state = SaveState::Idle;
        self.last_summary = Some(summary);
        self.notifier.notify(
            NoticeKind::Success,
            "Attendance saved",
            &format!(
                "{} present, {} absent ({} not marked) out of {}",
                summary.present, summary.absent, summary.auto_absent, summary.total
            ),
        );

        match self.engine.load_attendance(Some(session_id)) {
            Ok(marks) => self.marks = marks,
            Err(err) => {
                self.notifier.notify(
                    NoticeKind::Warning,
                    "Attendance saved",
                    &format!("could not reload saved attendance: {err}"),
                );
            }
        }
        SaveOutcome::Committed(summary)
    }

    fn report_failure(&self, title: &str, err: &ReconcileError) {
        let kind = match err {
            ReconcileError::InvalidSession(_) => NoticeKind::Warning,
            ReconcileError::Verification(_) | ReconcileError::Persistence(_) => NoticeKind::Error,
        };
        self.notifier.notify(kind, title, &err.to_string());
    }
}

fn build_prompt(session_id: SessionId, verification: ReconciliationResult) -> ConfirmationPrompt {
    ConfirmationPrompt {
        session_id,
        title: "Confirm attendance".to_string(),
        message: verification.message,
        unmarked: verification.unmarked,
        unmarked_names: verification.unmarked_names,
    }
}
