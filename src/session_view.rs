use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, SessionBackend};
use crate::cursor::Cursor;
use crate::log_index::{DuplicatePolicy, LogIndex};
use crate::models::{FinishedSession, LogSetRequest, PlannedExercise, SetLog, WorkoutSession};
use crate::reconcile::{reconcile, summarize, RowGroup, SummaryGroup};
use crate::relay::{self, SubmissionRelay};
use crate::snapshot;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
    Loading,
    LoadFailed(String),
    Ready,
    LoggingInFlight { pending: usize },
    FinishingInFlight,
    Completed,
}

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Session has not loaded")]
    NotLoaded,

    #[error("Session is finished and read-only")]
    ReadOnly,

    #[error("Wait for pending requests before finishing")]
    Busy,

    #[error("Nothing is waiting for a response")]
    NothingInFlight,

    #[error("Exercise {0} is not part of this session")]
    UnknownExercise(u64),

    #[error("Set {set_number} is outside 1..={sets}")]
    SetOutOfRange { set_number: u32, sets: u32 },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// View model behind the editable logging screen.
pub struct SessionView {
    session: Option<WorkoutSession>,
    planned: Vec<PlannedExercise>,
    logs: Vec<SetLog>,
    groups: Vec<RowGroup>,
    cursor: Cursor,
    policy: DuplicatePolicy,
    state: ViewState,
}

impl SessionView {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            session: None,
            planned: Vec::new(),
            logs: Vec::new(),
            groups: Vec::new(),
            cursor: Cursor::new(0),
            policy,
            state: ViewState::Loading,
        }
    }

    /// Fetches the session and its logs in one go.
    pub fn load<B: SessionBackend + ?Sized>(&mut self, backend: &B, session_id: u64) -> Result<(), ViewError> {
        let fetched = backend
            .session(session_id)
            .and_then(|session| backend.session_logs(session_id).map(|logs| (session, logs)));

        match fetched {
            Ok((session, logs)) => {
                self.loaded(session, logs);
                Ok(())
            }
            Err(e) => {
                self.load_failed(&e);
                Err(e.into())
            }
        }
    }

    pub fn loaded(&mut self, session: WorkoutSession, logs: Vec<SetLog>) {
        self.planned = snapshot::planned_exercises(Some(&session));
        self.state = if session.is_completed() {
            ViewState::Completed
        } else {
            ViewState::Ready
        };
        info!(
            session = session.session_id,
            exercises = self.planned.len(),
            logs = logs.len(),
            completed = session.is_completed(),
            "session loaded"
        );
        self.session = Some(session);
        self.logs = logs;
        self.rebuild();

        let dups = LogIndex::new(&self.logs, self.policy).duplicates();
        if !dups.is_empty() {
            warn!(slots = ?dups, policy = ?self.policy, "sets logged more than once");
        }
    }

    pub fn load_failed(&mut self, error: &ApiError) {
        warn!("loading session failed: {error}");
        self.state = ViewState::LoadFailed(error.to_string());
    }

    pub fn begin_log(
        &mut self,
        exercise_id: u64,
        set_number: u32,
        reps_completed: u32,
        weight_used: f64,
    ) -> Result<LogSetRequest, ViewError> {
        let pending = match self.state {
            ViewState::Ready => 0,
            ViewState::LoggingInFlight { pending } => pending,
            ViewState::Completed => return Err(ViewError::ReadOnly),
            ViewState::FinishingInFlight => return Err(ViewError::Busy),
            ViewState::Loading | ViewState::LoadFailed(_) => return Err(ViewError::NotLoaded),
        };

        let planned = self
            .planned
            .iter()
            .find(|p| p.exercise_id == exercise_id)
            .ok_or(ViewError::UnknownExercise(exercise_id))?;
        if set_number == 0 || set_number > planned.sets {
            return Err(ViewError::SetOutOfRange {
                set_number,
                sets: planned.sets,
            });
        }

        let request = LogSetRequest {
            exercise_id,
            set_number,
            reps_completed,
            weight_used,
        };
        relay::validate(&request)?;

        self.state = ViewState::LoggingInFlight { pending: pending + 1 };
        Ok(request)
    }

    /// Applies the backend's answer for one set. The log is only added once
    /// the backend has stored it.
    pub fn complete_log(&mut self, result: Result<SetLog, ApiError>) -> Result<(), ViewError> {
        self.settle_log()?;
        self.apply_log(result?);
        Ok(())
    }

    fn settle_log(&mut self) -> Result<(), ViewError> {
        let pending = match self.state {
            ViewState::LoggingInFlight { pending } => pending,
            _ => return Err(ViewError::NothingInFlight),
        };
        self.state = if pending > 1 {
            ViewState::LoggingInFlight { pending: pending - 1 }
        } else {
            ViewState::Ready
        };
        Ok(())
    }

    fn apply_log(&mut self, log: SetLog) {
        debug!(exercise_id = log.exercise_id, set_number = log.set_number, "applying logged set");
        self.logs.push(log);
        self.rebuild();
    }

    pub fn begin_finish(&mut self) -> Result<u64, ViewError> {
        match self.state {
            ViewState::Ready => {}
            ViewState::Completed => return Err(ViewError::ReadOnly),
            ViewState::LoggingInFlight { .. } | ViewState::FinishingInFlight => return Err(ViewError::Busy),
            ViewState::Loading | ViewState::LoadFailed(_) => return Err(ViewError::NotLoaded),
        }
        let session_id = self.session.as_ref().map(|s| s.session_id).ok_or(ViewError::NotLoaded)?;
        self.state = ViewState::FinishingInFlight;
        Ok(session_id)
    }

    pub fn complete_finish(&mut self, result: Result<FinishedSession, ApiError>) -> Result<(), ViewError> {
        if self.state != ViewState::FinishingInFlight {
            return Err(ViewError::NothingInFlight);
        }
        match result {
            Ok(finished) => {
                if let Some(session) = self.session.as_mut() {
                    session.completed_at = Some(finished.completed_at.unwrap_or_else(Utc::now));
                }
                self.state = ViewState::Completed;
                Ok(())
            }
            Err(e) => {
                self.state = ViewState::Ready;
                Err(e.into())
            }
        }
    }

    /// One full round trip for a single set.
    pub fn log_set<B: SessionBackend + ?Sized>(
        &mut self,
        relay: &SubmissionRelay<'_, B>,
        exercise_id: u64,
        set_number: u32,
        reps_completed: u32,
        weight_used: f64,
    ) -> Result<SetLog, ViewError> {
        let request = self.begin_log(exercise_id, set_number, reps_completed, weight_used)?;
        let result = relay.log_set(
            request.exercise_id,
            request.set_number,
            request.reps_completed,
            request.weight_used,
        );
        self.settle_log()?;
        let log = result?;
        self.apply_log(log.clone());
        Ok(log)
    }

    pub fn finish_session<B: SessionBackend + ?Sized>(&mut self, relay: &SubmissionRelay<'_, B>) -> Result<(), ViewError> {
        self.begin_finish()?;
        self.complete_finish(relay.finish_session())
    }

    fn rebuild(&mut self) {
        self.groups = reconcile(&self.planned, &self.logs, self.policy);
        self.cursor.set_len(self.groups.len());
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.state, ViewState::Ready | ViewState::LoggingInFlight { .. })
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn workout_name(&self) -> Option<&str> {
        snapshot::workout_name(self.session.as_ref())
    }

    pub fn logs(&self) -> &[SetLog] {
        &self.logs
    }

    pub fn row_groups(&self) -> &[RowGroup] {
        &self.groups
    }

    pub fn current_group(&self) -> Option<&RowGroup> {
        self.groups.get(self.cursor.index())
    }

    pub fn cursor_index(&self) -> usize {
        self.cursor.index()
    }

    pub fn next(&mut self) {
        self.cursor.next();
    }

    pub fn previous(&mut self) {
        self.cursor.previous();
    }

    pub fn summary(&self) -> Vec<SummaryGroup> {
        summarize(&self.planned, &self.logs)
    }
}
