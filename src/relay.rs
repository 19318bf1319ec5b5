use tracing::{info, warn};

use crate::api::{ApiError, SessionBackend};
use crate::models::{FinishedSession, LogSetRequest, SetLog};

/// Sends logged sets and the finish request for one session. Every failure
/// goes back to the caller.
pub struct SubmissionRelay<'a, B: SessionBackend + ?Sized> {
    backend: &'a B,
    session_id: u64,
}

impl<'a, B: SessionBackend + ?Sized> SubmissionRelay<'a, B> {
    pub fn new(backend: &'a B, session_id: u64) -> Self {
        Self { backend, session_id }
    }

    pub fn log_set(
        &self,
        exercise_id: u64,
        set_number: u32,
        reps_completed: u32,
        weight_used: f64,
    ) -> Result<SetLog, ApiError> {
        let request = LogSetRequest {
            exercise_id,
            set_number,
            reps_completed,
            weight_used,
        };
        validate(&request)?;

        match self.backend.log_set(self.session_id, &request) {
            Ok(log) => {
                info!(session = self.session_id, exercise_id, set_number, reps_completed, weight_used, "set logged");
                Ok(log)
            }
            Err(e) => {
                warn!(session = self.session_id, exercise_id, set_number, "logging set failed: {e}");
                Err(e)
            }
        }
    }

    pub fn finish_session(&self) -> Result<FinishedSession, ApiError> {
        match self.backend.finish_session(self.session_id) {
            Ok(finished) => {
                info!(session = self.session_id, "session finished");
                Ok(finished)
            }
            Err(e) => {
                warn!(session = self.session_id, "finishing session failed: {e}");
                Err(e)
            }
        }
    }
}

pub fn validate(request: &LogSetRequest) -> Result<(), ApiError> {
    if request.set_number == 0 {
        return Err(ApiError::InvalidInput("set numbers start at 1".to_string()));
    }
    if !request.weight_used.is_finite() || request.weight_used < 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "weight must be a non-negative number, got {}",
            request.weight_used
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::models::PlannedExercise;

    fn backend() -> FakeBackend {
        FakeBackend::new(vec![PlannedExercise::new(1, "Bench Press", 3, 10)])
    }

    #[test]
    fn logs_a_set() {
        let backend = backend();
        let relay = SubmissionRelay::new(&backend, 5);

        let log = relay.log_set(1, 2, 9, 62.5).unwrap();
        assert_eq!(log.set_number, 2);
        assert_eq!(log.reps_completed, 9);
        assert_eq!(backend.logs.borrow().len(), 1);
    }

    #[test]
    fn backend_failure_reaches_caller() {
        let backend = backend();
        backend.fail_log.set(true);
        let relay = SubmissionRelay::new(&backend, 5);

        let err = relay.log_set(1, 1, 10, 60.0).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
    }

    #[test]
    fn rejects_bad_input_without_calling_backend() {
        let backend = backend();
        let relay = SubmissionRelay::new(&backend, 5);

        assert!(matches!(relay.log_set(1, 0, 10, 60.0), Err(ApiError::InvalidInput(_))));
        assert!(matches!(relay.log_set(1, 1, 10, -5.0), Err(ApiError::InvalidInput(_))));
        assert!(matches!(relay.log_set(1, 1, 10, f64::NAN), Err(ApiError::InvalidInput(_))));
        assert_eq!(backend.log_calls.get(), 0);
    }

    #[test]
    fn finish_reports_failure() {
        let backend = backend();
        backend.fail_finish.set(true);
        let relay = SubmissionRelay::new(&backend, 5);
        assert!(relay.finish_session().is_err());

        backend.fail_finish.set(false);
        let finished = relay.finish_session().unwrap();
        assert!(finished.completed_at.is_some());
    }
}
