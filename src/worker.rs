use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, warn};

use crate::api::{ApiError, SessionBackend};
use crate::models::{FinishedSession, LogSetRequest, SetLog, StartedSession, WorkoutSession};
use crate::relay::SubmissionRelay;

#[derive(Debug)]
pub enum Command {
    ListSessions,
    Start { workout_id: u64 },
    Load { session_id: u64 },
    LogSet { session_id: u64, request: LogSetRequest },
    Finish { session_id: u64 },
}

/// Results of backend calls. Session-scoped results carry the id the
/// command was sent for.
#[derive(Debug)]
pub enum Event {
    SessionsListed(Result<Vec<WorkoutSession>, ApiError>),
    Started(Result<StartedSession, ApiError>),
    Loaded {
        session_id: u64,
        result: Result<(WorkoutSession, Vec<SetLog>), ApiError>,
    },
    SetLogged {
        session_id: u64,
        result: Result<SetLog, ApiError>,
    },
    Finished {
        session_id: u64,
        result: Result<FinishedSession, ApiError>,
    },
}

impl Event {
    pub fn session_id(&self) -> Option<u64> {
        match self {
            Event::SessionsListed(_) | Event::Started(_) => None,
            Event::Loaded { session_id, .. } | Event::SetLogged { session_id, .. } | Event::Finished { session_id, .. } => {
                Some(*session_id)
            }
        }
    }

    /// False for a session-scoped result whose session is no longer open.
    pub fn is_for(&self, open: Option<u64>) -> bool {
        match self.session_id() {
            Some(id) => open == Some(id),
            None => true,
        }
    }
}

/// Runs backend calls on a background thread so the UI keeps drawing while
/// requests are in flight.
pub struct Worker {
    commands: Sender<Command>,
    events: Receiver<Event>,
}

impl Worker {
    pub fn spawn<B>(backend: B, notify: impl Fn() + Send + 'static) -> Self
    where
        B: SessionBackend + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<Event>();

        thread::spawn(move || {
            for command in command_rx {
                debug!(?command, "worker received command");
                let event = run(&backend, command);
                if event_tx.send(event).is_err() {
                    break;
                }
                notify();
            }
            debug!("worker stopped");
        });

        Self {
            commands: command_tx,
            events: event_rx,
        }
    }

    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("worker thread is gone, command dropped");
        }
    }

    /// Events that arrived since the last call.
    pub fn drain(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }
}

fn run<B: SessionBackend>(backend: &B, command: Command) -> Event {
    match command {
        Command::ListSessions => Event::SessionsListed(backend.sessions()),
        Command::Start { workout_id } => Event::Started(backend.start_session(workout_id)),
        Command::Load { session_id } => Event::Loaded {
            session_id,
            result: backend
                .session(session_id)
                .and_then(|session| backend.session_logs(session_id).map(|logs| (session, logs))),
        },
        Command::LogSet { session_id, request } => Event::SetLogged {
            session_id,
            result: SubmissionRelay::new(backend, session_id).log_set(
                request.exercise_id,
                request.set_number,
                request.reps_completed,
                request.weight_used,
            ),
        },
        Command::Finish { session_id } => Event::Finished {
            session_id,
            result: SubmissionRelay::new(backend, session_id).finish_session(),
        },
    }
}
