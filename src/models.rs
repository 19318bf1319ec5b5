use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exercise as the backend marshals it inside a workout snapshot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRef {
    #[serde(rename = "ID", default)]
    pub id: u64,
    #[serde(rename = "Name", default)]
    pub name: String,
}

/// A planned exercise, frozen when the session started.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlannedExercise {
    #[serde(rename = "ExerciseID")]
    pub exercise_id: u64,
    #[serde(rename = "Exercise", default)]
    pub exercise: Option<ExerciseRef>,
    #[serde(rename = "Sets")]
    pub sets: u32,
    #[serde(rename = "Reps")]
    pub reps: u32,
}

impl PlannedExercise {
    pub fn new(exercise_id: u64, name: &str, sets: u32, reps: u32) -> Self {
        Self {
            exercise_id,
            exercise: Some(ExerciseRef {
                id: exercise_id,
                name: name.to_string(),
            }),
            sets,
            reps,
        }
    }

    pub fn name(&self) -> &str {
        self.exercise.as_ref().map(|e| e.name.as_str()).unwrap_or("")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSnapshot {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Exercises", default)]
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSession {
    pub session_id: u64,
    #[serde(default)]
    pub workout_snapshot: Option<WorkoutSnapshot>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkoutSession {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A persisted, completed set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetLog {
    #[serde(default)]
    pub log_id: Option<u64>,
    pub exercise_id: u64,
    pub set_number: u32,
    pub reps_completed: u32,
    pub weight_used: f64,
    pub logged_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogSetRequest {
    pub exercise_id: u64,
    pub set_number: u32,
    pub reps_completed: u32,
    pub weight_used: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FinishedSession {
    #[serde(default)]
    pub session_id: Option<u64>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StartSessionRequest {
    pub workout_id: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StartedSession {
    pub session_id: u64,
    pub started_at: DateTime<Utc>,
}
