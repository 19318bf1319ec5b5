use crate::models::{PlannedExercise, WorkoutSession};

/// Planned exercises in snapshot order. A session that is still loading, or
/// one stored without a snapshot, has nothing planned.
pub fn planned_exercises(session: Option<&WorkoutSession>) -> Vec<PlannedExercise> {
    session
        .and_then(|s| s.workout_snapshot.as_ref())
        .map(|snapshot| snapshot.exercises.clone())
        .unwrap_or_default()
}

pub fn workout_name(session: Option<&WorkoutSession>) -> Option<&str> {
    session
        .and_then(|s| s.workout_snapshot.as_ref())
        .map(|snapshot| snapshot.name.as_str())
}

/// Exercise names for a session card, comma separated.
pub fn exercise_names(session: &WorkoutSession) -> String {
    planned_exercises(Some(session))
        .iter()
        .map(|p| p.name())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
