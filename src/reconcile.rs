use crate::log_index::{DuplicatePolicy, LogIndex};
use crate::models::{PlannedExercise, SetLog};

#[derive(Clone, Debug, PartialEq)]
pub struct PreviousSet {
    pub reps: u32,
    pub weight: f64,
}

/// One editable row of the logging grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridRow {
    pub set_number: u32,
    pub target_reps: u32,
    pub previous: Option<PreviousSet>,
    pub current_reps: Option<u32>,
    pub current_weight: Option<f64>,
}

impl GridRow {
    pub fn is_logged(&self) -> bool {
        self.current_reps.is_some()
    }

    /// Hint shown in an empty reps input.
    pub fn reps_placeholder(&self) -> String {
        self.current_reps.unwrap_or(self.target_reps).to_string()
    }

    pub fn weight_placeholder(&self) -> String {
        self.current_weight.map(|w| w.to_string()).unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowGroup {
    pub exercise_id: u64,
    pub exercise_name: String,
    pub rows: Vec<GridRow>,
}

impl RowGroup {
    pub fn logged_sets(&self) -> usize {
        self.rows.iter().filter(|r| r.is_logged()).count()
    }
}

/// Merges the planned sets with whatever has been logged so far. Every
/// planned set gets a row, logged or not.
pub fn reconcile(planned: &[PlannedExercise], logs: &[SetLog], policy: DuplicatePolicy) -> Vec<RowGroup> {
    let index = LogIndex::new(logs, policy);

    planned
        .iter()
        .map(|exercise| {
            let rows = (1..=exercise.sets)
                .map(|set_number| {
                    let found = index.find(exercise.exercise_id, set_number);
                    GridRow {
                        set_number,
                        target_reps: exercise.reps,
                        previous: None,
                        current_reps: found.map(|l| l.reps_completed),
                        current_weight: found.map(|l| l.weight_used),
                    }
                })
                .collect();

            RowGroup {
                exercise_id: exercise.exercise_id,
                exercise_name: exercise.name().to_string(),
                rows,
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummarySet {
    pub set_number: u32,
    pub reps_completed: u32,
    pub weight_used: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryGroup {
    pub exercise_name: String,
    pub sets: Vec<SummarySet>,
}

impl SummaryGroup {
    pub fn volume(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| s.reps_completed as f64 * s.weight_used)
            .sum()
    }
}

/// Read-only view of a finished session: every log of each planned exercise,
/// ordered by set number.
pub fn summarize(planned: &[PlannedExercise], logs: &[SetLog]) -> Vec<SummaryGroup> {
    planned
        .iter()
        .map(|exercise| {
            let mut sets: Vec<SummarySet> = logs
                .iter()
                .filter(|l| l.exercise_id == exercise.exercise_id)
                .map(|l| SummarySet {
                    set_number: l.set_number,
                    reps_completed: l.reps_completed,
                    weight_used: l.weight_used,
                })
                .collect();
            sets.sort_by_key(|s| s.set_number);

            SummaryGroup {
                exercise_name: exercise.name().to_string(),
                sets,
            }
        })
        .collect()
}
