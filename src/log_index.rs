use crate::models::SetLog;

/// Which log to pick when one (exercise, set) slot was logged more than once,
/// e.g. after a double-clicked or retried submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// First match in source order.
    #[default]
    FirstWins,
    /// Most recent `logged_at`; the later entry wins a tie.
    LatestWins,
}

pub struct LogIndex<'a> {
    logs: &'a [SetLog],
    policy: DuplicatePolicy,
}

impl<'a> LogIndex<'a> {
    pub fn new(logs: &'a [SetLog], policy: DuplicatePolicy) -> Self {
        Self { logs, policy }
    }

    pub fn find(&self, exercise_id: u64, set_number: u32) -> Option<&'a SetLog> {
        let mut matches = self
            .logs
            .iter()
            .filter(|log| log.exercise_id == exercise_id)
            .filter(|log| log.set_number == set_number);

        match self.policy {
            DuplicatePolicy::FirstWins => matches.next(),
            DuplicatePolicy::LatestWins => matches.fold(None, |best: Option<&'a SetLog>, log| match best {
                Some(b) if b.logged_at > log.logged_at => Some(b),
                _ => Some(log),
            }),
        }
    }

    /// Slots holding more than one log, in first-seen order.
    pub fn duplicates(&self) -> Vec<(u64, u32)> {
        let mut seen: Vec<(u64, u32)> = Vec::new();
        let mut dups: Vec<(u64, u32)> = Vec::new();
        for log in self.logs {
            let slot = (log.exercise_id, log.set_number);
            if seen.contains(&slot) {
                if !dups.contains(&slot) {
                    dups.push(slot);
                }
            } else {
                seen.push(slot);
            }
        }
        dups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn log(exercise_id: u64, set_number: u32, reps: u32, minute: u32) -> SetLog {
        SetLog {
            log_id: None,
            exercise_id,
            set_number,
            reps_completed: reps,
            weight_used: 40.0,
            logged_at: Utc.with_ymd_and_hms(2025, 1, 12, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn finds_by_exercise_and_set() {
        let logs = vec![log(1, 1, 10, 0), log(2, 1, 8, 1), log(2, 2, 7, 2)];
        let index = LogIndex::new(&logs, DuplicatePolicy::FirstWins);

        assert_eq!(index.find(2, 2).map(|l| l.reps_completed), Some(7));
        assert_eq!(index.find(1, 1).map(|l| l.reps_completed), Some(10));
        assert!(index.find(1, 2).is_none());
        assert!(index.find(3, 1).is_none());
    }

    #[test]
    fn first_wins_takes_source_order() {
        let logs = vec![log(1, 1, 5, 30), log(1, 1, 9, 10)];
        let index = LogIndex::new(&logs, DuplicatePolicy::FirstWins);
        assert_eq!(index.find(1, 1).map(|l| l.reps_completed), Some(5));
    }

    #[test]
    fn latest_wins_takes_newest_timestamp() {
        let logs = vec![log(1, 1, 5, 30), log(1, 1, 9, 10)];
        let index = LogIndex::new(&logs, DuplicatePolicy::LatestWins);
        assert_eq!(index.find(1, 1).map(|l| l.reps_completed), Some(5));

        let logs = vec![log(1, 1, 5, 10), log(1, 1, 9, 30)];
        let index = LogIndex::new(&logs, DuplicatePolicy::LatestWins);
        assert_eq!(index.find(1, 1).map(|l| l.reps_completed), Some(9));
    }

    #[test]
    fn latest_wins_tie_goes_to_later_entry() {
        let logs = vec![log(1, 1, 5, 10), log(1, 1, 9, 10)];
        let index = LogIndex::new(&logs, DuplicatePolicy::LatestWins);
        assert_eq!(index.find(1, 1).map(|l| l.reps_completed), Some(9));
    }

    #[test]
    fn reports_duplicate_slots_once() {
        let logs = vec![log(1, 1, 5, 0), log(1, 1, 6, 1), log(1, 1, 7, 2), log(2, 1, 8, 3)];
        let index = LogIndex::new(&logs, DuplicatePolicy::FirstWins);
        assert_eq!(index.duplicates(), vec![(1, 1)]);
    }
}
