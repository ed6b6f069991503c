//! Data preparation for instance rows.
//!
//! Pure transformations from the parsed history into the values stored on
//! workout and set instances: volume totals, split-session end dates and the
//! dense warmup-first set numbering.

use crate::models::{CorrelatedWorkout, ParsedExercise, ParsedSet};
use chrono::NaiveDate;

/// A parsed set with its stored position inside the exercise instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberedSet<'a> {
    pub set_number: i32,
    pub is_warmup: bool,
    pub set: &'a ParsedSet,
}

/// Number an exercise's sets densely from 1: every warmup set first, then
/// every working set, each group in its recorded order.
pub fn numbered_sets(exercise: &ParsedExercise) -> Vec<NumberedSet<'_>> {
    let warmups = exercise.warmup_sets.iter().map(|set| (true, set));
    let working = exercise.working_sets.iter().map(|set| (false, set));

    warmups
        .chain(working)
        .enumerate()
        .map(|(index, (is_warmup, set))| NumberedSet {
            set_number: index as i32 + 1,
            is_warmup,
            set,
        })
        .collect()
}

/// Total lifted volume over warmup and working sets, `round(Σ weight × reps)`.
pub fn workout_volume(exercises: &[ParsedExercise]) -> i64 {
    let total: f64 = exercises
        .iter()
        .flat_map(|exercise| exercise.warmup_sets.iter().chain(&exercise.working_sets))
        .map(|set| set.weight * f64::from(set.reps))
        .sum();

    total.round() as i64
}

/// End date of a session spread over several days, if it was.
///
/// A parsed end date only counts when it falls after the scheduled date;
/// otherwise the latest per-exercise performed date after the scheduled date
/// marks the split.
pub fn split_end_date(workout: &CorrelatedWorkout) -> Option<NaiveDate> {
    let latest_performed = workout
        .exercises
        .iter()
        .filter_map(|exercise| exercise.performed_date)
        .filter(|date| *date > workout.scheduled_date)
        .max();

    match workout.end_date {
        Some(end) if end > workout.scheduled_date => {
            Some(latest_performed.map_or(end, |performed| performed.max(end)))
        }
        _ => latest_performed,
    }
}

/// Whether any exercise in a split session carries its own performed date.
pub fn has_distinct_performed_date(workout: &CorrelatedWorkout) -> bool {
    workout
        .exercises
        .iter()
        .filter_map(|exercise| exercise.performed_date)
        .any(|date| date != workout.scheduled_date)
}
