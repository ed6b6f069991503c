//! Placing historical workouts on the program grid.
//!
//! Two pieces live here. A [`WorkoutCorrelator`] turns one parsed run into
//! workouts keyed by program week and day; [`CadenceCorrelator`] is the
//! default. [`SlotAssignments`] then collects, across all runs, which
//! exercises occupy which template slot.

use crate::import::normalize::exercise_slug;
use crate::import::schedule::{
    TRAINING_DAYS_PER_MICRO_CYCLE, first_week_of_cycle, is_program_cycle, is_template_slot,
};
use crate::import::stats::ImportStats;
use crate::models::{CorrelatedWorkout, ParsedWorkout, ProgramInstanceData};
use std::collections::{BTreeMap, HashSet};

/// Maps one run's parsed workouts onto program weeks and days.
pub trait WorkoutCorrelator {
    fn build_workouts(&self, instance: &ProgramInstanceData) -> Vec<CorrelatedWorkout>;
}

/// Assigns workouts to consecutive training slots in date order.
///
/// Week/day hints read by the parser win; unhinted workouts take the next
/// free slot after the previous workout, starting from the first week of the
/// earliest cycle the run covers. Rest days never receive a workout.
///
/// Hints that fall outside the grid are passed through untouched and leave
/// the cursor where it was. Two hints naming the same slot are both kept;
/// the instance import reports and drops the later one.
#[derive(Debug, Default, Clone, Copy)]
pub struct CadenceCorrelator;

fn slot_index(week_number: i32, day_number: i32) -> i32 {
    (week_number - 1) * TRAINING_DAYS_PER_MICRO_CYCLE + (day_number - 1)
}

fn slot_at(index: i32) -> (i32, i32) {
    (
        index / TRAINING_DAYS_PER_MICRO_CYCLE + 1,
        index % TRAINING_DAYS_PER_MICRO_CYCLE + 1,
    )
}

impl WorkoutCorrelator for CadenceCorrelator {
    fn build_workouts(&self, instance: &ProgramInstanceData) -> Vec<CorrelatedWorkout> {
        let first_cycle = instance
            .cycles
            .iter()
            .copied()
            .filter(|cycle| is_program_cycle(*cycle))
            .min()
            .unwrap_or(1);
        let mut cursor = slot_index(first_week_of_cycle(first_cycle), 1);
        let mut claimed: HashSet<i32> = HashSet::new();

        let mut ordered: Vec<&ParsedWorkout> = instance.workouts.iter().collect();
        ordered.sort_by_key(|workout| workout.scheduled_date);

        ordered
            .into_iter()
            .map(|workout| {
                let (week_number, day_number) = match (workout.week_number, workout.day_number) {
                    (Some(week), Some(day)) if is_template_slot(week, day) => {
                        let index = slot_index(week, day);
                        claimed.insert(index);
                        cursor = index + 1;
                        (week, day)
                    }
                    (Some(week), Some(day)) if week >= 1 && day >= 1 => (week, day),
                    _ => {
                        while claimed.contains(&cursor) {
                            cursor += 1;
                        }
                        claimed.insert(cursor);
                        let slot = slot_at(cursor);
                        cursor += 1;
                        slot
                    }
                };

                let mut exercises = workout.exercises.clone();
                exercises.sort_by_key(|exercise| exercise.order);

                CorrelatedWorkout {
                    week_number,
                    day_number,
                    scheduled_date: workout.scheduled_date,
                    end_date: workout.end_date,
                    status: workout.status,
                    exercises,
                }
            })
            .collect()
    }
}

/// One exercise placed in a template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotExercise {
    pub exercise_name: String,
    pub order: i32,
}

#[derive(Debug)]
struct SlotClaim {
    run_name: String,
    exercises: Vec<SlotExercise>,
}

/// Canonical `(week, day) → exercises` assignment shared by every run.
///
/// The template is a single program-wide structure, so the first run to show
/// exercises for a slot defines it and later runs never overwrite it. A later
/// run that disagrees is reported as a warning.
#[derive(Debug, Default)]
pub struct SlotAssignments {
    slots: BTreeMap<(i32, i32), SlotClaim>,
}

impl SlotAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one run's workouts. Returns how many slots this run claimed.
    pub fn observe(
        &mut self,
        run_name: &str,
        workouts: &[CorrelatedWorkout],
        stats: &mut ImportStats,
    ) -> usize {
        let mut claimed = 0;
        let mut seen: HashSet<(i32, i32)> = HashSet::new();

        for workout in workouts {
            // off-grid workouts are reported when their instance is imported
            if workout.exercises.is_empty()
                || !is_template_slot(workout.week_number, workout.day_number)
            {
                continue;
            }

            let mut exercises: Vec<SlotExercise> = workout
                .exercises
                .iter()
                .map(|exercise| SlotExercise {
                    exercise_name: exercise.name.clone(),
                    order: exercise.order,
                })
                .collect();
            exercises.sort_by_key(|exercise| exercise.order);

            let key = (workout.week_number, workout.day_number);
            // a run listing one slot twice is reported by the instance import
            if !seen.insert(key) {
                continue;
            }

            match self.slots.get(&key) {
                Some(claim) => {
                    if slot_signature(&claim.exercises) != slot_signature(&exercises) {
                        stats.warn(format!(
                            "week {} day {}: run \"{}\" lists [{}] but template keeps [{}] from run \"{}\"",
                            key.0,
                            key.1,
                            run_name,
                            describe(&exercises),
                            describe(&claim.exercises),
                            claim.run_name
                        ));
                    }
                }
                None => {
                    self.slots.insert(
                        key,
                        SlotClaim {
                            run_name: run_name.to_string(),
                            exercises,
                        },
                    );
                    claimed += 1;
                }
            }
        }

        log::debug!("run \"{}\" claimed {} template slots", run_name, claimed);
        claimed
    }

    /// Slots in week/day order.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &[SlotExercise])> {
        self.slots
            .iter()
            .map(|(key, claim)| (*key, claim.exercises.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn slot_signature(exercises: &[SlotExercise]) -> Vec<(i32, String)> {
    exercises
        .iter()
        .map(|exercise| (exercise.order, exercise_slug(&exercise.exercise_name)))
        .collect()
}

fn describe(exercises: &[SlotExercise]) -> String {
    exercises
        .iter()
        .map(|exercise| format!("{}:{}", exercise.order, exercise.exercise_name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedExercise, WorkoutStatus};
    use chrono::NaiveDate;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, month, day).unwrap()
    }

    fn exercise(name: &str, order: i32) -> ParsedExercise {
        ParsedExercise {
            name: name.to_string(),
            order,
            notes: None,
            performed_date: None,
            warmup_sets: vec![],
            working_sets: vec![],
        }
    }

    fn parsed(scheduled: NaiveDate, hint: Option<(i32, i32)>, names: &[&str]) -> ParsedWorkout {
        ParsedWorkout {
            scheduled_date: scheduled,
            end_date: None,
            status: WorkoutStatus::Completed,
            week_number: hint.map(|h| h.0),
            day_number: hint.map(|h| h.1),
            exercises: names
                .iter()
                .enumerate()
                .map(|(i, name)| exercise(name, i as i32 + 1))
                .collect(),
        }
    }

    fn run(cycles: Vec<i32>, workouts: Vec<ParsedWorkout>) -> ProgramInstanceData {
        ProgramInstanceData {
            name: "Run".to_string(),
            start_date: date(1, 1),
            end_date: None,
            is_ongoing: false,
            cycles,
            workouts,
        }
    }

    fn first_name(slots: &SlotAssignments, week: i32, day: i32) -> Option<String> {
        slots
            .iter()
            .find(|(key, _)| *key == (week, day))
            .map(|(_, exercises)| exercises[0].exercise_name.clone())
    }

    fn correlated(week: i32, day: i32, names: &[&str]) -> CorrelatedWorkout {
        CorrelatedWorkout {
            week_number: week,
            day_number: day,
            scheduled_date: date(1, 1),
            end_date: None,
            status: WorkoutStatus::Completed,
            exercises: names
                .iter()
                .enumerate()
                .map(|(i, name)| exercise(name, i as i32 + 1))
                .collect(),
        }
    }

    #[test]
    fn sequential_slots_skip_rest_days() {
        let workouts = (0..8)
            .map(|i| parsed(date(1, 1 + i), None, &["Squat"]))
            .collect();
        let built = CadenceCorrelator.build_workouts(&run(vec![1], workouts));

        let slots: Vec<(i32, i32)> = built.iter().map(|w| (w.week_number, w.day_number)).collect();
        assert_eq!(
            slots,
            vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (1, 6), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn later_cycles_start_at_their_first_week() {
        let built = CadenceCorrelator.build_workouts(&run(
            vec![3, 2],
            vec![parsed(date(2, 1), None, &["Squat"])],
        ));
        assert_eq!((built[0].week_number, built[0].day_number), (5, 1));
    }

    #[test]
    fn hints_override_and_move_the_cursor() {
        let built = CadenceCorrelator.build_workouts(&run(
            vec![1],
            vec![
                parsed(date(1, 3), None, &["Bench"]),
                parsed(date(1, 1), None, &["Squat"]),
                parsed(date(1, 10), Some((3, 2)), &["Row"]),
                parsed(date(1, 11), None, &["Press"]),
            ],
        ));

        let slots: Vec<(i32, i32, &str)> = built
            .iter()
            .map(|w| (w.week_number, w.day_number, w.exercises[0].name.as_str()))
            .collect();
        assert_eq!(
            slots,
            vec![(1, 1, "Squat"), (1, 2, "Bench"), (3, 2, "Row"), (3, 3, "Press")]
        );
    }

    #[test]
    fn unhinted_workouts_skip_slots_already_taken() {
        let built = CadenceCorrelator.build_workouts(&run(
            vec![1],
            vec![
                parsed(date(1, 1), Some((1, 2)), &["Squat"]),
                parsed(date(1, 2), Some((1, 1)), &["Bench"]),
                parsed(date(1, 3), None, &["Row"]),
            ],
        ));

        let slots: Vec<(i32, i32)> = built.iter().map(|w| (w.week_number, w.day_number)).collect();
        assert_eq!(slots, vec![(1, 2), (1, 1), (1, 3)]);
    }

    #[test]
    fn out_of_range_input_does_not_move_the_cursor() {
        let built = CadenceCorrelator.build_workouts(&run(
            vec![100_000_000, 2],
            vec![
                parsed(date(1, 1), None, &["Squat"]),
                parsed(date(1, 2), Some((i32::MAX, i32::MAX)), &["Bench"]),
                parsed(date(1, 3), None, &["Row"]),
            ],
        ));

        let slots: Vec<(i32, i32)> = built.iter().map(|w| (w.week_number, w.day_number)).collect();
        assert_eq!(slots, vec![(5, 1), (i32::MAX, i32::MAX), (5, 2)]);
    }

    #[test]
    fn repeated_slot_within_a_run_is_not_a_disagreement() {
        let mut stats = ImportStats::default();
        let mut slots = SlotAssignments::new();

        let claimed = slots.observe(
            "A",
            &[correlated(1, 2, &["Squat"]), correlated(1, 2, &["Deadlift"])],
            &mut stats,
        );

        assert_eq!(claimed, 1);
        assert_eq!(first_name(&slots, 1, 2).as_deref(), Some("Squat"));
        assert!(stats.warnings.is_empty());
    }

    #[test]
    fn first_run_wins_each_slot() {
        let mut stats = ImportStats::default();
        let mut slots = SlotAssignments::new();

        let claimed_a = slots.observe("A", &[correlated(1, 1, &["Squat", "Bench"])], &mut stats);
        let claimed_b = slots.observe(
            "B",
            &[correlated(1, 1, &["squat", "bench"]), correlated(1, 2, &["Row"])],
            &mut stats,
        );

        assert_eq!(claimed_a, 1);
        assert_eq!(claimed_b, 1);
        assert_eq!(slots.len(), 2);
        assert_eq!(first_name(&slots, 1, 1).as_deref(), Some("Squat"));
        // same slugs in the same order are not a disagreement
        assert!(stats.warnings.is_empty());
    }

    #[test]
    fn disagreement_is_flagged_not_resolved() {
        let mut stats = ImportStats::default();
        let mut slots = SlotAssignments::new();

        slots.observe("A", &[correlated(5, 1, &["Bench Press"])], &mut stats);
        slots.observe("B", &[correlated(5, 1, &["Incline Press"])], &mut stats);

        assert_eq!(first_name(&slots, 5, 1).as_deref(), Some("Bench Press"));
        assert_eq!(stats.warnings.len(), 1);
        assert!(stats.warnings[0].contains("week 5 day 1"));
        assert!(stats.warnings[0].contains("Incline Press"));
    }

    #[test]
    fn empty_workouts_do_not_claim_slots() {
        let mut stats = ImportStats::default();
        let mut slots = SlotAssignments::new();

        slots.observe("A", &[correlated(2, 3, &[])], &mut stats);
        slots.observe("B", &[correlated(2, 3, &["Lunge"])], &mut stats);

        assert_eq!(first_name(&slots, 2, 3).as_deref(), Some("Lunge"));
    }

    #[test]
    fn off_grid_workouts_do_not_claim_slots() {
        let mut stats = ImportStats::default();
        let mut slots = SlotAssignments::new();

        let claimed = slots.observe("A", &[correlated(13, 1, &["Squat"])], &mut stats);

        assert_eq!(claimed, 0);
        assert!(slots.is_empty());
    }
}
