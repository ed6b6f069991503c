//! Fixed program cadence and prescription scheme.
//!
//! The program runs 3 cycles of 4 micro-cycles. Each micro-cycle spans 8
//! calendar days: 6 training days followed by 2 rest days, and rest days have
//! no template. Week numbers are program-global (1..=12), one per micro-cycle.

use crate::models::WorkoutType;

pub const CYCLE_COUNT: i32 = 3;
pub const MICRO_CYCLES_PER_CYCLE: i32 = 4;
pub const TRAINING_DAYS_PER_MICRO_CYCLE: i32 = 6;
pub const REST_DAYS_PER_MICRO_CYCLE: i32 = 2;
pub const DAYS_PER_MICRO_CYCLE: i32 = TRAINING_DAYS_PER_MICRO_CYCLE + REST_DAYS_PER_MICRO_CYCLE;
pub const DAYS_PER_CYCLE: i32 = DAYS_PER_MICRO_CYCLE * MICRO_CYCLES_PER_CYCLE;
pub const PROGRAM_WEEKS: i32 = CYCLE_COUNT * MICRO_CYCLES_PER_CYCLE;
pub const PROGRAM_DURATION_DAYS: i32 = DAYS_PER_CYCLE * CYCLE_COUNT;
pub const WORKOUTS_PER_CYCLE: i32 = TRAINING_DAYS_PER_MICRO_CYCLE * MICRO_CYCLES_PER_CYCLE;

/// Target sets for template exercises added on the fly during instance import.
pub const AD_HOC_TARGET_SETS: i32 = 4;

pub const MAX_TEST_NOTE: &str = "MAX test";

/// Sets and rep range prescribed for one micro-cycle position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescription {
    pub sets: i32,
    pub reps_min: i32,
    pub reps_max: i32,
}

impl Prescription {
    const fn new(sets: i32, reps_min: i32, reps_max: i32) -> Self {
        Self {
            sets,
            reps_min,
            reps_max,
        }
    }
}

const STRENGTH_SCHEME: [Prescription; 4] = [
    Prescription::new(4, 6, 8),
    Prescription::new(5, 4, 6),
    Prescription::new(6, 3, 5),
    Prescription::new(3, 1, 3),
];

const HYPERTROPHY_SCHEME: [Prescription; 4] = [
    Prescription::new(3, 10, 12),
    Prescription::new(4, 8, 12),
    Prescription::new(5, 8, 10),
    Prescription::new(3, 12, 15),
];

/// Scheme row for a workout type at micro-cycle position 1..=4.
///
/// Positions outside that range are clamped into it.
pub fn prescription(workout_type: WorkoutType, micro_cycle: i32) -> Prescription {
    let index = (micro_cycle.clamp(1, MICRO_CYCLES_PER_CYCLE) - 1) as usize;
    match workout_type {
        WorkoutType::Strength => STRENGTH_SCHEME[index],
        WorkoutType::Hypertrophy => HYPERTROPHY_SCHEME[index],
    }
}

/// Odd training days are Strength sessions, even days Hypertrophy.
pub fn workout_type_for_day(day_number: i32) -> WorkoutType {
    if day_number % 2 == 1 {
        WorkoutType::Strength
    } else {
        WorkoutType::Hypertrophy
    }
}

pub fn cycle_for_week(week_number: i32) -> i32 {
    (week_number - 1) / MICRO_CYCLES_PER_CYCLE + 1
}

pub fn micro_cycle_for_week(week_number: i32) -> i32 {
    (week_number - 1) % MICRO_CYCLES_PER_CYCLE + 1
}

/// First program-global week of a cycle.
pub fn first_week_of_cycle(cycle_number: i32) -> i32 {
    (cycle_number - 1) * MICRO_CYCLES_PER_CYCLE + 1
}

pub fn weeks_of_cycle(cycle_number: i32) -> impl Iterator<Item = i32> {
    let first = first_week_of_cycle(cycle_number);
    first..first + MICRO_CYCLES_PER_CYCLE
}

pub fn is_max_test_week(week_number: i32) -> bool {
    micro_cycle_for_week(week_number) == MICRO_CYCLES_PER_CYCLE
}

/// Cycle numbers a run may cover.
pub fn is_program_cycle(cycle_number: i32) -> bool {
    (1..=CYCLE_COUNT).contains(&cycle_number)
}

pub fn is_template_slot(week_number: i32, day_number: i32) -> bool {
    (1..=PROGRAM_WEEKS).contains(&week_number)
        && (1..=TRAINING_DAYS_PER_MICRO_CYCLE).contains(&day_number)
}

/// Template workout name, e.g. `Week 3 Day 2 - Hypertrophy`.
pub fn workout_name(week_number: i32, day_number: i32, workout_type: WorkoutType) -> String {
    format!(
        "Week {} Day {} - {}",
        week_number,
        day_number,
        workout_type.label()
    )
}
