use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier shared by every persisted record.
pub type RecordId = Uuid;

// ===== Enumerations =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "workout_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Strength,
    Hypertrophy,
}

impl WorkoutType {
    pub fn label(self) -> &'static str {
        match self {
            WorkoutType::Strength => "Strength",
            WorkoutType::Hypertrophy => "Hypertrophy",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "workout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    Pending,
    #[default]
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "exercise_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExerciseStatus {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "program_instance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Active,
    Completed,
}

// ===== Parsed History (produced by the log parser) =====

/// One historical run through the program, as emitted by the log parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInstanceData {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_ongoing: bool,
    /// Program cycles this run covered, e.g. `[1, 2]`.
    pub cycles: Vec<i32>,
    #[serde(default)]
    pub workouts: Vec<ParsedWorkout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedWorkout {
    pub scheduled_date: NaiveDate,
    /// Last day of a session that was spread across several calendar days.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: WorkoutStatus,
    /// Program-global week, when the parser could read it from the log.
    #[serde(default)]
    pub week_number: Option<i32>,
    #[serde(default)]
    pub day_number: Option<i32>,
    #[serde(default)]
    pub exercises: Vec<ParsedExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExercise {
    pub name: String,
    pub order: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub performed_date: Option<NaiveDate>,
    #[serde(default)]
    pub warmup_sets: Vec<ParsedSet>,
    #[serde(default)]
    pub working_sets: Vec<ParsedSet>,
}

impl ParsedExercise {
    pub fn has_sets(&self) -> bool {
        !self.warmup_sets.is_empty() || !self.working_sets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSet {
    pub reps: i32,
    pub weight: f64,
    #[serde(default)]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub increase_weight: bool,
}

// ===== Correlated View =====

/// A historical workout placed on the program's week/day grid.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedWorkout {
    pub week_number: i32,
    pub day_number: i32,
    pub scheduled_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: WorkoutStatus,
    pub exercises: Vec<ParsedExercise>,
}

// ===== Insert Payloads =====

#[derive(Debug, Clone)]
pub struct NewExercise {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProgram {
    pub title: String,
    pub slug: String,
    pub duration_days: i32,
    pub cycle_count: i32,
    pub weeks_per_cycle: i32,
    pub training_days_per_week: i32,
    pub rest_days_per_week: i32,
}

#[derive(Debug, Clone)]
pub struct NewCycle {
    pub program_id: RecordId,
    pub cycle_number: i32,
    pub duration_days: i32,
}

#[derive(Debug, Clone)]
pub struct NewProgramWorkout {
    pub program_id: RecordId,
    pub cycle_id: RecordId,
    pub week_number: i32,
    pub day_number: i32,
    pub workout_type: WorkoutType,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutExercise {
    pub program_workout_id: RecordId,
    pub exercise_id: RecordId,
    pub exercise_order: i32,
    pub target_sets: i32,
    pub target_reps_min: i32,
    pub target_reps_max: i32,
    pub is_ad_hoc: bool,
}

#[derive(Debug, Clone)]
pub struct NewProgression {
    pub program_workout_exercise_id: RecordId,
    pub week_number: i32,
    pub volume_sets: i32,
    pub reps_min: i32,
    pub reps_max: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProgramInstance {
    pub user_id: Uuid,
    pub program_id: RecordId,
    pub instance_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub expected_end_date: NaiveDate,
    pub status: InstanceStatus,
    pub total_workouts: i32,
}

#[derive(Debug, Clone)]
pub struct NewWorkoutInstance {
    pub program_instance_id: RecordId,
    pub program_workout_id: RecordId,
    pub week_number: i32,
    pub day_number: i32,
    pub scheduled_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: WorkoutStatus,
    pub total_volume_lbs: i64,
}

#[derive(Debug, Clone)]
pub struct NewExerciseInstance {
    pub workout_instance_id: RecordId,
    pub program_workout_exercise_id: RecordId,
    pub exercise_id: RecordId,
    pub exercise_order: i32,
    pub status: ExerciseStatus,
    pub notes: Option<String>,
    pub performed_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewSetInstance {
    pub exercise_instance_id: RecordId,
    pub set_number: i32,
    pub reps: i32,
    pub weight_lbs: f64,
    pub is_warmup: bool,
    pub difficulty: Option<i32>,
    pub increase_next: bool,
}

// ===== Lookup Rows =====

/// A template exercise slot as seen by position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct WorkoutExerciseSlot {
    pub id: RecordId,
    pub exercise_id: Option<RecordId>,
    pub is_ad_hoc: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct WorkoutInstanceRow {
    pub id: RecordId,
    pub total_volume_lbs: i64,
}
