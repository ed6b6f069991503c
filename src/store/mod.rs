//! Persistence seam for the history import.
//!
//! The import pipeline only ever needs two kinds of operation against the
//! relational store: point lookups by natural key and single-row inserts, plus
//! the two aggregate rewrites (`total_volume_lbs`, `workouts_completed`). The
//! [`ImportStore`] trait captures exactly that surface so the pipeline can run
//! against PostgreSQL ([`PgStore`]) or an in-process table set ([`MemoryStore`])
//! for dry runs and tests.
//!
//! Inserts report a natural-key collision as [`StoreError::Conflict`] rather
//! than silently succeeding, so callers can tell a concurrent writer apart from
//! a fresh row.

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore, RowCounts};
pub use postgres::PgStore;

use crate::models::{
    NewCycle, NewExercise, NewExerciseInstance, NewProgram, NewProgramInstance,
    NewProgramWorkout, NewProgression, NewSetInstance, NewWorkoutExercise, NewWorkoutInstance,
    RecordId, WorkoutExerciseSlot, WorkoutInstanceRow,
};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by an [`ImportStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} already exists for {key}")]
    Conflict { entity: &'static str, key: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity,
            key: key.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Natural-key lookups and single-row inserts for every imported entity.
#[allow(async_fn_in_trait)]
pub trait ImportStore {
    // Exercises
    async fn find_exercise_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>>;
    async fn insert_exercise(&self, exercise: &NewExercise) -> StoreResult<RecordId>;

    // Template hierarchy
    async fn find_program_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>>;
    async fn insert_program(&self, program: &NewProgram) -> StoreResult<RecordId>;

    async fn find_cycle(&self, program_id: RecordId, cycle_number: i32)
    -> StoreResult<Option<RecordId>>;
    async fn insert_cycle(&self, cycle: &NewCycle) -> StoreResult<RecordId>;

    async fn find_program_workout(
        &self,
        program_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<RecordId>>;
    async fn insert_program_workout(&self, workout: &NewProgramWorkout) -> StoreResult<RecordId>;

    /// Template exercise bound to `exercise_id`, preferring the one at
    /// `order_hint` when the exercise appears more than once in the workout.
    async fn find_workout_exercise_by_exercise(
        &self,
        program_workout_id: RecordId,
        exercise_id: RecordId,
        order_hint: i32,
    ) -> StoreResult<Option<RecordId>>;
    async fn find_workout_exercise_by_order(
        &self,
        program_workout_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<WorkoutExerciseSlot>>;
    async fn max_workout_exercise_order(
        &self,
        program_workout_id: RecordId,
    ) -> StoreResult<Option<i32>>;
    async fn insert_workout_exercise(
        &self,
        workout_exercise: &NewWorkoutExercise,
    ) -> StoreResult<RecordId>;

    async fn find_progression(
        &self,
        program_workout_exercise_id: RecordId,
        week_number: i32,
    ) -> StoreResult<Option<RecordId>>;
    async fn insert_progression(&self, progression: &NewProgression) -> StoreResult<RecordId>;

    // Instances
    async fn find_program_instance(
        &self,
        user_id: Uuid,
        program_id: RecordId,
        instance_name: &str,
    ) -> StoreResult<Option<RecordId>>;
    async fn insert_program_instance(
        &self,
        instance: &NewProgramInstance,
    ) -> StoreResult<RecordId>;

    async fn find_workout_instance(
        &self,
        program_instance_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<WorkoutInstanceRow>>;
    async fn insert_workout_instance(
        &self,
        workout: &NewWorkoutInstance,
    ) -> StoreResult<RecordId>;
    async fn update_workout_volume(
        &self,
        workout_instance_id: RecordId,
        total_volume_lbs: i64,
    ) -> StoreResult<()>;

    async fn find_exercise_instance(
        &self,
        workout_instance_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<RecordId>>;
    async fn insert_exercise_instance(
        &self,
        exercise: &NewExerciseInstance,
    ) -> StoreResult<RecordId>;

    async fn find_set_instance(
        &self,
        exercise_instance_id: RecordId,
        set_number: i32,
    ) -> StoreResult<Option<RecordId>>;
    async fn insert_set_instance(&self, set: &NewSetInstance) -> StoreResult<RecordId>;

    // Aggregates
    async fn count_completed_workouts(&self, program_instance_id: RecordId) -> StoreResult<i64>;
    async fn update_workouts_completed(
        &self,
        program_instance_id: RecordId,
        workouts_completed: i32,
    ) -> StoreResult<()>;
}
