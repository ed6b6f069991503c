//! PostgreSQL-backed [`ImportStore`].
//!
//! Every insert other than the exercise catalogue uses `ON CONFLICT DO NOTHING
//! RETURNING id`, so a natural-key collision comes back as an empty result and
//! is reported as [`StoreError::Conflict`]. Exercise inserts are plain inserts;
//! a unique violation (`23505`) from a concurrent writer is mapped to the same
//! error so the resolver can re-query by slug.

use super::{ImportStore, StoreError, StoreResult};
use crate::models::{
    NewCycle, NewExercise, NewExerciseInstance, NewProgram, NewProgramInstance,
    NewProgramWorkout, NewProgression, NewSetInstance, NewWorkoutExercise, NewWorkoutInstance,
    RecordId, WorkoutExerciseSlot, WorkoutInstanceRow,
};
use sqlx::PgPool;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

/// Import store over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn insert_error(err: sqlx::Error, entity: &'static str, key: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::conflict(entity, key)
        }
        _ => StoreError::Database(err),
    }
}

fn inserted(id: Option<Uuid>, entity: &'static str, key: String) -> StoreResult<RecordId> {
    id.ok_or_else(|| StoreError::conflict(entity, key))
}

impl ImportStore for PgStore {
    async fn find_exercise_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM exercises WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_exercise(&self, exercise: &NewExercise) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO exercises (name, slug, description, created_by)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&exercise.name)
        .bind(&exercise.slug)
        .bind(&exercise.description)
        .bind(&exercise.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "exercise", format!("slug {}", exercise.slug)))?;

        log::trace!("inserted exercise {} ({})", exercise.slug, id);
        Ok(id)
    }

    async fn find_program_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM program_templates WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_program(&self, program: &NewProgram) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO program_templates (
                   title, slug, duration_days, cycle_count, weeks_per_cycle,
                   training_days_per_week, rest_days_per_week
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (slug) DO NOTHING
               RETURNING id"#,
        )
        .bind(&program.title)
        .bind(&program.slug)
        .bind(program.duration_days)
        .bind(program.cycle_count)
        .bind(program.weeks_per_cycle)
        .bind(program.training_days_per_week)
        .bind(program.rest_days_per_week)
        .fetch_optional(&self.pool)
        .await?;

        inserted(id, "program", format!("slug {}", program.slug))
    }

    async fn find_cycle(
        &self,
        program_id: RecordId,
        cycle_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM program_cycles WHERE program_id = $1 AND cycle_number = $2",
        )
        .bind(program_id)
        .bind(cycle_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_cycle(&self, cycle: &NewCycle) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO program_cycles (program_id, cycle_number, duration_days)
               VALUES ($1, $2, $3)
               ON CONFLICT (program_id, cycle_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(cycle.program_id)
        .bind(cycle.cycle_number)
        .bind(cycle.duration_days)
        .fetch_optional(&self.pool)
        .await?;

        inserted(id, "cycle", format!("cycle {}", cycle.cycle_number))
    }

    async fn find_program_workout(
        &self,
        program_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM program_workouts
               WHERE program_id = $1 AND week_number = $2 AND day_number = $3"#,
        )
        .bind(program_id)
        .bind(week_number)
        .bind(day_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_program_workout(&self, workout: &NewProgramWorkout) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO program_workouts (
                   program_id, cycle_id, week_number, day_number, workout_type, name
               )
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (program_id, week_number, day_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(workout.program_id)
        .bind(workout.cycle_id)
        .bind(workout.week_number)
        .bind(workout.day_number)
        .bind(workout.workout_type)
        .bind(&workout.name)
        .fetch_optional(&self.pool)
        .await?;

        inserted(
            id,
            "program workout",
            format!("week {} day {}", workout.week_number, workout.day_number),
        )
    }

    async fn find_workout_exercise_by_exercise(
        &self,
        program_workout_id: RecordId,
        exercise_id: RecordId,
        order_hint: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM program_workout_exercises
               WHERE program_workout_id = $1 AND exercise_id = $2
               ORDER BY (exercise_order = $3) DESC, exercise_order ASC
               LIMIT 1"#,
        )
        .bind(program_workout_id)
        .bind(exercise_id)
        .bind(order_hint)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_workout_exercise_by_order(
        &self,
        program_workout_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<WorkoutExerciseSlot>> {
        let slot = sqlx::query_as::<_, WorkoutExerciseSlot>(
            r#"SELECT id, exercise_id, is_ad_hoc FROM program_workout_exercises
               WHERE program_workout_id = $1 AND exercise_order = $2"#,
        )
        .bind(program_workout_id)
        .bind(exercise_order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(slot)
    }

    async fn max_workout_exercise_order(
        &self,
        program_workout_id: RecordId,
    ) -> StoreResult<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(exercise_order) FROM program_workout_exercises WHERE program_workout_id = $1",
        )
        .bind(program_workout_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(max)
    }

    async fn insert_workout_exercise(
        &self,
        workout_exercise: &NewWorkoutExercise,
    ) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO program_workout_exercises (
                   program_workout_id, exercise_id, exercise_order,
                   target_sets, target_reps_min, target_reps_max, is_ad_hoc
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (program_workout_id, exercise_order) DO NOTHING
               RETURNING id"#,
        )
        .bind(workout_exercise.program_workout_id)
        .bind(workout_exercise.exercise_id)
        .bind(workout_exercise.exercise_order)
        .bind(workout_exercise.target_sets)
        .bind(workout_exercise.target_reps_min)
        .bind(workout_exercise.target_reps_max)
        .bind(workout_exercise.is_ad_hoc)
        .fetch_optional(&self.pool)
        .await?;

        inserted(
            id,
            "program workout exercise",
            format!("order {}", workout_exercise.exercise_order),
        )
    }

    async fn find_progression(
        &self,
        program_workout_exercise_id: RecordId,
        week_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM progressions
               WHERE program_workout_exercise_id = $1 AND week_number = $2"#,
        )
        .bind(program_workout_exercise_id)
        .bind(week_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_progression(&self, progression: &NewProgression) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO progressions (
                   program_workout_exercise_id, week_number, volume_sets,
                   reps_min, reps_max, notes
               )
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (program_workout_exercise_id, week_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(progression.program_workout_exercise_id)
        .bind(progression.week_number)
        .bind(progression.volume_sets)
        .bind(progression.reps_min)
        .bind(progression.reps_max)
        .bind(&progression.notes)
        .fetch_optional(&self.pool)
        .await?;

        inserted(id, "progression", format!("week {}", progression.week_number))
    }

    async fn find_program_instance(
        &self,
        user_id: Uuid,
        program_id: RecordId,
        instance_name: &str,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM program_instances
               WHERE user_id = $1 AND program_id = $2 AND instance_name = $3"#,
        )
        .bind(user_id)
        .bind(program_id)
        .bind(instance_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_program_instance(
        &self,
        instance: &NewProgramInstance,
    ) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO program_instances (
                   user_id, program_id, instance_name, start_date, end_date,
                   expected_end_date, status, total_workouts
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (user_id, program_id, instance_name) DO NOTHING
               RETURNING id"#,
        )
        .bind(instance.user_id)
        .bind(instance.program_id)
        .bind(&instance.instance_name)
        .bind(instance.start_date)
        .bind(instance.end_date)
        .bind(instance.expected_end_date)
        .bind(instance.status)
        .bind(instance.total_workouts)
        .fetch_optional(&self.pool)
        .await?;

        inserted(id, "program instance", instance.instance_name.clone())
    }

    async fn find_workout_instance(
        &self,
        program_instance_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<WorkoutInstanceRow>> {
        let row = sqlx::query_as::<_, WorkoutInstanceRow>(
            r#"SELECT id, total_volume_lbs FROM workout_instances
               WHERE program_instance_id = $1 AND week_number = $2 AND day_number = $3"#,
        )
        .bind(program_instance_id)
        .bind(week_number)
        .bind(day_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_workout_instance(
        &self,
        workout: &NewWorkoutInstance,
    ) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO workout_instances (
                   program_instance_id, program_workout_id, week_number, day_number,
                   scheduled_date, end_date, status, total_volume_lbs
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (program_instance_id, week_number, day_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(workout.program_instance_id)
        .bind(workout.program_workout_id)
        .bind(workout.week_number)
        .bind(workout.day_number)
        .bind(workout.scheduled_date)
        .bind(workout.end_date)
        .bind(workout.status)
        .bind(workout.total_volume_lbs)
        .fetch_optional(&self.pool)
        .await?;

        inserted(
            id,
            "workout instance",
            format!("week {} day {}", workout.week_number, workout.day_number),
        )
    }

    async fn update_workout_volume(
        &self,
        workout_instance_id: RecordId,
        total_volume_lbs: i64,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE workout_instances SET total_volume_lbs = $1 WHERE id = $2")
            .bind(total_volume_lbs)
            .bind(workout_instance_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_exercise_instance(
        &self,
        workout_instance_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM exercise_instances
               WHERE workout_instance_id = $1 AND exercise_order = $2"#,
        )
        .bind(workout_instance_id)
        .bind(exercise_order)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_exercise_instance(
        &self,
        exercise: &NewExerciseInstance,
    ) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO exercise_instances (
                   workout_instance_id, program_workout_exercise_id, exercise_id,
                   exercise_order, status, notes, performed_date
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (workout_instance_id, exercise_order) DO NOTHING
               RETURNING id"#,
        )
        .bind(exercise.workout_instance_id)
        .bind(exercise.program_workout_exercise_id)
        .bind(exercise.exercise_id)
        .bind(exercise.exercise_order)
        .bind(exercise.status)
        .bind(&exercise.notes)
        .bind(exercise.performed_date)
        .fetch_optional(&self.pool)
        .await?;

        inserted(
            id,
            "exercise instance",
            format!("order {}", exercise.exercise_order),
        )
    }

    async fn find_set_instance(
        &self,
        exercise_instance_id: RecordId,
        set_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM set_instances
               WHERE exercise_instance_id = $1 AND set_number = $2"#,
        )
        .bind(exercise_instance_id)
        .bind(set_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_set_instance(&self, set: &NewSetInstance) -> StoreResult<RecordId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO set_instances (
                   exercise_instance_id, set_number, reps, weight_lbs,
                   is_warmup, difficulty, increase_next
               )
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (exercise_instance_id, set_number) DO NOTHING
               RETURNING id"#,
        )
        .bind(set.exercise_instance_id)
        .bind(set.set_number)
        .bind(set.reps)
        .bind(set.weight_lbs)
        .bind(set.is_warmup)
        .bind(set.difficulty)
        .bind(set.increase_next)
        .fetch_optional(&self.pool)
        .await?;

        inserted(id, "set instance", format!("set {}", set.set_number))
    }

    async fn count_completed_workouts(&self, program_instance_id: RecordId) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM workout_instances
               WHERE program_instance_id = $1 AND status = 'completed'"#,
        )
        .bind(program_instance_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update_workouts_completed(
        &self,
        program_instance_id: RecordId,
        workouts_completed: i32,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE program_instances SET workouts_completed = $1 WHERE id = $2")
            .bind(workouts_completed)
            .bind(program_instance_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
