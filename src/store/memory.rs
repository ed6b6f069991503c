//! In-process [`ImportStore`] used for `--dry-run` and tests.
//!
//! Tables are plain vectors behind a single mutex and enforce the same natural
//! keys as the PostgreSQL schema. Writes can be made to fail on demand through
//! [`FailPoint`]s, which is how partial-failure resumption is exercised.

use super::{ImportStore, StoreError, StoreResult};
use crate::models::{
    NewCycle, NewExercise, NewExerciseInstance, NewProgram, NewProgramInstance,
    NewProgramWorkout, NewProgression, NewSetInstance, NewWorkoutExercise, NewWorkoutInstance,
    RecordId, WorkoutExerciseSlot, WorkoutInstanceRow, WorkoutStatus,
};
use parking_lot::Mutex;
use uuid::Uuid;

/// A persisted row together with its store-assigned id.
#[derive(Debug, Clone)]
pub struct Stored<T> {
    pub id: RecordId,
    pub row: T,
}

/// Template exercise row; `exercise_id` is empty for open slots.
#[derive(Debug, Clone)]
pub struct WorkoutExerciseRecord {
    pub id: RecordId,
    pub program_workout_id: RecordId,
    pub exercise_id: Option<RecordId>,
    pub exercise_order: i32,
    pub target_sets: i32,
    pub target_reps_min: i32,
    pub target_reps_max: i32,
    pub is_ad_hoc: bool,
}

#[derive(Debug, Clone)]
pub struct ProgramInstanceRecord {
    pub id: RecordId,
    pub row: NewProgramInstance,
    pub workouts_completed: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub exercises: Vec<Stored<NewExercise>>,
    pub programs: Vec<Stored<NewProgram>>,
    pub cycles: Vec<Stored<NewCycle>>,
    pub program_workouts: Vec<Stored<NewProgramWorkout>>,
    pub workout_exercises: Vec<WorkoutExerciseRecord>,
    pub progressions: Vec<Stored<NewProgression>>,
    pub program_instances: Vec<ProgramInstanceRecord>,
    pub workout_instances: Vec<Stored<NewWorkoutInstance>>,
    pub exercise_instances: Vec<Stored<NewExerciseInstance>>,
    pub set_instances: Vec<Stored<NewSetInstance>>,
}

/// Row totals per table, used to assert that a re-run wrote nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub exercises: usize,
    pub programs: usize,
    pub cycles: usize,
    pub program_workouts: usize,
    pub workout_exercises: usize,
    pub progressions: usize,
    pub program_instances: usize,
    pub workout_instances: usize,
    pub exercise_instances: usize,
    pub set_instances: usize,
}

/// One-shot write failure to inject into a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailPoint {
    Program,
    Cycle(i32),
    Exercise { slug: String },
    /// Another writer creates the exercise between our lookup and our insert.
    ExerciseRace { slug: String },
    ProgramWorkout { week_number: i32, day_number: i32 },
    WorkoutExercise { exercise_order: i32 },
    ExerciseInstance { exercise_order: i32 },
    SetInstance { set_number: i32 },
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
    failures: Mutex<Vec<FailPoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a failure; it fires on the first matching write and is then spent.
    pub fn fail_once(&self, point: FailPoint) {
        self.failures.lock().push(point);
    }

    pub fn row_counts(&self) -> RowCounts {
        let tables = self.tables.lock();
        RowCounts {
            exercises: tables.exercises.len(),
            programs: tables.programs.len(),
            cycles: tables.cycles.len(),
            program_workouts: tables.program_workouts.len(),
            workout_exercises: tables.workout_exercises.len(),
            progressions: tables.progressions.len(),
            program_instances: tables.program_instances.len(),
            workout_instances: tables.workout_instances.len(),
            exercise_instances: tables.exercise_instances.len(),
            set_instances: tables.set_instances.len(),
        }
    }

    pub fn snapshot(&self) -> MemoryTables {
        self.tables.lock().clone()
    }

    /// Reserve a template slot with no exercise bound to it.
    pub fn insert_open_slot(
        &self,
        program_workout_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<RecordId> {
        let mut tables = self.tables.lock();
        if tables.workout_exercises.iter().any(|r| {
            r.program_workout_id == program_workout_id && r.exercise_order == exercise_order
        }) {
            return Err(StoreError::conflict(
                "program workout exercise",
                format!("order {}", exercise_order),
            ));
        }
        let id = Uuid::new_v4();
        tables.workout_exercises.push(WorkoutExerciseRecord {
            id,
            program_workout_id,
            exercise_id: None,
            exercise_order,
            target_sets: 0,
            target_reps_min: 0,
            target_reps_max: 0,
            is_ad_hoc: false,
        });
        Ok(id)
    }

    fn check_failure(&self, point: FailPoint) -> StoreResult<()> {
        let mut failures = self.failures.lock();
        match failures.iter().position(|armed| *armed == point) {
            Some(index) => {
                failures.remove(index);
                Err(StoreError::Unavailable(format!(
                    "injected failure at {:?}",
                    point
                )))
            }
            None => Ok(()),
        }
    }

    fn race_armed(&self, slug: &str) -> bool {
        let mut failures = self.failures.lock();
        let point = FailPoint::ExerciseRace {
            slug: slug.to_string(),
        };
        match failures.iter().position(|armed| *armed == point) {
            Some(index) => {
                failures.remove(index);
                true
            }
            None => false,
        }
    }
}

fn store<T>(table: &mut Vec<Stored<T>>, row: T) -> RecordId {
    let id = Uuid::new_v4();
    table.push(Stored { id, row });
    id
}

fn find<T>(table: &[Stored<T>], predicate: impl Fn(&T) -> bool) -> Option<RecordId> {
    table.iter().find(|stored| predicate(&stored.row)).map(|stored| stored.id)
}

impl ImportStore for MemoryStore {
    async fn find_exercise_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().exercises, |e| e.slug == slug))
    }

    async fn insert_exercise(&self, exercise: &NewExercise) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::Exercise {
            slug: exercise.slug.clone(),
        })?;
        let mut tables = self.tables.lock();
        if self.race_armed(&exercise.slug) {
            store(&mut tables.exercises, exercise.clone());
        }
        if find(&tables.exercises, |e| e.slug == exercise.slug).is_some() {
            return Err(StoreError::conflict(
                "exercise",
                format!("slug {}", exercise.slug),
            ));
        }
        Ok(store(&mut tables.exercises, exercise.clone()))
    }

    async fn find_program_by_slug(&self, slug: &str) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().programs, |p| p.slug == slug))
    }

    async fn insert_program(&self, program: &NewProgram) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::Program)?;
        let mut tables = self.tables.lock();
        if find(&tables.programs, |p| p.slug == program.slug).is_some() {
            return Err(StoreError::conflict(
                "program",
                format!("slug {}", program.slug),
            ));
        }
        Ok(store(&mut tables.programs, program.clone()))
    }

    async fn find_cycle(
        &self,
        program_id: RecordId,
        cycle_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().cycles, |c| {
            c.program_id == program_id && c.cycle_number == cycle_number
        }))
    }

    async fn insert_cycle(&self, cycle: &NewCycle) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::Cycle(cycle.cycle_number))?;
        let mut tables = self.tables.lock();
        if find(&tables.cycles, |c| {
            c.program_id == cycle.program_id && c.cycle_number == cycle.cycle_number
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "cycle",
                format!("cycle {}", cycle.cycle_number),
            ));
        }
        Ok(store(&mut tables.cycles, cycle.clone()))
    }

    async fn find_program_workout(
        &self,
        program_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().program_workouts, |w| {
            w.program_id == program_id && w.week_number == week_number && w.day_number == day_number
        }))
    }

    async fn insert_program_workout(&self, workout: &NewProgramWorkout) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::ProgramWorkout {
            week_number: workout.week_number,
            day_number: workout.day_number,
        })?;
        let mut tables = self.tables.lock();
        if find(&tables.program_workouts, |w| {
            w.program_id == workout.program_id
                && w.week_number == workout.week_number
                && w.day_number == workout.day_number
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "program workout",
                format!("week {} day {}", workout.week_number, workout.day_number),
            ));
        }
        Ok(store(&mut tables.program_workouts, workout.clone()))
    }

    async fn find_workout_exercise_by_exercise(
        &self,
        program_workout_id: RecordId,
        exercise_id: RecordId,
        order_hint: i32,
    ) -> StoreResult<Option<RecordId>> {
        let tables = self.tables.lock();
        let mut candidates: Vec<&WorkoutExerciseRecord> = tables
            .workout_exercises
            .iter()
            .filter(|r| {
                r.program_workout_id == program_workout_id && r.exercise_id == Some(exercise_id)
            })
            .collect();
        candidates.sort_by_key(|r| (r.exercise_order != order_hint, r.exercise_order));
        Ok(candidates.first().map(|r| r.id))
    }

    async fn find_workout_exercise_by_order(
        &self,
        program_workout_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<WorkoutExerciseSlot>> {
        let tables = self.tables.lock();
        Ok(tables
            .workout_exercises
            .iter()
            .find(|r| {
                r.program_workout_id == program_workout_id && r.exercise_order == exercise_order
            })
            .map(|r| WorkoutExerciseSlot {
                id: r.id,
                exercise_id: r.exercise_id,
                is_ad_hoc: r.is_ad_hoc,
            }))
    }

    async fn max_workout_exercise_order(
        &self,
        program_workout_id: RecordId,
    ) -> StoreResult<Option<i32>> {
        let tables = self.tables.lock();
        Ok(tables
            .workout_exercises
            .iter()
            .filter(|r| r.program_workout_id == program_workout_id)
            .map(|r| r.exercise_order)
            .max())
    }

    async fn insert_workout_exercise(
        &self,
        workout_exercise: &NewWorkoutExercise,
    ) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::WorkoutExercise {
            exercise_order: workout_exercise.exercise_order,
        })?;
        let mut tables = self.tables.lock();
        if tables.workout_exercises.iter().any(|r| {
            r.program_workout_id == workout_exercise.program_workout_id
                && r.exercise_order == workout_exercise.exercise_order
        }) {
            return Err(StoreError::conflict(
                "program workout exercise",
                format!("order {}", workout_exercise.exercise_order),
            ));
        }
        let id = Uuid::new_v4();
        tables.workout_exercises.push(WorkoutExerciseRecord {
            id,
            program_workout_id: workout_exercise.program_workout_id,
            exercise_id: Some(workout_exercise.exercise_id),
            exercise_order: workout_exercise.exercise_order,
            target_sets: workout_exercise.target_sets,
            target_reps_min: workout_exercise.target_reps_min,
            target_reps_max: workout_exercise.target_reps_max,
            is_ad_hoc: workout_exercise.is_ad_hoc,
        });
        Ok(id)
    }

    async fn find_progression(
        &self,
        program_workout_exercise_id: RecordId,
        week_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().progressions, |p| {
            p.program_workout_exercise_id == program_workout_exercise_id
                && p.week_number == week_number
        }))
    }

    async fn insert_progression(&self, progression: &NewProgression) -> StoreResult<RecordId> {
        let mut tables = self.tables.lock();
        if find(&tables.progressions, |p| {
            p.program_workout_exercise_id == progression.program_workout_exercise_id
                && p.week_number == progression.week_number
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "progression",
                format!("week {}", progression.week_number),
            ));
        }
        Ok(store(&mut tables.progressions, progression.clone()))
    }

    async fn find_program_instance(
        &self,
        user_id: Uuid,
        program_id: RecordId,
        instance_name: &str,
    ) -> StoreResult<Option<RecordId>> {
        let tables = self.tables.lock();
        Ok(tables
            .program_instances
            .iter()
            .find(|r| {
                r.row.user_id == user_id
                    && r.row.program_id == program_id
                    && r.row.instance_name == instance_name
            })
            .map(|r| r.id))
    }

    async fn insert_program_instance(
        &self,
        instance: &NewProgramInstance,
    ) -> StoreResult<RecordId> {
        let mut tables = self.tables.lock();
        if tables.program_instances.iter().any(|r| {
            r.row.user_id == instance.user_id
                && r.row.program_id == instance.program_id
                && r.row.instance_name == instance.instance_name
        }) {
            return Err(StoreError::conflict(
                "program instance",
                instance.instance_name.clone(),
            ));
        }
        let id = Uuid::new_v4();
        tables.program_instances.push(ProgramInstanceRecord {
            id,
            row: instance.clone(),
            workouts_completed: 0,
        });
        Ok(id)
    }

    async fn find_workout_instance(
        &self,
        program_instance_id: RecordId,
        week_number: i32,
        day_number: i32,
    ) -> StoreResult<Option<WorkoutInstanceRow>> {
        let tables = self.tables.lock();
        Ok(tables
            .workout_instances
            .iter()
            .find(|w| {
                w.row.program_instance_id == program_instance_id
                    && w.row.week_number == week_number
                    && w.row.day_number == day_number
            })
            .map(|w| WorkoutInstanceRow {
                id: w.id,
                total_volume_lbs: w.row.total_volume_lbs,
            }))
    }

    async fn insert_workout_instance(
        &self,
        workout: &NewWorkoutInstance,
    ) -> StoreResult<RecordId> {
        let mut tables = self.tables.lock();
        if find(&tables.workout_instances, |w| {
            w.program_instance_id == workout.program_instance_id
                && w.week_number == workout.week_number
                && w.day_number == workout.day_number
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "workout instance",
                format!("week {} day {}", workout.week_number, workout.day_number),
            ));
        }
        Ok(store(&mut tables.workout_instances, workout.clone()))
    }

    async fn update_workout_volume(
        &self,
        workout_instance_id: RecordId,
        total_volume_lbs: i64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(workout) = tables
            .workout_instances
            .iter_mut()
            .find(|w| w.id == workout_instance_id)
        {
            workout.row.total_volume_lbs = total_volume_lbs;
        }
        Ok(())
    }

    async fn find_exercise_instance(
        &self,
        workout_instance_id: RecordId,
        exercise_order: i32,
    ) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().exercise_instances, |e| {
            e.workout_instance_id == workout_instance_id && e.exercise_order == exercise_order
        }))
    }

    async fn insert_exercise_instance(
        &self,
        exercise: &NewExerciseInstance,
    ) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::ExerciseInstance {
            exercise_order: exercise.exercise_order,
        })?;
        let mut tables = self.tables.lock();
        if find(&tables.exercise_instances, |e| {
            e.workout_instance_id == exercise.workout_instance_id
                && e.exercise_order == exercise.exercise_order
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "exercise instance",
                format!("order {}", exercise.exercise_order),
            ));
        }
        Ok(store(&mut tables.exercise_instances, exercise.clone()))
    }

    async fn find_set_instance(
        &self,
        exercise_instance_id: RecordId,
        set_number: i32,
    ) -> StoreResult<Option<RecordId>> {
        Ok(find(&self.tables.lock().set_instances, |s| {
            s.exercise_instance_id == exercise_instance_id && s.set_number == set_number
        }))
    }

    async fn insert_set_instance(&self, set: &NewSetInstance) -> StoreResult<RecordId> {
        self.check_failure(FailPoint::SetInstance {
            set_number: set.set_number,
        })?;
        let mut tables = self.tables.lock();
        if find(&tables.set_instances, |s| {
            s.exercise_instance_id == set.exercise_instance_id && s.set_number == set.set_number
        })
        .is_some()
        {
            return Err(StoreError::conflict(
                "set instance",
                format!("set {}", set.set_number),
            ));
        }
        Ok(store(&mut tables.set_instances, set.clone()))
    }

    async fn count_completed_workouts(&self, program_instance_id: RecordId) -> StoreResult<i64> {
        let tables = self.tables.lock();
        let count = tables
            .workout_instances
            .iter()
            .filter(|w| {
                w.row.program_instance_id == program_instance_id
                    && w.row.status == WorkoutStatus::Completed
            })
            .count();
        Ok(count as i64)
    }

    async fn update_workouts_completed(
        &self,
        program_instance_id: RecordId,
        workouts_completed: i32,
    ) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(instance) = tables
            .program_instances
            .iter_mut()
            .find(|r| r.id == program_instance_id)
        {
            instance.workouts_completed = workouts_completed;
        }
        Ok(())
    }
}
