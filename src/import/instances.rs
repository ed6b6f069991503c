//! Instance import: one program instance per run, then its workouts,
//! exercises and sets.
//!
//! Every row is looked up by its natural key before it is written, so a run
//! that stopped half way is completed by simply running it again.
//!
//! # Template resolution
//!
//! An exercise instance must point at a template exercise. The candidates are
//! tried in [`RESOLUTION_ORDER`]:
//!
//! 1. [`TemplateMatch::ExerciseIdentity`]: the template workout already lists
//!    this exercise.
//! 2. [`TemplateMatch::OpenSlotPosition`]: the slot at the same order exists
//!    but has no exercise bound yet.
//! 3. [`TemplateMatch::AdHocCreate`]: a new ad hoc template exercise is
//!    appended after the last used order.
//!
//! A slot bound to a different exercise never matches by position. The
//! importer itself never writes an open slot: template exercises it creates
//! are always bound, so open slots only come from externally authored
//! templates.
//!
//! A run that places two workouts on the same week and day keeps the earlier
//! one; the later one is reported and left out.

use crate::import::context::ImportContext;
use crate::import::data_builder::{
    has_distinct_performed_date, numbered_sets, split_end_date, workout_volume,
};
use crate::import::schedule::{
    self, AD_HOC_TARGET_SETS, CYCLE_COUNT, DAYS_PER_CYCLE, WORKOUTS_PER_CYCLE,
};
use crate::models::{
    CorrelatedWorkout, ExerciseStatus, InstanceStatus, NewExerciseInstance, NewProgramInstance,
    NewSetInstance, NewWorkoutExercise, NewWorkoutInstance, ParsedExercise, ProgramInstanceData,
    RecordId,
};
use crate::store::{ImportStore, StoreError};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use uuid::Uuid;

/// Ways of finding the template exercise an exercise instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMatch {
    ExerciseIdentity,
    OpenSlotPosition,
    AdHocCreate,
}

pub const RESOLUTION_ORDER: [TemplateMatch; 3] = [
    TemplateMatch::ExerciseIdentity,
    TemplateMatch::OpenSlotPosition,
    TemplateMatch::AdHocCreate,
];

/// Where a template exercise lookup happens.
#[derive(Debug, Clone, Copy)]
struct TemplateTarget {
    program_workout_id: RecordId,
    exercise_id: RecordId,
    exercise_order: i32,
    week_number: i32,
    day_number: i32,
}

pub struct InstanceImporter<'a, S> {
    store: &'a S,
    user_id: Uuid,
}

impl<'a, S: ImportStore> InstanceImporter<'a, S> {
    pub fn new(store: &'a S, user_id: Uuid) -> Self {
        Self { store, user_id }
    }

    /// Import one run's correlated workouts under its program instance.
    ///
    /// Requires the template hierarchy to be built into `ctx` first.
    pub async fn import_run(
        &self,
        run: &ProgramInstanceData,
        workouts: &[CorrelatedWorkout],
        ctx: &mut ImportContext,
    ) {
        let Some(program_id) = ctx.program_id() else {
            ctx.stats
                .warn(format!("run \"{}\": no program template, skipped", run.name));
            return;
        };

        let ignored: Vec<i32> = run
            .cycles
            .iter()
            .copied()
            .filter(|cycle| !schedule::is_program_cycle(*cycle))
            .collect();
        if !ignored.is_empty() {
            ctx.stats.warn(format!(
                "run \"{}\": cycle numbers {:?} are outside 1..={} and were ignored",
                run.name, ignored, CYCLE_COUNT
            ));
        }

        let Some(expected_end_date) = expected_end_date(run) else {
            ctx.stats.error(
                format!("run \"{}\"", run.name),
                format!("expected end date out of range for start {}", run.start_date),
            );
            return;
        };

        let instance_id = match self
            .ensure_program_instance(run, program_id, expected_end_date, ctx)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                ctx.stats.error(format!("run \"{}\"", run.name), err);
                return;
            }
        };

        log::info!(
            "importing run \"{}\": {} workouts",
            run.name,
            workouts.len()
        );
        let mut placed: HashMap<(i32, i32), NaiveDate> = HashMap::new();
        for workout in workouts {
            let key = (workout.week_number, workout.day_number);
            if let Some(first) = placed.get(&key) {
                ctx.stats.warn(format!(
                    "run \"{}\" week {} day {}: workout on {} shares the slot with the workout on {}, skipped",
                    run.name, key.0, key.1, workout.scheduled_date, first
                ));
                continue;
            }
            placed.insert(key, workout.scheduled_date);

            self.import_workout(run, instance_id, workout, ctx).await;
        }

        self.refresh_completed(run, instance_id, ctx).await;
    }

    async fn ensure_program_instance(
        &self,
        run: &ProgramInstanceData,
        program_id: RecordId,
        expected_end_date: NaiveDate,
        ctx: &mut ImportContext,
    ) -> Result<RecordId, StoreError> {
        if let Some(id) = self
            .store
            .find_program_instance(self.user_id, program_id, &run.name)
            .await?
        {
            ctx.stats.program_instances_existing += 1;
            return Ok(id);
        }

        let cycles_spanned = cycles_spanned(&run.cycles);
        let instance = NewProgramInstance {
            user_id: self.user_id,
            program_id,
            instance_name: run.name.clone(),
            start_date: run.start_date,
            end_date: run.end_date,
            expected_end_date,
            status: if run.is_ongoing {
                InstanceStatus::Active
            } else {
                InstanceStatus::Completed
            },
            total_workouts: cycles_spanned * WORKOUTS_PER_CYCLE,
        };

        let id = self.store.insert_program_instance(&instance).await?;
        log::info!("created program instance \"{}\" ({})", run.name, id);
        ctx.stats.program_instances_created += 1;
        Ok(id)
    }

    async fn import_workout(
        &self,
        run: &ProgramInstanceData,
        instance_id: RecordId,
        workout: &CorrelatedWorkout,
        ctx: &mut ImportContext,
    ) {
        let context = format!(
            "run \"{}\" week {} day {}",
            run.name, workout.week_number, workout.day_number
        );

        let Some(program_workout_id) =
            ctx.workout_template(workout.week_number, workout.day_number)
        else {
            ctx.stats.warn(format!("{}: no template workout", context));
            return;
        };

        let volume = workout_volume(&workout.exercises);
        let existing = match self
            .store
            .find_workout_instance(instance_id, workout.week_number, workout.day_number)
            .await
        {
            Ok(existing) => existing,
            Err(err) => {
                ctx.stats.error(context, err);
                return;
            }
        };

        let workout_instance_id = match existing {
            Some(row) => {
                ctx.stats.workout_instances_existing += 1;
                if row.total_volume_lbs != volume {
                    match self.store.update_workout_volume(row.id, volume).await {
                        Ok(()) => {
                            log::debug!(
                                "{}: volume {} -> {}",
                                context,
                                row.total_volume_lbs,
                                volume
                            );
                            ctx.stats.volume_updates += 1;
                        }
                        Err(err) => ctx.stats.error(context.clone(), err),
                    }
                }
                row.id
            }
            None => {
                let end_date = split_end_date(workout);
                let new_workout = NewWorkoutInstance {
                    program_instance_id: instance_id,
                    program_workout_id,
                    week_number: workout.week_number,
                    day_number: workout.day_number,
                    scheduled_date: workout.scheduled_date,
                    end_date,
                    status: workout.status,
                    total_volume_lbs: volume,
                };
                match self.store.insert_workout_instance(&new_workout).await {
                    Ok(id) => {
                        ctx.stats.workout_instances_created += 1;
                        if end_date.is_some() {
                            ctx.stats.split_workouts += 1;
                            if !has_distinct_performed_date(workout) {
                                ctx.stats.warn(format!(
                                    "{}: split session without per-exercise performed dates",
                                    context
                                ));
                            }
                        }
                        id
                    }
                    Err(err) => {
                        ctx.stats.error(context, err);
                        return;
                    }
                }
            }
        };

        for exercise in &workout.exercises {
            let target = ctx.exercise_id(&exercise.name).map(|exercise_id| TemplateTarget {
                program_workout_id,
                exercise_id,
                exercise_order: exercise.order,
                week_number: workout.week_number,
                day_number: workout.day_number,
            });
            let exercise_context = format!("{} order {}", context, exercise.order);

            match target {
                Some(target) => {
                    self.import_exercise(
                        workout_instance_id,
                        target,
                        exercise,
                        &exercise_context,
                        ctx,
                    )
                    .await
                }
                None => ctx.stats.warn(format!(
                    "{}: no exercise id for \"{}\"",
                    exercise_context, exercise.name
                )),
            }
        }
    }

    async fn import_exercise(
        &self,
        workout_instance_id: RecordId,
        target: TemplateTarget,
        exercise: &ParsedExercise,
        context: &str,
        ctx: &mut ImportContext,
    ) {
        let existing = match self
            .store
            .find_exercise_instance(workout_instance_id, exercise.order)
            .await
        {
            Ok(existing) => existing,
            Err(err) => {
                ctx.stats.error(context, err);
                return;
            }
        };

        let exercise_instance_id = match existing {
            Some(id) => {
                ctx.stats.exercise_instances_existing += 1;
                id
            }
            None => {
                let template_id = match self.resolve_template(target, ctx).await {
                    Ok(id) => id,
                    Err(err) => {
                        ctx.stats.error(context, err);
                        return;
                    }
                };

                let new_exercise = NewExerciseInstance {
                    workout_instance_id,
                    program_workout_exercise_id: template_id,
                    exercise_id: target.exercise_id,
                    exercise_order: exercise.order,
                    status: if exercise.has_sets() {
                        ExerciseStatus::Completed
                    } else {
                        ExerciseStatus::Skipped
                    },
                    notes: exercise.notes.clone(),
                    performed_date: exercise.performed_date,
                };
                match self.store.insert_exercise_instance(&new_exercise).await {
                    Ok(id) => {
                        ctx.stats.exercise_instances_created += 1;
                        id
                    }
                    Err(err) => {
                        ctx.stats.error(context, err);
                        return;
                    }
                }
            }
        };

        for numbered in numbered_sets(exercise) {
            let set_context = format!("{} set {}", context, numbered.set_number);
            match self
                .store
                .find_set_instance(exercise_instance_id, numbered.set_number)
                .await
            {
                Ok(Some(_)) => ctx.stats.set_instances_existing += 1,
                Ok(None) => {
                    let set = NewSetInstance {
                        exercise_instance_id,
                        set_number: numbered.set_number,
                        reps: numbered.set.reps,
                        weight_lbs: numbered.set.weight,
                        is_warmup: numbered.is_warmup,
                        difficulty: numbered.set.difficulty,
                        increase_next: numbered.set.increase_weight,
                    };
                    match self.store.insert_set_instance(&set).await {
                        Ok(_) => ctx.stats.set_instances_created += 1,
                        Err(err) => ctx.stats.error(set_context, err),
                    }
                }
                Err(err) => ctx.stats.error(set_context, err),
            }
        }
    }

    async fn resolve_template(
        &self,
        target: TemplateTarget,
        ctx: &mut ImportContext,
    ) -> Result<RecordId, StoreError> {
        for strategy in RESOLUTION_ORDER {
            if let Some(id) = self.try_match(strategy, target, ctx).await? {
                log::trace!(
                    "week {} day {} order {}: template exercise via {:?}",
                    target.week_number,
                    target.day_number,
                    target.exercise_order,
                    strategy
                );
                return Ok(id);
            }
        }
        Err(StoreError::Unavailable(format!(
            "no template exercise for order {}",
            target.exercise_order
        )))
    }

    async fn try_match(
        &self,
        strategy: TemplateMatch,
        target: TemplateTarget,
        ctx: &mut ImportContext,
    ) -> Result<Option<RecordId>, StoreError> {
        match strategy {
            TemplateMatch::ExerciseIdentity => {
                self.store
                    .find_workout_exercise_by_exercise(
                        target.program_workout_id,
                        target.exercise_id,
                        target.exercise_order,
                    )
                    .await
            }
            TemplateMatch::OpenSlotPosition => {
                let slot = self
                    .store
                    .find_workout_exercise_by_order(
                        target.program_workout_id,
                        target.exercise_order,
                    )
                    .await?;
                Ok(slot.filter(|slot| slot.exercise_id.is_none()).map(|slot| slot.id))
            }
            TemplateMatch::AdHocCreate => self.create_ad_hoc(target, ctx).await.map(Some),
        }
    }

    async fn create_ad_hoc(
        &self,
        target: TemplateTarget,
        ctx: &mut ImportContext,
    ) -> Result<RecordId, StoreError> {
        let next_order = self
            .store
            .max_workout_exercise_order(target.program_workout_id)
            .await?
            .map_or(1, |max| max.saturating_add(1));
        let reps = schedule::prescription(
            schedule::workout_type_for_day(target.day_number),
            schedule::micro_cycle_for_week(target.week_number),
        );

        let workout_exercise = NewWorkoutExercise {
            program_workout_id: target.program_workout_id,
            exercise_id: target.exercise_id,
            exercise_order: next_order,
            target_sets: AD_HOC_TARGET_SETS,
            target_reps_min: reps.reps_min,
            target_reps_max: reps.reps_max,
            is_ad_hoc: true,
        };
        let id = self.store.insert_workout_exercise(&workout_exercise).await?;

        log::debug!(
            "week {} day {}: ad hoc template exercise at order {}",
            target.week_number,
            target.day_number,
            next_order
        );
        ctx.stats.workout_exercises_created += 1;
        ctx.stats.ad_hoc_workout_exercises += 1;
        Ok(id)
    }

    async fn refresh_completed(
        &self,
        run: &ProgramInstanceData,
        instance_id: RecordId,
        ctx: &mut ImportContext,
    ) {
        let result = async {
            let completed = self.store.count_completed_workouts(instance_id).await?;
            let completed = i32::try_from(completed).unwrap_or(i32::MAX);
            self.store
                .update_workouts_completed(instance_id, completed)
                .await?;
            Ok::<_, StoreError>(completed)
        }
        .await;

        match result {
            Ok(completed) => log::debug!("run \"{}\": {} workouts completed", run.name, completed),
            Err(err) => ctx
                .stats
                .error(format!("run \"{}\" workouts completed", run.name), err),
        }
    }
}

/// Last day of the run's planned span, or `None` past the calendar's range.
fn expected_end_date(run: &ProgramInstanceData) -> Option<NaiveDate> {
    let span_days = cycles_spanned(&run.cycles) * DAYS_PER_CYCLE - 1;
    run.start_date
        .checked_add_days(Days::new(u64::try_from(span_days).ok()?))
}

/// Number of program cycles a run covers, first to last inclusive.
///
/// Cycle numbers outside the program are not counted.
pub fn cycles_spanned(cycles: &[i32]) -> i32 {
    let valid = || {
        cycles
            .iter()
            .copied()
            .filter(|cycle| schedule::is_program_cycle(*cycle))
    };
    match (valid().min(), valid().max()) {
        (Some(min), Some(max)) => max - min + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::correlation::SlotAssignments;
    use crate::import::exercises::ExerciseResolver;
    use crate::import::templates::{ProgramSettings, TemplateHierarchyBuilder};
    use crate::models::{ParsedSet, WorkoutStatus};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, month, day).unwrap()
    }

    fn set(reps: i32, weight: f64) -> ParsedSet {
        ParsedSet {
            reps,
            weight,
            difficulty: None,
            increase_weight: false,
        }
    }

    fn exercise(name: &str, order: i32, sets: Vec<ParsedSet>) -> ParsedExercise {
        ParsedExercise {
            name: name.to_string(),
            order,
            notes: None,
            performed_date: None,
            warmup_sets: vec![],
            working_sets: sets,
        }
    }

    fn workout(week: i32, day: i32, exercises: Vec<ParsedExercise>) -> CorrelatedWorkout {
        CorrelatedWorkout {
            week_number: week,
            day_number: day,
            scheduled_date: date(3, 1),
            end_date: None,
            status: WorkoutStatus::Completed,
            exercises,
        }
    }

    fn run(name: &str, cycles: Vec<i32>) -> ProgramInstanceData {
        ProgramInstanceData {
            name: name.to_string(),
            start_date: date(3, 1),
            end_date: None,
            is_ongoing: true,
            cycles,
            workouts: vec![],
        }
    }

    /// Resolve exercises and build templates from `template` only, so that
    /// `extra` names exist as exercises without occupying any slot.
    async fn prepared(
        store: &MemoryStore,
        template: &[CorrelatedWorkout],
        extra: &[&str],
    ) -> ImportContext {
        let mut ctx = ImportContext::new();
        let names = template
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.name.as_str()))
            .chain(extra.iter().copied());
        ExerciseResolver::new(store, None)
            .resolve_all(names, &mut ctx)
            .await;

        let mut assignments = SlotAssignments::new();
        assignments.observe("template", template, &mut ctx.stats);
        let settings = ProgramSettings {
            slug: "hybrid-strength-96".to_string(),
            title: "Hybrid Strength".to_string(),
        };
        TemplateHierarchyBuilder::new(store, &settings)
            .build(&assignments, &mut ctx)
            .await
            .unwrap();
        ctx
    }

    #[test]
    fn resolution_order_is_identity_then_position_then_ad_hoc() {
        assert_eq!(
            RESOLUTION_ORDER,
            [
                TemplateMatch::ExerciseIdentity,
                TemplateMatch::OpenSlotPosition,
                TemplateMatch::AdHocCreate
            ]
        );
    }

    #[test]
    fn cycles_spanned_covers_gaps() {
        assert_eq!(cycles_spanned(&[1]), 1);
        assert_eq!(cycles_spanned(&[3, 1]), 3);
        assert_eq!(cycles_spanned(&[2, 3]), 2);
        assert_eq!(cycles_spanned(&[]), 1);
        assert_eq!(cycles_spanned(&[1, 100_000_000]), 1);
        assert_eq!(cycles_spanned(&[-4, 0]), 1);
    }

    #[tokio::test]
    async fn program_instance_totals() {
        let store = MemoryStore::new();
        let mut ctx = prepared(&store, &[], &[]).await;

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("Spring", vec![2, 3]), &[], &mut ctx)
            .await;

        let tables = store.snapshot();
        let instance = &tables.program_instances[0].row;
        assert_eq!(instance.total_workouts, 48);
        assert_eq!(instance.expected_end_date, date(3, 1) + chrono::Duration::days(63));
        assert_eq!(instance.status, InstanceStatus::Active);
        assert_eq!(ctx.stats.program_instances_created, 1);
    }

    #[tokio::test]
    async fn out_of_range_cycles_are_ignored() {
        let store = MemoryStore::new();
        let mut ctx = prepared(&store, &[], &[]).await;

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("Typo", vec![1, 100_000_000]), &[], &mut ctx)
            .await;

        let tables = store.snapshot();
        let instance = &tables.program_instances[0].row;
        assert_eq!(instance.total_workouts, 24);
        assert_eq!(instance.expected_end_date, date(4, 1));
        assert!(ctx
            .stats
            .warnings
            .iter()
            .any(|w| w.contains("run \"Typo\"") && w.contains("100000000")));
    }

    #[tokio::test]
    async fn end_date_past_calendar_is_an_error() {
        let store = MemoryStore::new();
        let mut ctx = prepared(&store, &[], &[]).await;
        let mut far = run("Far", vec![1]);
        far.start_date = NaiveDate::MAX;

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&far, &[], &mut ctx)
            .await;

        assert_eq!(store.row_counts().program_instances, 0);
        assert_eq!(ctx.stats.errors.len(), 1);
        assert_eq!(ctx.stats.errors[0].context, "run \"Far\"");
    }

    #[tokio::test]
    async fn later_workout_on_a_taken_slot_is_skipped() {
        let store = MemoryStore::new();
        let first = workout(1, 2, vec![exercise("Squat", 1, vec![set(5, 200.0)])]);
        let mut ctx = prepared(&store, std::slice::from_ref(&first), &["Deadlift"]).await;

        let mut second = workout(1, 2, vec![exercise("Deadlift", 1, vec![set(3, 315.0)])]);
        second.scheduled_date = date(3, 9);
        let workouts = [first, second];
        let importer = InstanceImporter::new(&store, Uuid::new_v4());
        importer
            .import_run(&run("H", vec![1]), &workouts, &mut ctx)
            .await;

        assert_eq!(ctx.stats.workout_instances_created, 1);
        assert_eq!(ctx.stats.workout_instances_existing, 0);
        assert_eq!(ctx.stats.exercise_instances_existing, 0);
        assert_eq!(ctx.stats.volume_updates, 0);
        assert!(ctx.stats.warnings.iter().any(|w| {
            w.starts_with("run \"H\" week 1 day 2")
                && w.contains("2021-03-09")
                && w.contains("2021-03-01")
        }));
        assert_eq!(store.snapshot().workout_instances[0].row.total_volume_lbs, 1000);

        importer
            .import_run(&run("H", vec![1]), &workouts, &mut ctx)
            .await;
        assert_eq!(ctx.stats.volume_updates, 0);
        assert_eq!(store.row_counts().workout_instances, 1);
    }

    #[tokio::test]
    async fn identity_match_reuses_template_exercise() {
        let store = MemoryStore::new();
        let planned = workout(1, 1, vec![exercise("Squat", 1, vec![set(5, 225.0)])]);
        let mut ctx = prepared(&store, std::slice::from_ref(&planned), &[]).await;

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("A", vec![1]), &[planned], &mut ctx)
            .await;

        let tables = store.snapshot();
        assert_eq!(tables.workout_exercises.len(), 1);
        assert_eq!(
            tables.exercise_instances[0].row.program_workout_exercise_id,
            tables.workout_exercises[0].id
        );
        assert_eq!(ctx.stats.ad_hoc_workout_exercises, 0);
    }

    #[tokio::test]
    async fn different_exercise_at_bound_order_creates_ad_hoc() {
        let store = MemoryStore::new();
        let planned = workout(1, 1, vec![exercise("Bench Press", 1, vec![])]);
        let mut ctx = prepared(&store, &[planned], &["Dumbbell Press"]).await;

        let performed = workout(
            1,
            1,
            vec![exercise("Dumbbell Press", 1, vec![set(10, 60.0)])],
        );
        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("B", vec![1]), &[performed], &mut ctx)
            .await;

        let tables = store.snapshot();
        assert_eq!(tables.workout_exercises.len(), 2);
        let ad_hoc = tables
            .workout_exercises
            .iter()
            .find(|r| r.is_ad_hoc)
            .unwrap();
        assert_eq!(ad_hoc.exercise_order, 2);
        assert_eq!(ad_hoc.target_sets, AD_HOC_TARGET_SETS);
        assert_eq!((ad_hoc.target_reps_min, ad_hoc.target_reps_max), (6, 8));
        assert_eq!(
            tables.exercise_instances[0].row.program_workout_exercise_id,
            ad_hoc.id
        );
        assert_eq!(tables.exercise_instances[0].row.exercise_order, 1);
        assert_eq!(ctx.stats.ad_hoc_workout_exercises, 1);
    }

    #[tokio::test]
    async fn open_slot_matches_by_position() {
        let store = MemoryStore::new();
        let mut ctx = prepared(&store, &[], &["Lunge"]).await;
        let program_workout_id = ctx.workout_template(2, 4).unwrap();
        let open = store.insert_open_slot(program_workout_id, 1).unwrap();

        let performed = workout(2, 4, vec![exercise("Lunge", 1, vec![set(12, 40.0)])]);
        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("C", vec![1]), &[performed], &mut ctx)
            .await;

        let tables = store.snapshot();
        assert_eq!(tables.workout_exercises.len(), 1);
        assert_eq!(
            tables.exercise_instances[0].row.program_workout_exercise_id,
            open
        );
    }

    #[tokio::test]
    async fn exercise_without_sets_is_skipped_status() {
        let store = MemoryStore::new();
        let planned = workout(1, 2, vec![exercise("Row", 1, vec![])]);
        let mut ctx = prepared(&store, std::slice::from_ref(&planned), &[]).await;

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("D", vec![1]), &[planned], &mut ctx)
            .await;

        let tables = store.snapshot();
        assert_eq!(tables.exercise_instances[0].row.status, ExerciseStatus::Skipped);
        assert!(tables.set_instances.is_empty());
    }

    #[tokio::test]
    async fn split_session_records_end_date() {
        let store = MemoryStore::new();
        let mut planned = workout(1, 3, vec![exercise("Squat", 1, vec![set(5, 200.0)])]);
        let mut ctx = prepared(&store, std::slice::from_ref(&planned), &[]).await;
        planned.exercises[0].performed_date = Some(date(3, 2));

        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("E", vec![1]), &[planned], &mut ctx)
            .await;

        let tables = store.snapshot();
        assert_eq!(tables.workout_instances[0].row.end_date, Some(date(3, 2)));
        assert_eq!(ctx.stats.split_workouts, 1);
        assert!(ctx.stats.warnings.iter().all(|w| !w.contains("split session")));
    }

    #[tokio::test]
    async fn unplaced_workout_is_warned() {
        let store = MemoryStore::new();
        let mut ctx = prepared(&store, &[], &["Squat"]).await;

        let off_grid = workout(13, 1, vec![exercise("Squat", 1, vec![set(5, 100.0)])]);
        InstanceImporter::new(&store, Uuid::new_v4())
            .import_run(&run("F", vec![1]), &[off_grid], &mut ctx)
            .await;

        assert_eq!(store.row_counts().workout_instances, 0);
        assert!(ctx
            .stats
            .warnings
            .iter()
            .any(|w| w == "run \"F\" week 13 day 1: no template workout"));
    }

    #[tokio::test]
    async fn changed_volume_is_rewritten() {
        let store = MemoryStore::new();
        let planned = workout(1, 1, vec![exercise("Squat", 1, vec![set(5, 200.0)])]);
        let mut ctx = prepared(&store, std::slice::from_ref(&planned), &[]).await;
        let importer = InstanceImporter::new(&store, Uuid::new_v4());
        importer
            .import_run(&run("G", vec![1]), std::slice::from_ref(&planned), &mut ctx)
            .await;

        let mut corrected = planned.clone();
        corrected.exercises[0].working_sets[0].weight = 210.0;
        importer
            .import_run(&run("G", vec![1]), &[corrected], &mut ctx)
            .await;

        assert_eq!(ctx.stats.volume_updates, 1);
        assert_eq!(store.snapshot().workout_instances[0].row.total_volume_lbs, 1050);
    }
}
