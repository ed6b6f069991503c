//! Template hierarchy construction.
//!
//! Materializes the program skeleton: one program, its three cycles, the
//! 12 × 6 grid of workout templates, the template exercises observed in the
//! history and their per-week progressions. Each level is looked up by its
//! natural key first, so re-running the builder writes nothing new.
//!
//! # Failure policy
//!
//! The program and its cycles must exist for anything else to make sense, so
//! failing to resolve them aborts the run. A template workout, template
//! exercise or progression that fails is recorded and skipped; later phases
//! see the missing slot and warn.

use crate::error::ImportError;
use crate::import::context::ImportContext;
use crate::import::correlation::SlotAssignments;
use crate::import::schedule::{
    self, CYCLE_COUNT, DAYS_PER_CYCLE, MAX_TEST_NOTE, MICRO_CYCLES_PER_CYCLE, PROGRAM_DURATION_DAYS,
    PROGRAM_WEEKS, REST_DAYS_PER_MICRO_CYCLE, TRAINING_DAYS_PER_MICRO_CYCLE,
};
use crate::models::{
    NewCycle, NewProgram, NewProgramWorkout, NewProgression, NewWorkoutExercise, RecordId,
    WorkoutType,
};
use crate::store::{ImportStore, StoreError};

/// Identity of the program template the history is imported into.
#[derive(Debug, Clone)]
pub struct ProgramSettings {
    pub slug: String,
    pub title: String,
}

pub struct TemplateHierarchyBuilder<'a, S> {
    store: &'a S,
    settings: &'a ProgramSettings,
}

impl<'a, S: ImportStore> TemplateHierarchyBuilder<'a, S> {
    pub fn new(store: &'a S, settings: &'a ProgramSettings) -> Self {
        Self { store, settings }
    }

    /// Build (or find) the whole hierarchy and record its ids in `ctx`.
    ///
    /// # Returns
    /// The program id, or a fatal [`ImportError`] when the program or one of
    /// its cycles cannot be resolved.
    pub async fn build(
        &self,
        assignments: &SlotAssignments,
        ctx: &mut ImportContext,
    ) -> Result<RecordId, ImportError> {
        let program_id = self.ensure_program(ctx).await?;
        self.ensure_cycles(program_id, ctx).await?;
        self.ensure_workouts(program_id, ctx).await;
        self.ensure_workout_exercises(assignments, ctx).await;

        log::info!(
            "templates: {} workouts, {} exercises created ({} existing), {} progressions created",
            ctx.workout_template_count(),
            ctx.stats.workout_exercises_created,
            ctx.stats.workout_exercises_existing,
            ctx.stats.progressions_created
        );
        Ok(program_id)
    }

    async fn ensure_program(&self, ctx: &mut ImportContext) -> Result<RecordId, ImportError> {
        let fatal = |source: StoreError| ImportError::ProgramCreation {
            slug: self.settings.slug.clone(),
            source,
        };

        if let Some(id) = self
            .store
            .find_program_by_slug(&self.settings.slug)
            .await
            .map_err(fatal)?
        {
            ctx.stats.programs_existing += 1;
            ctx.set_program(id);
            return Ok(id);
        }

        let program = NewProgram {
            title: self.settings.title.clone(),
            slug: self.settings.slug.clone(),
            duration_days: PROGRAM_DURATION_DAYS,
            cycle_count: CYCLE_COUNT,
            weeks_per_cycle: MICRO_CYCLES_PER_CYCLE,
            training_days_per_week: TRAINING_DAYS_PER_MICRO_CYCLE,
            rest_days_per_week: REST_DAYS_PER_MICRO_CYCLE,
        };
        let id = self.store.insert_program(&program).await.map_err(fatal)?;

        log::info!("created program {} ({})", self.settings.slug, id);
        ctx.stats.programs_created += 1;
        ctx.set_program(id);
        Ok(id)
    }

    async fn ensure_cycles(
        &self,
        program_id: RecordId,
        ctx: &mut ImportContext,
    ) -> Result<(), ImportError> {
        for cycle_number in 1..=CYCLE_COUNT {
            let fatal = |source: StoreError| ImportError::CycleCreation {
                cycle_number,
                source,
            };

            let id = match self
                .store
                .find_cycle(program_id, cycle_number)
                .await
                .map_err(fatal)?
            {
                Some(id) => {
                    ctx.stats.cycles_existing += 1;
                    id
                }
                None => {
                    let cycle = NewCycle {
                        program_id,
                        cycle_number,
                        duration_days: DAYS_PER_CYCLE,
                    };
                    let id = self.store.insert_cycle(&cycle).await.map_err(fatal)?;
                    ctx.stats.cycles_created += 1;
                    id
                }
            };
            ctx.record_cycle(cycle_number, id);
        }
        Ok(())
    }

    async fn ensure_workouts(&self, program_id: RecordId, ctx: &mut ImportContext) {
        for week_number in 1..=PROGRAM_WEEKS {
            let cycle_number = schedule::cycle_for_week(week_number);
            let Some(cycle_id) = ctx.cycle_id(cycle_number) else {
                ctx.stats
                    .warn(format!("no cycle {} for week {}", cycle_number, week_number));
                continue;
            };

            for day_number in 1..=TRAINING_DAYS_PER_MICRO_CYCLE {
                match self
                    .ensure_workout(program_id, cycle_id, week_number, day_number, ctx)
                    .await
                {
                    Ok(id) => ctx.record_workout_template(week_number, day_number, id),
                    Err(err) => ctx.stats.error(
                        format!("template week {} day {}", week_number, day_number),
                        err,
                    ),
                }
            }
        }
    }

    async fn ensure_workout(
        &self,
        program_id: RecordId,
        cycle_id: RecordId,
        week_number: i32,
        day_number: i32,
        ctx: &mut ImportContext,
    ) -> Result<RecordId, StoreError> {
        if let Some(id) = self
            .store
            .find_program_workout(program_id, week_number, day_number)
            .await?
        {
            ctx.stats.program_workouts_existing += 1;
            return Ok(id);
        }

        let workout_type = schedule::workout_type_for_day(day_number);
        let workout = NewProgramWorkout {
            program_id,
            cycle_id,
            week_number,
            day_number,
            workout_type,
            name: schedule::workout_name(week_number, day_number, workout_type),
        };
        let id = self.store.insert_program_workout(&workout).await?;
        ctx.stats.program_workouts_created += 1;
        Ok(id)
    }

    async fn ensure_workout_exercises(
        &self,
        assignments: &SlotAssignments,
        ctx: &mut ImportContext,
    ) {
        for ((week_number, day_number), exercises) in assignments.iter() {
            let Some(program_workout_id) = ctx.workout_template(week_number, day_number) else {
                ctx.stats.warn(format!(
                    "no template for week {} day {}",
                    week_number, day_number
                ));
                continue;
            };

            let workout_type = schedule::workout_type_for_day(day_number);
            let target = schedule::prescription(
                workout_type,
                schedule::micro_cycle_for_week(week_number),
            );

            for slot in exercises {
                let context = format!(
                    "template week {} day {} order {}",
                    week_number, day_number, slot.order
                );

                let Some(exercise_id) = ctx.exercise_id(&slot.exercise_name) else {
                    ctx.stats.warn(format!(
                        "{}: no exercise id for \"{}\"",
                        context, slot.exercise_name
                    ));
                    continue;
                };

                let existing = match self
                    .store
                    .find_workout_exercise_by_order(program_workout_id, slot.order)
                    .await
                {
                    Ok(existing) => existing,
                    Err(err) => {
                        ctx.stats.error(context, err);
                        continue;
                    }
                };

                let workout_exercise_id = match existing {
                    Some(existing) => {
                        ctx.stats.workout_exercises_existing += 1;
                        match existing.exercise_id {
                            Some(bound) if bound != exercise_id => {
                                ctx.stats.warn(format!(
                                    "{}: slot holds exercise {} but runs list \"{}\" ({}), kept as is",
                                    context, bound, slot.exercise_name, exercise_id
                                ));
                                continue;
                            }
                            _ if existing.is_ad_hoc => {
                                log::debug!("{}: ad hoc slot, no progressions", context);
                                continue;
                            }
                            _ => existing.id,
                        }
                    }
                    None => {
                        let workout_exercise = NewWorkoutExercise {
                            program_workout_id,
                            exercise_id,
                            exercise_order: slot.order,
                            target_sets: target.sets,
                            target_reps_min: target.reps_min,
                            target_reps_max: target.reps_max,
                            is_ad_hoc: false,
                        };
                        match self.store.insert_workout_exercise(&workout_exercise).await {
                            Ok(id) => {
                                ctx.stats.workout_exercises_created += 1;
                                id
                            }
                            Err(err) => {
                                ctx.stats.error(context, err);
                                continue;
                            }
                        }
                    }
                };

                ensure_progressions(self.store, workout_exercise_id, week_number, workout_type, ctx)
                    .await;
            }
        }
    }
}

/// Create the missing progressions of one template exercise, one per week of
/// the cycle `week_number` falls in.
pub(crate) async fn ensure_progressions<S: ImportStore>(
    store: &S,
    workout_exercise_id: RecordId,
    week_number: i32,
    workout_type: WorkoutType,
    ctx: &mut ImportContext,
) {
    for week in schedule::weeks_of_cycle(schedule::cycle_for_week(week_number)) {
        let context = format!(
            "progression week {} for template exercise {}",
            week, workout_exercise_id
        );

        match store.find_progression(workout_exercise_id, week).await {
            Ok(Some(_)) => {
                ctx.stats.progressions_existing += 1;
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                ctx.stats.error(context, err);
                continue;
            }
        }

        let target = schedule::prescription(workout_type, schedule::micro_cycle_for_week(week));
        let progression = NewProgression {
            program_workout_exercise_id: workout_exercise_id,
            week_number: week,
            volume_sets: target.sets,
            reps_min: target.reps_min,
            reps_max: target.reps_max,
            notes: schedule::is_max_test_week(week).then(|| MAX_TEST_NOTE.to_string()),
        };

        match store.insert_progression(&progression).await {
            Ok(_) => ctx.stats.progressions_created += 1,
            Err(err) => ctx.stats.error(context, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::exercises::ExerciseResolver;
    use crate::import::stats::ImportStats;
    use crate::models::{CorrelatedWorkout, ParsedExercise, WorkoutStatus};
    use crate::store::{FailPoint, MemoryStore};
    use chrono::NaiveDate;

    fn settings() -> ProgramSettings {
        ProgramSettings {
            slug: "hybrid-strength-96".to_string(),
            title: "Hybrid Strength".to_string(),
        }
    }

    fn workout(week: i32, day: i32, names: &[&str]) -> CorrelatedWorkout {
        CorrelatedWorkout {
            week_number: week,
            day_number: day,
            scheduled_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: None,
            status: WorkoutStatus::Completed,
            exercises: names
                .iter()
                .enumerate()
                .map(|(i, name)| ParsedExercise {
                    name: name.to_string(),
                    order: i as i32 + 1,
                    notes: None,
                    performed_date: None,
                    warmup_sets: vec![],
                    working_sets: vec![],
                })
                .collect(),
        }
    }

    async fn build_once(
        store: &MemoryStore,
        workouts: &[CorrelatedWorkout],
    ) -> Result<ImportContext, ImportError> {
        let mut ctx = ImportContext::new();
        let names: Vec<&str> = workouts
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.name.as_str()))
            .collect();
        ExerciseResolver::new(store, None)
            .resolve_all(names, &mut ctx)
            .await;

        let mut assignments = SlotAssignments::new();
        let mut scratch = ImportStats::default();
        assignments.observe("A", workouts, &mut scratch);

        let settings = settings();
        TemplateHierarchyBuilder::new(store, &settings)
            .build(&assignments, &mut ctx)
            .await?;
        Ok(ctx)
    }

    #[tokio::test]
    async fn builds_full_grid_once() {
        let store = MemoryStore::new();
        let ctx = build_once(&store, &[workout(3, 2, &["Bench Press", "Row"])])
            .await
            .unwrap();

        let counts = store.row_counts();
        assert_eq!(counts.programs, 1);
        assert_eq!(counts.cycles, 3);
        assert_eq!(counts.program_workouts, 72);
        assert_eq!(counts.workout_exercises, 2);
        assert_eq!(counts.progressions, 8);
        assert_eq!(ctx.stats.program_workouts_created, 72);
        assert_eq!(ctx.workout_template_count(), 72);

        let again = build_once(&store, &[workout(3, 2, &["Bench Press", "Row"])])
            .await
            .unwrap();
        assert_eq!(store.row_counts(), counts);
        assert_eq!(again.stats.programs_existing, 1);
        assert_eq!(again.stats.cycles_existing, 3);
        assert_eq!(again.stats.program_workouts_existing, 72);
        assert_eq!(again.stats.workout_exercises_existing, 2);
        assert_eq!(again.stats.progressions_existing, 8);
    }

    #[tokio::test]
    async fn prescriptions_follow_scheme_table() {
        let store = MemoryStore::new();
        build_once(&store, &[workout(3, 2, &["Bench Press"])])
            .await
            .unwrap();

        let tables = store.snapshot();
        let template = &tables.workout_exercises[0];
        assert_eq!(template.exercise_order, 1);
        assert_eq!(
            (template.target_sets, template.target_reps_min, template.target_reps_max),
            (5, 8, 10)
        );
        assert!(!template.is_ad_hoc);

        let mut progressions: Vec<_> = tables.progressions.iter().map(|p| &p.row).collect();
        progressions.sort_by_key(|p| p.week_number);
        let weeks: Vec<i32> = progressions.iter().map(|p| p.week_number).collect();
        assert_eq!(weeks, vec![1, 2, 3, 4]);
        assert_eq!(progressions[0].volume_sets, 3);
        assert_eq!(progressions[3].notes.as_deref(), Some(MAX_TEST_NOTE));
        assert!(progressions[..3].iter().all(|p| p.notes.is_none()));

        let workout = tables
            .program_workouts
            .iter()
            .find(|w| w.row.week_number == 3 && w.row.day_number == 2)
            .unwrap();
        assert_eq!(workout.row.workout_type, WorkoutType::Hypertrophy);
        assert_eq!(workout.row.name, "Week 3 Day 2 - Hypertrophy");
    }

    #[tokio::test]
    async fn cycle_failure_is_fatal() {
        let store = MemoryStore::new();
        store.fail_once(FailPoint::Cycle(2));

        let result = build_once(&store, &[]).await;
        assert!(matches!(
            result,
            Err(ImportError::CycleCreation { cycle_number: 2, .. })
        ));
        assert_eq!(store.row_counts().program_workouts, 0);
    }

    #[tokio::test]
    async fn program_failure_is_fatal() {
        let store = MemoryStore::new();
        store.fail_once(FailPoint::Program);

        let result = build_once(&store, &[]).await;
        assert!(matches!(result, Err(ImportError::ProgramCreation { .. })));
    }

    #[tokio::test]
    async fn missing_template_workout_is_warned_downstream() {
        let store = MemoryStore::new();
        store.fail_once(FailPoint::ProgramWorkout {
            week_number: 1,
            day_number: 1,
        });

        let ctx = build_once(&store, &[workout(1, 1, &["Squat"])])
            .await
            .unwrap();

        assert_eq!(ctx.stats.errors.len(), 1);
        assert_eq!(ctx.stats.errors[0].context, "template week 1 day 1");
        assert!(ctx
            .stats
            .warnings
            .iter()
            .any(|w| w == "no template for week 1 day 1"));
        assert_eq!(store.row_counts().program_workouts, 71);
        assert_eq!(store.row_counts().workout_exercises, 0);
    }

    #[tokio::test]
    async fn unresolved_exercise_skips_slot() {
        let store = MemoryStore::new();
        store.fail_once(FailPoint::Exercise {
            slug: "row".to_string(),
        });

        let ctx = build_once(&store, &[workout(2, 1, &["Squat", "Row"])])
            .await
            .unwrap();

        assert_eq!(store.row_counts().workout_exercises, 1);
        assert!(ctx
            .stats
            .warnings
            .iter()
            .any(|w| w.contains("week 2 day 1 order 2") && w.contains("Row")));
    }
}
