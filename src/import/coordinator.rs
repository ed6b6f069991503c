//! Import coordination for historical training runs.
//!
//! The HistoryImporter drives the pipeline over every parsed run:
//! 1. Resolve every exercise name seen in any run
//! 2. Correlate each run onto program weeks and days, collecting template
//!    slot assignments across runs
//! 3. Build the template hierarchy
//! 4. Import each run's instances

use crate::error::ImportError;
use crate::import::context::ImportContext;
use crate::import::correlation::{CadenceCorrelator, SlotAssignments, WorkoutCorrelator};
use crate::import::exercises::ExerciseResolver;
use crate::import::instances::InstanceImporter;
use crate::import::stats::ImportStats;
use crate::import::templates::{ProgramSettings, TemplateHierarchyBuilder};
use crate::models::{CorrelatedWorkout, ProgramInstanceData};
use crate::store::ImportStore;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Coordinates a full history import against one store.
pub struct HistoryImporter<'a, S, C = CadenceCorrelator> {
    store: &'a S,
    correlator: C,
    settings: ProgramSettings,
    user_id: Uuid,
    created_by: Option<String>,
}

impl<'a, S: ImportStore> HistoryImporter<'a, S> {
    /// Create an importer using the default cadence correlation.
    ///
    /// # Arguments
    /// * `store` - Target store for every created row
    /// * `settings` - Program template the runs belong to
    /// * `user_id` - Owner of the imported program instances
    pub fn new(store: &'a S, settings: ProgramSettings, user_id: Uuid) -> Self {
        Self::with_correlator(store, CadenceCorrelator, settings, user_id)
    }
}

impl<'a, S: ImportStore, C: WorkoutCorrelator> HistoryImporter<'a, S, C> {
    pub fn with_correlator(
        store: &'a S,
        correlator: C,
        settings: ProgramSettings,
        user_id: Uuid,
    ) -> Self {
        Self {
            store,
            correlator,
            settings,
            user_id,
            created_by: None,
        }
    }

    /// Record `created_by` on exercises this import creates.
    pub fn created_by(mut self, creator: impl Into<String>) -> Self {
        self.created_by = Some(creator.into());
        self
    }

    /// Import every run and return the accumulated statistics.
    ///
    /// # Returns
    /// Statistics for the whole import, or an [`ImportError`] if the program
    /// or its cycles could not be created. Per-record failures do not abort
    /// and are listed in [`ImportStats::errors`].
    pub async fn run(&self, runs: &[ProgramInstanceData]) -> Result<ImportStats, ImportError> {
        let mut ctx = ImportContext::new();

        // Phase 1: exercises
        let names: BTreeSet<&str> = runs
            .iter()
            .flat_map(|run| run.workouts.iter())
            .flat_map(|workout| workout.exercises.iter())
            .map(|exercise| exercise.name.as_str())
            .collect();
        log::info!(
            "phase 1: resolving {} exercise names from {} runs",
            names.len(),
            runs.len()
        );
        ExerciseResolver::new(self.store, self.created_by.as_deref())
            .resolve_all(names, &mut ctx)
            .await;
        log::debug!("{} canonical exercises", ctx.resolved_exercise_count());

        // Phase 2: correlation and slot assignment
        let correlated: Vec<Vec<CorrelatedWorkout>> = runs
            .iter()
            .map(|run| self.correlator.build_workouts(run))
            .collect();
        let mut assignments = SlotAssignments::new();
        for (run, workouts) in runs.iter().zip(&correlated) {
            assignments.observe(&run.name, workouts, &mut ctx.stats);
        }
        log::info!("phase 2: {} template slots assigned", assignments.len());

        // Phase 3: template hierarchy
        log::info!("phase 3: building program {}", self.settings.slug);
        TemplateHierarchyBuilder::new(self.store, &self.settings)
            .build(&assignments, &mut ctx)
            .await?;

        // Phase 4: instances
        log::info!("phase 4: importing {} runs", runs.len());
        let instances = InstanceImporter::new(self.store, self.user_id);
        for (run, workouts) in runs.iter().zip(&correlated) {
            instances.import_run(run, workouts, &mut ctx).await;
        }

        let stats = ctx.into_stats();
        log::info!(
            "import finished: {} workouts created, {} existing, {} warnings, {} errors",
            stats.workout_instances_created,
            stats.workout_instances_existing,
            stats.warnings.len(),
            stats.errors.len()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParsedExercise, ParsedSet, ParsedWorkout, WorkoutStatus};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn settings() -> ProgramSettings {
        ProgramSettings {
            slug: "hybrid-strength-96".to_string(),
            title: "Hybrid Strength".to_string(),
        }
    }

    fn run(name: &str, exercise: &str) -> ProgramInstanceData {
        ProgramInstanceData {
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
            end_date: None,
            is_ongoing: false,
            cycles: vec![1],
            workouts: vec![ParsedWorkout {
                scheduled_date: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
                end_date: None,
                status: WorkoutStatus::Completed,
                week_number: None,
                day_number: None,
                exercises: vec![ParsedExercise {
                    name: exercise.to_string(),
                    order: 1,
                    notes: None,
                    performed_date: None,
                    warmup_sets: vec![],
                    working_sets: vec![ParsedSet {
                        reps: 5,
                        weight: 100.0,
                        difficulty: None,
                        increase_weight: false,
                    }],
                }],
            }],
        }
    }

    /// Correlator that puts every workout on week 2 day 2.
    struct FixedSlot;

    impl WorkoutCorrelator for FixedSlot {
        fn build_workouts(&self, instance: &ProgramInstanceData) -> Vec<CorrelatedWorkout> {
            CadenceCorrelator
                .build_workouts(instance)
                .into_iter()
                .map(|mut workout| {
                    workout.week_number = 2;
                    workout.day_number = 2;
                    workout
                })
                .collect()
        }
    }

    #[tokio::test]
    async fn first_run_defines_template_slot() {
        let store = MemoryStore::new();
        let stats = HistoryImporter::new(&store, settings(), Uuid::new_v4())
            .run(&[run("A", "Squat"), run("B", "Front Squat")])
            .await
            .unwrap();

        let tables = store.snapshot();
        let planned: Vec<_> = tables.workout_exercises.iter().filter(|r| !r.is_ad_hoc).collect();
        assert_eq!(planned.len(), 1);
        assert_eq!(stats.ad_hoc_workout_exercises, 1);
        assert_eq!(stats.program_instances_created, 2);
        assert_eq!(stats.warnings.len(), 1);
        assert!(stats.warnings[0].contains("run \"B\""));
    }

    #[tokio::test]
    async fn custom_correlator_is_used() {
        let store = MemoryStore::new();
        HistoryImporter::with_correlator(&store, FixedSlot, settings(), Uuid::new_v4())
            .created_by("history import")
            .run(&[run("A", "Squat")])
            .await
            .unwrap();

        let tables = store.snapshot();
        assert_eq!(tables.workout_instances[0].row.week_number, 2);
        assert_eq!(tables.workout_instances[0].row.day_number, 2);
        assert_eq!(
            tables.exercises[0].row.created_by.as_deref(),
            Some("history import")
        );
    }

    #[tokio::test]
    async fn fatal_errors_abort_the_run() {
        let store = MemoryStore::new();
        store.fail_once(crate::store::FailPoint::Program);

        let result = HistoryImporter::new(&store, settings(), Uuid::new_v4())
            .run(&[run("A", "Squat")])
            .await;

        assert!(matches!(result, Err(ImportError::ProgramCreation { .. })));
        assert_eq!(store.row_counts().program_instances, 0);
    }
}
