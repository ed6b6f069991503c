//! Per-run state shared by the import phases.

use crate::import::stats::ImportStats;
use crate::models::RecordId;
use std::collections::{BTreeMap, HashMap};

/// Read-through caches and the statistics accumulator owned by one import run.
///
/// Every map is filled by the phase that resolves it and only read afterwards:
/// exercise ids by the resolver, cycle and template ids by the hierarchy
/// builder.
#[derive(Debug, Default)]
pub struct ImportContext {
    pub stats: ImportStats,
    exercise_ids: HashMap<String, RecordId>,
    slug_ids: HashMap<String, RecordId>,
    program_id: Option<RecordId>,
    cycle_ids: BTreeMap<i32, RecordId>,
    workout_templates: HashMap<(i32, i32), RecordId>,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_stats(self) -> ImportStats {
        self.stats
    }

    /// Canonical exercise id for a raw name as it appears in the logs.
    pub fn exercise_id(&self, raw_name: &str) -> Option<RecordId> {
        self.exercise_ids.get(raw_name).copied()
    }

    pub(crate) fn slug_id(&self, slug: &str) -> Option<RecordId> {
        self.slug_ids.get(slug).copied()
    }

    pub(crate) fn record_exercise(&mut self, raw_name: &str, slug: &str, id: RecordId) {
        self.exercise_ids.insert(raw_name.to_string(), id);
        self.slug_ids.insert(slug.to_string(), id);
    }

    pub fn resolved_exercise_count(&self) -> usize {
        self.slug_ids.len()
    }

    pub fn program_id(&self) -> Option<RecordId> {
        self.program_id
    }

    pub(crate) fn set_program(&mut self, id: RecordId) {
        self.program_id = Some(id);
    }

    pub fn cycle_id(&self, cycle_number: i32) -> Option<RecordId> {
        self.cycle_ids.get(&cycle_number).copied()
    }

    pub(crate) fn record_cycle(&mut self, cycle_number: i32, id: RecordId) {
        self.cycle_ids.insert(cycle_number, id);
    }

    pub fn workout_template(&self, week_number: i32, day_number: i32) -> Option<RecordId> {
        self.workout_templates
            .get(&(week_number, day_number))
            .copied()
    }

    pub(crate) fn record_workout_template(
        &mut self,
        week_number: i32,
        day_number: i32,
        id: RecordId,
    ) {
        self.workout_templates.insert((week_number, day_number), id);
    }

    pub fn workout_template_count(&self) -> usize {
        self.workout_templates.len()
    }
}
