//! Import statistics tracking.
//!
//! Tracks created/existing counts per entity, along with the warnings and
//! per-record errors collected while importing a training history. One value is
//! threaded through every phase of a run and handed back to the caller.

use serde::Serialize;
use std::fmt;

/// A failed record write, with enough context to find the record again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportIssue {
    pub context: String,
    pub message: String,
}

/// Statistics for a single import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub exercises_created: usize,
    pub exercises_existing: usize,
    pub programs_created: usize,
    pub programs_existing: usize,
    pub cycles_created: usize,
    pub cycles_existing: usize,
    pub program_workouts_created: usize,
    pub program_workouts_existing: usize,
    pub workout_exercises_created: usize,
    pub workout_exercises_existing: usize,
    /// Template exercises added during instance import for unplanned exercises.
    pub ad_hoc_workout_exercises: usize,
    pub progressions_created: usize,
    pub progressions_existing: usize,
    pub program_instances_created: usize,
    pub program_instances_existing: usize,
    pub workout_instances_created: usize,
    pub workout_instances_existing: usize,
    /// Sessions performed across more than one calendar day.
    pub split_workouts: usize,
    /// Existing workouts whose stored volume was rewritten.
    pub volume_updates: usize,
    pub exercise_instances_created: usize,
    pub exercise_instances_existing: usize,
    pub set_instances_created: usize,
    pub set_instances_existing: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<ImportIssue>,
}

impl ImportStats {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn error(&mut self, context: impl Into<String>, message: impl fmt::Display) {
        let issue = ImportIssue {
            context: context.into(),
            message: message.to_string(),
        };
        log::error!("{}: {}", issue.context, issue.message);
        self.errors.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("exercises", self.exercises_created, self.exercises_existing),
            ("programs", self.programs_created, self.programs_existing),
            ("cycles", self.cycles_created, self.cycles_existing),
            (
                "program workouts",
                self.program_workouts_created,
                self.program_workouts_existing,
            ),
            (
                "workout exercises",
                self.workout_exercises_created,
                self.workout_exercises_existing,
            ),
            (
                "progressions",
                self.progressions_created,
                self.progressions_existing,
            ),
            (
                "program instances",
                self.program_instances_created,
                self.program_instances_existing,
            ),
            (
                "workout instances",
                self.workout_instances_created,
                self.workout_instances_existing,
            ),
            (
                "exercise instances",
                self.exercise_instances_created,
                self.exercise_instances_existing,
            ),
            (
                "set instances",
                self.set_instances_created,
                self.set_instances_existing,
            ),
        ];

        for (label, created, existing) in rows {
            writeln!(f, "{:<20} created {:>6}  existing {:>6}", label, created, existing)?;
        }
        writeln!(f, "ad hoc template exercises: {}", self.ad_hoc_workout_exercises)?;
        writeln!(f, "split workouts: {}", self.split_workouts)?;
        writeln!(f, "volume updates: {}", self.volume_updates)?;

        if !self.warnings.is_empty() {
            writeln!(f, "warnings ({}):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }
        if !self.errors.is_empty() {
            writeln!(f, "errors ({}):", self.errors.len())?;
            for issue in &self.errors {
                writeln!(f, "  - {}: {}", issue.context, issue.message)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_are_not_errors() {
        let mut stats = ImportStats::default();
        stats.warn("week 2 day 1: template disagreement");
        assert!(!stats.has_errors());
        stats.error("run A", "boom");
        assert!(stats.has_errors());
        assert_eq!(stats.warnings.len(), 1);
    }

    #[test]
    fn display_lists_errors_with_context() {
        let mut stats = ImportStats::default();
        stats.error("run A week 3 day 2", "database unavailable");
        let rendered = stats.to_string();
        assert!(rendered.contains("errors (1):"));
        assert!(rendered.contains("run A week 3 day 2: database unavailable"));
    }
}
