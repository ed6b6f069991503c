//! Historical training import pipeline.
//!
//! Turns parsed training logs into the program template hierarchy plus the
//! per-user instance records that reference it.
//!
//! # Organization
//!
//! - `coordinator`: Orchestrates the phases of one import
//! - `exercises`: Canonical exercise resolution
//! - `correlation`: Week/day placement and template slot assignment
//! - `templates`: Program, cycle, workout and progression templates
//! - `instances`: Program, workout, exercise and set instances
//! - `schedule`: Program shape and rep schemes
//! - `data_builder`: Volume, split-session and set numbering helpers
//! - `normalize`: Exercise name folding
//! - `context`: Per-run caches
//! - `stats`: Import statistics tracking

pub mod context;
pub mod coordinator;
pub mod correlation;
pub mod data_builder;
pub mod exercises;
pub mod instances;
pub mod normalize;
pub mod schedule;
pub mod stats;
pub mod templates;

pub use context::ImportContext;
pub use coordinator::HistoryImporter;
pub use correlation::{CadenceCorrelator, SlotAssignments, WorkoutCorrelator};
pub use instances::{RESOLUTION_ORDER, TemplateMatch};
pub use stats::{ImportIssue, ImportStats};
pub use templates::ProgramSettings;
