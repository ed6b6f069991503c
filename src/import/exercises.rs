//! Exercise resolution against the canonical catalogue.
//!
//! Every distinct name seen in the history is folded to a slug and mapped onto
//! exactly one exercise row. Creation is idempotent even with another writer
//! racing us: a unique conflict on insert is answered by reading the row the
//! other writer created.

use crate::import::context::ImportContext;
use crate::import::normalize::{display_name, exercise_slug};
use crate::models::{NewExercise, RecordId};
use crate::store::{ImportStore, StoreError};

/// How a slug was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Existing(RecordId),
    Created(RecordId),
}

pub struct ExerciseResolver<'a, S> {
    store: &'a S,
    created_by: Option<&'a str>,
}

impl<'a, S: ImportStore> ExerciseResolver<'a, S> {
    pub fn new(store: &'a S, created_by: Option<&'a str>) -> Self {
        Self { store, created_by }
    }

    /// Resolve every name into `ctx`, creating missing exercises.
    ///
    /// Names that cannot be resolved are recorded as errors and left out of
    /// the name → id map, so later phases skip them with a warning.
    pub async fn resolve_all<'n, I>(&self, names: I, ctx: &mut ImportContext)
    where
        I: IntoIterator<Item = &'n str>,
    {
        let mut seen = 0usize;

        for name in names {
            seen += 1;
            let slug = exercise_slug(name);
            if slug.is_empty() {
                ctx.stats.error(
                    format!("exercise \"{}\"", name),
                    "name has no alphanumeric characters",
                );
                continue;
            }

            if let Some(id) = ctx.slug_id(&slug) {
                ctx.record_exercise(name, &slug, id);
                continue;
            }

            match self.resolve_slug(name, &slug).await {
                Ok(Resolution::Existing(id)) => {
                    ctx.stats.exercises_existing += 1;
                    ctx.record_exercise(name, &slug, id);
                }
                Ok(Resolution::Created(id)) => {
                    log::debug!("created exercise {} for \"{}\"", slug, name);
                    ctx.stats.exercises_created += 1;
                    ctx.record_exercise(name, &slug, id);
                }
                Err(err) => {
                    ctx.stats
                        .error(format!("exercise \"{}\" ({})", name, slug), err);
                }
            }
        }

        log::info!(
            "exercises: {} names, {} created, {} existing",
            seen,
            ctx.stats.exercises_created,
            ctx.stats.exercises_existing
        );
    }

    async fn resolve_slug(&self, name: &str, slug: &str) -> Result<Resolution, StoreError> {
        if let Some(id) = self.store.find_exercise_by_slug(slug).await? {
            return Ok(Resolution::Existing(id));
        }

        let exercise = NewExercise {
            name: display_name(name),
            slug: slug.to_string(),
            description: None,
            created_by: self.created_by.map(str::to_string),
        };

        match self.store.insert_exercise(&exercise).await {
            Ok(id) => Ok(Resolution::Created(id)),
            Err(err) if err.is_conflict() => {
                log::debug!("exercise {} created concurrently, re-reading", slug);
                match self.store.find_exercise_by_slug(slug).await? {
                    Some(id) => Ok(Resolution::Existing(id)),
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}
