use crate::import::ProgramSettings;
use std::env;

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub const DEFAULT_PROGRAM_SLUG: &str = "hybrid-strength-96";
pub const DEFAULT_PROGRAM_TITLE: &str = "Hybrid Strength 96";

/// Runtime configuration for the importer.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Absent for dry runs.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub program_slug: String,
    pub program_title: String,
    pub exercise_creator: Option<String>,
}

impl ImporterConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env_optional("DATABASE_URL"),
            max_connections: u32::try_from(env_usize("IMPORT_MAX_CONNECTIONS", 5).max(1))
                .unwrap_or(u32::MAX),
            program_slug: env_string("IMPORT_PROGRAM_SLUG", DEFAULT_PROGRAM_SLUG),
            program_title: env_string("IMPORT_PROGRAM_TITLE", DEFAULT_PROGRAM_TITLE),
            exercise_creator: env_optional("IMPORT_EXERCISE_CREATOR"),
        }
    }

    pub fn program_settings(&self) -> ProgramSettings {
        ProgramSettings {
            slug: self.program_slug.clone(),
            title: self.program_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_settings_carry_slug_and_title() {
        let config = ImporterConfig {
            database_url: None,
            max_connections: 5,
            program_slug: "custom".to_string(),
            program_title: "Custom".to_string(),
            exercise_creator: None,
        };
        let settings = config.program_settings();
        assert_eq!(settings.slug, "custom");
        assert_eq!(settings.title, "Custom");
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(env_usize("IMPORT_TEST_UNSET_USIZE", 7), 7);
        assert_eq!(env_string("IMPORT_TEST_UNSET_STRING", "x"), "x");
        assert_eq!(env_optional("IMPORT_TEST_UNSET_OPTIONAL"), None);
    }
}
