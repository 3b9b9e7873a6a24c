use std::env;
use std::path::PathBuf;

use log::debug;

/// Runtime configuration, resolved from the environment.
///
/// `PLAYBACK_DATABASE` overrides the database location; the default lives
/// under the platform data directory. `PLAYBACK_IGNORE_EMPTY_GENERATION`
/// suppresses the advisory emitted when a report is generated from an empty
/// result set.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: PathBuf,
    pub ignore_empty_generation: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let database = env::var("PLAYBACK_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_database_path());

        let ignore_empty_generation = env::var("PLAYBACK_IGNORE_EMPTY_GENERATION")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        debug!("Using database at {}", database.display());

        Config {
            database,
            ignore_empty_generation,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: default_database_path(),
            ignore_empty_generation: false,
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playback")
        .join("playback.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.ignore_empty_generation);
        assert!(config.database.ends_with("playback/playback.sqlite"));
    }

    #[test]
    fn test_from_env_overrides() {
        env::set_var("PLAYBACK_DATABASE", "/tmp/playback-env-test.sqlite");
        env::set_var("PLAYBACK_IGNORE_EMPTY_GENERATION", "true");
        let enabled = Config::from_env();

        env::set_var("PLAYBACK_IGNORE_EMPTY_GENERATION", "0");
        let disabled = Config::from_env();

        env::remove_var("PLAYBACK_DATABASE");
        env::remove_var("PLAYBACK_IGNORE_EMPTY_GENERATION");

        assert_eq!(enabled.database, PathBuf::from("/tmp/playback-env-test.sqlite"));
        assert!(enabled.ignore_empty_generation);
        assert!(!disabled.ignore_empty_generation);
    }
}
