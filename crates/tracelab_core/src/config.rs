//! Lab configuration.

use crate::error::{CoreError, CoreResult};
use tracelab_store::StoreConfig;

/// Literals and limits used by the read templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// First name matched by the first-name lookup.
    pub first_name: String,
    /// Last name matched by the last-name lookup.
    pub last_name: String,
    /// Row limit of the limited album scan.
    pub album_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            first_name: "Captain".to_string(),
            last_name: "Zero".to_string(),
            album_limit: 10,
        }
    }
}

impl QueryConfig {
    /// Sets the first name the first-name lookup matches.
    #[must_use]
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = value.into();
        self
    }

    /// Sets the last name the last-name lookup matches.
    #[must_use]
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = value.into();
        self
    }

    /// Sets the limit of the limited album scan.
    #[must_use]
    pub const fn album_limit(mut self, limit: usize) -> Self {
        self.album_limit = limit;
        self
    }
}

/// Configuration for a lab run.
#[derive(Debug, Clone)]
pub struct LabConfig {
    /// Project that owns the database; required.
    pub project: String,

    /// Database instance.
    pub instance: String,

    /// Database name.
    pub database: String,

    /// Iterations the simulation runs.
    pub iterations: usize,

    /// Seed of the random source (0 = draw one from entropy).
    pub seed: u64,

    /// Read template settings.
    pub queries: QueryConfig,

    /// Store settings.
    pub store: StoreConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            instance: "test-instance".to_string(),
            database: "test".to_string(),
            iterations: 100,
            seed: 0,
            queries: QueryConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl LabConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the project.
    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Sets the instance.
    #[must_use]
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the number of simulation iterations.
    #[must_use]
    pub const fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the read template settings.
    #[must_use]
    pub fn queries(mut self, queries: QueryConfig) -> Self {
        self.queries = queries;
        self
    }

    /// Sets the store settings.
    #[must_use]
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Checks that every required parameter is present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.project.trim().is_empty() {
            return Err(CoreError::configuration("project is required"));
        }
        if self.instance.trim().is_empty() || self.database.trim().is_empty() {
            return Err(CoreError::configuration(
                "instance and database must not be empty",
            ));
        }
        Ok(())
    }

    /// Returns the fully qualified database path.
    #[must_use]
    pub fn database_path(&self) -> String {
        format!(
            "projects/{}/instances/{}/databases/{}",
            self.project, self.instance, self.database
        )
    }

    /// Returns the configured seed, or a fresh one from entropy when unset.
    #[must_use]
    pub fn effective_seed(&self) -> u64 {
        if self.seed != 0 {
            return self.seed;
        }
        loop {
            let seed = rand::random::<u64>();
            if seed != 0 {
                return seed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LabConfig::default();
        assert_eq!(config.instance, "test-instance");
        assert_eq!(config.database, "test");
        assert_eq!(config.iterations, 100);
        assert_eq!(config.queries.first_name, "Captain");
        assert_eq!(config.queries.last_name, "Zero");
        assert_eq!(config.queries.album_limit, 10);
    }

    #[test]
    fn builder_pattern() {
        let config = LabConfig::new()
            .project("demo")
            .instance("east")
            .database("music")
            .iterations(5)
            .seed(42)
            .queries(QueryConfig::default().album_limit(3));

        assert_eq!(config.iterations, 5);
        assert_eq!(config.effective_seed(), 42);
        assert_eq!(config.queries.album_limit, 3);
        assert_eq!(
            config.database_path(),
            "projects/demo/instances/east/databases/music"
        );
    }

    #[test]
    fn missing_project_is_a_configuration_error() {
        let err = LabConfig::new().validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(LabConfig::new().project("demo").validate().is_ok());
        assert!(LabConfig::new()
            .project("demo")
            .database(" ")
            .validate()
            .is_err());
    }

    #[test]
    fn zero_seed_draws_from_entropy() {
        assert_ne!(LabConfig::new().effective_seed(), 0);
    }
}
