//! Report builders over recorded run data.
//!
//! Each builder consumes the same filtered view of the store and emits a
//! differently-shaped artifact: a static HTML site, a JUnit XML document or a
//! binary subunit v2 stream.

pub mod html;
pub mod junit;
pub mod subunit;
mod templates;

use log::warn;

use crate::config::Config;
use crate::error::Result;
use crate::models::{Playbook, TaskResult};
use crate::query::{self, Completion};
use crate::store::Store;

/// Resolve the playbooks a report run covers.
///
/// A scoped run names a specific playbook, so a missing id is NotFound;
/// an unscoped run covers whatever the store holds, possibly nothing.
pub(crate) fn scoped_playbooks(store: &Store, playbook: Option<i64>) -> Result<Vec<Playbook>> {
    match playbook {
        Some(id) => Ok(vec![store.get_playbook(id)?]),
        None => query::playbooks(store, Completion::All),
    }
}

/// Advisory for reports generated from zero rows. Generation proceeds either
/// way; the config option only controls the warning. Returns whether the
/// advisory was emitted.
pub(crate) fn warn_if_empty(results: &[TaskResult], config: &Config, artifact: &str) -> bool {
    if !results.is_empty() || config.ignore_empty_generation {
        return false;
    }
    warn!(
        "No results found in the database, the generated {} report will be empty",
        artifact
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ResultFilter;
    use crate::testing::FakeRun;

    #[test]
    fn test_empty_generation_warns_by_default() {
        assert!(warn_if_empty(&[], &Config::default(), "HTML"));
    }

    #[test]
    fn test_empty_generation_advisory_can_be_suppressed() {
        let config = Config {
            ignore_empty_generation: true,
            ..Config::default()
        };
        assert!(!warn_if_empty(&[], &config, "HTML"));
    }

    #[test]
    fn test_no_advisory_when_results_exist() {
        let store = Store::open_in_memory().unwrap();
        FakeRun::record(&store).unwrap();

        let results = query::results(&store, &ResultFilter::default()).unwrap();
        assert!(!warn_if_empty(&results, &Config::default(), "HTML"));
    }
}
