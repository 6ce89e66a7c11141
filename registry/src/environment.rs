//! Dependency injection for the registry reducer.

use crate::api::{CoursesApi, EnrollmentsApi, InMemoryRecordsApi, StudentsApi, UsersApi};
use crate::token_store::{InMemoryTokenStore, TokenStore};
use campus_registry_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Everything the reducer's effects reach out to. All dependencies sit
/// behind trait objects so tests can substitute fixtures.
#[derive(Clone)]
pub struct RegistryEnvironment {
    pub students: Arc<dyn StudentsApi>,
    pub courses: Arc<dyn CoursesApi>,
    pub enrollments: Arc<dyn EnrollmentsApi>,
    pub users: Arc<dyn UsersApi>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<dyn TokenStore>,
}

impl RegistryEnvironment {
    /// Environment backed by a single in-process record service. Used by
    /// the demo binary and integration tests.
    #[must_use]
    pub fn in_memory(api: InMemoryRecordsApi) -> Self {
        let api = Arc::new(api);
        Self {
            students: api.clone(),
            courses: api.clone(),
            enrollments: api.clone(),
            users: api,
            clock: Arc::new(SystemClock),
            tokens: Arc::new(InMemoryTokenStore::new()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
