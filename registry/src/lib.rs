//! # Campus Registry
//!
//! A records-management core for students, courses and enrollments, built
//! on a reducer/effect architecture. State lives in normalized collections,
//! commands flow through one reducer, remote calls run as effects, and the
//! enrollment coordinator keeps each course's seat count consistent with
//! its active enrollments without transactions.
//!
//! Entry points:
//! - [`dispatcher::Dispatcher`] for commands (serialized per collection)
//! - [`selectors`] for reads over a state snapshot
//!
//! ## Example
//!
//! ```ignore
//! let env = RegistryEnvironment::in_memory(InMemoryRecordsApi::new());
//! let store = Store::new(RegistryState::default(), RegistryReducer, env);
//! let dispatcher = Dispatcher::new(store, Duration::from_secs(10));
//!
//! dispatcher.load_courses().await?;
//! let enrollment = dispatcher.add_enrollment(new).await?;
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod token_store;
pub mod types;

pub use actions::{EntityKind, RegistryAction};
pub use api::InMemoryRecordsApi;
pub use config::RegistryConfig;
pub use dispatcher::{Dispatcher, RegistryStore};
pub use environment::RegistryEnvironment;
pub use error::{AdmissionError, RegistryError};
pub use reducer::RegistryReducer;
pub use state::RegistryState;
