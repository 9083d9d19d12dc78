//! In-memory adapters used by tests and the demo binary.

mod local_store;
mod remote;

pub use local_store::InMemoryLocalTaskStore;
pub use remote::{InMemoryRemoteTaskService, RemoteCallCounts};
