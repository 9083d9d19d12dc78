//! Port contracts for task synchronisation.
//!
//! Ports define infrastructure-agnostic interfaces to the local store and
//! the remote task API used by the task services.

pub mod local_store;
pub mod remote;

pub use local_store::{
    LocalStoreError, LocalStoreResult, LocalTaskStore, TaskRecord, TaskRecordStream,
};
pub use remote::{RemoteServiceError, RemoteServiceResult, RemoteTask, RemoteTaskService};

#[cfg(test)]
pub use local_store::MockLocalTaskStore;
#[cfg(test)]
pub use remote::MockRemoteTaskService;
