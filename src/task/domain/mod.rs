//! Domain model for task synchronisation.
//!
//! The domain holds the task entity, its enumerated fields, and the
//! loading/success/error envelope. It has no knowledge of the local store
//! or the remote service.

mod error;
mod ids;
mod resource;
mod task;

pub use error::TaskDomainError;
pub use ids::{TaskId, TaskTitle};
pub use resource::{Resource, ResourceStream, first_outcome};
pub use task::{PersistedTaskData, Priority, PriorityOrder, Task, TaskStatus};
