//! Application services for task synchronisation.

mod mutation;
mod query;
mod sync;

pub use mutation::TaskMutationService;
pub use query::{LOAD_FAILED_MESSAGE, TaskQueryService};
pub use sync::TaskSyncService;
