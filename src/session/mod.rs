//! View-state coordination for a task screen.
//!
//! A [`TaskSession`] owns the [`ViewState`] for one screen. Presentation
//! code submits [`SessionEvent`]s through a [`SessionHandle`] and renders
//! whatever state the handle's watch receiver publishes.

mod coordinator;
pub mod debounce;
pub mod event;
pub mod state;

pub use coordinator::{SessionError, SessionHandle, TaskSession, UNEXPECTED_ERROR_MESSAGE};
pub use debounce::Debouncer;
pub use event::SessionEvent;
pub use state::{SyncStatus, ViewState, visible_tasks};
