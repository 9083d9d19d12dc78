//! Tasksync: offline-first task list core.
//!
//! The local store is the source of truth for reads. Writes land locally
//! first and are mirrored to a remote service on a best-effort basis, and
//! a pull-merge sync fills the local store from the remote without ever
//! overwriting local rows.
//!
//! # Architecture
//!
//! Tasksync follows hexagonal architecture principles:
//!
//! - **Domain**: Task entity, value types, and the `Resource` envelope
//! - **Ports**: Local store and remote service traits
//! - **Adapters**: In-memory store and simulated remote service
//!
//! # Modules
//!
//! - [`task`]: Task domain, ports, adapters, and repository services
//! - [`session`]: Single-owner view-state coordinator
//! - [`config`]: Layered session and demo configuration
//! - [`telemetry`]: Tracing subscriber setup for binaries

pub mod config;
pub mod session;
pub mod task;
pub mod telemetry;
