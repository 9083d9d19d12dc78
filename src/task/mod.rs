//! Offline-first task storage and synchronisation.
//!
//! The local store is the source of truth for reads. Mutations are written
//! locally first and mirrored to the remote service on a best-effort basis;
//! synchronisation pulls the remote list and merges it in without touching
//! rows that already exist locally. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
