//! Adapter implementations for the local store and remote service ports.

pub mod memory;
