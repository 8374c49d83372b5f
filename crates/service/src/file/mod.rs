//! File-backed implementations of the service storage traits.

pub mod record_store;
