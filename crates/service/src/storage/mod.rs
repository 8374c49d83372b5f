//! Storage abstractions for service layer
//!
//! Contains the reusable file-backed map store the record table is built on.

pub mod json_map_store;
