//! Service layer for the record handler.
//! - `record`: the schemaless record model and its primary key.
//! - `store`: the four-operation store abstraction the handler depends on.
//! - `file`: the JSON-file backed table implementing that abstraction.
//! - `item_service`: get/save/modify/delete with key validation up front.

pub mod errors;
pub mod record;
pub mod runtime;
pub mod storage;
pub mod store;
pub mod file;
pub mod item_service;

pub use errors::ServiceError;
pub use item_service::ItemService;
pub use record::{Record, RecordKey, ID_FIELD};
pub use store::RecordStore;
