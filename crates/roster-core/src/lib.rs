#![forbid(unsafe_code)]

pub mod document;
pub mod errors;
pub mod record;
pub mod schema;
pub mod table;

pub use errors::{DocumentError, PersistenceError, SchemaError, StoreError};
pub use record::{Record, RecordPatch};
