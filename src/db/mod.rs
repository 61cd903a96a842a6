//! Database layer
//!
//! MongoDB backend for the record store and the typed views of each
//! collection's documents.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoRecordStore};
