//! Record store seam.
//!
//! The bot never owns its data: every expense goes to an append-only table
//! kept by some backend (a spreadsheet, a CSV file, memory). Backends only
//! append and read back; there is no update or delete.
use std::sync::Arc;

use async_trait::async_trait;

use crate::{ExpenseRecord, StoreError};

pub use csv_file::CsvStore;
pub use memory::MemoryStore;

mod csv_file;
mod memory;

/// Append-only storage of expense records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Adds one row, creating the header row first when the table has none.
    async fn append(&self, record: &ExpenseRecord) -> Result<(), StoreError>;

    /// Returns every row in insertion order, restricted to `user` if given.
    async fn read_all(&self, user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), StoreError> {
        (**self).append(record).await
    }

    async fn read_all(&self, user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError> {
        (**self).read_all(user).await
    }
}

/// Keeps the records of `user`, or all of them when no user is given.
pub fn filter_user(records: Vec<ExpenseRecord>, user: Option<&str>) -> Vec<ExpenseRecord> {
    match user {
        None => records,
        Some(user) => records.into_iter().filter(|r| r.user == user).collect(),
    }
}
