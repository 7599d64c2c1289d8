use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RecordStore, filter_user};
use crate::{ExpenseRecord, StoreError};

/// Process-local store. Records are lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Vec<ExpenseRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `records`, in the given order.
    pub fn with_records(records: Vec<ExpenseRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(records)),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append(&self, record: &ExpenseRecord) -> Result<(), StoreError> {
        self.inner.lock().await.push(record.clone());
        Ok(())
    }

    async fn read_all(&self, user: Option<&str>) -> Result<Vec<ExpenseRecord>, StoreError> {
        let records = self.inner.lock().await.clone();
        Ok(filter_user(records, user))
    }
}
