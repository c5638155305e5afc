//! In-process store for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::{Task, TaskChanges};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{prepare_changes, prepare_new, NewTask, StoreError, TaskFilter, TaskStore};

/// A `HashMap` behind an async `RwLock`. Every mutation happens under the
/// write lock, which makes each find-and-modify atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    inner: Arc<RwLock<Documents>>,
}

/// Each document remembers its insertion sequence so listings come back in
/// the order tasks were created.
#[derive(Debug, Default)]
struct Documents {
    tasks: HashMap<Uuid, (u64, Task)>,
    next_seq: u64,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.inner.read().await.tasks.len()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = prepare_new(task, Utc::now())?;
        let mut documents = self.inner.write().await;
        if documents.tasks.contains_key(&task.id) {
            return Err(StoreError::Duplicate {
                field: "id".to_string(),
            });
        }
        let seq = documents.next_seq;
        documents.next_seq += 1;
        documents.tasks.insert(task.id, (seq, task.clone()));
        Ok(task)
    }

    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let documents = self.inner.read().await;
        let mut matching: Vec<&(u64, Task)> = documents
            .tasks
            .values()
            .filter(|(_, task)| filter.matches(task))
            .collect();
        matching.sort_by_key(|(seq, _)| *seq);
        Ok(matching.into_iter().map(|(_, task)| task.clone()).collect())
    }

    async fn find_one(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError> {
        let documents = self.inner.read().await;
        Ok(documents
            .tasks
            .get(&id)
            .map(|(_, task)| task)
            .filter(|task| task.owner == owner)
            .cloned())
    }

    async fn find_one_and_update(
        &self,
        id: Uuid,
        owner: &str,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError> {
        let changes = prepare_changes(changes)?;
        let mut documents = self.inner.write().await;
        let Some((_, task)) = documents
            .tasks
            .get_mut(&id)
            .filter(|(_, task)| task.owner == owner)
        else {
            return Ok(None);
        };
        changes.apply_to(task);
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn find_one_and_delete(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError> {
        let mut documents = self.inner.write().await;
        if !documents
            .tasks
            .get(&id)
            .is_some_and(|(_, task)| task.owner == owner)
        {
            return Ok(None);
        }
        Ok(documents.tasks.remove(&id).map(|(_, task)| task))
    }
}
