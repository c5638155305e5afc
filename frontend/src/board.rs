//! Client-side task state with optimistic mutations.
//!
//! Every mutation goes through three states: it starts *pending* (the
//! change is already visible and a snapshot of the list is held), then is
//! either *confirmed* with the server's copy or *rolled back* to the
//! snapshot. Snapshots live only while the request is in flight.
//!
//! Two mutations of the same task are not serialised: each one restores
//! its own snapshot on failure and the last server response wins.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::{TaskChanges, TaskView};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(u64);

/// How a pending mutation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone)]
struct Snapshot {
    task: Uuid,
    tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<TaskView>,
    snapshots: HashMap<MutationId, Snapshot>,
    next_mutation: u64,
}

impl TaskBoard {
    pub fn tasks(&self) -> &[TaskView] {
        &self.tasks
    }

    pub fn get(&self, id: Uuid) -> Option<&TaskView> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn replace_all(&mut self, tasks: Vec<TaskView>) {
        self.tasks = tasks;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Creation is not optimistic: the task is appended once the server has
    /// assigned its id.
    pub fn push_created(&mut self, task: TaskView) {
        self.tasks.push(task);
    }

    pub fn is_pending(&self, id: Uuid) -> bool {
        self.snapshots.values().any(|snapshot| snapshot.task == id)
    }

    pub fn begin_update(
        &mut self,
        id: Uuid,
        changes: &TaskChanges,
        now: DateTime<Utc>,
    ) -> Option<MutationId> {
        self.get(id)?;
        let mutation = self.snapshot(id);
        if let Some(view) = self.tasks.iter_mut().find(|t| t.task.id == id) {
            changes.apply_to(&mut view.task);
            view.is_overdue = view.task.is_overdue_at(now);
        }
        Some(mutation)
    }

    /// Flips completion locally and returns the value to send.
    pub fn begin_toggle(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<(MutationId, bool)> {
        let completed = !self.get(id)?.task.completed;
        let mutation = self.begin_update(id, &TaskChanges::completion(completed), now)?;
        Some((mutation, completed))
    }

    pub fn begin_delete(&mut self, id: Uuid) -> Option<MutationId> {
        self.get(id)?;
        let mutation = self.snapshot(id);
        self.tasks.retain(|t| t.id() != id);
        Some(mutation)
    }

    /// Accepts the server's copy of the task, if any, and drops the snapshot.
    /// Returns the settled state, or `None` if the mutation was not pending.
    pub fn confirm(
        &mut self,
        mutation: MutationId,
        server_copy: Option<TaskView>,
    ) -> Option<MutationState> {
        self.snapshots.remove(&mutation)?;
        if let Some(server_copy) = server_copy {
            if let Some(local) = self.tasks.iter_mut().find(|t| t.id() == server_copy.id()) {
                *local = server_copy;
            }
        }
        Some(MutationState::Confirmed)
    }

    /// Restores the list as it was when `mutation` began.
    pub fn roll_back(&mut self, mutation: MutationId) -> Option<MutationState> {
        let snapshot = self.snapshots.remove(&mutation)?;
        self.tasks = snapshot.tasks;
        Some(MutationState::RolledBack)
    }

    fn snapshot(&mut self, task: Uuid) -> MutationId {
        let mutation = MutationId(self.next_mutation);
        self.next_mutation += 1;
        self.snapshots.insert(
            mutation,
            Snapshot {
                task,
                tasks: self.tasks.clone(),
            },
        );
        mutation
    }
}
