//! Types shared by the planner API and its web client.

pub mod envelope;
pub mod query;
pub mod task;

pub use envelope::{DataEnvelope, ErrorEnvelope, ListEnvelope, MessageEnvelope};
pub use query::{SortKey, SortOrder, StatusFilter, TaskQuery};
pub use task::{NewTaskRequest, Priority, Task, TaskChanges, TaskView, UnknownPriority};
