//! Ordered in-memory list of the user's open tasks.
//!
//! `TaskListStore` is the single source of truth for what the user sees as
//! pending. Every operation is synchronous and total: unknown ids are
//! no-ops, so a response arriving for a task that was already removed
//! changes nothing.

use dailytask_proto::task::{TaskDescriptor, TaskId, TaskStatus};

/// Extra fields written alongside a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFields {
    /// Verifier feedback; `None` clears any previous feedback.
    pub feedback: Option<String>,
}

impl StatusFields {
    /// Fields carrying verifier feedback.
    pub fn feedback(text: impl Into<String>) -> Self {
        Self {
            feedback: Some(text.into()),
        }
    }
}

/// Insertion-ordered task list keyed by [`TaskId`].
#[derive(Debug, Clone, Default)]
pub struct TaskListStore {
    tasks: Vec<TaskDescriptor>,
}

impl TaskListStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Appends a task. Returns `false` (and leaves the store unchanged) if
    /// a task with the same id is already present or the task is terminal.
    pub fn add(&mut self, task: TaskDescriptor) -> bool {
        if task.status.is_terminal() || self.contains(&task.task_id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    /// Removes a task and returns it, or `None` if the id is unknown.
    pub fn remove(&mut self, task_id: &TaskId) -> Option<TaskDescriptor> {
        let index = self.tasks.iter().position(|t| t.task_id == *task_id)?;
        Some(self.tasks.remove(index))
    }

    /// Sets a task's status and extra fields.
    ///
    /// Returns `false` if the id is unknown. A terminal status removes the
    /// task from the list instead of storing it.
    pub fn replace_status(&mut self, task_id: &TaskId, status: TaskStatus, fields: StatusFields) -> bool {
        if status.is_terminal() {
            return self.remove(task_id).is_some();
        }
        let Some(task) = self.get_mut(task_id) else {
            return false;
        };
        debug_assert!(
            task.status == status || task.status.can_transition_to(status),
            "illegal status change {} -> {status} for {task_id}",
            task.status
        );
        task.status = status;
        task.feedback = fields.feedback;
        true
    }

    /// Returns the task with the given id.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.task_id == *task_id)
    }

    /// Whether a task with the given id is present.
    #[must_use]
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.get(task_id).is_some()
    }

    /// All tasks in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    /// Number of tasks in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn get_mut(&mut self, task_id: &TaskId) -> Option<&mut TaskDescriptor> {
        self.tasks.iter_mut().find(|t| t.task_id == *task_id)
    }
}
