//! Deferred work drained once per edit batch.

use std::collections::VecDeque;

use serde::Serialize;

/// Work that runs after a batch's synchronous reactions settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredTask {
    /// Rewrite the raw scope list from the current selection.
    RemapScopes,
    /// Clear autoscaling bounds if autoscaling is still disabled.
    ClearAutoscalingBounds,
}

/// FIFO of deferred tasks. Each task is queued at most once.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<DeferredTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task. Returns false if it was already pending.
    pub fn push(&mut self, task: DeferredTask) -> bool {
        if self.tasks.contains(&task) {
            return false;
        }
        self.tasks.push_back(task);
        true
    }

    /// Remove and return all pending tasks in queue order.
    pub fn take_all(&mut self) -> Vec<DeferredTask> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
