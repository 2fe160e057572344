//! Task descriptor carried through the dispatch cascade.

use serde::{Deserialize, Serialize};

use crate::core::DispatchError;
use crate::util::serde::TaskId;

/// Resource demand and budget of an offloaded task.
///
/// Immutable once dispatched; stations only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    cpu_need: f64,
    mem_need: f64,
    budget: f64,
}

impl Task {
    /// Create a task with a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTask`] when a demand is not positive or
    /// the budget is negative.
    pub fn new(cpu_need: f64, mem_need: f64, budget: f64) -> Result<Self, DispatchError> {
        Self::with_id(TaskId::generate(), cpu_need, mem_need, budget)
    }

    /// Create a task with a caller-chosen identifier.
    ///
    /// # Errors
    ///
    /// Same validation as [`Task::new`].
    pub fn with_id(
        id: impl Into<TaskId>,
        cpu_need: f64,
        mem_need: f64,
        budget: f64,
    ) -> Result<Self, DispatchError> {
        let task = Self {
            id: id.into(),
            cpu_need,
            mem_need,
            budget,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check magnitudes. NaN fails every comparison and is rejected too.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidTask`] describing the first violation.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if !(self.cpu_need > 0.0) {
            return Err(DispatchError::InvalidTask(format!(
                "cpu_need must be positive, got {}",
                self.cpu_need
            )));
        }
        if !(self.mem_need > 0.0) {
            return Err(DispatchError::InvalidTask(format!(
                "mem_need must be positive, got {}",
                self.mem_need
            )));
        }
        if !(self.budget >= 0.0) {
            return Err(DispatchError::InvalidTask(format!(
                "budget must be non-negative, got {}",
                self.budget
            )));
        }
        Ok(())
    }

    /// Task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// CPU cycles the task needs.
    #[must_use]
    pub const fn cpu_need(&self) -> f64 {
        self.cpu_need
    }

    /// Memory the task needs.
    #[must_use]
    pub const fn mem_need(&self) -> f64 {
        self.mem_need
    }

    /// Highest price the requester will pay.
    #[must_use]
    pub const fn budget(&self) -> f64 {
        self.budget
    }
}
