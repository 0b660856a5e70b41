// src/tasks/registry.rs

use std::collections::BTreeMap;

use crate::engine::TaskName;
use crate::errors::{Result, ThemewatchError};
use crate::pipeline::Pipeline;

/// What invoking a task does.
#[derive(Debug)]
pub enum TaskAction {
    /// Run a file pipeline.
    Pipeline(Pipeline),
    /// Tell every connected browser to reload.
    Reload,
}

impl TaskAction {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskAction::Pipeline(_) => TaskKind::Pipeline,
            TaskAction::Reload => TaskKind::Reload,
        }
    }
}

/// Action kind without the payload; this is all the engine needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Pipeline,
    Reload,
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskAction>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<TaskName>, action: TaskAction) -> Result<()> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(ThemewatchError::DuplicateTask(name));
        }
        self.tasks.insert(name, action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TaskAction> {
        self.tasks.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&TaskAction> {
        self.get(name)
            .ok_or_else(|| ThemewatchError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn kinds(&self) -> BTreeMap<TaskName, TaskKind> {
        self.tasks
            .iter()
            .map(|(name, action)| (name.clone(), action.kind()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
