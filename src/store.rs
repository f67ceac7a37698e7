//! The in-memory task store.
//!
//! A [`TaskStore`] owns the planner document for the session. Every mutation
//! builds the next document, hands it to the [`Gateway`], and only swaps it in
//! once the write succeeded, so a failed save leaves the store exactly as it
//! was.
//!
//! ```no_run
//! use planer::models::{Priority, TaskDraft};
//! use planer::storage::JsonFileGateway;
//! use planer::store::TaskStore;
//!
//! let mut store = TaskStore::open(JsonFileGateway::new("/tmp/planer.json"));
//! let mut draft = TaskDraft::new("Write report");
//! draft.priority = Priority::High;
//! let task = store.add(draft).unwrap();
//! store.mark_completed(&task.id).unwrap();
//! assert_eq!(store.stats().completion_rate, 100);
//! ```

use std::cell::Cell;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::models::{
    new_project_id, new_task_id, Project, ProjectDraft, ProjectPatch, Snapshot, Status, Subtask,
    SubtaskPatch, Task, TaskDraft, TaskPatch,
};
use crate::stats::{compute_stats, Stats};
use crate::storage::Gateway;

pub struct TaskStore<G: Gateway> {
    gateway: G,
    data: Snapshot,
    stats: Cell<Option<Stats>>,
    error: Option<String>,
}

impl<G: Gateway> TaskStore<G> {
    /// Creates an empty store without reading the gateway.
    pub fn new(gateway: G) -> Self {
        TaskStore { gateway, data: Snapshot::default(), stats: Cell::new(None), error: None }
    }

    /// Creates a store and loads it. A read failure leaves the store empty
    /// with [`TaskStore::error`] set.
    pub fn open(gateway: G) -> Self {
        let mut store = Self::new(gateway);
        let _ = store.load();
        store
    }

    /// Replaces the in-memory document with the stored one.
    ///
    /// On failure the store is reset to empty, the error is remembered for
    /// the caller to show, and returned.
    pub fn load(&mut self) -> Result<()> {
        self.stats.set(None);
        match self.gateway.read_all() {
            Ok(mut data) => {
                debug!(tasks = data.tasks.len(), projects = data.projects.len(), "loaded");
                clamp_timestamps(&mut data);
                self.data = data;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "load failed, starting empty");
                self.data = Snapshot::default();
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The last load or save error, if the store is in an error state.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.data.tasks.iter().find(|t| t.id == id)
    }

    pub fn filtered(&self, filter: &TaskFilter) -> Vec<&Task> {
        filter.apply(&self.data.tasks)
    }

    pub fn projects(&self) -> &[Project] {
        &self.data.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.data.projects.iter().find(|p| p.id == id)
    }

    /// Tasks whose `project` points at `project_id`.
    pub fn project_tasks(&self, project_id: &str) -> Vec<&Task> {
        self.data
            .tasks
            .iter()
            .filter(|t| t.project.as_deref() == Some(project_id))
            .collect()
    }

    /// Statistics for the current tasks, recomputed after any mutation.
    pub fn stats(&self) -> Stats {
        if let Some(stats) = self.stats.get() {
            return stats;
        }
        let stats = compute_stats(&self.data.tasks);
        self.stats.set(Some(stats));
        stats
    }

    /// Persists `next` and makes it current.
    pub(crate) fn commit(&mut self, next: Snapshot) -> Result<()> {
        if let Err(e) = self.gateway.write_all(&next) {
            warn!(error = %e, "save failed, keeping previous state");
            self.error = Some(e.to_string());
            return Err(e);
        }
        self.data = next;
        self.stats.set(None);
        self.error = None;
        Ok(())
    }

    /// Adds a new task.
    ///
    /// The title must not be blank. An id is generated when the draft has
    /// none; a supplied id must not already be in use.
    pub fn add(&mut self, draft: TaskDraft) -> Result<Task> {
        let mut next = self.data.clone();
        let task = insert_task(&mut next, draft, Utc::now())?;
        self.commit(next)?;
        debug!(id = %task.id, "task added");
        Ok(task)
    }

    /// Merges `patch` into the stored task with the same id.
    pub fn update(&mut self, patch: TaskPatch) -> Result<Task> {
        let mut next = self.data.clone();
        let task = merge_task(&mut next, &patch)?;
        self.commit(next)?;
        debug!(id = %task.id, "task updated");
        Ok(task)
    }

    /// Removes a task. An unknown id is reported and changes nothing.
    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let idx = self.index_of(id)?;
        let mut next = self.data.clone();
        let removed = next.tasks.remove(idx);
        self.commit(next)?;
        debug!(id, "task deleted");
        Ok(removed)
    }

    /// Puts the tasks in the order given by `ids` and saves that order.
    ///
    /// `ids` must be a permutation of the current task ids.
    pub fn reorder<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<()> {
        if ids.len() != self.data.tasks.len() {
            return Err(Error::Validation(format!(
                "reorder expects {} ids, got {}",
                self.data.tasks.len(),
                ids.len()
            )));
        }
        let mut seen = HashSet::new();
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            if !seen.insert(id) {
                return Err(Error::Validation(format!("task {} listed twice", id)));
            }
            let task = self.task(id).ok_or_else(|| Error::task_not_found(id))?;
            ordered.push(task.clone());
        }
        let mut next = self.data.clone();
        next.tasks = ordered;
        self.commit(next)?;
        debug!(count = ids.len(), "tasks reordered");
        Ok(())
    }

    /// Moves one task to `position`, shifting the others.
    pub fn move_task(&mut self, id: &str, position: usize) -> Result<()> {
        let from = self.index_of(id)?;
        let mut ids: Vec<String> = self.data.tasks.iter().map(|t| t.id.clone()).collect();
        let moved = ids.remove(from);
        ids.insert(position.min(ids.len()), moved);
        self.reorder(&ids)
    }

    pub fn set_status(&mut self, id: &str, status: Status) -> Result<Task> {
        self.update(TaskPatch::status(id, status))
    }

    pub fn mark_completed(&mut self, id: &str) -> Result<Task> {
        self.set_status(id, Status::Completed)
    }

    pub fn mark_in_progress(&mut self, id: &str) -> Result<Task> {
        self.set_status(id, Status::InProgress)
    }

    /// Flips the `completed` flag of one subtask.
    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<Task> {
        self.modify_task(task_id, |task| {
            let sub = subtask_mut(task, subtask_id)?;
            sub.completed = !sub.completed;
            Ok(())
        })
    }

    /// Merges `changes` into one subtask.
    pub fn update_subtask(
        &mut self,
        task_id: &str,
        subtask_id: &str,
        changes: SubtaskPatch,
    ) -> Result<Task> {
        if changes.title.as_deref().map(|t| t.trim().is_empty()).unwrap_or(false) {
            return Err(Error::Validation("subtask title must not be empty".into()));
        }
        self.modify_task(task_id, |task| {
            let sub = subtask_mut(task, subtask_id)?;
            if let Some(title) = changes.title {
                sub.title = title;
            }
            if let Some(completed) = changes.completed {
                sub.completed = completed;
            }
            Ok(())
        })
    }

    /// Appends a new, open subtask.
    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<Subtask> {
        if title.trim().is_empty() {
            return Err(Error::Validation("subtask title must not be empty".into()));
        }
        let sub = Subtask::new(title.trim());
        let added = sub.clone();
        self.modify_task(task_id, move |task| {
            task.subtasks.push(sub);
            Ok(())
        })?;
        Ok(added)
    }

    pub fn remove_subtask(&mut self, task_id: &str, subtask_id: &str) -> Result<Task> {
        self.modify_task(task_id, |task| {
            let before = task.subtasks.len();
            task.subtasks.retain(|s| s.id != subtask_id);
            if task.subtasks.len() == before {
                return Err(Error::subtask_not_found(subtask_id));
            }
            Ok(())
        })
    }

    /// Adds `minutes` to the time spent on a task.
    pub fn log_time(&mut self, task_id: &str, minutes: f64) -> Result<Task> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(Error::Validation(format!("cannot log {} minutes", minutes)));
        }
        self.modify_task(task_id, |task| {
            task.time_spent = Some(task.time_spent.unwrap_or(0.0) + minutes);
            Ok(())
        })
    }

    pub fn add_project(&mut self, draft: ProjectDraft) -> Result<Project> {
        let mut next = self.data.clone();
        let project = insert_project(&mut next, draft, Utc::now())?;
        self.commit(next)?;
        debug!(id = %project.id, "project added");
        Ok(project)
    }

    pub fn update_project(&mut self, patch: ProjectPatch) -> Result<Project> {
        let mut next = self.data.clone();
        let project = merge_project(&mut next, &patch)?;
        self.commit(next)?;
        debug!(id = %project.id, "project updated");
        Ok(project)
    }

    /// Removes a project. Tasks that reference it keep the dangling id.
    pub fn delete_project(&mut self, id: &str) -> Result<Project> {
        let idx = self
            .data
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::project_not_found(id))?;
        let mut next = self.data.clone();
        let removed = next.projects.remove(idx);
        self.commit(next)?;
        debug!(id, orphaned = self.project_tasks(id).len(), "project deleted");
        Ok(removed)
    }

    /// Replaces the whole document, e.g. for a full import or a reset.
    pub fn replace_all(&mut self, snapshot: Snapshot) -> Result<()> {
        check_snapshot(&snapshot)?;
        self.commit(snapshot)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.data
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::task_not_found(id))
    }

    fn modify_task<F>(&mut self, id: &str, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let idx = self.index_of(id)?;
        let mut next = self.data.clone();
        let task = &mut next.tasks[idx];
        f(task)?;
        task.updated_at = restamp(task.updated_at);
        let task = task.clone();
        self.commit(next)?;
        debug!(id, "task modified");
        Ok(task)
    }
}

fn subtask_mut<'a>(task: &'a mut Task, subtask_id: &str) -> Result<&'a mut Subtask> {
    task.subtasks
        .iter_mut()
        .find(|s| s.id == subtask_id)
        .ok_or_else(|| Error::subtask_not_found(subtask_id))
}

/// A fresh `updated_at` that is strictly later than `previous`.
fn restamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(crate) fn insert_task(
    data: &mut Snapshot,
    draft: TaskDraft,
    now: DateTime<Utc>,
) -> Result<Task> {
    if draft.title.trim().is_empty() {
        return Err(Error::Validation("task title must not be empty".into()));
    }
    let id = match non_blank(draft.id) {
        Some(id) if data.tasks.iter().any(|t| t.id == id) => {
            return Err(Error::Validation(format!("task id {} is already in use", id)));
        }
        Some(id) => id,
        None => new_task_id(),
    };
    let task = Task {
        id,
        title: draft.title,
        description: draft.description,
        status: draft.status,
        priority: draft.priority,
        category: draft.category,
        project: draft.project,
        due_date: draft.due_date,
        created_at: now,
        updated_at: now,
        subtasks: draft.subtasks,
        time_spent: draft.time_spent,
        time_estimate: draft.time_estimate,
    };
    data.tasks.push(task.clone());
    Ok(task)
}

pub(crate) fn merge_task(data: &mut Snapshot, patch: &TaskPatch) -> Result<Task> {
    if patch.title.as_deref().map(|t| t.trim().is_empty()).unwrap_or(false) {
        return Err(Error::Validation("task title must not be empty".into()));
    }
    let task = data
        .tasks
        .iter_mut()
        .find(|t| t.id == patch.id)
        .ok_or_else(|| Error::task_not_found(&patch.id))?;
    task.apply(patch);
    task.updated_at = restamp(task.updated_at);
    Ok(task.clone())
}

pub(crate) fn insert_project(
    data: &mut Snapshot,
    draft: ProjectDraft,
    now: DateTime<Utc>,
) -> Result<Project> {
    if draft.name.trim().is_empty() {
        return Err(Error::Validation("project name must not be empty".into()));
    }
    let id = match non_blank(draft.id) {
        Some(id) if data.projects.iter().any(|p| p.id == id) => {
            return Err(Error::Validation(format!("project id {} is already in use", id)));
        }
        Some(id) => id,
        None => new_project_id(),
    };
    let project = Project {
        id,
        name: draft.name,
        description: draft.description,
        status: draft.status,
        created_at: now,
        updated_at: now,
    };
    data.projects.push(project.clone());
    Ok(project)
}

pub(crate) fn merge_project(data: &mut Snapshot, patch: &ProjectPatch) -> Result<Project> {
    if patch.name.as_deref().map(|n| n.trim().is_empty()).unwrap_or(false) {
        return Err(Error::Validation("project name must not be empty".into()));
    }
    let project = data
        .projects
        .iter_mut()
        .find(|p| p.id == patch.id)
        .ok_or_else(|| Error::project_not_found(&patch.id))?;
    project.apply(patch);
    project.updated_at = restamp(project.updated_at);
    Ok(project.clone())
}

/// Raises any `updatedAt` that lies before its `createdAt`.
fn clamp_timestamps(data: &mut Snapshot) {
    for t in &mut data.tasks {
        t.updated_at = t.updated_at.max(t.created_at);
    }
    for p in &mut data.projects {
        p.updated_at = p.updated_at.max(p.created_at);
    }
}

/// Checks a whole document before it replaces the current one: ids are
/// unique and no record was updated before it was created.
pub(crate) fn check_snapshot(data: &Snapshot) -> Result<()> {
    if let Some(t) = data.tasks.iter().find(|t| t.updated_at < t.created_at) {
        return Err(Error::Validation(format!("task {} was updated before it was created", t.id)));
    }
    if let Some(p) = data.projects.iter().find(|p| p.updated_at < p.created_at) {
        return Err(Error::Validation(format!(
            "project {} was updated before it was created",
            p.id
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = data.tasks.iter().find(|t| !seen.insert(t.id.as_str())) {
        return Err(Error::Validation(format!("task id {} appears twice", dup.id)));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = data.projects.iter().find(|p| !seen.insert(p.id.as_str())) {
        return Err(Error::Validation(format!("project id {} appears twice", dup.id)));
    }
    Ok(())
}
