use crate::models::{Priority, Status, Task};

/// Criteria for narrowing a task list. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the title or description. Empty matches everything.
    pub search: String,
}

impl TaskFilter {
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none() && self.search.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_ref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }

    /// Returns the matching tasks in their original order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Parses a status filter; `"all"` (or empty) means no restriction.
pub fn parse_status_filter(s: &str) -> Result<Option<Status>, String> {
    match s.trim().to_lowercase().as_str() {
        "" | "all" => Ok(None),
        other => other.parse().map(Some),
    }
}

/// Parses a priority filter; `"all"` (or empty) means no restriction.
pub fn parse_priority_filter(s: &str) -> Result<Option<Priority>, String> {
    match s.trim().to_lowercase().as_str() {
        "" | "all" => Ok(None),
        other => other.parse().map(Some),
    }
}
