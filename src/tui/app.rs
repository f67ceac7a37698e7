use std::time::Duration;

use ratatui::widgets::TableState;

use crate::error::Result;
use crate::filter::TaskFilter;
use crate::focus::{Durations, FocusTimer, TimerKind};
use crate::models::{parse_due, Priority, ProjectDraft, Status, Task, TaskDraft, TaskPatch};
use crate::storage::Gateway;
use crate::store::TaskStore;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ViewMode {
    Tasks,
    Projects,
    Dashboard,
    Focus,
}

impl ViewMode {
    fn next(self) -> ViewMode {
        match self {
            ViewMode::Tasks => ViewMode::Projects,
            ViewMode::Projects => ViewMode::Dashboard,
            ViewMode::Dashboard => ViewMode::Focus,
            ViewMode::Focus => ViewMode::Tasks,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum InputField {
    None,
    Title,
    Description,
    Due,
    Search,
    Subtask,
}

/// State for the multi-step "Add" wizard.
#[derive(Default)]
pub struct AddState {
    pub title: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub step: usize, // 0: Title, 1: Description, 2: Due, 3: Priority
}

pub struct App<G: Gateway> {
    pub store: TaskStore<G>,
    pub filter: TaskFilter,
    /// Ids of the tasks shown, in display order.
    pub visible: Vec<String>,
    pub state: TableState,
    pub project_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<String>,
    pub add_state: AddState,
    pub timer: FocusTimer,
    /// Last error or notice, shown in the help bar.
    pub message: Option<String>,
}

impl<G: Gateway> App<G> {
    /// Creates a new App around an already loaded store.
    pub fn new(store: TaskStore<G>, durations: Durations) -> App<G> {
        let message = store.error().map(|e| format!("{} (starting empty)", e));
        let mut app = App {
            store,
            filter: TaskFilter::default(),
            visible: Vec::new(),
            state: TableState::default(),
            project_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            timer: FocusTimer::new(durations),
            message,
        };
        app.reload();
        app
    }

    /// Recomputes the visible task list and keeps the selections in range.
    pub fn reload(&mut self) {
        self.visible = self
            .store
            .filtered(&self.filter)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();
        clamp(&mut self.state, self.visible.len());
        clamp(&mut self.project_state, self.store.projects().len());
    }

    fn report<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(v) => {
                self.message = None;
                Some(v)
            }
            Err(e) => {
                self.message = Some(e.to_string());
                None
            }
        }
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.visible.iter().filter_map(|id| self.store.task(id)).collect()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let i = self.state.selected()?;
        self.store.task(self.visible.get(i)?)
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => step(&mut self.state, self.visible.len(), true),
            ViewMode::Projects => step(&mut self.project_state, self.store.projects().len(), true),
            _ => {}
        }
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => step(&mut self.state, self.visible.len(), false),
            ViewMode::Projects => step(&mut self.project_state, self.store.projects().len(), false),
            _ => {}
        }
    }

    pub fn set_selected_status(&mut self, status: Status) {
        if let Some(id) = self.selected_id() {
            let r = self.store.set_status(&id, status);
            self.report(r);
            self.reload();
        }
    }

    /// Deletes the currently selected task or project.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                if let Some(id) = self.selected_id() {
                    let r = self.store.delete(&id);
                    self.report(r);
                }
            }
            ViewMode::Projects => {
                let id = self
                    .project_state
                    .selected()
                    .and_then(|i| self.store.projects().get(i))
                    .map(|p| p.id.clone());
                if let Some(id) = id {
                    let r = self.store.delete_project(&id);
                    self.report(r);
                }
            }
            _ => {}
        }
        self.reload();
    }

    /// Raises the selected task's priority, wrapping from high to low.
    pub fn cycle_priority(&mut self) {
        if let Some(t) = self.selected_task() {
            let next = match t.priority {
                Priority::Low => Priority::Medium,
                Priority::Medium => Priority::High,
                Priority::High => Priority::Low,
            };
            let patch = TaskPatch { priority: Some(next), ..TaskPatch::new(t.id.clone()) };
            let r = self.store.update(patch);
            self.report(r);
            self.reload();
        }
    }

    /// Moves the selected task one row up or down and saves the new order.
    ///
    /// Only possible while no filter is active, so rows match stored positions.
    pub fn move_selected(&mut self, down: bool) {
        if !self.filter.is_empty() {
            self.message = Some("Clear filters to reorder".into());
            return;
        }
        let (Some(i), Some(id)) = (self.state.selected(), self.selected_id()) else {
            return;
        };
        let target = if down { i + 1 } else { i.wrapping_sub(1) };
        if target >= self.visible.len() {
            return;
        }
        let r = self.store.move_task(&id, target);
        if self.report(r).is_some() {
            self.state.select(Some(target));
        }
        self.reload();
    }

    /// Toggles the n-th (1-based) subtask of the selected task.
    pub fn toggle_subtask(&mut self, n: usize) {
        let ids = self
            .selected_task()
            .and_then(|t| t.subtasks.get(n.wrapping_sub(1)).map(|s| (t.id.clone(), s.id.clone())));
        if let Some((task_id, sub_id)) = ids {
            let r = self.store.toggle_subtask(&task_id, &sub_id);
            self.report(r);
            self.reload();
        }
    }

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = match self.filter.status {
            None => Some(Status::ALL[0]),
            Some(s) => Status::ALL
                .iter()
                .position(|x| *x == s)
                .and_then(|i| Status::ALL.get(i + 1).copied()),
        };
        self.reload();
    }

    pub fn cycle_priority_filter(&mut self) {
        self.filter.priority = match self.filter.priority {
            None => Some(Priority::ALL[0]),
            Some(p) => Priority::ALL
                .iter()
                .position(|x| *x == p)
                .and_then(|i| Priority::ALL.get(i + 1).copied()),
        };
        self.reload();
    }

    /// Switches to the next view.
    pub fn toggle_view(&mut self) {
        self.view_mode = self.view_mode.next();
    }

    /// Advances the focus timer. The timer runs whatever view is shown.
    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(done) = self.timer.tick(elapsed) {
            self.message = Some(format!("{} finished, next: {}", done.kind, done.next));
        }
    }

    pub fn switch_timer(&mut self, kind: TimerKind) {
        self.timer.switch_to(kind);
    }

    /// Initiates the "Add" wizard for the current view.
    pub fn start_add(&mut self) {
        if matches!(self.view_mode, ViewMode::Tasks | ViewMode::Projects) {
            self.input_mode = InputMode::Adding;
            self.add_state = AddState::default();
            self.input_buffer.clear();
        }
    }

    /// Initiates editing of a field. Task fields act on the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        if self.view_mode != ViewMode::Tasks {
            return;
        }
        if field == InputField::Search {
            self.input_mode = InputMode::Editing;
            self.input_field = field;
            self.input_buffer = self.filter.search.clone();
            return;
        }
        let Some(t) = self.selected_task() else {
            return;
        };
        let current = match field {
            InputField::Title => t.title.clone(),
            InputField::Description => t.description.clone().unwrap_or_default(),
            InputField::Due => t
                .due_date
                .map(|d| d.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            _ => String::new(),
        };
        self.target_id = Some(t.id.clone());
        self.input_buffer = current;
        self.input_mode = InputMode::Editing;
        self.input_field = field;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_field = InputField::None;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    /// Handles input for the "Add" wizard.
    fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        if self.view_mode == ViewMode::Projects {
            if !value.is_empty() {
                let r = self.store.add_project(ProjectDraft::new(value));
                self.report(r);
            }
            self.cancel_input();
            self.reload();
            return;
        }
        match self.add_state.step {
            0 => {
                // Title
                if value.is_empty() {
                    return;
                }
                self.add_state.title = value;
            }
            1 => {
                // Description
                self.add_state.description = Some(value).filter(|v| !v.is_empty());
            }
            2 => {
                // Due
                if !value.is_empty() && parse_due(&value).is_none() {
                    self.message = Some(format!("Invalid due date '{}'", value));
                    return;
                }
                self.add_state.due = Some(value).filter(|v| !v.is_empty());
            }
            _ => {
                // Priority, then finish
                let priority = if value.is_empty() {
                    Priority::Medium
                } else {
                    match value.parse() {
                        Ok(p) => p,
                        Err(e) => {
                            self.message = Some(e);
                            return;
                        }
                    }
                };
                let draft = TaskDraft {
                    description: self.add_state.description.take(),
                    due_date: self.add_state.due.as_deref().and_then(parse_due),
                    priority,
                    ..TaskDraft::new(std::mem::take(&mut self.add_state.title))
                };
                let r = self.store.add(draft);
                self.report(r);
                self.cancel_input();
                self.reload();
                return;
            }
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    /// Handles input for edit mode.
    fn handle_editing_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        if self.input_field == InputField::Search {
            self.filter.search = value;
            self.cancel_input();
            self.reload();
            return;
        }
        if let Some(id) = self.target_id.take() {
            let result = match self.input_field {
                InputField::Title => self
                    .store
                    .update(TaskPatch { title: Some(value), ..TaskPatch::new(id) })
                    .map(|_| ()),
                InputField::Description => {
                    let description = Some(value).filter(|v| !v.is_empty());
                    self.store
                        .update(TaskPatch { description: Some(description), ..TaskPatch::new(id) })
                        .map(|_| ())
                }
                InputField::Due if value.is_empty() => self
                    .store
                    .update(TaskPatch { due_date: Some(None), ..TaskPatch::new(id) })
                    .map(|_| ()),
                InputField::Due => match parse_due(&value) {
                    Some(due) => self
                        .store
                        .update(TaskPatch { due_date: Some(Some(due)), ..TaskPatch::new(id) })
                        .map(|_| ()),
                    None => Err(crate::Error::Validation(format!("invalid due date '{}'", value))),
                },
                InputField::Subtask => self.store.add_subtask(&id, &value).map(|_| ()),
                InputField::Search | InputField::None => Ok(()),
            };
            self.report(result);
        }
        self.cancel_input();
        self.reload();
    }
}

fn clamp(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}

fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}
