use planer::focus::Durations;
use planer::models::{Priority, Status, TaskDraft};
use planer::storage::MemoryGateway;
use planer::store::TaskStore;
use planer::tui::app::{App, InputField, InputMode, ViewMode};

fn app_with(titles: &[&str]) -> App<MemoryGateway> {
    let mut store = TaskStore::open(MemoryGateway::new());
    for title in titles {
        store.add(TaskDraft::new(*title)).unwrap();
    }
    App::new(store, Durations::default())
}

fn type_and_enter(app: &mut App<MemoryGateway>, text: &str) {
    app.input_buffer = text.to_string();
    app.handle_input();
}

#[test]
fn test_add_wizard_creates_task() {
    let mut app = app_with(&[]);
    app.start_add();
    assert_eq!(app.input_mode, InputMode::Adding);

    type_and_enter(&mut app, "Write report");
    type_and_enter(&mut app, "");
    type_and_enter(&mut app, "2030-01-31");
    type_and_enter(&mut app, "high");

    assert_eq!(app.input_mode, InputMode::Normal);
    let tasks = app.store.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Write report");
    assert_eq!(tasks[0].description, None);
    assert_eq!(tasks[0].priority, Priority::High);
    assert!(tasks[0].due_date.is_some());
    assert_eq!(app.state.selected(), Some(0));
}

#[test]
fn test_add_wizard_stays_on_bad_due_date() {
    let mut app = app_with(&[]);
    app.start_add();
    type_and_enter(&mut app, "Task");
    type_and_enter(&mut app, "");
    type_and_enter(&mut app, "someday");

    assert_eq!(app.add_state.step, 2);
    assert!(app.message.is_some());
    assert!(app.store.tasks().is_empty());
}

#[test]
fn test_complete_and_filter() {
    let mut app = app_with(&["a", "b", "c"]);
    app.next();
    app.set_selected_status(Status::Completed);
    assert_eq!(app.store.tasks()[1].status, Status::Completed);

    // pending
    app.cycle_status_filter();
    assert_eq!(app.visible.len(), 2);
    // in-progress
    app.cycle_status_filter();
    assert!(app.visible.is_empty());
    assert_eq!(app.state.selected(), None);
    // completed
    app.cycle_status_filter();
    assert_eq!(app.selected_task().unwrap().title, "b");
}

#[test]
fn test_search_and_edit_title() {
    let mut app = app_with(&["groceries", "taxes"]);
    app.start_edit(InputField::Search);
    type_and_enter(&mut app, "tax");
    assert_eq!(app.visible.len(), 1);

    app.start_edit(InputField::Title);
    assert_eq!(app.input_buffer, "taxes");
    type_and_enter(&mut app, "taxes 2025");
    assert_eq!(app.store.tasks()[1].title, "taxes 2025");
}

#[test]
fn test_reorder_needs_unfiltered_list() {
    let mut app = app_with(&["a", "b"]);
    app.move_selected(true);
    assert_eq!(app.store.tasks()[1].title, "a");
    assert_eq!(app.state.selected(), Some(1));

    app.cycle_priority_filter();
    app.move_selected(false);
    assert!(app.message.is_some());
    assert_eq!(app.store.tasks()[1].title, "a");
}

#[test]
fn test_subtask_keys() {
    let mut app = app_with(&["parent"]);
    app.start_edit(InputField::Subtask);
    type_and_enter(&mut app, "child");
    app.toggle_subtask(1);
    app.toggle_subtask(5);

    let task = &app.store.tasks()[0];
    assert_eq!(task.subtasks.len(), 1);
    assert!(task.subtasks[0].completed);
}

#[test]
fn test_views_cycle_and_projects() {
    let mut app = app_with(&[]);
    app.toggle_view();
    assert_eq!(app.view_mode, ViewMode::Projects);

    app.start_add();
    type_and_enter(&mut app, "Garden");
    assert_eq!(app.store.projects().len(), 1);
    app.delete_selected();
    assert!(app.store.projects().is_empty());

    app.toggle_view();
    app.toggle_view();
    assert_eq!(app.view_mode, ViewMode::Focus);
    app.toggle_view();
    assert_eq!(app.view_mode, ViewMode::Tasks);
}

#[test]
fn test_save_failure_is_shown() {
    let mut app = app_with(&["a"]);
    app.store.gateway().set_fail_writes(true);
    app.cycle_priority();

    assert!(app.message.is_some());
    assert_eq!(app.store.tasks()[0].priority, Priority::Medium);
}
