use planer::commands::*;
use planer::filter::TaskFilter;
use planer::models::{
    Priority, ProjectDraft, ProjectPatch, ProjectStatus, Status, Subtask, TaskDraft, TaskPatch,
};
use planer::storage::{Gateway, JsonFileGateway};
use planer::store::TaskStore;
use planer::transfer::ExportType;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn with_test_db<F>(f: F)
where
    F: FnOnce(PathBuf, TaskStore<JsonFileGateway>),
{
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("planer_app.json");
    let store = TaskStore::open(JsonFileGateway::new(&db_path));
    f(db_path, store);
}

/// Re-reads the file from disk, like a fresh run of the binary.
fn reopen(path: &Path) -> TaskStore<JsonFileGateway> {
    let store = TaskStore::open(JsonFileGateway::new(path));
    assert!(store.error().is_none());
    store
}

#[test]
fn test_add_and_list() {
    with_test_db(|path, mut store| {
        let draft = TaskDraft {
            category: Some("work".into()),
            priority: Priority::High,
            ..TaskDraft::new("Test Task")
        };
        cmd_add(&mut store, draft, true).unwrap();
        cmd_list(&store, &TaskFilter::default()).unwrap();

        let store = reopen(&path);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].title, "Test Task");
        assert_eq!(store.tasks()[0].category, Some("work".into()));
        assert_eq!(store.tasks()[0].priority, Priority::High);
    });
}

#[test]
fn test_complete_task_by_short_id() {
    with_test_db(|path, mut store| {
        cmd_add(&mut store, TaskDraft::new("Task to complete"), true).unwrap();
        let id = store.tasks()[0].id.clone();

        cmd_status(&mut store, short_id(&id), Status::Completed, true).unwrap();

        let store = reopen(&path);
        assert_eq!(store.tasks()[0].status, Status::Completed);
        assert_eq!(store.stats().completion_rate, 100);
    });
}

#[test]
fn test_unknown_id_is_not_found() {
    with_test_db(|_path, mut store| {
        cmd_add(&mut store, TaskDraft::new("Only task"), true).unwrap();
        let err = cmd_remove(&mut store, "nope", true).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.tasks().len(), 1);
    });
}

#[test]
fn test_edit_clears_optional_fields() {
    with_test_db(|path, mut store| {
        let draft = TaskDraft {
            description: Some("old".into()),
            category: Some("home".into()),
            ..TaskDraft::new("Edit me")
        };
        cmd_add(&mut store, draft, true).unwrap();
        let id = store.tasks()[0].id.clone();

        let patch = TaskPatch {
            title: Some("Edited".into()),
            description: Some(None),
            ..TaskPatch::new(short_id(&id))
        };
        cmd_edit(&mut store, patch, true).unwrap();

        let store = reopen(&path);
        let task = &store.tasks()[0];
        assert_eq!(task.title, "Edited");
        assert_eq!(task.description, None);
        assert_eq!(task.category, Some("home".into()));
    });
}

#[test]
fn test_move_persists_order() {
    with_test_db(|path, mut store| {
        for title in ["first", "second", "third"] {
            cmd_add(&mut store, TaskDraft::new(title), true).unwrap();
        }
        let third = store.tasks()[2].id.clone();

        // Positions are 1-based on the command line.
        cmd_move(&mut store, &third, 1, true).unwrap();

        let store = reopen(&path);
        let titles: Vec<&str> = store.tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "first", "second"]);
    });
}

#[test]
fn test_subtasks_by_position() {
    with_test_db(|path, mut store| {
        let draft = TaskDraft {
            subtasks: vec![Subtask::new("Outline"), Subtask::new("Draft")],
            ..TaskDraft::new("Write report")
        };
        cmd_add(&mut store, draft, true).unwrap();
        let id = store.tasks()[0].id.clone();

        cmd_subtask_add(&mut store, &id, "Proofread", true).unwrap();
        cmd_subtask_toggle(&mut store, &id, "2", true).unwrap();
        cmd_subtask_remove(&mut store, &id, "1", true).unwrap();

        let store = reopen(&path);
        let subs = &store.tasks()[0].subtasks;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].title, "Draft");
        assert!(subs[0].completed);
        assert_eq!(subs[1].title, "Proofread");
        assert!(!subs[1].completed);
        assert_eq!(store.tasks()[0].subtask_progress(), 50);
    });
}

#[test]
fn test_log_time_accumulates() {
    with_test_db(|path, mut store| {
        cmd_add(&mut store, TaskDraft::new("Tracked"), true).unwrap();
        let id = store.tasks()[0].id.clone();

        cmd_log(&mut store, &id, 25.0, true).unwrap();
        cmd_log(&mut store, &id, 15.0, true).unwrap();
        assert!(cmd_log(&mut store, &id, -5.0, true).is_err());

        let store = reopen(&path);
        assert_eq!(store.tasks()[0].time_spent, Some(40.0));
    });
}

#[test]
fn test_project_lifecycle() {
    with_test_db(|path, mut store| {
        cmd_project_add(&mut store, ProjectDraft::new("Website"), true).unwrap();
        let project_id = store.projects()[0].id.clone();

        let draft =
            TaskDraft { project: Some(project_id.clone()), ..TaskDraft::new("Landing page") };
        cmd_add(&mut store, draft, true).unwrap();

        let patch = ProjectPatch {
            status: Some(ProjectStatus::OnHold),
            ..ProjectPatch::new(short_id(&project_id))
        };
        cmd_project_edit(&mut store, patch, true).unwrap();
        assert_eq!(store.projects()[0].status, ProjectStatus::OnHold);

        cmd_project_remove(&mut store, &project_id, true).unwrap();

        let store = reopen(&path);
        assert!(store.projects().is_empty());
        // The task keeps its now dangling reference.
        assert_eq!(store.tasks()[0].project, Some(project_id));
    });
}

#[test]
fn test_export_and_import_files() {
    with_test_db(|_path, mut store| {
        cmd_add(&mut store, TaskDraft::new("Exported"), true).unwrap();
        cmd_project_add(&mut store, ProjectDraft::new("Home"), true).unwrap();

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("backup.json");
        let written = cmd_export(&store, ExportType::All, Some(out.clone()), true).unwrap();
        assert_eq!(written, out);

        let text = fs::read_to_string(&out).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["exportType"], "all");
        assert_eq!(json["version"], "1.0");

        let fresh_dir = TempDir::new().unwrap();
        let mut fresh = TaskStore::open(JsonFileGateway::new(fresh_dir.path().join("db.json")));
        let report = cmd_import(&mut fresh, &out, true).unwrap();
        assert_eq!(report.count, 2);
        assert_eq!(fresh.snapshot(), store.snapshot());
    });
}

#[test]
fn test_reset_with_force() {
    with_test_db(|path, mut store| {
        let stored = serde_json::json!({
            "tasks": [{ "id": "task-1", "title": "Doomed" }],
            "notes": [{ "body": "gone" }],
            "settings": { "theme": "dark" },
        });
        fs::write(&path, stored.to_string()).unwrap();
        store.load().unwrap();
        assert_eq!(store.tasks().len(), 1);
        cmd_reset(&mut store, true).unwrap();

        let store = reopen(&path);
        assert!(store.tasks().is_empty());
        assert!(store.snapshot().notes.is_empty());
        assert!(store.snapshot().extra.is_empty());
    });
}

#[test]
fn test_ambiguous_short_id() {
    with_test_db(|_path, mut store| {
        for id in ["task-abc1", "task-abc2"] {
            let draft = TaskDraft { id: Some(id.into()), ..TaskDraft::new(id) };
            cmd_add(&mut store, draft, true).unwrap();
        }
        assert!(resolve_task_id(&store, "abc").is_err());
        assert_eq!(resolve_task_id(&store, "abc2").unwrap(), "task-abc2");
        assert_eq!(resolve_task_id(&store, "task-abc1").unwrap(), "task-abc1");
    });
}

#[test]
fn test_corrupt_file_starts_empty_with_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("planer_app.json");
    fs::write(&path, "{ not json").unwrap();

    let gateway = JsonFileGateway::new(&path);
    assert!(gateway.read_all().is_err());
    assert!(gateway.read_all_or_default().tasks.is_empty());

    let store = TaskStore::open(gateway);
    assert!(store.tasks().is_empty());
    assert!(store.error().is_some());
}
