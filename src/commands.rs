use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::analytics::{active_projects, compute_metrics, due_on, tracked_count, weekly_activity};
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::models::{
    Priority, ProjectDraft, ProjectPatch, Snapshot, Status, Task, TaskDraft, TaskPatch,
};
use crate::storage::Gateway;
use crate::store::TaskStore;
use crate::transfer::{ExportType, ImportReport};

/// Shortened id for tables: the prefix is dropped and 8 characters kept.
pub fn short_id(id: &str) -> &str {
    let bare = id
        .strip_prefix("task-")
        .or_else(|| id.strip_prefix("project-"))
        .or_else(|| id.strip_prefix("subtask-"))
        .unwrap_or(id);
    bare.get(..8).unwrap_or(bare)
}

/// Finds the one id that equals `input` or starts with it.
///
/// The `task-`/`project-` prefix may be left out, so the short ids shown in
/// tables can be typed back in.
fn resolve<'a, I>(kind: &'static str, ids: I, input: &str) -> Result<String>
where
    I: Iterator<Item = &'a str> + Clone,
{
    let input = input.trim();
    if let Some(exact) = ids.clone().find(|id| *id == input) {
        return Ok(exact.to_string());
    }
    let matches: Vec<&str> = ids
        .filter(|id| !input.is_empty() && (id.starts_with(input) || short_matches(id, input)))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.to_string()),
        [] => Err(Error::NotFound { kind, id: input.to_string() }),
        _ => Err(Error::Validation(format!(
            "'{}' matches {} {}s, use more characters",
            input,
            matches.len(),
            kind
        ))),
    }
}

fn short_matches(id: &str, input: &str) -> bool {
    id.split_once('-').map(|(_, rest)| rest.starts_with(input)).unwrap_or(false)
}

pub fn resolve_task_id<G: Gateway>(store: &TaskStore<G>, input: &str) -> Result<String> {
    resolve("task", store.tasks().iter().map(|t| t.id.as_str()), input)
}

pub fn resolve_project_id<G: Gateway>(store: &TaskStore<G>, input: &str) -> Result<String> {
    resolve("project", store.projects().iter().map(|p| p.id.as_str()), input)
}

fn resolve_subtask_id(task: &Task, input: &str) -> Result<String> {
    // Subtasks can also be addressed by their 1-based position.
    if let Ok(n) = input.trim().parse::<usize>() {
        if n >= 1 && n <= task.subtasks.len() {
            return Ok(task.subtasks[n - 1].id.clone());
        }
    }
    resolve("subtask", task.subtasks.iter().map(|s| s.id.as_str()), input)
}

fn task_ref<'a, G: Gateway>(store: &'a TaskStore<G>, input: &str) -> Result<&'a Task> {
    let id = resolve_task_id(store, input)?;
    store.task(&id).ok_or_else(|| Error::task_not_found(&id))
}

fn priority_color(p: Priority) -> Color {
    match p {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn status_color(s: Status) -> Color {
    match s {
        Status::Completed => Color::Green,
        Status::InProgress => Color::Cyan,
        Status::Pending => Color::Yellow,
        Status::Canceled => Color::Grey,
    }
}

fn format_due(due: &DateTime<Utc>) -> String {
    due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn format_minutes(m: Option<f64>) -> String {
    m.map(|m| format!("{:.0}m", m)).unwrap_or_default()
}

/// Adds a new task to the store.
pub fn cmd_add<G: Gateway>(store: &mut TaskStore<G>, draft: TaskDraft, silent: bool) -> Result<()> {
    let task = store.add(draft)?;
    if !silent {
        println!("Task added (id = {})", short_id(&task.id));
    }
    Ok(())
}

/// Lists tasks matching `filter` in a formatted table, in stored order.
pub fn cmd_list<G: Gateway>(store: &TaskStore<G>, filter: &TaskFilter) -> Result<()> {
    let tasks = store.filtered(filter);
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Project").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Subtasks").add_attribute(Attribute::Bold),
            Cell::new("Spent").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let now = Utc::now();
    for (i, t) in tasks.iter().enumerate() {
        let project = t
            .project
            .as_deref()
            .map(|id| store.project(id).map(|p| p.name.clone()).unwrap_or_else(|| id.to_string()))
            .unwrap_or_default();
        let overdue = t.due_date.map(|d| d < now).unwrap_or(false)
            && !matches!(t.status, Status::Completed | Status::Canceled);
        let subtasks = if t.subtasks.is_empty() {
            String::new()
        } else {
            format!("{}/{} ({}%)", t.completed_subtasks(), t.subtasks.len(), t.subtask_progress())
        };

        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(short_id(&t.id)),
            Cell::new(&t.title),
            Cell::new(project),
            Cell::new(t.due_date.as_ref().map(format_due).unwrap_or_default())
                .fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(subtasks),
            Cell::new(format_minutes(t.time_spent)),
            Cell::new(t.status).fg(status_color(t.status)),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Prints every field of one task, with its subtasks.
pub fn cmd_show<G: Gateway>(store: &TaskStore<G>, id: &str) -> Result<()> {
    let t = task_ref(store, id)?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let project = t.project.as_deref().map(|id| match store.project(id) {
        Some(p) => format!("{} ({})", p.name, short_id(id)),
        None => format!("{} (deleted)", id),
    });
    let rows: Vec<(&str, String)> = vec![
        ("ID", t.id.clone()),
        ("Title", t.title.clone()),
        ("Description", t.description.clone().unwrap_or_default()),
        ("Status", t.status.to_string()),
        ("Priority", t.priority.to_string()),
        ("Category", t.category.clone().unwrap_or_default()),
        ("Project", project.unwrap_or_default()),
        ("Due", t.due_date.as_ref().map(format_due).unwrap_or_default()),
        ("Spent", format_minutes(t.time_spent)),
        ("Estimate", format_minutes(t.time_estimate)),
        ("Created", t.created_at.with_timezone(&Local).to_rfc3339()),
        ("Updated", t.updated_at.with_timezone(&Local).to_rfc3339()),
    ];
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k).add_attribute(Attribute::Bold), Cell::new(v)]);
    }
    println!("{table}");

    if !t.subtasks.is_empty() {
        println!(
            "Subtasks: {} of {} done ({}%)",
            t.completed_subtasks(),
            t.subtasks.len(),
            t.subtask_progress()
        );
        for (i, s) in t.subtasks.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, if s.completed { "x" } else { " " }, s.title);
        }
    }
    Ok(())
}

/// Edits an existing task's details. The patch id may be a short id.
pub fn cmd_edit<G: Gateway>(
    store: &mut TaskStore<G>,
    mut patch: TaskPatch,
    silent: bool,
) -> Result<()> {
    patch.id = resolve_task_id(store, &patch.id)?;
    let task = store.update(patch)?;
    if !silent {
        println!("Task {} updated.", short_id(&task.id));
    }
    Ok(())
}

/// Sets a task's status.
pub fn cmd_status<G: Gateway>(
    store: &mut TaskStore<G>,
    id: &str,
    status: Status,
    silent: bool,
) -> Result<()> {
    let id = resolve_task_id(store, id)?;
    let task = match status {
        Status::Completed => store.mark_completed(&id)?,
        Status::InProgress => store.mark_in_progress(&id)?,
        other => store.set_status(&id, other)?,
    };
    if !silent {
        println!("Task {} marked as {}.", short_id(&task.id), task.status);
    }
    Ok(())
}

/// Removes a task from the store by ID.
pub fn cmd_remove<G: Gateway>(store: &mut TaskStore<G>, id: &str, silent: bool) -> Result<()> {
    let id = resolve_task_id(store, id)?;
    let task = store.delete(&id)?;
    if !silent {
        println!("Task {} removed.", short_id(&task.id));
    }
    Ok(())
}

/// Moves a task to a 1-based position in the list.
pub fn cmd_move<G: Gateway>(
    store: &mut TaskStore<G>,
    id: &str,
    position: usize,
    silent: bool,
) -> Result<()> {
    if position == 0 {
        return Err(Error::Validation("positions start at 1".into()));
    }
    let id = resolve_task_id(store, id)?;
    store.move_task(&id, position - 1)?;
    if !silent {
        println!("Task {} moved to position {}.", short_id(&id), position);
    }
    Ok(())
}

/// Logs minutes worked on a specific task.
///
/// time_spent += minutes
pub fn cmd_log<G: Gateway>(
    store: &mut TaskStore<G>,
    id: &str,
    minutes: f64,
    silent: bool,
) -> Result<()> {
    let id = resolve_task_id(store, id)?;
    let task = store.log_time(&id, minutes)?;
    if !silent {
        println!(
            "Logged {:.0}m on task {} ({:.0}m total).",
            minutes,
            short_id(&task.id),
            task.time_spent.unwrap_or_default()
        );
    }
    Ok(())
}

pub fn cmd_subtask_add<G: Gateway>(
    store: &mut TaskStore<G>,
    task: &str,
    title: &str,
    silent: bool,
) -> Result<()> {
    let id = resolve_task_id(store, task)?;
    let sub = store.add_subtask(&id, title)?;
    if !silent {
        println!("Subtask '{}' added to task {}.", sub.title, short_id(&id));
    }
    Ok(())
}

pub fn cmd_subtask_toggle<G: Gateway>(
    store: &mut TaskStore<G>,
    task: &str,
    subtask: &str,
    silent: bool,
) -> Result<()> {
    let t = task_ref(store, task)?;
    let (task_id, sub_id) = (t.id.clone(), resolve_subtask_id(t, subtask)?);
    let updated = store.toggle_subtask(&task_id, &sub_id)?;
    if !silent {
        println!(
            "Subtasks of {}: {}% done.",
            short_id(&updated.id),
            updated.subtask_progress()
        );
    }
    Ok(())
}

pub fn cmd_subtask_remove<G: Gateway>(
    store: &mut TaskStore<G>,
    task: &str,
    subtask: &str,
    silent: bool,
) -> Result<()> {
    let t = task_ref(store, task)?;
    let (task_id, sub_id) = (t.id.clone(), resolve_subtask_id(t, subtask)?);
    store.remove_subtask(&task_id, &sub_id)?;
    if !silent {
        println!("Subtask removed from task {}.", short_id(&task_id));
    }
    Ok(())
}

pub fn cmd_project_add<G: Gateway>(
    store: &mut TaskStore<G>,
    draft: ProjectDraft,
    silent: bool,
) -> Result<()> {
    let project = store.add_project(draft)?;
    if !silent {
        println!("Project '{}' added (id = {}).", project.name, short_id(&project.id));
    }
    Ok(())
}

/// Lists all projects with their task counts.
pub fn cmd_project_list<G: Gateway>(store: &TaskStore<G>) -> Result<()> {
    if store.projects().is_empty() {
        println!("No projects found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Status", "Tasks", "Done"]);
    for p in store.projects() {
        let tasks = store.project_tasks(&p.id);
        let done = tasks.iter().filter(|t| t.is_completed()).count();
        table.add_row(vec![
            short_id(&p.id).to_string(),
            p.name.clone(),
            p.status.to_string(),
            tasks.len().to_string(),
            done.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn cmd_project_edit<G: Gateway>(
    store: &mut TaskStore<G>,
    mut patch: ProjectPatch,
    silent: bool,
) -> Result<()> {
    patch.id = resolve_project_id(store, &patch.id)?;
    let project = store.update_project(patch)?;
    if !silent {
        println!("Project '{}' updated.", project.name);
    }
    Ok(())
}

/// Removes a project. Its tasks are left as they are.
pub fn cmd_project_remove<G: Gateway>(
    store: &mut TaskStore<G>,
    id: &str,
    silent: bool,
) -> Result<()> {
    let id = resolve_project_id(store, id)?;
    let orphaned = store.project_tasks(&id).len();
    let project = store.delete_project(&id)?;
    if !silent {
        println!("Project '{}' removed.", project.name);
        if orphaned > 0 {
            println!("{} task(s) still reference it.", orphaned);
        }
    }
    Ok(())
}

/// Prints statistics, dashboard metrics and this week's activity.
pub fn cmd_stats<G: Gateway>(store: &TaskStore<G>) -> Result<()> {
    let stats = store.stats();
    let now = Utc::now();
    let metrics = compute_metrics(store.tasks(), now);
    let today = now.with_timezone(&Local).date_naive();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    let rows: Vec<(&str, String)> = vec![
        ("Total", stats.total.to_string()),
        ("Completed", stats.completed.to_string()),
        ("Pending", stats.pending.to_string()),
        ("High priority", stats.high_priority.to_string()),
        ("Medium priority", stats.medium_priority.to_string()),
        ("Low priority", stats.low_priority.to_string()),
        ("Completion rate", format!("{}%", stats.completion_rate)),
        ("Created this week", metrics.tasks_this_week.to_string()),
        ("Avg. time on completed", format!("{}m", metrics.avg_completion_time)),
        ("Open high priority", metrics.pending_high_priority.to_string()),
        ("Tracked tasks", tracked_count(store.tasks()).to_string()),
        ("Due today", due_on(store.tasks(), today).len().to_string()),
        ("Active projects", active_projects(store.projects()).to_string()),
    ];
    for (k, v) in rows {
        table.add_row(vec![k.to_string(), v]);
    }
    println!("{table}");

    let mut week = Table::new();
    week.load_preset(UTF8_FULL).set_header(vec!["Day", "Created", "Completed"]);
    for day in weekly_activity(store.tasks(), today) {
        week.add_row(vec![
            day.day.format("%a %d %b").to_string(),
            day.all.to_string(),
            day.completed.to_string(),
        ]);
    }
    println!("{week}");
    Ok(())
}

/// Writes an export envelope to `output` (or the default file name).
///
/// Returns the path written.
pub fn cmd_export<G: Gateway>(
    store: &TaskStore<G>,
    export_type: ExportType,
    output: Option<PathBuf>,
    silent: bool,
) -> Result<PathBuf> {
    let envelope = store.export(export_type)?;
    let path = output.unwrap_or_else(|| PathBuf::from(export_type.default_file_name()));
    let s = serde_json::to_string_pretty(&envelope)?;
    fs::write(&path, s)?;
    if !silent {
        println!("Exported {} to {}", export_type, path.display());
    }
    Ok(path)
}

/// Reads an export envelope from `path` and imports it.
pub fn cmd_import<G: Gateway>(
    store: &mut TaskStore<G>,
    path: &Path,
    silent: bool,
) -> Result<ImportReport> {
    let s = fs::read_to_string(path)?;
    let report = store.import_str(&s)?;
    if !silent {
        println!("Imported {} {} record(s).", report.count, report.export_type);
    }
    Ok(report)
}

/// Clears all planner data: tasks, projects and every other section.
pub fn cmd_reset<G: Gateway>(store: &mut TaskStore<G>, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all planner data? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    store.replace_all(Snapshot::default())?;
    println!("Data reset successfully.");
    Ok(())
}
