use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use planer::commands::*;
use planer::config::Config;
use planer::filter::{parse_priority_filter, parse_status_filter, TaskFilter};
use planer::models::{
    parse_due, Priority, ProjectDraft, ProjectPatch, ProjectStatus, Status, Subtask, TaskDraft,
    TaskPatch,
};
use planer::storage::JsonFileGateway;
use planer::store::TaskStore;
use planer::transfer::ExportType;
use planer::tui::run_tui;
use planer::{Error, Result};

#[derive(Parser)]
#[command(name = "planer")]
#[command(about = "Personal task planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Longer description
        #[arg(short, long)]
        description: Option<String>,
        /// Priority: low, medium, high (or 1-3)
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Initial status
        #[arg(short, long, default_value = "pending")]
        status: Status,
        /// Category, e.g. work or personal
        #[arg(short, long)]
        category: Option<String>,
        /// Project id
        #[arg(long)]
        project: Option<String>,
        /// Due date: YYYY-MM-DD or "YYYY-MM-DD HH:MM"
        #[arg(long, value_parser = parse_due_arg)]
        due: Option<chrono::DateTime<chrono::Utc>>,
        /// Estimated minutes
        #[arg(short, long)]
        estimate: Option<f64>,
        /// Subtask title (repeatable)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List tasks in their saved order
    List {
        /// Status filter: all, pending, in-progress, completed, canceled
        #[arg(short, long, default_value = "all")]
        status: String,
        /// Priority filter: all, high, medium, low
        #[arg(short, long, default_value = "all")]
        priority: String,
        /// Case-insensitive text to look for in title or description
        #[arg(short = 'q', long, default_value = "")]
        search: String,
    },
    /// Show one task in detail
    Show { id: String },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description ("" clears it)
        #[arg(short, long)]
        description: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// New status
        #[arg(short, long)]
        status: Option<Status>,
        /// New category ("" clears it)
        #[arg(short, long)]
        category: Option<String>,
        /// New project id ("" clears it)
        #[arg(long)]
        project: Option<String>,
        /// New due date ("" clears it)
        #[arg(long)]
        due: Option<String>,
        /// New estimate in minutes
        #[arg(short, long)]
        estimate: Option<f64>,
    },
    /// Mark a task as in progress
    Start { id: String },
    /// Mark a task as completed
    Complete { id: String },
    /// Mark a task as canceled
    Cancel { id: String },
    /// Remove a task
    Remove { id: String },
    /// Move a task to a position in the list (1 = top)
    Move { id: String, position: usize },
    /// Log minutes worked on a task
    Log { id: String, minutes: f64 },
    /// Manage subtasks
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Show statistics and this week's activity
    Stats,
    /// Export data to a JSON file
    Export {
        /// What to export: tasks, all, projects
        #[arg(short = 't', long = "type", default_value = "tasks")]
        kind: ExportType,
        /// Output file (defaults to planer-<type>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a file written by export
    Import { path: PathBuf },
    /// Reset the database (delete all planner data)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum SubtaskCommands {
    /// Add a subtask
    Add { task: String, title: String },
    /// Toggle a subtask by id or 1-based position
    Toggle { task: String, subtask: String },
    /// Remove a subtask by id or 1-based position
    Remove { task: String, subtask: String },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Add a new project
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List projects
    List,
    /// Edit a project
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// active, on-hold, completed, archived
        #[arg(short, long)]
        status: Option<ProjectStatus>,
    },
    /// Remove a project (its tasks are kept)
    Remove { id: String },
}

const DUE_FORMATS: &str = "Use YYYY-MM-DD or \"YYYY-MM-DD HH:MM\".";

fn parse_due_arg(s: &str) -> std::result::Result<chrono::DateTime<chrono::Utc>, String> {
    parse_due(s).ok_or_else(|| format!("invalid due date '{}'. {}", s, DUE_FORMATS))
}

/// `""` on the command line clears an optional field.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.trim().is_empty() { None } else { Some(v) })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("planer=warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "planer", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let mut store = TaskStore::open(JsonFileGateway::new(config.data_path()));
    tracing::debug!(path = %store.gateway().path().display(), "using data file");
    if let Some(err) = store.error() {
        eprintln!("Warning: {}. Starting with empty data.", err);
    }

    match cli.command {
        Some(Commands::Add {
            title,
            description,
            priority,
            status,
            category,
            project,
            due,
            estimate,
            subtasks,
        }) => {
            let project = project.map(|p| resolve_project_id(&store, &p)).transpose()?;
            let draft = TaskDraft {
                title,
                description,
                priority,
                status,
                category,
                project,
                due_date: due,
                time_estimate: estimate,
                subtasks: subtasks.into_iter().map(Subtask::new).collect(),
                ..TaskDraft::default()
            };
            cmd_add(&mut store, draft, false)
        }
        Some(Commands::List { status, priority, search }) => {
            let filter = TaskFilter {
                status: parse_status_filter(&status).map_err(Error::Validation)?,
                priority: parse_priority_filter(&priority).map_err(Error::Validation)?,
                search,
            };
            cmd_list(&store, &filter)
        }
        Some(Commands::Show { id }) => cmd_show(&store, &id),
        Some(Commands::Edit {
            id,
            title,
            description,
            priority,
            status,
            category,
            project,
            due,
            estimate,
        }) => {
            let due_date = match due {
                None => None,
                Some(d) if d.trim().is_empty() => Some(None),
                Some(d) => Some(Some(parse_due(&d).ok_or_else(|| {
                    Error::Validation(format!("invalid due date '{}'. {}", d, DUE_FORMATS))
                })?)),
            };
            let project = match clearable(project) {
                Some(Some(p)) => Some(Some(resolve_project_id(&store, &p)?)),
                other => other,
            };
            let patch = TaskPatch {
                title,
                description: clearable(description),
                priority,
                status,
                category: clearable(category),
                project,
                due_date,
                time_estimate: estimate.map(Some),
                ..TaskPatch::new(id)
            };
            cmd_edit(&mut store, patch, false)
        }
        Some(Commands::Start { id }) => cmd_status(&mut store, &id, Status::InProgress, false),
        Some(Commands::Complete { id }) => cmd_status(&mut store, &id, Status::Completed, false),
        Some(Commands::Cancel { id }) => cmd_status(&mut store, &id, Status::Canceled, false),
        Some(Commands::Remove { id }) => cmd_remove(&mut store, &id, false),
        Some(Commands::Move { id, position }) => cmd_move(&mut store, &id, position, false),
        Some(Commands::Log { id, minutes }) => cmd_log(&mut store, &id, minutes, false),
        Some(Commands::Subtask { command }) => match command {
            SubtaskCommands::Add { task, title } => {
                cmd_subtask_add(&mut store, &task, &title, false)
            }
            SubtaskCommands::Toggle { task, subtask } => {
                cmd_subtask_toggle(&mut store, &task, &subtask, false)
            }
            SubtaskCommands::Remove { task, subtask } => {
                cmd_subtask_remove(&mut store, &task, &subtask, false)
            }
        },
        Some(Commands::Project { command }) => match command {
            ProjectCommands::Add { name, description } => {
                let draft = ProjectDraft { description, ..ProjectDraft::new(name) };
                cmd_project_add(&mut store, draft, false)
            }
            ProjectCommands::List => cmd_project_list(&store),
            ProjectCommands::Edit { id, name, description, status } => {
                let patch = ProjectPatch {
                    name,
                    description: clearable(description),
                    status,
                    ..ProjectPatch::new(id)
                };
                cmd_project_edit(&mut store, patch, false)
            }
            ProjectCommands::Remove { id } => cmd_project_remove(&mut store, &id, false),
        },
        Some(Commands::Stats) => cmd_stats(&store),
        Some(Commands::Export { kind, output }) => {
            cmd_export(&store, kind, output, false).map(|_| ())
        }
        Some(Commands::Import { path }) => cmd_import(&mut store, &path, false).map(|_| ()),
        Some(Commands::Reset { force }) => cmd_reset(&mut store, force),
        Some(Commands::Completions { .. }) => Ok(()),
        Some(Commands::Ui) | None => run_tui(store, &config),
    }
}
