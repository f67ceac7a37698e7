//! # Planer
//!
//! A personal task planner for the terminal. Planer keeps tasks, subtasks and
//! projects in a single local JSON document, derives statistics from them, and
//! ships a Pomodoro focus timer.
//!
//! ## Features
//!
//! *   **Tasks**: status (pending, in-progress, completed, canceled), priority
//!     (low, medium, high), due dates, categories, projects and checklists.
//! *   **Statistics**: totals, per-priority counts and completion rate, always in
//!     sync with the task list, plus weekly activity for the dashboard.
//! *   **Filtering**: by status, priority and free-text search.
//! *   **Export / Import**: tasks, projects or everything as a JSON envelope.
//! *   **Dual Interface**:
//!     *   **CLI**: scriptable and quick for single commands.
//!     *   **TUI**: task list, projects, dashboard and focus timer.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! planer
//! # or explicitly
//! planer ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! **Global**
//! *   `q`: Quit
//! *   `Tab`: Next view (Tasks, Projects, Dashboard, Focus)
//!
//! **Task View**
//! *   `a`: Add new task
//! *   `Space`: Mark selected task as completed
//! *   `i`: Mark selected task as in progress
//! *   `d`: Delete selected task
//! *   `e`: Edit title
//! *   `D`: Edit description
//! *   `t`: Edit due date
//! *   `p`: Cycle priority
//! *   `s`: Add subtask
//! *   `1`-`9`: Toggle the n-th subtask
//! *   `J` / `K`: Move task down / up
//! *   `/`: Search
//! *   `f`: Cycle status filter
//! *   `P`: Cycle priority filter
//!
//! **Projects View**
//! *   `a`: Add new project
//! *   `d`: Delete selected project (its tasks are kept)
//!
//! **Focus View**
//! *   `Space`: Start / pause
//! *   `r`: Reset
//! *   `1` / `2` / `3`: Pomodoro / short break / long break
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! planer add "Write report" --priority high --due 2025-12-01 --subtask Outline --subtask Draft
//! planer list --status pending --priority high --search report
//! planer complete <ID>
//! planer subtask toggle <ID> 1
//! planer stats
//! planer export --type all --output backup.json
//! planer import backup.json
//! ```
//!
//! IDs may be shortened to the 8 characters shown by `planer list`.
//!
//! ## Data Storage
//!
//! Data is saved in your local data directory:
//! *   Linux: `~/.local/share/planer/planer_app.json`
//! *   macOS: `~/Library/Application Support/planer/planer_app.json`
//! *   Windows: `%APPDATA%\planer\planer_app.json`
//!
//! You can override this by setting the `PLANER_DB` environment variable or
//! `data_file` in `config.toml` (see [`config::Config`]).

pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod focus;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod transfer;
pub mod tui;

pub use error::{Error, Result};
