//! Export and import of planner data as JSON envelopes.
//!
//! An envelope wraps one slice of the document:
//!
//! ```json
//! { "exportedAt": "...", "exportType": "tasks", "version": "1.0", "data": [...] }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{ProjectDraft, ProjectPatch, Snapshot, TaskDraft, TaskPatch};
use crate::storage::Gateway;
use crate::store::{
    check_snapshot, insert_project, insert_task, merge_project, merge_task, TaskStore,
};

pub const EXPORT_VERSION: &str = "1.0";

/// Which slice of the document an envelope carries.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Tasks,
    All,
    Projects,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Tasks => "tasks",
            ExportType::All => "all",
            ExportType::Projects => "projects",
        }
    }

    /// File name used when the user gives none.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportType::Tasks => "planer-tasks.json",
            ExportType::All => "planer-data.json",
            ExportType::Projects => "planer-projects.json",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tasks" => Ok(ExportType::Tasks),
            "all" => Ok(ExportType::All),
            "projects" => Ok(ExportType::Projects),
            other => {
                Err(format!("unknown export type '{}' (expected tasks, all or projects)", other))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub exported_at: DateTime<Utc>,
    pub export_type: ExportType,
    pub version: String,
    pub data: Value,
}

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub export_type: ExportType,
    /// Number of records taken from the envelope.
    pub count: usize,
}

enum Upsert<D, P> {
    Create(D),
    Merge(P),
}

impl<G: Gateway> TaskStore<G> {
    /// Wraps the requested slice of the current document in an envelope.
    pub fn export(&self, export_type: ExportType) -> Result<ExportEnvelope> {
        let data = match export_type {
            ExportType::Tasks => serde_json::to_value(self.tasks())?,
            ExportType::All => serde_json::to_value(self.snapshot())?,
            ExportType::Projects => serde_json::to_value(self.projects())?,
        };
        info!(export_type = %export_type, "exported");
        Ok(ExportEnvelope {
            exported_at: Utc::now(),
            export_type,
            version: EXPORT_VERSION.to_string(),
            data,
        })
    }

    /// Imports a JSON envelope given as text.
    pub fn import_str(&mut self, input: &str) -> Result<ImportReport> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::InvalidImport(format!("not valid JSON: {}", e)))?;
        self.import(value)
    }

    /// Applies an exported envelope.
    ///
    /// Tasks and projects are upserted by id: a known id is merged like
    /// [`TaskStore::update`], anything else is created like [`TaskStore::add`].
    /// `all` replaces the whole document. The envelope is checked in full
    /// before anything is applied, and the result is saved in one write, so a
    /// bad record leaves the store untouched.
    pub fn import(&mut self, envelope: Value) -> Result<ImportReport> {
        let obj = envelope
            .as_object()
            .ok_or_else(|| Error::InvalidImport("expected a JSON object".into()))?;
        let data = obj
            .get("data")
            .filter(|d| !d.is_null())
            .ok_or_else(|| Error::InvalidImport("missing 'data' field".into()))?;
        let export_type = obj
            .get("exportType")
            .ok_or_else(|| Error::InvalidImport("missing 'exportType' field".into()))?;
        let export_type: ExportType = export_type
            .as_str()
            .ok_or_else(|| Error::InvalidImport("'exportType' must be a string".into()))?
            .parse()
            .map_err(Error::InvalidImport)?;

        let report = match export_type {
            ExportType::All => {
                if !data.is_object() {
                    return Err(Error::InvalidImport("'data' must be an object for 'all'".into()));
                }
                let snapshot: Snapshot = serde_json::from_value(data.clone())
                    .map_err(|e| Error::InvalidImport(format!("bad snapshot: {}", e)))?;
                check_snapshot(&snapshot).map_err(|e| Error::InvalidImport(e.to_string()))?;
                let count = snapshot.tasks.len() + snapshot.projects.len();
                self.replace_all(snapshot)?;
                ImportReport { export_type, count }
            }
            ExportType::Tasks => {
                let items = records(data)?;
                let mut known: Vec<String> = self.tasks().iter().map(|t| t.id.clone()).collect();
                let ops = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        parse_upsert::<TaskDraft, TaskPatch>(item, &mut known)
                            .map_err(|e| Error::InvalidImport(format!("task #{}: {}", i + 1, e)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut next = self.snapshot().clone();
                let now = Utc::now();
                for (i, op) in ops.into_iter().enumerate() {
                    let applied = match op {
                        Upsert::Create(draft) => insert_task(&mut next, draft, now).map(|_| ()),
                        Upsert::Merge(patch) => merge_task(&mut next, &patch).map(|_| ()),
                    };
                    applied.map_err(|e| Error::InvalidImport(format!("task #{}: {}", i + 1, e)))?;
                }
                self.commit(next)?;
                ImportReport { export_type, count: items.len() }
            }
            ExportType::Projects => {
                let items = records(data)?;
                let mut known: Vec<String> =
                    self.projects().iter().map(|p| p.id.clone()).collect();
                let ops = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        parse_upsert::<ProjectDraft, ProjectPatch>(item, &mut known)
                            .map_err(|e| Error::InvalidImport(format!("project #{}: {}", i + 1, e)))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut next = self.snapshot().clone();
                let now = Utc::now();
                for (i, op) in ops.into_iter().enumerate() {
                    let applied = match op {
                        Upsert::Create(draft) => insert_project(&mut next, draft, now).map(|_| ()),
                        Upsert::Merge(patch) => merge_project(&mut next, &patch).map(|_| ()),
                    };
                    applied.map_err(|e| {
                        Error::InvalidImport(format!("project #{}: {}", i + 1, e))
                    })?;
                }
                self.commit(next)?;
                ImportReport { export_type, count: items.len() }
            }
        };
        info!(export_type = %report.export_type, count = report.count, "imported");
        Ok(report)
    }
}

fn records(data: &Value) -> Result<&Vec<Value>> {
    data.as_array()
        .ok_or_else(|| Error::InvalidImport("'data' must be a list".into()))
}

/// Decides create-or-merge for one record and parses it accordingly.
///
/// `known` collects ids seen so far, so a record repeated within the same
/// envelope merges into the earlier one.
fn parse_upsert<D, P>(item: &Value, known: &mut Vec<String>) -> Result<Upsert<D, P>>
where
    D: serde::de::DeserializeOwned,
    P: serde::de::DeserializeOwned,
{
    if !item.is_object() {
        return Err(Error::InvalidImport("record is not an object".into()));
    }
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match id {
        Some(id) if known.iter().any(|k| k == id) => {
            Ok(Upsert::Merge(serde_json::from_value(item.clone())?))
        }
        _ => {
            if let Some(id) = id {
                known.push(id.to_string());
            }
            Ok(Upsert::Create(serde_json::from_value(item.clone())?))
        }
    }
}
