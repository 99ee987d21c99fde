//! Mini-project records and the payloads that create or change them.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum trimmed title length accepted before a request is sent.
pub const MIN_TITLE_LEN: usize = 3;

/// Upper bound for `progress`.
pub const MAX_PROGRESS: u8 = 100;

/// Unknown enum text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseEnumError {
                kind: "priority",
                value: s.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "inprogress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "inprogress" | "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
                expected: "pending, inprogress, completed",
            }),
        }
    }
}

/// Nested assignee as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    pub id: i64,
    pub username: String,
}

/// A project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<AssignedUser>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
}

impl Project {
    pub fn assignee_id(&self) -> Option<i64> {
        self.assigned_to.as_ref().map(|u| u.id)
    }
}

/// Optional list filters; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Projects due on or before this date.
    pub due_date: Option<NaiveDate>,
}

impl ProjectFilter {
    /// Query pairs in server parameter names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        if let Some(due) = self.due_date {
            pairs.push(("due_date", due.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

/// Payload of `POST /mini-projects/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub assigned_to_id: Option<i64>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub status: Status,
    pub progress: u8,
}

impl NewProject {
    /// New project with the form defaults: medium priority, pending, 0%.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            assigned_to_id: None,
            priority: Priority::default(),
            due_date: None,
            status: Status::default(),
            progress: 0,
        }
    }

    /// Client-side hints; the server remains the validator.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_progress(self.progress)
    }
}

/// Fields only a trainer may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDetails {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Payload of `PUT /mini-projects/{id}/`.
///
/// Always carries `status` and `progress`; `details` is present only for
/// trainer updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectUpdate {
    pub status: Status,
    pub progress: u8,
    #[serde(flatten)]
    pub details: Option<ProjectDetails>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<(), String> {
        validate_progress(self.progress)?;
        if let Some(details) = &self.details {
            validate_title(&details.title)?;
        }
        Ok(())
    }
}

/// Requested changes to an existing project; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectEdits {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<Status>,
    pub progress: Option<u8>,
}

impl ProjectEdits {
    /// Whether any trainer-only field is being changed.
    pub fn touches_details(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.priority.is_some()
            || self.due_date.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_details() && self.status.is_none() && self.progress.is_none()
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().chars().count() < MIN_TITLE_LEN {
        return Err(format!(
            "Title is required (min {MIN_TITLE_LEN} characters)."
        ));
    }
    Ok(())
}

fn validate_progress(progress: u8) -> Result<(), String> {
    if progress > MAX_PROGRESS {
        return Err(format!("Progress must be between 0 and {MAX_PROGRESS}."));
    }
    Ok(())
}
