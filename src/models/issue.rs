use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset};

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;
const PERSON_MAX: usize = 100;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum IssueStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "Open"),
            IssueStatus::InProgress => write!(f, "In progress"),
            IssueStatus::Resolved => write!(f, "Resolved"),
            IssueStatus::Closed => write!(f, "Closed"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::Low,
        IssuePriority::Medium,
        IssuePriority::High,
        IssuePriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "low",
            IssuePriority::Medium => "medium",
            IssuePriority::High => "high",
            IssuePriority::Critical => "critical",
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuePriority::Low => write!(f, "Low"),
            IssuePriority::Medium => write!(f, "Medium"),
            IssuePriority::High => write!(f, "High"),
            IssuePriority::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub labels: Json<Vec<String>>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub estimated_hours: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Issue {
    pub fn generate_id() -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("iss-{}", &uuid[..8])
    }

    /// Builds a fresh issue from an already validated payload.
    pub fn from_new(new: NewIssue, now: OffsetDateTime) -> Issue {
        Issue {
            id: Issue::generate_id(),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assignee: new.assignee,
            reporter: new.reporter,
            labels: Json(new.labels.unwrap_or_default()),
            due_date: new.due_date,
            estimated_hours: new.estimated_hours,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: IssueStatus,
    #[serde(default)]
    pub priority: IssuePriority,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default, alias = "dueDate", with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default, alias = "estimatedHours")]
    pub estimated_hours: Option<f64>,
}

impl NewIssue {
    pub fn validate(mut self) -> Result<NewIssue, ValidationError> {
        self.title = validate_title(&self.title)?;
        validate_description(self.description.as_deref())?;
        validate_person("assignee", self.assignee.as_deref())?;
        validate_person("reporter", self.reporter.as_deref())?;
        validate_hours(self.estimated_hours)?;
        self.due_date = self.due_date.map(to_utc);
        Ok(self)
    }
}

/// Partial update. The outer `Option` tells whether a field was sent at all,
/// the inner one whether it was sent as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub priority: Option<IssuePriority>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub reporter: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub labels: Option<Option<Vec<String>>>,
    #[serde(default, alias = "dueDate", deserialize_with = "nullable_datetime")]
    pub due_date: Option<Option<OffsetDateTime>>,
    #[serde(default, alias = "estimatedHours", deserialize_with = "nullable")]
    pub estimated_hours: Option<Option<f64>>,
}

impl IssueChanges {
    pub fn validate(mut self) -> Result<IssueChanges, ValidationError> {
        if let Some(title) = self.title.take() {
            self.title = Some(validate_title(&title)?);
        }
        if let Some(description) = &self.description {
            validate_description(description.as_deref())?;
        }
        if let Some(assignee) = &self.assignee {
            validate_person("assignee", assignee.as_deref())?;
        }
        if let Some(reporter) = &self.reporter {
            validate_person("reporter", reporter.as_deref())?;
        }
        if let Some(hours) = self.estimated_hours {
            validate_hours(hours)?;
        }
        self.due_date = self.due_date.map(|due| due.map(to_utc));
        Ok(self)
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_datetime<'de, D>(deserializer: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::option::deserialize(deserializer).map(Some)
}

fn to_utc(date: OffsetDateTime) -> OffsetDateTime {
    date.to_offset(UtcOffset::UTC)
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("title", "Title cannot be empty"));
    }
    if trimmed.chars().count() > TITLE_MAX {
        return Err(ValidationError::new(
            "title",
            format!("must be at most {} characters", TITLE_MAX),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    match description {
        Some(text) if text.chars().count() > DESCRIPTION_MAX => Err(ValidationError::new(
            "description",
            format!("must be at most {} characters", DESCRIPTION_MAX),
        )),
        _ => Ok(()),
    }
}

fn validate_person(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.chars().count() > PERSON_MAX {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", PERSON_MAX),
        ));
    }
    if !value.is_empty() && !value.contains('@') {
        return Err(ValidationError::new(field, "Must be a valid email address"));
    }
    Ok(())
}

fn validate_hours(hours: Option<f64>) -> Result<(), ValidationError> {
    match hours {
        Some(h) if h.is_nan() || h < 0.0 => Err(ValidationError::new(
            "estimated_hours",
            "must be greater than or equal to 0",
        )),
        _ => Ok(()),
    }
}
