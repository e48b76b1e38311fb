use std::sync::Arc;

use askama::Template;
use axum::{extract::RawQuery, Extension};
use time::OffsetDateTime;
use url::form_urlencoded;

use crate::{
    models::{
        issue::{Issue, IssuePriority, IssueStatus},
        listing::{ListQuery, Pagination},
    },
    services::issues::list_issues,
    AppError, AppState,
};

const SORT_CHOICES: [(&str, &str); 5] = [
    ("updated_at", "Last updated"),
    ("created_at", "Created"),
    ("priority", "Priority"),
    ("status", "Status"),
    ("title", "Title"),
];

pub struct FilterChoice {
    value: String,
    label: String,
    selected: bool,
}

pub struct IssueRow {
    id: String,
    title: String,
    status: IssueStatus,
    status_value: &'static str,
    priority: IssuePriority,
    priority_value: &'static str,
    assignee: String,
    labels: String,
    due: String,
    updated: String,
}

impl From<Issue> for IssueRow {
    fn from(issue: Issue) -> Self {
        IssueRow {
            id: issue.id,
            title: issue.title,
            status: issue.status,
            status_value: issue.status.as_str(),
            priority: issue.priority,
            priority_value: issue.priority.as_str(),
            assignee: issue.assignee.unwrap_or_else(|| "Unassigned".to_string()),
            labels: issue.labels.0.join(", "),
            due: issue.due_date.map(format_date).unwrap_or_default(),
            updated: format_date(issue.updated_at),
        }
    }
}

fn format_date(date: OffsetDateTime) -> String {
    format!(
        "{}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[derive(Template)]
#[template(path = "issue-list.html")]
pub struct IssueListPage {
    issues: Vec<IssueRow>,
    search: String,
    status_choices: Vec<FilterChoice>,
    priority_choices: Vec<FilterChoice>,
    assignee_choices: Vec<FilterChoice>,
    sort_choices: Vec<FilterChoice>,
    descending: bool,
    pagination: Pagination,
    prev_href: Option<String>,
    next_href: Option<String>,
}

fn choices<'a>(
    values: impl IntoIterator<Item = (&'a str, String)>,
    selected: &[String],
) -> Vec<FilterChoice> {
    values
        .into_iter()
        .map(|(value, label)| FilterChoice {
            selected: selected.iter().any(|s| s == value),
            value: value.to_string(),
            label,
        })
        .collect()
}

/// Link to another page of the same listing, keeping every filter.
fn page_href(query: &ListQuery, page: u32) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(search) = &query.search {
        serializer.append_pair("search", search);
    }
    for status in &query.status {
        serializer.append_pair("status", status);
    }
    for priority in &query.priority {
        serializer.append_pair("priority", priority);
    }
    for assignee in &query.assignee {
        serializer.append_pair("assignee", assignee);
    }
    serializer
        .append_pair("sort_by", &query.sort_by)
        .append_pair("sort_order", &query.sort_order)
        .append_pair("page", &page.to_string())
        .append_pair("page_size", &query.page_size.to_string());
    format!("/issues?{}", serializer.finish())
}

/// Unparseable parameters fall back to the default listing rather than
/// failing the navigation.
pub fn parse_query(raw: Option<&str>) -> ListQuery {
    let query = match raw {
        Some(raw) => serde_html_form::from_str::<ListQuery>(raw).unwrap_or_else(|e| {
            log::debug!("ignoring list query {:?}: {}", raw, e);
            ListQuery::default()
        }),
        None => ListQuery::default(),
    };
    query.clamped()
}

pub async fn render_issue_list(
    state: &AppState,
    raw_query: Option<&str>,
) -> Result<IssueListPage, AppError> {
    let query = parse_query(raw_query);
    let list = list_issues(&state.pool, &query).await?;

    let status_choices = choices(
        IssueStatus::ALL.iter().map(|s| (s.as_str(), s.to_string())),
        &query.status,
    );
    let priority_choices = choices(
        IssuePriority::ALL.iter().map(|p| (p.as_str(), p.to_string())),
        &query.priority,
    );
    let assignee_choices = choices(
        list.filters
            .available_assignees
            .iter()
            .map(|a| (a.as_str(), a.clone())),
        &query.assignee,
    );
    let sort_choices = choices(
        SORT_CHOICES
            .iter()
            .map(|(value, label)| (*value, label.to_string())),
        &[query.sort_column().to_string()],
    );

    let pagination = list.pagination;
    let prev_href = pagination
        .has_prev
        .then(|| page_href(&query, pagination.current_page - 1));
    let next_href = pagination
        .has_next
        .then(|| page_href(&query, pagination.current_page + 1));

    Ok(IssueListPage {
        issues: list.issues.into_iter().map(IssueRow::from).collect(),
        search: query.search.clone().unwrap_or_default(),
        status_choices,
        priority_choices,
        assignee_choices,
        sort_choices,
        descending: query.descending(),
        pagination,
        prev_href,
        next_href,
    })
}

#[axum::debug_handler]
pub async fn view_issue_list(
    Extension(state): Extension<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<IssueListPage, AppError> {
    render_issue_list(&state, query.as_deref()).await
}
