use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::{Query, QueryRejection};
use serde_json::{json, Value};

use super::ApiError;
use crate::{
    models::{
        issue::{Issue, IssueChanges, NewIssue},
        listing::{IssueList, ListQuery},
    },
    services::issues as service,
    AppState,
};

/// `status`, `priority` and `assignee` may be repeated, e.g.
/// `?status=open&status=in-progress`.
pub async fn list_issues(
    Extension(state): Extension<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<IssueList>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidQuery(e.to_string()))?;
    let query = query.validate()?;
    Ok(Json(service::list_issues(&state.pool, &query).await?))
}

pub async fn get_issue(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Issue>, ApiError> {
    match service::get_issue(&state.pool, &id).await? {
        Some(issue) => Ok(Json(issue)),
        None => Err(ApiError::IssueNotFound(id)),
    }
}

pub async fn create_issue(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<NewIssue>, JsonRejection>,
) -> Result<(StatusCode, Json<Issue>), ApiError> {
    let Json(new) = payload?;
    let issue = service::create_issue(&state.pool, new.validate()?).await?;
    Ok((StatusCode::CREATED, Json(issue)))
}

pub async fn bulk_create_issues(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<Vec<NewIssue>>, JsonRejection>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let Json(batch) = payload?;
    let batch = batch
        .into_iter()
        .map(NewIssue::validate)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(service::bulk_create_issues(&state.pool, batch).await?))
}

pub async fn update_issue(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<IssueChanges>, JsonRejection>,
) -> Result<Json<Issue>, ApiError> {
    let Json(changes) = payload?;
    match service::update_issue(&state.pool, &id, changes.validate()?).await? {
        Some(issue) => Ok(Json(issue)),
        None => Err(ApiError::IssueNotFound(id)),
    }
}

pub async fn delete_issue(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !service::delete_issue(&state.pool, &id).await? {
        return Err(ApiError::IssueNotFound(id));
    }
    Ok(Json(json!({ "message": "Issue deleted successfully" })))
}
