use askama_axum::IntoResponse;
use axum::{
    response::Response,
    routing::{get, MethodRouter},
};

use crate::{routes::View, AppError, AppState};

pub mod issue_list;

pub fn view_route(view: View) -> MethodRouter {
    match view {
        View::IssueList => get(issue_list::view_issue_list),
    }
}

pub async fn render(view: View, state: &AppState, query: Option<&str>) -> Result<Response, AppError> {
    match view {
        View::IssueList => Ok(issue_list::render_issue_list(state, query)
            .await?
            .into_response()),
    }
}
