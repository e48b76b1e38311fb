use sqlx::{types::Json, Executor, QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;

use crate::models::{
    issue::{Issue, IssueChanges, NewIssue},
    listing::{FilterOptions, IssueList, ListQuery, Pagination},
};

pub async fn list_issues(pool: &SqlitePool, query: &ListQuery) -> Result<IssueList, sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM Issues");
    push_filters(&mut count, query);
    let total_items: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let direction = if query.descending() { "DESC" } else { "ASC" };
    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM Issues");
    push_filters(&mut select, query);
    select.push(format!(
        " ORDER BY {column} {direction}, rowid {direction} LIMIT ",
        column = query.sort_expression(),
        direction = direction
    ));
    select.push_bind(i64::from(query.page_size));
    select.push(" OFFSET ");
    select.push_bind(query.offset());
    let issues = select.build_query_as::<Issue>().fetch_all(pool).await?;

    Ok(IssueList {
        issues,
        pagination: Pagination::new(query.page, query.page_size, total_items),
        filters: get_filter_options(pool).await?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = &query.search {
        let pattern = like_pattern(search);
        builder.push(r" AND (title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(r" ESCAPE '\' OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(r" ESCAPE '\')");
    }
    push_any_of(builder, "status", &query.status);
    push_any_of(builder, "priority", &query.priority);
    push_any_of(builder, "assignee", &query.assignee);
}

fn push_any_of(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    builder.push(format!(" AND {} IN (", column));
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

/// SQLite's LIKE is already case-insensitive for ASCII; only the wildcards
/// need escaping so they match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_");
    format!("%{}%", escaped)
}

/// Distinct values across every issue, regardless of the active filters.
pub async fn get_filter_options(pool: &SqlitePool) -> Result<FilterOptions, sqlx::Error> {
    let available_statuses =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT status FROM Issues ORDER BY status")
            .fetch_all(pool)
            .await?;
    let available_priorities =
        sqlx::query_scalar::<_, String>("SELECT DISTINCT priority FROM Issues ORDER BY priority")
            .fetch_all(pool)
            .await?;
    let available_assignees = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT assignee FROM Issues
        WHERE assignee IS NOT NULL AND assignee != ''
        ORDER BY assignee
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(FilterOptions {
        available_statuses,
        available_priorities,
        available_assignees,
    })
}

pub async fn get_issue(pool: &SqlitePool, id: &str) -> Result<Option<Issue>, sqlx::Error> {
    sqlx::query_as::<_, Issue>("SELECT * FROM Issues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn insert_issue<'e, E>(executor: E, issue: &Issue) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO Issues (
            id, title, description, status, priority, assignee, reporter,
            labels, due_date, estimated_hours, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&issue.id)
    .bind(&issue.title)
    .bind(&issue.description)
    .bind(issue.status)
    .bind(issue.priority)
    .bind(&issue.assignee)
    .bind(&issue.reporter)
    .bind(&issue.labels)
    .bind(issue.due_date)
    .bind(issue.estimated_hours)
    .bind(issue.created_at)
    .bind(issue.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Expects a payload that already passed `NewIssue::validate`.
pub async fn create_issue(pool: &SqlitePool, new: NewIssue) -> Result<Issue, sqlx::Error> {
    let issue = Issue::from_new(new, OffsetDateTime::now_utc());
    insert_issue(pool, &issue).await?;
    log::info!("created issue {}", issue.id);
    Ok(issue)
}

/// All issues are inserted in one transaction; a failure leaves nothing behind.
pub async fn bulk_create_issues(
    pool: &SqlitePool,
    batch: Vec<NewIssue>,
) -> Result<Vec<Issue>, sqlx::Error> {
    let now = OffsetDateTime::now_utc();
    let issues: Vec<Issue> = batch
        .into_iter()
        .map(|new| Issue::from_new(new, now))
        .collect();

    let mut tx = pool.begin().await?;
    for issue in issues.iter() {
        insert_issue(&mut *tx, issue).await?;
    }
    tx.commit().await?;

    log::info!("bulk created {} issues", issues.len());
    Ok(issues)
}

/// One statement does the merge, so concurrent updates never hold a read
/// snapshot that has to be upgraded to a write.
pub async fn update_issue(
    pool: &SqlitePool,
    id: &str,
    changes: IssueChanges,
) -> Result<Option<Issue>, sqlx::Error> {
    let IssueChanges {
        title,
        description,
        status,
        priority,
        assignee,
        reporter,
        labels,
        due_date,
        estimated_hours,
    } = changes;

    sqlx::query_as::<_, Issue>(
        r#"
        UPDATE Issues
        SET title = COALESCE(?, title),
            description = CASE WHEN ? THEN ? ELSE description END,
            status = COALESCE(?, status),
            priority = COALESCE(?, priority),
            assignee = CASE WHEN ? THEN ? ELSE assignee END,
            reporter = CASE WHEN ? THEN ? ELSE reporter END,
            labels = CASE WHEN ? THEN ? ELSE labels END,
            due_date = CASE WHEN ? THEN ? ELSE due_date END,
            estimated_hours = CASE WHEN ? THEN ? ELSE estimated_hours END,
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(title)
    .bind(description.is_some())
    .bind(description.flatten())
    .bind(status)
    .bind(priority)
    .bind(assignee.is_some())
    .bind(assignee.flatten())
    .bind(reporter.is_some())
    .bind(reporter.flatten())
    .bind(labels.is_some())
    .bind(Json(labels.flatten().unwrap_or_default()))
    .bind(due_date.is_some())
    .bind(due_date.flatten())
    .bind(estimated_hours.is_some())
    .bind(estimated_hours.flatten())
    .bind(OffsetDateTime::now_utc())
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_issue(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM Issues WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
