use serde::{Deserialize, Serialize};

use super::issue::{Issue, ValidationError};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MIN_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

const SORTABLE_COLUMNS: [&str; 9] = [
    "title",
    "status",
    "priority",
    "assignee",
    "reporter",
    "due_date",
    "estimated_hours",
    "created_at",
    "updated_at",
];

const TIMESTAMP_COLUMNS: [&str; 3] = ["due_date", "created_at", "updated_at"];

/// Query parameters shared by the list view and `GET /api/issues`.
/// `status`, `priority` and `assignee` may be repeated.
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub assignee: Vec<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_sort_by() -> String {
    "updated_at".to_string()
}

fn default_sort_order() -> String {
    "desc".to_string()
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            search: None,
            status: Vec::new(),
            priority: Vec::new(),
            assignee: Vec::new(),
            sort_by: default_sort_by(),
            sort_order: default_sort_order(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl ListQuery {
    /// Strict form used by the API.
    pub fn validate(self) -> Result<ListQuery, ValidationError> {
        if self.page < 1 {
            return Err(ValidationError {
                field: "page",
                message: "must be greater than or equal to 1".to_string(),
            });
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ValidationError {
                field: "page_size",
                message: format!("must be between {} and {}", MIN_PAGE_SIZE, MAX_PAGE_SIZE),
            });
        }
        Ok(self.without_blanks())
    }

    /// Lenient form used by the HTML view: out of range paging is pulled back
    /// into range instead of rejected.
    pub fn clamped(mut self) -> ListQuery {
        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self.without_blanks()
    }

    // Empty form fields mean "no filter".
    fn without_blanks(mut self) -> ListQuery {
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        for values in [&mut self.status, &mut self.priority, &mut self.assignee] {
            values.retain(|v| !v.trim().is_empty());
        }
        self
    }

    /// Unknown sort keys fall back to `updated_at`.
    pub fn sort_column(&self) -> &'static str {
        SORTABLE_COLUMNS
            .iter()
            .find(|column| **column == self.sort_by)
            .copied()
            .unwrap_or("updated_at")
    }

    /// Timestamps are stored as RFC 3339 text with varying fraction widths
    /// and offsets, so they are ordered by instant rather than by text.
    pub fn sort_expression(&self) -> String {
        let column = self.sort_column();
        if TIMESTAMP_COLUMNS.contains(&column) {
            format!("julianday({})", column)
        } else {
            column.to_string()
        }
    }

    pub fn descending(&self) -> bool {
        self.sort_order.eq_ignore_ascii_case("desc")
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32, total_items: i64) -> Pagination {
        let size = i64::from(page_size.max(1));
        let total_pages = if total_items > 0 {
            (total_items + size - 1) / size
        } else {
            1
        };
        Pagination {
            current_page: page,
            page_size,
            total_items,
            total_pages,
            has_next: i64::from(page) < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub available_statuses: Vec<String>,
    pub available_priorities: Vec<String>,
    pub available_assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueList {
    pub issues: Vec<Issue>,
    pub pagination: Pagination,
    pub filters: FilterOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 1);
        assert!(!p.has_next);
    }

    #[test]
    fn last_page_has_prev_only() {
        let p = Pagination::new(3, 10, 30);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn unknown_sort_column_falls_back() {
        let query = ListQuery {
            sort_by: "id; DROP TABLE Issues".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(query.sort_column(), "updated_at");
        let query = ListQuery {
            sort_by: "priority".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(query.sort_column(), "priority");
    }

    #[test]
    fn timestamps_sort_by_instant() {
        let query = ListQuery::default();
        assert_eq!(query.sort_expression(), "julianday(updated_at)");
        let query = ListQuery {
            sort_by: "title".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(query.sort_expression(), "title");
    }

    #[test]
    fn sort_order_is_case_insensitive() {
        let query = ListQuery {
            sort_order: "DESC".to_string(),
            ..ListQuery::default()
        };
        assert!(query.descending());
        let query = ListQuery {
            sort_order: "sideways".to_string(),
            ..ListQuery::default()
        };
        assert!(!query.descending());
    }

    #[test]
    fn page_size_out_of_range_is_rejected() {
        let query = ListQuery {
            page_size: 5,
            ..ListQuery::default()
        };
        assert_eq!(query.validate().unwrap_err().field, "page_size");
        let query = ListQuery {
            page: 0,
            ..ListQuery::default()
        };
        assert_eq!(query.validate().unwrap_err().field, "page");
    }

    #[test]
    fn clamped_pulls_paging_into_range() {
        let query = ListQuery {
            page: 0,
            page_size: 500,
            search: Some("   ".to_string()),
            status: vec!["".to_string(), "open".to_string()],
            ..ListQuery::default()
        }
        .clamped();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
        assert_eq!(query.search, None);
        assert_eq!(query.status, vec!["open"]);
    }
}
