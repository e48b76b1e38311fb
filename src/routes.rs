//! Navigation route table.
//!
//! Entries are evaluated in declared order and the first match wins. The
//! wildcard entry is last and only redirects, so every navigation path
//! resolves to something.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    IssueList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Render(View),
    /// Redirect to another table path (without the leading `/`).
    Redirect(&'static str),
}

#[derive(Debug)]
pub struct Route {
    pub path: &'static str,
    pub target: RouteTarget,
}

pub const WILDCARD: &str = "**";

pub static APP_ROUTES: [Route; 3] = [
    Route {
        path: "",
        target: RouteTarget::Render(View::IssueList),
    },
    Route {
        path: "issues",
        target: RouteTarget::Render(View::IssueList),
    },
    Route {
        path: WILDCARD,
        target: RouteTarget::Redirect(""),
    },
];

impl Route {
    pub fn is_wildcard(&self) -> bool {
        self.path == WILDCARD
    }

    fn matches(&self, path: &str) -> bool {
        self.is_wildcard() || self.path == path
    }

    /// Path as the HTTP router sees it.
    pub fn mount_path(&self) -> String {
        format!("/{}", self.path)
    }
}

/// `/issues/` and `issues` are the same navigation path.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

pub fn redirect_location(path: &str) -> String {
    format!("/{}", path)
}

pub fn resolve(path: &str) -> RouteTarget {
    let path = normalize(path);
    APP_ROUTES
        .iter()
        .find(|route| route.matches(path))
        .map(|route| route.target)
        .unwrap_or(RouteTarget::Redirect(""))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn table_has_three_unique_entries() {
        assert_eq!(APP_ROUTES.len(), 3);
        let paths: HashSet<&str> = APP_ROUTES.iter().map(|route| route.path).collect();
        assert_eq!(paths.len(), APP_ROUTES.len());
    }

    #[test]
    fn wildcard_is_last_and_only_redirects() {
        let (last, rest) = APP_ROUTES.split_last().unwrap();
        assert!(last.is_wildcard());
        assert_eq!(last.target, RouteTarget::Redirect(""));
        assert!(rest.iter().all(|route| !route.is_wildcard()));
    }

    #[test]
    fn declared_paths_render_the_list() {
        for path in ["", "/", "issues", "/issues", "/issues/"] {
            assert_eq!(resolve(path), RouteTarget::Render(View::IssueList), "{}", path);
        }
    }

    #[test]
    fn everything_else_redirects_home() {
        for path in [
            "/foo",
            "/issues/iss-1234abcd",
            "/issuesx",
            "/ISSUES",
            "/a/b/c",
            "/**",
        ] {
            assert_eq!(resolve(path), RouteTarget::Redirect(""), "{}", path);
        }
    }

    #[test]
    fn mount_paths_are_absolute() {
        assert_eq!(APP_ROUTES[0].mount_path(), "/");
        assert_eq!(APP_ROUTES[1].mount_path(), "/issues");
        assert_eq!(redirect_location(""), "/");
    }
}
