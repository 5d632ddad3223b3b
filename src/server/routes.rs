// src/server/routes.rs
use crate::aggregator::CheckMatcher;

pub const ABOUT_ROUTE: &str = "/about";
pub const HEALTH_ROUTE: &str = "/health";
pub const VERIFY_ALL_CHECKS_ROUTE: &str = "/verify/checks";
pub const VERIFY_CHECK_ID_ROUTE: &str = "/verify/checks/id/:check";
pub const VERIFY_CHECK_NAME_ROUTE: &str = "/verify/checks/name/:check";
pub const VERIFY_SERVICE_ID_ROUTE: &str = "/verify/service/id/:service";
pub const VERIFY_SERVICE_NAME_ROUTE: &str = "/verify/service/name/:service";

const VERBOSE_QUERY_KEY: &str = "verbose";
const PRETTY_QUERY_KEY: &str = "pretty";
const STATUS_QUERY_KEY: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    About,
    Health,
    Verify(CheckMatcher),
}

impl Route {
    /// Match a request path. A single trailing slash is ignored and path
    /// parameters are percent-decoded.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.strip_suffix('/').unwrap_or(path);
        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();

        let route = match segments.as_slice() {
            ["about"] => Route::About,
            ["health"] => Route::Health,
            ["verify", "checks"] => Route::Verify(CheckMatcher::All),
            ["verify", "checks", "id", check] => Route::Verify(CheckMatcher::CheckId(decode(check)?)),
            ["verify", "checks", "name", check] => {
                Route::Verify(CheckMatcher::CheckName(decode(check)?))
            }
            ["verify", "service", "id", service] => {
                Route::Verify(CheckMatcher::ServiceId(decode(service)?))
            }
            ["verify", "service", "name", service] => {
                Route::Verify(CheckMatcher::ServiceName(decode(service)?))
            }
            _ => return None,
        };

        Some(route)
    }

    /// Path with parameters replaced by placeholders, for metric labels.
    pub fn template(&self) -> &'static str {
        match self {
            Route::About => ABOUT_ROUTE,
            Route::Health => HEALTH_ROUTE,
            Route::Verify(CheckMatcher::All) => VERIFY_ALL_CHECKS_ROUTE,
            Route::Verify(CheckMatcher::CheckId(_)) => VERIFY_CHECK_ID_ROUTE,
            Route::Verify(CheckMatcher::CheckName(_)) => VERIFY_CHECK_NAME_ROUTE,
            Route::Verify(CheckMatcher::ServiceId(_)) => VERIFY_SERVICE_ID_ROUTE,
            Route::Verify(CheckMatcher::ServiceName(_)) => VERIFY_SERVICE_NAME_ROUTE,
        }
    }
}

fn decode(segment: &str) -> Option<String> {
    if segment.is_empty() {
        return None;
    }
    urlencoding::decode(segment)
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Flags read from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub verbose: bool,
    pub pretty: bool,
    pub status: Option<String>,
}

impl QueryOptions {
    pub fn parse(query: Option<&str>) -> Self {
        let mut options = QueryOptions::default();
        let Some(query) = query else {
            return options;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                VERBOSE_QUERY_KEY => options.verbose = true,
                PRETTY_QUERY_KEY => options.pretty = true,
                STATUS_QUERY_KEY if options.status.is_none() => {
                    options.status = Some(value.into_owned())
                }
                _ => {}
            }
        }

        options
    }
}
