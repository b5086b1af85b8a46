//! Request router
//!
//! Maps a method and path onto one of the service's endpoints.

use hyper::Method;

/// Resolved endpoint for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// GET /
    Health,
    /// GET /songs
    ListSongs,
    /// POST /upload
    Upload,
    /// OPTIONS on any path
    Preflight,
    /// Known path, wrong method
    MethodNotAllowed { allow: &'static str },
    NotFound,
}

impl Route {
    /// Resolve a request to a route
    ///
    /// A single trailing slash is ignored, so `/songs/` resolves like `/songs`.
    pub fn resolve(method: &Method, path: &str) -> Self {
        if method == Method::OPTIONS {
            return Route::Preflight;
        }

        let path = match path {
            "/" => "/",
            p => p.strip_suffix('/').unwrap_or(p),
        };

        match (path, method) {
            ("/", &Method::GET) | ("/", &Method::HEAD) => Route::Health,
            ("/", _) => Route::MethodNotAllowed { allow: "GET, HEAD, OPTIONS" },
            ("/songs", &Method::GET) => Route::ListSongs,
            ("/songs", _) => Route::MethodNotAllowed { allow: "GET, OPTIONS" },
            ("/upload", &Method::POST) => Route::Upload,
            ("/upload", _) => Route::MethodNotAllowed { allow: "POST, OPTIONS" },
            _ => Route::NotFound,
        }
    }

    /// Label used for metrics and logs
    pub fn name(&self) -> &'static str {
        match self {
            Route::Health => "health",
            Route::ListSongs => "list_songs",
            Route::Upload => "upload",
            Route::Preflight => "preflight",
            Route::MethodNotAllowed { .. } => "method_not_allowed",
            Route::NotFound => "not_found",
        }
    }
}
