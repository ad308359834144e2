//! Client-side navigation.
//!
//! The `Router` holds the shell's current location and a back stack.
//! Navigating never reloads anything, so other in-memory state survives.
//! Location changes are published on a `watch` channel for the shell to render.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::debug;

use crate::api::request::route_of;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const HOME_PATH: &str = "/";

/// Query parameter carrying the post-login destination
const REDIRECT_PARAM: &str = "redirect";

/// Maximum number of history entries kept for `back()`
const MAX_HISTORY: usize = 50;

#[derive(Clone)]
pub struct Router {
    location: watch::Sender<String>,
    history: Arc<Mutex<VecDeque<String>>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(HOME_PATH)
    }
}

impl Router {
    pub fn new(initial: &str) -> Self {
        let (location, _) = watch::channel(initial.to_string());
        Self {
            location,
            history: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Current location, including any query string.
    pub fn current_path(&self) -> String {
        self.location.borrow().clone()
    }

    /// Move to `path`, remembering the previous location.
    pub fn navigate(&self, path: &str) {
        let previous = self.location.send_replace(path.to_string());
        if previous != path {
            if let Ok(mut history) = self.history.lock() {
                history.push_back(previous);
                if history.len() > MAX_HISTORY {
                    history.pop_front();
                }
            }
        }
        debug!(path = path, "Navigated");
    }

    /// Return to the previous location, if any.
    pub fn back(&self) -> Option<String> {
        let previous = self.history.lock().ok()?.pop_back()?;
        self.location.send_replace(previous.clone());
        Some(previous)
    }

    pub fn watch(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }

    /// Login location for an expired session observed at `current`.
    pub fn login_redirect_from_here(&self) -> String {
        login_redirect(&self.current_path())
    }
}

/// Login location to send a user to from `current`.
///
/// No redirect parameter is attached when already on the login route.
pub fn login_redirect(current: &str) -> String {
    if route_of(current) == LOGIN_PATH {
        LOGIN_PATH.to_string()
    } else {
        format!(
            "{}?{}={}",
            LOGIN_PATH,
            REDIRECT_PARAM,
            urlencoding::encode(current)
        )
    }
}

/// Destination after a successful login at `location`.
///
/// Only relative paths are honoured; anything else falls back to home.
pub fn redirect_target(location: &str) -> String {
    let query = match location.split_once('?') {
        Some((_, query)) => query,
        None => return HOME_PATH.to_string(),
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|target| target.into_owned())
        .filter(|target| target.starts_with('/') && !target.starts_with("//"))
        .unwrap_or_else(|| HOME_PATH.to_string())
}

/// Whether a route needs a logged-in user.
pub fn requires_session(path: &str) -> bool {
    !matches!(route_of(path), LOGIN_PATH | REGISTER_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_current_path() {
        assert_eq!(login_redirect("/users"), "/login?redirect=%2Fusers");
        assert_eq!(
            login_redirect("/quizzes/paged?page=2"),
            "/login?redirect=%2Fquizzes%2Fpaged%3Fpage%3D2"
        );
    }

    #[test]
    fn test_login_redirect_on_login_has_no_parameter() {
        assert_eq!(login_redirect("/login"), "/login");
        assert_eq!(login_redirect("/login?redirect=%2Fusers"), "/login");
    }

    #[test]
    fn test_redirect_target() {
        assert_eq!(redirect_target("/login?redirect=%2Fusers%2F4"), "/users/4");
        assert_eq!(redirect_target("/login"), "/");
        assert_eq!(redirect_target("/login?foo=bar"), "/");
        assert_eq!(redirect_target("/login?redirect=https%3A%2F%2Fevil.test"), "/");
        assert_eq!(redirect_target("/login?redirect=%2F%2Fevil.test"), "/");
        assert_eq!(
            redirect_target(&login_redirect("/quizzes?page=3")),
            "/quizzes?page=3"
        );
    }

    #[test]
    fn test_requires_session() {
        assert!(!requires_session("/login"));
        assert!(!requires_session("/login?redirect=%2F"));
        assert!(!requires_session("/register"));
        assert!(requires_session("/"));
        assert!(requires_session("/analytics"));
    }

    #[test]
    fn test_navigate_and_back() {
        let router = Router::default();
        assert_eq!(router.current_path(), "/");

        router.navigate("/quizzes");
        router.navigate("/quizzes/3");
        assert_eq!(router.current_path(), "/quizzes/3");

        assert_eq!(router.back(), Some("/quizzes".to_string()));
        assert_eq!(router.back(), Some("/".to_string()));
        assert_eq!(router.back(), None);
        assert_eq!(router.current_path(), "/");
    }

    #[test]
    fn test_navigate_same_path_does_not_grow_history() {
        let router = Router::new("/users");
        router.navigate("/users");
        assert_eq!(router.back(), None);
    }

    #[test]
    fn test_history_drops_oldest_entries() {
        let router = Router::new("/page/0");
        for i in 1..=MAX_HISTORY + 10 {
            router.navigate(&format!("/page/{}", i));
        }

        let mut visited = Vec::new();
        while let Some(path) = router.back() {
            visited.push(path);
        }
        assert_eq!(visited.len(), MAX_HISTORY);
        assert_eq!(visited.first().map(String::as_str), Some("/page/59"));
        assert_eq!(visited.last().map(String::as_str), Some("/page/10"));
    }

    #[tokio::test]
    async fn test_watch_sees_navigation() {
        let router = Router::default();
        let mut rx = router.watch();
        let clone = router.clone();
        clone.navigate("/roles");
        rx.changed().await.expect("router alive");
        assert_eq!(*rx.borrow(), "/roles");
        assert_eq!(router.login_redirect_from_here(), "/login?redirect=%2Froles");
    }
}
