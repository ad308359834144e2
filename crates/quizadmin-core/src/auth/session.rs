use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Role name granting access to the admin console
pub const ADMIN_ROLE: &str = "ADMIN";

/// The logged-in user as reported by the probe endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl CurrentUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Role names arrive as either `ADMIN` or `ROLE_ADMIN`.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| {
            let role = role.strip_prefix("ROLE_").unwrap_or(role);
            role.eq_ignore_ascii_case(name)
        })
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// Client-side view of the session: present iff the last probe found a user.
///
/// The session cookie itself is never visible here; only the derived user is.
#[derive(Clone)]
pub struct SessionStore {
    current: watch::Sender<Option<CurrentUser>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.current.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn set(&self, user: Option<CurrentUser>) {
        self.current.send_replace(user);
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn watch(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.current.subscribe()
    }
}
