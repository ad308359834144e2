//! Console command parsing.
//!
//! Each command maps to the client-side route it would show, so the router
//! and its login guard behave as they would for page navigation.

use anyhow::{anyhow, bail, Result};

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the console will ask for
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Quizzes,
    Questions,
    Users,
    Roles,
}

impl ResourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiz" | "quizzes" => Some(ResourceKind::Quizzes),
            "question" | "questions" => Some(ResourceKind::Questions),
            "user" | "users" => Some(ResourceKind::Users),
            "role" | "roles" => Some(ResourceKind::Roles),
            _ => None,
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            ResourceKind::Quizzes => "/quizzes",
            ResourceKind::Questions => "/questions",
            ResourceKind::Users => "/users",
            ResourceKind::Roles => "/roles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { email: Option<String> },
    Register { email: String, first_name: String, last_name: String },
    Logout,
    Whoami,
    Go(String),
    Back,
    List { resource: ResourceKind, page: u32, size: u32 },
    Show { resource: ResourceKind, ids: Vec<i64> },
    Delete { resource: ResourceKind, id: i64 },
    Profile { first_name: String, last_name: String },
    Dashboard,
    Status,
    Quit,
}

impl Command {
    /// Client-side route this command displays, if it displays one.
    pub fn route(&self) -> Option<String> {
        match self {
            Command::Login { .. } => Some("/login".to_string()),
            Command::Register { .. } => Some("/register".to_string()),
            Command::List { resource, page, .. } => {
                if *page == 0 {
                    Some(resource.route().to_string())
                } else {
                    Some(format!("{}?page={}", resource.route(), page))
                }
            }
            Command::Show { resource, ids } if ids.len() == 1 => {
                Some(format!("{}/{}", resource.route(), ids[0]))
            }
            Command::Show { resource, .. } => Some(resource.route().to_string()),
            Command::Profile { .. } => Some("/profile".to_string()),
            Command::Dashboard => Some("/analytics".to_string()),
            _ => None,
        }
    }

    /// Whether the command talks to protected endpoints.
    pub fn needs_session(&self) -> bool {
        matches!(
            self,
            Command::List { .. }
                | Command::Show { .. }
                | Command::Delete { .. }
                | Command::Profile { .. }
                | Command::Dashboard
        )
    }
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "login" => Command::Login {
            email: args.first().map(|s| s.to_string()),
        },
        "register" => match args.as_slice() {
            [email, first, last] => Command::Register {
                email: email.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
            },
            _ => bail!("usage: register <email> <first-name> <last-name>"),
        },
        "logout" => Command::Logout,
        "whoami" | "me" => Command::Whoami,
        "go" => match args.first() {
            Some(path) if path.starts_with('/') => Command::Go(path.to_string()),
            _ => bail!("usage: go </path>"),
        },
        "back" => Command::Back,
        "dashboard" | "analytics" => Command::Dashboard,
        "status" => Command::Status,
        "quit" | "exit" | "q" => Command::Quit,
        "show" => {
            let (resource, rest) = resource_arg(&args, "show <resource> <id>...")?;
            if rest.is_empty() {
                bail!("usage: show <resource> <id>...");
            }
            let ids = rest.iter().map(|s| parse_id(s)).collect::<Result<Vec<_>>>()?;
            Command::Show { resource, ids }
        }
        "delete" | "rm" => {
            let (resource, rest) = resource_arg(&args, "delete <resource> <id>")?;
            match rest {
                [id] => Command::Delete {
                    resource,
                    id: parse_id(id)?,
                },
                _ => bail!("usage: delete <resource> <id>"),
            }
        }
        "profile" => match args.as_slice() {
            [first, last] => Command::Profile {
                first_name: first.to_string(),
                last_name: last.to_string(),
            },
            _ => bail!("usage: profile <first-name> <last-name>"),
        },
        other => match ResourceKind::parse(other) {
            Some(resource) => {
                let page = parse_number(args.first(), 1, "page")?.saturating_sub(1);
                let size = parse_number(args.get(1), DEFAULT_PAGE_SIZE, "size")?;
                if size == 0 || size > MAX_PAGE_SIZE {
                    bail!("size must be between 1 and {}", MAX_PAGE_SIZE);
                }
                Command::List {
                    resource,
                    page,
                    size,
                }
            }
            None => bail!("unknown command '{}', try 'help'", other),
        },
    };

    Ok(Some(command))
}

fn resource_arg<'a>(args: &'a [&'a str], usage: &str) -> Result<(ResourceKind, &'a [&'a str])> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("usage: {}", usage))?;
    let resource =
        ResourceKind::parse(first).ok_or_else(|| anyhow!("unknown resource '{}'", first))?;
    Ok((resource, rest))
}

fn parse_id(s: &str) -> Result<i64> {
    s.parse()
        .map_err(|_| anyhow!("'{}' is not a valid id", s))
}

fn parse_number(arg: Option<&&str>, default: u32, name: &str) -> Result<u32> {
    match arg {
        Some(s) => s
            .parse()
            .map_err(|_| anyhow!("{} must be a positive number", name)),
        None => Ok(default),
    }
}

pub const HELP: &str = "\
Commands:
  login [email]                     sign in (prompts for password)
  register <email> <first> <last>   create an account
  logout                            end the session
  whoami                            show the signed-in user
  quizzes|questions|users|roles [page] [size]
                                    list a page (pages start at 1)
  show <resource> <id>...           show one or more items
  delete <resource> <id>            delete an item
  profile <first> <last>            update your own name
  dashboard                         analytics overview
  go </path> | back                 navigate
  status                            session and cache status
  quit                              leave the console";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse("   ").expect("blank ok"), None);
    }

    #[test]
    fn test_parse_listing_defaults() {
        assert_eq!(
            parse("users").expect("parse"),
            Some(Command::List {
                resource: ResourceKind::Users,
                page: 0,
                size: DEFAULT_PAGE_SIZE
            })
        );
        assert_eq!(
            parse("Quizzes 3 25").expect("parse"),
            Some(Command::List {
                resource: ResourceKind::Quizzes,
                page: 2,
                size: 25
            })
        );
    }

    #[test]
    fn test_parse_listing_rejects_bad_size() {
        assert!(parse("roles 1 0").is_err());
        assert!(parse("roles 1 1000").is_err());
        assert!(parse("roles x").is_err());
    }

    #[test]
    fn test_parse_show_and_delete() {
        assert_eq!(
            parse("show question 4 5").expect("parse"),
            Some(Command::Show {
                resource: ResourceKind::Questions,
                ids: vec![4, 5]
            })
        );
        assert_eq!(
            parse("delete user 9").expect("parse"),
            Some(Command::Delete {
                resource: ResourceKind::Users,
                id: 9
            })
        );
        assert!(parse("show").is_err());
        assert!(parse("show user").is_err());
        assert!(parse("show planet 1").is_err());
        assert!(parse("delete user nine").is_err());
    }

    #[test]
    fn test_parse_auth_commands() {
        assert_eq!(
            parse("login ada@example.com").expect("parse"),
            Some(Command::Login {
                email: Some("ada@example.com".to_string())
            })
        );
        assert_eq!(parse("login").expect("parse"), Some(Command::Login { email: None }));
        assert!(parse("register ada@example.com Ada").is_err());
        assert_eq!(parse("exit").expect("parse"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_go_requires_absolute_path() {
        assert_eq!(
            parse("go /roles").expect("parse"),
            Some(Command::Go("/roles".to_string()))
        );
        assert!(parse("go roles").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse("frobnicate").expect_err("unknown");
        assert!(err.to_string().contains("unknown command"));
    }

    #[test]
    fn test_routes() {
        let list = Command::List {
            resource: ResourceKind::Quizzes,
            page: 0,
            size: 10,
        };
        assert_eq!(list.route().as_deref(), Some("/quizzes"));
        let list = Command::List {
            resource: ResourceKind::Quizzes,
            page: 2,
            size: 10,
        };
        assert_eq!(list.route().as_deref(), Some("/quizzes?page=2"));
        let show = Command::Show {
            resource: ResourceKind::Users,
            ids: vec![3],
        };
        assert_eq!(show.route().as_deref(), Some("/users/3"));
        assert_eq!(Command::Dashboard.route().as_deref(), Some("/analytics"));
        assert_eq!(Command::Whoami.route(), None);
    }

    #[test]
    fn test_needs_session() {
        assert!(Command::Dashboard.needs_session());
        assert!(!Command::Whoami.needs_session());
        assert!(!Command::Login { email: None }.needs_session());
    }
}
