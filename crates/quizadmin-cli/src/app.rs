//! Application shell state for the admin console.
//!
//! `App` wires the request pipeline together, mounts the session-expiry
//! listener for its lifetime, and executes parsed console commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::AsyncBufRead;
use tracing::{debug, info, warn};

use quizadmin_core::api::request::route_of;
use quizadmin_core::api::Resource;
use quizadmin_core::auth::{CredentialStore, RegisterRequest};
use quizadmin_core::models::{ProfileUpdate, Question, Quiz, Role, User};
use quizadmin_core::navigation::{self, LOGIN_PATH};
use quizadmin_core::{
    AdminApi, ApiError, AuthService, AuthenticatedClient, Config, ExpiryListener, QueryCache,
    Router, SessionExpiryNotifier, SessionStore,
};

use crate::commands::{Command, ResourceKind, HELP};
use crate::input::Input;
use crate::render;

/// Whether the console should keep reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub config: Config,
    pub router: Router,
    pub session: SessionStore,
    pub cache: QueryCache,
    pub auth: AuthService,
    pub admin: AdminApi,
    listener: Option<ExpiryListener>,
    /// Where the last login email is remembered; `None` keeps it in memory
    config_path: Option<PathBuf>,
}

impl App {
    /// Build the pipeline and mount the expiry listener. Must run inside the runtime.
    pub fn new(config: Config) -> Result<Self> {
        let router = Router::default();
        let session = SessionStore::new();
        let cache = QueryCache::new(config.cache_stale_minutes);
        let notifier = SessionExpiryNotifier::new();

        let client = AuthenticatedClient::from_config(&config, notifier.clone(), router.clone())
            .context("Failed to build HTTP client")?
            .with_session(session.clone());
        let auth = AuthService::new(client.clone(), session.clone(), cache.clone());
        let admin = AdminApi::new(client, auth.clone(), cache.clone());

        let listener =
            ExpiryListener::mount(&notifier, session.clone(), cache.clone(), router.clone());
        debug!(base_url = %config.base_url(), "App initialised");

        Ok(Self {
            config,
            router,
            session,
            cache,
            auth,
            admin,
            listener: Some(listener),
            config_path: Config::config_path().ok(),
        })
    }

    /// Probe the session cookie and land on the right first screen.
    pub async fn start(&mut self) {
        match self.auth.probe().await {
            Ok(Some(user)) => {
                println!("Signed in as {}", render::current_user(&user));
                self.router.navigate(navigation::HOME_PATH);
            }
            Ok(None) => {
                println!("Not signed in. Use 'login' to start.");
                self.router.navigate(LOGIN_PATH);
            }
            Err(e) => {
                warn!(error = %e, "Startup probe failed");
                println!("Could not check session: {}", e.message());
                self.router.navigate(LOGIN_PATH);
            }
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.unmount();
        }
        info!("Console shutting down");
    }

    /// Run one command. Prompt answers are read from `input`.
    pub async fn execute<R: AsyncBufRead + Unpin>(
        &mut self,
        command: Command,
        input: &mut Input<R>,
    ) -> Result<Flow> {
        if let Some(route) = command.route() {
            if command.needs_session() && !self.session.is_authenticated() {
                let target = navigation::login_redirect(&route);
                self.router.navigate(&target);
                println!("Sign in required. Use 'login' to continue.");
                return Ok(Flow::Continue);
            }
            // Keep a pending redirect when the login screen is already showing
            let here = self.router.current_path();
            if route_of(&here) != route {
                self.router.navigate(&route);
            }
        }

        match command {
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(Flow::Quit),
            Command::Login { email } => self.login(email, input).await?,
            Command::Register {
                email,
                first_name,
                last_name,
            } => {
                self.register(email, first_name, last_name, input)
                    .await?
            }
            Command::Logout => {
                if let Err(e) = self.auth.logout().await {
                    debug!(error = %e, "Logout call failed");
                }
                self.router.navigate(LOGIN_PATH);
                println!("Signed out.");
            }
            Command::Whoami => match self.session.current_user() {
                Some(user) => println!("{}", render::current_user(&user)),
                None => println!("Not signed in."),
            },
            Command::Go(path) => {
                if navigation::requires_session(&path) && !self.session.is_authenticated() {
                    self.router.navigate(&navigation::login_redirect(&path));
                    println!("Sign in required. Use 'login' to continue.");
                } else {
                    self.router.navigate(&path);
                }
            }
            Command::Back => {
                if self.router.back().is_none() {
                    println!("No previous location.");
                }
            }
            Command::List {
                resource,
                page,
                size,
            } => self.list(resource, page, size).await,
            Command::Show { resource, ids } => self.show(resource, &ids).await,
            Command::Delete { resource, id } => self.delete(resource, id).await,
            Command::Profile {
                first_name,
                last_name,
            } => {
                let update = ProfileUpdate {
                    first_name,
                    last_name,
                    email: None,
                    password: None,
                };
                match self.admin.update_profile(&update).await {
                    Ok(user) => println!("Profile updated: {}", render::current_user(&user)),
                    Err(e) => report(&e),
                }
            }
            Command::Dashboard => match self.admin.dashboard().await {
                Ok(metrics) => println!("{}", render::dashboard(&metrics)),
                Err(e) => report(&e),
            },
            Command::Status => self.status().await,
        }

        Ok(Flow::Continue)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn login<R: AsyncBufRead + Unpin>(
        &mut self,
        email: Option<String>,
        input: &mut Input<R>,
    ) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => input.ask("Email: ").await?,
        };
        if email.is_empty() {
            println!("Email required.");
            return Ok(());
        }

        let password = self.password_for(&email, input).await?;
        if password.is_empty() {
            println!("Password required.");
            return Ok(());
        }

        match self.auth.login(&email, &password).await {
            Ok(user) => {
                if self.config.remember_password {
                    keychain_updated("store", CredentialStore::store(&email, &password));
                }
                self.config.last_email = Some(email);
                if let Some(path) = &self.config_path {
                    if let Err(e) = self.config.save_to(path) {
                        warn!(error = %e, "Failed to save config");
                    }
                }

                println!("Welcome, {}", render::current_user(&user));
                let target = navigation::redirect_target(&self.router.current_path());
                self.router.navigate(&target);
            }
            Err(ApiError::Unauthorized) => {
                if self.config.remember_password && CredentialStore::has_credentials(&email) {
                    keychain_updated("delete", CredentialStore::delete(&email));
                }
                println!("Invalid email or password.");
            }
            Err(e) => report(&e),
        }
        Ok(())
    }

    async fn password_for<R: AsyncBufRead + Unpin>(
        &self,
        email: &str,
        input: &mut Input<R>,
    ) -> Result<String> {
        if self.config.remember_password && CredentialStore::has_credentials(email) {
            let answer = input.ask("Use stored password? [Y/n]: ").await?;
            if answer.to_lowercase() != "n" {
                return CredentialStore::get_password(email);
            }
        }
        input.ask_password("Password: ").await
    }

    async fn register<R: AsyncBufRead + Unpin>(
        &mut self,
        email: String,
        first_name: String,
        last_name: String,
        input: &mut Input<R>,
    ) -> Result<()> {
        let password = input.ask_password("Choose a password: ").await?;
        let request = RegisterRequest {
            first_name,
            last_name,
            email,
            password,
        };
        match self.auth.register(&request).await {
            Ok(_) => {
                println!("Registered {}. Use 'login' to sign in.", request.email);
                self.router.navigate(LOGIN_PATH);
            }
            Err(e) => report(&e),
        }
        Ok(())
    }

    // =========================================================================
    // Resources
    // =========================================================================

    async fn list(&self, resource: ResourceKind, page: u32, size: u32) {
        let rendered = match resource {
            ResourceKind::Quizzes => self.admin.page::<Quiz>(page, size).await.map(|p| render::quiz_rows(&p)),
            ResourceKind::Questions => self
                .admin
                .page::<Question>(page, size)
                .await
                .map(|p| render::question_rows(&p)),
            ResourceKind::Users => self.admin.page::<User>(page, size).await.map(|p| render::user_rows(&p)),
            ResourceKind::Roles => self.admin.page::<Role>(page, size).await.map(|p| render::role_rows(&p)),
        };
        print_result(rendered);
    }

    async fn show(&self, resource: ResourceKind, ids: &[i64]) {
        let rendered: Vec<Result<String, ApiError>> = match resource {
            ResourceKind::Quizzes => self.details::<Quiz>(ids, render::quiz_detail).await,
            ResourceKind::Questions => self.details::<Question>(ids, render::question_detail).await,
            ResourceKind::Users => self.details::<User>(ids, render::user_detail).await,
            ResourceKind::Roles => self.details::<Role>(ids, render::role_detail).await,
        };
        for result in rendered {
            print_result(result);
        }
    }

    async fn details<R: Resource>(
        &self,
        ids: &[i64],
        render_one: fn(&R) -> String,
    ) -> Vec<Result<String, ApiError>> {
        self.admin
            .get_many::<R>(ids)
            .await
            .into_iter()
            .map(|r| r.map(|item| render_one(&item)))
            .collect()
    }

    async fn delete(&self, resource: ResourceKind, id: i64) {
        let result = match resource {
            ResourceKind::Quizzes => self.admin.delete::<Quiz>(id).await,
            ResourceKind::Questions => self.admin.delete::<Question>(id).await,
            ResourceKind::Users => self.admin.delete::<User>(id).await,
            ResourceKind::Roles => self.admin.delete::<Role>(id).await,
        };
        match result {
            Ok(()) => {
                println!("Deleted {} {}.", singular(resource), id);
                self.router.navigate(resource.route());
            }
            Err(e) => report(&e),
        }
    }

    async fn status(&self) {
        let user = self
            .session
            .current_user()
            .map(|u| render::current_user(&u))
            .unwrap_or_else(|| "not signed in".to_string());
        println!("Server:   {}", self.config.base_url());
        println!("Session:  {}", user);
        println!("Location: {}", self.router.current_path());
        println!(
            "Cache:    {} entries, last updated {}",
            self.cache.len().await,
            self.cache.last_updated().await
        );
    }
}

fn singular(resource: ResourceKind) -> &'static str {
    match resource {
        ResourceKind::Quizzes => Quiz::NAME,
        ResourceKind::Questions => Question::NAME,
        ResourceKind::Users => User::NAME,
        ResourceKind::Roles => Role::NAME,
    }
}

/// Keychain failures never block a login. They are logged and reported as `false`.
fn keychain_updated(action: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(action, error = %e, "Keychain update failed");
            false
        }
    }
}

fn print_result(result: Result<String, ApiError>) {
    match result {
        Ok(text) => println!("{}", text),
        Err(e) => report(&e),
    }
}

/// Show an API failure. Expired sessions are handled by the expiry listener.
fn report(error: &ApiError) {
    if error.is_unauthorized() {
        println!("Session expired. Please sign in again.");
    } else {
        println!("Error: {}", error.message());
    }
}
