#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use registry_gitlab_auth::authz::GitlabPlugin;
use registry_gitlab_auth::cache::{self, SharedCache};
use registry_gitlab_auth::config::{NamingConfig, Settings};
use registry_gitlab_auth::errors::{AppError, AppResult};
use registry_gitlab_auth::gitlab::Gateway;
use registry_gitlab_auth::models::member::MembershipRecord;
use registry_gitlab_auth::models::project::{Namespace, RemoteProject};
use registry_gitlab_auth::models::user::RemoteUser;

pub const ADMIN_TOKEN: &str = "admin-token";

/// In-memory GitLab with scripted records and per-call counters.
#[derive(Default)]
pub struct FakeGateway {
    users: Vec<RemoteUser>,
    passwords: HashMap<String, String>,
    projects: HashMap<String, RemoteProject>,
    project_members: HashMap<(u64, u64), u8>,
    group_members: HashMap<u64, Vec<MembershipRecord>>,
    broken_paths: HashSet<String>,
    transport_down: bool,
    latency: Option<Duration>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: u64, username: &str, password: &str) -> Self {
        self.users.push(RemoteUser {
            id,
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            private_token: Some(format!("token-of-{username}")),
        });
        self.passwords.insert(username.to_string(), password.to_string());
        self
    }

    /// Registers `namespace/path` with the given visibility level. The
    /// namespace id doubles as the group id.
    pub fn with_project(mut self, id: u64, namespace_id: u64, namespace: &str, path: &str, level: u8) -> Self {
        let path_with_namespace = if namespace.is_empty() {
            path.to_string()
        } else {
            format!("{namespace}/{path}")
        };
        self.projects.insert(
            path_with_namespace.clone(),
            RemoteProject {
                id,
                path: path.to_string(),
                path_with_namespace,
                visibility_level: Some(level),
                visibility: None,
                namespace: Namespace {
                    id: namespace_id,
                    path: namespace.to_string(),
                },
            },
        );
        self
    }

    pub fn with_project_member(mut self, project_id: u64, user_id: u64, level: u8) -> Self {
        self.project_members.insert((project_id, user_id), level);
        self
    }

    pub fn with_group_member(mut self, group_id: u64, user_id: u64, level: u8) -> Self {
        self.group_members.entry(group_id).or_default().push(MembershipRecord {
            user_id,
            access_level: level,
        });
        self
    }

    /// Lookups of this exact project path fail with a transport error.
    pub fn with_broken_path(mut self, path: &str) -> Self {
        self.broken_paths.insert(path.to_string());
        self
    }

    /// Every call fails with a transport error.
    pub fn offline(mut self) -> Self {
        self.transport_down = true;
        self
    }

    /// Every call sleeps first, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    async fn record(&self, name: &'static str) -> AppResult<()> {
        *self.calls.lock().entry(name).or_insert(0) += 1;
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.transport_down {
            return Err(AppError::transport("gitlab unreachable"));
        }
        Ok(())
    }

    fn check_token(&self, token: &str) -> AppResult<()> {
        let known = token == ADMIN_TOKEN
            || self
                .users
                .iter()
                .any(|user| user.private_token.as_deref() == Some(token));
        if known {
            Ok(())
        } else {
            Err(AppError::transport(format!("unexpected status 401 Unauthorized for token {token}")))
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn authenticate(&self, login: &str, password: &str) -> AppResult<RemoteUser> {
        self.record("authenticate").await?;

        let user = self
            .users
            .iter()
            .find(|user| user.matches_login(login))
            .ok_or_else(|| AppError::authentication_failed(format!("unknown login {login}")))?;

        match self.passwords.get(&user.username) {
            Some(expected) if expected == password => Ok(user.clone()),
            _ => Err(AppError::authentication_failed(format!("bad password for {login}"))),
        }
    }

    async fn find_users(&self, search: &str, token: &str) -> AppResult<Vec<RemoteUser>> {
        self.record("find_users").await?;
        self.check_token(token)?;

        let needle = search.to_lowercase();
        Ok(self
            .users
            .iter()
            .filter(|user| {
                user.username.to_lowercase().contains(&needle)
                    || user.email.as_deref().is_some_and(|email| email.to_lowercase().contains(&needle))
            })
            .map(|user| RemoteUser {
                private_token: None,
                ..user.clone()
            })
            .collect())
    }

    async fn find_project(&self, path: &str, token: &str) -> AppResult<Option<RemoteProject>> {
        self.record("find_project").await?;
        self.check_token(token)?;

        if self.broken_paths.contains(path) {
            return Err(AppError::transport(format!("unexpected status 500 for {path}")));
        }
        Ok(self.projects.get(path).cloned())
    }

    async fn list_projects(&self, search: &str, token: &str) -> AppResult<Vec<RemoteProject>> {
        self.record("list_projects").await?;
        self.check_token(token)?;

        Ok(self
            .projects
            .values()
            .filter(|project| project.path.contains(search))
            .cloned()
            .collect())
    }

    async fn get_project_member(
        &self,
        project_id: u64,
        user_id: u64,
        token: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        self.record("get_project_member").await?;
        self.check_token(token)?;

        Ok(self
            .project_members
            .get(&(project_id, user_id))
            .map(|&access_level| MembershipRecord { user_id, access_level }))
    }

    async fn list_group_members(&self, group_id: u64, token: &str) -> AppResult<Vec<MembershipRecord>> {
        self.record("list_group_members").await?;
        self.check_token(token)?;

        Ok(self.group_members.get(&group_id).cloned().unwrap_or_default())
    }
}

pub fn settings(naming: NamingConfig) -> Settings {
    let mut settings = Settings::from_lookup(|name| match name {
        "GITLAB_SERVER" => Some("https://gitlab.example.com".to_string()),
        "GITLAB_ADMIN_PRIVATE_TOKEN" => Some(ADMIN_TOKEN.to_string()),
        _ => None,
    })
    .expect("static test settings are valid");
    settings.naming = naming;
    settings
}

/// Settings that mint the admin token through a session login.
pub fn password_settings(username: &str, password: &str) -> Settings {
    let (username, password) = (username.to_string(), password.to_string());
    Settings::from_lookup(move |name| match name {
        "GITLAB_SERVER" => Some("https://gitlab.example.com".to_string()),
        "GITLAB_ADMIN_USERNAME" => Some(username.clone()),
        "GITLAB_ADMIN_PASSWORD" => Some(password.clone()),
        _ => None,
    })
    .expect("static test settings are valid")
}

/// Plugin over `gateway` with its own fresh cache.
pub fn plugin(gateway: &Arc<FakeGateway>) -> GitlabPlugin {
    plugin_with_cache(gateway, cache::shared(cache::DEFAULT_CAPACITY))
}

pub fn plugin_with_cache(gateway: &Arc<FakeGateway>, cache: SharedCache) -> GitlabPlugin {
    let gateway: Arc<dyn Gateway> = Arc::clone(gateway) as Arc<dyn Gateway>;
    GitlabPlugin::new(&settings(NamingConfig::default()), gateway, cache)
}
