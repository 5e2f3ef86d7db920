use std::sync::Arc;

use super::Gateway;
use crate::authz::naming::{self, ResolvedName};
use crate::cache::{self, keys, CacheValue, Fetched, SharedCache};
use crate::config::{AdminCredentials, NamingConfig};
use crate::errors::{AppError, AppResult};
use crate::models::member::MembershipRecord;
use crate::models::project::RemoteProject;
use crate::models::user::RemoteUser;

/// GitLab lookups routed through the shared cache.
///
/// Every cached lookup goes through the singleflight layer, so concurrent
/// requests for the same record cost one remote call.
#[derive(Clone)]
pub struct RemoteLookups {
    gateway: Arc<dyn Gateway>,
    cache: SharedCache,
    admin: AdminCredentials,
    naming: NamingConfig,
}

impl RemoteLookups {
    pub fn new(gateway: Arc<dyn Gateway>, cache: SharedCache, admin: AdminCredentials, naming: NamingConfig) -> Self {
        Self {
            gateway,
            cache,
            admin,
            naming,
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// Token used for every lookup. A configured static token is returned
    /// as-is; otherwise the admin logs in and the token is cached for an hour.
    pub async fn admin_token(&self) -> AppResult<String> {
        let (username, password) = match &self.admin {
            AdminCredentials::Token(token) => return Ok(token.clone()),
            AdminCredentials::Password { username, password } => (username.clone(), password.clone()),
        };

        let gateway = Arc::clone(&self.gateway);
        let cache = Arc::clone(&self.cache);
        let token = self
            .cache
            .fetch_or_cached(&keys::token(&username), &(), Some(cache::TOKEN_TTL), move || async move {
                let admin = match gateway.authenticate(&username, &password).await {
                    Ok(admin) => admin,
                    Err(AppError::AuthenticationFailed(reason)) => {
                        return Err(AppError::configuration(format!(
                            "gitlab rejected the admin login for {username}: {reason}"
                        )))
                    }
                    Err(err) => return Err(err),
                };

                let token = admin.private_token.clone().ok_or_else(|| {
                    AppError::configuration(format!("admin session for {username} carried no private token"))
                })?;
                cache.set(keys::user(&username), CacheValue::User(admin));
                tracing::info!(admin = %username, "minted admin token");

                Ok(Fetched::cached(CacheValue::Token(token)))
            })
            .await?;

        token
            .and_then(CacheValue::into_token)
            .ok_or_else(|| AppError::internal("admin token lookup returned nothing"))
    }

    /// Finds the GitLab account for a registry login, by exact username or
    /// case-insensitive email. The first match in GitLab's order wins.
    pub async fn user(&self, login: &str) -> AppResult<RemoteUser> {
        let this = self.clone();
        let search = login.to_string();
        let found = self
            .cache
            .fetch_or_cached(&keys::user(login), &(), Some(cache::USER_TTL), move || async move {
                let token = this.admin_token().await?;
                let users = this.gateway.find_users(&search, &token).await?;

                Ok(users
                    .into_iter()
                    .find(|user| user.matches_login(&search))
                    .map(|user| Fetched::cached(CacheValue::User(user)))
                    .unwrap_or_else(Fetched::absent))
            })
            .await?;

        found
            .and_then(CacheValue::into_user)
            .ok_or_else(|| AppError::user_not_found(format!("no gitlab account matches {login}")))
    }

    /// Resolves a package to its GitLab project.
    ///
    /// Candidates are tried in order and the first hit wins. A failing
    /// candidate is logged and skipped, but when every candidate failed the
    /// last error is returned instead of a miss. The result is cached under
    /// the package name as the registry spelled it.
    pub async fn project(&self, package: &str) -> AppResult<RemoteProject> {
        let candidates = naming::resolve(package, &self.naming)?;

        let this = self.clone();
        let name = package.to_string();
        let to_search = candidates.clone();
        let found = self
            .cache
            .fetch_or_cached(&keys::project(package), &(), Some(cache::PROJECT_TTL), move || async move {
                let token = this.admin_token().await?;
                let mut last_error = None;
                let mut answered = false;

                for candidate in &to_search {
                    match this.find_candidate(candidate, &token).await {
                        Ok(Some(project)) => {
                            tracing::debug!(package = %name, candidate = %candidate, project_id = project.id, "resolved project");
                            return Ok(Fetched::cached(CacheValue::Project(project)));
                        }
                        Ok(None) => {
                            answered = true;
                            tracing::debug!(package = %name, candidate = %candidate, "no project at candidate");
                        }
                        Err(err) => {
                            tracing::warn!(package = %name, candidate = %candidate, error = %err, "candidate lookup failed, trying next");
                            last_error = Some(err);
                        }
                    }
                }

                match last_error {
                    Some(err) if !answered => Err(err),
                    _ => Ok(Fetched::absent()),
                }
            })
            .await?;

        found.and_then(CacheValue::into_project).ok_or_else(|| {
            let tried: Vec<String> = candidates.iter().map(ResolvedName::path).collect();
            AppError::project_not_found(format!("{package} (tried {})", tried.join(", ")))
        })
    }

    async fn find_candidate(&self, candidate: &ResolvedName, token: &str) -> AppResult<Option<RemoteProject>> {
        if !candidate.namespace.is_empty() {
            return self.gateway.find_project(&candidate.path(), token).await;
        }

        let projects = self.gateway.list_projects(&candidate.project, token).await?;
        Ok(projects.into_iter().find(|project| project.path == candidate.project))
    }

    /// Direct project membership. Always a live call.
    pub async fn project_member(&self, project_id: u64, user_id: u64) -> AppResult<Option<MembershipRecord>> {
        let token = self.admin_token().await?;
        self.gateway.get_project_member(project_id, user_id, &token).await
    }

    /// Membership in a group, cached for ten minutes. Non-members are not
    /// cached.
    pub async fn group_member(&self, group_id: u64, user_id: u64) -> AppResult<Option<MembershipRecord>> {
        let this = self.clone();
        let found = self
            .cache
            .fetch_or_cached(
                &keys::group_member(group_id, user_id),
                &(),
                Some(cache::GROUP_MEMBER_TTL),
                move || async move {
                    let token = this.admin_token().await?;
                    let members = this.gateway.list_group_members(group_id, &token).await?;

                    Ok(members
                        .into_iter()
                        .find(|member| member.user_id == user_id)
                        .map(|member| Fetched::cached(CacheValue::GroupMember(member)))
                        .unwrap_or_else(Fetched::absent))
                },
            )
            .await?;

        Ok(found.and_then(CacheValue::into_group_member))
    }
}
