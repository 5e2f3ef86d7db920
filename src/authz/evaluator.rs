use std::sync::Arc;

use async_trait::async_trait;

use super::principal::{PackageSpec, RegistryUser};
use super::{visibility, AuthOutcome, DecisionKind};
use crate::cache::{self, keys, CacheValue, Fetched, SharedCache};
use crate::config::Settings;
use crate::errors::{AppError, AppResult};
use crate::gitlab::{Gateway, RemoteLookups};
use crate::utils::credential_digest;

/// Operations the registry host delegates to an auth plugin.
///
/// Access and publish checks return `Ok(false)` when the package is not
/// handled by the plugin, `Ok(true)` when granted, and
/// `AppError::AccessDenied` / `AppError::PublishDenied` when denied.
#[async_trait]
pub trait RegistryPlugin: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthOutcome>;

    /// Registration goes through the same credential check.
    async fn adduser(&self, username: &str, password: &str) -> AppResult<AuthOutcome> {
        self.authenticate(username, password).await
    }

    async fn allow_access(&self, user: &RegistryUser, package: &PackageSpec) -> AppResult<bool>;

    async fn allow_publish(&self, user: &RegistryUser, package: &PackageSpec) -> AppResult<bool>;
}

/// Registry plugin that defers identity and permissions to GitLab.
///
/// Decision order for access and publish:
/// 1. package not delegated to GitLab -> not handled
/// 2. package open to everyone in the registry config -> allow
/// 3. cached grant -> allow
/// 4. project visibility (access only): public, or internal for signed-in
///    callers -> allow
/// 5. anonymous caller -> deny
/// 6. project membership at the threshold -> allow
/// 7. group membership at the threshold -> allow
/// 8. deny
///
/// Several instances may share one cache handle.
#[derive(Clone)]
pub struct GitlabPlugin {
    lookups: RemoteLookups,
}

impl GitlabPlugin {
    pub fn new(settings: &Settings, gateway: Arc<dyn Gateway>, cache: SharedCache) -> Self {
        Self {
            lookups: RemoteLookups::new(gateway, cache, settings.admin.clone(), settings.naming.clone()),
        }
    }

    pub fn from_lookups(lookups: RemoteLookups) -> Self {
        Self { lookups }
    }

    pub fn cache(&self) -> &SharedCache {
        self.lookups.cache()
    }

    async fn decide(&self, kind: DecisionKind, user: &RegistryUser, package: &PackageSpec) -> AppResult<bool> {
        let package_name = package.name.as_str();
        let username = user.name.as_deref();

        if !package.gitlab {
            tracing::debug!(package = %package_name, kind = kind.as_str(), "package not delegated to gitlab");
            return Ok(false);
        }

        if package.is_open_for(kind) {
            tracing::debug!(package = %package_name, kind = kind.as_str(), "package open to all principals");
            return Ok(true);
        }

        let decision_key = kind.cache_key(package_name, username);
        if self.cache().get(&decision_key, Some(cache::DECISION_TTL)).is_some() {
            tokio::task::yield_now().await;
            tracing::debug!(package = %package_name, user = ?username, kind = kind.as_str(), "cached grant");
            return Ok(true);
        }

        let project = self.lookups.project(package_name).await?;

        if kind == DecisionKind::Access {
            let level = project.visibility_level();
            if level >= visibility::PUBLIC {
                return Ok(self.grant(decision_key, kind, package_name, username, "public project"));
            }
            if level >= visibility::INTERNAL && user.is_authenticated() {
                return Ok(self.grant(decision_key, kind, package_name, username, "internal project"));
            }
        }

        let Some(login) = username else {
            tracing::debug!(package = %package_name, kind = kind.as_str(), "anonymous caller denied");
            return Err(kind.denied(package_name, None));
        };

        let remote_user = self.lookups.user(login).await?;
        let threshold = kind.threshold();

        let project_member = self.lookups.project_member(project.id, remote_user.id).await?;
        if project_member.as_ref().is_some_and(|member| member.meets(threshold)) {
            return Ok(self.grant(decision_key, kind, package_name, username, "project member"));
        }

        let group_member = self.lookups.group_member(project.namespace.id, remote_user.id).await?;
        if group_member.as_ref().is_some_and(|member| member.meets(threshold)) {
            return Ok(self.grant(decision_key, kind, package_name, username, "group member"));
        }

        tracing::info!(
            package = %package_name,
            user = %login,
            kind = kind.as_str(),
            project_level = ?project_member.map(|member| member.access_level),
            group_level = ?group_member.map(|member| member.access_level),
            threshold,
            "permission denied"
        );
        Err(kind.denied(package_name, username))
    }

    fn grant(&self, key: String, kind: DecisionKind, package: &str, username: Option<&str>, reason: &str) -> bool {
        self.cache().set(key, CacheValue::Granted);
        tracing::info!(package = %package, user = ?username, kind = kind.as_str(), reason, "permission granted");
        true
    }
}

#[async_trait]
impl RegistryPlugin for GitlabPlugin {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthOutcome> {
        let auth_key = keys::auth(username);
        let digest = credential_digest(username, password);

        let cached = self
            .cache()
            .get(&auth_key, Some(cache::AUTH_TTL))
            .and_then(CacheValue::into_credential);

        let verified = if cached.as_deref() == Some(digest.as_str()) {
            tokio::task::yield_now().await;
            true
        } else {
            let gateway = Arc::clone(self.lookups.gateway());
            let cache = Arc::clone(self.cache());
            let login = username.to_string();
            let password = password.to_string();
            let credential = digest.clone();
            let outcome = self
                .cache()
                .fetch(&auth_key, &digest, move || async move {
                    match gateway.authenticate(&login, &password).await {
                        Ok(user) => {
                            if let Some(token) = user.private_token.clone() {
                                cache.set(keys::token(&login), CacheValue::Token(token));
                            }
                            cache.set(keys::user(&login), CacheValue::User(user));
                            Ok(Fetched::cached(CacheValue::Credential(credential)))
                        }
                        Err(AppError::AuthenticationFailed(reason)) => {
                            tracing::warn!(user = %login, reason = %reason, "gitlab rejected credentials");
                            Ok(Fetched::absent())
                        }
                        Err(err) => {
                            tracing::error!(user = %login, error = %err, "error authenticating against gitlab");
                            Err(err)
                        }
                    }
                })
                .await?;
            outcome.is_some()
        };

        if !verified {
            return Ok(AuthOutcome::Rejected);
        }

        self.lookups.user(username).await?;
        tracing::info!(user = %username, "authenticated");
        Ok(AuthOutcome::Authenticated(vec![username.to_string()]))
    }

    async fn allow_access(&self, user: &RegistryUser, package: &PackageSpec) -> AppResult<bool> {
        self.decide(DecisionKind::Access, user, package).await
    }

    async fn allow_publish(&self, user: &RegistryUser, package: &PackageSpec) -> AppResult<bool> {
        self.decide(DecisionKind::Publish, user, package).await
    }
}
