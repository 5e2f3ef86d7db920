//! GitLab access: the transport contract, its REST implementation, and the
//! cached lookups built on top of it.

mod client;
mod lookups;

pub use client::GitlabClient;
pub use lookups::RemoteLookups;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::member::MembershipRecord;
use crate::models::project::RemoteProject;
use crate::models::user::RemoteUser;

/// Calls the plugin makes against GitLab.
///
/// List calls return every page. "Not found" is `Ok(None)` where the call
/// addresses a single record.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Exchanges a login (username or email) and password for the account,
    /// including its private token. Bad credentials are
    /// `AppError::AuthenticationFailed`.
    async fn authenticate(&self, login: &str, password: &str) -> AppResult<RemoteUser>;

    async fn find_users(&self, search: &str, token: &str) -> AppResult<Vec<RemoteUser>>;

    /// Looks a project up by its full `namespace/project` path.
    async fn find_project(&self, path: &str, token: &str) -> AppResult<Option<RemoteProject>>;

    async fn list_projects(&self, search: &str, token: &str) -> AppResult<Vec<RemoteProject>>;

    async fn get_project_member(
        &self,
        project_id: u64,
        user_id: u64,
        token: &str,
    ) -> AppResult<Option<MembershipRecord>>;

    async fn list_group_members(&self, group_id: u64, token: &str) -> AppResult<Vec<MembershipRecord>>;
}
