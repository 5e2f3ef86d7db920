//! Process-wide lookup cache shared by every plugin instance.

pub mod keys;
mod singleflight;
mod store;

pub use singleflight::{Fetched, SingleFlight};
pub use store::{TtlCache, DEFAULT_CAPACITY};

use std::sync::Arc;
use std::time::Duration;

use crate::models::member::MembershipRecord;
use crate::models::project::RemoteProject;
use crate::models::user::RemoteUser;

pub const TOKEN_TTL: Duration = Duration::from_secs(3600);
pub const USER_TTL: Duration = Duration::from_secs(3600);
pub const PROJECT_TTL: Duration = Duration::from_secs(3600);
pub const GROUP_MEMBER_TTL: Duration = Duration::from_secs(600);
pub const DECISION_TTL: Duration = Duration::from_secs(900);
pub const AUTH_TTL: Duration = Duration::from_secs(900);

/// Everything the plugin keeps in the shared cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Token(String),
    User(RemoteUser),
    Project(RemoteProject),
    GroupMember(MembershipRecord),
    /// Digest of a password GitLab accepted.
    Credential(String),
    /// A positive access or publish decision. Denials are never stored.
    Granted,
}

impl CacheValue {
    pub fn into_token(self) -> Option<String> {
        match self {
            CacheValue::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn into_user(self) -> Option<RemoteUser> {
        match self {
            CacheValue::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn into_project(self) -> Option<RemoteProject> {
        match self {
            CacheValue::Project(project) => Some(project),
            _ => None,
        }
    }

    pub fn into_group_member(self) -> Option<MembershipRecord> {
        match self {
            CacheValue::GroupMember(member) => Some(member),
            _ => None,
        }
    }

    pub fn into_credential(self) -> Option<String> {
        match self {
            CacheValue::Credential(digest) => Some(digest),
            _ => None,
        }
    }
}

/// Handle to the process-wide cache. Build it once and clone it into every
/// consumer.
pub type SharedCache = Arc<SingleFlight<CacheValue>>;

pub fn shared(capacity: usize) -> SharedCache {
    Arc::new(SingleFlight::new(capacity))
}
