//! Authorization module - GitLab-backed registry decisions
//!
//! This module turns registry requests into GitLab lookups:
//! - Package name to GitLab project resolution
//! - Visibility and membership cascade for access and publish
//! - Credential verification with short-lived caching

mod evaluator;
pub mod naming;
mod principal;

pub use evaluator::{GitlabPlugin, RegistryPlugin};
pub use naming::{resolve, ResolvedName};
pub use principal::{PackageSpec, RegistryUser};

use crate::cache::keys;
use crate::errors::AppError;

/// Project visibility tiers
pub mod visibility {
    pub const PRIVATE: u8 = 0;
    /// Readable by any signed-in user.
    pub const INTERNAL: u8 = 10;
    /// Readable by anyone.
    pub const PUBLIC: u8 = 20;
}

/// Membership access levels
pub mod access_level {
    pub const GUEST: u8 = 10;
    /// Minimum level to read a package.
    pub const REPORTER: u8 = 20;
    pub const DEVELOPER: u8 = 30;
    /// Minimum level to publish a package.
    pub const MAINTAINER: u8 = 40;
    pub const OWNER: u8 = 50;
}

/// Which registry operation is being decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    Access,
    Publish,
}

impl DecisionKind {
    /// Membership level required to be granted this operation.
    pub fn threshold(self) -> u8 {
        match self {
            DecisionKind::Access => access_level::REPORTER,
            DecisionKind::Publish => access_level::MAINTAINER,
        }
    }

    pub fn cache_key(self, package: &str, username: Option<&str>) -> String {
        match self {
            DecisionKind::Access => keys::access(package, username),
            DecisionKind::Publish => keys::publish(package, username),
        }
    }

    pub fn denied(self, package: &str, username: Option<&str>) -> AppError {
        let who = username.unwrap_or(keys::ANONYMOUS);
        match self {
            DecisionKind::Access => AppError::access_denied(format!("{who} may not read {package}")),
            DecisionKind::Publish => AppError::publish_denied(format!("{who} may not publish {package}")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionKind::Access => "access",
            DecisionKind::Publish => "publish",
        }
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials accepted; carries the caller's groups (just the username).
    Authenticated(Vec<String>),
    /// GitLab rejected the credentials.
    Rejected,
}
