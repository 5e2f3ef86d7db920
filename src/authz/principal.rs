use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DecisionKind;

/// Principal names the registry uses for "everyone".
const OPEN_PRINCIPALS: [&str; 2] = ["$all", "$anonymous"];

/// The caller as the registry sees it. `name` is `None` for anonymous callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegistryUser {
    #[schema(example = "ada")]
    pub name: Option<String>,
}

impl RegistryUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }
}

/// Static registry configuration for one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PackageSpec {
    #[schema(example = "@frontend/ui-kit")]
    pub name: String,
    /// Whether GitLab decides access for this package.
    #[serde(default)]
    pub gitlab: bool,
    /// Principals the registry config allows to read the package.
    #[serde(default)]
    pub access: Vec<String>,
    /// Principals the registry config allows to publish the package.
    #[serde(default)]
    pub publish: Vec<String>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn delegated(mut self) -> Self {
        self.gitlab = true;
        self
    }

    pub fn with_access(mut self, principals: impl IntoIterator<Item = String>) -> Self {
        self.access = principals.into_iter().collect();
        self
    }

    pub fn with_publish(mut self, principals: impl IntoIterator<Item = String>) -> Self {
        self.publish = principals.into_iter().collect();
        self
    }

    /// True when the registry config opens this operation to everyone.
    pub fn is_open_for(&self, kind: DecisionKind) -> bool {
        let principals = match kind {
            DecisionKind::Access => &self.access,
            DecisionKind::Publish => &self.publish,
        };
        principals
            .iter()
            .any(|principal| OPEN_PRINCIPALS.contains(&principal.as_str()))
    }
}
