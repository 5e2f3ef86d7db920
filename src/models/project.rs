use serde::{Deserialize, Serialize};

use crate::authz::visibility;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: u64,
    pub path: String,
}

/// A GitLab project as returned by the projects API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
    pub id: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_with_namespace: String,
    /// Numeric visibility from the v3 API.
    #[serde(default)]
    pub visibility_level: Option<u8>,
    /// Named visibility from newer APIs ("private", "internal", "public").
    #[serde(default)]
    pub visibility: Option<String>,
    pub namespace: Namespace,
}

impl RemoteProject {
    /// Visibility as a numeric tier, whichever form the server sent.
    /// Unknown or missing visibility counts as private.
    pub fn visibility_level(&self) -> u8 {
        if let Some(level) = self.visibility_level {
            return level;
        }

        match self.visibility.as_deref() {
            Some("public") => visibility::PUBLIC,
            Some("internal") => visibility::INTERNAL,
            _ => visibility::PRIVATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_visibility_wins() {
        let project: RemoteProject = serde_json::from_value(serde_json::json!({
            "id": 5,
            "visibility_level": 10,
            "visibility": "public",
            "namespace": {"id": 2, "path": "npm"}
        }))
        .unwrap();
        assert_eq!(project.visibility_level(), visibility::INTERNAL);
    }

    #[test]
    fn named_visibility_is_mapped() {
        let project: RemoteProject = serde_json::from_value(serde_json::json!({
            "id": 5,
            "path": "pkg",
            "visibility": "public",
            "namespace": {"id": 2, "path": "npm"}
        }))
        .unwrap();
        assert_eq!(project.visibility_level(), visibility::PUBLIC);
        assert_eq!(project.path, "pkg");
    }

    #[test]
    fn missing_visibility_is_private() {
        let project: RemoteProject = serde_json::from_value(serde_json::json!({
            "id": 5,
            "namespace": {"id": 2, "path": "npm"}
        }))
        .unwrap();
        assert_eq!(project.visibility_level(), visibility::PRIVATE);
    }
}
