use std::fmt;

use crate::config::NamingConfig;
use crate::errors::AppError;

/// One GitLab location a package may live at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    /// Group path, possibly nested and possibly empty.
    pub namespace: String,
    pub project: String,
}

impl ResolvedName {
    fn new(namespace: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            project: project.into(),
        }
    }

    /// `namespace/project`, or just `project` when there is no namespace.
    pub fn path(&self) -> String {
        if self.namespace.is_empty() {
            self.project.clone()
        } else {
            format!("{}/{}", self.namespace, self.project)
        }
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Maps a registry package name to the GitLab locations to try, in order.
///
/// 1. `@scope/name` splits into namespace `scope` and project `name`; an
///    unscoped name has an empty namespace.
/// 2. With `use_scope_as_group`, the project's first hyphen splits off a group:
///    `scope-name` becomes group `scope`, project `name`. The group replaces the
///    namespace, or is appended to it under `retain_group`.
/// 3. `project_prefix` is prepended to the project.
/// 4. Each search namespace yields one candidate, with the namespace from the
///    previous steps nested under it only when `retain_group` is set.
pub fn resolve(package: &str, config: &NamingConfig) -> Result<Vec<ResolvedName>, AppError> {
    let trimmed = package.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_package_name("package name is empty"));
    }

    let unscoped = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let parts: Vec<&str> = unscoped.split('/').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(AppError::invalid_package_name(format!("empty segment in {trimmed}")));
    }

    let (mut namespace, mut project) = match parts.as_slice() {
        [project] => (String::new(), project.to_string()),
        [namespace, project] => (namespace.to_string(), project.to_string()),
        _ => return Err(AppError::invalid_package_name(format!("too many segments in {trimmed}"))),
    };

    if config.use_scope_as_group {
        if let Some((group, rest)) = project.split_once('-') {
            if group.is_empty() || rest.is_empty() {
                return Err(AppError::invalid_package_name(format!("empty segment around hyphen in {trimmed}")));
            }
            namespace = if config.retain_group && !namespace.is_empty() {
                format!("{namespace}/{group}")
            } else {
                group.to_string()
            };
            project = rest.to_string();
        }
    }

    let project = format!("{}{}", config.project_prefix, project);

    if config.search_namespaces.is_empty() {
        return Ok(vec![ResolvedName::new(namespace, project)]);
    }

    Ok(config
        .search_namespaces
        .iter()
        .map(|ns| {
            let candidate_namespace = if config.retain_group && !namespace.is_empty() {
                format!("{ns}/{namespace}")
            } else {
                ns.clone()
            };
            ResolvedName::new(candidate_namespace, project.clone())
        })
        .collect())
}
