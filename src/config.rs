use std::path::PathBuf;

use crate::cache::DEFAULT_CAPACITY;
use crate::errors::AppError;

/// Rules for turning a package name into GitLab project paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingConfig {
    pub project_prefix: String,
    pub use_scope_as_group: bool,
    pub search_namespaces: Vec<String>,
    pub retain_group: bool,
}

impl NamingConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let search_namespaces = lookup("GITLAB_NAMESPACES")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|ns| !ns.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            project_prefix: lookup("GITLAB_PROJECT_PREFIX").unwrap_or_default(),
            use_scope_as_group: flag(&lookup, "GITLAB_USE_SCOPE_AS_GROUP")?,
            search_namespaces,
            retain_group: flag(&lookup, "GITLAB_RETAIN_GROUP")?,
        })
    }
}

/// Identity used to mint the service-wide API token.
#[derive(Clone, PartialEq, Eq)]
pub enum AdminCredentials {
    /// Used as-is; never cached.
    Token(String),
    /// Exchanged for a private token through a session login.
    Password { username: String, password: String },
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminCredentials::Token(_) => f.write_str("Token(<redacted>)"),
            AdminCredentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub gitlab_server: String,
    pub admin: AdminCredentials,
    pub naming: NamingConfig,
    pub ca_file: Option<PathBuf>,
    pub cache_max_entries: usize,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let gitlab_server = lookup("GITLAB_SERVER")
            .ok_or_else(|| AppError::configuration("GITLAB_SERVER not set"))?;

        let admin = match (
            lookup("GITLAB_ADMIN_PRIVATE_TOKEN"),
            lookup("GITLAB_ADMIN_USERNAME"),
            lookup("GITLAB_ADMIN_PASSWORD"),
        ) {
            (Some(token), _, _) => AdminCredentials::Token(token),
            (None, Some(username), Some(password)) => AdminCredentials::Password { username, password },
            _ => {
                return Err(AppError::configuration(
                    "set GITLAB_ADMIN_PRIVATE_TOKEN or both GITLAB_ADMIN_USERNAME and GITLAB_ADMIN_PASSWORD",
                ))
            }
        };

        let cache_max_entries = lookup("CACHE_MAX_ENTRIES")
            .map(|value| value.parse::<usize>())
            .unwrap_or(Ok(DEFAULT_CAPACITY))
            .map_err(|_| AppError::configuration("CACHE_MAX_ENTRIES must be a positive integer"))?;
        if cache_max_entries == 0 {
            return Err(AppError::configuration("CACHE_MAX_ENTRIES must be a positive integer"));
        }

        let port = lookup("APP_PORT")
            .map(|value| value.parse::<u16>())
            .unwrap_or(Ok(8000))
            .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?;

        Ok(Self {
            gitlab_server,
            admin,
            naming: NamingConfig::from_lookup(lookup)?,
            ca_file: lookup("GITLAB_CA_FILE").map(PathBuf::from),
            cache_max_entries,
            port,
        })
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<bool, AppError> {
    match lookup(name).map(|value| value.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some(other) => Err(AppError::configuration(format!("{name} must be a boolean, got {other:?}"))),
    }
}
