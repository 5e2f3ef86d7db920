use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A GitLab account as returned by the session and user search APIs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Only present on session responses.
    #[serde(default)]
    pub private_token: Option<String>,
}

impl RemoteUser {
    /// Exact username match, or case-insensitive email match.
    pub fn matches_login(&self, login: &str) -> bool {
        self.username == login
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase() == login.to_lowercase())
    }
}

impl std::fmt::Debug for RemoteUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("private_token", &self.private_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    #[schema(example = "ada")]
    pub username: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthenticateResponse {
    pub authenticated: bool,
    /// The authenticated username. Group expansion is not performed.
    #[schema(example = json!(["ada"]))]
    pub groups: Vec<String>,
}
