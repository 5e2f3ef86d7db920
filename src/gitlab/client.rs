use std::path::Path;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::Gateway;
use crate::errors::{AppError, AppResult};
use crate::models::member::MembershipRecord;
use crate::models::project::RemoteProject;
use crate::models::user::RemoteUser;

const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";
const PER_PAGE: &str = "50";

/// REST client for the GitLab v3 API.
#[derive(Debug, Clone)]
pub struct GitlabClient {
    http: reqwest::Client,
    base: String,
}

impl GitlabClient {
    pub fn new(server: &str, ca_file: Option<&Path>) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        if let Some(path) = ca_file {
            let pem = std::fs::read(path).map_err(|err| {
                AppError::configuration(format!("failed to read CA file {}: {err}", path.display()))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|err| {
                AppError::configuration(format!("invalid CA file {}: {err}", path.display()))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let http = builder
            .build()
            .map_err(|err| AppError::configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base: format!("{}/api/v3/", server.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_optional<T: DeserializeOwned>(&self, path: &str, token: &str) -> AppResult<Option<T>> {
        let response = self.http.get(self.url(path)).header(PRIVATE_TOKEN, token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check_status(response)?.json().await?))
    }

    /// Fetches every page of a list endpoint by following `rel="next"` links.
    async fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> AppResult<Vec<T>> {
        let mut results = Vec::new();
        let mut next: Option<RequestBuilder> = Some(
            self.http
                .get(self.url(path))
                .query(query)
                .query(&[("per_page", PER_PAGE), ("page", "1")]),
        );

        while let Some(request) = next.take() {
            let response = check_status(request.header(PRIVATE_TOKEN, token).send().await?)?;
            next = next_link(response.headers()).map(|url| self.http.get(url));
            let page: Vec<T> = response.json().await?;
            results.extend(page);
        }

        Ok(results)
    }
}

#[async_trait]
impl Gateway for GitlabClient {
    async fn authenticate(&self, login: &str, password: &str) -> AppResult<RemoteUser> {
        let body = if login.contains('@') {
            json!({ "email": login, "password": password })
        } else {
            json!({ "login": login, "password": password })
        };

        let response = self.http.post(self.url("session")).json(&body).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AppError::authentication_failed(format!("gitlab rejected credentials for {login}")));
        }

        Ok(check_status(response)?.json().await?)
    }

    async fn find_users(&self, search: &str, token: &str) -> AppResult<Vec<RemoteUser>> {
        self.paginate("users", &[("search", search)], token).await
    }

    async fn find_project(&self, path: &str, token: &str) -> AppResult<Option<RemoteProject>> {
        self.get_optional(&format!("projects/{}", urlencoding::encode(path)), token)
            .await
    }

    async fn list_projects(&self, search: &str, token: &str) -> AppResult<Vec<RemoteProject>> {
        self.paginate("projects", &[("search", search)], token).await
    }

    async fn get_project_member(
        &self,
        project_id: u64,
        user_id: u64,
        token: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        self.get_optional(&format!("projects/{project_id}/members/{user_id}"), token)
            .await
    }

    async fn list_group_members(&self, group_id: u64, token: &str) -> AppResult<Vec<MembershipRecord>> {
        self.paginate(&format!("groups/{group_id}/members"), &[], token).await
    }
}

fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::error!(status = %status, url = %response.url(), "gitlab request failed");
    Err(AppError::transport(format!("unexpected status {status} from {}", response.url().path())))
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;

    value.split(',').find_map(|link| {
        let mut target = None;
        let mut is_next = false;

        for piece in link.split(';').map(str::trim) {
            if let Some(url) = piece.strip_prefix('<').and_then(|p| p.strip_suffix('>')) {
                target = Some(url.to_string());
            } else if piece == r#"rel="next""# {
                is_next = true;
            }
        }

        if is_next {
            target
        } else {
            None
        }
    })
}
