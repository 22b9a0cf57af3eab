//! REST client for the audit management API.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::entity::{Audit, Finding, Organization, OrganizationInput, Project};
use crate::error::{Error, Result};
use crate::source::EntitySource;

const AUDITS: &str = "audits/";
const FINDINGS: &str = "findings/";
const ORGANIZATIONS: &str = "organizations/";
const PROJECTS: &str = "projects/";

/// Error body returned by the API, e.g. `{"detail": "Not found"}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP implementation of [`EntitySource`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = normalize_base(&config.base_url)?;
        let http = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(format!("auditdesk/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// The API root every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List the audits of one project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn list_audits_for_project(&self, project_id: i64) -> Result<Vec<Audit>> {
        self.get_list(&format!("{AUDITS}?project_id={project_id}")).await
    }

    /// Create an organization and return it as stored by the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server rejects it, or the
    /// response cannot be decoded.
    pub async fn create_organization(&self, input: &OrganizationInput) -> Result<Organization> {
        self.send_json(Method::POST, ORGANIZATIONS, input).await
    }

    /// Replace the editable fields of an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server rejects it, or the
    /// response cannot be decoded.
    pub async fn update_organization(
        &self,
        id: i64,
        input: &OrganizationInput,
    ) -> Result<Organization> {
        self.send_json(Method::PUT, &format!("{ORGANIZATIONS}{id}"), input)
            .await
    }

    /// Delete an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_organization(&self, id: i64) -> Result<()> {
        let endpoint = format!("{ORGANIZATIONS}{id}");
        let request = self.request(Method::DELETE, &endpoint)?;
        execute(&endpoint, request).await?;
        Ok(())
    }

    async fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let request = self.request(Method::GET, endpoint)?;
        let response = execute(endpoint, request).await?;
        read_json(endpoint, response).await
    }

    async fn send_json<B, T>(&self, method: Method, endpoint: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;
        let request = self
            .request(method, endpoint)?
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        let response = execute(endpoint, request).await?;
        read_json(endpoint, response).await
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|e| Error::internal(format!("invalid endpoint {endpoint}: {e}")))?;

        debug!(%method, %url, "sending request");
        let request = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }
}

async fn execute(endpoint: &str, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await.map_err(|source| Error::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;

    check_status(endpoint, response).await
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let body = response.bytes().await.map_err(|source| Error::Transport {
        endpoint: endpoint.to_string(),
        source,
    })?;

    serde_json::from_slice(&body).map_err(|e| Error::decode(endpoint, e.to_string()))
}

#[async_trait::async_trait]
impl EntitySource for ApiClient {
    async fn list_audits(&self) -> Result<Vec<Audit>> {
        self.get_list(AUDITS).await
    }

    async fn list_findings(&self) -> Result<Vec<Finding>> {
        self.get_list(FINDINGS).await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.get_list(ORGANIZATIONS).await
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_list(PROJECTS).await
    }
}

async fn check_status(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);
    warn!(endpoint, status = status.as_u16(), %message, "API request rejected");

    Err(Error::HttpStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Pull the `detail` message out of an API error body.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Parse the configured base URL, making sure relative joins stay under it.
fn normalize_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::config_validation(format!("invalid api.base_url {raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config_validation(format!(
            "api.base_url must use http or https, got {}",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
