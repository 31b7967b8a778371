use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::domain::{ReportJob, ReportPayload, ReportRequest};
use crate::config::CredentialsConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("remote service answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid credentials: {0}")]
    Credentials(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::Status { status: 404, .. })
    }
}

/// Remote operations the contributors pipeline depends on, scoped to one project.
#[async_trait]
pub trait ReportGateway: Debug + Send + Sync {
    async fn create_report(&self, request: &ReportRequest) -> Result<ReportJob, GatewayError>;
    async fn report_status(&self, identifier: &str) -> Result<ReportJob, GatewayError>;
    async fn report_download_url(&self, identifier: &str) -> Result<String, GatewayError>;
    async fn fetch_report(&self, url: &str) -> Result<ReportPayload, GatewayError>;
    async fn member_avatar(&self, user_id: u64) -> Result<String, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct DownloadLink {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectMember {
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Crowdin API v2 client bound to a single project.
pub struct CrowdinClient {
    http: reqwest::Client,
    base_url: String,
    project_id: u64,
}

impl CrowdinClient {
    pub fn new(credentials: &CredentialsConfig) -> Result<Self, GatewayError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.token))
            .map_err(|err| GatewayError::Credentials(err.to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.api_base_url(),
            project_id: credentials.project_id,
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, path)
    }
}

impl std::fmt::Debug for CrowdinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReportGateway for CrowdinClient {
    async fn create_report(&self, request: &ReportRequest) -> Result<ReportJob, GatewayError> {
        let response = self
            .http
            .post(self.project_url("reports"))
            .json(request)
            .send()
            .await?;
        let envelope: Envelope<ReportJob> = read_json(response).await?;
        Ok(envelope.data)
    }

    async fn report_status(&self, identifier: &str) -> Result<ReportJob, GatewayError> {
        let response = self
            .http
            .get(self.project_url(&format!("reports/{identifier}")))
            .send()
            .await?;
        let envelope: Envelope<ReportJob> = read_json(response).await?;
        Ok(envelope.data)
    }

    async fn report_download_url(&self, identifier: &str) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(self.project_url(&format!("reports/{identifier}/download")))
            .send()
            .await?;
        let envelope: Envelope<DownloadLink> = read_json(response).await?;
        Ok(envelope.data.url)
    }

    async fn fetch_report(&self, url: &str) -> Result<ReportPayload, GatewayError> {
        // Pre-signed link; the API token must not leak to the storage host.
        let response = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?
            .get(url)
            .send()
            .await?;
        read_json(response).await
    }

    async fn member_avatar(&self, user_id: u64) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(self.project_url(&format!("members/{user_id}")))
            .send()
            .await?;
        let envelope: Envelope<ProjectMember> = read_json(response).await?;
        envelope
            .data
            .avatar_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| GatewayError::Decode(format!("member {user_id} has no avatarUrl")))
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|err| GatewayError::Decode(err.to_string()))
}
