use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Shown when a member's avatar cannot be looked up (private or deleted profiles).
pub const DEFAULT_AVATAR_URL: &str = "https://i2.wp.com/crowdin.com/images/user-picture.png?ssl=1";

/// Lifecycle of a remote report job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ReportStatus {
    #[serde(rename = "created")]
    Queued,
    #[serde(rename = "inProgress")]
    Processing,
    #[serde(rename = "finished")]
    Finished,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "canceled")]
    Canceled,
    #[serde(other)]
    Unknown,
}

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Queued => "queued",
            ReportStatus::Processing => "processing",
            ReportStatus::Finished => "finished",
            ReportStatus::Failed => "failed",
            ReportStatus::Canceled => "canceled",
            ReportStatus::Unknown => "unknown",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ReportStatus::Queued | ReportStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportJob {
    pub identifier: String,
    pub status: ReportStatus,
}

/// Parameters of the report job submitted to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub name: &'static str,
    pub schema: ReportSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSchema {
    pub unit: &'static str,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl ReportRequest {
    pub fn top_members(date_from: Option<String>, date_to: Option<String>) -> Self {
        Self {
            name: "top-members",
            schema: ReportSchema {
                unit: "words",
                format: "json",
                date_from,
                date_to,
            },
        }
    }
}

/// Downloaded report body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub data: Vec<RawContributionRecord>,
}

/// One row of the downloaded report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawContributionRecord {
    pub user: ReportUser,
    #[serde(default)]
    pub translated: u64,
    #[serde(default)]
    pub approved: u64,
}

impl RawContributionRecord {
    pub fn words(&self) -> u64 {
        self.translated.saturating_add(self.approved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUser {
    #[serde(deserialize_with = "numeric_id")]
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Report exports carry user ids either as numbers or as numeric strings.
fn numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("user id '{text}' is not numeric"))),
    }
}

/// Outcome of a best-effort avatar lookup. Both arms carry a usable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarLookup {
    Found(String),
    Fallback(String),
}

impl AvatarLookup {
    pub fn fallback() -> Self {
        AvatarLookup::Fallback(DEFAULT_AVATAR_URL.to_string())
    }

    pub fn url(&self) -> &str {
        match self {
            AvatarLookup::Found(url) | AvatarLookup::Fallback(url) => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            AvatarLookup::Found(url) | AvatarLookup::Fallback(url) => url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub translated: u64,
    pub approved: u64,
    pub picture: String,
}

impl Contributor {
    pub fn from_record(record: &RawContributionRecord, picture: AvatarLookup) -> Self {
        let name = record
            .user
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(record.user.username.as_str())
            .to_string();

        Self {
            id: record.user.id,
            username: record.user.username.clone(),
            name,
            translated: record.translated,
            approved: record.approved,
            picture: picture.into_url(),
        }
    }

    /// Ranking and display score.
    pub fn words(&self) -> u64 {
        self.translated.saturating_add(self.approved)
    }
}

/// Contributors in report order, never longer than the configured cap.
pub type ContributorList = Vec<Contributor>;
