use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::PollConfig;
use crate::workflows::contributors::domain::{
    RawContributionRecord, ReportJob, ReportPayload, ReportRequest, ReportStatus, ReportUser,
};
use crate::workflows::contributors::gateway::{GatewayError, ReportGateway};

/// Scripted gateway: statuses are served in order, the last one repeats.
#[derive(Debug, Default)]
pub(super) struct FakeGateway {
    pub(super) reject_creation: bool,
    pub(super) statuses: Mutex<VecDeque<Result<ReportStatus, GatewayError>>>,
    pub(super) records: Vec<RawContributionRecord>,
    pub(super) avatars: HashMap<u64, String>,
    pub(super) requests: Mutex<Vec<ReportRequest>>,
    pub(super) status_checks: Mutex<usize>,
    pub(super) avatar_lookups: Mutex<Vec<u64>>,
}

impl FakeGateway {
    pub(super) fn finished_with(records: Vec<RawContributionRecord>) -> Self {
        Self {
            statuses: Mutex::new(VecDeque::from(vec![Ok(ReportStatus::Finished)])),
            records,
            ..Self::default()
        }
    }

    pub(super) fn with_statuses(mut self, statuses: Vec<Result<ReportStatus, GatewayError>>) -> Self {
        self.statuses = Mutex::new(VecDeque::from(statuses));
        self
    }

    pub(super) fn with_avatar(mut self, user_id: u64, url: &str) -> Self {
        self.avatars.insert(user_id, url.to_string());
        self
    }

    pub(super) fn status_checks(&self) -> usize {
        *self.status_checks.lock().expect("status mutex")
    }

    pub(super) fn avatar_lookups(&self) -> Vec<u64> {
        self.avatar_lookups.lock().expect("avatar mutex").clone()
    }
}

#[async_trait]
impl ReportGateway for FakeGateway {
    async fn create_report(&self, request: &ReportRequest) -> Result<ReportJob, GatewayError> {
        self.requests
            .lock()
            .expect("request mutex")
            .push(request.clone());
        if self.reject_creation {
            return Err(GatewayError::Status {
                status: 403,
                body: "{\"error\":\"forbidden\"}".to_string(),
            });
        }
        Ok(ReportJob {
            identifier: "report-1".to_string(),
            status: ReportStatus::Queued,
        })
    }

    async fn report_status(&self, identifier: &str) -> Result<ReportJob, GatewayError> {
        *self.status_checks.lock().expect("status mutex") += 1;
        let mut statuses = self.statuses.lock().expect("status mutex");
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().map(|status| match status {
                Ok(status) => Ok(*status),
                Err(_) => Err(GatewayError::Decode("scripted failure".to_string())),
            })
        };
        let status = next.unwrap_or(Ok(ReportStatus::Finished))?;
        Ok(ReportJob {
            identifier: identifier.to_string(),
            status,
        })
    }

    async fn report_download_url(&self, identifier: &str) -> Result<String, GatewayError> {
        Ok(format!("https://downloads.example/{identifier}.json"))
    }

    async fn fetch_report(&self, _url: &str) -> Result<ReportPayload, GatewayError> {
        Ok(ReportPayload {
            data: self.records.clone(),
        })
    }

    async fn member_avatar(&self, user_id: u64) -> Result<String, GatewayError> {
        self.avatar_lookups
            .lock()
            .expect("avatar mutex")
            .push(user_id);
        self.avatars
            .get(&user_id)
            .cloned()
            .ok_or(GatewayError::Status {
                status: 404,
                body: "{\"error\":{\"code\":404,\"message\":\"Member Not Found\"}}".to_string(),
            })
    }
}

pub(super) fn record(id: u64, username: &str, translated: u64, approved: u64) -> RawContributionRecord {
    RawContributionRecord {
        user: ReportUser {
            id,
            username: username.to_string(),
            full_name: Some(format!("{username} full")),
        },
        translated,
        approved,
    }
}

pub(super) fn fast_polling() -> PollConfig {
    PollConfig {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(4),
        timeout: Duration::from_secs(5),
    }
}
