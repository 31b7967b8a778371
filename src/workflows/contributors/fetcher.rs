use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::domain::{ReportPayload, ReportRequest, ReportStatus};
use super::gateway::{GatewayError, ReportGateway};
use crate::config::PollConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unable to generate report: {0}")]
    ReportGeneration(#[source] GatewayError),
    #[error("unable to check report status: {0}")]
    ReportPoll(#[source] GatewayError),
    #[error("report {identifier} ended with status '{}'", .status.label())]
    JobFailed {
        identifier: String,
        status: ReportStatus,
    },
    #[error("report {identifier} still not finished after {waited:?}")]
    Timeout { identifier: String, waited: Duration },
    #[error("unable to download report: {0}")]
    Download(#[source] GatewayError),
}

/// Requests a top-members report and waits for the job with bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct ReportFetcher {
    gateway: Arc<dyn ReportGateway>,
    polling: PollConfig,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

impl ReportFetcher {
    pub fn new(gateway: Arc<dyn ReportGateway>, polling: PollConfig) -> Self {
        Self {
            gateway,
            polling,
            date_from: None,
            date_to: None,
        }
    }

    pub fn with_window(mut self, date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) -> Self {
        self.date_from = date_from;
        self.date_to = date_to;
        self
    }

    pub async fn fetch(&self) -> Result<ReportPayload, FetchError> {
        info!("requesting top members report");
        let request = ReportRequest::top_members(
            self.date_from.map(start_of_day),
            self.date_to.map(end_of_day),
        );
        let job = self
            .gateway
            .create_report(&request)
            .await
            .map_err(FetchError::ReportGeneration)?;

        let identifier = job.identifier;
        self.wait_until_finished(&identifier).await?;

        let url = self
            .gateway
            .report_download_url(&identifier)
            .await
            .map_err(FetchError::Download)?;
        let payload = self
            .gateway
            .fetch_report(&url)
            .await
            .map_err(FetchError::Download)?;

        info!(rows = payload.data.len(), "report downloaded");
        Ok(payload)
    }

    async fn wait_until_finished(&self, identifier: &str) -> Result<(), FetchError> {
        let started = Instant::now();
        let deadline = started + self.polling.timeout;
        let mut delay = self.polling.initial_interval;

        loop {
            let job = self
                .gateway
                .report_status(identifier)
                .await
                .map_err(FetchError::ReportPoll)?;

            match job.status {
                ReportStatus::Finished => {
                    info!(identifier, "report finished");
                    return Ok(());
                }
                status if status.is_pending() => {
                    debug!(identifier, status = status.label(), ?delay, "report pending");
                }
                status => {
                    return Err(FetchError::JobFailed {
                        identifier: identifier.to_string(),
                        status,
                    })
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(FetchError::Timeout {
                    identifier: identifier.to_string(),
                    waited: now - started,
                });
            }

            sleep(delay.min(deadline - now)).await;
            delay = next_delay(delay, self.polling.max_interval);
        }
    }
}

fn next_delay(current: Duration, ceiling: Duration) -> Duration {
    current.saturating_mul(2).min(ceiling)
}

fn start_of_day(date: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))
}

fn end_of_day(date: NaiveDate) -> String {
    format!("{}T23:59:59+00:00", date.format("%Y-%m-%d"))
}
