//! Top-contributors table generation: report fetch, selection, rendering, and file patching.

pub mod domain;
pub mod fetcher;
pub mod gateway;
pub mod patcher;
pub mod render;
pub mod selector;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;

pub use domain::{
    AvatarLookup, Contributor, ContributorList, RawContributionRecord, ReportJob, ReportPayload,
    ReportRequest, ReportStatus, ReportUser, DEFAULT_AVATAR_URL,
};
pub use fetcher::{FetchError, ReportFetcher};
pub use gateway::{CrowdinClient, GatewayError, ReportGateway};
pub use patcher::{FilePatcher, MarkerSpan, PatchError, TargetFile};
pub use render::TableRenderer;
pub use selector::{select_without_avatars, ContributorSelector, SelectionRules};

use crate::config::{ContributorsTableConfig, CredentialsConfig, PollConfig};

#[derive(Debug, thiserror::Error)]
pub enum ContributorsError {
    #[error("none of the configured files can receive the contributors table")]
    NoWritableTargets,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// What a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorsOutcome {
    pub contributors: ContributorList,
    pub fragment: String,
    pub files_written: usize,
}

/// Runs the pipeline: target gate, report fetch, selection, rendering, patching.
#[derive(Debug)]
pub struct ContributorsWorkflow {
    fetcher: ReportFetcher,
    selector: ContributorSelector,
    renderer: TableRenderer,
    patcher: FilePatcher,
}

impl ContributorsWorkflow {
    pub fn new(
        gateway: Arc<dyn ReportGateway>,
        credentials: &CredentialsConfig,
        table: &ContributorsTableConfig,
        polling: PollConfig,
    ) -> Self {
        Self {
            fetcher: ReportFetcher::new(gateway.clone(), polling)
                .with_window(table.date_from, table.date_to),
            selector: ContributorSelector::new(gateway, table),
            renderer: TableRenderer::from_config(table, credentials.organization.as_deref()),
            patcher: FilePatcher::from_config(table),
        }
    }

    /// Full run. Nothing is written unless the report completes.
    pub async fn generate(&self) -> Result<ContributorsOutcome, ContributorsError> {
        let targets = self.writable_targets()?;
        let (contributors, fragment) = self.build_table().await?;

        info!(files = targets.len(), "writing contributors table");
        let files_written = self.patcher.patch(&targets, &fragment);
        if files_written == 0 {
            return Err(ContributorsError::NoWritableTargets);
        }

        Ok(ContributorsOutcome {
            contributors,
            fragment,
            files_written,
        })
    }

    /// Same as `generate` but stops after rendering.
    pub async fn preview(&self) -> Result<ContributorsOutcome, ContributorsError> {
        self.writable_targets()?;
        let (contributors, fragment) = self.build_table().await?;
        Ok(ContributorsOutcome {
            contributors,
            fragment,
            files_written: 0,
        })
    }

    fn writable_targets(&self) -> Result<Vec<TargetFile>, ContributorsError> {
        info!("validating target files");
        let targets = self.patcher.writable_targets();
        if targets.is_empty() {
            return Err(ContributorsError::NoWritableTargets);
        }
        Ok(targets)
    }

    async fn build_table(&self) -> Result<(ContributorList, String), ContributorsError> {
        let report = self.fetcher.fetch().await?;
        let contributors = self.selector.select(&report.data).await;
        let fragment = self.renderer.render(&contributors);
        Ok((contributors, fragment))
    }
}
