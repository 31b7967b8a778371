use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{AvatarLookup, Contributor, ContributorList, RawContributionRecord};
use super::gateway::ReportGateway;
use crate::config::ContributorsTableConfig;

/// Inclusion rules applied to report rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRules {
    pub excluded_account: String,
    pub min_words_contributed: Option<u64>,
    pub max_contributors: usize,
}

impl SelectionRules {
    pub fn from_config(config: &ContributorsTableConfig) -> Self {
        Self {
            excluded_account: config.excluded_account.clone(),
            min_words_contributed: config.min_words_contributed,
            max_contributors: config.max_contributors,
        }
    }

    pub fn qualifies(&self, record: &RawContributionRecord) -> bool {
        if record.user.username == self.excluded_account {
            return false;
        }
        match self.min_words_contributed {
            Some(minimum) => record.words() >= minimum,
            None => true,
        }
    }

    /// Qualifying rows in report order, cut at the cap. This is a prefix of the
    /// filtered rows, not a top-K by score.
    pub fn shortlist<'a>(
        &self,
        records: &'a [RawContributionRecord],
    ) -> Vec<&'a RawContributionRecord> {
        records
            .iter()
            .filter(|record| self.qualifies(record))
            .take(self.max_contributors)
            .collect()
    }
}

/// Applies the selection rules and attaches an avatar to each survivor.
#[derive(Debug, Clone)]
pub struct ContributorSelector {
    gateway: Arc<dyn ReportGateway>,
    rules: SelectionRules,
}

impl ContributorSelector {
    pub fn new(gateway: Arc<dyn ReportGateway>, config: &ContributorsTableConfig) -> Self {
        Self {
            gateway,
            rules: SelectionRules::from_config(config),
        }
    }

    pub fn rules(&self) -> &SelectionRules {
        &self.rules
    }

    /// Avatar lookups run one at a time, in report order, only for shortlisted rows.
    pub async fn select(&self, records: &[RawContributionRecord]) -> ContributorList {
        let shortlist = self.rules.shortlist(records);
        let mut selected = ContributorList::with_capacity(shortlist.len());

        for record in shortlist {
            let picture = self.lookup_avatar(record.user.id).await;
            selected.push(Contributor::from_record(record, picture));
        }

        info!(
            selected = selected.len(),
            rows = records.len(),
            "contributors selected"
        );
        selected
    }

    async fn lookup_avatar(&self, user_id: u64) -> AvatarLookup {
        match self.gateway.member_avatar(user_id).await {
            Ok(url) => AvatarLookup::Found(url),
            Err(err) => {
                debug!(user_id, reason = %err, "avatar unavailable, using placeholder");
                AvatarLookup::fallback()
            }
        }
    }
}

/// Offline selection: every contributor gets the placeholder avatar.
pub fn select_without_avatars(
    rules: &SelectionRules,
    records: &[RawContributionRecord],
) -> ContributorList {
    rules
        .shortlist(records)
        .into_iter()
        .map(|record| Contributor::from_record(record, AvatarLookup::fallback()))
        .collect()
}
