use std::sync::Arc;

use super::common::*;
use crate::config::ContributorsTableConfig;
use crate::workflows::contributors::domain::DEFAULT_AVATAR_URL;
use crate::workflows::contributors::selector::ContributorSelector;

fn table(max_contributors: usize, min_words_contributed: Option<u64>) -> ContributorsTableConfig {
    ContributorsTableConfig {
        max_contributors,
        min_words_contributed,
        ..ContributorsTableConfig::default()
    }
}

#[tokio::test]
async fn skips_removed_accounts_and_keeps_report_order() {
    let gateway = Arc::new(FakeGateway::default());
    let selector = ContributorSelector::new(gateway, &table(10, None));
    let records = vec![
        record(1, "ana", 5, 0),
        record(2, "REMOVED_USER", 900, 0),
        record(3, "bo", 50, 50),
    ];

    let selected = selector.select(&records).await;

    let ids: Vec<u64> = selected.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(selected.iter().all(|c| c.username != "REMOVED_USER"));
}

#[tokio::test]
async fn threshold_applies_to_translated_plus_approved() {
    let gateway = Arc::new(FakeGateway::default());
    let selector = ContributorSelector::new(gateway, &table(10, Some(100)));
    let records = vec![
        record(1, "ana", 60, 40),
        record(2, "bo", 99, 0),
        record(3, "cy", 0, 150),
    ];

    let selected = selector.select(&records).await;

    let ids: Vec<u64> = selected.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(selected.iter().all(|c| c.words() >= 100));
}

#[tokio::test]
async fn cap_takes_a_prefix_and_stops_looking_up_avatars() {
    let gateway = Arc::new(FakeGateway::default());
    let selector = ContributorSelector::new(gateway.clone(), &table(2, Some(10)));
    let records = vec![
        record(1, "ana", 10, 0),
        record(2, "bo", 1, 0),
        record(3, "cy", 20, 0),
        record(4, "di", 9_000, 0),
    ];

    let selected = selector.select(&records).await;

    let ids: Vec<u64> = selected.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 3], "selection is a prefix, not a top-K");
    assert_eq!(gateway.avatar_lookups(), vec![1, 3]);
}

#[tokio::test]
async fn avatar_not_found_falls_back_to_placeholder() {
    let gateway = Arc::new(FakeGateway::default().with_avatar(1, "https://avatars.example/ana.png"));
    let selector = ContributorSelector::new(gateway, &table(10, None));
    let records = vec![record(1, "ana", 1, 0), record(2, "private", 1, 0)];

    let selected = selector.select(&records).await;

    assert_eq!(selected[0].picture, "https://avatars.example/ana.png");
    assert_eq!(selected[1].picture, DEFAULT_AVATAR_URL);
    assert_eq!(selected[0].name, "ana full");
}
