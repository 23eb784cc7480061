mod common;

use std::time::Duration;

use ordex_service::HistoryAggregator;
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(2);

fn client() -> reqwest::Client {
    reqwest::Client::builder().timeout(TIMEOUT).build().unwrap()
}

#[tokio::test]
async fn overlapping_orders_are_deduplicated_first_seen() {
    let first = common::spawn(common::sibling_stub(json!([
        common::sibling_order(1, "alice-1"),
    ])))
    .await;
    let second = common::spawn(common::sibling_stub(json!([
        common::sibling_order(1, "alice-1"),
        common::sibling_order(2, "alice-2"),
    ])))
    .await;

    let aggregator = HistoryAggregator::new(vec![first, second], client());
    let orders = aggregator.history_for("alice").await;
    let ids: Vec<_> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, ["alice-1", "alice-2"]);
}

#[tokio::test]
async fn other_users_orders_are_filtered_out() {
    let sibling = common::spawn(common::sibling_stub(json!([
        common::sibling_order(1, "alice-1"),
        common::sibling_order(2, "bob-1"),
        common::sibling_order(3, "alice-7"),
    ])))
    .await;

    let aggregator = HistoryAggregator::new(vec![sibling], client());
    let orders = aggregator.history_for("alice").await;
    let ids: Vec<_> = orders.iter().map(|o| o.order_id.as_str()).collect();
    assert_eq!(ids, ["alice-1", "alice-7"]);
}

#[tokio::test]
async fn unreachable_sibling_yields_partial_results() {
    let reachable = common::spawn(common::sibling_stub(json!([
        common::sibling_order(1, "alice-1"),
    ])))
    .await;

    let aggregator = HistoryAggregator::new(
        vec!["http://127.0.0.1:1".into(), reachable],
        client(),
    );
    let orders = aggregator.history_for("alice").await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_id, "alice-1");
}

#[tokio::test]
async fn no_reachable_siblings_yields_empty_history() {
    let aggregator = HistoryAggregator::new(vec!["http://127.0.0.1:1".into()], client());
    assert!(aggregator.history_for("alice").await.is_empty());
}
