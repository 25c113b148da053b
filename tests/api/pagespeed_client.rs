use std::collections::HashMap;

use pagespeed_report::{
    domain::{MetricValue, Stage},
    services::{MetricSource, PageSpeedClient},
};
use serde_json::json;
use url::Url;

use crate::helpers::{closed_endpoint, lab_only_response, spawn_mock_pagespeed, MockResponse};

#[tokio::test]
async fn bare_domain_is_requested_over_https() {
    let mock = spawn_mock_pagespeed(MockResponse::json(lab_only_response()), HashMap::new());

    mock.client("test-key").fetch_metrics("example.com").await;

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["url"], "https://example.com");
    assert_eq!(requests[0]["strategy"], "mobile");
    assert_eq!(requests[0]["key"], "test-key");
}

#[tokio::test]
async fn url_with_query_string_is_encoded() {
    let mock = spawn_mock_pagespeed(MockResponse::json(lab_only_response()), HashMap::new());

    mock.client("test-key")
        .fetch_metrics("http://example.com/shop?item=1&color=red")
        .await;

    assert_eq!(
        mock.requests()[0]["url"],
        "http://example.com/shop?item=1&color=red"
    );
}

#[tokio::test]
async fn empty_api_key_is_not_sent() {
    let mock = spawn_mock_pagespeed(MockResponse::json(lab_only_response()), HashMap::new());

    mock.client("").fetch_metrics("example.com").await;

    assert!(!mock.requests()[0].contains_key("key"));
}

#[tokio::test]
async fn lab_only_response_fills_lab_metrics() {
    let mock = spawn_mock_pagespeed(MockResponse::json(lab_only_response()), HashMap::new());

    let record = mock.client("test-key").fetch_metrics("example.com").await;
    let row = record.to_row();

    assert_eq!(row["url"], "https://example.com");
    assert_eq!(row["lighthouse_lcp"], "1200");
    assert_eq!(row["lighthouse_fcp"], "800");
    assert_eq!(row["lighthouse_cls"], "0.05");
    assert_eq!(row["lighthouse_performance_score"], "91");
    for (field, value) in record.iter() {
        if field.stage != Stage::Lab {
            assert_eq!(value, &MetricValue::Unavailable, "{}", field.name);
            assert_eq!(row[&field.name], "N/A");
        }
    }
}

#[tokio::test]
async fn network_failure_yields_unavailable_record() {
    let client = PageSpeedClient::new(
        reqwest::Client::new(),
        Url::parse(&closed_endpoint()).unwrap(),
        "mobile".to_string(),
        "test-key".to_string(),
    );

    let record = client.fetch_metrics("example.com").await;

    assert_eq!(record.url(), "https://example.com");
    assert!(record.all_unavailable());
}

#[tokio::test]
async fn non_json_body_yields_unavailable_record() {
    let mock = spawn_mock_pagespeed(MockResponse::raw(200, "<html>oops</html>"), HashMap::new());

    let record = mock.client("test-key").fetch_metrics("https://example.com").await;

    assert_eq!(record.url(), "https://example.com");
    assert!(record.all_unavailable());
}

#[tokio::test]
async fn error_status_yields_unavailable_record() {
    let body = json!({
        "error": { "code": 500, "message": "Lighthouse returned error: NO_FCP" }
    });
    let mock = spawn_mock_pagespeed(MockResponse::raw(500, &body.to_string()), HashMap::new());

    let record = mock.client("test-key").fetch_metrics("example.com").await;

    assert!(record.all_unavailable());
    assert_eq!(mock.requests().len(), 1);
}
