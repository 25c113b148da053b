use std::{
    collections::HashMap,
    net::TcpListener,
    path::Path,
    sync::{Arc, Mutex},
};

use actix_web::{http::StatusCode, web, App, HttpResponse, HttpServer};
use pagespeed_report::{
    configuration::{
        ApiKeySettings, ApplicationSettings, PageSpeedSettings, PassthroughColumn,
        RateLimitSettings, ReportSettings, Settings,
    },
    services::PageSpeedClient,
};
use serde_json::{json, Value};
use url::Url;

const RUN_PAGESPEED_PATH: &str = "/pagespeedonline/v5/runPagespeed";

#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(body: Value) -> Self {
        MockResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: &str) -> Self {
        MockResponse {
            status,
            body: body.to_string(),
        }
    }
}

type RecordedQueries = Arc<Mutex<Vec<HashMap<String, String>>>>;

struct MockState {
    default: MockResponse,
    by_url: HashMap<String, MockResponse>,
    requests: RecordedQueries,
}

pub struct MockPageSpeed {
    pub endpoint: String,
    requests: RecordedQueries,
}

impl MockPageSpeed {
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(&self, api_key: &str) -> PageSpeedClient {
        PageSpeedClient::new(
            reqwest::Client::new(),
            Url::parse(&self.endpoint).unwrap(),
            "mobile".to_string(),
            api_key.to_string(),
        )
    }
}

async fn run_pagespeed(
    query: web::Query<HashMap<String, String>>,
    state: web::Data<MockState>,
) -> HttpResponse {
    let query = query.into_inner();
    let response = query
        .get("url")
        .and_then(|url| state.by_url.get(url))
        .unwrap_or(&state.default)
        .clone();
    state.requests.lock().unwrap().push(query);

    HttpResponse::build(StatusCode::from_u16(response.status).unwrap())
        .content_type("application/json")
        .body(response.body)
}

/// Serves `runPagespeed` on a random local port. `by_url` overrides the
/// default answer for specific (already normalized) target urls.
pub fn spawn_mock_pagespeed(
    default: MockResponse,
    by_url: HashMap<String, MockResponse>,
) -> MockPageSpeed {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let requests: RecordedQueries = Arc::new(Mutex::new(vec![]));

    let state = web::Data::new(MockState {
        default,
        by_url,
        requests: requests.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route(RUN_PAGESPEED_PATH, web::get().to(run_pagespeed))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen on mock listener")
    .run();
    tokio::spawn(server);

    MockPageSpeed {
        endpoint: format!("http://127.0.0.1:{}{}", port, RUN_PAGESPEED_PATH),
        requests,
    }
}

/// Endpoint on a port nobody listens on.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, RUN_PAGESPEED_PATH)
}

pub fn lab_only_response() -> Value {
    json!({
        "lighthouseResult": {
            "audits": {
                "largest-contentful-paint": { "numericValue": 1200 },
                "first-contentful-paint": { "numericValue": 800 },
                "cumulative-layout-shift": { "numericValue": 0.05 }
            },
            "categories": { "performance": { "score": 0.91 } }
        }
    })
}

pub fn company_column() -> PassthroughColumn {
    PassthroughColumn {
        column: "Company".to_string(),
        field: "company".to_string(),
        title: "Company".to_string(),
    }
}

pub fn test_settings(endpoint: &str, input: &Path, output: &Path, batch_size: usize) -> Settings {
    Settings {
        application: ApplicationSettings {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            url_column: "website".to_string(),
        },
        pagespeed: PageSpeedSettings {
            endpoint: endpoint.to_string(),
            strategy: "mobile".to_string(),
            timeout_seconds: 5,
        },
        api_keys: ApiKeySettings {
            pagespeed: "test-key".to_string(),
        },
        rate_limit: RateLimitSettings {
            requests_per_window: 400,
            window_seconds: 0,
            batch_size,
        },
        report: ReportSettings {
            passthrough_columns: vec![company_column()],
        },
    }
}
