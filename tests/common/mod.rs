// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::{routing::get, Json, Router};
use job_offers::config::Config;
use job_offers::db::{FirestoreDb, MemoryDb};
use job_offers::routes::create_router;
use job_offers::services::{
    AuthService, HttpOfferFetcher, OfferFacade, OfferScheduler, OfferService,
};
use job_offers::AppState;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Remote offer source served from a local port.
///
/// Whatever is in `offers` is returned by `GET /offers`.
#[derive(Clone)]
pub struct FakeOfferSource {
    pub base_url: String,
    offers: Arc<Mutex<Vec<Value>>>,
}

#[allow(dead_code)]
impl FakeOfferSource {
    pub async fn start() -> Self {
        let offers: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let served = offers.clone();

        let app = Router::new().route(
            "/offers",
            get(move || {
                let served = served.clone();
                async move { Json(served.lock().unwrap().clone()) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            offers,
        }
    }

    /// Replace the list served to the next fetch.
    pub fn set_offers(&self, offers: Vec<Value>) {
        *self.offers.lock().unwrap() = offers;
    }
}

/// One offer in the remote source's wire format.
#[allow(dead_code)]
pub fn remote_offer(title: &str, company: &str, salary: &str, url: &str) -> Value {
    json!({
        "title": title,
        "company": company,
        "salary": salary,
        "offerUrl": url,
    })
}

/// Everything a test needs to drive the application.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub scheduler: OfferScheduler,
    pub source: FakeOfferSource,
}

/// Create a test app backed by the in-memory store and a fake offer source.
/// The scheduler is returned unstarted so tests can run cycles on demand.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let source = FakeOfferSource::start().await;
    let config = Config {
        offers_http_url: source.base_url.clone(),
        ..Config::default()
    };

    let db = MemoryDb::new();
    let fetcher = HttpOfferFetcher::new(
        &config.offers_http_url,
        config.offers_http_connect_timeout,
        config.offers_http_request_timeout,
    )
    .unwrap();

    let offer_repository = Arc::new(db.clone());
    let offer_service = OfferService::new(Arc::new(fetcher), offer_repository.clone());
    let offer_facade = OfferFacade::new(offer_repository, offer_service);
    let auth_service = AuthService::new(Arc::new(db), &config);
    let scheduler = OfferScheduler::new(offer_facade.clone(), Duration::from_secs(3600));

    let state = Arc::new(AppState {
        config,
        offer_facade,
        auth_service,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        scheduler,
        source,
    }
}

/// Send a JSON request and return the status and the decoded body.
/// An empty body decodes as `Value::Null`.
#[allow(dead_code)]
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Register `username` and return a bearer token for it.
#[allow(dead_code)]
pub async fn register_and_login(app: &Router, username: &str, password: &str) -> String {
    let credentials = json!({ "username": username, "password": password });

    let (status, _) = send_json(app, "POST", "/register", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(app, "POST", "/token", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}
