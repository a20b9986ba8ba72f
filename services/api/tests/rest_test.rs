//! Router-level tests driving the REST API with an in-memory store and a
//! canned restaurant provider.

use api_lib::config::Config;
use api_lib::web::protocol::{
    ActiveMatchingResponse, CreateMatchingResponse, MatchedCandidatesResponse, MatchesResponse,
};
use api_lib::web::{router, AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use matcher_core::{
    CandidateListing, CandidateProvider, Location, MatchingContext, MemoryStorage, PortError,
    PortResult,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceExt;

struct CannedProvider {
    names: Vec<&'static str>,
}

#[async_trait]
impl CandidateProvider for CannedProvider {
    async fn search(
        &self,
        location: Location,
        _radius_m: f64,
        limit: usize,
    ) -> PortResult<Vec<CandidateListing>> {
        if self.names.is_empty() {
            return Err(PortError::Unavailable("upstream down".to_string()));
        }
        Ok(self
            .names
            .iter()
            .take(limit)
            .map(|name| CandidateListing {
                external_id: format!("place-{}", name),
                name: name.to_string(),
                address: "Somewhere".to_string(),
                location,
                rating: None,
                photo_refs: None,
            })
            .collect())
    }
}

/// Signals when a search starts, then waits to be released.
struct GatedProvider {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl CandidateProvider for GatedProvider {
    async fn search(
        &self,
        location: Location,
        radius_m: f64,
        limit: usize,
    ) -> PortResult<Vec<CandidateListing>> {
        self.entered.notify_one();
        self.release.notified().await;
        CannedProvider { names: vec!["R1"] }
            .search(location, radius_m, limit)
            .await
    }
}

async fn app_with_provider(provider: Arc<dyn CandidateProvider>) -> Router {
    let config = Arc::new(Config::from_lookup(|_| None).unwrap());
    let matcher = MatchingContext::open(Arc::new(MemoryStorage::new())).await;
    router(Arc::new(AppState::new(matcher, provider, config)))
}

async fn app_with(names: Vec<&'static str>) -> Router {
    app_with_provider(Arc::new(CannedProvider { names })).await
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn create_swipe_and_match() {
    let app = app_with(vec!["R1", "R2", "R3"]).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/matchings",
        Some(json!({ "latitude": 37.8, "longitude": -122.4, "radius": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: CreateMatchingResponse = parse(&body);
    assert_eq!(created.matching_id.len(), 4);
    assert_eq!(created.candidates.len(), 3);
    let ids: Vec<_> = created.candidates.iter().map(|c| c.id).collect();

    let (status, body) = call(&app, Method::GET, "/matchings/active", None).await;
    assert_eq!(status, StatusCode::OK);
    let active: ActiveMatchingResponse = parse(&body);
    assert_eq!(active.matching_id.as_deref(), Some(created.matching_id.as_str()));
    assert_eq!(active.role.as_deref(), Some("initiator"));

    for (id, liked) in [(ids[0], true), (ids[1], false)] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/swipes",
            Some(json!({ "candidate_id": id, "liked": liked })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut swipes = serde_json::Map::new();
    swipes.insert(ids[0].to_string(), json!(true));
    swipes.insert(ids[2].to_string(), json!(true));
    let (status, body) = call(
        &app,
        Method::PUT,
        "/counterpart-swipes",
        Some(json!({ "swipes": swipes })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let matches: MatchesResponse = parse(&body);
    assert_eq!(matches.matches, vec![ids[0]]);

    let (status, body) = call(&app, Method::GET, "/matches", None).await;
    assert_eq!(status, StatusCode::OK);
    let matched: MatchedCandidatesResponse = parse(&body);
    assert_eq!(matched.matches.len(), 1);
    assert_eq!(matched.matches[0].name, "R1");
}

#[tokio::test]
async fn missing_location_is_a_bad_request() {
    let app = app_with(vec!["R1"]).await;
    let (status, _) = call(&app, Method::POST, "/matchings", Some(json!({ "radius": 1000 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::GET, "/matchings/active", None).await;
    let active: ActiveMatchingResponse = parse(&body);
    assert_eq!(active.matching_id, None);
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway() {
    let app = app_with(Vec::new()).await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/matchings",
        Some(json!({ "latitude": 37.8, "longitude": -122.4, "radius": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn join_distinguishes_malformed_from_unknown_codes() {
    let app = app_with(vec!["R1"]).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/matchings/join",
        Some(json!({ "matching_id": "1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/matchings/join",
        Some(json!({ "matching_id": "9999" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn activate_then_clear() {
    let app = app_with(vec!["R1", "R2"]).await;
    let (_, body) = call(
        &app,
        Method::POST,
        "/matchings",
        Some(json!({ "latitude": 48.85, "longitude": 2.35, "radius": 500 })),
    )
    .await;
    let created: CreateMatchingResponse = parse(&body);

    let (status, _) = call(&app, Method::DELETE, "/matchings/active", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/swipes",
        Some(json!({ "candidate_id": created.candidates[0].id, "liked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/matchings/{}/activate", created.matching_id);
    let (status, body) = call(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let active: ActiveMatchingResponse = parse(&body);
    assert_eq!(active.role.as_deref(), Some("initiator"));
    assert_eq!(active.candidates.len(), 2);
    assert!(active.matches.is_empty());

    let (status, _) = call(&app, Method::POST, "/matchings/abcd/activate", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn slow_search_does_not_block_other_requests() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let app = app_with_provider(Arc::new(GatedProvider {
        entered: entered.clone(),
        release: release.clone(),
    }))
    .await;

    let creating = {
        let app = app.clone();
        tokio::spawn(async move {
            call(
                &app,
                Method::POST,
                "/matchings",
                Some(json!({ "latitude": 37.8, "longitude": -122.4, "radius": 1000 })),
            )
            .await
        })
    };
    entered.notified().await;

    let (status, _) = tokio::time::timeout(
        Duration::from_secs(5),
        call(&app, Method::GET, "/matchings/active", None),
    )
    .await
    .expect("active matching lookup waited on the search");
    assert_eq!(status, StatusCode::OK);

    release.notify_one();
    let (status, _) = creating.await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
}
