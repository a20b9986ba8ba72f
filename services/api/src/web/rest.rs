//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints, the router that
//! wires them together, and the master definition for the OpenAPI specification.

use crate::web::protocol::{
    role_name, ActiveMatchingResponse, CandidateView, CounterpartSwipesRequest,
    CreateMatchingRequest, CreateMatchingResponse, JoinMatchingRequest, MatchedCandidatesResponse,
    MatchesResponse, SwipeRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use matcher_core::{search_candidates, MatchError, SessionCode};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_matching_handler,
        join_matching_handler,
        activate_matching_handler,
        active_matching_handler,
        clear_active_matching_handler,
        swipe_handler,
        counterpart_swipes_handler,
        matches_handler,
    ),
    components(
        schemas(
            CreateMatchingRequest,
            CreateMatchingResponse,
            JoinMatchingRequest,
            SwipeRequest,
            CounterpartSwipesRequest,
            CandidateView,
            ActiveMatchingResponse,
            MatchesResponse,
            MatchedCandidatesResponse,
        )
    ),
    tags(
        (name = "Restaurant Matcher API", description = "Create, join and swipe on shared restaurant matchings.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/matchings", post(create_matching_handler))
        .route("/matchings/join", post(join_matching_handler))
        .route("/matchings/{code}/activate", post(activate_matching_handler))
        .route(
            "/matchings/active",
            get(active_matching_handler).delete(clear_active_matching_handler),
        )
        .route("/swipes", post(swipe_handler))
        .route("/counterpart-swipes", put(counterpart_swipes_handler))
        .route("/matches", get(matches_handler))
        .with_state(app_state)
}

//=========================================================================================
// Error Mapping
//=========================================================================================

type HandlerError = (StatusCode, String);

fn reject(err: MatchError) -> HandlerError {
    let status = match &err {
        MatchError::Validation(_) => StatusCode::BAD_REQUEST,
        MatchError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchError::Provider(_) => StatusCode::BAD_GATEWAY,
        MatchError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    (status, err.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a matching around a location.
///
/// Searches for restaurants first; no matching is created if the search fails
/// or finds nothing.
#[utoipa::path(
    post,
    path = "/matchings",
    request_body = CreateMatchingRequest,
    responses(
        (status = 201, description = "Matching created and populated", body = CreateMatchingResponse),
        (status = 400, description = "Missing or invalid location or radius"),
        (status = 502, description = "Restaurant search failed or found nothing")
    )
)]
pub async fn create_matching_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateMatchingRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let request = payload.into_session_request().map_err(reject)?;
    let draft = search_candidates(
        request,
        app_state.provider.as_ref(),
        app_state.config.candidate_limit,
    )
    .await
    .map_err(reject)?;

    let mut matcher = app_state.matcher.lock().await;
    let code = matcher.create_from_draft(draft).await;

    info!("Matching {} created", code);
    let response = CreateMatchingResponse {
        matching_id: code.to_string(),
        candidates: matcher.active_candidates().iter().map(CandidateView::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Join a matching by its 4-digit code.
#[utoipa::path(
    post,
    path = "/matchings/join",
    request_body = JoinMatchingRequest,
    responses(
        (status = 200, description = "Joined; the matching is now active", body = ActiveMatchingResponse),
        (status = 400, description = "Malformed matching code"),
        (status = 404, description = "No matching with that code")
    )
)]
pub async fn join_matching_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<JoinMatchingRequest>,
) -> Result<Json<ActiveMatchingResponse>, HandlerError> {
    let mut matcher = app_state.matcher.lock().await;
    matcher
        .join_by_code(&payload.matching_id)
        .await
        .map_err(reject)?;
    Ok(Json(active_view(&matcher)))
}

/// Make an already known matching the active one.
#[utoipa::path(
    post,
    path = "/matchings/{code}/activate",
    params(
        ("code" = String, Path, description = "The 4-digit matching code.")
    ),
    responses(
        (status = 200, description = "Matching activated with fresh ledgers", body = ActiveMatchingResponse),
        (status = 400, description = "Malformed matching code"),
        (status = 404, description = "No matching with that code")
    )
)]
pub async fn activate_matching_handler(
    State(app_state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<ActiveMatchingResponse>, HandlerError> {
    let code = SessionCode::parse(&code).map_err(reject)?;
    let mut matcher = app_state.matcher.lock().await;
    matcher.select_active_session(&code).await.map_err(reject)?;
    Ok(Json(active_view(&matcher)))
}

/// Show the active matching, its candidates and the current match set.
#[utoipa::path(
    get,
    path = "/matchings/active",
    responses(
        (status = 200, description = "The active matching, if any", body = ActiveMatchingResponse)
    )
)]
pub async fn active_matching_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<ActiveMatchingResponse> {
    let matcher = app_state.matcher.lock().await;
    Json(active_view(&matcher))
}

/// Leave the active matching without changing its membership.
#[utoipa::path(
    delete,
    path = "/matchings/active",
    responses(
        (status = 204, description = "No matching is active any more")
    )
)]
pub async fn clear_active_matching_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    app_state.matcher.lock().await.clear_active_session();
    StatusCode::NO_CONTENT
}

/// Record a local swipe on a candidate of the active matching.
#[utoipa::path(
    post,
    path = "/swipes",
    request_body = SwipeRequest,
    responses(
        (status = 200, description = "Swipe recorded; current match set", body = MatchesResponse),
        (status = 409, description = "No matching is active")
    )
)]
pub async fn swipe_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<SwipeRequest>,
) -> Result<Json<MatchesResponse>, HandlerError> {
    let mut matcher = app_state.matcher.lock().await;
    if matcher.active_code().is_none() {
        return Err((StatusCode::CONFLICT, "No matching is active".to_string()));
    }
    let matches = matcher.record_swipe(payload.candidate_id, payload.liked);
    Ok(Json(MatchesResponse { matches }))
}

/// Replace the counterpart's ledger for the active matching.
#[utoipa::path(
    put,
    path = "/counterpart-swipes",
    request_body = CounterpartSwipesRequest,
    responses(
        (status = 200, description = "Ledger applied; current match set", body = MatchesResponse),
        (status = 409, description = "No matching is active")
    )
)]
pub async fn counterpart_swipes_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CounterpartSwipesRequest>,
) -> Result<Json<MatchesResponse>, HandlerError> {
    let mut matcher = app_state.matcher.lock().await;
    if matcher.active_code().is_none() {
        return Err((StatusCode::CONFLICT, "No matching is active".to_string()));
    }
    let matches = matcher.apply_counterpart_swipes(payload.swipes);
    Ok(Json(MatchesResponse { matches }))
}

/// List the restaurants both participants liked.
#[utoipa::path(
    get,
    path = "/matches",
    responses(
        (status = 200, description = "Matched restaurants in match order", body = MatchedCandidatesResponse)
    )
)]
pub async fn matches_handler(
    State(app_state): State<Arc<AppState>>,
) -> Json<MatchedCandidatesResponse> {
    let matcher = app_state.matcher.lock().await;
    Json(MatchedCandidatesResponse {
        matches: matcher
            .matched_candidates()
            .into_iter()
            .map(CandidateView::from)
            .collect(),
    })
}

fn active_view(matcher: &matcher_core::MatchingContext) -> ActiveMatchingResponse {
    ActiveMatchingResponse {
        matching_id: matcher.active_code().map(|code| code.to_string()),
        role: role_name(matcher.role()),
        candidates: matcher
            .active_candidates()
            .iter()
            .map(CandidateView::from)
            .collect(),
        matches: matcher.matches().to_vec(),
    }
}
