//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the swipe UI and the service.

use matcher_core::{Candidate, Location, Role, SessionRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests FROM the Client
//=========================================================================================

/// Form input for creating a matching. Every field is optional so that missing
/// inputs surface as validation errors instead of body rejections.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateMatchingRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Search radius in meters.
    pub radius: Option<f64>,
}

impl CreateMatchingRequest {
    pub fn into_session_request(self) -> matcher_core::MatchResult<SessionRequest> {
        let location = match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(Location::new(longitude, latitude)?),
            _ => None,
        };
        Ok(SessionRequest {
            location,
            radius_m: self.radius,
        })
    }
}

/// A session code typed in by the joining participant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinMatchingRequest {
    pub matching_id: String,
}

/// One local swipe decision.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwipeRequest {
    pub candidate_id: Uuid,
    pub liked: bool,
}

/// The counterpart's full ledger, replacing whatever was applied before.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CounterpartSwipesRequest {
    pub swipes: BTreeMap<Uuid, bool>,
}

//=========================================================================================
// Responses TO the Client
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CandidateView {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    /// `[longitude, latitude]`
    pub location: Vec<f64>,
    pub place_id: String,
    pub rating: Option<f32>,
    pub photos: Option<Vec<String>>,
}

impl From<&Candidate> for CandidateView {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name.clone(),
            address: candidate.address.clone(),
            location: vec![candidate.location.longitude(), candidate.location.latitude()],
            place_id: candidate.place_id.clone(),
            rating: candidate.rating,
            photos: candidate.photos.clone(),
        }
    }
}

/// Sent after a matching was created and populated.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMatchingResponse {
    pub matching_id: String,
    pub candidates: Vec<CandidateView>,
}

/// The local participant's view of the active matching.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveMatchingResponse {
    pub matching_id: Option<String>,
    /// `initiator`, `joiner`, or absent.
    pub role: Option<String>,
    pub candidates: Vec<CandidateView>,
    pub matches: Vec<Uuid>,
}

/// The current match set after a ledger change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchesResponse {
    pub matches: Vec<Uuid>,
}

/// Candidates liked by both participants.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchedCandidatesResponse {
    pub matches: Vec<CandidateView>,
}

pub fn role_name(role: Option<Role>) -> Option<String> {
    role.map(|role| match role {
        Role::Initiator => "initiator".to_string(),
        Role::Joiner => "joiner".to_string(),
    })
}
