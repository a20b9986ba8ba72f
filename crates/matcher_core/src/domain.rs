//! crates/matcher_core/src/domain.rs
//!
//! Defines the core data structures for the matcher: sessions, candidates,
//! participant identities and the creation request.
//! Field names serialize in camelCase so persisted snapshots keep one shape.

use crate::code;
use crate::error::{MatchError, MatchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Locally generated identifier of a candidate within a session.
pub type CandidateId = Uuid;

//=========================================================================================
// Session Codes and Identities
//=========================================================================================

/// The short code two participants exchange out-of-band to share a session.
///
/// Only constructed through [`SessionCode::parse`] or [`SessionCode::generate`],
/// so every value satisfies the code validity predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    /// Validates user-entered text as a session code.
    pub fn parse(raw: &str) -> MatchResult<Self> {
        let trimmed = raw.trim();
        if code::is_valid(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(MatchError::Validation(format!(
                "'{}' is not a valid session code. Codes are 4 digits from 2 to 9.",
                raw
            )))
        }
    }

    /// Draws a fresh random code. Collisions are not checked.
    pub fn generate() -> Self {
        Self(code::generate())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionCode {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> Self {
        code.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A durable per-installation participant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ParticipantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The local participant's relationship to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Initiator,
    Joiner,
}

//=========================================================================================
// Location
//=========================================================================================

/// A geographic point, persisted as a `[longitude, latitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Location {
    longitude: f64,
    latitude: f64,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64) -> MatchResult<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(MatchError::Validation(format!(
                "Longitude {} is outside -180..180.",
                longitude
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(MatchError::Validation(format!(
                "Latitude {} is outside -90..90.",
                latitude
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

impl TryFrom<[f64; 2]> for Location {
    type Error = MatchError;

    fn try_from([longitude, latitude]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(longitude, latitude)
    }
}

impl From<Location> for [f64; 2] {
    fn from(location: Location) -> Self {
        [location.longitude, location.latitude]
    }
}

//=========================================================================================
// Candidates
//=========================================================================================

/// One search result as returned by a candidate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateListing {
    pub external_id: String,
    pub name: String,
    pub address: String,
    pub location: Location,
    pub rating: Option<f32>,
    pub photo_refs: Option<Vec<String>>,
}

/// One item being voted on within a session. Immutable once added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub address: String,
    pub location: Location,
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}

impl Candidate {
    /// Turns a provider listing into a candidate with a fresh local id.
    pub fn from_listing(listing: CandidateListing) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: listing.name,
            address: listing.address,
            location: listing.location,
            place_id: listing.external_id,
            rating: listing.rating,
            photos: listing.photo_refs,
        }
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

/// A shared swiping context (a "matching").
///
/// The candidate list, location and radius are write-once; only `joiner_ids`
/// grows over the session's life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionCode,
    pub location: Location,
    pub radius: f64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "restaurants", default)]
    pub candidates: Vec<Candidate>,
    pub initiator_id: ParticipantId,
    #[serde(default)]
    pub joiner_ids: Vec<ParticipantId>,
}

impl Session {
    pub fn new(
        id: SessionCode,
        location: Location,
        radius: f64,
        initiator_id: ParticipantId,
    ) -> Self {
        Self {
            id,
            location,
            radius,
            created_at: Utc::now(),
            candidates: Vec::new(),
            initiator_id,
            joiner_ids: Vec::new(),
        }
    }

    /// Derives a participant's role. The initiator check wins over membership.
    pub fn role_of(&self, participant: ParticipantId) -> Option<Role> {
        if self.initiator_id == participant {
            Some(Role::Initiator)
        } else if self.joiner_ids.contains(&participant) {
            Some(Role::Joiner)
        } else {
            None
        }
    }

    /// Records a joiner. Returns `false` if the identity had already joined.
    pub fn add_joiner(&mut self, participant: ParticipantId) -> bool {
        if self.joiner_ids.contains(&participant) {
            return false;
        }
        self.joiner_ids.push(participant);
        true
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }
}

//=========================================================================================
// Creation Input
//=========================================================================================

/// Session creation input as it arrives from a form; either field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionRequest {
    pub location: Option<Location>,
    pub radius_m: Option<f64>,
}

impl SessionRequest {
    pub fn new(location: Location, radius_m: f64) -> Self {
        Self {
            location: Some(location),
            radius_m: Some(radius_m),
        }
    }

    /// Checks that both inputs are present and usable.
    pub fn validate(&self) -> MatchResult<(Location, f64)> {
        let location = self.location.ok_or_else(|| {
            MatchError::Validation("A location is required to create a session.".to_string())
        })?;
        let radius = self.radius_m.ok_or_else(|| {
            MatchError::Validation("A search radius is required to create a session.".to_string())
        })?;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(MatchError::Validation(format!(
                "Search radius must be a positive number of meters, got {}.",
                radius
            )));
        }
        Ok((location, radius))
    }
}
