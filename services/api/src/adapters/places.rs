//! services/api/src/adapters/places.rs
//!
//! This module contains the adapter for the Google Places nearby search.
//! It implements the `CandidateProvider` port from the core crate.

use async_trait::async_trait;
use matcher_core::domain::{CandidateListing, Location};
use matcher_core::ports::{CandidateProvider, PortError, PortResult};
use serde::Deserialize;
use tracing::{debug, error, info};

//=========================================================================================
// Google Places Response Shapes
//=========================================================================================

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: Geometry,
    rating: Option<f32>,
    photos: Option<Vec<PlacePhoto>>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct PlacePhoto {
    photo_reference: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CandidateProvider` port using Google Places.
#[derive(Clone)]
pub struct GooglePlacesAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GooglePlacesAdapter {
    /// Creates a new `GooglePlacesAdapter`. Without an API key every search fails.
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

//=========================================================================================
// `CandidateProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl CandidateProvider for GooglePlacesAdapter {
    async fn search(
        &self,
        location: Location,
        radius_m: f64,
        limit: usize,
    ) -> PortResult<Vec<CandidateListing>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("GOOGLE_API_KEY is not configured");
            PortError::Unavailable("API key not configured".to_string())
        })?;

        info!(
            "Searching restaurants within {} m of ({}, {})",
            radius_m,
            location.latitude(),
            location.longitude()
        );
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                (
                    "location",
                    format!("{},{}", location.latitude(), location.longitude()),
                ),
                ("radius", radius_m.to_string()),
                ("type", "restaurant".to_string()),
                ("key", api_key.to_string()),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Places API responded with status {}: {}", status, body);
            return Err(PortError::Unexpected(format!(
                "Places API responded with status: {}",
                status
            )));
        }

        let body: PlacesResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.without_url().to_string()))?;
        into_listings(body, limit)
    }
}

/// Maps a decoded Places response onto candidate listings.
fn into_listings(body: PlacesResponse, limit: usize) -> PortResult<Vec<CandidateListing>> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(Vec::new()),
        other => {
            let detail = body.error_message.unwrap_or_else(|| "Unknown error".to_string());
            error!("Places API error: {} - {}", other, detail);
            return Err(PortError::Unexpected(format!(
                "Places API error: {} - {}",
                other, detail
            )));
        }
    }

    let listings = body
        .results
        .into_iter()
        .take(limit)
        .map(|place| {
            let location = Location::new(place.geometry.location.lng, place.geometry.location.lat)
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            Ok(CandidateListing {
                external_id: place.place_id,
                name: place.name,
                address: place.vicinity,
                location,
                rating: place.rating,
                photo_refs: place
                    .photos
                    .map(|photos| photos.into_iter().map(|p| p.photo_reference).collect()),
            })
        })
        .collect::<PortResult<Vec<_>>>()?;
    debug!("Places API returned {} usable result(s)", listings.len());
    Ok(listings)
}
