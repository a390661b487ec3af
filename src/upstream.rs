//! Upstream weather client
//!
//! Batches base-point coordinates into grouped requests against the
//! Open-Meteo forecast API and parses the responses into per-point raw
//! observations. The provider is abstracted behind the [`WeatherProvider`]
//! trait so the poll orchestrator can be exercised without the network.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::registry::BasePoint;
use crate::RawObservation;

/// Result type alias for upstream operations
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors that can occur while fetching a batch of observations.
///
/// Any failure fails the whole batch; partial batch results are never
/// returned. Retry policy is the caller's concern.
#[derive(Debug)]
pub enum UpstreamError {
    /// The HTTP request itself failed (connect, timeout, TLS)
    Request(reqwest::Error),

    /// The provider answered with a non-success status
    Status(u16),

    /// The response body could not be decoded
    Decode(String),

    /// The response did not align positionally with the request
    ShapeMismatch { expected: usize, got: usize },
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Request(err) => write!(f, "upstream request failed: {}", err),
            UpstreamError::Status(code) => write!(f, "upstream returned HTTP {}", code),
            UpstreamError::Decode(msg) => write!(f, "failed to decode upstream response: {}", msg),
            UpstreamError::ShapeMismatch { expected, got } => write!(
                f,
                "upstream response misaligned: expected {} payloads, got {}",
                expected, got
            ),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Request(err)
    }
}

/// Source of raw weather observations for batches of base points.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch observations for the given points, in input order.
    ///
    /// Points whose temperature or humidity is unavailable are simply absent
    /// from the result; there are no placeholder entries. Any transport or
    /// decode failure fails the whole batch.
    async fn fetch_batch(&self, points: &[BasePoint]) -> UpstreamResult<Vec<RawObservation>>;
}

// ============================================================================
// Open-Meteo wire models
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastPayload {
    current_weather: Option<CurrentWeather>,
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    relativehumidity_2m: Vec<Option<f64>>,
}

/// The provider returns a bare object for a batch of one and an array
/// otherwise; normalize both shapes into a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MaybeBatch {
    Many(Vec<ForecastPayload>),
    One(Box<ForecastPayload>),
}

impl MaybeBatch {
    fn into_list(self) -> Vec<ForecastPayload> {
        match self {
            MaybeBatch::Many(list) => list,
            MaybeBatch::One(single) => vec![*single],
        }
    }
}

/// Open-Meteo forecast client.
///
/// Reuses a single HTTP client across requests. Coordinates are comma-joined
/// onto one URL per batch, so responses align positionally with the request
/// list.
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn batch_url(&self, points: &[BasePoint]) -> String {
        let latitudes: Vec<String> = points.iter().map(|p| p.lat.to_string()).collect();
        let longitudes: Vec<String> = points.iter().map(|p| p.lon.to_string()).collect();

        format!(
            "{}?latitude={}&longitude={}&current_weather=true&hourly=relativehumidity_2m&timezone=auto",
            self.base_url,
            latitudes.join(","),
            longitudes.join(",")
        )
    }
}

/// Extract the observation for one point, or `None` if temperature or
/// humidity is unavailable (the point is skipped for this cycle).
fn observation_for(point: &BasePoint, payload: &ForecastPayload) -> Option<RawObservation> {
    let current = payload.current_weather.as_ref()?;
    let temp_c = current.temperature?;

    let hourly = payload.hourly.as_ref()?;
    let last = hourly.relativehumidity_2m.len().checked_sub(1)?;
    let relative_humidity = hourly.relativehumidity_2m[last]?;
    let observed_at = hourly.time.get(last).cloned();

    Some(RawObservation {
        point_id: point.id.clone(),
        temp_c,
        relative_humidity,
        is_daylight: current.is_day.map(|d| d != 0),
        observed_at,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn fetch_batch(&self, points: &[BasePoint]) -> UpstreamResult<Vec<RawObservation>> {
        if points.is_empty() {
            return Ok(vec![]);
        }

        let url = self.batch_url(points);
        trace!("requesting forecast batch: {url}");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let payloads = serde_json::from_str::<MaybeBatch>(&body)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?
            .into_list();

        if payloads.len() != points.len() {
            return Err(UpstreamError::ShapeMismatch {
                expected: points.len(),
                got: payloads.len(),
            });
        }

        let observations: Vec<RawObservation> = points
            .iter()
            .zip(payloads.iter())
            .filter_map(|(point, payload)| {
                let obs = observation_for(point, payload);
                if obs.is_none() {
                    debug!("skipping {}: incomplete observation", point.id);
                }
                obs
            })
            .collect();

        trace!(
            "batch of {} produced {} observations",
            points.len(),
            observations.len()
        );

        Ok(observations)
    }
}
