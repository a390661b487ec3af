pub mod actors;
pub mod api;
pub mod config;
pub mod heat;
pub mod registry;
pub mod upstream;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::heat::RiskTier;
use crate::registry::{BasePoint, SyntheticPoint};

/// Round a coordinate to four decimal places for transport.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Upstream data for one base point at one poll cycle.
///
/// Produced by the upstream client. Points whose temperature or humidity is
/// unavailable are skipped at the client, so every observation here is
/// complete enough to derive metrics from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Id of the base point this observation belongs to
    pub point_id: String,

    /// Current air temperature in °C
    pub temp_c: f64,

    /// Latest relative humidity sample in percent (0-100)
    pub relative_humidity: f64,

    /// Whether the provider reports daylight at the point, if known
    pub is_daylight: Option<bool>,

    /// Provider-local timestamp of the humidity sample, passed through verbatim
    pub observed_at: Option<String>,
}

/// The emitted, user-facing record for one point at one point in time.
///
/// Immutable once constructed. Synthetic-point events are derived from their
/// base event by substituting identity and location fields only; all measured
/// and derived metrics are copied verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatEvent {
    pub point_id: String,
    pub display_name: String,

    /// Rounded to four decimal places for transport
    pub lat: f64,
    pub lon: f64,

    pub temp_c: f64,
    pub relative_humidity: f64,

    pub heat_index_c: f64,
    pub heat_weight: f64,
    pub risk_tier: RiskTier,
    pub is_official_heatwave: bool,

    pub is_daylight: Option<bool>,
    pub humidity_sample_time: Option<String>,

    pub is_synthetic: bool,
    pub emitted_at: DateTime<Utc>,
}

impl HeatEvent {
    /// Build the base event for a point from its raw observation and the
    /// derived metrics.
    pub fn from_observation(point: &BasePoint, obs: &RawObservation) -> Self {
        let heat_index_c = heat::heat_index_c(obs.temp_c, obs.relative_humidity);
        let risk_tier = heat::classify_risk(heat_index_c);

        Self {
            point_id: point.id.clone(),
            display_name: point.name.clone(),
            lat: round4(point.lat),
            lon: round4(point.lon),
            temp_c: obs.temp_c,
            relative_humidity: obs.relative_humidity,
            heat_index_c,
            heat_weight: heat::heat_weight(heat_index_c, risk_tier),
            risk_tier,
            is_official_heatwave: heat::is_official_heatwave(point.terrain, obs.temp_c),
            is_daylight: obs.is_daylight,
            humidity_sample_time: obs.observed_at.clone(),
            is_synthetic: false,
            emitted_at: Utc::now(),
        }
    }

    /// Derive the event for a synthetic sibling of this base event.
    ///
    /// Identity and location come from the synthetic point; every measured and
    /// derived metric is copied from the base event. Synthetic points are not
    /// sampled independently.
    pub fn for_synthetic(&self, point: &SyntheticPoint) -> Self {
        Self {
            point_id: point.id.clone(),
            display_name: point.name.clone(),
            lat: round4(point.lat),
            lon: round4(point.lon),
            is_synthetic: true,
            ..self.clone()
        }
    }

    /// Whether this event qualifies for the live push feed.
    ///
    /// Only base events are ever published; synthetic events are stored for
    /// map coverage but kept off the feed so broadcast volume stays
    /// proportional to the number of real points.
    pub fn qualifies_for_push(&self) -> bool {
        self.is_official_heatwave || self.risk_tier >= RiskTier::ExtremeCaution
    }
}
