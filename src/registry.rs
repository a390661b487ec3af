//! Static catalog of monitored geographic points
//!
//! The registry holds the real administrative locations under observation
//! and derives a fixed ring of synthetic satellite points around each one
//! for denser map coverage. The full point set is computed once at process
//! start and is immutable for the process lifetime.

use serde::{Deserialize, Serialize};

/// Terrain classification of a monitored point, used for the official
/// heatwave threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainClass {
    Plain,
    Hilly,
}

/// A real administrative location under direct observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub terrain: TerrainClass,
}

/// A generated satellite point inheriting its base's terrain and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticPoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub terrain: TerrainClass,
    /// Back-reference to the owning base point (lookup only)
    pub base_id: String,
}

/// Catalog view of any monitored point, as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredPoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub terrain_class: TerrainClass,
    pub is_synthetic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
}

impl From<&BasePoint> for MonitoredPoint {
    fn from(point: &BasePoint) -> Self {
        Self {
            id: point.id.clone(),
            name: point.name.clone(),
            lat: point.lat,
            lon: point.lon,
            terrain_class: point.terrain,
            is_synthetic: false,
            base_id: None,
        }
    }
}

impl From<&SyntheticPoint> for MonitoredPoint {
    fn from(point: &SyntheticPoint) -> Self {
        Self {
            id: point.id.clone(),
            name: point.name.clone(),
            lat: point.lat,
            lon: point.lon,
            terrain_class: point.terrain,
            is_synthetic: true,
            base_id: Some(point.base_id.clone()),
        }
    }
}

/// A fixed latitude/longitude displacement for synthetic point generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub d_lat: f64,
    pub d_lon: f64,
}

/// Default satellite ring: six points at 0.3° radius, 60° apart.
pub const DEFAULT_OFFSETS: [Offset; 6] = [
    Offset { d_lat: 0.3, d_lon: 0.0 },
    Offset { d_lat: 0.15, d_lon: 0.26 },
    Offset { d_lat: -0.15, d_lon: 0.26 },
    Offset { d_lat: -0.3, d_lon: 0.0 },
    Offset { d_lat: -0.15, d_lon: -0.26 },
    Offset { d_lat: 0.15, d_lon: -0.26 },
];

// Bounding box of the monitored region; synthetic coordinates are clamped
// so satellites of border points stay on the map.
const LAT_MIN: f64 = 23.0;
const LAT_MAX: f64 = 37.5;
const LON_MIN: f64 = 60.5;
const LON_MAX: f64 = 77.5;

/// Immutable point catalog with pre-generated synthetic satellites.
#[derive(Debug, Clone)]
pub struct PointRegistry {
    bases: Vec<BasePoint>,
    synthetics: Vec<SyntheticPoint>,
}

impl PointRegistry {
    /// Build a registry from a base catalog and an offset table.
    ///
    /// Each base gets one synthetic point per offset, with id
    /// `{base_id}-s{index}`. Offsets cycle if more synthetics than offsets
    /// are ever requested. Generation is deterministic: identical inputs
    /// produce identical registries.
    pub fn new(bases: Vec<BasePoint>, offsets: &[Offset]) -> Self {
        let mut synthetics = Vec::with_capacity(bases.len() * offsets.len());

        let satellites_per_base = offsets.len();
        for base in &bases {
            for index in 0..satellites_per_base {
                // index % len cycles the table if a wider ring is configured
                let offset = offsets[index % offsets.len()];

                synthetics.push(SyntheticPoint {
                    id: format!("{}-s{index}", base.id),
                    name: format!("{} s{index}", base.name),
                    lat: (base.lat + offset.d_lat).clamp(LAT_MIN, LAT_MAX),
                    lon: (base.lon + offset.d_lon).clamp(LON_MIN, LON_MAX),
                    terrain: base.terrain,
                    base_id: base.id.clone(),
                });
            }
        }

        Self { bases, synthetics }
    }

    /// Registry with the built-in city catalog and default satellite ring.
    pub fn with_default_points() -> Self {
        Self::new(default_points(), &DEFAULT_OFFSETS)
    }

    pub fn base_points(&self) -> &[BasePoint] {
        &self.bases
    }

    pub fn synthetic_points(&self) -> &[SyntheticPoint] {
        &self.synthetics
    }

    /// All points, bases first, as served by the catalog endpoint.
    pub fn all_points(&self) -> Vec<MonitoredPoint> {
        self.bases
            .iter()
            .map(MonitoredPoint::from)
            .chain(self.synthetics.iter().map(MonitoredPoint::from))
            .collect()
    }

    /// Synthetic satellites of one base point, in generation order.
    pub fn synthetics_of(&self, base_id: &str) -> Vec<&SyntheticPoint> {
        self.synthetics
            .iter()
            .filter(|s| s.base_id == base_id)
            .collect()
    }
}

fn point(id: &str, name: &str, lat: f64, lon: f64, terrain: TerrainClass) -> BasePoint {
    BasePoint {
        id: id.to_string(),
        name: name.to_string(),
        lat,
        lon,
        terrain,
    }
}

/// The built-in monitored city catalog.
pub fn default_points() -> Vec<BasePoint> {
    use TerrainClass::{Hilly, Plain};

    vec![
        point("karachi", "Karachi", 24.8607, 67.0011, Plain),
        point("lahore", "Lahore", 31.5204, 74.3587, Plain),
        point("islamabad", "Islamabad", 33.6844, 73.0479, Plain),
        point("quetta", "Quetta", 30.1798, 66.9750, Plain),
        point("peshawar", "Peshawar", 34.0151, 71.5249, Plain),
        point("multan", "Multan", 30.1575, 71.5249, Plain),
        point("sukkur", "Sukkur", 27.7052, 68.8574, Plain),
        point("gilgit", "Gilgit", 35.9206, 74.3083, Hilly),
        point("skardu", "Skardu", 35.2976, 75.6333, Hilly),
    ]
}
