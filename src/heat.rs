//! Pure heat-metric derivation
//!
//! Converts raw temperature/humidity observations into the derived signals
//! the rest of the pipeline depends on: apparent temperature (heat index),
//! an ordinal risk tier, the official-heatwave flag, and a normalized
//! composite weight used for map visualization intensity.
//!
//! All functions here are pure and stateless.

use serde::{Deserialize, Serialize};

use crate::registry::TerrainClass;

/// Ordinal heat-risk classification of a heat index value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    None,
    Caution,
    ExtremeCaution,
    Danger,
    ExtremeDanger,
}

impl RiskTier {
    /// Contribution of the tier to the composite heat weight.
    pub fn boost(self) -> f64 {
        match self {
            RiskTier::None => 0.0,
            RiskTier::Caution => 0.15,
            RiskTier::ExtremeCaution => 0.3,
            RiskTier::Danger => 0.5,
            RiskTier::ExtremeDanger => 0.7,
        }
    }

    /// Wire name, matching the serde serialization.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::None => "none",
            RiskTier::Caution => "caution",
            RiskTier::ExtremeCaution => "extreme_caution",
            RiskTier::Danger => "danger",
            RiskTier::ExtremeDanger => "extreme_danger",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn c_to_f(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn f_to_c(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Apparent temperature in °C from air temperature and relative humidity.
///
/// Applies the NOAA Rothfusz regression when the temperature is at least
/// 80 °F and humidity at least 40 %; below either threshold the heat index
/// is taken to equal the air temperature. Two standard correction terms are
/// applied at the regression's edges. The result is rounded to one decimal.
pub fn heat_index_c(temp_c: f64, rh_percent: f64) -> f64 {
    let t = c_to_f(temp_c);
    let r = rh_percent;

    if t < 80.0 || r < 40.0 {
        return temp_c;
    }

    // Rothfusz regression (NOAA)
    let mut hi = -42.379 + 2.04901523 * t + 10.14333127 * r
        - 0.22475541 * t * r
        - 0.00683783 * t * t
        - 0.05481717 * r * r
        + 0.00122874 * t * t * r
        + 0.00085282 * t * r * r
        - 0.00000199 * t * t * r * r;

    // Low humidity, high temperature adjustment
    if r < 13.0 && (80.0..=112.0).contains(&t) {
        hi -= ((13.0 - r) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
    }

    // High humidity adjustment
    if r > 85.0 && (80.0..=87.0).contains(&t) {
        hi += ((r - 85.0) / 10.0) * ((87.0 - t) / 5.0);
    }

    (f_to_c(hi) * 10.0).round() / 10.0
}

/// Classify a heat index into its risk tier.
///
/// Boundaries are half-open Celsius intervals: `[27, 32)` caution,
/// `[32, 39)` extreme caution, `[39, 51)` danger, `[51, ∞)` extreme danger.
pub fn classify_risk(heat_index_c: f64) -> RiskTier {
    if heat_index_c < 27.0 {
        RiskTier::None
    } else if heat_index_c < 32.0 {
        RiskTier::Caution
    } else if heat_index_c < 39.0 {
        RiskTier::ExtremeCaution
    } else if heat_index_c < 51.0 {
        RiskTier::Danger
    } else {
        RiskTier::ExtremeDanger
    }
}

/// PMD-style official heatwave condition, by terrain class.
///
/// Plains declare at 40 °C air temperature, hilly regions at 30 °C.
pub fn is_official_heatwave(terrain: TerrainClass, temp_c: f64) -> bool {
    match terrain {
        TerrainClass::Plain => temp_c >= 40.0,
        TerrainClass::Hilly => temp_c >= 30.0,
    }
}

/// Composite 0-1 severity weight blending heat index and risk tier.
///
/// The baseline starts at 0.1 so every point stays visible on the map even
/// absent heat risk, ramps linearly between 27 °C and full saturation, and
/// is blended 70/30 with the tier boost. Rounded to three decimals.
pub fn heat_weight(heat_index_c: f64, tier: RiskTier) -> f64 {
    let baseline = if heat_index_c > 45.0 {
        1.0
    } else if heat_index_c > 27.0 {
        (0.1 + (heat_index_c - 27.0) / (45.0 - 27.0)).min(1.0)
    } else {
        0.1
    };

    let weight = 0.7 * baseline + 0.3 * tier.boost();
    ((weight * 1000.0).round() / 1000.0).min(1.0)
}
