// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration loaded from environment variables

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prefix of every viewer environment variable
pub const ENV_PREFIX: &str = "IFC_TAKEOFF_";

/// Camera, picking and overlay settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Radians of yaw per pixel of primary drag
    pub yaw_sensitivity: f64,
    /// Radians of pitch per pixel of primary drag
    pub pitch_sensitivity: f64,
    /// Target travel per pixel, as a fraction of the orbit distance
    pub pan_sensitivity: f64,
    /// Fraction of the distance removed per wheel step
    pub zoom_sensitivity: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Pitch stays this far from the poles
    pub pitch_epsilon: f64,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Dimension line offset as a fraction of the largest extent
    pub dimension_margin_ratio: f64,
    /// Smallest dimension line offset in meters
    pub min_dimension_margin: f64,
    pub unit_suffix: String,
    /// Decimals shown in length labels
    pub label_precision: usize,
    /// Pointer travel in pixels below which a press and release is a click
    pub click_threshold: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            yaw_sensitivity: 0.005,
            pitch_sensitivity: 0.005,
            pan_sensitivity: 0.0015,
            zoom_sensitivity: 0.1,
            min_distance: 0.1,
            max_distance: 10_000.0,
            pitch_epsilon: 1e-3,
            fov_degrees: 45.0,
            near: 0.05,
            far: 50_000.0,
            dimension_margin_ratio: 0.05,
            min_dimension_margin: 0.5,
            unit_suffix: " m".into(),
            label_precision: 2,
            click_threshold: 3.0,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from `IFC_TAKEOFF_*` variables
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ViewerConfig::from_env`] over any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let config = Self {
            yaw_sensitivity: parse_or(get("YAW_SENSITIVITY"), defaults.yaw_sensitivity),
            pitch_sensitivity: parse_or(get("PITCH_SENSITIVITY"), defaults.pitch_sensitivity),
            pan_sensitivity: parse_or(get("PAN_SENSITIVITY"), defaults.pan_sensitivity),
            zoom_sensitivity: parse_or(get("ZOOM_SENSITIVITY"), defaults.zoom_sensitivity),
            min_distance: parse_or(get("MIN_DISTANCE"), defaults.min_distance),
            max_distance: parse_or(get("MAX_DISTANCE"), defaults.max_distance),
            pitch_epsilon: parse_or(get("PITCH_EPSILON"), defaults.pitch_epsilon),
            fov_degrees: parse_or(get("FOV_DEGREES"), defaults.fov_degrees),
            near: parse_or(get("NEAR"), defaults.near),
            far: parse_or(get("FAR"), defaults.far),
            dimension_margin_ratio: parse_or(
                get("DIMENSION_MARGIN_RATIO"),
                defaults.dimension_margin_ratio,
            ),
            min_dimension_margin: parse_or(
                get("MIN_DIMENSION_MARGIN"),
                defaults.min_dimension_margin,
            ),
            unit_suffix: get("UNIT_SUFFIX").unwrap_or_else(|| defaults.unit_suffix.clone()),
            label_precision: parse_or(get("LABEL_PRECISION"), defaults.label_precision),
            click_threshold: parse_or(get("CLICK_THRESHOLD"), defaults.click_threshold),
        };
        config.sanitized(&defaults)
    }

    /// Replace values that would break the camera with defaults
    fn sanitized(mut self, defaults: &Self) -> Self {
        if !(self.min_distance > 0.0 && self.max_distance >= self.min_distance) {
            log::warn!(
                "[Config] Distance range {}..{} rejected",
                self.min_distance,
                self.max_distance
            );
            self.min_distance = defaults.min_distance;
            self.max_distance = defaults.max_distance;
        }
        if !(self.pitch_epsilon > 0.0 && self.pitch_epsilon < std::f64::consts::FRAC_PI_4) {
            self.pitch_epsilon = defaults.pitch_epsilon;
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            self.fov_degrees = defaults.fov_degrees;
        }
        if !(self.near > 0.0 && self.far > self.near) {
            self.near = defaults.near;
            self.far = defaults.far;
        }
        self
    }

    pub fn fov_radians(&self) -> f64 {
        self.fov_degrees.to_radians()
    }

    /// Length label, e.g. `5.00 m`
    pub fn format_length(&self, value: f64) -> String {
        format!("{:.*}{}", self.label_precision, value, self.unit_suffix)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        assert_eq!(ViewerConfig::from_lookup(|_| None), ViewerConfig::default());
    }

    #[test]
    fn test_overrides_per_field() {
        let config = ViewerConfig::from_lookup(lookup(&[
            ("IFC_TAKEOFF_FOV_DEGREES", "60"),
            ("IFC_TAKEOFF_UNIT_SUFFIX", " ft"),
            ("IFC_TAKEOFF_LABEL_PRECISION", "not a number"),
            ("FOV_DEGREES", "10"),
        ]));
        assert_eq!(config.fov_degrees, 60.0);
        assert_eq!(config.unit_suffix, " ft");
        assert_eq!(config.label_precision, 2);
    }

    #[test]
    fn test_invalid_ranges_fall_back() {
        let config = ViewerConfig::from_lookup(lookup(&[
            ("IFC_TAKEOFF_MIN_DISTANCE", "50"),
            ("IFC_TAKEOFF_MAX_DISTANCE", "5"),
            ("IFC_TAKEOFF_PITCH_EPSILON", "-1"),
        ]));
        let defaults = ViewerConfig::default();
        assert_eq!(config.min_distance, defaults.min_distance);
        assert_eq!(config.max_distance, defaults.max_distance);
        assert_eq!(config.pitch_epsilon, defaults.pitch_epsilon);
    }

    #[test]
    fn test_format_length() {
        let config = ViewerConfig::default();
        assert_eq!(config.format_length(5.0), "5.00 m");
        assert_eq!(config.format_length(12.3456), "12.35 m");
    }
}
