// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-point distance measurement

use crate::config::ViewerConfig;
use nalgebra::Point3;

/// Measurement progress
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MeasureMode {
    #[default]
    Idle,
    AwaitingSecondPoint(Point3<f64>),
}

/// A finished distance between two picked points
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementAnnotation {
    pub point_a: Point3<f64>,
    pub point_b: Point3<f64>,
    pub distance: f64,
    pub label: String,
}

impl MeasurementAnnotation {
    pub fn new(point_a: Point3<f64>, point_b: Point3<f64>, config: &ViewerConfig) -> Self {
        let distance = nalgebra::distance(&point_a, &point_b);
        Self {
            point_a,
            point_b,
            distance,
            label: config.format_length(distance),
        }
    }

    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.point_a, &self.point_b)
    }
}

/// What a pick did
#[derive(Clone, Debug, PartialEq)]
pub enum PickOutcome {
    /// Measuring is off
    Ignored,
    /// First point stored
    Pending(Point3<f64>),
    /// Second point closed an annotation
    Completed(MeasurementAnnotation),
}

/// Measurement mode and the annotations it produced
#[derive(Clone, Debug, Default)]
pub struct Measurement {
    measuring: bool,
    mode: MeasureMode,
    annotations: Vec<MeasurementAnnotation>,
}

impl Measurement {
    pub fn is_measuring(&self) -> bool {
        self.measuring
    }

    pub fn mode(&self) -> MeasureMode {
        self.mode
    }

    /// First point of an unfinished measurement
    pub fn pending(&self) -> Option<Point3<f64>> {
        match self.mode {
            MeasureMode::Idle => None,
            MeasureMode::AwaitingSecondPoint(point) => Some(point),
        }
    }

    pub fn annotations(&self) -> &[MeasurementAnnotation] {
        &self.annotations
    }

    /// Turn measuring on or off; turning it off drops everything
    pub fn set_measuring(&mut self, on: bool) {
        if self.measuring == on {
            return;
        }
        self.measuring = on;
        if !on {
            self.mode = MeasureMode::Idle;
            self.annotations.clear();
        }
        log::debug!("[Measure] Measuring {}", if on { "on" } else { "off" });
    }

    pub fn toggle(&mut self) -> bool {
        self.set_measuring(!self.measuring);
        self.measuring
    }

    /// Feed a picked point
    pub fn pick(&mut self, point: Point3<f64>, config: &ViewerConfig) -> PickOutcome {
        if !self.measuring {
            return PickOutcome::Ignored;
        }
        match self.mode {
            MeasureMode::Idle => {
                self.mode = MeasureMode::AwaitingSecondPoint(point);
                PickOutcome::Pending(point)
            }
            MeasureMode::AwaitingSecondPoint(first) => {
                let annotation = MeasurementAnnotation::new(first, point, config);
                log::debug!("[Measure] {}", annotation.label);
                self.mode = MeasureMode::Idle;
                self.annotations.push(annotation.clone());
                PickOutcome::Completed(annotation)
            }
        }
    }

    /// Remove every annotation and any pending point
    pub fn clear(&mut self) {
        self.mode = MeasureMode::Idle;
        self.annotations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn measuring() -> Measurement {
        let mut m = Measurement::default();
        m.set_measuring(true);
        m
    }

    #[test]
    fn test_two_picks_make_annotation() {
        let config = ViewerConfig::default();
        let mut m = measuring();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);

        assert_eq!(m.pick(a, &config), PickOutcome::Pending(a));
        assert_eq!(m.pending(), Some(a));

        let PickOutcome::Completed(annotation) = m.pick(b, &config) else {
            panic!("expected a completed measurement");
        };
        assert_relative_eq!(annotation.distance, 5.0);
        assert_eq!(annotation.label, "5.00 m");
        assert_relative_eq!(annotation.midpoint(), Point3::new(1.5, 2.0, 0.0));
        assert_eq!(m.mode(), MeasureMode::Idle);
        assert!(m.is_measuring());
        assert_eq!(m.annotations().len(), 1);
    }

    #[test]
    fn test_picks_ignored_when_off() {
        let config = ViewerConfig::default();
        let mut m = Measurement::default();
        assert_eq!(m.pick(Point3::origin(), &config), PickOutcome::Ignored);
        assert_eq!(m.pending(), None);
    }

    #[test]
    fn test_toggle_off_discards_pending_and_annotations() {
        let config = ViewerConfig::default();
        let mut m = measuring();
        m.pick(Point3::origin(), &config);
        m.pick(Point3::new(1.0, 0.0, 0.0), &config);
        m.pick(Point3::new(2.0, 0.0, 0.0), &config);
        assert!(m.pending().is_some());

        assert!(!m.toggle());
        assert_eq!(m.pending(), None);
        assert!(m.annotations().is_empty());
    }

    #[test]
    fn test_set_measuring_is_idempotent() {
        let config = ViewerConfig::default();
        let mut m = measuring();
        m.pick(Point3::origin(), &config);
        m.set_measuring(true);
        assert!(m.pending().is_some());
    }

    #[test]
    fn test_clear_keeps_mode() {
        let config = ViewerConfig::default();
        let mut m = measuring();
        m.pick(Point3::origin(), &config);
        m.pick(Point3::new(0.0, 2.0, 0.0), &config);
        m.pick(Point3::origin(), &config);
        m.clear();
        assert!(m.annotations().is_empty());
        assert_eq!(m.pending(), None);
        assert!(m.is_measuring());
    }
}
