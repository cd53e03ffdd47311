// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extent lines and wireframe around the model box

use crate::config::ViewerConfig;
use ifc_takeoff_model::Bounds;
use nalgebra::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One labeled extent indicator
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionLine {
    pub axis: Axis,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    pub value: f64,
    pub label: String,
}

impl DimensionLine {
    fn new(axis: Axis, start: Point3<f64>, end: Point3<f64>, config: &ViewerConfig) -> Self {
        let value = nalgebra::distance(&start, &end);
        Self {
            axis,
            start,
            end,
            value,
            label: config.format_length(value),
        }
    }

    pub fn label_anchor(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

/// Width, depth and height lines plus the box edges
#[derive(Clone, Debug, PartialEq)]
pub struct DimensionOverlay {
    pub lines: [DimensionLine; 3],
    pub wireframe: [[Point3<f64>; 2]; 12],
    pub margin: f64,
}

impl DimensionOverlay {
    /// Overlay for a world box; `None` for an empty box
    pub fn from_bounds(bounds: &Bounds, config: &ViewerConfig) -> Option<Self> {
        if !bounds.is_valid() {
            return None;
        }
        let [x0, y0, z0] = bounds.min;
        let [x1, y1, z1] = bounds.max;
        let margin = (bounds.max_dimension() * config.dimension_margin_ratio)
            .max(config.min_dimension_margin);

        let lines = [
            // in front of the box, on the floor
            DimensionLine::new(
                Axis::X,
                Point3::new(x0, y0 - margin, z0),
                Point3::new(x1, y0 - margin, z0),
                config,
            ),
            // beside it, on the floor
            DimensionLine::new(
                Axis::Y,
                Point3::new(x1 + margin, y0, z0),
                Point3::new(x1 + margin, y1, z0),
                config,
            ),
            // at the front-left corner
            DimensionLine::new(
                Axis::Z,
                Point3::new(x0 - margin, y0 - margin, z0),
                Point3::new(x0 - margin, y0 - margin, z1),
                config,
            ),
        ];

        Some(Self {
            lines,
            wireframe: box_edges(bounds),
            margin,
        })
    }
}

/// The 12 edges of a box
pub fn box_edges(bounds: &Bounds) -> [[Point3<f64>; 2]; 12] {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { bounds.min[0] } else { bounds.max[0] },
            if i & 2 == 0 { bounds.min[1] } else { bounds.max[1] },
            if i & 4 == 0 { bounds.min[2] } else { bounds.max[2] },
        )
    };
    const EDGES: [(usize, usize); 12] = [
        // bottom
        (0, 1),
        (1, 3),
        (3, 2),
        (2, 0),
        // top
        (4, 5),
        (5, 7),
        (7, 6),
        (6, 4),
        // verticals
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    EDGES.map(|(a, b)| [corner(a), corner(b)])
}

/// Dimension toggle and its cached overlay
#[derive(Clone, Debug, Default)]
pub struct Dimensions {
    visible: bool,
    bounds: Option<Bounds>,
    overlay: Option<DimensionOverlay>,
}

impl Dimensions {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Overlay to draw, only while visible
    pub fn overlay(&self) -> Option<&DimensionOverlay> {
        self.overlay.as_ref().filter(|_| self.visible)
    }

    /// New model box; the overlay follows when shown
    pub fn set_bounds(&mut self, bounds: Option<Bounds>, config: &ViewerConfig) {
        self.bounds = bounds;
        self.rebuild(config);
    }

    pub fn set_visible(&mut self, visible: bool, config: &ViewerConfig) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        self.rebuild(config);
    }

    pub fn toggle(&mut self, config: &ViewerConfig) -> bool {
        self.set_visible(!self.visible, config);
        self.visible
    }

    fn rebuild(&mut self, config: &ViewerConfig) {
        self.overlay = if self.visible {
            self.bounds
                .as_ref()
                .and_then(|b| DimensionOverlay::from_bounds(b, config))
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bounds() -> Bounds {
        Bounds::from_points([0.0, 0.0, 0.0], [20.0, 10.0, 6.5])
    }

    #[test]
    fn test_extent_lines_and_labels() {
        let config = ViewerConfig::default();
        let overlay = DimensionOverlay::from_bounds(&bounds(), &config).unwrap();
        let labels: Vec<&str> = overlay.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["20.00 m", "10.00 m", "6.50 m"]);
        assert_relative_eq!(overlay.margin, 1.0);
        // offset outward from the box
        assert!(overlay.lines[0].start.y < 0.0);
        assert!(overlay.lines[1].start.x > 20.0);
        assert!(overlay.lines[2].start.x < 0.0);
    }

    #[test]
    fn test_minimum_margin() {
        let config = ViewerConfig::default();
        let small = Bounds::from_points([0.0; 3], [1.0, 1.0, 1.0]);
        let overlay = DimensionOverlay::from_bounds(&small, &config).unwrap();
        assert_eq!(overlay.margin, config.min_dimension_margin);
    }

    #[test]
    fn test_wireframe_edges_are_axis_aligned() {
        let edges = box_edges(&bounds());
        for [a, b] in edges {
            let differing = (0..3).filter(|&k| a[k] != b[k]).count();
            assert_eq!(differing, 1);
        }
        let total: f64 = edges.iter().map(|[a, b]| nalgebra::distance(a, b)).sum();
        assert_relative_eq!(total, 4.0 * (20.0 + 10.0 + 6.5));
    }

    #[test]
    fn test_empty_bounds() {
        let config = ViewerConfig::default();
        assert!(DimensionOverlay::from_bounds(&Bounds::empty(), &config).is_none());
    }

    #[test]
    fn test_toggle_recomputes() {
        let config = ViewerConfig::default();
        let mut dims = Dimensions::default();
        dims.set_bounds(Some(bounds()), &config);
        assert!(dims.overlay().is_none());

        assert!(dims.toggle(&config));
        assert_eq!(dims.overlay().unwrap().lines[0].value, 20.0);

        dims.set_bounds(Some(Bounds::from_points([0.0; 3], [2.0, 2.0, 2.0])), &config);
        assert_eq!(dims.overlay().unwrap().lines[0].value, 2.0);

        dims.set_visible(false, &config);
        assert!(dims.overlay().is_none());
        dims.set_bounds(None, &config);
        dims.set_visible(true, &config);
        assert!(dims.overlay().is_none());
    }
}
