// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions and triangulation

use crate::error::{Error, Result};
use crate::triangulation::{signed_area, triangulate_polygon_with_holes};
use nalgebra::{Matrix3, Point2};

/// 2D Profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a profile from an outer ring, normalizing its orientation
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer: orient(close_ring(outer), true),
            holes: Vec::new(),
        }
    }

    /// Add a hole, normalizing it to clockwise
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        let hole = close_ring(hole);
        if hole.len() >= 3 {
            self.holes.push(orient(hole, false));
        }
    }

    /// Create a rectangular profile centered at origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;

        Self::new(vec![
            Point2::new(-half_w, -half_h),
            Point2::new(half_w, -half_h),
            Point2::new(half_w, half_h),
            Point2::new(-half_w, half_h),
        ])
    }

    /// Create a circular profile centered at origin
    pub fn circle(radius: f64, segments: Option<usize>) -> Self {
        let segments = segments.unwrap_or_else(|| calculate_circle_segments(radius));
        let outer = (0..segments)
            .map(|i| {
                let angle = std::f64::consts::TAU * (i as f64) / (segments as f64);
                Point2::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        Self::new(outer)
    }

    /// Apply a 2D placement given as a homogeneous 3x3 matrix
    ///
    /// Orientation is re-normalized afterwards since a mirroring placement
    /// flips every ring.
    pub fn transformed(&self, placement: &Matrix3<f64>) -> Self {
        let apply = |ring: &[Point2<f64>]| -> Vec<Point2<f64>> {
            ring.iter().map(|p| placement.transform_point(p)).collect()
        };
        let mut profile = Self::new(apply(&self.outer));
        for hole in &self.holes {
            profile.add_hole(apply(hole));
        }
        profile
    }

    /// Enclosed area of the outer ring minus the holes
    pub fn area(&self) -> f64 {
        signed_area(&self.outer) - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Triangulate the profile using earcutr
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::profile("Profile must have at least 3 vertices"));
        }
        let indices = triangulate_polygon_with_holes(&self.outer, &self.holes)?;
        let points = self
            .outer
            .iter()
            .chain(self.holes.iter().flatten())
            .copied()
            .collect();
        Ok(Triangulation { points, indices })
    }

    /// Every ring, outer first
    pub fn rings(&self) -> impl Iterator<Item = &[Point2<f64>]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

/// Drop the repeated closing point that polylines usually carry
fn close_ring(mut ring: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    while ring.len() > 1 && (ring[0] - ring[ring.len() - 1]).norm() < 1e-9 {
        ring.pop();
    }
    ring
}

fn orient(mut ring: Vec<Point2<f64>>, ccw: bool) -> Vec<Point2<f64>> {
    if (signed_area(&ring) > 0.0) != ccw {
        ring.reverse();
    }
    ring
}

/// Calculate adaptive number of segments for a circle
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    let segments = (radius.abs().sqrt() * 8.0).ceil() as usize;
    segments.clamp(8, 32)
}
