//! Segmented cubic Hermite spline
//!
//! The curve is parametrized over `t ∈ [0, 1]`, with control point `i` sitting
//! at `t = i / (N - 1)`. Tangents are given in per-segment units and are scaled
//! by `1 / (N - 1)` before blending.

use crate::error::{IndexKind, SimError, SimResult};
use glam::Vec3;
use std::fmt::Write;

/// Maximum number of control points a spline accepts
pub const MAX_CONTROL_POINTS: usize = 40;

/// Sample count used by [`HermiteSpline::arc_length`]
pub const ARC_LENGTH_SAMPLES: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct HermiteSpline {
    control_points: Vec<Vec3>,
    tangents: Vec<Vec3>,
}

impl HermiteSpline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.control_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control_points.is_empty()
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    /// Append a control point and its tangent
    pub fn add_point(&mut self, position: Vec3, tangent: Vec3) -> SimResult<()> {
        if self.control_points.len() >= MAX_CONTROL_POINTS {
            ftlog::warn!("add_point rejected: spline already has {MAX_CONTROL_POINTS} points");
            return Err(SimError::CapacityExceeded {
                capacity: MAX_CONTROL_POINTS,
            });
        }
        self.control_points.push(position);
        self.tangents.push(tangent);
        Ok(())
    }

    pub fn set_point(&mut self, index: usize, position: Vec3) -> SimResult<()> {
        let len = self.control_points.len();
        let slot = self.control_points.get_mut(index).ok_or_else(|| {
            ftlog::warn!("set_point rejected: index {index} out of range (len {len})");
            SimError::out_of_range(IndexKind::ControlPoint, index, len)
        })?;
        *slot = position;
        Ok(())
    }

    pub fn set_tangent(&mut self, index: usize, tangent: Vec3) -> SimResult<()> {
        let len = self.tangents.len();
        let slot = self.tangents.get_mut(index).ok_or_else(|| {
            ftlog::warn!("set_tangent rejected: index {index} out of range (len {len})");
            SimError::out_of_range(IndexKind::ControlPoint, index, len)
        })?;
        *slot = tangent;
        Ok(())
    }

    /// Remove every control point
    pub fn clear(&mut self) {
        self.control_points.clear();
        self.tangents.clear();
    }

    /// Evaluate the curve at `t`, clamped into `[0, 1]`
    pub fn position(&self, t: f32) -> Vec3 {
        let n = self.control_points.len();
        match n {
            0 => return Vec3::ZERO,
            1 => return self.control_points[0],
            _ => {}
        }

        let last = n - 1;
        let segments = last as f32;
        let u = t.clamp(0.0, 1.0) * segments;
        let a = (u.floor() as usize).min(last);
        let b = (u.ceil() as usize).min(last);
        let s = u - u.floor();

        let scale = 1.0 / segments;
        let p0 = self.control_points[a];
        let m0 = self.tangents[a] * scale;
        let p1 = self.control_points[b];
        let m1 = self.tangents[b] * scale;

        let [h0, h1, h2, h3] = hermite_basis(s);
        p0 * h0 + m0 * h1 + p1 * h2 + m1 * h3
    }

    /// Polyline length of the curve sampled at [`ARC_LENGTH_SAMPLES`] points
    pub fn arc_length(&self) -> f32 {
        self.arc_length_with_samples(ARC_LENGTH_SAMPLES)
    }

    pub fn arc_length_with_samples(&self, samples: usize) -> f32 {
        if samples == 0 {
            return 0.0;
        }
        let mut length = 0.0;
        let mut previous = self.position(0.0);
        for i in 1..=samples {
            let current = self.position(i as f32 / samples as f32);
            length += current.distance(previous);
            previous = current;
        }
        length
    }

    /// `samples + 1` evenly spaced points, endpoints included
    pub fn sample_polyline(&self, samples: usize) -> Vec<Vec3> {
        if samples == 0 {
            return vec![self.position(0.0)];
        }
        (0..=samples)
            .map(|i| self.position(i as f32 / samples as f32))
            .collect()
    }

    /// Text dump: the point count, then one line per point with each
    /// coordinate prefixed, `c_<x> c_<y> c_<z> t_<x> t_<y> t_<z>`
    pub fn export(&self) -> String {
        let mut out = format!("{}", self.len());
        for (c, t) in self.control_points.iter().zip(&self.tangents) {
            // Writing into a String cannot fail
            let _ = write!(
                out,
                "\nc_{} c_{} c_{} t_{} t_{} t_{}",
                c.x, c.y, c.z, t.x, t.y, t.z
            );
        }
        out
    }
}

/// Cubic Hermite basis `[h0, h1, h2, h3]` at local parameter `s`
pub fn hermite_basis(s: f32) -> [f32; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    [
        2.0 * s3 - 3.0 * s2 + 1.0,
        s3 - 2.0 * s2 + s,
        -2.0 * s3 + 3.0 * s2,
        s3 - s2,
    ]
}
