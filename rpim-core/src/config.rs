//! Model parameters and configuration.
//!
//! [`RpimParameters`] are the physical/numerical constants of the
//! approximation and must always be supplied explicitly. [`RpimConfig`]
//! collects the discretisation and material choices that have sensible
//! defaults.

use crate::error::{Error, Result};
use crate::material::Material;
use crate::quadrature::TriangleRule;
use crate::support::SearchStrategy;

/// Default fraction of the x-range treated as the clamped boundary.
pub const DEFAULT_BOUNDARY_SCALE: f64 = 0.02;

/// Default number of Gauss-Legendre points per boundary line.
pub const DEFAULT_SURFACE_POINTS: usize = 3;

/// RPIM approximation constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpimParameters {
    /// Exponential shape constant of the multiquadric basis (typically 1.0-1.1).
    pub q: f64,
    /// Characteristic nodal spacing.
    pub dc: f64,
    /// Nodal spacing along x.
    pub dc_x: f64,
    /// Nodal spacing along y.
    pub dc_y: f64,
    /// Support-domain scale (typically 3-5).
    pub alpha_s: f64,
}

impl RpimParameters {
    /// Create a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameters`] if any value is not a positive,
    /// finite number.
    pub fn new(q: f64, dc: f64, dc_x: f64, dc_y: f64, alpha_s: f64) -> Result<Self> {
        for (name, value) in [("q", q), ("dc", dc), ("dc_x", dc_x), ("dc_y", dc_y), ("as", alpha_s)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameters(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            q,
            dc,
            dc_x,
            dc_y,
            alpha_s,
        })
    }

    /// Width of the rectangular support domain (as·dc_x).
    pub fn support_width(&self) -> f64 {
        self.alpha_s * self.dc_x
    }

    /// Height of the rectangular support domain (as·dc_y).
    pub fn support_height(&self) -> f64 {
        self.alpha_s * self.dc_y
    }

    /// Radius of the circle circumscribing the support rectangle.
    pub fn search_radius(&self) -> f64 {
        let w2 = self.support_width() / 2.0;
        let h2 = self.support_height() / 2.0;
        (w2 * w2 + h2 * h2).sqrt()
    }
}

/// Discretisation options for [`crate::model::Rpim2D`].
#[derive(Debug, Clone, PartialEq)]
pub struct RpimConfig {
    /// Quadrature rule over background triangles.
    pub volume_rule: TriangleRule,
    /// Gauss-Legendre points per boundary line (1..=10).
    pub surface_points: usize,
    /// Fraction of the x-range classified as boundary nodes.
    pub boundary_scale: f64,
    /// Support-domain construction strategy.
    pub search: SearchStrategy,
    /// Log the support domain of every quadrature point after each rebuild.
    pub animate: bool,
    /// Elastic material of the body.
    pub material: Material,
}

impl Default for RpimConfig {
    fn default() -> Self {
        Self {
            volume_rule: TriangleRule::Quadratic,
            surface_points: DEFAULT_SURFACE_POINTS,
            boundary_scale: DEFAULT_BOUNDARY_SCALE,
            search: SearchStrategy::Inverted,
            animate: false,
            material: Material::benchmark(),
        }
    }
}

impl RpimConfig {
    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=crate::quadrature::line::MAX_POINTS).contains(&self.surface_points) {
            return Err(Error::InvalidParameters(format!(
                "surface_points must be in 1..={}, got {}",
                crate::quadrature::line::MAX_POINTS,
                self.surface_points
            )));
        }
        if !self.boundary_scale.is_finite() || self.boundary_scale < 0.0 {
            return Err(Error::InvalidParameters(format!(
                "boundary_scale must be non-negative, got {}",
                self.boundary_scale
            )));
        }
        Ok(())
    }
}
