//! Isotropic linear elastic material for 2D analysis.

use crate::error::{Error, Result};
use nalgebra::Matrix3;

/// Two-dimensional idealisation of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneCondition {
    /// Thin plate, σ_zz = 0.
    #[default]
    PlaneStress,
    /// Long body, ε_zz = 0.
    PlaneStrain,
}

/// Material properties for 2D elasticity.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Young's modulus.
    pub youngs_modulus: f64,
    /// Poisson's ratio (dimensionless).
    pub poissons_ratio: f64,
    /// Plane idealisation used by [`Material::elasticity_matrix`].
    pub condition: PlaneCondition,
}

impl Material {
    /// Create a new isotropic linear elastic material in plane stress.
    ///
    /// # Arguments
    ///
    /// * `youngs_modulus` - Young's modulus E
    /// * `poissons_ratio` - Poisson's ratio ν (dimensionless, -1 < ν < 0.5)
    ///
    /// # Errors
    ///
    /// Returns error if material properties are physically invalid.
    pub fn new(youngs_modulus: f64, poissons_ratio: f64) -> Result<Self> {
        if !youngs_modulus.is_finite() || youngs_modulus <= 0.0 {
            return Err(Error::InvalidMaterial(
                "Young's modulus must be positive".into(),
            ));
        }
        if !(poissons_ratio > -1.0 && poissons_ratio < 0.5) {
            return Err(Error::InvalidMaterial(
                "Poisson's ratio must be in range (-1, 0.5)".into(),
            ));
        }
        Ok(Self {
            youngs_modulus,
            poissons_ratio,
            condition: PlaneCondition::PlaneStress,
        })
    }

    /// Switch the plane idealisation.
    pub fn with_condition(mut self, condition: PlaneCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Shear modulus G = E / (2(1 + ν)).
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poissons_ratio))
    }

    /// Elasticity matrix C of the configured plane condition.
    pub fn elasticity_matrix(&self) -> Matrix3<f64> {
        match self.condition {
            PlaneCondition::PlaneStress => self.constitutive_plane_stress(),
            PlaneCondition::PlaneStrain => self.constitutive_plane_strain(),
        }
    }

    /// Plane stress constitutive matrix.
    ///
    /// Returns a 3x3 matrix for [σ_xx, σ_yy, τ_xy] = C * [ε_xx, ε_yy, γ_xy].
    pub fn constitutive_plane_stress(&self) -> Matrix3<f64> {
        let e = self.youngs_modulus;
        let nu = self.poissons_ratio;
        let factor = e / (1.0 - nu * nu);

        Matrix3::new(
            factor,         factor * nu, 0.0,
            factor * nu,    factor,      0.0,
            0.0,            0.0,         factor * (1.0 - nu) / 2.0,
        )
    }

    /// Plane strain constitutive matrix.
    pub fn constitutive_plane_strain(&self) -> Matrix3<f64> {
        let e = self.youngs_modulus;
        let nu = self.poissons_ratio;

        let factor = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let c11 = factor * (1.0 - nu);
        let c12 = factor * nu;
        let c33 = factor * (1.0 - 2.0 * nu) / 2.0;

        Matrix3::new(
            c11, c12, 0.0,
            c12, c11, 0.0,
            0.0, 0.0, c33,
        )
    }
}

/// Material presets.
impl Material {
    /// Cantilever benchmark material (E = 3.0e7, ν = 0.3, plane stress).
    pub fn benchmark() -> Self {
        Self {
            youngs_modulus: 3.0e7,
            poissons_ratio: 0.3,
            condition: PlaneCondition::PlaneStress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_properties() {
        assert!(Material::new(-100e9, 0.3).is_err());
        assert!(Material::new(0.0, 0.3).is_err());
        assert!(Material::new(200e9, 0.5).is_err());
        assert!(Material::new(200e9, -1.0).is_err());
    }

    #[test]
    fn test_plane_stress_benchmark_values() {
        let c = Material::benchmark().elasticity_matrix();
        let factor = 3.0e7 / (1.0 - 0.09);
        assert_relative_eq!(c[(0, 0)], factor, epsilon = 1e-6);
        assert_relative_eq!(c[(0, 1)], 0.3 * factor, epsilon = 1e-6);
        assert_relative_eq!(c[(2, 2)], Material::benchmark().shear_modulus(), max_relative = 1e-12);
        assert_relative_eq!(c, c.transpose());
    }

    #[test]
    fn test_condition_selects_matrix() {
        let mat = Material::new(1.0e3, 0.25).unwrap();
        assert_eq!(mat.elasticity_matrix(), mat.constitutive_plane_stress());
        let mat = mat.with_condition(PlaneCondition::PlaneStrain);
        assert_eq!(mat.elasticity_matrix(), mat.constitutive_plane_strain());
        // Shear term is G in both idealisations
        assert_relative_eq!(mat.elasticity_matrix()[(2, 2)], mat.shear_modulus(), max_relative = 1e-12);
    }
}
