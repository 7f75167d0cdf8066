//! Per-vertex lighting intensity.
//!
//! The renderer itself has no notion of lights: it takes a ready-made
//! intensity on each vertex and interpolates it across the triangle. This
//! module supplies the usual way to produce that intensity, a single
//! directional light with a Lambert diffuse term and an ambient floor.

use crate::math::vec3::Vec3;

/// A directional light illuminating the scene uniformly from one direction.
pub struct DirectionalLight {
    /// Normalized direction the light is pointing (not where it comes from).
    pub direction: Vec3,
    /// Intensity every surface receives regardless of orientation.
    pub ambient: f32,
    /// Multiplier on the diffuse contribution.
    pub diffuse_strength: f32,
}

impl DirectionalLight {
    /// Create a light pointing in `direction` (normalized automatically).
    pub fn new(direction: Vec3) -> Self {
        DirectionalLight {
            direction: direction.normalize(),
            ambient: 0.1,
            diffuse_strength: 1.0,
        }
    }

    /// Vertex intensity in [0, 1] for a surface with the given normal.
    ///
    /// Computed as `ambient + (1 - ambient) * diffuse * strength`, so a
    /// surface facing away from the light still receives the ambient floor.
    pub fn intensity(&self, normal: Vec3) -> f32 {
        let diffuse = (-self.direction).dot(normal.normalize()).max(0.0);
        (self.ambient + (1.0 - self.ambient) * diffuse * self.diffuse_strength).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn facing_the_light_is_fully_lit() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        let normal = Vec3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(light.intensity(normal), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn facing_away_receives_ambient_floor() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        let normal = Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(light.intensity(normal), light.ambient, epsilon = 1e-5);
    }

    #[test]
    fn grazing_angle_lands_between() {
        let light = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0));
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let intensity = light.intensity(normal);
        assert!(intensity > light.ambient && intensity < 1.0);
        // cos(45 deg) scaled into the ambient..1 range
        let expected = 0.1 + 0.9 * std::f32::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(intensity, expected, epsilon = 1e-4);
    }
}
