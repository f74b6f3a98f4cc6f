//! Glint math: vector algebra, rays, intervals and random sampling.
//!
//! Geometry runs in double precision. `Vec3` is `glam::DVec3` and doubles as
//! a point and a linear RGB color.

// Re-export glam for convenience
pub use glam;
pub use glam::{DVec2, DVec3};

mod interval;
pub mod random;
mod ray;

pub use interval::Interval;
pub use ray::Ray;

/// Double precision 3-vector.
pub type Vec3 = DVec3;

/// A position in world space.
pub type Point3 = DVec3;

/// Linear RGB color, nominally 0-1 per channel.
pub type Color = DVec3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::splat(3.0));
        assert_eq!(-a, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(2.0 * a, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b / 2.0, Vec3::new(2.0, 2.5, 3.0));
        // Component-wise, used for attenuation * incoming color
        assert_eq!(a * b, Vec3::new(4.0, 10.0, 18.0));
    }

    #[test]
    fn test_vec3_products() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
        assert_eq!(a.cross(b).dot(a), 0.0);
    }

    #[test]
    fn test_vec3_length() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(v.length_squared(), 25.0);
        assert_eq!(v.length(), 5.0);

        let unit = v.normalize();
        assert!((unit.length() - 1.0).abs() < 1e-12);
        assert!((unit - Vec3::new(0.6, 0.8, 0.0)).length() < 1e-12);
    }
}
