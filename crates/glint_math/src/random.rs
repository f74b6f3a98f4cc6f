//! Random number helpers and direction samplers.
//!
//! Every sampler draws from an explicit `RngCore` so callers control seeding
//! and each worker owns an independent stream.

use crate::{DVec2, Vec3};
use rand::{Rng, RngCore};
use std::f64::consts::PI;

/// Upper bound on draws for the rejection samplers.
///
/// Each draw is accepted with probability >= pi/6, so running out of
/// attempts practically never happens. When it does, the origin is
/// returned, which lies inside both the unit ball and the unit disk.
pub const MAX_REJECTION_ATTEMPTS: usize = 64;

/// Uniform random value in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Uniform random value in [min, max).
#[inline]
pub fn gen_range(rng: &mut dyn RngCore, min: f64, max: f64) -> f64 {
    min + (max - min) * gen_f64(rng)
}

/// Vector with each component uniform in [min, max).
pub fn random_vec(rng: &mut dyn RngCore, min: f64, max: f64) -> Vec3 {
    Vec3::new(
        gen_range(rng, min, max),
        gen_range(rng, min, max),
        gen_range(rng, min, max),
    )
}

/// Uniform point strictly inside the unit ball, by rejection from [-1, 1]^3.
pub fn random_in_unit_sphere(rng: &mut dyn RngCore) -> Vec3 {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let p = random_vec(rng, -1.0, 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
    Vec3::ZERO
}

/// Uniform point strictly inside the unit disk in the xy plane (z = 0).
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let p = DVec2::new(gen_range(rng, -1.0, 1.0), gen_range(rng, -1.0, 1.0));
        if p.length_squared() < 1.0 {
            return p.extend(0.0);
        }
    }
    Vec3::ZERO
}

/// Random unit vector, uniform on the sphere.
///
/// Uses the z/r/angle parametrization directly, no rejection loop:
/// z uniform in [-1, 1), angle uniform in [0, 2pi), r = sqrt(1 - z^2).
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    let a = gen_range(rng, 0.0, 2.0 * PI);
    let z = gen_range(rng, -1.0, 1.0);
    let r = (1.0 - z * z).sqrt();
    Vec3::new(r * a.cos(), r * a.sin(), z)
}

/// Point in the unit ball flipped onto the same side as `normal`.
pub fn random_in_hemisphere(rng: &mut dyn RngCore, normal: Vec3) -> Vec3 {
    let in_unit_sphere = random_in_unit_sphere(rng);
    if in_unit_sphere.dot(normal) > 0.0 {
        in_unit_sphere
    } else {
        -in_unit_sphere
    }
}
