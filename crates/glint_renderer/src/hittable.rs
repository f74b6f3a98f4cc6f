//! Hittable trait, HitRecord and the scene aggregate.

use crate::{Material, Sphere};
use glint_math::{Interval, Point3, Ray, Vec3};

/// Record of a ray-object intersection.
///
/// Lives only for the duration of one intersection query and the material
/// dispatch that follows it.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub p: Point3,
    /// Unit surface normal, always pointing against the incoming ray
    pub normal: Vec3,
    /// Parameter t where the intersection occurs
    pub t: f64,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Material of the struck primitive
    pub material: &'a Material,
}

impl<'a> HitRecord<'a> {
    /// Build a record, orienting the normal against the ray.
    ///
    /// `outward_normal` must be unit length.
    pub fn new(ray: &Ray, t: f64, outward_normal: Vec3, material: &'a Material) -> Self {
        // If the ray and normal point in the same direction, we're inside
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        let normal = if front_face {
            outward_normal
        } else {
            -outward_normal
        };

        Self {
            p: ray.at(t),
            normal,
            t,
            front_face,
            material,
        }
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with `t` strictly inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>>;
}

/// A scene primitive. Closed set of shapes.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
}

impl Hittable for Primitive {
    #[inline]
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray, ray_t),
        }
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

/// An ordered list of primitives with nearest-hit resolution.
///
/// Exact distance ties go to the primitive added first.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Primitive>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Add an object to the scene.
    pub fn add(&mut self, object: impl Into<Primitive>) {
        self.objects.push(object.into());
    }

    /// Clear all objects from the scene.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the scene is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }
}

impl FromIterator<Primitive> for Scene {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().collect(),
        }
    }
}

impl Hittable for Scene {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'_>> {
        let mut closest: Option<HitRecord<'_>> = None;

        for object in &self.objects {
            // Farther hits fall outside the shrunken interval
            let interval = closest.map_or(ray_t, |rec| ray_t.with_max(rec.t));
            if let Some(rec) = object.hit(ray, interval) {
                closest = Some(rec);
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Metal};
    use glint_math::Color;
    use std::sync::Arc;

    fn grey() -> Arc<Material> {
        Arc::new(Lambertian::new(Color::splat(0.5)).into())
    }

    fn full_range() -> Interval {
        Interval::new(1e-8, f64::INFINITY)
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert!(scene.hit(&Ray::default(), full_range()).is_none());
    }

    #[test]
    fn test_nearest_hit_wins_regardless_of_order() {
        let near_mat: Arc<Material> = Arc::new(Metal::new(Color::ONE, 0.0).into());
        let far = Sphere::new(Point3::new(0.0, 0.0, -5.0), 0.5, grey());
        let near = Sphere::new(Point3::new(0.0, 0.0, -2.0), 0.5, near_mat.clone());

        let mut scene = Scene::new();
        scene.add(far.clone());
        scene.add(near.clone());
        let forward: Scene = [Primitive::from(near), Primitive::from(far)]
            .into_iter()
            .collect();

        let ray = Ray::new(Point3::ZERO, Vec3::NEG_Z);
        for scene in [&scene, &forward] {
            let rec = scene.hit(&ray, full_range()).expect("should hit");
            assert!((rec.t - 1.5).abs() < 1e-12);
            assert_eq!(rec.material, near_mat.as_ref());
        }
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_interval_max_rejects_farther_hits() {
        let mut scene = Scene::new();
        scene.add(Sphere::new(Point3::new(0.0, 0.0, -5.0), 0.5, grey()));

        let ray = Ray::new(Point3::ZERO, Vec3::NEG_Z);
        assert!(scene.hit(&ray, Interval::new(1e-8, 4.0)).is_none());
        assert!(scene.hit(&ray, Interval::new(1e-8, 4.6)).is_some());
    }

    #[test]
    fn test_shared_material() {
        let material = grey();
        let mut scene = Scene::new();
        for i in 0..4 {
            scene.add(Sphere::new(Point3::new(i as f64, 0.0, -3.0), 0.25, material.clone()));
        }
        assert_eq!(Arc::strong_count(&material), 5);

        scene.clear();
        assert_eq!(Arc::strong_count(&material), 1);
    }

    #[test]
    fn test_hit_record_faces_ray() {
        let material: Material = Lambertian::new(Color::ONE).into();
        let inside = Ray::new(Point3::ZERO, Vec3::X);
        let rec = HitRecord::new(&inside, 1.0, Vec3::X, &material);
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vec3::NEG_X);
        assert_eq!(rec.p, Point3::X);
    }
}
