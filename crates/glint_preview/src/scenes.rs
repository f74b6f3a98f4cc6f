//! Demo scenes supplied to the renderer by the harness.

use glint_math::random::{gen_f64, gen_range, random_vec};
use glint_renderer::{Color, Dielectric, Lambertian, Material, Metal, Point3, Scene, Sphere};
use rand::RngCore;
use std::sync::Arc;

/// A small sphere resting on a large grey ground sphere.
pub fn two_spheres() -> Scene {
    let grey: Arc<Material> = Arc::new(Lambertian::new(Color::splat(0.5)).into());

    let mut scene = Scene::new();
    scene.add(Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, grey.clone()));
    scene.add(Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, grey));
    scene
}

/// Ground, three large feature spheres and a grid of small random ones.
pub fn random_spheres(rng: &mut dyn RngCore) -> Scene {
    let mut scene = Scene::new();

    // Ground
    scene.add(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::new(Color::splat(0.5)).into()),
    ));

    // Every small glass sphere shares one material
    let glass: Arc<Material> = Arc::new(Dielectric::new(1.5).into());

    for a in -11..11 {
        for b in -11..11 {
            let center = Point3::new(
                a as f64 + 0.9 * gen_f64(rng),
                0.2,
                b as f64 + 0.9 * gen_f64(rng),
            );

            // Keep clear of the metal feature sphere
            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat = gen_f64(rng);
            let material: Arc<Material> = if choose_mat < 0.8 {
                // Diffuse
                let albedo = random_vec(rng, 0.0, 1.0) * random_vec(rng, 0.0, 1.0);
                Arc::new(Lambertian::new(albedo).into())
            } else if choose_mat < 0.95 {
                // Metal
                let albedo = random_vec(rng, 0.5, 1.0);
                let fuzz = gen_range(rng, 0.0, 0.5);
                Arc::new(Metal::new(albedo, fuzz).into())
            } else {
                glass.clone()
            };
            scene.add(Sphere::new(center, 0.2, material));
        }
    }

    // Three main spheres
    scene.add(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, glass));
    scene.add(Sphere::new(
        Point3::new(-4.0, 1.0, 0.0),
        1.0,
        Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1)).into()),
    ));
    scene.add(Sphere::new(
        Point3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0).into()),
    ));

    scene
}
