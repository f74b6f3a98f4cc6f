//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Sky gradient as the only light source
//! - Anti-aliasing via jittered multi-sampling
//! - Gamma 2.0 correction applied after averaging

use crate::{Camera, Hittable, RenderError, RenderResult};
use glint_math::random::gen_f64;
use glint_math::{Color, Interval, Ray};
use rand::RngCore;

/// Lower bound on hit distances, suppresses self-intersection ("shadow
/// acne") for rays leaving a surface.
///
/// Machine epsilon is too tight here: on the radius-1000 ground sphere,
/// rounding in the hit point leaves scattered rays re-hitting their own
/// surface at distances around 1e-13. 1e-8 clears that error while staying
/// far below any real gap between objects.
pub const SHADOW_EPSILON: f64 = 1e-8;

/// Sky color at the horizon.
const SKY_WHITE: Color = Color::new(1.0, 1.0, 1.0);
/// Sky color at the zenith.
const SKY_BLUE: Color = Color::new(0.5, 0.7, 1.0);

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Image width in pixels, at least 2
    pub width: u32,
    /// Image height in pixels, at least 2
    pub height: u32,
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Worker threads; `None` uses one per logical core
    pub threads: Option<usize>,
    /// Sampling seed; `None` draws a fresh one per render
    pub seed: Option<u64>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 225,
            samples_per_pixel: 100,
            max_depth: 50,
            threads: None,
            seed: None,
        }
    }
}

impl RenderSettings {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Width / height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Size of the RGB8 output buffer in bytes.
    pub fn buffer_len(&self) -> usize {
        3 * self.width as usize * self.height as usize
    }

    /// Reject settings the sampling math cannot handle.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width < 2 || self.height < 2 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(RenderError::ZeroSamples);
        }
        Ok(())
    }
}

/// Compute the color seen by a ray.
///
/// Traces the ray through the scene, bouncing off surfaces and multiplying
/// in each material's attenuation. Returns black once `depth` reaches zero.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, rng: &mut dyn RngCore) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(rec) = world.hit(ray, Interval::new(SHADOW_EPSILON, f64::INFINITY)) else {
        return sky_gradient(ray);
    };

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => result.attenuation * ray_color(&result.scattered, world, depth - 1, rng),
        None => Color::ZERO,
    }
}

/// Vertical blend from white at the horizon to sky blue straight up.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    (1.0 - a) * SKY_WHITE + a * SKY_BLUE
}

/// Average `samples_per_pixel` jittered samples for pixel `(i, j)`.
///
/// `j` counts rows from the top of the image, while the camera's `t`
/// coordinate grows upwards, so the row is flipped.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    i: u32,
    j: u32,
    settings: &RenderSettings,
    rng: &mut dyn RngCore,
) -> Color {
    let max_x = (settings.width - 1) as f64;
    let max_y = (settings.height - 1) as f64;
    let row = (settings.height - 1 - j) as f64;

    let mut pixel_color = Color::ZERO;
    for _ in 0..settings.samples_per_pixel {
        let s = (i as f64 + gen_f64(rng)) / max_x;
        let t = (row + gen_f64(rng)) / max_y;
        let ray = camera.get_ray(s, t, rng);
        pixel_color += ray_color(&ray, world, settings.max_depth, rng);
    }

    pixel_color / settings.samples_per_pixel as f64
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert an averaged linear color to 8-bit RGB.
///
/// Each channel is `floor(255.999 * clamp(sqrt(c), 0, 0.999))`.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let intensity = Interval::new(0.0, 0.999);
    let to_byte = |c: f64| (255.999 * intensity.clamp(linear_to_gamma(c))) as u8;
    [to_byte(color.x), to_byte(color.y), to_byte(color.z)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraSettings, Lambertian, Material, Scene, Sphere};
    use glint_math::{Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn single_sphere_scene() -> Scene {
        let material: Arc<Material> = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)).into());
        let mut scene = Scene::new();
        scene.add(Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, material));
        scene
    }

    fn strictly_between(c: Color, a: Color, b: Color) -> bool {
        (0..3).all(|k| {
            let (lo, hi) = if a[k] < b[k] { (a[k], b[k]) } else { (b[k], a[k]) };
            lo == hi || (lo < c[k] && c[k] < hi)
        })
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::Y));
        let down = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::NEG_Y));

        assert!((up - SKY_BLUE).length() < 1e-12);
        assert!((down - SKY_WHITE).length() < 1e-12);
    }

    #[test]
    fn test_miss_lies_between_gradient_ends() {
        let scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(1);

        for direction in [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, 0.9, -1.0),
            Vec3::new(-2.0, -0.5, 0.1),
        ] {
            let color = ray_color(&Ray::new(Vec3::ZERO, direction), &scene, 5, &mut rng);
            assert!(strictly_between(color, SKY_WHITE, SKY_BLUE), "{:?}", color);
            assert_ne!(color, SKY_WHITE);
            assert_ne!(color, SKY_BLUE);
        }
    }

    #[test]
    fn test_zero_depth_is_black() {
        let scene = single_sphere_scene();
        let mut rng = StdRng::seed_from_u64(2);

        let hit = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let miss = Ray::new(Vec3::ZERO, Vec3::Y);
        assert_eq!(ray_color(&hit, &scene, 0, &mut rng), Color::ZERO);
        assert_eq!(ray_color(&miss, &scene, 0, &mut rng), Color::ZERO);
        assert_eq!(ray_color(&miss, &Scene::new(), 0, &mut rng), Color::ZERO);
    }

    #[test]
    fn test_hit_darker_than_background() {
        let scene = single_sphere_scene();
        let camera = CameraSettings::default().build(1.0);
        let mut rng = StdRng::seed_from_u64(3);

        // Center of the image points at the sphere's apex
        let center = camera.get_ray(0.5, 0.5, &mut rng);
        let hit = ray_color(&center, &scene, 1, &mut rng);

        // Far right edge of the image misses
        let side = camera.get_ray(1.0, 0.5, &mut rng);
        let miss = ray_color(&side, &scene, 1, &mut rng);

        assert!(hit.max_element() < miss.min_element(), "hit {:?} miss {:?}", hit, miss);

        let hit_bytes = color_to_rgb8(hit);
        let miss_bytes = color_to_rgb8(miss);
        assert_eq!(hit_bytes, [0, 0, 0]);
        assert!(miss_bytes.iter().all(|&b| b > 0), "{:?}", miss_bytes);
    }

    #[test]
    fn test_rendered_hit_pixel_darker_than_sky_pixel() {
        let settings = RenderSettings::default()
            .with_resolution(2, 2)
            .with_quality(256, 1)
            .with_threads(1)
            .with_seed(21);
        let request = crate::RenderRequest::new(
            single_sphere_scene(),
            CameraSettings::default(),
            settings,
        );
        let mut out = vec![0u8; request.settings.buffer_len()];
        crate::render(&request, &mut out, &crate::CancelToken::new()).unwrap();

        // Bottom-left samples cover the whole viewport, so part of them land
        // on the sphere and come back black. Top-right samples all miss.
        let bottom_left = &out[3 * 2..3 * 3];
        let top_right = &out[3..3 * 2];
        assert_eq!(top_right[2], 255);
        assert!(bottom_left[2] < top_right[2], "{:?} vs {:?}", bottom_left, top_right);
    }

    #[test]
    fn test_diffuse_bounce_attenuates() {
        // With spare depth, a diffuse bounce sees sky scaled by the albedo.
        let scene = single_sphere_scene();
        let mut rng = StdRng::seed_from_u64(4);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);

        for _ in 0..100 {
            let c = ray_color(&ray, &scene, 50, &mut rng);
            assert!(c.max_element() <= 0.5 + 1e-12);
        }
    }

    #[test]
    fn test_render_pixel_averages() {
        let settings = RenderSettings::default()
            .with_resolution(2, 2)
            .with_quality(16, 1);
        let camera = CameraSettings::default().build(settings.aspect_ratio());
        let mut rng = StdRng::seed_from_u64(5);

        // Empty scene: every sample is sky, so the average is sky too
        let color = render_pixel(&camera, &Scene::new(), 0, 0, &settings, &mut rng);
        assert!(strictly_between(color, SKY_WHITE, SKY_BLUE));
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_color_to_rgb8() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::splat(4.0)), [255, 255, 255]);
        // sqrt(0.25) = 0.5 -> floor(127.9995)
        assert_eq!(color_to_rgb8(Color::new(0.25, 0.0, 1.0)), [127, 0, 255]);
        assert_eq!(color_to_rgb8(Color::new(-0.5, f64::NAN, 0.01)), [0, 0, 25]);
    }

    #[test]
    fn test_settings_validation() {
        assert!(RenderSettings::default().validate().is_ok());
        assert!(matches!(
            RenderSettings::default().with_resolution(1, 10).validate(),
            Err(RenderError::InvalidDimensions { width: 1, height: 10 })
        ));
        assert!(matches!(
            RenderSettings::default().with_quality(0, 10).validate(),
            Err(RenderError::ZeroSamples)
        ));
        // Zero depth is allowed, it just renders black
        assert!(RenderSettings::default().with_quality(1, 0).validate().is_ok());
        assert_eq!(RenderSettings::default().with_resolution(4, 3).buffer_len(), 36);
    }
}
