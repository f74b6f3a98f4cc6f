//! Glint renderer - CPU path tracing
//!
//! A Monte Carlo path tracer over spheres with diffuse, metal and glass
//! materials, lit by a sky gradient. Rendering is parallel across
//! scanlines and can be cancelled between scanlines.
//!
//! The display harness supplies a [`RenderRequest`] and either a byte slice
//! ([`render`]) or a shared [`FrameBuffer`] ([`RenderJob`], [`RenderSession`])
//! that it can read while the render is still running.

mod camera;
mod error;
mod frame;
mod hittable;
mod job;
mod material;
mod renderer;
mod scanline;
mod sphere;

pub use camera::{Camera, CameraSettings};
pub use error::{RenderError, RenderResult};
pub use frame::FrameBuffer;
pub use hittable::{HitRecord, Hittable, Primitive, Scene};
pub use job::{CancelToken, RenderJob, RenderProgress, RenderSession};
pub use material::{reflect, refract, Dielectric, Lambertian, Material, Metal, ScatterResult};
pub use renderer::{
    color_to_rgb8, linear_to_gamma, ray_color, render_pixel, sky_gradient, RenderSettings,
    SHADOW_EPSILON,
};
pub use scanline::{render, RenderRequest, RenderStats};
pub use sphere::Sphere;

/// Re-export vector and common math types from glint_math
pub use glint_math::{Color, Interval, Point3, Ray, Vec3};
