//! Headless preview harness.
//!
//! Drives the renderer the way a display loop would: start a render on a
//! session, poll the shared frame while it fills in, and report when the
//! image is complete. Nothing is written to disk.

mod scenes;

use anyhow::Result;
use glint_renderer::{CameraSettings, Point3, RenderRequest, RenderSession, RenderSettings, Vec3};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::thread;
use std::time::Duration;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 225;
const SCENE_SEED: u64 = 2020;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut session = RenderSession::new(WIDTH, HEIGHT);

    // Quick draft of the simple scene, replaced straight away by the full
    // render below; the session cancels and joins it first.
    let draft = RenderRequest::new(
        scenes::two_spheres(),
        CameraSettings::default(),
        RenderSettings::default()
            .with_resolution(WIDTH, HEIGHT)
            .with_quality(4, 8),
    );
    session.start(draft)?;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(SCENE_SEED);
    let scene = scenes::random_spheres(&mut rng);
    log::info!("Created {} objects", scene.len());

    let camera = CameraSettings::default()
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.1, 10.0);
    let settings = RenderSettings::default()
        .with_resolution(WIDTH, HEIGHT)
        .with_quality(32, 16);
    session.start(RenderRequest::new(scene, camera, settings))?;

    while !session.is_idle() {
        thread::sleep(POLL_INTERVAL);
        if let Some(job) = session.job() {
            let preview = session.frame().snapshot();
            log::info!(
                "{:5.1}% after {:.1}s, mean level {:.1}",
                100.0 * job.progress().fraction(),
                job.elapsed().as_secs_f32(),
                mean_level(&preview)
            );
        }
    }

    if let Some(stats) = session.wait() {
        log::info!(
            "Finished {}/{} scanlines in {:?} (seed {})",
            stats.scanlines_completed,
            stats.total_scanlines,
            stats.elapsed,
            stats.seed
        );
    }
    log::info!("Final mean level {:.1}", mean_level(&session.frame().snapshot()));

    Ok(())
}

/// Average byte value, a cheap stand-in for uploading the frame.
fn mean_level(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    bytes.iter().map(|&b| b as f64).sum::<f64>() / bytes.len() as f64
}
