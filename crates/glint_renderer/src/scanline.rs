//! Scanline-parallel rendering.
//!
//! Each scanline is an independent unit of work with its own random
//! stream, seeded from the render seed and the row index. Output only
//! depends on the seed, whatever order rayon runs the rows in.

use crate::renderer::{color_to_rgb8, render_pixel};
use crate::{
    Camera, CameraSettings, CancelToken, RenderError, RenderProgress, RenderResult,
    RenderSettings, Scene,
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything the harness supplies for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub scene: Arc<Scene>,
    pub camera: CameraSettings,
    pub settings: RenderSettings,
}

impl RenderRequest {
    pub fn new(
        scene: impl Into<Arc<Scene>>,
        camera: CameraSettings,
        settings: RenderSettings,
    ) -> Self {
        Self {
            scene: scene.into(),
            camera,
            settings,
        }
    }
}

/// Summary of a finished or cancelled render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub scanlines_completed: u32,
    pub total_scanlines: u32,
    /// True if cancellation stopped the render before the last scanline
    pub cancelled: bool,
    pub elapsed: Duration,
    /// Seed that reproduces this render
    pub seed: u64,
}

/// Per-render state shared by all scanline workers.
pub(crate) struct ScanlineWorker<'a> {
    camera: Camera,
    scene: &'a Scene,
    settings: &'a RenderSettings,
    seed: u64,
}

impl<'a> ScanlineWorker<'a> {
    pub(crate) fn new(request: &'a RenderRequest, seed: u64) -> Self {
        Self {
            camera: request.camera.build(request.settings.aspect_ratio()),
            scene: &request.scene,
            settings: &request.settings,
            seed,
        }
    }

    /// Render row `j` (0 is the top), handing each finished pixel to `put`.
    pub(crate) fn render_row(&self, j: u32, mut put: impl FnMut(u32, [u8; 3])) {
        let mut rng = scanline_rng(self.seed, j);
        for i in 0..self.settings.width {
            let color = render_pixel(&self.camera, self.scene, i, j, self.settings, &mut rng);
            put(i, color_to_rgb8(color));
        }
    }
}

/// Independent random stream for one scanline. The mixing is fixed, so a
/// given seed renders the same image on every platform and toolchain.
pub(crate) fn scanline_rng(seed: u64, row: u32) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(splitmix64(seed ^ splitmix64(u64::from(row))))
}

/// One step of the SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed from the settings, or a fresh one.
pub(crate) fn resolve_seed(settings: &RenderSettings) -> u64 {
    settings.seed.unwrap_or_else(rand::random)
}

/// Dedicated pool sized by `settings.threads`, rayon's default otherwise.
pub(crate) fn build_pool(settings: &RenderSettings) -> RenderResult<rayon::ThreadPool> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads.unwrap_or(0))
        .thread_name(|i| format!("glint-worker-{i}"))
        .build()?;
    Ok(pool)
}

/// Render into a caller-allocated RGB8 buffer of `3 * width * height` bytes.
///
/// Blocks until every scanline is written or `cancel` stops the render.
/// Scanlines already running when cancellation arrives still complete.
pub fn render(
    request: &RenderRequest,
    out: &mut [u8],
    cancel: &CancelToken,
) -> RenderResult<RenderStats> {
    let settings = &request.settings;
    settings.validate()?;
    if out.len() != settings.buffer_len() {
        return Err(RenderError::BufferSizeMismatch {
            expected: settings.buffer_len(),
            actual: out.len(),
        });
    }

    let pool = build_pool(settings)?;
    let seed = resolve_seed(settings);
    let progress = RenderProgress::new(settings.height);
    let worker = ScanlineWorker::new(request, seed);
    let row_stride = 3 * settings.width as usize;

    log_started(settings, pool.current_num_threads(), seed);
    let start = Instant::now();

    pool.install(|| {
        out.par_chunks_mut(row_stride)
            .enumerate()
            .for_each(|(j, row)| {
                if cancel.is_cancelled() {
                    return;
                }
                worker.render_row(j as u32, |i, rgb| {
                    let offset = 3 * i as usize;
                    row[offset..offset + 3].copy_from_slice(&rgb);
                });
                progress.scanline_done();
            });
    });
    progress.finish();

    let stats = progress.stats(start.elapsed(), seed);
    log_finished(&stats);
    Ok(stats)
}

pub(crate) fn log_started(settings: &RenderSettings, threads: usize, seed: u64) {
    log::info!(
        "Rendering {}x{} @ {} spp, depth {}, {} threads, seed {}",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        settings.max_depth,
        threads,
        seed
    );
}

pub(crate) fn log_finished(stats: &RenderStats) {
    if stats.cancelled {
        log::info!(
            "Render cancelled after {}/{} scanlines in {:?}",
            stats.scanlines_completed,
            stats.total_scanlines,
            stats.elapsed
        );
    } else {
        log::info!("Rendered {} scanlines in {:?}", stats.total_scanlines, stats.elapsed);
    }
}
