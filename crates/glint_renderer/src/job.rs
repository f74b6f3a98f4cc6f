//! Background render jobs with cooperative cancellation.
//!
//! A job owns the thread driving its worker pool. Cancelling stops new
//! scanlines from starting; scanlines already running finish. A job is
//! always joined before another one may write the same frame buffer,
//! either explicitly or when the job is dropped.

use crate::scanline::{build_pool, log_finished, log_started, resolve_seed, ScanlineWorker};
use crate::{FrameBuffer, RenderError, RenderRequest, RenderResult, RenderStats};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Shared flag asking workers to stop picking up scanlines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Scanline counter and completion flag for a running render.
#[derive(Debug)]
pub struct RenderProgress {
    completed: AtomicU32,
    total: u32,
    finished: AtomicBool,
}

impl RenderProgress {
    pub fn new(total: u32) -> Self {
        Self {
            completed: AtomicU32::new(0),
            total,
            finished: AtomicBool::new(false),
        }
    }

    pub(crate) fn scanline_done(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark all workers as exited.
    pub(crate) fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn scanlines_done(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total_scanlines(&self) -> u32 {
        self.total
    }

    /// Completed fraction in [0, 1].
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        self.scanlines_done() as f32 / self.total as f32
    }

    /// True once every worker has exited, by completion or cancellation.
    /// All buffer writes are visible to a caller that observed `true`.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn stats(&self, elapsed: Duration, seed: u64) -> RenderStats {
        let scanlines_completed = self.scanlines_done();
        RenderStats {
            scanlines_completed,
            total_scanlines: self.total,
            cancelled: scanlines_completed < self.total,
            elapsed,
            seed,
        }
    }
}

/// Sets the completion flag even if a worker panics.
struct FinishOnDrop(Arc<RenderProgress>);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// A render running on its own thread.
#[derive(Debug)]
pub struct RenderJob {
    cancel: CancelToken,
    progress: Arc<RenderProgress>,
    started: Instant,
    seed: u64,
    handle: Option<JoinHandle<RenderStats>>,
}

impl RenderJob {
    /// Validate the request and start rendering into `frame`.
    pub fn spawn(request: RenderRequest, frame: Arc<FrameBuffer>) -> RenderResult<Self> {
        let settings = &request.settings;
        settings.validate()?;
        if frame.width() != settings.width || frame.height() != settings.height {
            return Err(RenderError::FrameSizeMismatch {
                width: settings.width,
                height: settings.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let pool = build_pool(settings)?;
        let seed = resolve_seed(settings);
        let cancel = CancelToken::new();
        let progress = Arc::new(RenderProgress::new(settings.height));

        log_started(settings, pool.current_num_threads(), seed);

        let started = Instant::now();
        let handle = {
            let cancel = cancel.clone();
            let progress = progress.clone();
            thread::Builder::new()
                .name("glint-render".into())
                .spawn(move || {
                    let _finish = FinishOnDrop(progress.clone());
                    let worker = ScanlineWorker::new(&request, seed);

                    pool.install(|| {
                        (0..request.settings.height)
                            .into_par_iter()
                            .for_each(|j| {
                                if cancel.is_cancelled() {
                                    return;
                                }
                                worker.render_row(j, |i, rgb| frame.set(i, j, rgb));
                                progress.scanline_done();
                            });
                    });

                    let stats = progress.stats(started.elapsed(), seed);
                    log_finished(&stats);
                    stats
                })?
        };
        log::debug!("Spawned render job with seed {}", seed);

        Ok(Self {
            cancel,
            progress,
            started,
            seed,
            handle: Some(handle),
        })
    }

    /// Ask workers to stop after their current scanline.
    pub fn cancel(&self) {
        log::debug!("Cancelling render job");
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// True once every worker has exited.
    pub fn is_finished(&self) -> bool {
        self.progress.is_finished()
    }

    pub fn progress(&self) -> &RenderProgress {
        &self.progress
    }

    /// Time since the job started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Block until the render completes.
    ///
    /// A panic on the render thread is resumed on the caller.
    pub fn wait(mut self) -> RenderStats {
        self.join_thread()
            .unwrap_or_else(|| self.progress.stats(self.started.elapsed(), self.seed))
    }

    /// Cancel, then block until in-flight scanlines are done.
    pub fn cancel_and_wait(self) -> RenderStats {
        self.cancel();
        self.wait()
    }

    fn join_thread(&mut self) -> Option<RenderStats> {
        let handle = self.handle.take()?;
        let stats = match handle.join() {
            Ok(stats) => stats,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        log::debug!("Joined render job");
        Some(stats)
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel.cancel();
            // Never leave workers writing a buffer nobody tracks
            let _ = handle.join();
        }
    }
}

/// Owns a frame buffer and at most one render job writing to it.
///
/// Starting a render first cancels and joins the previous one, so two
/// worker sets never share the buffer.
#[derive(Debug)]
pub struct RenderSession {
    frame: Arc<FrameBuffer>,
    job: Option<RenderJob>,
}

impl RenderSession {
    /// Create a session with a black frame of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Arc::new(FrameBuffer::new(width, height)),
            job: None,
        }
    }

    pub fn frame(&self) -> &Arc<FrameBuffer> {
        &self.frame
    }

    /// Start a new render, stopping any render still in flight.
    pub fn start(&mut self, request: RenderRequest) -> RenderResult<()> {
        if let Some(job) = &self.job {
            if !job.is_finished() {
                log::warn!("Render still running; cancelling it before starting a new one");
            }
        }
        self.stop();
        self.job = Some(RenderJob::spawn(request, self.frame.clone())?);
        Ok(())
    }

    /// Request cancellation without waiting.
    pub fn cancel(&self) {
        if let Some(job) = &self.job {
            job.cancel();
        }
    }

    /// Cancel and join the current job, returning its stats.
    pub fn stop(&mut self) -> Option<RenderStats> {
        self.job.take().map(RenderJob::cancel_and_wait)
    }

    /// Block until the current job completes.
    pub fn wait(&mut self) -> Option<RenderStats> {
        self.job.take().map(RenderJob::wait)
    }

    /// True when no render is writing the frame.
    pub fn is_idle(&self) -> bool {
        self.job.as_ref().map_or(true, RenderJob::is_finished)
    }

    pub fn job(&self) -> Option<&RenderJob> {
        self.job.as_ref()
    }

    /// Stop rendering and blank the frame.
    pub fn clear(&mut self) {
        self.stop();
        self.frame.clear();
    }

    /// Stop rendering and replace the frame with a black one of a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.stop();
        self.frame = Arc::new(FrameBuffer::new(width, height));
    }
}
