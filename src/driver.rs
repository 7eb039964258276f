// src/driver.rs
// Frame scheduler for a backdrop. It owns the scene, the per-frame shared
// state (frame counter, pointer, scan wave) and a cancellation token, and
// knows nothing about windows or GPUs: the shell calls `step` once per
// display refresh and stops asking once the token is cancelled.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::canvas::Canvas;
use crate::scene::scan_wave::ScanWave;
use crate::scene::{Bounds, FrameContext, Scene};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Running,
    TornDown,
}

/// Size of the drawing surface. `width`/`height` are logical pixels the
/// scene works in; the backing store is that times `device_pixel_ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f64,
}

impl SurfaceMetrics {
    /// Derives logical size from a physical size and the window scale
    /// factor, optionally capping the ratio used for the backing store.
    pub fn from_physical(physical_width: u32, physical_height: u32, scale_factor: f64, max_ratio: Option<f64>) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
        let ratio = max_ratio.map_or(scale, |max| scale.min(max));
        Self {
            width: (physical_width as f64 / scale) as f32,
            height: (physical_height as f64 / scale) as f32,
            device_pixel_ratio: ratio,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.device_pixel_ratio).round() as u32,
            (self.height as f64 * self.device_pixel_ratio).round() as u32,
        )
    }
}

pub struct Driver {
    scene: Box<dyn Scene>,
    state: DriverState,
    metrics: Option<SurfaceMetrics>,
    frame: u64,
    pointer: Option<Vec2>,
    scan_wave: Option<ScanWave>,
    rng: StdRng,
    token: CancelToken,
}

impl Driver {
    pub fn new(scene: Box<dyn Scene>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            scene,
            state: DriverState::Uninitialized,
            metrics: None,
            frame: 0,
            pointer: None,
            scan_wave: None,
            rng,
            token: CancelToken::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running && !self.token.is_cancelled()
    }

    pub fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub fn metrics(&self) -> Option<SurfaceMetrics> {
        self.metrics
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Spawns the entity batch and enters the running state. An empty
    /// surface means there is nothing to draw on: the call is a no-op.
    pub fn start(&mut self, metrics: SurfaceMetrics) {
        if self.state != DriverState::Uninitialized {
            log::warn!("Driver::start called in state {:?}, ignoring.", self.state);
            return;
        }
        if metrics.bounds().is_empty() {
            log::warn!("No drawable surface ({}x{}), backdrop stays idle.", metrics.width, metrics.height);
            return;
        }
        self.metrics = Some(metrics);
        self.scene.regenerate(metrics.bounds(), &mut self.rng);
        self.scan_wave = self.scene.scan_wave().map(ScanWave::new);
        self.state = DriverState::Running;
        log::info!("Backdrop {:?} running at {}x{} (dpr {}).", self.scene.kind(), metrics.width, metrics.height, metrics.device_pixel_ratio);
    }

    /// New surface size: every entity is thrown away and spawned again.
    pub fn resize(&mut self, metrics: SurfaceMetrics) {
        match self.state {
            DriverState::Uninitialized => self.start(metrics),
            DriverState::Running => {
                if metrics.bounds().is_empty() {
                    return;
                }
                self.metrics = Some(metrics);
                self.scene.regenerate(metrics.bounds(), &mut self.rng);
            }
            DriverState::TornDown => {}
        }
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        if self.state != DriverState::TornDown {
            self.pointer = Some(position);
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    /// Runs one frame: clear, advance shared state, step every entity and
    /// paint. Returns `false` without touching the canvas when the driver is
    /// not running, so the caller can stop scheduling frames.
    pub fn step(&mut self, canvas: &mut dyn Canvas) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(metrics) = self.metrics else {
            return false;
        };
        let bounds = metrics.bounds();

        canvas.clear();
        self.frame += 1;

        let scan_x = match (self.scan_wave.as_mut(), self.scene.scan_wave()) {
            (Some(wave), Some(config)) => wave.advance(bounds.width, config),
            _ => 0.0,
        };

        let ctx = FrameContext::new(self.frame, bounds)
            .with_pointer(self.pointer)
            .with_scan_x(scan_x);

        self.scene.step(&ctx, &mut self.rng);
        self.scene.draw(&ctx, canvas);
        true
    }

    /// Cancels the next frame and drops every entity. Final.
    pub fn stop(&mut self) {
        if self.state == DriverState::TornDown {
            return;
        }
        self.token.cancel();
        self.scene.clear();
        self.pointer = None;
        self.scan_wave = None;
        self.state = DriverState::TornDown;
        log::info!("Backdrop torn down after {} frames.", self.frame);
    }

    /// Swaps in a different scene, keeping the current surface size.
    pub fn replace_scene(&mut self, scene: Box<dyn Scene>) {
        self.scene = scene;
        self.scan_wave = self.scene.scan_wave().map(ScanWave::new);
        if let (DriverState::Running, Some(metrics)) = (self.state, self.metrics) {
            self.scene.regenerate(metrics.bounds(), &mut self.rng);
        }
    }
}
