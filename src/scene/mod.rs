// src/scene/mod.rs
use glam::Vec2;
use rand::rngs::StdRng;

use crate::canvas::Canvas;
use crate::config::{AppConfig, ScanWaveConfig, SceneKind};

pub mod connection;
pub mod mesh;
pub mod mesh_node;
pub mod micro_particle;
pub mod network;
pub mod scan_wave;

pub use mesh::MeshScene;
pub use network::NetworkScene;

/// Logical size of the area a scene animates in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Everything shared by all entities within one frame. Built by the driver
/// before the step and read-only from then on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub frame: u64,
    /// `None` while the pointer is outside the surface.
    pub pointer: Option<Vec2>,
    pub scan_x: f32,
    pub bounds: Bounds,
}

impl FrameContext {
    pub fn new(frame: u64, bounds: Bounds) -> Self {
        Self { frame, pointer: None, scan_x: 0.0, bounds }
    }

    pub fn with_pointer(mut self, pointer: Option<Vec2>) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_scan_x(mut self, scan_x: f32) -> Self {
        self.scan_x = scan_x;
        self
    }
}

/// An animated backdrop: a batch of entities that is regenerated on resize,
/// stepped once per frame and painted onto a [`Canvas`].
pub trait Scene {
    fn kind(&self) -> SceneKind;

    /// Discards every entity and spawns a fresh batch for `bounds`.
    fn regenerate(&mut self, bounds: Bounds, rng: &mut StdRng);

    fn clear(&mut self);

    fn step(&mut self, ctx: &FrameContext, rng: &mut StdRng);

    fn draw(&self, ctx: &FrameContext, canvas: &mut dyn Canvas);

    fn scan_wave(&self) -> Option<&ScanWaveConfig> {
        None
    }

    fn max_device_pixel_ratio(&self) -> Option<f64> {
        None
    }
}

pub fn build_scene(config: &AppConfig) -> Box<dyn Scene> {
    match config.scene {
        SceneKind::Mesh => Box::new(MeshScene::new(config.mesh.clone())),
        SceneKind::Network => Box::new(NetworkScene::new(config.network.clone())),
    }
}

/// Opacity that fades linearly from `max_opacity` at zero distance to 0 at
/// `threshold`. Zero for any distance at or past the threshold.
pub fn proximity_opacity(distance: f32, threshold: f32, max_opacity: f32) -> f32 {
    if distance >= threshold || threshold <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / threshold) * max_opacity
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn opacity_is_zero_at_and_past_threshold() {
        assert_eq!(proximity_opacity(140.0, 140.0, 0.2), 0.0);
        assert_eq!(proximity_opacity(500.0, 140.0, 0.2), 0.0);
        assert_relative_eq!(proximity_opacity(0.0, 140.0, 0.2), 0.2);
    }

    #[test]
    fn opacity_strictly_decreases_below_threshold() {
        let samples: Vec<f32> = (0..140).map(|d| proximity_opacity(d as f32, 140.0, 0.2)).collect();
        assert!(samples.windows(2).all(|w| w[0] > w[1]));
        assert!(samples.iter().all(|&o| o > 0.0));
    }

    #[test]
    fn empty_bounds() {
        assert!(Bounds::new(0.0, 300.0).is_empty());
        assert!(Bounds::default().is_empty());
        assert!(!Bounds::new(1.0, 1.0).is_empty());
    }
}
