// src/scene/mesh.rs
use rand::rngs::StdRng;

use crate::canvas::Canvas;
use crate::config::{MeshConfig, ScanWaveConfig, SceneKind};
use crate::scene::connection::mesh_segments;
use crate::scene::mesh_node::MeshNode;
use crate::scene::micro_particle::MicroParticle;
use crate::scene::scan_wave::draw_scan_band;
use crate::scene::{Bounds, FrameContext, Scene};

/// Full-viewport neural mesh: layered nodes, their links, the scan band and
/// the micro-particles drifting over everything.
pub struct MeshScene {
    pub config: MeshConfig,
    pub nodes: Vec<MeshNode>,
    pub particles: Vec<MicroParticle>,
}

impl MeshScene {
    pub fn new(config: MeshConfig) -> Self {
        Self { config, nodes: Vec::new(), particles: Vec::new() }
    }
}

impl Scene for MeshScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Mesh
    }

    fn regenerate(&mut self, bounds: Bounds, rng: &mut StdRng) {
        self.nodes = MeshNode::spawn_batch(self.config.node_count, bounds, rng);
        self.particles = MicroParticle::spawn_batch(self.config.particle_count, bounds, rng);
        log::info!(
            "Spawned {} mesh nodes and {} micro-particles for {}x{}",
            self.nodes.len(),
            self.particles.len(),
            bounds.width,
            bounds.height
        );
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.particles.clear();
    }

    fn step(&mut self, ctx: &FrameContext, rng: &mut StdRng) {
        // Back layer first, both for stepping and painting.
        self.nodes.sort_by_key(|node| node.layer);
        for node in self.nodes.iter_mut() {
            *node = node.stepped(ctx, &self.config, rng);
        }
        for particle in self.particles.iter_mut() {
            *particle = particle.stepped(ctx.bounds, &self.config, rng);
        }
    }

    fn draw(&self, ctx: &FrameContext, canvas: &mut dyn Canvas) {
        for segment in mesh_segments(&self.nodes, ctx, &self.config) {
            segment.draw(canvas);
        }
        draw_scan_band(canvas, ctx.scan_x, ctx.bounds.height, &self.config.scan_wave);
        for node in &self.nodes {
            node.draw(canvas, &self.config);
        }
        for particle in &self.particles {
            particle.draw(canvas);
        }
    }

    fn scan_wave(&self) -> Option<&ScanWaveConfig> {
        Some(&self.config.scan_wave)
    }

    fn max_device_pixel_ratio(&self) -> Option<f64> {
        self.config.max_device_pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, DrawList};
    use rand::SeedableRng;

    #[test]
    fn regenerate_replaces_whole_batch() {
        let mut scene = MeshScene::new(MeshConfig::default());
        let mut rng = StdRng::seed_from_u64(31);
        scene.regenerate(Bounds::new(1024.0, 768.0), &mut rng);
        let first = scene.nodes.clone();
        assert_eq!(scene.nodes.len(), 120);
        assert_eq!(scene.particles.len(), 60);

        scene.regenerate(Bounds::new(400.0, 300.0), &mut rng);
        assert_eq!(scene.nodes.len(), 120);
        assert_ne!(first, scene.nodes);
        assert!(scene.nodes.iter().all(|n| n.position.x <= 400.0 && n.position.y <= 300.0));
    }

    #[test]
    fn paints_links_then_band_then_nodes_back_to_front() {
        let mut scene = MeshScene::new(MeshConfig { node_count: 10, particle_count: 3, ..MeshConfig::default() });
        let mut rng = StdRng::seed_from_u64(32);
        let bounds = Bounds::new(200.0, 200.0);
        scene.regenerate(bounds, &mut rng);
        scene.nodes.reverse();

        let ctx = FrameContext::new(1, bounds).with_scan_x(50.0);
        scene.step(&ctx, &mut rng);
        assert!(scene.nodes.windows(2).all(|w| w[0].layer <= w[1].layer));

        let mut list = DrawList::new();
        scene.draw(&ctx, &mut list);
        let commands = list.commands();
        let band = commands
            .iter()
            .position(|c| matches!(c, DrawCommand::HorizontalBand { .. }))
            .expect("scan band drawn");
        assert!(commands[..band].iter().all(|c| matches!(c, DrawCommand::Line { .. })));
        // One glow and one core per node, then one disc per micro-particle.
        assert_eq!(commands.len() - band - 1, 10 * 2 + 3);
        assert!(commands.iter().all(|c| c.colors().iter().all(|col| col.alpha <= 1.0)));
    }
}
