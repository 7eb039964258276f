// src/scene/network.rs
// Container-sized variant: particles bounce off the edges instead of
// wrapping, there are no layers and no scan wave, and the connection lines
// are painted over the particles.
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::rngs::StdRng;

use crate::canvas::{Canvas, GradientStop};
use crate::color::{BLUE, Color, PURPLE};
use crate::config::{NetworkConfig, SceneKind};
use crate::scene::connection::network_segments;
use crate::scene::{Bounds, FrameContext, Scene};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub color: Color,
    pub base_alpha: f32,
    pub alpha: f32,
    pub pulse_speed: f32,
    pub pulse_phase: f32,
}

impl NetworkParticle {
    pub fn spawn(bounds: Bounds, config: &NetworkConfig, rng: &mut impl Rng) -> Self {
        let area = if bounds.is_empty() {
            Bounds::new(config.fallback_size[0], config.fallback_size[1])
        } else {
            bounds
        };
        let color = if rng.r#gen::<f32>() > 0.4 { BLUE } else { PURPLE };
        let base_alpha = rng.r#gen::<f32>() * 0.4 + 0.4;

        Self {
            position: Vec2::new(rng.r#gen::<f32>() * area.width, rng.r#gen::<f32>() * area.height),
            velocity: Vec2::new((rng.r#gen::<f32>() - 0.5) * 0.5, (rng.r#gen::<f32>() - 0.5) * 0.5),
            radius: rng.r#gen::<f32>() * 2.5 + 1.5,
            color,
            base_alpha,
            alpha: base_alpha,
            pulse_speed: rng.r#gen::<f32>() * 0.03 + 0.015,
            pulse_phase: rng.r#gen::<f32>() * TAU,
        }
    }

    pub fn stepped(&self, ctx: &FrameContext, config: &NetworkConfig) -> Self {
        let mut next = *self;
        next.position += next.velocity;
        if next.position.x < 0.0 || next.position.x > ctx.bounds.width {
            next.velocity.x = -next.velocity.x;
        }
        if next.position.y < 0.0 || next.position.y > ctx.bounds.height {
            next.velocity.y = -next.velocity.y;
        }
        let pulse = (ctx.frame as f32 * self.pulse_speed + self.pulse_phase).sin();
        next.alpha = self.base_alpha + pulse * config.pulse_alpha_amplitude;
        next
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, config: &NetworkConfig) {
        let stops = [
            GradientStop::new(0.0, self.color.with_alpha(self.alpha * 0.6)),
            GradientStop::new(0.5, self.color.with_alpha(self.alpha * 0.15)),
            GradientStop::new(1.0, self.color.with_alpha(0.0)),
        ];
        canvas.radial_glow(self.position, self.radius * config.glow_scale, stops);
        let core_alpha = (self.alpha + config.core_alpha_boost).min(1.0);
        canvas.fill_circle(self.position, self.radius, self.color.with_alpha(core_alpha));
    }
}

pub struct NetworkScene {
    pub config: NetworkConfig,
    pub particles: Vec<NetworkParticle>,
}

impl NetworkScene {
    pub fn new(config: NetworkConfig) -> Self {
        Self { config, particles: Vec::new() }
    }
}

impl Scene for NetworkScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Network
    }

    fn regenerate(&mut self, bounds: Bounds, rng: &mut StdRng) {
        self.particles = (0..self.config.particle_count)
            .map(|_| NetworkParticle::spawn(bounds, &self.config, rng))
            .collect();
        log::info!("Spawned {} network particles for {}x{}", self.particles.len(), bounds.width, bounds.height);
    }

    fn clear(&mut self) {
        self.particles.clear();
    }

    fn step(&mut self, ctx: &FrameContext, _rng: &mut StdRng) {
        for particle in self.particles.iter_mut() {
            *particle = particle.stepped(ctx, &self.config);
        }
    }

    fn draw(&self, ctx: &FrameContext, canvas: &mut dyn Canvas) {
        for particle in &self.particles {
            particle.draw(canvas, &self.config);
        }
        for segment in network_segments(&self.particles, ctx, &self.config) {
            segment.draw(canvas);
        }
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
    fn bounces_off_edges() {
        let config = NetworkConfig::default();
        let bounds = Bounds::new(400.0, 300.0);
        let mut rng = StdRng::seed_from_u64(21);
        let mut particle = NetworkParticle::spawn(bounds, &config, &mut rng);
        particle.position = Vec2::new(399.9, 150.0);
        particle.velocity = Vec2::new(0.2, 0.0);

        let next = particle.stepped(&FrameContext::new(1, bounds), &config);
        assert!(next.velocity.x < 0.0);
        let after = next.stepped(&FrameContext::new(2, bounds), &config);
        assert!(after.position.x < next.position.x);
    }

    #[test]
    fn spawns_inside_fallback_area_without_size() {
        let config = NetworkConfig::default();
        let mut rng = StdRng::seed_from_u64(22);
        for _ in 0..50 {
            let particle = NetworkParticle::spawn(Bounds::default(), &config, &mut rng);
            assert!(particle.position.x < 800.0 && particle.position.y < 600.0);
        }
    }

    #[test]
    fn lines_are_painted_over_particles() {
        let mut scene = NetworkScene::new(NetworkConfig { particle_count: 2, ..NetworkConfig::default() });
        let mut rng = StdRng::seed_from_u64(23);
        let bounds = Bounds::new(400.0, 300.0);
        scene.regenerate(bounds, &mut rng);
        scene.particles[0].position = Vec2::new(100.0, 100.0);
        scene.particles[1].position = Vec2::new(150.0, 100.0);

        let mut list = DrawList::new();
        scene.draw(&FrameContext::new(1, bounds), &mut list);
        let kinds: Vec<&str> = list
            .commands()
            .iter()
            .map(|c| match c {
                DrawCommand::RadialGlow { .. } => "glow",
                DrawCommand::Circle { .. } => "core",
                DrawCommand::Line { .. } => "line",
                DrawCommand::HorizontalBand { .. } => "band",
            })
            .collect();
        assert_eq!(kinds, vec!["glow", "core", "glow", "core", "line"]);
    }
}
