// src/scene/micro_particle.rs
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;

use crate::canvas::Canvas;
use crate::color::BLUE;
use crate::config::MeshConfig;
use crate::scene::Bounds;

/// Small dot drifting upward. Its `life` runs from 0 to 1 and then it
/// respawns at the bottom edge, forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicroParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub alpha: f32,
    pub life: f32,
}

impl MicroParticle {
    pub fn spawn(bounds: Bounds, rng: &mut impl Rng) -> Self {
        Self {
            position: Vec2::new(rng.r#gen::<f32>() * bounds.width, rng.r#gen::<f32>() * bounds.height),
            velocity: Vec2::new((rng.r#gen::<f32>() - 0.5) * 0.3, -0.2 - rng.r#gen::<f32>() * 0.3),
            radius: 0.5 + rng.r#gen::<f32>() * 0.8,
            alpha: 0.15 + rng.r#gen::<f32>() * 0.2,
            life: rng.r#gen::<f32>(),
        }
    }

    pub fn spawn_batch(count: usize, bounds: Bounds, rng: &mut impl Rng) -> Vec<Self> {
        (0..count).map(|_| Self::spawn(bounds, rng)).collect()
    }

    pub fn stepped(&self, bounds: Bounds, config: &MeshConfig, rng: &mut impl Rng) -> Self {
        let mut next = *self;
        next.position += next.velocity;
        next.life += config.micro_life_step;
        if next.life > 1.0 {
            next.position = Vec2::new(rng.r#gen::<f32>() * bounds.width, bounds.height + config.micro_respawn_offset);
            next.life = 0.0;
        }
        next.alpha = life_alpha(next.life);
        next
    }

    pub fn draw(&self, canvas: &mut dyn Canvas) {
        canvas.fill_circle(self.position, self.radius, BLUE.with_alpha(self.alpha));
    }
}

/// Half-sine envelope: dim at birth and death, brightest mid-life.
pub fn life_alpha(life: f32) -> f32 {
    0.15 + (life * PI).sin() * 0.2
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn respawns_at_bottom_when_life_runs_out() {
        let bounds = Bounds::new(800.0, 600.0);
        let config = MeshConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut particle = MicroParticle::spawn(bounds, &mut rng);
        particle.life = 0.999;

        let next = particle.stepped(bounds, &config, &mut rng);
        assert_eq!(next.life, 0.0);
        assert_eq!(next.position.y, 610.0);
        assert!((0.0..800.0).contains(&next.position.x));
        assert_relative_eq!(next.alpha, 0.15);
    }

    #[test]
    fn drifts_and_ages_before_respawn() {
        let bounds = Bounds::new(800.0, 600.0);
        let config = MeshConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut particle = MicroParticle::spawn(bounds, &mut rng);
        particle.life = 0.5;

        let next = particle.stepped(bounds, &config, &mut rng);
        assert_relative_eq!(next.life, 0.502);
        assert_eq!(next.position, particle.position + particle.velocity);
        assert!(next.velocity.y < 0.0);
    }

    #[test]
    fn envelope_peaks_mid_life() {
        assert_relative_eq!(life_alpha(0.0), 0.15);
        assert_relative_eq!(life_alpha(0.5), 0.35);
        assert!(life_alpha(1.0) < 0.16);
    }
}
