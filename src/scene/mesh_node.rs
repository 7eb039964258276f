// src/scene/mesh_node.rs
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::canvas::{Canvas, GradientStop};
use crate::color::{BLUE, Color, PURPLE};
use crate::config::MeshConfig;
use crate::scene::{Bounds, FrameContext};

pub const LAYER_COUNT: u8 = 3;

/// Depth tier of the node for index `index` out of a batch of `count`:
/// the first 30% go to the back layer, the next 40% to the middle and the
/// rest to the front.
pub fn layer_for_index(index: usize, count: usize) -> u8 {
    let i = index as f64;
    let n = count as f64;
    if i < n * 0.3 {
        0
    } else if i < n * 0.7 {
        1
    } else {
        2
    }
}

/// Flicker burst timing. The timer counts frames; once it passes `interval`
/// the node flickers for a fixed number of frames and a new interval is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flicker {
    pub timer: f32,
    pub interval: f32,
    pub active: bool,
}

impl Flicker {
    fn random_interval(rng: &mut impl Rng) -> f32 {
        200.0 + rng.r#gen::<f32>() * 600.0
    }

    pub fn spawn(rng: &mut impl Rng) -> Self {
        Self {
            timer: rng.r#gen::<f32>() * 500.0,
            interval: Self::random_interval(rng),
            active: false,
        }
    }

    pub fn advanced(self, burst_frames: u32, rng: &mut impl Rng) -> Self {
        let mut next = self;
        next.timer += 1.0;
        if next.timer > next.interval {
            next.active = true;
            if next.timer > next.interval + burst_frames as f32 {
                next.active = false;
                next.timer = 0.0;
                next.interval = Self::random_interval(rng);
            }
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshNode {
    pub position: Vec2,
    pub velocity: Vec2,
    pub layer: u8,
    pub base_radius: f32,
    pub radius: f32,
    pub color: Color,
    pub base_alpha: f32,
    pub alpha: f32,
    pub pulse_speed: f32,
    pub pulse_phase: f32,
    pub flicker: Flicker,
}

impl MeshNode {
    pub fn spawn(layer: u8, bounds: Bounds, rng: &mut impl Rng) -> Self {
        let depth = layer as f32;
        let speed = 0.15 + depth * 0.1;
        let position = Vec2::new(rng.r#gen::<f32>() * bounds.width, rng.r#gen::<f32>() * bounds.height);
        let velocity = Vec2::new(
            (rng.r#gen::<f32>() - 0.5) * speed,
            (rng.r#gen::<f32>() - 0.5) * speed,
        );
        let base_radius = 1.2 + depth * 0.8 + rng.r#gen::<f32>() * 1.2;
        let color = if rng.r#gen::<f32>() > 0.45 { BLUE } else { PURPLE };
        let base_alpha = 0.3 + depth * 0.15 + rng.r#gen::<f32>() * 0.2;

        Self {
            position,
            velocity,
            layer,
            base_radius,
            radius: base_radius,
            color,
            base_alpha,
            alpha: base_alpha,
            pulse_speed: 0.015 + rng.r#gen::<f32>() * 0.025,
            pulse_phase: rng.r#gen::<f32>() * TAU,
            flicker: Flicker::spawn(rng),
        }
    }

    /// Spawns `count` nodes already ordered back to front.
    pub fn spawn_batch(count: usize, bounds: Bounds, rng: &mut impl Rng) -> Vec<Self> {
        (0..count)
            .map(|i| Self::spawn(layer_for_index(i, count), bounds, rng))
            .collect()
    }

    pub fn pulse(&self, frame: u64) -> f32 {
        (frame as f32 * self.pulse_speed + self.pulse_phase).sin()
    }

    /// Alpha from the pulse alone, before any flicker override.
    pub fn pulse_alpha(&self, frame: u64, config: &MeshConfig) -> f32 {
        self.base_alpha + self.pulse(frame) * config.pulse_alpha_amplitude
    }

    /// Moves the node through one frame and returns the new state.
    pub fn stepped(&self, ctx: &FrameContext, config: &MeshConfig, rng: &mut impl Rng) -> Self {
        let mut next = *self;
        next.position += next.velocity;

        if let Some(pointer) = ctx.pointer {
            let factor = (self.layer as f32 + 1.0) * config.parallax_factor;
            next.position += (pointer - ctx.bounds.center()) * factor;
        }

        next.position = wrap_position(next.position, ctx.bounds, config.wrap_margin);

        let pulse = self.pulse(ctx.frame);
        next.radius = self.base_radius + pulse * config.pulse_radius_amplitude;
        next.alpha = self.base_alpha + pulse * config.pulse_alpha_amplitude;

        next.flicker = self.flicker.advanced(config.flicker_frames, rng);
        if next.flicker.active {
            next.alpha = if rng.r#gen::<f32>() > 0.5 { self.base_alpha * 1.8 } else { self.base_alpha * 0.3 };
        }

        next
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, config: &MeshConfig) {
        let stops = [
            GradientStop::new(0.0, self.color.with_alpha(self.alpha * 0.5)),
            GradientStop::new(0.4, self.color.with_alpha(self.alpha * 0.12)),
            GradientStop::new(1.0, self.color.with_alpha(0.0)),
        ];
        canvas.radial_glow(self.position, self.radius * config.glow_scale, stops);

        let core_alpha = (self.alpha + config.core_alpha_boost).min(1.0);
        canvas.fill_circle(self.position, self.radius, self.color.with_alpha(core_alpha));
    }
}

/// Each edge is checked on its own, so a node past the left margin lands
/// just past the right margin and keeps drifting in.
pub fn wrap_position(mut position: Vec2, bounds: Bounds, margin: f32) -> Vec2 {
    if position.x < -margin {
        position.x = bounds.width + margin;
    }
    if position.x > bounds.width + margin {
        position.x = -margin;
    }
    if position.y < -margin {
        position.y = bounds.height + margin;
    }
    if position.y > bounds.height + margin {
        position.y = -margin;
    }
    position
}
