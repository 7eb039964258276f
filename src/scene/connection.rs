// src/scene/connection.rs
// Pairwise proximity pass. Quadratic in the number of nodes, which stays
// well under 150 for both backdrops.
use glam::Vec2;

use crate::canvas::Canvas;
use crate::color::{BLUE, PURPLE};
use crate::config::{MeshConfig, NetworkConfig};
use crate::scene::mesh_node::MeshNode;
use crate::scene::network::NetworkParticle;
use crate::scene::scan_wave::scan_boost;
use crate::scene::{FrameContext, proximity_opacity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Between two entities.
    Link,
    /// From an entity to the pointer.
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
    pub opacity: f32,
    pub width: f32,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn draw(&self, canvas: &mut dyn Canvas) {
        let color = match self.kind {
            SegmentKind::Link => BLUE,
            SegmentKind::Pointer => PURPLE,
        };
        canvas.stroke_line(self.from, self.to, self.width, color.with_alpha(self.opacity));
    }
}

/// Only nodes on the same or adjacent layers are linked.
pub fn layers_connectable(a: u8, b: u8) -> bool {
    a.abs_diff(b) <= 1
}

/// Segments for the mesh in paint order: for each node its links to later
/// nodes, then its pointer link.
pub fn mesh_segments(nodes: &[MeshNode], ctx: &FrameContext, config: &MeshConfig) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if !layers_connectable(a.layer, b.layer) {
                continue;
            }
            let distance = a.position.distance(b.position);
            if distance < config.connection_distance {
                let mut opacity = proximity_opacity(distance, config.connection_distance, config.connection_opacity);
                let mid_x = (a.position.x + b.position.x) / 2.0;
                opacity += scan_boost((mid_x - ctx.scan_x).abs(), &config.scan_wave);

                segments.push(Segment {
                    from: a.position,
                    to: b.position,
                    opacity,
                    width: 0.6 + a.layer as f32 * 0.15,
                    kind: SegmentKind::Link,
                });
            }
        }

        if let Some(pointer) = pointer_segment(a.position, ctx.pointer, config.pointer_distance, config.pointer_opacity, config.pointer_line_width) {
            segments.push(pointer);
        }
    }

    segments
}

pub fn network_segments(particles: &[NetworkParticle], ctx: &FrameContext, config: &NetworkConfig) -> Vec<Segment> {
    let mut segments = Vec::new();

    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            let distance = a.position.distance(b.position);
            if distance < config.connection_distance {
                segments.push(Segment {
                    from: a.position,
                    to: b.position,
                    opacity: proximity_opacity(distance, config.connection_distance, config.connection_opacity),
                    width: config.connection_line_width,
                    kind: SegmentKind::Link,
                });
            }
        }

        if let Some(pointer) = pointer_segment(a.position, ctx.pointer, config.pointer_distance, config.pointer_opacity, config.pointer_line_width) {
            segments.push(pointer);
        }
    }

    segments
}

fn pointer_segment(from: Vec2, pointer: Option<Vec2>, threshold: f32, max_opacity: f32, width: f32) -> Option<Segment> {
    let pointer = pointer?;
    let distance = from.distance(pointer);
    (distance < threshold).then(|| Segment {
        from,
        to: pointer,
        opacity: proximity_opacity(distance, threshold, max_opacity),
        width,
        kind: SegmentKind::Pointer,
    })
}
