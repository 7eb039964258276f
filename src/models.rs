// src/models.rs
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::canvas::{DrawCommand, DrawList, Gradient};
use crate::color::Color;

// --- Standard 2D Vertex (unit quad the circle instances are stamped from) ---
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex2D {
    pub position: [f32; 2],
}

impl Vertex2D {
    pub const QUAD_VERTICES: [Self; 4] = [
        Vertex2D { position: [-0.5, -0.5] }, // 0: Bottom-left
        Vertex2D { position: [ 0.5, -0.5] }, // 1: Bottom-right
        Vertex2D { position: [ 0.5,  0.5] }, // 2: Top-right
        Vertex2D { position: [-0.5,  0.5] }, // 3: Top-left
    ];

    // Two triangles. Screen space has y pointing down, so keep both windings
    // visible by disabling culling in the pipeline.
    pub const QUAD_INDICES: [u16; 6] = [
        0, 1, 2,
        0, 2, 3,
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

// --- Instance Data for discs and radial glows ---
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CircleInstance {
    pub position: [f32; 2],
    pub radius: f32,
    /// Linear RGB; the alpha channel is unused, see `profile`.
    pub color: [f32; 4],
    /// Radial alpha profile: `[center, mid_offset, mid, rim]`.
    pub profile: [f32; 4],
}

impl CircleInstance {
    pub fn solid(center: Vec2, radius: f32, color: Color) -> Self {
        let a = color.alpha;
        Self {
            position: center.into(),
            radius,
            color: color.into_linear_rgba(),
            profile: [a, 0.5, a, a],
        }
    }

    pub fn glow(center: Vec2, radius: f32, stops: &Gradient) -> Self {
        Self {
            position: center.into(),
            radius,
            color: stops[0].color.into_linear_rgba(),
            profile: [stops[0].color.alpha, stops[1].offset, stops[1].color.alpha, stops[2].color.alpha],
        }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        const VEC2: u64 = mem::size_of::<[f32; 2]>() as u64;
        const F32: u64 = mem::size_of::<f32>() as u64;
        const VEC4: u64 = mem::size_of::<[f32; 4]>() as u64;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1, // instance center
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: VEC2,
                    shader_location: 2, // instance radius
                    format: wgpu::VertexFormat::Float32,
                },
                wgpu::VertexAttribute {
                    offset: VEC2 + F32,
                    shader_location: 3, // instance color
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: VEC2 + F32 + VEC4,
                    shader_location: 4, // alpha profile
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// --- Vertex Data for filled triangles (lines and gradient bands) ---
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FillVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl FillVertex {
    fn new(position: Vec2, color: Color) -> Self {
        Self { position: position.into(), color: color.into_linear_rgba() }
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// A run of consecutive draw commands that share a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    Circles(Range<u32>),
    Fill(Range<u32>),
}

/// GPU-ready geometry for one frame, batched so paint order survives the
/// switch between the circle and fill pipelines.
#[derive(Debug, Clone, Default)]
pub struct FrameGeometry {
    pub circles: Vec<CircleInstance>,
    pub fill_vertices: Vec<FillVertex>,
    pub batches: Vec<Batch>,
}

impl FrameGeometry {
    pub fn from_draw_list(list: &DrawList) -> Self {
        let mut geometry = Self::default();
        for command in list.commands() {
            match command {
                DrawCommand::RadialGlow { center, radius, stops } => {
                    geometry.push_circle(CircleInstance::glow(*center, *radius, stops));
                }
                DrawCommand::Circle { center, radius, color } => {
                    geometry.push_circle(CircleInstance::solid(*center, *radius, *color));
                }
                DrawCommand::Line { from, to, width, color } => {
                    let vertices = line_quad(*from, *to, *width, *color);
                    geometry.push_fill(&vertices);
                }
                DrawCommand::HorizontalBand { x, width, height, stops } => {
                    let vertices = band_quads(*x, *width, *height, stops);
                    geometry.push_fill(&vertices);
                }
            }
        }
        geometry
    }

    fn push_circle(&mut self, instance: CircleInstance) {
        let index = self.circles.len() as u32;
        self.circles.push(instance);
        match self.batches.last_mut() {
            Some(Batch::Circles(range)) => range.end = index + 1,
            _ => self.batches.push(Batch::Circles(index..index + 1)),
        }
    }

    fn push_fill(&mut self, vertices: &[FillVertex]) {
        if vertices.is_empty() {
            return;
        }
        let start = self.fill_vertices.len() as u32;
        self.fill_vertices.extend_from_slice(vertices);
        let end = self.fill_vertices.len() as u32;
        match self.batches.last_mut() {
            Some(Batch::Fill(range)) => range.end = end,
            _ => self.batches.push(Batch::Fill(start..end)),
        }
    }
}

/// Two triangles covering a line of the given width.
fn line_quad(from: Vec2, to: Vec2, width: f32, color: Color) -> Vec<FillVertex> {
    let direction = to - from;
    if direction.length() < f32::EPSILON {
        return Vec::new();
    }
    let offset = direction.normalize().perp() * (width / 2.0);
    let corners = [from + offset, from - offset, to - offset, to + offset];
    [0, 1, 2, 0, 2, 3]
        .into_iter()
        .map(|i| FillVertex::new(corners[i], color))
        .collect()
}

/// One quad per gradient segment; the rasterizer interpolates the colors.
fn band_quads(x: f32, width: f32, height: f32, stops: &Gradient) -> Vec<FillVertex> {
    let mut vertices = Vec::with_capacity(12);
    for pair in stops.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        let x0 = x + width * left.offset;
        let x1 = x + width * right.offset;
        let top_left = FillVertex::new(Vec2::new(x0, 0.0), left.color);
        let bottom_left = FillVertex::new(Vec2::new(x0, height), left.color);
        let top_right = FillVertex::new(Vec2::new(x1, 0.0), right.color);
        let bottom_right = FillVertex::new(Vec2::new(x1, height), right.color);
        vertices.extend_from_slice(&[top_left, bottom_left, bottom_right, top_left, bottom_right, top_right]);
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, GradientStop};
    use crate::color::{BLUE, PURPLE};

    #[test]
    fn batches_follow_paint_order() {
        let mut list = DrawList::new();
        list.stroke_line(Vec2::ZERO, Vec2::new(10.0, 0.0), 1.0, BLUE);
        list.stroke_line(Vec2::ZERO, Vec2::new(0.0, 10.0), 1.0, BLUE);
        list.fill_circle(Vec2::new(5.0, 5.0), 2.0, PURPLE);
        list.fill_circle(Vec2::new(6.0, 5.0), 2.0, PURPLE);
        list.stroke_line(Vec2::ZERO, Vec2::new(3.0, 4.0), 1.0, PURPLE);

        let geometry = FrameGeometry::from_draw_list(&list);
        assert_eq!(geometry.batches, vec![Batch::Fill(0..12), Batch::Circles(0..2), Batch::Fill(12..18)]);
        assert_eq!(geometry.circles.len(), 2);
    }

    #[test]
    fn degenerate_lines_are_dropped() {
        let mut list = DrawList::new();
        list.stroke_line(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), 1.0, BLUE);
        let geometry = FrameGeometry::from_draw_list(&list);
        assert!(geometry.fill_vertices.is_empty());
        assert!(geometry.batches.is_empty());
    }

    #[test]
    fn line_quad_has_requested_width() {
        let vertices = line_quad(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, BLUE);
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();
        let max = ys.iter().cloned().fold(f32::MIN, f32::max);
        let min = ys.iter().cloned().fold(f32::MAX, f32::min);
        assert!((max - min - 2.0).abs() < 1e-6);
    }

    #[test]
    fn band_spans_full_height() {
        let stops = [
            GradientStop::new(0.0, BLUE.with_alpha(0.0)),
            GradientStop::new(0.5, PURPLE.with_alpha(0.04)),
            GradientStop::new(1.0, BLUE.with_alpha(0.0)),
        ];
        let vertices = band_quads(100.0, 200.0, 720.0, &stops);
        assert_eq!(vertices.len(), 12);
        assert!(vertices.iter().all(|v| v.position[1] == 0.0 || v.position[1] == 720.0));
        assert!(vertices.iter().all(|v| (100.0..=300.0).contains(&v.position[0])));
    }

    #[test]
    fn glow_profile_carries_stop_alphas() {
        let stops = [
            GradientStop::new(0.0, BLUE.with_alpha(0.3)),
            GradientStop::new(0.4, BLUE.with_alpha(0.072)),
            GradientStop::new(1.0, BLUE.with_alpha(0.0)),
        ];
        let instance = CircleInstance::glow(Vec2::new(1.0, 2.0), 10.0, &stops);
        assert_eq!(instance.profile, [0.3, 0.4, 0.072, 0.0]);
        assert_eq!(instance.radius, 10.0);
    }
}
