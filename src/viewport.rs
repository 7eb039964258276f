// src/viewport.rs
// Maps the logical pixel space the scenes draw in onto clip space.
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

// Uniform data sent to the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ViewportUniform {
    pub view_proj: [[f32; 4]; 4],
    pub needs_srgb_output_conversion: u32, // 0 for false, 1 for true
    pub _padding: [u32; 3], // pads the uniform to 80 bytes
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical (CSS) size of the surface.
    pub logical_size: Vec2,
    /// Physical pixels per logical pixel, as reported by the window.
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let mut viewport = Self { logical_size: Vec2::ONE, scale_factor: 1.0 };
        viewport.update(physical_width, physical_height, scale_factor);
        viewport
    }

    /// Called whenever the window size or scale factor changes.
    pub fn update(&mut self, physical_width: u32, physical_height: u32, scale_factor: f64) {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor as f32 } else { 1.0 };
        if physical_width > 0 && physical_height > 0 {
            self.scale_factor = scale;
            self.logical_size = Vec2::new(physical_width as f32, physical_height as f32) / scale;
        }
    }

    /// Orthographic projection with the origin in the top-left corner and
    /// y pointing down, like a 2D canvas.
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.logical_size.x, self.logical_size.y, 0.0, -1.0, 1.0)
    }

    pub fn uniform(&self, needs_srgb_output_conversion: bool) -> ViewportUniform {
        ViewportUniform {
            view_proj: self.build_view_projection_matrix().to_cols_array_2d(),
            needs_srgb_output_conversion: needs_srgb_output_conversion as u32,
            _padding: [0; 3],
        }
    }
}
