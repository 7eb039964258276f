// src/color.rs
use bevy_color::{ColorToComponents, LinearRgba, Srgba};

/// Brand blue (#2563EB).
pub const BLUE: Color = Color::rgb(37, 99, 235);
/// Brand purple (#7C3AED).
pub const PURPLE: Color = Color::rgb(124, 58, 237);
/// Page background behind the canvas.
pub const BACKGROUND: Color = Color::rgb(255, 255, 255);

/// An sRGB color plus an opacity, the way the 2D canvas describes fills.
///
/// Alpha is clamped into `[0, 1]` on construction, so anything that reaches
/// the GPU is a valid opacity no matter what the pulse/flicker math produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: 1.0 }
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        let alpha = if alpha.is_finite() { alpha.clamp(0.0, 1.0) } else { 0.0 };
        Self { alpha, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha <= 0.0
    }

    pub fn into_linear_rgba(self) -> [f32; 4] {
        let srgba = Srgba::rgb_u8(self.r, self.g, self.b);
        let mut linear = LinearRgba::from(srgba);
        linear.alpha = self.alpha;
        linear.to_f32_array()
    }

    pub fn into_linear_wgpu_color(self) -> wgpu::Color {
        let [r, g, b, a] = self.into_linear_rgba();
        wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 }
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(BLUE.with_alpha(1.44).alpha, 1.0);
        assert_eq!(BLUE.with_alpha(-0.2).alpha, 0.0);
        assert_eq!(BLUE.with_alpha(f32::NAN).alpha, 0.0);
    }

    #[test]
    fn linear_conversion_keeps_alpha() {
        let [r, g, b, a] = PURPLE.with_alpha(0.25).into_linear_rgba();
        assert_eq!(a, 0.25);
        assert!(b > r && r > g);
    }
}
