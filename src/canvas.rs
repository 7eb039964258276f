// src/canvas.rs
// The drawing surface scenes paint on. Coordinates are logical (CSS) pixels
// with the origin in the top-left corner, y pointing down.
use glam::Vec2;

use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Three-stop gradient (start, middle, end), which covers every gradient the
/// backdrops use.
pub type Gradient = [GradientStop; 3];

pub trait Canvas {
    fn clear(&mut self);

    /// Disc of `radius` around `center` whose color follows `stops` from the
    /// center (offset 0) to the rim (offset 1).
    fn radial_glow(&mut self, center: Vec2, radius: f32, stops: Gradient);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    /// Full-height rectangle starting at `x`, shaded left to right by `stops`.
    fn fill_horizontal_band(&mut self, x: f32, width: f32, height: f32, stops: Gradient);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    RadialGlow { center: Vec2, radius: f32, stops: Gradient },
    Circle { center: Vec2, radius: f32, color: Color },
    Line { from: Vec2, to: Vec2, width: f32, color: Color },
    HorizontalBand { x: f32, width: f32, height: f32, stops: Gradient },
}

impl DrawCommand {
    /// Every color the command would put on screen.
    pub fn colors(&self) -> Vec<Color> {
        match self {
            DrawCommand::RadialGlow { stops, .. } | DrawCommand::HorizontalBand { stops, .. } => {
                stops.iter().map(|stop| stop.color).collect()
            }
            DrawCommand::Circle { color, .. } | DrawCommand::Line { color, .. } => vec![*color],
        }
    }
}

/// Records canvas calls in paint order. The GPU backend replays it and the
/// tests inspect it.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Canvas for DrawList {
    fn clear(&mut self) {
        self.commands.clear();
    }

    fn radial_glow(&mut self, center: Vec2, radius: f32, stops: Gradient) {
        self.commands.push(DrawCommand::RadialGlow { center, radius, stops });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, width, color });
    }

    fn fill_horizontal_band(&mut self, x: f32, width: f32, height: f32, stops: Gradient) {
        self.commands.push(DrawCommand::HorizontalBand { x, width, height, stops });
    }
}
