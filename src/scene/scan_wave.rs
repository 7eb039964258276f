// src/scene/scan_wave.rs
use crate::canvas::{Canvas, GradientStop};
use crate::color::{BLUE, PURPLE};
use crate::config::ScanWaveConfig;

/// Horizontal sweep that restarts left of the viewport once it has passed
/// the right edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWave {
    pub x: f32,
}

impl ScanWave {
    pub fn new(config: &ScanWaveConfig) -> Self {
        Self { x: config.start }
    }

    pub fn advance(&mut self, viewport_width: f32, config: &ScanWaveConfig) -> f32 {
        self.x += config.step;
        if self.x > viewport_width + config.overshoot {
            self.x = config.start;
        }
        self.x
    }
}

/// Extra opacity for a line whose midpoint sits `distance` away from the wave.
pub fn scan_boost(distance: f32, config: &ScanWaveConfig) -> f32 {
    if distance < config.boost_radius {
        (1.0 - distance / config.boost_radius) * config.boost_opacity
    } else {
        0.0
    }
}

pub fn draw_scan_band(canvas: &mut dyn Canvas, scan_x: f32, height: f32, config: &ScanWaveConfig) {
    let stops = [
        GradientStop::new(0.0, BLUE.with_alpha(0.0)),
        GradientStop::new(0.5, PURPLE.with_alpha(config.peak_alpha)),
        GradientStop::new(1.0, BLUE.with_alpha(0.0)),
    ];
    canvas.fill_horizontal_band(scan_x - config.half_width, config.half_width * 2.0, height, stops);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, DrawList};
    use approx::assert_relative_eq;

    #[test]
    fn wave_wraps_to_start_and_repeats() {
        let config = ScanWaveConfig::default();
        let width = 300.0;
        let mut wave = ScanWave::new(&config);

        let mut first_cycle = Vec::new();
        loop {
            let x = wave.advance(width, &config);
            if x == config.start {
                break;
            }
            assert!(x <= width + config.overshoot);
            first_cycle.push(x);
        }
        // 700 / 1.5 frames from the start until the wave passes width + 200.
        assert_eq!(first_cycle.len(), 466);

        let second_cycle: Vec<f32> = (0..first_cycle.len()).map(|_| wave.advance(width, &config)).collect();
        assert_eq!(first_cycle, second_cycle);
        assert_eq!(wave.advance(width, &config), config.start);
    }

    #[test]
    fn boost_fades_out_at_radius() {
        let config = ScanWaveConfig::default();
        assert_relative_eq!(scan_boost(0.0, &config), 0.15);
        assert_relative_eq!(scan_boost(60.0, &config), 0.075);
        assert_eq!(scan_boost(120.0, &config), 0.0);
    }

    #[test]
    fn band_is_centered_on_wave() {
        let mut list = DrawList::new();
        draw_scan_band(&mut list, 400.0, 900.0, &ScanWaveConfig::default());
        match &list.commands()[0] {
            DrawCommand::HorizontalBand { x, width, height, stops } => {
                assert_eq!((*x, *width, *height), (300.0, 200.0, 900.0));
                assert_eq!(stops[1].color, PURPLE.with_alpha(0.04));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
