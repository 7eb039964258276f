// src/config.rs
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    /// Full-viewport layered neural mesh.
    #[default]
    Mesh,
    /// Container-sized bouncing particle network.
    Network,
}

impl std::str::FromStr for SceneKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mesh" => Ok(SceneKind::Mesh),
            "network" => Ok(SceneKind::Network),
            other => anyhow::bail!("unknown scene kind `{other}` (expected `mesh` or `network`)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scene: SceneKind,
    pub mesh: MeshConfig,
    pub network: NetworkConfig,
    pub analysis: AnalysisConfig,
    /// Fixed RNG seed. Entropy is used when absent.
    pub seed: Option<u64>,
}

impl AppConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid configuration JSON")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&raw)
    }
}

/// Tuning constants for the layered mesh backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub node_count: usize,
    pub particle_count: usize,
    pub connection_distance: f32,
    pub pointer_distance: f32,
    /// Opacity of a node-node line at zero distance.
    pub connection_opacity: f32,
    pub pointer_opacity: f32,
    pub pointer_line_width: f32,
    /// Distance past each viewport edge before a node wraps around.
    pub wrap_margin: f32,
    pub parallax_factor: f32,
    pub pulse_radius_amplitude: f32,
    pub pulse_alpha_amplitude: f32,
    /// Frames a flicker burst lasts once triggered.
    pub flicker_frames: u32,
    pub glow_scale: f32,
    pub core_alpha_boost: f32,
    pub scan_wave: ScanWaveConfig,
    pub micro_life_step: f32,
    pub micro_respawn_offset: f32,
    pub max_device_pixel_ratio: Option<f64>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            node_count: 120,
            particle_count: 60,
            connection_distance: 140.0,
            pointer_distance: 200.0,
            connection_opacity: 0.2,
            pointer_opacity: 0.45,
            pointer_line_width: 1.2,
            wrap_margin: 20.0,
            parallax_factor: 0.0003,
            pulse_radius_amplitude: 0.6,
            pulse_alpha_amplitude: 0.12,
            flicker_frames: 8,
            glow_scale: 5.0,
            core_alpha_boost: 0.35,
            scan_wave: ScanWaveConfig::default(),
            micro_life_step: 0.002,
            micro_respawn_offset: 10.0,
            max_device_pixel_ratio: Some(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanWaveConfig {
    /// Left-of-viewport position the wave starts from and restarts at.
    pub start: f32,
    pub step: f32,
    /// How far past the right edge the wave travels before wrapping.
    pub overshoot: f32,
    pub half_width: f32,
    /// Radius around the wave inside which connection lines brighten.
    pub boost_radius: f32,
    pub boost_opacity: f32,
    pub peak_alpha: f32,
}

impl Default for ScanWaveConfig {
    fn default() -> Self {
        Self {
            start: -200.0,
            step: 1.5,
            overshoot: 200.0,
            half_width: 100.0,
            boost_radius: 120.0,
            boost_opacity: 0.15,
            peak_alpha: 0.04,
        }
    }
}

/// Tuning constants for the container particle network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub particle_count: usize,
    pub connection_distance: f32,
    pub pointer_distance: f32,
    pub connection_opacity: f32,
    pub pointer_opacity: f32,
    pub connection_line_width: f32,
    pub pointer_line_width: f32,
    pub pulse_alpha_amplitude: f32,
    pub glow_scale: f32,
    pub core_alpha_boost: f32,
    /// Size used for spawning before the container reports one.
    pub fallback_size: [f32; 2],
    pub max_device_pixel_ratio: Option<f64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            particle_count: 90,
            connection_distance: 160.0,
            pointer_distance: 220.0,
            connection_opacity: 0.35,
            pointer_opacity: 0.6,
            connection_line_width: 1.0,
            pointer_line_width: 1.5,
            pulse_alpha_amplitude: 0.2,
            glow_scale: 6.0,
            core_alpha_boost: 0.3,
            fallback_size: [800.0, 600.0],
            max_device_pixel_ratio: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub origin: String,
    pub path: String,
    pub timeout_secs: u64,
    pub max_upload_bytes: u64,
}

impl AnalysisConfig {
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.origin.trim_end_matches('/'), self.path.trim_start_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            origin: "https://pre-hackathon-jklu.onrender.com".to_string(),
            path: "/analyze".to_string(),
            timeout_secs: 120,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(r#"{"scene":"network","mesh":{"node_count":40}}"#).unwrap();
        assert_eq!(config.scene, SceneKind::Network);
        assert_eq!(config.mesh.node_count, 40);
        assert_eq!(config.mesh.particle_count, 60);
        assert_eq!(config.network, NetworkConfig::default());
        assert!(config.seed.is_none());
    }

    #[test]
    fn endpoint_joins_origin_and_path() {
        let mut analysis = AnalysisConfig::default();
        assert_eq!(analysis.endpoint(), "https://pre-hackathon-jklu.onrender.com/analyze");
        analysis.origin = "http://localhost:8000/".into();
        assert_eq!(analysis.endpoint(), "http://localhost:8000/analyze");
        assert_eq!(analysis.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn scene_kind_parses_case_insensitively() {
        assert_eq!("Mesh".parse::<SceneKind>().unwrap(), SceneKind::Mesh);
        assert_eq!(" network ".parse::<SceneKind>().unwrap(), SceneKind::Network);
        assert!("grid".parse::<SceneKind>().is_err());
    }
}
