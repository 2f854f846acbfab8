//! Editor configuration.
//!
//! Every field has a default, so a host only has to supply the values it
//! wants to change:
//!
//! ```json
//! { "snap_threshold": 40.0, "settle": { "max_ticks": 60 } }
//! ```

use force_graph::SimulationParameters;
use gd_core::{DEFAULT_SNAP_THRESHOLD, UniformGeometry, Viewport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap distance in device pixels. Default: **50**.
    pub snap_threshold: f64,

    /// Canvas size; the settling pass centers on it and new nodes land in
    /// its middle.
    pub viewport: Viewport,

    /// Inner radius used when no geometry service is supplied. Default: **25**.
    pub node_radius: f64,

    pub settle: SettleConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            viewport: Viewport::default(),
            node_radius: UniformGeometry::default().inner_radius,
            settle: SettleConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Load a (possibly partial) configuration from JSON.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn geometry(&self) -> UniformGeometry {
        UniformGeometry {
            inner_radius: self.node_radius,
        }
    }
}

/// Parameters of the settling pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    /// Hard cap on ticks per pass. Default: **20**.
    pub max_ticks: u32,

    /// Simulated seconds per tick. Default: **0.05**.
    pub time_step: f32,

    /// Repulsion between every pair of nodes. Default: **150**.
    pub charge: f32,

    /// Spring strength along relationships and toward the viewport center.
    /// Default: **0.05**.
    pub spring: f32,

    /// Cap on any single pairwise force. Default: **100**.
    pub force_max: f32,

    pub node_speed: f32,
    pub damping: f32,

    /// Simulation mass per pixel of collision radius, so bigger nodes push
    /// harder. Default: **0.2** (mass 10 for the default node).
    pub mass_per_radius: f32,

    /// The pass ends early once no node moves farther than this in a tick.
    /// Default: **0.01**.
    pub rest_distance: f64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            max_ticks: 20,
            time_step: 0.05,
            charge: 150.0,
            spring: 0.05,
            force_max: 100.0,
            node_speed: 3000.0,
            damping: 0.9,
            mass_per_radius: 0.2,
            rest_distance: 0.01,
        }
    }
}

impl SettleConfig {
    pub fn parameters(&self) -> SimulationParameters {
        SimulationParameters {
            force_charge: self.charge,
            force_spring: self.spring,
            force_max: self.force_max,
            node_speed: self.node_speed,
            damping_factor: self.damping,
        }
    }
}
