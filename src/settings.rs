//! Player preferences
//!
//! Cosmetic only: volumes and particle density never affect gameplay.
//! Stored inside the save data under `settings`.

use serde::{Deserialize, Serialize};

/// Particle density levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticleLevel {
    Low,
    Medium,
    #[default]
    High,
}

impl ParticleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleLevel::Low => "low",
            ParticleLevel::Medium => "medium",
            ParticleLevel::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(ParticleLevel::Low),
            "medium" | "med" => Some(ParticleLevel::Medium),
            "high" => Some(ParticleLevel::High),
            _ => None,
        }
    }

    /// Maximum particles for this level
    pub fn max_particles(&self) -> usize {
        match self {
            ParticleLevel::Low => 100,
            ParticleLevel::Medium => 300,
            ParticleLevel::High => 500,
        }
    }

    /// Trail length multiplier (1.0 = full)
    pub fn trail_quality(&self) -> f32 {
        match self {
            ParticleLevel::Low => 0.3,
            ParticleLevel::Medium => 0.6,
            ParticleLevel::High => 1.0,
        }
    }

    /// Background star count
    pub fn star_count(&self) -> usize {
        match self {
            ParticleLevel::Low => 40,
            ParticleLevel::Medium => 80,
            ParticleLevel::High => 120,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Music volume, 0-100
    pub bgm_volume: u8,
    /// Sound effect volume, 0-100
    pub se_volume: u8,
    /// Screen shake on hits
    pub screen_shake: bool,
    pub particle_level: ParticleLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bgm_volume: 80,
            se_volume: 100,
            screen_shake: true,
            particle_level: ParticleLevel::High,
        }
    }
}

impl Settings {
    /// Music gain in `[0, 1]`
    pub fn bgm_gain(&self) -> f32 {
        self.bgm_volume.min(100) as f32 / 100.0
    }

    /// Sound effect gain in `[0, 1]`
    pub fn se_gain(&self) -> f32 {
        self.se_volume.min(100) as f32 / 100.0
    }

    /// Clamp out-of-range values after loading
    pub fn sanitized(mut self) -> Self {
        self.bgm_volume = self.bgm_volume.min(100);
        self.se_volume = self.se_volume.min(100);
        self
    }

    pub fn max_particles(&self) -> usize {
        self.particle_level.max_particles()
    }
}
